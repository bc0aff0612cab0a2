/*
 *   Copyright (c) 2025 R3BL LLC
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

//! The raw byte-I/O backend: raw-mode lifecycle plus a dedicated
//! stdin-polling thread. Grounded on `core/ansi/terminal_raw_mode` for the
//! raw-mode guard and on the `mio::Poll`/`Waker` chain documented in
//! `core/resilient_reactor_thread/rrt.rs` for decoupling a blocking read
//! syscall from the async event loop -- simplified to a single dedicated
//! thread rather than the teacher's full restart-supervised worker
//! framework, since this crate's event loop is not restart-supervised
//! (see DESIGN.md).

pub mod queries;
pub mod raw_mode;

use std::io::Read;
use std::os::fd::AsRawFd;

use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token, Waker};
use std::sync::Arc;
use tokio::sync::mpsc;

pub use raw_mode::RawModeGuard;

const STDIN_TOKEN: Token = Token(0);
const RESIZE_TOKEN: Token = Token(1);

/// What the dedicated I/O thread pushes back to the async side.
#[derive(Debug)]
pub enum IoEvent {
    Bytes(Vec<u8>),
    Resize { cols: usize, rows: usize },
}

/// A handle that lets the async side wake the blocking poll thread to ask
/// it to exit (mirrors `RRTWaker::wake` minus the restart machinery).
pub struct IoThreadHandle {
    waker: Arc<Waker>,
    join: Option<std::thread::JoinHandle<()>>,
}

impl IoThreadHandle {
    pub fn shutdown(mut self) {
        let _ = self.waker.wake();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

fn current_window_size() -> (usize, usize) {
    match rustix::termios::tcgetwinsize(std::io::stdin()) {
        Ok(ws) => (ws.ws_col as usize, ws.ws_row as usize),
        Err(_) => (80, 24),
    }
}

/// Spawns the dedicated stdin-polling thread. Bytes read from stdin and
/// `SIGWINCH`-triggered resize notifications are forwarded on `events`;
/// the resize notification itself rides a `mio::unix::pipe` self-pipe
/// written to from a `signal_hook`-free `SIGWINCH` handler registered by
/// the caller (spec.md §4.6: "a second registered source ... carries
/// resize notifications").
pub fn spawn(events: mpsc::UnboundedSender<IoEvent>, resize_rx: mio::unix::pipe::Receiver) -> std::io::Result<IoThreadHandle> {
    let mut poll = Poll::new()?;
    let waker = Arc::new(Waker::new(poll.registry(), Token(2))?);

    let stdin_fd = std::io::stdin().as_raw_fd();
    poll.registry()
        .register(&mut SourceFd(&stdin_fd), STDIN_TOKEN, Interest::READABLE)?;

    let mut resize_rx = resize_rx;
    poll.registry()
        .register(&mut resize_rx, RESIZE_TOKEN, Interest::READABLE)?;

    let join = std::thread::Builder::new()
        .name("tuigrid-io".into())
        .spawn(move || {
            let mut events_buf = Events::with_capacity(16);
            let mut read_buf = [0u8; 4096];
            let mut stdin = std::io::stdin();
            loop {
                if let Err(e) = poll.poll(&mut events_buf, None) {
                    if e.kind() == std::io::ErrorKind::Interrupted {
                        continue;
                    }
                    tracing::warn!(error = %e, "io poll thread exiting on error");
                    return;
                }
                for event in events_buf.iter() {
                    match event.token() {
                        STDIN_TOKEN => match stdin.read(&mut read_buf) {
                            Ok(0) => return,
                            Ok(n) => {
                                if events.send(IoEvent::Bytes(read_buf[..n].to_vec())).is_err() {
                                    return;
                                }
                            }
                            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                            Err(_) => return,
                        },
                        RESIZE_TOKEN => {
                            let mut drain = [0u8; 64];
                            let _ = resize_rx.read(&mut drain);
                            let (cols, rows) = current_window_size();
                            if events.send(IoEvent::Resize { cols, rows }).is_err() {
                                return;
                            }
                        }
                        Token(2) => return, // the shutdown waker
                        _ => {}
                    }
                }
            }
        })?;

    Ok(IoThreadHandle {
        waker,
        join: Some(join),
    })
}
