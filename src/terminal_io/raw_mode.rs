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

//! Raw-mode termios management. Grounded almost line-for-line on
//! `core/ansi/terminal_raw_mode/raw_mode_unix.rs::{enable_raw_mode,
//! disable_raw_mode}`, restructured as an RAII guard per spec.md §4.6
//! ("`RawModeGuard` enables raw mode on construction ... and restores the
//! previous `termios` state on `Drop`, even on panic unwind").

use rustix::termios::{
    self, ControlModes, InputModes, LocalModes, OptionalActions, OutputModes, SpecialCodeIndex, Termios,
};
use std::io;

use crate::error::{Result, TuiGridError};

/// Holds the original `termios` state and restores it when dropped. Stdin
/// must be a TTY; construction fails otherwise.
pub struct RawModeGuard {
    original: Termios,
}

impl RawModeGuard {
    /// Enables raw mode: disables echo, canonical mode, signal-generating
    /// keys, and sets `VMIN=1, VTIME=0` for immediate byte-by-byte reads.
    pub fn enable() -> Result<Self> {
        let stdin = io::stdin();
        let original = termios::tcgetattr(&stdin).map_err(|e| TuiGridError::RawModeUnavailable(e.into()))?;

        let mut raw = original.clone();
        raw.input_modes.remove(
            InputModes::IGNBRK
                | InputModes::BRKINT
                | InputModes::PARMRK
                | InputModes::ISTRIP
                | InputModes::INLCR
                | InputModes::IGNCR
                | InputModes::ICRNL
                | InputModes::IXON,
        );
        raw.output_modes.remove(OutputModes::OPOST);
        raw.local_modes.remove(
            LocalModes::ECHO
                | LocalModes::ECHONL
                | LocalModes::ICANON
                | LocalModes::ISIG
                | LocalModes::IEXTEN,
        );
        raw.control_modes.remove(ControlModes::CSIZE | ControlModes::PARENB);
        raw.control_modes.insert(ControlModes::CS8);
        raw.special_codes[SpecialCodeIndex::VMIN] = 1;
        raw.special_codes[SpecialCodeIndex::VTIME] = 0;

        termios::tcsetattr(&stdin, OptionalActions::Now, &raw)
            .map_err(|e| TuiGridError::RawModeUnavailable(e.into()))?;

        Ok(RawModeGuard { original })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let stdin = io::stdin();
        // Best-effort: there's nothing useful to do with an error while
        // already unwinding or exiting, but log it for postmortems.
        if let Err(e) = termios::tcsetattr(&stdin, OptionalActions::Now, &self.original) {
            tracing::warn!(error = %e, "failed to restore terminal settings on drop");
        }
    }
}
