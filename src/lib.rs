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

//! `tuigrid`: a VT500-series terminal input parser and a double-buffered
//! delta renderer for character-cell terminals.
//!
//! The crate is organized around three actors that together implement
//! spec.md §5's pipeline: a dedicated I/O thread ([`terminal_io`]) that
//! turns a blocking `read(2)` on stdin and a `SIGWINCH` self-pipe into an
//! async channel, a [`parser`] that turns raw bytes into [`parser::Sequence`]
//! values, and a [`dispatch`] layer that turns those into host-facing
//! [`dispatch::Msg`] values. [`event_loop::EventLoop`] wires the three
//! together and exposes the host API: `init`, `run`, `post_message`,
//! `window`, `close`, and the cursor/clipboard/notification calls (spec.md
//! §6). Screen state lives in [`screen::Screen`], addressed through
//! [`window::Window`]'s parent-relative rectangles, and painted by
//! [`renderer::Renderer`] as a diff against the previous frame.

pub mod capabilities;
pub mod cell;
pub mod color;
pub mod dispatch;
pub mod error;
pub mod event_loop;
pub mod graphemes;
pub mod log;
pub mod parser;
pub mod placement;
pub mod renderer;
pub mod screen;
pub mod terminal_io;
pub mod window;

pub use capabilities::Capabilities;
pub use cell::{Attributes, Cell, UnderlineStyle};
pub use color::Color;
pub use dispatch::messages::{KeyEvent, KeyEventKind, Modifiers, MouseButton, MouseEvent};
pub use dispatch::Msg;
pub use error::{Result, TuiGridError};
pub use event_loop::{EventLoop, Model, Options};
pub use screen::{CursorStyle, Screen};
pub use window::Window;
