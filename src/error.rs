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

//! Grounded on `core/resilient_reactor_thread/rrt_types.rs::SubscribeError`
//! for the `thiserror` + `miette::Diagnostic` shape.

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TuiGridError {
    #[error("failed to enable raw mode on the controlling terminal")]
    #[diagnostic(
        code(tuigrid::raw_mode_unavailable),
        help("Is stdin/stdout a real TTY? tuigrid cannot run against a pipe.")
    )]
    RawModeUnavailable(#[source] std::io::Error),

    #[error("terminal did not answer Primary Device Attributes within {0:?}")]
    #[diagnostic(
        code(tuigrid::startup_timeout),
        help("The terminal may not be VT100-compatible, or stdout is not connected to one.")
    )]
    StartupTimeout(std::time::Duration),

    #[error("clipboard read deadline elapsed")]
    #[diagnostic(code(tuigrid::clipboard_timeout))]
    ClipboardTimeout,

    #[error(transparent)]
    #[diagnostic(code(tuigrid::io))]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TuiGridError>;
