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

//! Byte sequences written to the terminal at startup and shutdown.
//! Grounded on `vaxis.go::sendQueries` (the probe sequence) and the
//! `Init`/`Close` control-sequence list documented in spec.md §6.

pub use crate::dispatch::STARTUP_PROBE;

/// Enables the input/display modes this crate relies on: alternate screen,
/// bracketed paste, and SGR mouse tracking (any-event). Kitty-keyboard is
/// deliberately not enabled here: spec.md §4.2 gates that enable write on
/// the terminal's `u` confirmation reply, not on startup
/// (`dispatch::Dispatcher`'s `'u'` confirm branch queues it instead).
pub const ENTER_SEQUENCE: &str = "\x1b[?1049h\x1b[?2004h\x1b[?1003h\x1b[?1006h";

/// The kitty-keyboard enable sequence, written once the terminal confirms
/// protocol support (spec.md §6, `init(options)`: `report_keyboard_events`
/// adds 2 to the default 25).
pub fn kitty_keyboard_enable(kitty_flags: u8) -> String {
    format!("\x1b[>{flags}u", flags = kitty_flags)
}

/// Restores the terminal to its pre-`init` state (spec.md §5,
/// "Initial-state contract at shutdown"): show cursor, reset SGR, clear
/// screen, disable bracketed paste / kitty keyboard / mouse modes, leave
/// alternate screen.
pub const EXIT_SEQUENCE: &str =
    "\x1b[?25h\x1b[0m\x1b[2J\x1b[?2004l\x1b[<u\x1b[?1003l\x1b[?1006l\x1b[?1049l";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_sequence_does_not_eagerly_enable_kitty_keyboard() {
        assert!(!ENTER_SEQUENCE.contains('u'));
    }

    #[test]
    fn kitty_keyboard_enable_carries_the_requested_flags() {
        assert!(kitty_keyboard_enable(27).ends_with(">27u"));
    }

    #[test]
    fn exit_sequence_shows_the_cursor_and_leaves_alt_screen() {
        assert!(EXIT_SEQUENCE.contains("?25h"));
        assert!(EXIT_SEQUENCE.ends_with("?1049l"));
    }
}
