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

//! The high-level message types the dispatcher produces. Grounded on the
//! teacher's `core/ansi/vt_100_terminal_input_parser/ir_event_types.rs`
//! (`VT100InputEventIR` and its modifier/button/action sub-types) for the
//! shape of a small closed enum with a typed modifier bitset, adapted to the
//! message set spec.md §4.2 names.

/// Keyboard/mouse modifier state, shared by key and mouse events.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub super_: bool,
}

impl Modifiers {
    /// Decodes the xterm modifier parameter (`1 + bitmask`, 0/1 both mean
    /// "no modifiers").
    pub fn from_xterm_param(param: i64) -> Self {
        let bits = (param - 1).max(0);
        Modifiers {
            shift: bits & 0b0001 != 0,
            alt: bits & 0b0010 != 0,
            ctrl: bits & 0b0100 != 0,
            super_: bits & 0b1000 != 0,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KeyEventKind {
    Press,
    Repeat,
    Release,
}

/// A single key event. `codepoint` is 0 when the key has no printable
/// Unicode value (arrows, function keys); non-zero otherwise, matching
/// xterm/kitty-keyboard's own convention of carrying the base codepoint as
/// the primary field (spec.md §4.2, "key-event decoder per xterm
/// conventions").
#[derive(Clone, PartialEq, Debug)]
pub struct KeyEvent {
    pub codepoint: u32,
    pub shifted_codepoint: Option<u32>,
    pub text: Option<String>,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    pub fn plain(codepoint: u32) -> Self {
        KeyEvent {
            codepoint,
            shifted_codepoint: None,
            text: None,
            modifiers: Modifiers::default(),
            kind: KeyEventKind::Press,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
    WheelLeft,
    WheelRight,
    None,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MouseAction {
    Press,
    Release,
    Motion,
    Drag,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MouseEvent {
    pub button: MouseButton,
    pub action: MouseAction,
    pub col: usize,
    pub row: usize,
    pub modifiers: Modifiers,
}

/// The messages posted to the event loop's queue (spec.md §5, "A message
/// queue receives: resize events, timer ticks ..., host-posted custom
/// messages, draw requests").
#[derive(PartialEq, Debug)]
pub enum Msg {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Paste(String),
    Resize { cols: usize, rows: usize },
    /// Terminal capability state changed (a probe reply updated the
    /// registry); the host may want to re-draw once capabilities settle.
    CapabilitiesChanged,
    /// OSC 52 clipboard-paste reply, decoded from base64.
    ClipboardPaste(String),
    /// `DSRCPR` reply to an explicit cursor-position request.
    CursorPosition { col: usize, row: usize },
    /// Host-posted custom message, opaque to the dispatcher.
    Custom(CustomMsg),
    /// A periodic render tick at the configured frame rate.
    Tick,
    Quit,
}

/// Wrapper around a host-posted payload. Equality and debug-formatting are
/// necessarily shallow since the payload type is erased.
pub struct CustomMsg(pub Box<dyn std::any::Any + Send>);

impl std::fmt::Debug for CustomMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Custom(..)")
    }
}

impl PartialEq for CustomMsg {
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}
