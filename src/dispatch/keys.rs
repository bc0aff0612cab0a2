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

//! Key-event decoding. Grounded on `vaxis.go::handleSequence`'s key-decode
//! branch for which sequences decode which key, and on the teacher's
//! `core/ansi/vt_100_terminal_input_parser/keyboard.rs` for the Rust idiom
//! of a typed decode function returning a structured event rather than a
//! raw byte echo.
//!
//! Functional keys with no Unicode codepoint of their own (arrows, Home/End,
//! function keys, ...) are represented using the kitty keyboard protocol's
//! private-use-area codepoint block, so a single `u32` field covers both
//! printable and functional keys uniformly (spec.md §4.2, key-event
//! decoder).

use crate::parser::sequence::Sequence;

use super::messages::{KeyEvent, KeyEventKind, Modifiers};

pub mod pua {
    pub const ESCAPE: u32 = 57344;
    pub const ENTER: u32 = 57345;
    pub const TAB: u32 = 57346;
    pub const BACKSPACE: u32 = 57347;
    pub const INSERT: u32 = 57348;
    pub const DELETE: u32 = 57349;
    pub const LEFT: u32 = 57350;
    pub const RIGHT: u32 = 57351;
    pub const UP: u32 = 57352;
    pub const DOWN: u32 = 57353;
    pub const PAGE_UP: u32 = 57354;
    pub const PAGE_DOWN: u32 = 57355;
    pub const HOME: u32 = 57356;
    pub const END: u32 = 57357;
    pub const F1: u32 = 57364;
    pub const F2: u32 = 57365;
    pub const F3: u32 = 57366;
    pub const F4: u32 = 57367;
    pub const F5: u32 = 57368;
    pub const F6: u32 = 57369;
    pub const F7: u32 = 57370;
    pub const F8: u32 = 57371;
    pub const F9: u32 = 57372;
    pub const F10: u32 = 57373;
    pub const F11: u32 = 57374;
    pub const F12: u32 = 57375;
}

/// Decodes a C0 control byte (0x00-0x1F) arriving outside an escape/CSI/DCS
/// context, per xterm's Ctrl-as-C0 convention.
pub fn decode_c0(byte: u8) -> KeyEvent {
    let event = match byte {
        0x09 => KeyEvent::plain(pua::TAB),
        0x0D => KeyEvent::plain(pua::ENTER),
        0x1B => KeyEvent::plain(pua::ESCAPE),
        0x7F => KeyEvent::plain(pua::BACKSPACE),
        // Ctrl+<letter> arrives as the letter's codepoint minus 0x60
        // (e.g. Ctrl+A = 0x01). Report the base letter with ctrl set.
        0x01..=0x1A => {
            let mut key = KeyEvent::plain((byte + 0x60) as u32);
            key.modifiers.ctrl = true;
            key
        }
        _ => {
            let mut key = KeyEvent::plain(byte as u32);
            key.modifiers.ctrl = true;
            key
        }
    };
    event
}

/// Decodes a single printed grapheme cluster into a key press. `grapheme`
/// may be more than one Unicode scalar (e.g. a ZWJ emoji); `codepoint` is
/// the first scalar, `text` carries the full cluster.
pub fn decode_print(grapheme: &str) -> KeyEvent {
    let codepoint = grapheme.chars().next().map(|c| c as u32).unwrap_or(0);
    KeyEvent {
        codepoint,
        shifted_codepoint: None,
        text: Some(grapheme.to_string()),
        modifiers: Modifiers::default(),
        kind: KeyEventKind::Press,
    }
}

/// Decodes `ESC <final>` (Alt+key on most terminals, since Alt is
/// conventionally sent as a lead ESC byte before the key).
pub fn decode_esc(final_byte: u8) -> Option<KeyEvent> {
    if !final_byte.is_ascii_graphic() {
        return None;
    }
    let mut key = KeyEvent::plain(final_byte as u32);
    key.modifiers.alt = true;
    Some(key)
}

/// Decodes `ESC O <final>` (SS3: cursor keys and F1-F4 in application mode).
pub fn decode_ss3(final_byte: u8) -> Option<KeyEvent> {
    let codepoint = match final_byte {
        b'A' => pua::UP,
        b'B' => pua::DOWN,
        b'C' => pua::RIGHT,
        b'D' => pua::LEFT,
        b'H' => pua::HOME,
        b'F' => pua::END,
        b'P' => pua::F1,
        b'Q' => pua::F2,
        b'R' => pua::F3,
        b'S' => pua::F4,
        _ => return None,
    };
    Some(KeyEvent::plain(codepoint))
}

fn csi_modifier(params: &[crate::parser::sequence::Subfields], index: usize) -> Modifiers {
    params
        .get(index)
        .and_then(|p| p.first())
        .map(|&m| Modifiers::from_xterm_param(m))
        .unwrap_or_default()
}

/// Decodes a general CSI sequence as an xterm-style key press: cursor keys
/// (`A`/`B`/`C`/`D`/`H`/`F`, modifier in the first param), and the `~`
/// family (Insert/Delete/PageUp/PageDown/function keys, key code in the
/// first param, modifier in the second).
pub fn decode_xterm_csi(
    params: &[crate::parser::sequence::Subfields],
    final_byte: u8,
) -> Option<KeyEvent> {
    match final_byte {
        b'A' | b'B' | b'C' | b'D' | b'H' | b'F' => {
            let codepoint = match final_byte {
                b'A' => pua::UP,
                b'B' => pua::DOWN,
                b'C' => pua::RIGHT,
                b'D' => pua::LEFT,
                b'H' => pua::HOME,
                b'F' => pua::END,
                _ => unreachable!(),
            };
            let mut key = KeyEvent::plain(codepoint);
            key.modifiers = csi_modifier(params, 1);
            Some(key)
        }
        b'~' => {
            let code = params.first().and_then(|p| p.first()).copied().unwrap_or(0);
            let codepoint = match code {
                1 | 7 => pua::HOME,
                2 => pua::INSERT,
                3 => pua::DELETE,
                4 | 8 => pua::END,
                5 => pua::PAGE_UP,
                6 => pua::PAGE_DOWN,
                11 => pua::F1,
                12 => pua::F2,
                13 => pua::F3,
                14 => pua::F4,
                15 => pua::F5,
                17 => pua::F6,
                18 => pua::F7,
                19 => pua::F8,
                20 => pua::F9,
                21 => pua::F10,
                23 => pua::F11,
                24 => pua::F12,
                _ => return None,
            };
            let mut key = KeyEvent::plain(codepoint);
            key.modifiers = csi_modifier(params, 1);
            Some(key)
        }
        _ => None,
    }
}

/// Decodes the kitty keyboard protocol's `CSI ... u` form:
/// `unicode-key-code[:shifted-key][:base-layout-key];modifiers[:event-type];text-as-codepoints u`.
pub fn decode_kitty_csi_u(params: &[crate::parser::sequence::Subfields]) -> Option<KeyEvent> {
    let key_field = params.first()?;
    let codepoint = *key_field.first()? as u32;
    let shifted_codepoint = key_field.get(1).map(|&c| c as u32);

    let modifiers = params
        .get(1)
        .and_then(|p| p.first())
        .map(|&m| Modifiers::from_xterm_param(m))
        .unwrap_or_default();

    let event_type = params.get(1).and_then(|p| p.get(1)).copied().unwrap_or(1);
    let kind = match event_type {
        2 => KeyEventKind::Repeat,
        3 => KeyEventKind::Release,
        _ => KeyEventKind::Press,
    };

    let text = params
        .get(2)
        .map(|codepoints| codepoints.iter().filter_map(|&c| char::from_u32(c as u32)).collect::<String>())
        .filter(|s| !s.is_empty());

    Some(KeyEvent {
        codepoint,
        shifted_codepoint,
        text,
        modifiers,
        kind,
    })
}

/// Decodes whichever sequence variant the parser handed to the dispatcher
/// as a plain xterm key event, when no special dispatch rule claimed it
/// first (spec.md §4.2, "`Print`/`C0`/`Esc`/`Ss3` → key-event decoder").
pub fn decode(seq: &Sequence) -> Option<KeyEvent> {
    match seq {
        Sequence::Print(g) => Some(decode_print(g)),
        Sequence::C0(b) => Some(decode_c0(*b)),
        Sequence::Esc { final_byte, ignored, .. } if !ignored => decode_esc(*final_byte),
        Sequence::Ss3(b) => decode_ss3(*b),
        Sequence::Csi {
            params,
            final_byte,
            ignored,
            ..
        } if !ignored => decode_xterm_csi(params, *final_byte),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_a_decodes_to_letter_a_with_ctrl_modifier() {
        let key = decode_c0(0x01);
        assert_eq!(key.codepoint, 'a' as u32);
        assert!(key.modifiers.ctrl);
    }

    #[test]
    fn ss3_up_decodes_to_the_up_arrow_pua_codepoint() {
        assert_eq!(decode_ss3(b'A').unwrap().codepoint, pua::UP);
    }

    #[test]
    fn csi_tilde_3_decodes_to_delete() {
        let params: smallvec::SmallVec<[crate::parser::sequence::Subfields; 4]> =
            smallvec::smallvec![smallvec::smallvec![3]];
        let key = decode_xterm_csi(&params, b'~').unwrap();
        assert_eq!(key.codepoint, pua::DELETE);
    }

    #[test]
    fn csi_cursor_key_with_modifier_decodes_shift() {
        let params: smallvec::SmallVec<[crate::parser::sequence::Subfields; 4]> =
            smallvec::smallvec![smallvec::smallvec![1], smallvec::smallvec![2]];
        let key = decode_xterm_csi(&params, b'C').unwrap();
        assert_eq!(key.codepoint, pua::RIGHT);
        assert!(key.modifiers.shift);
    }

    #[test]
    fn kitty_csi_u_decodes_codepoint_and_release_event() {
        let params: smallvec::SmallVec<[crate::parser::sequence::Subfields; 4]> = smallvec::smallvec![
            smallvec::smallvec![97],
            smallvec::smallvec![1, 3],
        ];
        let key = decode_kitty_csi_u(&params).unwrap();
        assert_eq!(key.codepoint, 97);
        assert_eq!(key.kind, KeyEventKind::Release);
    }
}
