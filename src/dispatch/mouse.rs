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

//! SGR mouse decoding. Grounded on the teacher's
//! `core/ansi/vt_100_terminal_input_parser/mouse.rs::parse_sgr_mouse` for the
//! button/modifier/scroll bit layout, adapted to consume an already-tokenized
//! `Sequence::Csi` rather than a raw byte buffer (this crate's parser has
//! already split the `<` private marker into `intermediates` and the
//! `Cb;Cx;Cy` fields into `params`).

use crate::parser::sequence::Subfields;
use smallvec::SmallVec;

use super::messages::{Modifiers, MouseAction, MouseButton, MouseEvent};

/// Decodes `CSI < Cb ; Cx ; Cy M/m` (spec.md §4.2, "`Csi` final `M`/`m` →
/// SGR mouse event"). Returns `None` if the field count or values are
/// malformed.
pub fn decode_sgr(params: &SmallVec<[Subfields; 4]>, final_byte: u8) -> Option<MouseEvent> {
    if params.len() < 3 {
        return None;
    }
    let cb = *params[0].first()?;
    let col = *params[1].first()?;
    let row = *params[2].first()?;
    if col < 1 || row < 1 {
        return None;
    }

    let modifiers = Modifiers {
        shift: cb & 4 != 0,
        alt: cb & 8 != 0,
        ctrl: cb & 16 != 0,
        super_: false,
    };
    let is_motion = cb & 32 != 0;
    let is_scroll = cb & 64 != 0;
    let is_extended_button = cb & 128 != 0;

    let (button, action) = if is_scroll {
        let button = match cb & 0x3 {
            0 => MouseButton::WheelUp,
            1 => MouseButton::WheelDown,
            2 => MouseButton::WheelLeft,
            3 => MouseButton::WheelRight,
            _ => MouseButton::None,
        };
        (button, MouseAction::Press)
    } else if is_extended_button {
        // Buttons 8-10 (cb bits 0-1 plus the 128 flag), treated as generic
        // side buttons; this crate doesn't name them individually.
        let action = if final_byte == b'M' {
            if is_motion { MouseAction::Drag } else { MouseAction::Press }
        } else {
            MouseAction::Release
        };
        (MouseButton::None, action)
    } else {
        let button = match cb & 0x3 {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::None,
        };
        let action = if is_motion {
            if button == MouseButton::None {
                MouseAction::Motion
            } else {
                MouseAction::Drag
            }
        } else if final_byte == b'M' {
            MouseAction::Press
        } else {
            MouseAction::Release
        };
        (button, action)
    };

    Some(MouseEvent {
        button,
        action,
        col: (col - 1) as usize,
        row: (row - 1) as usize,
        modifiers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(cb: i64, col: i64, row: i64) -> SmallVec<[Subfields; 4]> {
        smallvec::smallvec![
            smallvec::smallvec![cb],
            smallvec::smallvec![col],
            smallvec::smallvec![row],
        ]
    }

    #[test]
    fn left_press_decodes_zero_based_coordinates() {
        let event = decode_sgr(&params(0, 1, 1), b'M').unwrap();
        assert_eq!(event.button, MouseButton::Left);
        assert_eq!(event.action, MouseAction::Press);
        assert_eq!((event.col, event.row), (0, 0));
    }

    #[test]
    fn release_uses_the_lowercase_final_byte() {
        let event = decode_sgr(&params(0, 5, 5), b'm').unwrap();
        assert_eq!(event.action, MouseAction::Release);
    }

    #[test]
    fn drag_sets_motion_bit_with_a_button_held() {
        let event = decode_sgr(&params(0 | 32, 3, 3), b'M').unwrap();
        assert_eq!(event.action, MouseAction::Drag);
    }

    #[test]
    fn wheel_up_decodes_as_a_scroll_button() {
        let event = decode_sgr(&params(64, 2, 2), b'M').unwrap();
        assert_eq!(event.button, MouseButton::WheelUp);
    }

    #[test]
    fn shift_modifier_bit_is_decoded() {
        let event = decode_sgr(&params(4, 1, 1), b'M').unwrap();
        assert!(event.modifiers.shift);
    }
}
