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

//! The character-cell model. Grounded on `vaxis.go`'s `Cell`/`Attribute`
//! fields for the field set, and on the teacher's `tui_style_attribs.rs` for
//! the bitflags-over-`u8` idiom.

use crate::color::Color;
use std::ops::{BitAnd, BitOr, BitXor};

/// SGR attribute bits, as a plain `u8` mask rather than a struct of `Option`
/// flags (contrast the teacher's `TuiStyleAttribs`) because the renderer
/// diffs attribute state with bitwise on/off operations (spec.md §4.3,
/// "Attributes: compute on_bits/off_bits").
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Attributes(u8);

impl Attributes {
    pub const BOLD: Attributes = Attributes(0b0000_0001);
    pub const DIM: Attributes = Attributes(0b0000_0010);
    pub const ITALIC: Attributes = Attributes(0b0000_0100);
    pub const BLINK: Attributes = Attributes(0b0000_1000);
    pub const REVERSE: Attributes = Attributes(0b0001_0000);
    pub const INVISIBLE: Attributes = Attributes(0b0010_0000);
    pub const STRIKETHROUGH: Attributes = Attributes(0b0100_0000);

    pub const fn empty() -> Self {
        Attributes(0)
    }

    pub const fn contains(self, other: Attributes) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Attributes {
    type Output = Attributes;
    fn bitor(self, rhs: Attributes) -> Attributes {
        Attributes(self.0 | rhs.0)
    }
}

impl BitAnd for Attributes {
    type Output = Attributes;
    fn bitand(self, rhs: Attributes) -> Attributes {
        Attributes(self.0 & rhs.0)
    }
}

impl BitXor for Attributes {
    type Output = Attributes;
    fn bitxor(self, rhs: Attributes) -> Attributes {
        Attributes(self.0 ^ rhs.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum UnderlineStyle {
    #[default]
    Off,
    Single,
    Double,
    Curly,
    Dotted,
    Dashed,
}

/// The unit of display. Two cells compare equal iff every field matches
/// (spec.md §3); the renderer relies on this for its delta scan.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Cell {
    /// A single extended grapheme cluster, or empty for a blank cell.
    pub grapheme: String,
    pub foreground: Color,
    pub background: Color,
    pub underline_color: Color,
    pub attributes: Attributes,
    pub underline_style: UnderlineStyle,
    pub hyperlink: String,
    pub hyperlink_id: String,
    /// True when this cell is locked by a graphic placement (spec.md §3,
    /// `Placement`); the renderer skips overwriting it until the placement
    /// is removed.
    pub sixel: bool,
}

impl Cell {
    pub fn blank() -> Self {
        Cell::default()
    }

    pub fn with_grapheme(grapheme: impl Into<String>) -> Self {
        Cell {
            grapheme: grapheme.into(),
            ..Cell::default()
        }
    }

    /// True when this cell carries no visible content and the terminal's
    /// default styling, i.e. it is indistinguishable from an untouched cell.
    pub fn is_empty(&self) -> bool {
        self.grapheme.is_empty() && !self.sixel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cells_compare_equal() {
        assert_eq!(Cell::blank(), Cell::blank());
    }

    #[test]
    fn differing_grapheme_breaks_equality() {
        assert_ne!(Cell::with_grapheme("A"), Cell::with_grapheme("B"));
    }

    #[test]
    fn attribute_on_off_bit_diff() {
        let old = Attributes::BOLD | Attributes::ITALIC;
        let new = Attributes::ITALIC | Attributes::DIM;
        let changed = old ^ new;
        let on = changed & new;
        let off = changed & old;
        assert_eq!(on, Attributes::DIM);
        assert_eq!(off, Attributes::BOLD);
    }
}
