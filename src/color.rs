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

//! Terminal color model. See `tui_color.rs` in the teacher crate for the enum
//! shape this is grounded on; the downgrade path (`as_indexed`) is grounded on
//! `vaxis.go`'s `Color.AsIndex`.

use smallvec::SmallVec;

/// A terminal color. `Default` means "use the terminal's configured default
/// foreground/background", distinct from any explicit color value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Color {
    #[default]
    Default,
    /// An index into the 256-color palette. 0-7 are the basic ANSI colors,
    /// 8-15 are their bright variants, 16-255 are the extended palette.
    Indexed(u8),
    Rgb(u8, u8, u8),
}

impl Color {
    /// SGR parameter list for this color. Empty means "reset to default".
    pub fn params(self) -> SmallVec<[u32; 3]> {
        match self {
            Color::Default => SmallVec::new(),
            Color::Indexed(i) => SmallVec::from_slice(&[u32::from(i)]),
            Color::Rgb(r, g, b) => {
                SmallVec::from_slice(&[u32::from(r), u32::from(g), u32::from(b)])
            }
        }
    }

    /// Downgrades an RGB color to its nearest 256-color palette index. Indexed
    /// and Default colors pass through unchanged.
    pub fn as_indexed(self) -> Color {
        match self {
            Color::Rgb(r, g, b) => Color::Indexed(rgb_to_ansi256(r, g, b)),
            other => other,
        }
    }
}

/// Maps an RGB triple to the closest color in the standard 256-color cube,
/// falling back to the grayscale ramp when that's a tighter match.
fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    // Grayscale ramp candidate: 24 steps from 8 to 238.
    let gray_avg = (u16::from(r) + u16::from(g) + u16::from(b)) / 3;
    let gray_idx = if gray_avg > 238 {
        23
    } else {
        ((gray_avg.saturating_sub(8)) / 10).min(23) as u8
    };
    let gray_level = 8 + u16::from(gray_idx) * 10;
    let gray_dist = gray_avg.abs_diff(gray_level);

    // 6x6x6 color cube candidate.
    let to_cube = |c: u8| -> u8 {
        if c < 48 {
            0
        } else if c < 115 {
            1
        } else {
            ((u16::from(c) - 35) / 40).min(5) as u8
        }
    };
    let (cr, cg, cb) = (to_cube(r), to_cube(g), to_cube(b));
    let cube_level = |level: u8| -> u16 {
        if level == 0 {
            0
        } else {
            u16::from(level) * 40 + 55
        }
    };
    let cube_dist = (u16::from(r).abs_diff(cube_level(cr)))
        + (u16::from(g).abs_diff(cube_level(cg)))
        + (u16::from(b).abs_diff(cube_level(cb)));

    if u16::from(gray_dist) * 3 <= cube_dist {
        232 + gray_idx
    } else {
        16 + 36 * cr + 6 * cg + cb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_color_has_no_params() {
        assert!(Color::Default.params().is_empty());
    }

    #[test]
    fn indexed_passes_through_downgrade() {
        assert_eq!(Color::Indexed(42).as_indexed(), Color::Indexed(42));
    }

    #[test]
    fn pure_red_downgrades_to_a_cube_entry() {
        let downgraded = Color::Rgb(255, 0, 0).as_indexed();
        assert_eq!(downgraded, Color::Indexed(196));
    }

    #[test]
    fn mid_gray_downgrades_to_the_gray_ramp() {
        let downgraded = Color::Rgb(128, 128, 128).as_indexed();
        match downgraded {
            Color::Indexed(idx) => assert!((232..=255).contains(&idx)),
            _ => panic!("expected indexed color"),
        }
    }
}
