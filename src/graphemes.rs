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

//! Grapheme-cluster width helpers. Grounded on `vaxis.go`'s
//! `RenderedWidth`/`queryUnicodeSupport` and the teacher's `gc_string` module
//! for the idea of caching cluster widths, implemented here with
//! `unicode-segmentation` + `unicode-width` in place of vaxis's `uniseg`.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// The test grapheme used to probe whether a terminal renders extended
/// grapheme clusters as a single glyph. A woman-astronaut ZWJ sequence is
/// ~1.5 cells wide in correct renderers and ~4 cells wide (one per
/// codepoint) in renderers that don't join ZWJ sequences.
pub const UNICODE_PROBE_GRAPHEME: &str = "\u{1F469}\u{200D}\u{1F680}";

/// Splits `s` into extended grapheme clusters (spec.md §3, `Characters`).
pub fn characters(s: &str) -> Vec<&str> {
    s.graphemes(true).collect()
}

/// Rendered width of a single grapheme cluster when the terminal has full
/// Unicode grapheme support.
pub fn cluster_width(cluster: &str) -> usize {
    UnicodeWidthStr::width(cluster).max(if cluster.is_empty() { 0 } else { 1 })
}

/// Per-codepoint width estimate, used as a fallback for terminals that fail
/// the unicode-support probe (spec.md §3 "Rendered width").
pub fn narrow_width(s: &str) -> usize {
    s.chars()
        .map(|c| unicode_width::UnicodeWidthChar::width(c).unwrap_or(0))
        .sum()
}

/// Rendered width of `s`, dispatching on the detected unicode capability.
pub fn rendered_width(s: &str, unicode_capable: bool) -> usize {
    if unicode_capable {
        UnicodeWidthStr::width(s)
    } else {
        narrow_width(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_splits_one_cluster_per_char() {
        assert_eq!(characters("Hi"), vec!["H", "i"]);
    }

    #[test]
    fn family_emoji_is_a_single_cluster() {
        let clusters = characters(UNICODE_PROBE_GRAPHEME);
        assert_eq!(clusters.len(), 1);
    }

    #[test]
    fn wide_cjk_character_has_width_two() {
        assert_eq!(cluster_width("\u{4e2d}"), 2);
    }
}
