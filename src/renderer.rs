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

//! Double-buffered delta renderer. Grounded directly on `vaxis.go::render()`:
//! placement diff pass first, then a cell-by-cell scan against the previous
//! frame that only emits bytes for what changed, with `reposition`-tracked
//! cursor addressing and synchronized-update bracketing.

use std::fmt::Write as _;

use crate::capabilities::Capabilities;
use crate::cell::{Attributes, Cell, UnderlineStyle};
use crate::color::Color;
use crate::graphemes::rendered_width;
use crate::placement::Placement;
use crate::screen::{CursorStyle, Screen};

mod codes {
    pub const SGR_RESET: &str = "\x1b[0m";
    pub const FG_RESET: &str = "\x1b[39m";
    pub const BG_RESET: &str = "\x1b[49m";
    pub const UL_COLOR_RESET: &str = "\x1b[59m";
    pub const BOLD_SET: &str = "\x1b[1m";
    pub const DIM_SET: &str = "\x1b[2m";
    pub const ITALIC_SET: &str = "\x1b[3m";
    pub const BLINK_SET: &str = "\x1b[5m";
    pub const REVERSE_SET: &str = "\x1b[7m";
    pub const HIDDEN_SET: &str = "\x1b[8m";
    pub const STRIKETHROUGH_SET: &str = "\x1b[9m";
    pub const BOLD_DIM_RESET: &str = "\x1b[22m";
    pub const ITALIC_RESET: &str = "\x1b[23m";
    pub const BLINK_RESET: &str = "\x1b[25m";
    pub const REVERSE_RESET: &str = "\x1b[27m";
    pub const HIDDEN_RESET: &str = "\x1b[28m";
    pub const STRIKETHROUGH_RESET: &str = "\x1b[29m";
    pub const UNDERLINE_SET: &str = "\x1b[4m";
    pub const UNDERLINE_RESET: &str = "\x1b[24m";
    pub const OSC8_END: &str = "\x1b]8;;\x07";
    pub const CURSOR_HIDE: &str = "\x1b[?25l";
    pub const CURSOR_SHOW: &str = "\x1b[?25h";
    pub const SYNC_SET: &str = "\x1b[?2026h";
    pub const SYNC_RESET: &str = "\x1b[?2026l";
}

/// Advances past the companion columns of a wide cell, nulling them out in
/// `last_render` so a later diff pass doesn't see stale width-1 sentinels
/// (`vaxis.go::advance`).
fn advance(grapheme: &str, unicode_capable: bool) -> usize {
    rendered_width(grapheme, unicode_capable).saturating_sub(1)
}

fn write_color_sgr(out: &mut String, color: Color, rgb_capable: bool, set: impl FnOnce(&mut String, &[u32])) {
    let color = if rgb_capable { color } else { color.as_indexed() };
    let params = color.params();
    set(out, &params);
}

fn write_fg(out: &mut String, color: Color, rgb_capable: bool) {
    write_color_sgr(out, color, rgb_capable, |out, ps| match ps {
        [] => out.push_str(codes::FG_RESET),
        [p] if *p < 8 => {
            let _ = write!(out, "\x1b[3{p}m");
        }
        [p] if *p < 16 => {
            let _ = write!(out, "\x1b[9{}m", p - 8);
        }
        [p] => {
            let _ = write!(out, "\x1b[38;5;{p}m");
        }
        [r, g, b] => {
            let _ = write!(out, "\x1b[38;2;{r};{g};{b}m");
        }
        _ => {}
    });
}

fn write_bg(out: &mut String, color: Color, rgb_capable: bool) {
    write_color_sgr(out, color, rgb_capable, |out, ps| match ps {
        [] => out.push_str(codes::BG_RESET),
        [p] if *p < 8 => {
            let _ = write!(out, "\x1b[4{p}m");
        }
        [p] if *p < 16 => {
            let _ = write!(out, "\x1b[10{}m", p - 8);
        }
        [p] => {
            let _ = write!(out, "\x1b[48;5;{p}m");
        }
        [r, g, b] => {
            let _ = write!(out, "\x1b[48;2;{r};{g};{b}m");
        }
        _ => {}
    });
}

fn write_underline_color(out: &mut String, color: Color, rgb_capable: bool) {
    write_color_sgr(out, color, rgb_capable, |out, ps| match ps {
        [] => out.push_str(codes::UL_COLOR_RESET),
        [p] => {
            let _ = write!(out, "\x1b[58;5;{p}m");
        }
        [r, g, b] => {
            let _ = write!(out, "\x1b[58;2;{r};{g};{b}m");
        }
        _ => {}
    });
}

fn write_attr_diff(out: &mut String, prev: Attributes, next: Attributes) {
    let changed = prev ^ next;
    let on = changed & next;
    let off = changed & prev;
    if on.contains(Attributes::BOLD) {
        out.push_str(codes::BOLD_SET);
    }
    if on.contains(Attributes::DIM) {
        out.push_str(codes::DIM_SET);
    }
    if on.contains(Attributes::ITALIC) {
        out.push_str(codes::ITALIC_SET);
    }
    if on.contains(Attributes::BLINK) {
        out.push_str(codes::BLINK_SET);
    }
    if on.contains(Attributes::REVERSE) {
        out.push_str(codes::REVERSE_SET);
    }
    if on.contains(Attributes::INVISIBLE) {
        out.push_str(codes::HIDDEN_SET);
    }
    if on.contains(Attributes::STRIKETHROUGH) {
        out.push_str(codes::STRIKETHROUGH_SET);
    }
    // Normal intensity (SGR 22) clears both bold and dim in terminfo, so
    // turning either off and leaving the other on needs it re-asserted.
    if off.contains(Attributes::BOLD) {
        out.push_str(codes::BOLD_DIM_RESET);
        if next.contains(Attributes::DIM) {
            out.push_str(codes::DIM_SET);
        }
    }
    if off.contains(Attributes::DIM) {
        out.push_str(codes::BOLD_DIM_RESET);
        if next.contains(Attributes::BOLD) {
            out.push_str(codes::BOLD_SET);
        }
    }
    if off.contains(Attributes::ITALIC) {
        out.push_str(codes::ITALIC_RESET);
    }
    if off.contains(Attributes::BLINK) {
        out.push_str(codes::BLINK_RESET);
    }
    if off.contains(Attributes::REVERSE) {
        out.push_str(codes::REVERSE_RESET);
    }
    if off.contains(Attributes::INVISIBLE) {
        out.push_str(codes::HIDDEN_RESET);
    }
    if off.contains(Attributes::STRIKETHROUGH) {
        out.push_str(codes::STRIKETHROUGH_RESET);
    }
}

fn write_underline_style(out: &mut String, style: UnderlineStyle, styled_underlines: bool) {
    if styled_underlines {
        let n = match style {
            UnderlineStyle::Off => 0,
            UnderlineStyle::Single => 1,
            UnderlineStyle::Double => 2,
            UnderlineStyle::Curly => 3,
            UnderlineStyle::Dotted => 4,
            UnderlineStyle::Dashed => 5,
        };
        let _ = write!(out, "\x1b[4:{n}m");
    } else {
        match style {
            UnderlineStyle::Off => out.push_str(codes::UNDERLINE_RESET),
            _ => out.push_str(codes::UNDERLINE_SET),
        }
    }
}

fn write_hyperlink(out: &mut String, link: &str, id: &str) {
    match (link, id) {
        ("", "") => out.push_str(codes::OSC8_END),
        (link, "") => {
            let _ = write!(out, "\x1b]8;;{link}\x07");
        }
        (link, id) => {
            let _ = write!(out, "\x1b]8;id={id};{link}\x07");
        }
    }
}

fn cursor_style_code(style: CursorStyle) -> u8 {
    match style {
        CursorStyle::Default => 0,
        CursorStyle::BlockBlinking => 1,
        CursorStyle::Block => 2,
        CursorStyle::UnderlineBlinking => 3,
        CursorStyle::Underline => 4,
        CursorStyle::BeamBlinking => 5,
        CursorStyle::Beam => 6,
    }
}

/// The previous frame plus graphic placements, held across renders to
/// compute the next diff (spec.md §3, `Renderer`/`lastRender`).
pub struct Renderer {
    last_render: Screen,
    last_placements: std::collections::HashMap<u32, Placement>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            last_render: Screen::new(),
            last_placements: std::collections::HashMap::new(),
        }
    }

    /// Produces the escape-sequence bytes needed to bring the terminal from
    /// the last rendered frame to `screen`'s current state. `refresh` forces
    /// every cell to be treated as changed (spec.md §4.5, `Refresh`).
    pub fn render(&mut self, screen: &Screen, next_placements: &std::collections::HashMap<u32, Placement>, caps: &Capabilities, refresh: bool) -> String {
        let (cols, rows) = screen.size();
        if self.last_render.size() != (cols, rows) {
            self.last_render.resize(cols, rows);
        }

        let mut out = String::new();
        let cursor_was_visible = screen.cursor.visible;

        let stale_ids: Vec<u32> = self
            .last_placements
            .keys()
            .filter(|id| refresh || !next_placements.contains_key(*id))
            .copied()
            .collect();
        for id in stale_ids {
            if out.is_empty() {
                if cursor_was_visible {
                    out.push_str(codes::CURSOR_HIDE);
                }
                if caps.synchronized_update {
                    out.push_str(codes::SYNC_SET);
                }
            }
            if let Some(p) = self.last_placements.remove(&id) {
                out.push_str(&String::from_utf8_lossy(&p.delete_bytes));
            }
        }
        for (id, p) in next_placements {
            if self.last_placements.contains_key(id) {
                continue;
            }
            if out.is_empty() {
                if cursor_was_visible {
                    out.push_str(codes::CURSOR_HIDE);
                }
                if caps.synchronized_update {
                    out.push_str(codes::SYNC_SET);
                }
            }
            let _ = write!(out, "\x1b[{};{}H", p.row + 1, p.col + 1);
            out.push_str(&String::from_utf8_lossy(&p.draw_bytes));
            self.last_placements.insert(*id, p.clone());
        }

        let mut reposition = true;
        let mut fg = Color::default();
        let mut bg = Color::default();
        let mut ul = Color::default();
        let mut ul_style = UnderlineStyle::default();
        let mut attr = Attributes::empty();
        let mut link = String::new();
        let mut link_id = String::new();

        for row in 0..rows {
            let mut col = 0usize;
            while col < cols {
                let next = screen.cell(col, row).cloned().unwrap_or_default();
                if next.sixel {
                    if let Some(c) = self.last_render_cell_mut(col, row) {
                        c.sixel = true;
                    }
                    reposition = true;
                    col += 1;
                    continue;
                }
                let unchanged = !refresh && self.last_render.cell(col, row) == Some(&next);
                if unchanged {
                    reposition = true;
                    let skip = advance(&next.grapheme, caps.unicode);
                    for i in 1..=skip {
                        if col + i >= cols {
                            break;
                        }
                        self.last_render.set_cell_raw(col + i, row, Cell::blank());
                    }
                    col += skip + 1;
                    continue;
                }
                if out.is_empty() {
                    if cursor_was_visible {
                        out.push_str(codes::CURSOR_HIDE);
                    }
                    if caps.synchronized_update {
                        out.push_str(codes::SYNC_SET);
                    }
                }
                self.last_render.set_cell_raw(col, row, next.clone());
                if reposition {
                    let _ = write!(out, "\x1b[{};{}H", row + 1, col + 1);
                    reposition = false;
                }
                if fg != next.foreground {
                    fg = next.foreground;
                    write_fg(&mut out, fg, caps.rgb);
                }
                if bg != next.background {
                    bg = next.background;
                    write_bg(&mut out, bg, caps.rgb);
                }
                if caps.styled_underlines && ul != next.underline_color {
                    ul = next.underline_color;
                    write_underline_color(&mut out, ul, caps.rgb);
                }
                if attr != next.attributes {
                    write_attr_diff(&mut out, attr, next.attributes);
                    attr = next.attributes;
                }
                if ul_style != next.underline_style {
                    ul_style = next.underline_style;
                    write_underline_style(&mut out, ul_style, caps.styled_underlines);
                }
                if link != next.hyperlink || link_id != next.hyperlink_id {
                    link = next.hyperlink.clone();
                    link_id = next.hyperlink_id.clone();
                    write_hyperlink(&mut out, &link, &link_id);
                }
                out.push_str(&next.grapheme);
                let skip = advance(&next.grapheme, caps.unicode);
                for i in 1..=skip {
                    if col + i >= cols {
                        break;
                    }
                    self.last_render.set_cell_raw(col + i, row, Cell::blank());
                }
                col += skip + 1;
            }
        }

        if !out.is_empty() {
            out.push_str(codes::SGR_RESET);
            if caps.synchronized_update {
                out.push_str(codes::SYNC_RESET);
            }
        }
        if cursor_was_visible {
            let _ = write!(
                out,
                "\x1b[{} q\x1b[{};{}H{}",
                cursor_style_code(screen.cursor.style),
                screen.cursor.row + 1,
                screen.cursor.col + 1,
                codes::CURSOR_SHOW
            );
        } else {
            out.push_str(codes::CURSOR_HIDE);
        }
        out
    }

    fn last_render_cell_mut(&mut self, col: usize, row: usize) -> Option<&mut Cell> {
        let (cols, rows) = self.last_render.size();
        if col >= cols || row >= rows {
            return None;
        }
        self.last_render.row_mut(row).and_then(|r| r.get_mut(col))
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn screen(cols: usize, rows: usize) -> Screen {
        let mut s = Screen::new();
        s.resize(cols, rows);
        s
    }

    #[test]
    fn unchanged_frame_emits_no_bytes_but_cursor_hide() {
        let mut r = Renderer::new();
        let s = screen(4, 2);
        let caps = Capabilities::new();
        let empty = HashMap::new();
        let first = r.render(&s, &empty, &caps, false);
        assert!(!first.is_empty());
        let second = r.render(&s, &empty, &caps, false);
        assert_eq!(second, codes::CURSOR_HIDE);
    }

    #[test]
    fn changed_cell_repositions_and_writes_grapheme() {
        let mut r = Renderer::new();
        let mut s = screen(4, 2);
        let caps = Capabilities::new();
        let empty = HashMap::new();
        r.render(&s, &empty, &caps, false);
        s.set_cell(1, 0, Cell::with_grapheme("X"), true);
        let out = r.render(&s, &empty, &caps, false);
        assert!(out.contains("X"));
        assert!(out.contains("\x1b[1;2H"));
    }

    #[test]
    fn refresh_forces_a_full_redraw_even_if_unchanged() {
        let mut r = Renderer::new();
        let s = screen(2, 1);
        let caps = Capabilities::new();
        let empty = HashMap::new();
        r.render(&s, &empty, &caps, false);
        let out = r.render(&s, &empty, &caps, true);
        assert!(out.contains("\x1b[1;1H"));
    }
}
