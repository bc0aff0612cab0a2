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

//! Virtual rectangle composition with parent-relative coordinates.
//! Grounded almost directly on `examples/original_source/window.go`: the
//! `-1`-means-fill-parent convention, clipping rules, and recursive
//! `SetCell`/`Size`/`origin` delegation are carried over in full.

use std::cell::RefCell;

use crate::cell::Cell;
use crate::graphemes::characters;
use crate::screen::{CursorStyle, Screen};

/// A window either anchors directly to the root screen, or is parented to
/// another window. Per spec.md's design notes, child windows borrow their
/// parent rather than copying it by pointer (as the Go original does), so
/// the lifetime system enforces that a window cannot outlive its ancestors.
enum Parent<'a> {
    Root {
        screen: &'a RefCell<Screen>,
        unicode_capable: bool,
    },
    Window(&'a Window<'a>),
}

/// A rectangle `(parent, col_off, row_off, width, height)` (spec.md §3,
/// `Window`). `width`/`height` of `-1` means "extend to fill the remaining
/// parent space"; origin `(0, 0)` is the top-left.
pub struct Window<'a> {
    col_off: isize,
    row_off: isize,
    width: isize,
    height: isize,
    parent: Parent<'a>,
}

impl<'a> Window<'a> {
    /// The root window, anchored to the screen itself.
    pub fn root(screen: &'a RefCell<Screen>, unicode_capable: bool) -> Self {
        Window {
            col_off: 0,
            row_off: 0,
            width: -1,
            height: -1,
            parent: Parent::Root {
                screen,
                unicode_capable,
            },
        }
    }

    /// A new child window, offset `(col, row)` from `parent`'s origin. The
    /// child cannot exist outside its parent's window (§3 invariant).
    pub fn new_window(parent: &'a Window<'a>, col: isize, row: isize, width: isize, height: isize) -> Self {
        Window {
            col_off: col,
            row_off: row,
            width,
            height,
            parent: Parent::Window(parent),
        }
    }

    fn parent_size(&self) -> (usize, usize) {
        match &self.parent {
            Parent::Root { screen, .. } => screen.borrow().size(),
            Parent::Window(w) => w.size(),
        }
    }

    /// Visible size of the window in character cells, resolving `-1`/
    /// over-size through parent clamping (spec.md §4.4).
    pub fn size(&self) -> (usize, usize) {
        let (parent_cols, parent_rows) = self.parent_size();
        let width = if self.col_off + self.width > parent_cols as isize {
            (parent_cols as isize - self.col_off).max(0)
        } else if self.width < 0 {
            (parent_cols as isize - self.col_off).max(0)
        } else {
            self.width
        };
        let height = if self.row_off + self.height > parent_rows as isize {
            (parent_rows as isize - self.row_off).max(0)
        } else if self.height < 0 {
            (parent_rows as isize - self.row_off).max(0)
        } else {
            self.height
        };
        (width.max(0) as usize, height.max(0) as usize)
    }

    /// Places `cell` at `(col, row)` within this window's local coordinate
    /// space. Writes outside the visible area are silently discarded,
    /// returning 0 (spec.md §7). Returns the extra columns to advance by.
    pub fn set_cell(&self, col: isize, row: isize, cell: Cell) -> usize {
        let (cols, rows) = self.size();
        if cols == 0 || rows == 0 || col < 0 || row < 0 || col as usize >= cols || row as usize >= rows {
            return 0;
        }
        let abs_col = col + self.col_off;
        let abs_row = row + self.row_off;
        match &self.parent {
            Parent::Root {
                screen,
                unicode_capable,
            } => screen
                .borrow_mut()
                .set_cell(abs_col as usize, abs_row as usize, cell, *unicode_capable),
            Parent::Window(w) => w.set_cell(abs_col, abs_row, cell),
        }
    }

    pub fn show_cursor(&self, col: isize, row: isize, style: CursorStyle) {
        let abs_col = col + self.col_off;
        let abs_row = row + self.row_off;
        match &self.parent {
            Parent::Root { screen, .. } => {
                let mut screen = screen.borrow_mut();
                screen.cursor.col = abs_col.max(0) as usize;
                screen.cursor.row = abs_row.max(0) as usize;
                screen.cursor.style = style;
                screen.cursor.visible = true;
            }
            Parent::Window(w) => w.show_cursor(abs_col, abs_row, style),
        }
    }

    /// Accumulated offset from the root, 0-indexed.
    pub fn origin(&self) -> (isize, isize) {
        let (mut col, mut row) = (self.col_off, self.row_off);
        let mut parent = &self.parent;
        loop {
            match parent {
                Parent::Root { .. } => return (col, row),
                Parent::Window(w) => {
                    col += w.col_off;
                    row += w.row_off;
                    parent = &w.parent;
                }
            }
        }
    }

    fn unicode_capable(&self) -> bool {
        match &self.parent {
            Parent::Root {
                unicode_capable, ..
            } => *unicode_capable,
            Parent::Window(w) => w.unicode_capable(),
        }
    }

    /// Fills the whole window with `cell` (spec.md §4.4, `Fill`).
    pub fn fill(&self, cell: Cell) {
        let (cols, rows) = self.size();
        for row in 0..rows as isize {
            for col in 0..cols as isize {
                self.set_cell(col, row, cell.clone());
            }
        }
    }

    /// Clears the window to blank cells and removes any placements the
    /// caller tracks separately (spec.md §4.4, `Clear`). Placement
    /// bookkeeping lives on the screen/dispatcher, not the window, so
    /// callers should pair this with clearing `next_placements` themselves.
    pub fn clear(&self) {
        self.fill(Cell::blank());
    }

    /// Prints a single line of text, truncating with `trunc` if it would
    /// overflow the window's width (spec.md §4.4/`window.go::PrintLine`). No
    /// output beyond `row`'s bounds; wrapping is `print`'s job, not this
    /// one's.
    pub fn print_line(&self, row: isize, trunc: &str, text: &str) {
        let (cols, rows) = self.size();
        if row < 0 || row as usize >= rows {
            return;
        }
        let trunc_width = crate::graphemes::rendered_width(trunc, self.unicode_capable());
        let mut col = 0usize;
        for ch in characters(text) {
            let w = crate::graphemes::rendered_width(ch, self.unicode_capable());
            if col + trunc_width + w > cols {
                self.set_cell(col as isize, row, Cell::with_grapheme(trunc));
                return;
            }
            self.set_cell(col as isize, row, Cell::with_grapheme(ch));
            col += w;
        }
    }

    /// Prints text, wrapping at the window's width and moving to the first
    /// column of the next line on overflow or `\n` (spec.md §4.4/
    /// `window.go::PrintOffset`). Returns the final cursor position.
    pub fn print(&self, text: &str) -> (usize, usize) {
        let (cols, rows) = self.size();
        let (mut col, mut row) = (0usize, 0usize);
        for ch in characters(text) {
            if ch == "\n" {
                col = 0;
                row += 1;
                continue;
            }
            if row > rows {
                break;
            }
            let w = crate::graphemes::rendered_width(ch, self.unicode_capable());
            self.set_cell(col as isize, row as isize, Cell::with_grapheme(ch));
            col += w;
            if col >= cols {
                row += 1;
                col = 0;
            }
        }
        (col, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn screen(cols: usize, rows: usize) -> RefCell<Screen> {
        let mut s = Screen::new();
        s.resize(cols, rows);
        RefCell::new(s)
    }

    #[test]
    fn root_window_size_matches_screen() {
        let screen = screen(10, 4);
        let win = Window::root(&screen, true);
        assert_eq!(win.size(), (10, 4));
    }

    #[test]
    fn negative_size_fills_remaining_parent_space() {
        let screen = screen(10, 4);
        let root = Window::root(&screen, true);
        let child = Window::new_window(&root, 2, 1, -1, -1);
        assert_eq!(child.size(), (8, 3));
    }

    #[test]
    fn oversize_child_is_clipped() {
        let screen = screen(10, 4);
        let root = Window::root(&screen, true);
        let child = Window::new_window(&root, 8, 0, 5, 1);
        assert_eq!(child.size(), (2, 1));
    }

    #[test]
    fn nested_set_cell_translates_to_root_coordinates() {
        let screen = screen(10, 4);
        let root = Window::root(&screen, true);
        let child = Window::new_window(&root, 2, 1, 5, 2);
        child.set_cell(0, 0, Cell::with_grapheme("X"));
        assert_eq!(
            screen.borrow().cell(2, 1).unwrap().grapheme,
            "X".to_string()
        );
    }

    #[test]
    fn out_of_bounds_child_write_is_discarded() {
        let screen = screen(10, 4);
        let root = Window::root(&screen, true);
        let child = Window::new_window(&root, 2, 1, 5, 2);
        let advance = child.set_cell(50, 50, Cell::with_grapheme("X"));
        assert_eq!(advance, 0);
    }

    #[test]
    fn origin_accumulates_through_the_chain() {
        let screen = screen(10, 4);
        let root = Window::root(&screen, true);
        let mid = Window::new_window(&root, 1, 1, -1, -1);
        let leaf = Window::new_window(&mid, 2, 2, -1, -1);
        assert_eq!(leaf.origin(), (3, 3));
    }
}
