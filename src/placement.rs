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

//! Graphic sprite placements. Grounded on `vaxis.go`'s `placement` type and
//! its `lockRegion`/`draw`/`delete` methods.

/// A graphic sprite anchored at a cell position. The renderer treats the
/// payload bytes as opaque (spec.md §1 Non-goals: no image decoding here).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub id: u32,
    pub col: usize,
    pub row: usize,
    pub width: usize,
    pub height: usize,
    /// Bytes to emit to draw the placement (e.g. a kitty-graphics APC
    /// payload), opaque to this crate.
    pub draw_bytes: Vec<u8>,
    /// Bytes to emit to remove the placement from the terminal.
    pub delete_bytes: Vec<u8>,
}

impl Placement {
    pub fn new(id: u32, col: usize, row: usize, width: usize, height: usize) -> Self {
        Placement {
            id,
            col,
            row,
            width,
            height,
            draw_bytes: Vec::new(),
            delete_bytes: Vec::new(),
        }
    }

    /// Cell coordinates covered by this placement's region, in row-major
    /// order, used to mark the region `sixel = true` before rendering
    /// (spec.md §3 invariants).
    pub fn region(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.row..self.row + self.height)
            .flat_map(move |row| (self.col..self.col + self.width).map(move |col| (col, row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_covers_every_cell_in_the_rectangle() {
        let placement = Placement::new(1, 5, 5, 3, 2);
        let cells: Vec<_> = placement.region().collect();
        assert_eq!(cells.len(), 6);
        assert!(cells.contains(&(5, 5)));
        assert!(cells.contains(&(7, 6)));
    }
}
