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

//! Process-wide capability registry. Grounded on `vaxis.go`'s `capabilities`
//! struct, populated by `sendQueries`/`handleSequence`.

/// Optional terminal features, detected once during startup (spec.md §4.2,
/// "Startup probe sequence") and read thereafter by the renderer and
/// dispatcher. Never mutated concurrently: only the dispatcher/host actor
/// writes to it (spec.md §5).
#[derive(Clone, Copy, Debug, Default)]
pub struct Capabilities {
    pub synchronized_update: bool,
    pub rgb: bool,
    pub kitty_graphics: bool,
    pub kitty_keyboard: bool,
    pub styled_underlines: bool,
    pub sixels: bool,
    /// True when the terminal renders extended grapheme clusters (e.g. ZWJ
    /// emoji sequences) as a single glyph rather than one per codepoint.
    pub unicode: bool,
    /// Set once the startup probe's primary Device Attributes reply has
    /// arrived; the only capability bit with no terminal-feature meaning
    /// of its own, used solely to signal "probing is done" (spec.md §4.2).
    pub primary_da_received: bool,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_all_disabled() {
        let caps = Capabilities::new();
        assert!(!caps.rgb);
        assert!(!caps.kitty_keyboard);
        assert!(!caps.unicode);
    }
}
