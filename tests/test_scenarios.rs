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

//! End-to-end scenarios spanning parser -> dispatch and screen -> renderer,
//! as opposed to the in-module unit tests that exercise each stage alone.

use std::cell::RefCell;
use std::collections::HashMap;

use tuigrid::capabilities::Capabilities;
use tuigrid::cell::Cell;
use tuigrid::color::Color;
use tuigrid::dispatch::Dispatcher;
use tuigrid::parser::Parser;
use tuigrid::placement::Placement;
use tuigrid::renderer::Renderer;
use tuigrid::screen::Screen;
use tuigrid::window::Window;
use tuigrid::Msg;

/// Scenario A: plain text followed by a line feed.
#[test]
fn scenario_a_plain_text_yields_print_and_c0() {
    let mut parser = Parser::new();
    let seqs = parser.feed(b"Hi\n");
    let mut dispatcher = Dispatcher::new();
    let mut caps = Capabilities::new();
    let msgs: Vec<Msg> = seqs
        .iter()
        .flat_map(|seq| dispatcher.dispatch(seq, &mut caps))
        .collect();
    assert_eq!(msgs.len(), 3);
    let codepoints: Vec<u32> = msgs
        .iter()
        .map(|msg| match msg {
            Msg::Key(k) => k.codepoint,
            other => panic!("expected a key message, got {other:?}"),
        })
        .collect();
    // The trailing '\n' (0x0A) is a C0 code in the Ctrl+<letter> range, so it
    // decodes as Ctrl+J (0x0A + 0x60 = 'j'), not as a bare linefeed codepoint.
    assert_eq!(codepoints, vec!['H' as u32, 'i' as u32, 'j' as u32]);
    assert!(matches!(&msgs[2], Msg::Key(k) if k.modifiers.ctrl));
}

/// Scenario B: a bracketed paste fed through the real parser, not a
/// hand-built `Sequence`.
#[test]
fn scenario_b_bracketed_paste_round_trips_through_the_parser() {
    let mut parser = Parser::new();
    let seqs = parser.feed(b"\x1b[200~hi\x1b[201~");
    let mut dispatcher = Dispatcher::new();
    let mut caps = Capabilities::new();
    let msgs: Vec<Msg> = seqs
        .iter()
        .flat_map(|seq| dispatcher.dispatch(seq, &mut caps))
        .collect();
    assert_eq!(msgs, vec![Msg::Paste("hi".to_string())]);
}

/// Scenario C: the kitty-keyboard confirmation CSI fed through the real
/// parser flips the capability and announces the change.
#[test]
fn scenario_c_kitty_keyboard_query_reply_sets_the_capability() {
    let mut parser = Parser::new();
    let seqs = parser.feed(b"\x1b[?1u");
    let mut dispatcher = Dispatcher::new();
    let mut caps = Capabilities::new();
    let msgs: Vec<Msg> = seqs
        .iter()
        .flat_map(|seq| dispatcher.dispatch(seq, &mut caps))
        .collect();
    assert!(caps.kitty_keyboard);
    assert_eq!(msgs, vec![Msg::CapabilitiesChanged]);
}

fn new_screen(cols: usize, rows: usize) -> RefCell<Screen> {
    let mut s = Screen::new();
    s.resize(cols, rows);
    RefCell::new(s)
}

/// Scenario D: a single red-on-default cell renders its position, its SGR
/// foreground, the grapheme, and a trailing reset.
#[test]
fn scenario_d_single_colored_cell_against_an_empty_screen() {
    let screen_cell = new_screen(4, 2);
    {
        let window = Window::root(&screen_cell, true);
        window.set_cell(
            0,
            0,
            Cell {
                grapheme: "A".to_string(),
                foreground: Color::Indexed(1),
                ..Cell::default()
            },
        );
    }

    let mut renderer = Renderer::new();
    let caps = Capabilities::new();
    let empty_placements = HashMap::new();
    let out = renderer.render(&screen_cell.borrow(), &empty_placements, &caps, false);

    assert!(out.contains("\x1b[1;1H"), "missing cursor-to-(1,1): {out:?}");
    assert!(out.contains("\x1b[31m"), "missing red fg SGR: {out:?}");
    assert!(out.contains('A'));
    assert!(out.contains("\x1b[0m"), "missing trailing SGR reset: {out:?}");
}

/// Scenario E: the second frame only rewrites what changed.
#[test]
fn scenario_e_second_render_only_touches_the_changed_cell() {
    let screen_cell = new_screen(4, 1);
    let mut renderer = Renderer::new();
    let caps = Capabilities::new();
    let empty_placements = HashMap::new();

    {
        let window = Window::root(&screen_cell, true);
        window.print("AB");
    }
    renderer.render(&screen_cell.borrow(), &empty_placements, &caps, false);

    {
        let window = Window::root(&screen_cell, true);
        window.set_cell(1, 0, Cell::with_grapheme("C"));
    }
    let out = renderer.render(&screen_cell.borrow(), &empty_placements, &caps, false);

    assert!(out.contains("\x1b[1;2H"), "missing reposition to col 2: {out:?}");
    assert!(out.contains('C'));
    assert!(!out.contains('A'), "first column should not be rewritten: {out:?}");
}

/// Scenario F: a placement present in frame 1 and absent in frame 2 emits
/// only its delete bytes, with no draw bytes.
#[test]
fn scenario_f_removed_placement_emits_only_delete_bytes() {
    let screen_cell = new_screen(10, 10);
    let mut renderer = Renderer::new();
    let caps = Capabilities::new();

    let mut placement = Placement::new(7, 5, 5, 3, 2);
    placement.draw_bytes = b"DRAW".to_vec();
    placement.delete_bytes = b"DELETE".to_vec();
    let mut placements = HashMap::new();
    placements.insert(7, placement);

    let first = renderer.render(&screen_cell.borrow(), &placements, &caps, false);
    assert!(first.contains("DRAW"));

    let empty_placements = HashMap::new();
    let second = renderer.render(&screen_cell.borrow(), &empty_placements, &caps, false);
    assert!(second.contains("DELETE"));
    assert!(!second.contains("DRAW"));
}

/// Testable property 10: a wide grapheme at column c leaves c+1 as a blank
/// sentinel that no cursor-move ever addresses directly -- the renderer
/// skips straight past it.
#[test]
fn property_10_wide_cell_companion_column_is_never_targeted() {
    let screen_cell = new_screen(4, 1);
    {
        let window = Window::root(&screen_cell, true);
        window.set_cell(0, 0, Cell::with_grapheme("\u{4e2d}"));
        window.set_cell(2, 0, Cell::with_grapheme("Z"));
    }

    let mut renderer = Renderer::new();
    let caps = Capabilities::new();
    let empty_placements = HashMap::new();
    let out = renderer.render(&screen_cell.borrow(), &empty_placements, &caps, false);

    assert!(out.contains("\x1b[1;1H"));
    assert!(out.contains('\u{4e2d}'));
    assert!(out.contains('Z'));
    // Column 2 (1-based) is the wide cell's blank companion; since writing
    // the wide grapheme already advances the terminal's own cursor past it,
    // it must never be individually addressed by a cursor move.
    assert!(!out.contains("\x1b[1;2H"), "companion column was targeted: {out:?}");
}

/// Testable property 11: a contiguous run of cells sharing a hyperlink opens
/// the OSC 8 sequence once at the run's start and closes it once at the end.
#[test]
fn property_11_hyperlink_run_opens_and_closes_exactly_once() {
    // A trailing non-link cell with its own grapheme is required so the
    // run has a visible end: a blank cell after the run would be identical
    // to the (also blank) previous frame and get skipped before the
    // hyperlink diff ever runs.
    let screen_cell = new_screen(5, 1);
    {
        let window = Window::root(&screen_cell, true);
        for (col, ch) in ["l", "i", "n", "k"].into_iter().enumerate() {
            window.set_cell(
                col as isize,
                0,
                Cell {
                    grapheme: ch.to_string(),
                    hyperlink: "https://example.invalid".to_string(),
                    ..Cell::default()
                },
            );
        }
        window.set_cell(4, 0, Cell::with_grapheme("."));
    }

    let mut renderer = Renderer::new();
    let caps = Capabilities::new();
    let empty_placements = HashMap::new();
    let out = renderer.render(&screen_cell.borrow(), &empty_placements, &caps, false);

    let opens = out.matches("\x1b]8;;https://example.invalid\x07").count();
    let closes = out.matches("\x1b]8;;\x07").count();
    assert_eq!(opens, 1, "expected exactly one hyperlink open: {out:?}");
    assert_eq!(closes, 1, "expected exactly one hyperlink close: {out:?}");
}
