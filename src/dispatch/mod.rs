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

//! Translates parser [`Sequence`]s into high-level [`Msg`]s (spec.md §4.2).
//! Grounded on `vaxis.go::handleSequence`/`sendQueries` for every dispatch
//! rule below; the actual key/mouse decode algorithms live in
//! [`keys`]/[`mouse`], grounded on the teacher's
//! `core/ansi/vt_100_terminal_input_parser` idiom.

pub mod keys;
pub mod messages;
pub mod mouse;

use std::time::Duration;

use smallvec::SmallVec;

use crate::capabilities::Capabilities;
use crate::parser::sequence::Sequence;

pub use messages::{CustomMsg, KeyEvent, KeyEventKind, Modifiers, Msg, MouseAction, MouseButton, MouseEvent};

/// The terminal does not answer the startup probe's primary-DA query within
/// this long, startup gives up (spec.md §4.2, "Startup probe sequence").
pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(3);

/// The byte string written once at startup to probe optional capabilities
/// (spec.md §4.2). Order doesn't matter to the terminal; primary DA is last
/// so its reply reliably signals "probing is done" even on terminals that
/// silently ignore the others.
pub const STARTUP_PROBE: &str = concat!(
    "\x1b[>0q",        // request version (secondary/tertiary DA variant)
    "\x1b[?u",         // kitty keyboard query
    "\x1b_Gi=1,a=q\x1b\\", // kitty graphics query (APC, minimal 1x1 query)
    "\x1b[?2026$p",    // synchronized-update (DECRQM) query
    "\x1b[?1;1;0S",    // sixel geometry query
    "\x1bP+q524742\x1b\\", // XTGETTCAP "RGB" (hex)
    "\x1bP+q536d756c78\x1b\\", // XTGETTCAP "Smulx" (hex)
    "\x1b[=c",         // tertiary DA
    "\x1b[c",          // primary DA
);

fn hex_decode(s: &str) -> Option<String> {
    if s.len() % 2 != 0 {
        return None;
    }
    let mut out = String::with_capacity(s.len() / 2);
    let bytes = s.as_bytes();
    for pair in bytes.chunks(2) {
        let hi = (pair[0] as char).to_digit(16)?;
        let lo = (pair[1] as char).to_digit(16)?;
        out.push(((hi * 16 + lo) as u8) as char);
    }
    Some(out)
}

/// The default kitty-keyboard enhancement flags (disambiguate escape codes +
/// report event types + report alternate keys), matching vaxis's
/// `kittyKBFlags` constant.
const DEFAULT_KITTY_FLAGS: u8 = 25;

/// Process-local state the dispatcher needs beyond the capability registry:
/// the bracketed-paste accumulator, the "did we just ask for the cursor
/// position" flag that resolves the CSI `R` / F1 ambiguity (spec.md §4.2),
/// the configured kitty-keyboard enable flags, and any terminal-bound bytes
/// queued by the last `dispatch` call for the host to write out.
pub struct Dispatcher {
    pasting: bool,
    paste_buf: String,
    position_requested: bool,
    startup_done: bool,
    kitty_flags: u8,
    pending_writes: Vec<String>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher {
            pasting: false,
            paste_buf: String::new(),
            position_requested: false,
            startup_done: false,
            kitty_flags: DEFAULT_KITTY_FLAGS,
            pending_writes: Vec::new(),
        }
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher::default()
    }

    /// Like [`Dispatcher::new`], but with the kitty-keyboard enable flags
    /// that will be written once the terminal confirms protocol support
    /// (spec.md §6, `init(options)`'s `report_keyboard_events`).
    pub fn with_kitty_flags(kitty_flags: u8) -> Self {
        Dispatcher {
            kitty_flags,
            ..Dispatcher::default()
        }
    }

    /// Call once after writing an explicit cursor-position request so the
    /// next bare `CSI R` is attributed to `DSRCPR` rather than decoded as F1.
    pub fn request_cursor_position(&mut self) {
        self.position_requested = true;
    }

    pub fn startup_done(&self) -> bool {
        self.startup_done
    }

    /// Drains any terminal-bound byte sequences queued by the last
    /// `dispatch` call. The dispatcher has no I/O of its own (spec.md §5: it
    /// only suspends on its message queue), so the host writes these out.
    pub fn take_pending_writes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_writes)
    }

    /// Translates one parser sequence, updating `caps` in place and
    /// returning zero or more messages (bracketed paste buffers bytes
    /// across many sequences before producing one `Paste`, so most
    /// dispatches produce zero).
    pub fn dispatch(&mut self, seq: &Sequence, caps: &mut Capabilities) -> SmallVec<[Msg; 2]> {
        let mut out = SmallVec::new();

        if self.pasting {
            if let Some(msg) = self.feed_paste(seq) {
                out.push(msg);
            }
            return out;
        }

        match seq {
            Sequence::Csi {
                intermediates,
                params,
                final_byte,
                ignored,
            } => {
                if *ignored {
                    return out;
                }
                self.dispatch_csi(intermediates, params, *final_byte, caps, &mut out);
            }
            Sequence::Dcs {
                intermediates,
                data,
                final_byte,
                ignored,
                ..
            } => {
                if !ignored && *final_byte == b'r' && intermediates.contains(&b'+') {
                    self.dispatch_xtgettcap(data, caps, &mut out);
                }
            }
            Sequence::Apc { data } => {
                if data.starts_with('G') {
                    caps.kitty_graphics = true;
                    out.push(Msg::CapabilitiesChanged);
                }
            }
            Sequence::Osc { payload } => {
                if let Some(rest) = payload.strip_prefix("52;") {
                    if let Some(msg) = self.decode_osc52(rest) {
                        out.push(msg);
                    }
                }
            }
            Sequence::Print(_) | Sequence::C0(_) | Sequence::Esc { .. } | Sequence::Ss3(_) => {
                if let Some(key) = keys::decode(seq) {
                    out.push(Msg::Key(key));
                }
            }
            Sequence::Error(_) | Sequence::Eof => {}
        }

        out
    }

    fn dispatch_csi(
        &mut self,
        intermediates: &SmallVec<[u8; 2]>,
        params: &SmallVec<[crate::parser::sequence::Subfields; 4]>,
        final_byte: u8,
        caps: &mut Capabilities,
        out: &mut SmallVec<[Msg; 2]>,
    ) {
        let has_query_marker = intermediates.contains(&b'?');

        match final_byte {
            b'c' if has_query_marker => {
                // Primary DA reply: field "4" anywhere in the param list
                // signals sixel support (vaxis.go's handleSequence).
                let sixel = params.iter().any(|p| p.first() == Some(&4));
                caps.sixels = sixel;
                if sixel {
                    caps.kitty_graphics = true;
                }
                caps.primary_da_received = true;
                out.push(Msg::CapabilitiesChanged);
                self.startup_done = true;
            }
            b'S' if has_query_marker && params.len() >= 3 => {
                // Sixel geometry reply: item 2 (sixel) reporting status 0
                // (success) confirms sixel support (vaxis.go's handleSequence).
                if params.first().and_then(|p| p.first()) == Some(&2)
                    && params.get(1).and_then(|p| p.first()) == Some(&0)
                {
                    caps.sixels = true;
                    out.push(Msg::CapabilitiesChanged);
                }
            }
            b'y' => {
                // DECRPM reply: mode 1/2 (set/reset) confirms the mode is
                // recognized; 0 ("not recognized") and 3/4 ("permanently
                // set/reset") do not indicate synchronized-update support
                // (vaxis.go's handleSequence).
                let mode = params.get(1).and_then(|p| p.first());
                if params.first().and_then(|p| p.first()) == Some(&2026)
                    && matches!(mode, Some(&1) | Some(&2))
                {
                    caps.synchronized_update = true;
                    out.push(Msg::CapabilitiesChanged);
                }
            }
            b'u' if has_query_marker => {
                caps.kitty_keyboard = true;
                out.push(Msg::CapabilitiesChanged);
                self.pending_writes
                    .push(crate::terminal_io::queries::kitty_keyboard_enable(self.kitty_flags));
            }
            b'u' => {
                if let Some(key) = keys::decode_kitty_csi_u(params) {
                    out.push(Msg::Key(key));
                }
            }
            b'~' => {
                let code = params.first().and_then(|p| p.first()).copied();
                match code {
                    Some(200) => {
                        self.pasting = true;
                        self.paste_buf.clear();
                    }
                    Some(201) => {
                        // Stray end-of-paste with no matching begin: ignore.
                    }
                    _ => {
                        if let Some(key) = keys::decode_xterm_csi(params, final_byte) {
                            out.push(Msg::Key(key));
                        }
                    }
                }
            }
            b'M' | b'm' => {
                if let Some(event) = mouse::decode_sgr(params, final_byte) {
                    out.push(Msg::Mouse(event));
                }
            }
            b'R' if !has_query_marker => {
                if self.position_requested {
                    self.position_requested = false;
                    if let (Some(row), Some(col)) = (
                        params.first().and_then(|p| p.first()),
                        params.get(1).and_then(|p| p.first()),
                    ) {
                        out.push(Msg::CursorPosition {
                            col: (*col - 1).max(0) as usize,
                            row: (*row - 1).max(0) as usize,
                        });
                    }
                } else if let Some(key) = keys::decode_ss3(b'P') {
                    // Ambiguous with F1 when no position was requested.
                    out.push(Msg::Key(key));
                }
            }
            _ => {
                if caps.kitty_keyboard {
                    if let Some(key) = keys::decode_kitty_csi_u(params) {
                        out.push(Msg::Key(key));
                        return;
                    }
                }
                if let Some(key) = keys::decode_xterm_csi(params, final_byte) {
                    out.push(Msg::Key(key));
                }
            }
        }
    }

    fn dispatch_xtgettcap(&mut self, data: &str, caps: &mut Capabilities, out: &mut SmallVec<[Msg; 2]>) {
        // Successful reply form: "1+r" followed by name=value hex pairs.
        let body = data.strip_prefix("1+r").unwrap_or(data);
        let Some((name_hex, value_hex)) = body.split_once('=') else {
            return;
        };
        let Some(name) = hex_decode(name_hex) else { return };
        let _value = hex_decode(value_hex);
        match name.as_str() {
            "Smulx" => {
                caps.styled_underlines = true;
                out.push(Msg::CapabilitiesChanged);
            }
            "RGB" => {
                caps.rgb = true;
                out.push(Msg::CapabilitiesChanged);
            }
            _ => {}
        }
    }

    fn decode_osc52(&self, rest: &str) -> Option<Msg> {
        use base64::Engine;
        let mut fields = rest.splitn(2, ';');
        let _selection = fields.next()?;
        let payload = fields.next()?;
        let decoded = base64::engine::general_purpose::STANDARD.decode(payload).ok()?;
        let text = String::from_utf8(decoded).ok()?;
        Some(Msg::ClipboardPaste(text))
    }

    fn feed_paste(&mut self, seq: &Sequence) -> Option<Msg> {
        match seq {
            Sequence::Print(g) => {
                self.paste_buf.push_str(g);
                None
            }
            Sequence::C0(b) => {
                self.paste_buf.push(*b as char);
                None
            }
            Sequence::Csi { params, final_byte, .. } if *final_byte == b'~' => {
                if params.first().and_then(|p| p.first()) == Some(&201) {
                    self.pasting = false;
                    Some(Msg::Paste(std::mem::take(&mut self.paste_buf)))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::sequence::Subfields;

    fn csi(
        params: SmallVec<[Subfields; 4]>,
        final_byte: u8,
        intermediates: SmallVec<[u8; 2]>,
    ) -> Sequence {
        Sequence::Csi {
            intermediates,
            params,
            final_byte,
            ignored: false,
        }
    }

    #[test]
    fn bracketed_paste_accumulates_until_end_marker() {
        let mut d = Dispatcher::new();
        let mut caps = Capabilities::new();
        let begin = csi(smallvec::smallvec![smallvec::smallvec![200]], b'~', smallvec::smallvec![]);
        let end = csi(smallvec::smallvec![smallvec::smallvec![201]], b'~', smallvec::smallvec![]);

        assert!(d.dispatch(&begin, &mut caps).is_empty());
        assert!(d.dispatch(&Sequence::Print("h".into()), &mut caps).is_empty());
        assert!(d.dispatch(&Sequence::Print("i".into()), &mut caps).is_empty());
        let msgs = d.dispatch(&end, &mut caps);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0], Msg::Paste("hi".to_string()));
    }

    #[test]
    fn kitty_keyboard_confirm_sets_capability() {
        let mut d = Dispatcher::new();
        let mut caps = Capabilities::new();
        let seq = csi(smallvec::smallvec![], b'u', smallvec::smallvec![b'?']);
        d.dispatch(&seq, &mut caps);
        assert!(caps.kitty_keyboard);
    }

    #[test]
    fn synchronized_update_report_sets_capability() {
        let mut d = Dispatcher::new();
        let mut caps = Capabilities::new();
        let seq = csi(
            smallvec::smallvec![smallvec::smallvec![2026], smallvec::smallvec![1]],
            b'y',
            smallvec::smallvec![],
        );
        d.dispatch(&seq, &mut caps);
        assert!(caps.synchronized_update);
    }

    #[test]
    fn synchronized_update_report_mode_not_recognized_does_not_set_capability() {
        let mut d = Dispatcher::new();
        let mut caps = Capabilities::new();
        let seq = csi(
            smallvec::smallvec![smallvec::smallvec![2026], smallvec::smallvec![0]],
            b'y',
            smallvec::smallvec![],
        );
        d.dispatch(&seq, &mut caps);
        assert!(!caps.synchronized_update);
    }

    #[test]
    fn sixel_geometry_reply_sets_capability_only_on_success_status() {
        let mut d = Dispatcher::new();
        let mut caps = Capabilities::new();
        let ok = csi(
            smallvec::smallvec![smallvec::smallvec![2], smallvec::smallvec![0], smallvec::smallvec![1]],
            b'S',
            smallvec::smallvec![b'?'],
        );
        d.dispatch(&ok, &mut caps);
        assert!(caps.sixels);

        let mut caps = Capabilities::new();
        let failure = csi(
            smallvec::smallvec![smallvec::smallvec![2], smallvec::smallvec![3], smallvec::smallvec![1]],
            b'S',
            smallvec::smallvec![b'?'],
        );
        d.dispatch(&failure, &mut caps);
        assert!(!caps.sixels);
    }

    #[test]
    fn kitty_keyboard_confirm_queues_the_enable_write() {
        let mut d = Dispatcher::with_kitty_flags(27);
        let mut caps = Capabilities::new();
        let seq = csi(smallvec::smallvec![], b'u', smallvec::smallvec![b'?']);
        d.dispatch(&seq, &mut caps);
        assert_eq!(d.take_pending_writes(), vec!["\x1b[>27u".to_string()]);
    }

    #[test]
    fn bare_csi_r_without_position_request_decodes_as_f1() {
        let mut d = Dispatcher::new();
        let mut caps = Capabilities::new();
        let seq = csi(smallvec::smallvec![], b'R', smallvec::smallvec![]);
        let msgs = d.dispatch(&seq, &mut caps);
        assert_eq!(msgs.len(), 1);
        assert!(matches!(&msgs[0], Msg::Key(k) if k.codepoint == keys::pua::F1));
    }

    #[test]
    fn csi_r_after_position_request_yields_cursor_position() {
        let mut d = Dispatcher::new();
        d.request_cursor_position();
        let mut caps = Capabilities::new();
        let seq = csi(
            smallvec::smallvec![smallvec::smallvec![5], smallvec::smallvec![10]],
            b'R',
            smallvec::smallvec![],
        );
        let msgs = d.dispatch(&seq, &mut caps);
        assert_eq!(msgs[0], Msg::CursorPosition { col: 9, row: 4 });
    }

    #[test]
    fn xtgettcap_rgb_reply_sets_true_color_capability() {
        let mut d = Dispatcher::new();
        let mut caps = Capabilities::new();
        // name "RGB" = 52 47 42, value "1" = 31
        let seq = Sequence::Dcs {
            intermediates: smallvec::smallvec![b'+'],
            params: smallvec::smallvec![],
            final_byte: b'r',
            data: "1+r524742=31".to_string(),
            ignored: false,
        };
        d.dispatch(&seq, &mut caps);
        assert!(caps.rgb);
    }

    #[test]
    fn osc_52_clipboard_reply_decodes_base64_payload() {
        let mut d = Dispatcher::new();
        let mut caps = Capabilities::new();
        let seq = Sequence::Osc {
            payload: "52;c;aGVsbG8=".to_string(),
        };
        let msgs = d.dispatch(&seq, &mut caps);
        assert_eq!(msgs[0], Msg::ClipboardPaste("hello".to_string()));
    }
}
