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

//! The VT500-series input parser. Grounded directly on
//! `examples/original_source/ansi/parser.go`: the state table, the `0x3A`
//! colon-as-subfield-separator deviation, the ESC/ST disambiguation via
//! `ignore_st`, and the grapheme-cluster collection in `ground` are all
//! carried over in meaning, re-expressed as a chunk-fed state machine rather
//! than a goroutine blocked on a `bufio.Reader`.

mod sequence;
mod state;

pub use sequence::{ErrorKind, Sequence, Subfields};
use state::State;

use smallvec::SmallVec;
use std::time::Duration;
use unicode_segmentation::UnicodeSegmentation;

/// Default ESC/sequence-lead disambiguation window (spec.md §4.1, "ESC timeout").
pub const DEFAULT_ESC_TIMEOUT: Duration = Duration::from_millis(10);

enum ExitAction {
    Osc,
    Dcs,
    Apc,
}

/// A VT500-series state machine. Feed it raw bytes with [`Parser::feed`]; it
/// returns the `Sequence`s recognized from that chunk. Owns no I/O of its
/// own -- the parser actor (see `crate::terminal_io`) is responsible for
/// reading bytes and racing the ESC timeout.
pub struct Parser {
    state: State,
    intermediates: SmallVec<[u8; 2]>,
    params_raw: SmallVec<[u8; 16]>,
    ignore_st: bool,
    exit: Option<ExitAction>,

    osc_data: String,
    apc_data: String,

    dcs_final: u8,
    dcs_intermediates: SmallVec<[u8; 2]>,
    dcs_params: SmallVec<[i64; 8]>,
    dcs_data: String,
    dcs_param_error: bool,

    utf8_carry: SmallVec<[u8; 4]>,
    esc_timeout: Duration,
}

impl Parser {
    pub fn new() -> Self {
        Parser::with_esc_timeout(DEFAULT_ESC_TIMEOUT)
    }

    /// Builds a parser with a non-default ESC disambiguation window. The
    /// spec leaves this configurable rather than hardcoding 10ms (see
    /// DESIGN.md, "Open Question decisions").
    pub fn with_esc_timeout(esc_timeout: Duration) -> Self {
        Parser {
            state: State::Ground,
            intermediates: SmallVec::new(),
            params_raw: SmallVec::new(),
            ignore_st: false,
            exit: None,
            osc_data: String::new(),
            apc_data: String::new(),
            dcs_final: 0,
            dcs_intermediates: SmallVec::new(),
            dcs_params: SmallVec::new(),
            dcs_data: String::new(),
            dcs_param_error: false,
            utf8_carry: SmallVec::new(),
            esc_timeout,
        }
    }

    pub fn esc_timeout(&self) -> Duration {
        self.esc_timeout
    }

    /// Returns a consumed sequence's backing storage to the pool. The
    /// parser contract doesn't require pooling (spec.md §9, "Ownership of
    /// pooled slices") -- each `Sequence` here owns its buffers outright, so
    /// this is a deliberate no-op kept only so callers can still make the
    /// acknowledgement handshake spec.md §3 describes.
    pub fn finish(&mut self, _seq: Sequence) {}

    /// Called by the driving actor when the armed ESC timer fires with no
    /// further bytes having arrived. A no-op if a later byte already moved
    /// the parser out of `escape` (spec.md §4.1, "ESC timeout").
    pub fn escape_timeout_elapsed(&mut self) -> Option<Sequence> {
        if self.state == State::Escape {
            self.state = State::Ground;
            Some(Sequence::C0(0x1B))
        } else {
            None
        }
    }

    /// Feeds a chunk of raw bytes (one terminal read's worth) and returns
    /// every `Sequence` recognized from it. Incomplete UTF-8 at the end of
    /// a chunk is carried over to the next call; incomplete multi-byte
    /// grapheme clusters are not (mirroring `parser.go::print`, which only
    /// extends a cluster using runes already buffered, never blocking for
    /// more).
    pub fn feed(&mut self, chunk: &[u8]) -> SmallVec<[Sequence; 8]> {
        let mut out = SmallVec::new();
        let mut bytes: SmallVec<[u8; 256]> = SmallVec::new();
        bytes.extend_from_slice(&self.utf8_carry);
        bytes.extend_from_slice(chunk);
        self.utf8_carry.clear();

        let mut idx = 0;
        while idx < bytes.len() {
            match std::str::from_utf8(&bytes[idx..]) {
                Ok(s) => {
                    self.feed_str(s, &mut out);
                    idx = bytes.len();
                }
                Err(e) => {
                    let valid_len = e.valid_up_to();
                    if valid_len > 0 {
                        let s = std::str::from_utf8(&bytes[idx..idx + valid_len]).unwrap();
                        self.feed_str(s, &mut out);
                        idx += valid_len;
                    }
                    match e.error_len() {
                        Some(bad_len) => {
                            // Invalid UTF-8: deliver the offending byte(s) as-is,
                            // matching parser.go::readRune's ReplacementChar fallback.
                            for _ in 0..bad_len {
                                let b = bytes[idx];
                                self.step(b as char, &mut out);
                                idx += 1;
                            }
                        }
                        None => {
                            self.utf8_carry.extend_from_slice(&bytes[idx..]);
                            idx = bytes.len();
                        }
                    }
                }
            }
        }
        out
    }

    /// Signals end of input. Flushes any open control string and emits `Eof`.
    pub fn finish_input(&mut self) -> SmallVec<[Sequence; 2]> {
        let mut out = SmallVec::new();
        self.do_exit(&mut out);
        out.push(Sequence::Eof);
        out
    }

    fn feed_str(&mut self, s: &str, out: &mut SmallVec<[Sequence; 8]>) {
        let mut rest = s;
        while !rest.is_empty() {
            let c = rest.chars().next().unwrap();
            if self.state == State::Ground && is_ground_print(c) {
                let cluster = rest.graphemes(true).next().unwrap();
                let len = cluster.len();
                out.push(Sequence::Print(cluster.to_string()));
                rest = &rest[len..];
                continue;
            }
            let len = c.len_utf8();
            self.step(c, out);
            rest = &rest[len..];
        }
    }

    /// The `anywhere()` transition: handled identically regardless of state.
    fn step(&mut self, c: char, out: &mut SmallVec<[Sequence; 8]>) {
        let code = c as u32;
        match code {
            0x18 | 0x1A => {
                self.do_exit(out);
                if code <= 0x1F {
                    out.push(Sequence::C0(code as u8));
                }
                self.state = State::Ground;
            }
            0x1B => {
                self.do_exit(out);
                self.clear();
                self.state = State::Escape;
            }
            _ => self.dispatch(c, out),
        }
    }

    fn do_exit(&mut self, out: &mut SmallVec<[Sequence; 8]>) {
        match self.exit.take() {
            Some(ExitAction::Osc) => {
                let payload = std::mem::take(&mut self.osc_data);
                out.push(Sequence::Osc { payload });
            }
            Some(ExitAction::Dcs) => {
                out.push(self.finish_dcs());
            }
            Some(ExitAction::Apc) => {
                let data = std::mem::take(&mut self.apc_data);
                out.push(Sequence::Apc { data });
            }
            None => {}
        }
    }

    fn finish_dcs(&mut self) -> Sequence {
        let seq = if self.dcs_param_error {
            Sequence::Error(ErrorKind::DcsParameterParse)
        } else {
            Sequence::Dcs {
                intermediates: std::mem::take(&mut self.dcs_intermediates),
                params: std::mem::take(&mut self.dcs_params),
                final_byte: self.dcs_final,
                data: std::mem::take(&mut self.dcs_data),
                ignored: self.dcs_intermediates.len() > 2,
            }
        };
        self.dcs_final = 0;
        self.dcs_param_error = false;
        seq
    }

    fn clear(&mut self) {
        self.intermediates.clear();
        self.params_raw.clear();
    }

    fn execute(&self, c: char, out: &mut SmallVec<[Sequence; 8]>) {
        let code = c as u32;
        if code <= 0x1F {
            out.push(Sequence::C0(code as u8));
        }
    }

    fn collect(&mut self, c: char) {
        self.intermediates.push(c as u8);
    }

    fn param(&mut self, c: char) {
        self.params_raw.push(c as u8);
    }

    fn escape_dispatch(&mut self, final_byte: u8, out: &mut SmallVec<[Sequence; 8]>) {
        let ignored = self.intermediates.len() > 2;
        out.push(Sequence::Esc {
            intermediates: std::mem::take(&mut self.intermediates),
            final_byte,
            ignored,
        });
    }

    fn csi_dispatch(&mut self, final_byte: u8, out: &mut SmallVec<[Sequence; 8]>) {
        let ignored = self.intermediates.len() > 2;
        let params = parse_csi_params(&self.params_raw);
        out.push(Sequence::Csi {
            intermediates: std::mem::take(&mut self.intermediates),
            params,
            final_byte,
            ignored,
        });
        self.params_raw.clear();
    }

    fn osc_start(&mut self) {
        self.exit = Some(ExitAction::Osc);
        self.osc_data.clear();
    }

    fn osc_put(&mut self, c: char) {
        self.osc_data.push(c);
    }

    fn hook(&mut self, final_byte: u8) {
        self.exit = Some(ExitAction::Dcs);
        self.dcs_final = final_byte;
        self.dcs_data.clear();
        self.dcs_param_error = false;
        if !self.intermediates.is_empty() {
            self.dcs_intermediates = std::mem::take(&mut self.intermediates);
        } else {
            self.dcs_intermediates.clear();
        }
        if self.params_raw.is_empty() {
            self.dcs_params.clear();
            return;
        }
        match parse_dcs_params(&self.params_raw) {
            Ok(params) => self.dcs_params = params,
            Err(()) => {
                self.dcs_params.clear();
                self.dcs_param_error = true;
            }
        }
        self.params_raw.clear();
    }

    fn put(&mut self, c: char) {
        self.dcs_data.push(c);
    }

    fn apc_unhook_data(&mut self, c: char) {
        self.apc_data.push(c);
    }

    fn dispatch(&mut self, c: char, out: &mut SmallVec<[Sequence; 8]>) {
        let code = c as u32;
        self.state = match self.state {
            State::Ground => self.ground(code, out),
            State::Escape => self.escape(code, c, out),
            State::EscapeIntermediate => self.escape_intermediate(code, c, out),
            State::CsiEntry => self.csi_entry(code, c, out),
            State::CsiParam => self.csi_param(code, c, out),
            State::CsiIntermediate => self.csi_intermediate(code, c, out),
            State::CsiIgnore => self.csi_ignore(code, out),
            State::DcsEntry => self.dcs_entry(code, c),
            State::DcsParam => self.dcs_param(code, c),
            State::DcsIntermediate => self.dcs_intermediate(code, c),
            State::DcsPassthrough => self.dcs_passthrough(code, c),
            State::DcsIgnore => self.dcs_ignore(code),
            State::OscString => self.osc_string(code, c, out),
            State::SosPm => self.sos_pm(code),
            State::Apc => self.apc(code, c),
            State::Ss3 => self.ss3(code, c, out),
        };
    }

    fn ground(&mut self, code: u32, out: &mut SmallVec<[Sequence; 8]>) -> State {
        // Only control-execute bytes reach here; printable bytes are
        // intercepted by `feed_str` before `step` is ever called.
        self.execute(char::from_u32(code).unwrap_or('\0'), out);
        State::Ground
    }

    fn escape(&mut self, code: u32, c: char, out: &mut SmallVec<[Sequence; 8]>) -> State {
        let next = match code {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => {
                self.execute(c, out);
                State::Escape
            }
            0x20..=0x2F => {
                self.collect(c);
                State::EscapeIntermediate
            }
            0x30..=0x4E | 0x51..=0x57 | 0x59 | 0x5A | 0x60..=0x7F => {
                self.escape_dispatch(code as u8, out);
                State::Ground
            }
            0x5C => {
                if self.ignore_st {
                    State::Ground
                } else {
                    self.escape_dispatch(code as u8, out);
                    State::Ground
                }
            }
            0x4F => State::Ss3,
            0x50 => {
                self.clear();
                State::DcsEntry
            }
            0x58 | 0x5E => State::SosPm,
            0x5F => {
                self.exit = Some(ExitAction::Apc);
                self.apc_data.clear();
                State::Apc
            }
            0x5B => {
                self.clear();
                State::CsiEntry
            }
            0x5D => {
                self.osc_start();
                State::OscString
            }
            _ => State::Ground,
        };
        self.ignore_st = false;
        next
    }

    fn ss3(&mut self, code: u32, c: char, out: &mut SmallVec<[Sequence; 8]>) -> State {
        match code {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => {
                self.execute(c, out);
                State::Ss3
            }
            0x7F => State::Ss3,
            _ => {
                out.push(Sequence::Ss3(code as u8));
                State::Ground
            }
        }
    }

    fn escape_intermediate(&mut self, code: u32, c: char, out: &mut SmallVec<[Sequence; 8]>) -> State {
        match code {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => {
                self.execute(c, out);
                State::EscapeIntermediate
            }
            0x7F => State::EscapeIntermediate,
            0x20..=0x2F => {
                self.collect(c);
                State::EscapeIntermediate
            }
            0x30..=0x7E => {
                self.escape_dispatch(code as u8, out);
                State::Ground
            }
            _ => State::Ground,
        }
    }

    fn csi_entry(&mut self, code: u32, c: char, out: &mut SmallVec<[Sequence; 8]>) -> State {
        match code {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => {
                self.execute(c, out);
                State::CsiEntry
            }
            0x7F => State::CsiEntry,
            0x30..=0x39 | 0x3B | 0x3A => {
                // 0x3A deviates from the strict DEC table: it's accepted here
                // as a liberal subfield separator instead of csiIgnore.
                self.param(c);
                State::CsiParam
            }
            0x3C..=0x3F => {
                self.collect(c);
                State::CsiParam
            }
            0x20..=0x2F => {
                self.collect(c);
                State::CsiIntermediate
            }
            0x40..=0x7E => {
                self.csi_dispatch(code as u8, out);
                State::Ground
            }
            _ => {
                out.push(Sequence::Error(ErrorKind::UnexpectedByte(code as u8)));
                State::Ground
            }
        }
    }

    fn csi_param(&mut self, code: u32, c: char, out: &mut SmallVec<[Sequence; 8]>) -> State {
        match code {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => {
                self.execute(c, out);
                State::CsiParam
            }
            0x7F => State::CsiParam,
            0x30..=0x39 | 0x3B | 0x3A => {
                self.param(c);
                State::CsiParam
            }
            0x40..=0x7E => {
                self.csi_dispatch(code as u8, out);
                State::Ground
            }
            0x20..=0x2F => {
                self.collect(c);
                State::CsiIntermediate
            }
            0x3C..=0x3F => State::CsiIgnore,
            _ => {
                out.push(Sequence::Error(ErrorKind::UnexpectedByte(code as u8)));
                State::Ground
            }
        }
    }

    fn csi_ignore(&mut self, code: u32, out: &mut SmallVec<[Sequence; 8]>) -> State {
        match code {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => {
                self.execute(char::from_u32(code).unwrap_or('\0'), out);
                State::CsiIgnore
            }
            0x7F => State::CsiIgnore,
            0x40..=0x7E => State::Ground,
            _ => State::CsiIgnore,
        }
    }

    fn csi_intermediate(&mut self, code: u32, c: char, out: &mut SmallVec<[Sequence; 8]>) -> State {
        match code {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => {
                self.execute(c, out);
                State::CsiIntermediate
            }
            0x7F => State::CsiIntermediate,
            0x20..=0x2F => {
                self.collect(c);
                State::CsiIntermediate
            }
            0x30..=0x3F => State::CsiIgnore,
            0x40..=0x7E => {
                self.csi_dispatch(code as u8, out);
                State::Ground
            }
            _ => {
                out.push(Sequence::Error(ErrorKind::UnexpectedByte(code as u8)));
                State::Ground
            }
        }
    }

    fn dcs_entry(&mut self, code: u32, c: char) -> State {
        match code {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F | 0x7F => State::DcsEntry,
            0x20..=0x2F => {
                self.collect(c);
                State::DcsIntermediate
            }
            0x3A => State::DcsIgnore,
            0x30..=0x39 | 0x3B => {
                self.param(c);
                State::DcsParam
            }
            0x3C..=0x3F => {
                self.collect(c);
                State::DcsParam
            }
            0x40..=0x7E => {
                self.hook(code as u8);
                State::DcsPassthrough
            }
            _ => {
                self.hook(code as u8);
                State::DcsPassthrough
            }
        }
    }

    fn dcs_intermediate(&mut self, code: u32, c: char) -> State {
        match code {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => State::DcsIntermediate,
            0x20..=0x2F => {
                self.collect(c);
                State::DcsIntermediate
            }
            0x7F => State::DcsIntermediate,
            0x30..=0x3F => State::DcsIgnore,
            0x40..=0x7E => {
                self.hook(code as u8);
                State::DcsPassthrough
            }
            _ => State::Ground,
        }
    }

    fn dcs_param(&mut self, code: u32, c: char) -> State {
        match code {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => State::DcsParam,
            0x30..=0x39 | 0x3B => {
                self.param(c);
                State::DcsParam
            }
            0x7F => State::DcsParam,
            0x20..=0x2F => {
                self.collect(c);
                State::DcsIntermediate
            }
            0x3A | 0x3C..=0x3F => State::DcsIgnore,
            0x40..=0x7E => {
                self.hook(code as u8);
                State::DcsPassthrough
            }
            _ => State::Ground,
        }
    }

    fn dcs_ignore(&mut self, _code: u32) -> State {
        self.ignore_st = true;
        State::DcsIgnore
    }

    fn dcs_passthrough(&mut self, code: u32, c: char) -> State {
        self.ignore_st = true;
        self.exit = Some(ExitAction::Dcs);
        match code {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F | 0x20..=0x7E => {
                self.put(c);
                State::DcsPassthrough
            }
            0x7F => State::DcsPassthrough,
            _ => {
                self.put(c);
                State::DcsPassthrough
            }
        }
    }

    fn osc_string(&mut self, code: u32, c: char, out: &mut SmallVec<[Sequence; 8]>) -> State {
        self.ignore_st = true;
        match code {
            0x07 => {
                self.do_exit(out);
                State::Ground
            }
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => State::OscString,
            _ => {
                self.osc_put(c);
                State::OscString
            }
        }
    }

    fn sos_pm(&mut self, _code: u32) -> State {
        self.ignore_st = true;
        State::SosPm
    }

    fn apc(&mut self, code: u32, c: char) -> State {
        self.ignore_st = true;
        match code {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => State::Apc,
            _ => {
                self.apc_unhook_data(c);
                State::Apc
            }
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new()
    }
}

fn is_ground_print(c: char) -> bool {
    let code = c as u32;
    !matches!(code, 0x00..=0x17 | 0x18 | 0x19 | 0x1A | 0x1B | 0x1C..=0x1F)
}

/// At most 16 top-level parameters are kept; excess is silently dropped
/// (spec.md §3 invariants).
const MAX_CSI_PARAMS: usize = 16;

fn parse_csi_params(raw: &[u8]) -> SmallVec<[Subfields; 4]> {
    let mut params: SmallVec<[Subfields; 4]> = SmallVec::new();
    if raw.is_empty() {
        return params;
    }
    let mut current: Subfields = SmallVec::new();
    let mut value: i64 = 0;
    for &b in raw {
        match b {
            b';' => {
                current.push(value);
                if params.len() < MAX_CSI_PARAMS {
                    params.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
                value = 0;
            }
            b':' => {
                current.push(value);
                value = 0;
            }
            _ => {
                value = value.saturating_mul(10).saturating_add((b - b'0') as i64);
            }
        }
    }
    current.push(value);
    if params.len() < MAX_CSI_PARAMS {
        params.push(current);
    }
    params
}

fn parse_dcs_params(raw: &[u8]) -> Result<SmallVec<[i64; 8]>, ()> {
    let mut params = SmallVec::new();
    for part in raw.split(|&b| b == b';') {
        if part.is_empty() {
            params.push(0);
            continue;
        }
        let mut value: i64 = 0;
        for &b in part {
            if !b.is_ascii_digit() {
                return Err(());
            }
            value = value.saturating_mul(10).saturating_add((b - b'0') as i64);
        }
        params.push(value);
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(seqs: &[Sequence]) -> &Sequence {
        seqs.first().expect("at least one sequence")
    }

    #[test]
    fn plain_text_prints_one_cluster_per_character() {
        let mut p = Parser::new();
        let seqs = p.feed(b"Hi\n");
        assert_eq!(seqs.len(), 3);
        assert_eq!(seqs[0], Sequence::Print("H".into()));
        assert_eq!(seqs[1], Sequence::Print("i".into()));
        assert_eq!(seqs[2], Sequence::C0(0x0A));
    }

    #[test]
    fn family_emoji_prints_as_a_single_grapheme_cluster() {
        let mut p = Parser::new();
        let family = "\u{1F469}\u{200D}\u{1F680}";
        let seqs = p.feed(family.as_bytes());
        assert_eq!(seqs.len(), 1);
        assert_eq!(*first(&seqs), Sequence::Print(family.to_string()));
    }

    #[test]
    fn lone_esc_with_no_further_bytes_times_out_to_a_single_c0() {
        let mut p = Parser::new();
        let seqs = p.feed(&[0x1B]);
        assert!(seqs.is_empty());
        let timeout = p.escape_timeout_elapsed();
        assert_eq!(timeout, Some(Sequence::C0(0x1B)));
        // A second call after the state reset is a no-op.
        assert_eq!(p.escape_timeout_elapsed(), None);
    }

    #[test]
    fn esc_followed_by_a_byte_cancels_the_timeout() {
        let mut p = Parser::new();
        p.feed(&[0x1B]);
        let seqs = p.feed(b"[1m");
        assert_eq!(
            *first(&seqs),
            Sequence::Csi {
                intermediates: SmallVec::new(),
                params: SmallVec::from_slice(&[SmallVec::from_slice(&[1])]),
                final_byte: b'm',
                ignored: false,
            }
        );
        assert_eq!(p.escape_timeout_elapsed(), None);
    }

    #[test]
    fn csi_colon_subfields_split_into_one_parameter() {
        let mut p = Parser::new();
        let seqs = p.feed(b"\x1b[38:2:255:0:0m");
        match first(&seqs) {
            Sequence::Csi { params, final_byte, .. } => {
                assert_eq!(*final_byte, b'm');
                assert_eq!(params.len(), 1);
                assert_eq!(params[0].as_slice(), &[38, 2, 255, 0, 0]);
            }
            other => panic!("expected Csi, got {other:?}"),
        }
    }

    #[test]
    fn csi_semicolons_split_into_multiple_parameters() {
        let mut p = Parser::new();
        let seqs = p.feed(b"\x1b[1;31m");
        match first(&seqs) {
            Sequence::Csi { params, .. } => {
                assert_eq!(params.len(), 2);
                assert_eq!(params[0].as_slice(), &[1]);
                assert_eq!(params[1].as_slice(), &[31]);
            }
            other => panic!("expected Csi, got {other:?}"),
        }
    }

    #[test]
    fn blank_csi_param_contributes_zero() {
        let mut p = Parser::new();
        let seqs = p.feed(b"\x1b[;5H");
        match first(&seqs) {
            Sequence::Csi { params, .. } => {
                assert_eq!(params[0].as_slice(), &[0]);
                assert_eq!(params[1].as_slice(), &[5]);
            }
            other => panic!("expected Csi, got {other:?}"),
        }
    }

    #[test]
    fn dcs_round_trips_with_no_stray_esc() {
        let mut p = Parser::new();
        let seqs = p.feed(b"\x1bP1;2$qr\x1b\\");
        assert_eq!(seqs.len(), 1);
        match &seqs[0] {
            Sequence::Dcs {
                final_byte,
                intermediates,
                params,
                data,
                ..
            } => {
                assert_eq!(*final_byte, b'q');
                assert_eq!(intermediates.as_slice(), b"$");
                assert_eq!(params.as_slice(), &[1, 2]);
                assert_eq!(data, "r");
            }
            other => panic!("expected Dcs, got {other:?}"),
        }
    }

    #[test]
    fn osc_payload_is_extracted_up_to_the_terminator() {
        let mut p = Parser::new();
        let seqs = p.feed(b"\x1b]0;my title\x07");
        assert_eq!(seqs.len(), 1);
        assert_eq!(
            seqs[0],
            Sequence::Osc {
                payload: "0;my title".to_string()
            }
        );
    }

    #[test]
    fn finish_does_not_affect_later_events() {
        let mut p = Parser::new();
        let seqs = p.feed(b"A");
        p.finish(seqs[0].clone());
        let more = p.feed(b"B");
        assert_eq!(more[0], Sequence::Print("B".into()));
    }

    #[test]
    fn esc_backslash_after_osc_is_a_noop_not_a_new_escape() {
        let mut p = Parser::new();
        let seqs = p.feed(b"\x1b]0;title\x1b\\A");
        // the ST that closes the OSC string must not surface as a second Esc.
        assert_eq!(
            seqs[0],
            Sequence::Osc {
                payload: "0;title".to_string()
            }
        );
        assert_eq!(seqs[1], Sequence::Print("A".into()));
    }

    #[test]
    fn sgr_true_color_params_split_on_semicolons() {
        // Semicolons always start a new top-level parameter in the grounding
        // source's tokenizer (only `:` flattens into the same one); grouping
        // "38;2;r;g;b" into one colorspec is the SGR interpreter's job, not
        // the CSI lexer's (see DESIGN.md, "CSI semicolon-grouping").
        let mut p = Parser::new();
        let seqs = p.feed(b"\x1b[38;2;255;128;64m");
        match first(&seqs) {
            Sequence::Csi { params, final_byte, .. } => {
                assert_eq!(*final_byte, b'm');
                assert_eq!(params.len(), 5);
                assert_eq!(params[0].as_slice(), &[38]);
                assert_eq!(params[4].as_slice(), &[64]);
            }
            other => panic!("expected Csi, got {other:?}"),
        }
    }

    #[test]
    fn sgr_true_color_params_with_doubled_colon_yields_empty_subfield_as_zero() {
        let mut p = Parser::new();
        let seqs = p.feed(b"\x1b[38:2::255:128:64m");
        match first(&seqs) {
            Sequence::Csi { params, .. } => {
                assert_eq!(params.len(), 1);
                assert_eq!(params[0].as_slice(), &[38, 2, 0, 255, 128, 64]);
            }
            other => panic!("expected Csi, got {other:?}"),
        }
    }

    #[test]
    fn wide_cjk_grapheme_is_a_single_print_event() {
        let mut p = Parser::new();
        let seqs = p.feed("\u{4e2d}".as_bytes());
        assert_eq!(seqs.len(), 1);
        assert_eq!(*first(&seqs), Sequence::Print("\u{4e2d}".to_string()));
    }
}
