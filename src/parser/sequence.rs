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

//! The tagged event type emitted by the parser. Grounded on
//! `examples/original_source/ansi/parser.go`'s `Sequence` interface and its
//! concrete `Print`/`C0`/`ESC`/`SS3`/`CSI`/`OSC`/`DCS`/`APC`/`EOF` types,
//! expressed here as one closed enum per spec.md's "Polymorphic Sequence"
//! redesign flag (a tagged sum type instead of an open interface).

use smallvec::SmallVec;

/// Why a malformed sequence was abandoned without dispatch.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// A byte arrived that no state in the table accepts.
    UnexpectedByte(u8),
    /// A DCS parameter string contained a non-digit where a digit was required.
    DcsParameterParse,
}

/// One CSI/DCS parameter, with `:`-separated subfields flattened into a list
/// (spec.md §3, "Parameter parsing (CSI)").
pub type Subfields = SmallVec<[i64; 4]>;

#[derive(Clone, PartialEq, Debug)]
pub enum Sequence {
    /// A single extended grapheme cluster to display.
    Print(String),
    /// A C0 control code, 0x00-0x1F.
    C0(u8),
    /// An escape sequence: `ESC` followed by intermediates and a final byte.
    Esc {
        intermediates: SmallVec<[u8; 2]>,
        final_byte: u8,
        /// Set once more than two intermediates arrived; the sequence still
        /// terminates normally but dispatch is a no-op (spec.md §3).
        ignored: bool,
    },
    /// `ESC O` followed by a final byte (application-keypad / cursor keys).
    Ss3(u8),
    /// A CSI sequence. `params` is a list of subfield-lists, one per
    /// `;`-separated field.
    Csi {
        intermediates: SmallVec<[u8; 2]>,
        params: SmallVec<[Subfields; 4]>,
        final_byte: u8,
        ignored: bool,
    },
    /// An OSC string's raw payload, unparsed.
    Osc { payload: String },
    /// A DCS string: the entry parameters plus the full passthrough data.
    Dcs {
        intermediates: SmallVec<[u8; 2]>,
        params: SmallVec<[i64; 8]>,
        final_byte: u8,
        data: String,
        ignored: bool,
    },
    /// An APC string's raw payload.
    Apc { data: String },
    /// A malformed sequence was abandoned.
    Error(ErrorKind),
    /// The input stream ended.
    Eof,
}
