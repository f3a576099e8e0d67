// Copyright (c) 2023 Huawei Device Co., Ltd.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! [Header Field Representation] implementation of [HPACK].
//!
//! [Header Field Representation]: https://www.rfc-editor.org/rfc/rfc7541.html#section-2.4
//! [HPACK]: https://httpwg.org/specs/rfc7541.html
//!
//! An encoded header field is represented either as an index or as a
//! literal, and a header block may additionally carry dynamic table size
//! update instructions. The representation is identified by the high
//! bits of its leading byte:
//!
//! ```text
//!   0   1   2   3   4   5   6   7
//! +---+---+---+---+---+---+---+---+
//! | 1 |        Index (7+)         |  Indexed Header Field
//! +---+---+-----------------------+
//! | 0 | 1 |      Index (6+)       |  Literal with Incremental Indexing
//! +---+---+---+-------------------+
//! | 0 | 0 | 1 |   Max size (5+)   |  Dynamic Table Size Update
//! +---+---+---+---+---------------+
//! | 0 | 0 | 0 | 1 |  Index (4+)   |  Literal Never Indexed
//! +---+---+---+---+---------------+
//! | 0 | 0 | 0 | 0 |  Index (4+)   |  Literal without Indexing
//! +---+---+---+---+---------------+
//! ```
//!
//! For the three literal forms, a zero index means the name follows as a
//! string literal; a non-zero index names an entry in the static or
//! dynamic table.

/// Leading bit pattern of a representation. The pattern occupies the
/// high bits of the first byte; the remaining bits start a prefix
/// integer.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) struct PrefixBit(pub(crate) u8);

impl PrefixBit {
    pub(crate) const INDEXED: Self = Self(0x80);
    pub(crate) const LITERAL_WITH_INDEXING: Self = Self(0x40);
    pub(crate) const SIZE_UPDATE: Self = Self(0x20);
    pub(crate) const LITERAL_NEVER_INDEXED: Self = Self(0x10);
    pub(crate) const LITERAL_WITHOUT_INDEXING: Self = Self(0x00);

    /// Creates a `PrefixBit` from the leading byte of a representation.
    /// The five patterns cover the whole byte space, so every byte maps
    /// to exactly one representation.
    pub(crate) fn from_u8(byte: u8) -> Self {
        match byte {
            x if x >= 0x80 => Self::INDEXED,
            x if x >= 0x40 => Self::LITERAL_WITH_INDEXING,
            x if x >= 0x20 => Self::SIZE_UPDATE,
            x if x >= 0x10 => Self::LITERAL_NEVER_INDEXED,
            _ => Self::LITERAL_WITHOUT_INDEXING,
        }
    }

    /// Returns the width of the prefix integer following the pattern.
    pub(crate) fn prefix_len(&self) -> u8 {
        match self.0 {
            0x80 => 7,
            0x40 => 6,
            0x20 => 5,
            _ => 4,
        }
    }
}

/// Name of a literal representation. It is carried either as an index
/// into the static or dynamic table, or as a string literal.
#[derive(Copy, Clone, Debug)]
pub enum Name<'a> {
    /// An index into the combined static and dynamic address space.
    Index(usize),
    /// A literal name, conventionally ASCII lowercase.
    Literal(&'a [u8]),
}

impl<'a> From<usize> for Name<'a> {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl<'a> From<&'a [u8]> for Name<'a> {
    fn from(literal: &'a [u8]) -> Self {
        Self::Literal(literal)
    }
}
