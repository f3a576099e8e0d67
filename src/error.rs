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

//! Errors that may occur in this crate.
//!
//! Two kinds of failure are distinguished at the type level:
//!
//! [`HpackError::Protocol`] means the byte stream violates [RFC 7541].
//! The stream cannot be recovered and the connection using it must be
//! torn down.
//!
//! [`HpackError::IncompleteData`] means the stream is structurally valid
//! so far but was truncated in the middle of a field. It carries an
//! approximate number of additional bytes needed to make progress, so a
//! caller feeding partial header block fragments can suspend and resume
//! instead of failing.
//!
//! [RFC 7541]: https://httpwg.org/specs/rfc7541.html

use core::fmt::{Display, Formatter};
use std::error::Error;

/// Errors that may occur when encoding or decoding header blocks.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum HpackError {
    /// The byte stream violates `RFC 7541`. The message names the
    /// specific violation.
    Protocol(&'static str),

    /// The byte stream is truncated mid-field. Carries an approximate
    /// number of additional bytes needed before decoding can continue.
    IncompleteData(usize),
}

impl HpackError {
    /// Returns `true` if the error only signals truncated input.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::IncompleteData(_))
    }
}

impl Display for HpackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Protocol(msg) => write!(f, "hpack protocol error: {msg}"),
            Self::IncompleteData(n) => write!(f, "incomplete data: about {n} more bytes needed"),
        }
    }
}

impl Error for HpackError {}
