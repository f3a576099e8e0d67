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

//! [String Literal Representation] implementation of [HPACK].
//!
//! [String Literal Representation]: https://www.rfc-editor.org/rfc/rfc7541.html#string.literal.representation
//! [HPACK]: https://httpwg.org/specs/rfc7541.html
//!
//! # Binary Format
//! ```text
//!   0   1   2   3   4   5   6   7
//! +---+---+---+---+---+---+---+---+
//! | H |    String Length (7+)     |
//! +---+---------------------------+
//! |  String Data (Length octets)  |
//! +-------------------------------+
//! ```

use crate::error::HpackError;
use crate::huffman;
use crate::integer::{decode_integer, encode_integer};

/// Encodes an octet string, optionally Huffman-coded, and puts it into
/// the specified `Vec<u8>`.
pub(crate) fn encode_string(src: &[u8], use_huffman: bool, dst: &mut Vec<u8>) {
    if use_huffman {
        encode_integer(huffman::encoded_len(src), 7, 0x80, dst);
        huffman::encode(src, dst);
    } else {
        encode_integer(src.len(), 7, 0x00, dst);
        dst.extend_from_slice(src);
    }
}

/// Decodes an octet string from the front of `src`. Returns the decoded
/// view and the number of bytes consumed.
///
/// A plain string borrows the input buffer directly. A Huffman-coded
/// string is decoded into `scratch`, which is cleared first; reusing the
/// same scratch across calls reuses its allocation. A payload shorter
/// than the announced length fails with `IncompleteData` carrying the
/// exact shortfall.
pub(crate) fn decode_string<'a>(
    src: &'a [u8],
    scratch: &'a mut Vec<u8>,
) -> Result<(&'a [u8], usize), HpackError> {
    let first = match src.first() {
        Some(byte) => *byte,
        None => return Err(HpackError::IncompleteData(1)),
    };
    let is_huffman = (first & 0x80) == 0x80;
    let (len, prefix_len) = decode_integer(src, 7)?;
    let available = src.len() - prefix_len;
    if available < len {
        return Err(HpackError::IncompleteData(len - available));
    }
    let payload = &src[prefix_len..prefix_len + len];
    let consumed = prefix_len + len;
    if is_huffman {
        scratch.clear();
        reserve_decoded(scratch, len);
        huffman::decode(payload, scratch)?;
        Ok((scratch.as_slice(), consumed))
    } else {
        Ok((payload, consumed))
    }
}

/// Grows `scratch` to a power-of-two capacity large enough for the worst
/// case inflation. The shortest symbol is 5 bits, so a Huffman region of
/// `len` bytes cannot decode to more than `8 * len / 5` bytes.
fn reserve_decoded(scratch: &mut Vec<u8>, len: usize) {
    let worst = (len * 8).div_ceil(5);
    if scratch.capacity() < worst {
        scratch.reserve(worst.next_power_of_two());
    }
}
