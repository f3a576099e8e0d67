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

//! Decoder implementation of [HPACK].
//!
//! [HPACK]: https://httpwg.org/specs/rfc7541.html
//!
//! The decoder processes header field representations one at a time,
//! mutating its dynamic table in place so that it stays synchronized
//! with the encoder on the other end of the byte stream.
//!
//! Decoded name and value views point either into the dynamic table,
//! into the input buffer, or into two scratch buffers that are reused
//! across fields. They are valid only until the next decode call.

use crate::error::HpackError;
use crate::integer::decode_integer;
use crate::representation::PrefixBit;
use crate::string::decode_string;
use crate::table::{DynamicTable, StaticTable, TableSearcher};

/// Decoder endpoint of an HPACK stream.
///
/// `decode_header` consumes one representation from the front of the
/// input and returns the number of bytes consumed together with the
/// decoded field, or `None` when the representation was a dynamic table
/// size update.
pub struct Decoder {
    table: DynamicTable,
    name_buf: Vec<u8>,
    value_buf: Vec<u8>,
}

impl Decoder {
    /// Creates a `Decoder` with the given dynamic table size limit,
    /// which also becomes the protocol hard limit. 4096 is the default
    /// size in HTTP/2.
    pub fn new(max_size: usize) -> Self {
        Self::with_protocol_max_size(max_size, max_size)
    }

    /// Creates a `Decoder` whose protocol hard limit differs from the
    /// initial table size limit.
    pub fn with_protocol_max_size(max_size: usize, protocol_max_size: usize) -> Self {
        Self {
            table: DynamicTable::with_protocol_max_size(max_size, protocol_max_size),
            name_buf: Vec::new(),
            value_buf: Vec::new(),
        }
    }

    /// The dynamic table of this endpoint.
    pub fn table(&self) -> &DynamicTable {
        &self.table
    }

    /// Records a new protocol hard limit for the dynamic table, e.g.
    /// after a `SETTINGS_HEADER_TABLE_SIZE` change.
    pub fn set_protocol_max_size(&mut self, protocol_max_size: usize) {
        self.table.set_protocol_max_size(protocol_max_size);
    }

    /// Decodes one header field representation from the front of `src`.
    ///
    /// Returns the number of bytes consumed and the decoded
    /// `(name, value)` field, or `None` when the representation was a
    /// dynamic table size update. The returned views are invalidated by
    /// the next decode call.
    ///
    /// A truncated representation fails with
    /// [`HpackError::IncompleteData`] and consumes nothing; the caller
    /// can retry with more input.
    pub fn decode_header<'a>(
        &'a mut self,
        src: &'a [u8],
    ) -> Result<(usize, Option<(&'a [u8], &'a [u8])>), HpackError> {
        let first = match src.first() {
            Some(byte) => *byte,
            None => return Err(HpackError::IncompleteData(1)),
        };
        let repr = PrefixBit::from_u8(first);
        if repr == PrefixBit::INDEXED {
            self.decode_indexed(src)
        } else if repr == PrefixBit::SIZE_UPDATE {
            self.decode_size_update(src)
        } else {
            self.decode_literal(repr, src)
        }
    }

    /// Decodes a complete header block, invoking the visitor with every
    /// non-size-update field in wire order.
    pub fn decode_block<F>(&mut self, src: &[u8], mut visitor: F) -> Result<(), HpackError>
    where
        F: FnMut(&[u8], &[u8]),
    {
        let mut pos = 0;
        while pos < src.len() {
            let (consumed, header) = self.decode_header(&src[pos..])?;
            pos += consumed;
            if let Some((name, value)) = header {
                visitor(name, value);
            }
        }
        Ok(())
    }

    /// Decodes the `:status` pseudo header leading a response block and
    /// returns its code together with the bytes consumed.
    ///
    /// A fully indexed field naming one of the seven cached status
    /// entries takes a fast path that materializes no strings. Any other
    /// first non-size-update field must have the name `:status` and a
    /// three-digit value.
    pub fn decode_response_status(&mut self, src: &[u8]) -> Result<(usize, u16), HpackError> {
        let first = match src.first() {
            Some(byte) => *byte,
            None => return Err(HpackError::IncompleteData(1)),
        };
        if (first & 0x80) == 0x80 {
            let (index, consumed) = decode_integer(src, 7)?;
            match index {
                StaticTable::STATUS_200 => return Ok((consumed, 200)),
                StaticTable::STATUS_204 => return Ok((consumed, 204)),
                StaticTable::STATUS_206 => return Ok((consumed, 206)),
                StaticTable::STATUS_304 => return Ok((consumed, 304)),
                StaticTable::STATUS_400 => return Ok((consumed, 400)),
                StaticTable::STATUS_404 => return Ok((consumed, 404)),
                StaticTable::STATUS_500 => return Ok((consumed, 500)),
                // Not a cached status: rewind and decode normally.
                _ => {}
            }
        }
        let mut pos = 0;
        loop {
            let (consumed, header) = self.decode_header(&src[pos..])?;
            pos += consumed;
            if let Some((name, value)) = header {
                if name != b":status" {
                    return Err(HpackError::Protocol("response does not start with :status"));
                }
                let status = parse_status(value)?;
                return Ok((pos, status));
            }
        }
    }

    fn decode_indexed<'a>(
        &'a mut self,
        src: &'a [u8],
    ) -> Result<(usize, Option<(&'a [u8], &'a [u8])>), HpackError> {
        let (index, consumed) = decode_integer(src, 7)?;
        // RFC7541-6.1: the index value of 0 is not used. It MUST be
        // treated as a decoding error in an indexed representation.
        let searcher = TableSearcher::new(&self.table);
        let (name, value) = searcher.entry(index)?;
        Ok((consumed, Some((name, value))))
    }

    fn decode_size_update<'a>(
        &'a mut self,
        src: &'a [u8],
    ) -> Result<(usize, Option<(&'a [u8], &'a [u8])>), HpackError> {
        let (max_size, consumed) = decode_integer(src, 5)?;
        self.table.update_size(max_size)?;
        Ok((consumed, None))
    }

    fn decode_literal<'a>(
        &'a mut self,
        repr: PrefixBit,
        src: &'a [u8],
    ) -> Result<(usize, Option<(&'a [u8], &'a [u8])>), HpackError> {
        let (name_index, mut consumed) = decode_integer(src, repr.prefix_len())?;
        if repr == PrefixBit::LITERAL_WITH_INDEXING {
            let name: &[u8] = if name_index == 0 {
                let (view, used) = decode_string(&src[consumed..], &mut self.name_buf)?;
                consumed += used;
                view
            } else {
                // The entry view dies when the table is mutated below,
                // so the name moves into the scratch buffer first.
                let entry_name = TableSearcher::new(&self.table).entry(name_index)?.0;
                self.name_buf.clear();
                self.name_buf.extend_from_slice(entry_name);
                self.name_buf.as_slice()
            };
            let (value, used) = decode_string(&src[consumed..], &mut self.value_buf)?;
            consumed += used;
            self.table.add_entry(name, value);
            Ok((consumed, Some((name, value))))
        } else {
            let name: &[u8] = if name_index == 0 {
                let (view, used) = decode_string(&src[consumed..], &mut self.name_buf)?;
                consumed += used;
                view
            } else {
                TableSearcher::new(&self.table).entry(name_index)?.0
            };
            let (value, used) = decode_string(&src[consumed..], &mut self.value_buf)?;
            consumed += used;
            Ok((consumed, Some((name, value))))
        }
    }
}

fn parse_status(value: &[u8]) -> Result<u16, HpackError> {
    if value.len() != 3 || !value.iter().all(u8::is_ascii_digit) {
        return Err(HpackError::Protocol(":status is not a three-digit integer"));
    }
    Ok(value
        .iter()
        .fold(0u16, |status, byte| status * 10 + (byte - b'0') as u16))
}
