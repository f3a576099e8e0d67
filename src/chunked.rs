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

//! Chunked decoding of header block fragments.
//!
//! A header block may arrive split across several `CONTINUATION` frames.
//! [`ChunkedDecoder`] absorbs the fragments in order without losing
//! state at chunk boundaries: the cursor is snapshotted before each
//! field attempt, and when the integer or string codecs report
//! truncated input through [`HpackError::IncompleteData`], the
//! unparsed tail is held over until the next chunk arrives.
//!
//! No suspension primitive is needed for this; the "bytes needed" hint
//! carried by the error variant is enough to rewind cleanly and resume.

use core::mem::take;

use crate::decoder::Decoder;
use crate::error::HpackError;

/// Decodes a header block fed in chunks, suspending on short input.
pub struct ChunkedDecoder {
    decoder: Decoder,
    pending: Vec<u8>,
}

impl ChunkedDecoder {
    /// Creates a `ChunkedDecoder` around the given decoder endpoint.
    pub fn new(decoder: Decoder) -> Self {
        Self {
            decoder,
            pending: Vec::new(),
        }
    }

    /// The underlying decoder.
    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// The underlying decoder, mutably.
    pub fn decoder_mut(&mut self) -> &mut Decoder {
        &mut self.decoder
    }

    /// Consumes the chunked wrapper and returns the decoder.
    pub fn into_decoder(self) -> Decoder {
        self.decoder
    }

    /// Feeds the next chunk of the header block fragment.
    ///
    /// The visitor is called with `(name, value)` views for every
    /// non-size-update field completed by this chunk, in wire order;
    /// the views are valid only during the call.
    ///
    /// Returns `0` when every fed byte was parsed. A positive return is
    /// a hint: approximately that many further bytes are needed to
    /// finish the current field, whose already-received part is held
    /// over. Together with [`pending_data_size`] the hint lets a caller
    /// bound the size of a field before buffering all of it.
    ///
    /// With `last_chunk` set, truncation is fatal and surfaces as the
    /// underlying [`HpackError::IncompleteData`].
    ///
    /// [`pending_data_size`]: Self::pending_data_size
    pub fn feed<F>(
        &mut self,
        chunk: &[u8],
        last_chunk: bool,
        mut visitor: F,
    ) -> Result<usize, HpackError>
    where
        F: FnMut(&[u8], &[u8]),
    {
        if self.pending.is_empty() {
            let (consumed, required) =
                Self::parse(&mut self.decoder, chunk, last_chunk, &mut visitor)?;
            if required != 0 {
                self.pending.extend_from_slice(&chunk[consumed..]);
            }
            Ok(required)
        } else {
            self.pending.extend_from_slice(chunk);
            let buffered = take(&mut self.pending);
            let (consumed, required) =
                Self::parse(&mut self.decoder, &buffered, last_chunk, &mut visitor)?;
            if required != 0 {
                self.pending = buffered;
                self.pending.drain(..consumed);
            }
            Ok(required)
        }
    }

    /// Bytes currently held over from previous chunks.
    pub fn pending_data_size(&self) -> usize {
        self.pending.len()
    }

    /// Discards any held-over bytes.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Parses `buf` field by field. Returns `(buf.len(), 0)` when the
    /// whole buffer parsed, or `(snapshot, required)` when the field at
    /// `snapshot` ran short and `last_chunk` was not set.
    fn parse<F>(
        decoder: &mut Decoder,
        buf: &[u8],
        last_chunk: bool,
        visitor: &mut F,
    ) -> Result<(usize, usize), HpackError>
    where
        F: FnMut(&[u8], &[u8]),
    {
        let mut pos = 0;
        while pos < buf.len() {
            match decoder.decode_header(&buf[pos..]) {
                Ok((consumed, header)) => {
                    pos += consumed;
                    if let Some((name, value)) = header {
                        visitor(name, value);
                    }
                }
                Err(HpackError::IncompleteData(required)) if !last_chunk => {
                    return Ok((pos, required));
                }
                Err(e) => return Err(e),
            }
        }
        Ok((pos, 0))
    }
}
