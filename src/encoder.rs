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

//! Encoder implementation of [HPACK].
//!
//! [HPACK]: https://httpwg.org/specs/rfc7541.html
//!
//! The encoder owns a dynamic table used as a compression cache. The
//! table is only mutated by the incremental indexing operations; the
//! plain literal forms leave it untouched, so both endpoints stay
//! synchronized by processing the same byte stream.
//!
//! Every operation appends its representation to a caller-supplied
//! `Vec<u8>` sink. The encoder performs no I/O of its own.

use crate::error::HpackError;
use crate::integer::encode_integer;
use crate::representation::{Name, PrefixBit};
use crate::string::encode_string;
use crate::table::{DynamicTable, StaticTable, TableSearcher};

/// Encoder endpoint of an HPACK stream.
pub struct Encoder {
    table: DynamicTable,
}

impl Encoder {
    /// Creates an `Encoder` with the given dynamic table size limit,
    /// which also becomes the protocol hard limit. 4096 is the default
    /// size in HTTP/2.
    pub fn new(max_size: usize) -> Self {
        Self::with_protocol_max_size(max_size, max_size)
    }

    /// Creates an `Encoder` whose protocol hard limit differs from the
    /// initial table size limit.
    pub fn with_protocol_max_size(max_size: usize, protocol_max_size: usize) -> Self {
        Self {
            table: DynamicTable::with_protocol_max_size(max_size, protocol_max_size),
        }
    }

    /// The dynamic table of this endpoint.
    pub fn table(&self) -> &DynamicTable {
        &self.table
    }

    /// Records a new protocol hard limit for the dynamic table. When
    /// this shrinks the current maximum, the change must be signaled to
    /// the peer with [`encode_size_update`] at the start of the next
    /// header block.
    ///
    /// [`encode_size_update`]: Self::encode_size_update
    pub fn set_protocol_max_size(&mut self, protocol_max_size: usize) {
        self.table.set_protocol_max_size(protocol_max_size);
    }

    /// Encodes a field whose name and value are both indexed, e.g.
    /// `:path /index.html` from the static table or a cached pair from
    /// the dynamic table.
    pub fn encode_fully_indexed(&mut self, index: usize, dst: &mut Vec<u8>) {
        debug_assert!(index != 0 && index <= self.table.current_max_index());
        encode_integer(index, 7, PrefixBit::INDEXED.0, dst);
    }

    /// Encodes a field with an indexed name and a literal value, and
    /// inserts the pair into the dynamic table.
    ///
    /// Calling this again for the same pair keeps inserting duplicates;
    /// use [`encode_with_cache`] to reuse the cached entry instead.
    ///
    /// [`encode_with_cache`]: Self::encode_with_cache
    pub fn encode_indexed_name_incremental(
        &mut self,
        name_index: usize,
        value: &[u8],
        use_huffman: bool,
        dst: &mut Vec<u8>,
    ) -> Result<(), HpackError> {
        let searcher = TableSearcher::new(&self.table);
        let name = searcher.entry(name_index)?.0.to_vec();
        self.table.add_entry(&name, value);
        encode_integer(name_index, 6, PrefixBit::LITERAL_WITH_INDEXING.0, dst);
        encode_string(value, use_huffman, dst);
        Ok(())
    }

    /// Encodes a field with a literal name and value, and inserts the
    /// pair into the dynamic table.
    pub fn encode_new_name_incremental(
        &mut self,
        name: &[u8],
        value: &[u8],
        use_huffman: bool,
        dst: &mut Vec<u8>,
    ) {
        self.table.add_entry(name, value);
        encode_integer(0, 6, PrefixBit::LITERAL_WITH_INDEXING.0, dst);
        encode_string(name, use_huffman, dst);
        encode_string(value, use_huffman, dst);
    }

    /// Encodes a literal field that is not inserted into the dynamic
    /// table.
    pub fn encode_without_indexing(
        &mut self,
        name: Name<'_>,
        value: &[u8],
        use_huffman: bool,
        dst: &mut Vec<u8>,
    ) {
        self.encode_plain_literal(PrefixBit::LITERAL_WITHOUT_INDEXING, name, value, use_huffman, dst);
    }

    /// Encodes a literal field that is never inserted into the dynamic
    /// table, and that intermediaries must re-encode the same way. Use
    /// this for header values that must not be put at risk by
    /// compression, such as credentials.
    pub fn encode_never_indexing(
        &mut self,
        name: Name<'_>,
        value: &[u8],
        use_huffman: bool,
        dst: &mut Vec<u8>,
    ) {
        self.encode_plain_literal(PrefixBit::LITERAL_NEVER_INDEXED, name, value, use_huffman, dst);
    }

    /// Encodes a dynamic table size update and applies the new maximum
    /// locally. The update must occur at the beginning of the first
    /// header block following the change (`RFC7541-6.3`).
    pub fn encode_size_update(
        &mut self,
        new_max_size: usize,
        dst: &mut Vec<u8>,
    ) -> Result<(), HpackError> {
        self.table.update_size(new_max_size)?;
        encode_integer(new_max_size, 5, PrefixBit::SIZE_UPDATE.0, dst);
        Ok(())
    }

    /// Encodes a field through the dynamic table cache: a cached pair
    /// becomes fully indexed, anything else is encoded incrementally so
    /// that the next call finds it cached.
    pub fn encode_with_cache(
        &mut self,
        name: Name<'_>,
        value: &[u8],
        use_huffman: bool,
        dst: &mut Vec<u8>,
    ) -> Result<(), HpackError> {
        match name {
            Name::Literal(name) => {
                let result = self.table.find(name, value);
                if result.value_indexed {
                    self.encode_fully_indexed(result.index, dst);
                } else {
                    self.encode_new_name_incremental(name, value, use_huffman, dst);
                }
                Ok(())
            }
            Name::Index(index) => {
                let searcher = TableSearcher::new(&self.table);
                let entry_name = searcher.entry(index)?.0;
                let result = self.table.find(entry_name, value);
                if result.value_indexed {
                    self.encode_fully_indexed(result.index, dst);
                    Ok(())
                } else {
                    self.encode_indexed_name_incremental(index, value, use_huffman, dst)
                }
            }
        }
    }

    /// Encodes a field with the default strategy, minimizing the size
    /// of the representation:
    ///
    /// 1. A full match in the static table is encoded fully indexed.
    /// 2. A full match in the dynamic table is encoded fully indexed.
    /// 3. A name match (static before dynamic) becomes a literal with an
    ///    indexed name, incremental when `cache` is set.
    /// 4. Anything else becomes a new-name literal, incremental when
    ///    `cache` is set.
    pub fn encode(
        &mut self,
        name: &[u8],
        value: &[u8],
        cache: bool,
        use_huffman: bool,
        dst: &mut Vec<u8>,
    ) {
        let st = StaticTable::find(name, value);
        if st.value_indexed {
            return self.encode_fully_indexed(st.index, dst);
        }
        let dy = self.table.find(name, value);
        if dy.value_indexed {
            return self.encode_fully_indexed(dy.index, dst);
        }
        let name_index = if st.found() {
            st.index
        } else if dy.found() {
            dy.index
        } else {
            0
        };
        if name_index != 0 {
            if cache {
                self.table.add_entry(name, value);
                encode_integer(name_index, 6, PrefixBit::LITERAL_WITH_INDEXING.0, dst);
                encode_string(value, use_huffman, dst);
            } else {
                self.encode_without_indexing(Name::Index(name_index), value, use_huffman, dst);
            }
        } else if cache {
            self.encode_new_name_incremental(name, value, use_huffman, dst);
        } else {
            self.encode_without_indexing(Name::Literal(name), value, use_huffman, dst);
        }
    }

    /// Encodes a whole header block with the default strategy.
    pub fn encode_block<'a, I>(
        &mut self,
        headers: I,
        cache: bool,
        use_huffman: bool,
        dst: &mut Vec<u8>,
    ) where
        I: IntoIterator<Item = (&'a [u8], &'a [u8])>,
    {
        for (name, value) in headers {
            self.encode(name, value, cache, use_huffman, dst);
        }
    }

    /// Encodes the `:status` pseudo header of a response. The seven
    /// cached status codes become a single indexed byte; any other code
    /// is cached in the dynamic table, so a server sending it again
    /// encodes it fully indexed from then on.
    pub fn encode_status(&mut self, status: u16, dst: &mut Vec<u8>) {
        let index = match status {
            200 => StaticTable::STATUS_200,
            204 => StaticTable::STATUS_204,
            206 => StaticTable::STATUS_206,
            304 => StaticTable::STATUS_304,
            400 => StaticTable::STATUS_400,
            404 => StaticTable::STATUS_404,
            500 => StaticTable::STATUS_500,
            _ => 0,
        };
        if index != 0 {
            return self.encode_fully_indexed(index, dst);
        }
        let value = status.to_string();
        let result = self.table.find(b":status", value.as_bytes());
        if result.value_indexed {
            return self.encode_fully_indexed(result.index, dst);
        }
        self.table.add_entry(b":status", value.as_bytes());
        encode_integer(
            StaticTable::STATUS_200,
            6,
            PrefixBit::LITERAL_WITH_INDEXING.0,
            dst,
        );
        encode_string(value.as_bytes(), false, dst);
    }

    fn encode_plain_literal(
        &mut self,
        repr: PrefixBit,
        name: Name<'_>,
        value: &[u8],
        use_huffman: bool,
        dst: &mut Vec<u8>,
    ) {
        match name {
            Name::Index(index) => {
                debug_assert!(index != 0 && index <= self.table.current_max_index());
                encode_integer(index, 4, repr.0, dst);
            }
            Name::Literal(name) => {
                encode_integer(0, 4, repr.0, dst);
                encode_string(name, use_huffman, dst);
            }
        }
        encode_string(value, use_huffman, dst);
    }
}

#[cfg(test)]
mod ut_encoder {
    use super::Encoder;
    use crate::error::HpackError;
    use crate::representation::Name;
    use crate::util::test_util::decode as hex;

    macro_rules! encode_test_case {
        (
            $encoder: expr, $res: literal, $size: expr,
            { $($name: literal => $value: literal),* $(,)? } $(,)?
        ) => {{
            let mut dst = Vec::new();
            $(
                $encoder.encode($name, $value, true, false, &mut dst);
            )*
            assert_eq!(dst, hex($res).unwrap());
            assert_eq!($encoder.table().current_size(), $size);
        }};
        (
            $encoder: expr, huffman, $res: literal, $size: expr,
            { $($name: literal => $value: literal),* $(,)? } $(,)?
        ) => {{
            let mut dst = Vec::new();
            $(
                $encoder.encode($name, $value, true, true, &mut dst);
            )*
            assert_eq!(dst, hex($res).unwrap());
            assert_eq!($encoder.table().current_size(), $size);
        }};
    }

    /// UT test cases for single representations.
    ///
    /// # Brief
    /// 1. Encodes the RFC7541 Appendix C.2 examples.
    /// 2. Checks the bytes and the table size.
    #[test]
    fn ut_encoder_representations() {
        // C.2.1. Literal Header Field with Indexing
        let mut encoder = Encoder::new(4096);
        encode_test_case!(
            encoder,
            "400a637573746f6d2d6b65790d637573746f6d2d686561646572",
            55,
            { b"custom-key" => b"custom-header" },
        );

        // C.2.2. Literal Header Field without Indexing
        let mut encoder = Encoder::new(4096);
        let mut dst = Vec::new();
        encoder.encode_without_indexing(Name::Index(4), b"/sample/path", false, &mut dst);
        assert_eq!(dst, hex("040c2f73616d706c652f70617468").unwrap());
        assert_eq!(encoder.table().current_size(), 0);

        // C.2.3. Literal Header Field Never Indexed
        let mut dst = Vec::new();
        encoder.encode_never_indexing(Name::Literal(b"password"), b"secret", false, &mut dst);
        assert_eq!(dst, hex("100870617373776f726406736563726574").unwrap());
        assert_eq!(encoder.table().current_size(), 0);

        // C.2.4. Indexed Header Field
        let mut encoder = Encoder::new(4096);
        encode_test_case!(encoder, "82", 0, { b":method" => b"GET" });
    }

    /// UT test cases for the request examples without Huffman coding.
    ///
    /// # Brief
    /// 1. Encodes the three requests of RFC7541 Appendix C.3 through one
    ///    encoder.
    /// 2. Checks bytes and table sizes.
    #[test]
    fn ut_encoder_rfc7541_c3_requests() {
        let mut encoder = Encoder::new(4096);

        // C.3.1. First Request
        encode_test_case!(
            encoder,
            "828684410f7777772e6578616d706c652e636f6d",
            57,
            {
                b":method" => b"GET",
                b":scheme" => b"http",
                b":path" => b"/",
                b":authority" => b"www.example.com",
            },
        );

        // C.3.2. Second Request
        encode_test_case!(
            encoder,
            "828684be58086e6f2d6361636865",
            110,
            {
                b":method" => b"GET",
                b":scheme" => b"http",
                b":path" => b"/",
                b":authority" => b"www.example.com",
                b"cache-control" => b"no-cache",
            },
        );

        // C.3.3. Third Request
        encode_test_case!(
            encoder,
            "828785bf400a637573746f6d2d6b65790c637573746f6d2d76616c7565",
            164,
            {
                b":method" => b"GET",
                b":scheme" => b"https",
                b":path" => b"/index.html",
                b":authority" => b"www.example.com",
                b"custom-key" => b"custom-value",
            },
        );
    }

    /// UT test cases for the request examples with Huffman coding.
    ///
    /// # Brief
    /// 1. Encodes the three requests of RFC7541 Appendix C.4.
    /// 2. Checks bytes and table sizes.
    #[test]
    fn ut_encoder_rfc7541_c4_requests() {
        let mut encoder = Encoder::new(4096);

        // C.4.1. First Request
        encode_test_case!(
            encoder,
            huffman,
            "828684418cf1e3c2e5f23a6ba0ab90f4ff",
            57,
            {
                b":method" => b"GET",
                b":scheme" => b"http",
                b":path" => b"/",
                b":authority" => b"www.example.com",
            },
        );

        // C.4.2. Second Request
        encode_test_case!(
            encoder,
            huffman,
            "828684be5886a8eb10649cbf",
            110,
            {
                b":method" => b"GET",
                b":scheme" => b"http",
                b":path" => b"/",
                b":authority" => b"www.example.com",
                b"cache-control" => b"no-cache",
            },
        );

        // C.4.3. Third Request
        encode_test_case!(
            encoder,
            huffman,
            "828785bf408825a849e95ba97d7f8925a849e95bb8e8b4bf",
            164,
            {
                b":method" => b"GET",
                b":scheme" => b"https",
                b":path" => b"/index.html",
                b":authority" => b"www.example.com",
                b"custom-key" => b"custom-value",
            },
        );
    }

    /// UT test cases for the response examples and eviction.
    ///
    /// # Brief
    /// 1. Encodes the three responses of RFC7541 Appendix C.5 through a
    ///    256-byte table.
    /// 2. Checks bytes and the table sizes after each response.
    #[test]
    fn ut_encoder_rfc7541_c5_responses() {
        let mut encoder = Encoder::new(256);

        // C.5.1. First Response
        encode_test_case!(
            encoder,
            "4803333032580770726976617465611d\
             4d6f6e2c203231204f63742032303133\
             2032303a31333a323120474d546e1768\
             747470733a2f2f7777772e6578616d70\
             6c652e636f6d",
            222,
            {
                b":status" => b"302",
                b"cache-control" => b"private",
                b"date" => b"Mon, 21 Oct 2013 20:13:21 GMT",
                b"location" => b"https://www.example.com",
            },
        );

        // C.5.2. Second Response
        encode_test_case!(
            encoder,
            "4803333037c1c0bf",
            222,
            {
                b":status" => b"307",
                b"cache-control" => b"private",
                b"date" => b"Mon, 21 Oct 2013 20:13:21 GMT",
                b"location" => b"https://www.example.com",
            },
        );

        // C.5.3. Third Response
        encode_test_case!(
            encoder,
            "88c1611d4d6f6e2c203231204f637420\
             323031332032303a31333a323220474d\
             54c05a04677a69707738666f6f3d4153\
             444a4b48514b425a584f5157454f5049\
             5541585157454f49553b206d61782d61\
             67653d333630303b2076657273696f6e\
             3d31",
            215,
            {
                b":status" => b"200",
                b"cache-control" => b"private",
                b"date" => b"Mon, 21 Oct 2013 20:13:22 GMT",
                b"location" => b"https://www.example.com",
                b"content-encoding" => b"gzip",
                b"set-cookie" => b"foo=ASDJKHQKBZXOQWEOPIUAXQWEOIU; max-age=3600; version=1",
            },
        );
    }

    /// UT test cases for the response examples with Huffman coding.
    ///
    /// # Brief
    /// 1. Encodes the three responses of RFC7541 Appendix C.6.
    /// 2. Checks bytes and table sizes.
    #[test]
    fn ut_encoder_rfc7541_c6_responses() {
        let mut encoder = Encoder::new(256);

        // C.6.1. First Response
        encode_test_case!(
            encoder,
            huffman,
            "488264025885aec3771a4b6196d07abe\
             941054d444a8200595040b8166e082a6\
             2d1bff6e919d29ad171863c78f0b97c8\
             e9ae82ae43d3",
            222,
            {
                b":status" => b"302",
                b"cache-control" => b"private",
                b"date" => b"Mon, 21 Oct 2013 20:13:21 GMT",
                b"location" => b"https://www.example.com",
            },
        );

        // C.6.2. Second Response
        encode_test_case!(
            encoder,
            huffman,
            "4883640effc1c0bf",
            222,
            {
                b":status" => b"307",
                b"cache-control" => b"private",
                b"date" => b"Mon, 21 Oct 2013 20:13:21 GMT",
                b"location" => b"https://www.example.com",
            },
        );

        // C.6.3. Third Response
        encode_test_case!(
            encoder,
            huffman,
            "88c16196d07abe941054d444a8200595\
             040b8166e084a62d1bffc05a839bd9ab\
             77ad94e7821dd7f2e6c7b335dfdfcd5b\
             3960d5af27087f3672c1ab270fb5291f\
             9587316065c003ed4ee5b1063d5007",
            215,
            {
                b":status" => b"200",
                b"cache-control" => b"private",
                b"date" => b"Mon, 21 Oct 2013 20:13:22 GMT",
                b"location" => b"https://www.example.com",
                b"content-encoding" => b"gzip",
                b"set-cookie" => b"foo=ASDJKHQKBZXOQWEOPIUAXQWEOIU; max-age=3600; version=1",
            },
        );
    }

    /// UT test cases for `encode_status`.
    ///
    /// # Brief
    /// 1. Encodes the seven cached status codes.
    /// 2. Encodes an uncached code twice and checks that the second
    ///    encoding is fully indexed from the dynamic table.
    #[test]
    fn ut_encoder_status() {
        let mut encoder = Encoder::new(4096);
        for (status, byte) in [
            (200u16, 0x88u8),
            (204, 0x89),
            (206, 0x8a),
            (304, 0x8b),
            (400, 0x8c),
            (404, 0x8d),
            (500, 0x8e),
        ] {
            let mut dst = Vec::new();
            encoder.encode_status(status, &mut dst);
            assert_eq!(dst, vec![byte]);
        }
        assert_eq!(encoder.table().current_size(), 0);

        let mut dst = Vec::new();
        encoder.encode_status(302, &mut dst);
        assert_eq!(dst, hex("4803333032").unwrap());
        assert_eq!(encoder.table().current_size(), 42);

        let mut dst = Vec::new();
        encoder.encode_status(302, &mut dst);
        assert_eq!(dst, vec![0xbe]);
    }

    /// UT test cases for `encode_with_cache`.
    ///
    /// # Brief
    /// 1. Encodes a pair twice through the cache.
    /// 2. Checks that only the first encoding is a literal.
    #[test]
    fn ut_encoder_with_cache() {
        let mut encoder = Encoder::new(4096);

        let mut dst = Vec::new();
        encoder
            .encode_with_cache(Name::Literal(b"x-trace"), b"abc", false, &mut dst)
            .unwrap();
        assert_eq!(dst, hex("4007782d747261636503616263").unwrap());

        let mut dst = Vec::new();
        encoder
            .encode_with_cache(Name::Literal(b"x-trace"), b"abc", false, &mut dst)
            .unwrap();
        assert_eq!(dst, vec![0xbe]);

        // An indexed name goes through the same cache.
        let mut dst = Vec::new();
        encoder
            .encode_with_cache(Name::Index(62), b"def", false, &mut dst)
            .unwrap();
        assert_eq!(dst, hex("7e03646566").unwrap());

        let mut dst = Vec::new();
        encoder
            .encode_with_cache(Name::Index(63), b"def", false, &mut dst)
            .unwrap();
        assert_eq!(dst, vec![0xbe]);
    }

    /// UT test cases for `encode_size_update`.
    ///
    /// # Brief
    /// 1. Updates the table size within and beyond the protocol limit.
    /// 2. Checks the bytes and the error.
    #[test]
    fn ut_encoder_size_update() {
        let mut encoder = Encoder::new(4096);
        let mut dst = Vec::new();
        encoder.encode_size_update(30, &mut dst).unwrap();
        assert_eq!(dst, vec![0x3e]);
        assert_eq!(encoder.table().max_size(), 30);

        let mut dst = Vec::new();
        assert_eq!(
            encoder.encode_size_update(8192, &mut dst),
            Err(HpackError::Protocol(
                "dynamic table size update exceeds protocol maximum"
            ))
        );
        assert!(dst.is_empty());
    }
}
