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

//! [Huffman coding] implementation of the HPACK string literal format.
//!
//! [Huffman Coding]: https://en.wikipedia.org/wiki/Huffman_coding
//!
//! # Huffman code in HPACK
//! There is a table of Huffman code in `RFC7541`. This [Huffman code] was
//! generated from statistics obtained on a large sample of HTTP headers.
//! It is a canonical Huffman code with some tweaking to ensure that no
//! symbol has a unique code length.
//!
//! The code contains 257 symbols: the 256 byte values plus an `EOS`
//! symbol whose prefix is used to pad the final byte of an encoded
//! string. A decoded `EOS`, padding longer than 7 bits, or padding bits
//! that are not all ones are protocol errors (`RFC7541 section-5.2`).
//!
//! [Huffman Code]: https://www.rfc-editor.org/rfc/rfc7541.html#ref-HUFFMAN

mod consts;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::OnceLock;

use consts::HUFFMAN_TABLE;

use crate::error::HpackError;

/// Returns the length in bytes of `src` after Huffman encoding,
/// including the padding of the final partial byte.
pub(crate) fn encoded_len(src: &[u8]) -> usize {
    let bits: usize = src
        .iter()
        .map(|byte| HUFFMAN_TABLE[*byte as usize].0 as usize)
        .sum();
    bits.div_ceil(8)
}

/// Converts a string to a Huffman code, and then puts it into the
/// specified `Vec<u8>`.
pub(crate) fn encode(src: &[u8], dst: &mut Vec<u8>) {
    // We use `state` as a 64-bit reservoir and `unfilled` as the number
    // of bits in it that are not filled yet. Each symbol's code is
    // shifted into the unfilled part; whenever the reservoir fills up,
    // its 8 bytes are flushed to `dst`.
    //
    // `state`:
    // +----------+----------+----------------------------+
    // | Result A | Result B |          Unfilled          |
    // +----------+----------+----------------------------+
    // |<-------------------  64 bits  ------------------->
    let mut state = 0u64;
    let mut unfilled = 64u32;

    for byte in src.iter() {
        let (nbits, code) = HUFFMAN_TABLE[*byte as usize];
        let nbits = nbits as u32;
        let code = code as u64;
        match unfilled.cmp(&nbits) {
            Ordering::Greater => {
                state |= code << (unfilled - nbits);
                unfilled -= nbits;
            }
            Ordering::Equal => {
                state |= code;
                dst.extend_from_slice(&state.to_be_bytes());
                state = 0;
                unfilled = 64;
            }
            // The code does not fit. Rotating it right by the overflow
            // splits it into the part that completes the reservoir (low
            // `unfilled` bits) and the part that starts the next one
            // (rotated to the top).
            Ordering::Less => {
                let rotate = code.rotate_right(nbits - unfilled);
                let mask = u64::MAX >> (64 - unfilled);
                state |= rotate & mask;
                dst.extend_from_slice(&state.to_be_bytes());
                state = rotate & !mask;
                unfilled = 64 - (nbits - unfilled);
            }
        }
    }

    // The final partial byte is padded with the prefix of the `EOS`
    // symbol, which is all ones.
    if unfilled != 64 {
        state |= u64::MAX >> (64 - unfilled);
        let bytes = state.to_be_bytes();
        let len = (8 - (unfilled >> 3)) as usize;
        dst.extend_from_slice(&bytes[..len]);
    }
}

/// Converts a Huffman-coded region into a literal string appended to the
/// specified `Vec<u8>`. The whole of `src` is the encoded region; the
/// caller has already cut it to the announced string length.
pub(crate) fn decode(src: &[u8], dst: &mut Vec<u8>) -> Result<(), HpackError> {
    let symbols = decode_map();
    // Bits are consumed MSB-first, accumulating the current candidate
    // code until it matches a symbol. The shortest code is 5 bits and
    // the longest is 30.
    let mut code = 0u32;
    let mut count = 0u8;
    for byte in src.iter() {
        for bit in (0..8).rev() {
            code = (code << 1) | ((byte >> bit) & 1) as u32;
            count += 1;
            if count < 5 {
                continue;
            }
            if let Some(sym) = symbols.get(&(count, code)) {
                if *sym == 256 {
                    return Err(HpackError::Protocol("EOS symbol in huffman string"));
                }
                dst.push(*sym as u8);
                code = 0;
                count = 0;
            } else if count == 30 {
                return Err(HpackError::Protocol("invalid huffman code"));
            }
        }
    }
    // Trailing bits must be a strict prefix of `EOS`: shorter than a
    // byte and all ones.
    if count > 7 {
        return Err(HpackError::Protocol("huffman padding exceeds 7 bits"));
    }
    if code != (1u32 << count) - 1 {
        return Err(HpackError::Protocol("huffman padding is not EOS prefix"));
    }
    Ok(())
}

/// Lookup from `(bit count, code)` to the symbol, built once from the
/// encode table.
fn decode_map() -> &'static HashMap<(u8, u32), u16> {
    static MAP: OnceLock<HashMap<(u8, u32), u16>> = OnceLock::new();
    MAP.get_or_init(|| {
        HUFFMAN_TABLE
            .iter()
            .enumerate()
            .map(|(sym, (count, code))| ((*count, *code), sym as u16))
            .collect()
    })
}

#[cfg(test)]
mod ut_huffman {
    use super::{decode, encode, encoded_len};
    use crate::error::HpackError;
    use crate::util::test_util::decode as hex;

    /// UT test cases for `encode`.
    ///
    /// # Brief
    /// 1. Calls `encode` function, passing in the specified parameters.
    /// 2. Checks if the test results are correct.
    #[test]
    fn ut_huffman_encode() {
        rfc7541_test_cases();

        macro_rules! huffman_test_case {
            ($ctn: expr, $res: expr $(,)?) => {
                let mut vec = Vec::new();
                encode($ctn.as_bytes(), &mut vec);
                assert_eq!(vec, hex($res).unwrap());
                assert_eq!(encoded_len($ctn.as_bytes()), vec.len());
            };
        }

        /// The following test cases are from RFC7541.
        fn rfc7541_test_cases() {
            // C.4.1 First Request
            huffman_test_case!("www.example.com", "f1e3c2e5f23a6ba0ab90f4ff");

            // C.4.2 Second Request
            huffman_test_case!("no-cache", "a8eb10649cbf");

            // C.4.3 Third Request
            huffman_test_case!("custom-value", "25a849e95bb8e8b4bf");

            // C.6.1 First Response
            huffman_test_case!("302", "6402");
            huffman_test_case!("private", "aec3771a4b");
            huffman_test_case!(
                "Mon, 21 Oct 2013 20:13:21 GMT",
                "d07abe941054d444a8200595040b8166e082a62d1bff"
            );
            huffman_test_case!(
                "https://www.example.com",
                "9d29ad171863c78f0b97c8e9ae82ae43d3"
            );

            // C.6.2 Second Response
            huffman_test_case!("307", "640eff");

            // C.6.3 Third Response
            huffman_test_case!("gzip", "9bd9ab");
            huffman_test_case!(
                "foo=ASDJKHQKBZXOQWEOPIUAXQWEOIU; max-age=3600; version=1",
                "94e7821dd7f2e6c7b335dfdfcd5b3960d5af27087f3672c1ab270fb5291f9587316065c003ed4ee5b1063d5007",
            );
        }
    }

    /// UT test cases for `decode`.
    ///
    /// # Brief
    /// 1. Calls `decode` function, passing in the specified parameters.
    /// 2. Checks if the test results are correct.
    #[test]
    fn ut_huffman_decode() {
        rfc7541_test_cases();

        macro_rules! huffman_test_case {
            ($ctn: expr, $res: expr $(,)?) => {
                let mut vec = Vec::new();
                decode(hex($ctn).unwrap().as_slice(), &mut vec).unwrap();
                assert_eq!(vec.as_slice(), $res.as_bytes());
            };
        }

        /// The following test cases are from RFC7541.
        fn rfc7541_test_cases() {
            // C.4.1 First Request
            huffman_test_case!("f1e3c2e5f23a6ba0ab90f4ff", "www.example.com");

            // C.4.2 Second Request
            huffman_test_case!("a8eb10649cbf", "no-cache");

            // C.4.3 Third Request
            huffman_test_case!("25a849e95bb8e8b4bf", "custom-value");

            // C.6.1 First Response
            huffman_test_case!("6402", "302");
            huffman_test_case!("aec3771a4b", "private");
            huffman_test_case!(
                "d07abe941054d444a8200595040b8166e082a62d1bff",
                "Mon, 21 Oct 2013 20:13:21 GMT"
            );
            huffman_test_case!(
                "9d29ad171863c78f0b97c8e9ae82ae43d3",
                "https://www.example.com",
            );

            // C.6.2 Second Response
            huffman_test_case!("640eff", "307");

            // C.6.3 Third Response
            huffman_test_case!("9bd9ab", "gzip");
            huffman_test_case!(
                "94e7821dd7f2e6c7b335dfdfcd5b3960d5af27087f3672c1ab270fb5291f9587316065c003ed4ee5b1063d5007",
                "foo=ASDJKHQKBZXOQWEOPIUAXQWEOIU; max-age=3600; version=1"
            );
        }
    }

    /// UT test cases for the `encode`/`decode` round trip.
    ///
    /// # Brief
    /// 1. Encodes every byte value and a set of strings.
    /// 2. Decodes the result back and checks it matches the input.
    #[test]
    fn ut_huffman_roundtrip() {
        let all_bytes: Vec<u8> = (0..=255).collect();
        let cases: &[&[u8]] = &[
            b"",
            b"a",
            b"hello world",
            b"text/html; charset=utf-8",
            all_bytes.as_slice(),
        ];
        for case in cases {
            let mut encoded = Vec::new();
            encode(case, &mut encoded);
            let mut decoded = Vec::new();
            decode(&encoded, &mut decoded).unwrap();
            assert_eq!(&decoded, case);
        }
    }

    /// UT test cases for `decode` error boundaries.
    ///
    /// # Brief
    /// 1. Decodes a payload whose symbols decode to `EOS`.
    /// 2. Decodes a payload with more than 7 bits of padding.
    /// 3. Decodes a payload whose padding bits are not all ones.
    /// 4. Checks that all three fail with protocol errors.
    #[test]
    fn ut_huffman_decode_errors() {
        let mut dst = Vec::new();
        assert_eq!(
            decode(&[0xff, 0xff, 0xff, 0xff], &mut dst),
            Err(HpackError::Protocol("EOS symbol in huffman string"))
        );

        dst.clear();
        assert_eq!(
            decode(&[0xff, 0xff], &mut dst),
            Err(HpackError::Protocol("huffman padding exceeds 7 bits"))
        );

        // '0' (5-bit code 0b00000) followed by three 0 padding bits.
        dst.clear();
        assert_eq!(
            decode(&[0x00], &mut dst),
            Err(HpackError::Protocol("huffman padding is not EOS prefix"))
        );
    }
}
