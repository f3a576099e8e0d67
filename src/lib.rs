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

//! [HPACK] implementation of the [HTTP/2 protocol].
//!
//! [HPACK]: https://httpwg.org/specs/rfc7541.html
//! [HTTP/2 protocol]: https://httpwg.org/specs/rfc9113.html
//!
//! # Introduction
//! In [HTTP/1.1], header fields are not compressed. As web pages have grown
//! to require dozens to hundreds of requests, the redundant header fields in
//! these requests unnecessarily consume bandwidth, measurably increasing
//! latency.
//!
//! [SPDY] initially addressed this redundancy by compressing header fields
//! using the [DEFLATE] format, which proved very effective at efficiently
//! representing the redundant header fields. However, that approach exposed a
//! security risk as demonstrated by the
//! [CRIME (Compression Ratio Info-leak Made Easy)] attack.
//!
//! HPACK is a compressor that eliminates redundant header fields, limits
//! vulnerability to known security attacks, and has a bounded memory
//! requirement for use in constrained environments.
//!
//! # Endpoints
//! The crate offers a stateful pair of endpoints. An [`Encoder`] turns
//! `(name, value)` header fields into the packed octet representation; a
//! [`Decoder`] turns the octets back into fields. The two endpoints share
//! no runtime state: each maintains its own dynamic table, kept
//! synchronized with the peer's by processing the same byte stream.
//!
//! Header blocks that arrive split across HTTP/2 `CONTINUATION` frames
//! are absorbed by the [`ChunkedDecoder`], which suspends on short input
//! and resumes when the next fragment is fed.
//!
//! The crate operates on already-reassembled header block fragments. It
//! performs no framing, no I/O and no validation of the semantic HTTP
//! layer.
//!
//! [HTTP/1.1]: https://www.rfc-editor.org/rfc/rfc9112.html
//! [SPDY]: https://datatracker.ietf.org/doc/html/draft-mbelshe-httpbis-spdy-00
//! [DEFLATE]: https://www.rfc-editor.org/rfc/rfc1951.html
//! [CRIME (Compression Ratio Info-leak Made Easy)]: https://en.wikipedia.org/w/index.php?title=CRIME&oldid=660948120

mod chunked;
mod decoder;
mod encoder;
mod error;
mod huffman;
mod integer;
mod representation;
mod string;
mod table;

pub(crate) mod util;

pub use chunked::ChunkedDecoder;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::HpackError;
pub use representation::Name;
pub use table::{DynamicTable, FindResult, StaticTable};
