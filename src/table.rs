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

//! The [`Static Table`][static_table] and [`Dynamic Table`][dynamic_table]
//! implementations of [HPACK].
//!
//! [static_table]: https://httpwg.org/specs/rfc7541.html#static.table
//! [dynamic_table]: https://httpwg.org/specs/rfc7541.html#dynamic.table
//! [HPACK]: https://httpwg.org/specs/rfc7541.html
//!
//! # Index Address Space
//! ```text
//!  <----------  Index Address Space ---------->
//!  <-- Static  Table -->  <-- Dynamic Table -->
//!  +---+-----------+---+  +---+-----------+---+
//!  | 1 |    ...    | s |  |s+1|    ...    |s+k|
//!  +---+-----------+---+  +---+-----------+---+
//!                         ^                   |
//!                         |                   V
//!                  Insertion Point      Dropping Point
//! ```
//!
//! Indices `1..=61` address the static table; `62..` address the dynamic
//! table, newest entry first. Index `0` is reserved as "not found".

use std::collections::{HashMap, VecDeque};

use crate::error::HpackError;

/// Result of a table lookup. `index` is `0` when the name was not found;
/// `value_indexed` is set when the entry at `index` also carries the
/// searched value, so the field can be encoded fully indexed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FindResult {
    /// Index of the best matching entry, `0` if none.
    pub index: usize,
    /// Whether the entry at `index` also matches the value.
    pub value_indexed: bool,
}

impl FindResult {
    /// Returns `true` if a name match was found.
    pub fn found(&self) -> bool {
        self.index != 0
    }

    fn name_only(index: usize) -> Self {
        Self {
            index,
            value_indexed: false,
        }
    }

    fn full(index: usize) -> Self {
        Self {
            index,
            value_indexed: true,
        }
    }
}

/// The predefined static list of header fields of `RFC7541 Appendix A`.
///
/// Entries sharing a name are contiguous, e.g. all `:status` entries.
/// This grouping is load-bearing: a name lookup probes the first
/// matching index and then scans forward for a value match.
pub struct StaticTable;

impl StaticTable {
    pub const AUTHORITY: usize = 1;
    pub const METHOD_GET: usize = 2;
    pub const METHOD_POST: usize = 3;
    pub const PATH: usize = 4;
    pub const PATH_INDEX_HTML: usize = 5;
    pub const SCHEME_HTTP: usize = 6;
    pub const SCHEME_HTTPS: usize = 7;
    pub const STATUS_200: usize = 8;
    pub const STATUS_204: usize = 9;
    pub const STATUS_206: usize = 10;
    pub const STATUS_304: usize = 11;
    pub const STATUS_400: usize = 12;
    pub const STATUS_404: usize = 13;
    pub const STATUS_500: usize = 14;
    pub const ACCEPT_CHARSET: usize = 15;
    pub const ACCEPT_ENCODING: usize = 16;
    pub const ACCEPT_LANGUAGE: usize = 17;
    pub const ACCEPT_RANGES: usize = 18;
    pub const ACCEPT: usize = 19;
    pub const ACCESS_CONTROL_ALLOW_ORIGIN: usize = 20;
    pub const AGE: usize = 21;
    pub const ALLOW: usize = 22;
    pub const AUTHORIZATION: usize = 23;
    pub const CACHE_CONTROL: usize = 24;
    pub const CONTENT_DISPOSITION: usize = 25;
    pub const CONTENT_ENCODING: usize = 26;
    pub const CONTENT_LANGUAGE: usize = 27;
    pub const CONTENT_LENGTH: usize = 28;
    pub const CONTENT_LOCATION: usize = 29;
    pub const CONTENT_RANGE: usize = 30;
    pub const CONTENT_TYPE: usize = 31;
    pub const COOKIE: usize = 32;
    pub const DATE: usize = 33;
    pub const ETAG: usize = 34;
    pub const EXPECT: usize = 35;
    pub const EXPIRES: usize = 36;
    pub const FROM: usize = 37;
    pub const HOST: usize = 38;
    pub const IF_MATCH: usize = 39;
    pub const IF_MODIFIED_SINCE: usize = 40;
    pub const IF_NONE_MATCH: usize = 41;
    pub const IF_RANGE: usize = 42;
    pub const IF_UNMODIFIED_SINCE: usize = 43;
    pub const LAST_MODIFIED: usize = 44;
    pub const LINK: usize = 45;
    pub const LOCATION: usize = 46;
    pub const MAX_FORWARDS: usize = 47;
    pub const PROXY_AUTHENTICATE: usize = 48;
    pub const PROXY_AUTHORIZATION: usize = 49;
    pub const RANGE: usize = 50;
    pub const REFERER: usize = 51;
    pub const REFRESH: usize = 52;
    pub const RETRY_AFTER: usize = 53;
    pub const SERVER: usize = 54;
    pub const SET_COOKIE: usize = 55;
    pub const STRICT_TRANSPORT_SECURITY: usize = 56;
    pub const TRANSFER_ENCODING: usize = 57;
    pub const USER_AGENT: usize = 58;
    pub const VARY: usize = 59;
    pub const VIA: usize = 60;
    pub const WWW_AUTHENTICATE: usize = 61;

    /// The first index past the static table, where the dynamic table
    /// begins.
    pub const FIRST_UNUSED_INDEX: usize = 62;

    const ENTRIES: [(&'static [u8], &'static [u8]); 61] = [
        (b":authority", b""),
        (b":method", b"GET"),
        (b":method", b"POST"),
        (b":path", b"/"),
        (b":path", b"/index.html"),
        (b":scheme", b"http"),
        (b":scheme", b"https"),
        (b":status", b"200"),
        (b":status", b"204"),
        (b":status", b"206"),
        (b":status", b"304"),
        (b":status", b"400"),
        (b":status", b"404"),
        (b":status", b"500"),
        (b"accept-charset", b""),
        (b"accept-encoding", b"gzip, deflate"),
        (b"accept-language", b""),
        (b"accept-ranges", b""),
        (b"accept", b""),
        (b"access-control-allow-origin", b""),
        (b"age", b""),
        (b"allow", b""),
        (b"authorization", b""),
        (b"cache-control", b""),
        (b"content-disposition", b""),
        (b"content-encoding", b""),
        (b"content-language", b""),
        (b"content-length", b""),
        (b"content-location", b""),
        (b"content-range", b""),
        (b"content-type", b""),
        (b"cookie", b""),
        (b"date", b""),
        (b"etag", b""),
        (b"expect", b""),
        (b"expires", b""),
        (b"from", b""),
        (b"host", b""),
        (b"if-match", b""),
        (b"if-modified-since", b""),
        (b"if-none-match", b""),
        (b"if-range", b""),
        (b"if-unmodified-since", b""),
        (b"last-modified", b""),
        (b"link", b""),
        (b"location", b""),
        (b"max-forwards", b""),
        (b"proxy-authenticate", b""),
        (b"proxy-authorization", b""),
        (b"range", b""),
        (b"referer", b""),
        (b"refresh", b""),
        (b"retry-after", b""),
        (b"server", b""),
        (b"set-cookie", b""),
        (b"strict-transport-security", b""),
        (b"transfer-encoding", b""),
        (b"user-agent", b""),
        (b"vary", b""),
        (b"via", b""),
        (b"www-authenticate", b""),
    ];

    /// Gets the `(name, value)` pair at the given index. The value is
    /// empty for name-only entries.
    pub fn get_entry(index: usize) -> Option<(&'static [u8], &'static [u8])> {
        if (1..Self::FIRST_UNUSED_INDEX).contains(&index) {
            Some(Self::ENTRIES[index - 1])
        } else {
            None
        }
    }

    /// Returns the smallest index whose entry has the given name, or `0`.
    pub fn find_by_name(name: &[u8]) -> usize {
        for (n, (entry_name, _)) in Self::ENTRIES.iter().enumerate() {
            if *entry_name == name {
                return n + 1;
            }
        }
        0
    }

    /// Returns the smallest index whose entry carries the given value,
    /// or `0`. Only the handful of entries with a canonical value can
    /// match.
    pub fn find_by_value(value: &[u8]) -> usize {
        for (n, (_, entry_value)) in Self::ENTRIES.iter().enumerate() {
            if !entry_value.is_empty() && *entry_value == value {
                return n + 1;
            }
        }
        0
    }

    /// Searches for `(name, value)`. Probes the first index matching the
    /// name, then scans forward across the contiguous same-name group
    /// for a value match.
    pub fn find(name: &[u8], value: &[u8]) -> FindResult {
        let first = Self::find_by_name(name);
        if first == 0 {
            return FindResult::default();
        }
        let mut index = first;
        while let Some((entry_name, entry_value)) = Self::get_entry(index) {
            // The last entry of a valued group has no value, so the scan
            // stops inside the group.
            if entry_name != name || entry_value.is_empty() {
                break;
            }
            if entry_value == value {
                return FindResult::full(index);
            }
            index += 1;
        }
        FindResult::name_only(first)
    }

    /// Searches for a value match when the name is already known by its
    /// static index. The value alternatives of each valued group are
    /// enumerated; any other index can only yield a name match.
    pub fn find_by_index(name_index: usize, value: &[u8]) -> FindResult {
        match name_index {
            Self::METHOD_GET | Self::METHOD_POST => Self::substitute(name_index, value),
            Self::PATH | Self::PATH_INDEX_HTML => Self::substitute(name_index, value),
            Self::SCHEME_HTTP | Self::SCHEME_HTTPS => Self::substitute(name_index, value),
            Self::STATUS_200..=Self::STATUS_500 => Self::substitute(name_index, value),
            Self::ACCEPT_ENCODING => Self::substitute(name_index, value),
            index if (1..Self::FIRST_UNUSED_INDEX).contains(&index) => {
                FindResult::name_only(index)
            }
            _ => FindResult::default(),
        }
    }

    // `:path /` and `:path /index.html` must both resolve `/` to index 4.
    fn substitute(name_index: usize, value: &[u8]) -> FindResult {
        match Self::find_by_value(value) {
            0 => FindResult::name_only(name_index),
            index if Self::same_group(name_index, index) => FindResult::full(index),
            _ => FindResult::name_only(name_index),
        }
    }

    fn same_group(left: usize, right: usize) -> bool {
        match (Self::get_entry(left), Self::get_entry(right)) {
            (Some((l, _)), Some((r, _))) => l == r,
            _ => false,
        }
    }
}

/// An entry of the dynamic table. `insert_seq` is the value of the
/// table's monotonic insert counter when the entry was created; the
/// entry's current index is derived from it, so indices do not have to
/// be rewritten when newer entries are inserted.
struct Entry {
    name: Vec<u8>,
    value: Vec<u8>,
    insert_seq: u64,
}

impl Entry {
    /// `RFC7541-4.1`: the size of an entry is the sum of its name's
    /// length in octets, its value's length in octets, and 32.
    fn size(&self) -> usize {
        self.name.len() + self.value.len() + 32
    }
}

/// The per-connection table of recently seen header fields, maintained
/// in first-in first-out order and strictly bounded in bytes.
///
/// The first and newest entry is at the lowest index
/// (`StaticTable::FIRST_UNUSED_INDEX`), the oldest entry at the highest.
/// The table may contain duplicate entries; duplicates are not an error.
///
/// `max_size` can be changed in band through the size update
/// representation, but never beyond `protocol_max_size`, the hard limit
/// set by the enclosing protocol (`SETTINGS_HEADER_TABLE_SIZE` in
/// HTTP/2).
pub struct DynamicTable {
    entries: VecDeque<Entry>,
    name_index: HashMap<Vec<u8>, Vec<u64>>,
    current_size: usize,
    max_size: usize,
    protocol_max_size: usize,
    insert_count: u64,
}

impl DynamicTable {
    /// Creates a `DynamicTable` with the given size limit. The protocol
    /// hard limit starts out equal to it.
    pub fn with_max_size(max_size: usize) -> Self {
        Self::with_protocol_max_size(max_size, max_size)
    }

    /// Creates a `DynamicTable` whose protocol hard limit differs from
    /// its current size limit.
    pub fn with_protocol_max_size(max_size: usize, protocol_max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            name_index: HashMap::new(),
            current_size: 0,
            max_size: max_size.min(protocol_max_size),
            protocol_max_size,
            insert_count: 0,
        }
    }

    /// Bytes currently used by the entries.
    pub fn current_size(&self) -> usize {
        self.current_size
    }

    /// The current size limit in bytes.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// The hard upper bound on `max_size` set by the enclosing protocol.
    pub fn protocol_max_size(&self) -> usize {
        self.protocol_max_size
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The largest currently addressable index of the combined address
    /// space.
    pub fn current_max_index(&self) -> usize {
        StaticTable::FIRST_UNUSED_INDEX - 1 + self.entries.len()
    }

    /// Adds an entry at the newest end and returns its index
    /// (`StaticTable::FIRST_UNUSED_INDEX`). Entries are evicted from the
    /// oldest end until the new entry fits. An entry larger than
    /// `max_size` empties the table and returns `0` (`RFC7541-4.4`).
    pub fn add_entry(&mut self, name: &[u8], value: &[u8]) -> usize {
        let size = name.len() + value.len() + 32;
        if size > self.max_size {
            self.reset();
            return 0;
        }
        self.evict_until_fits(self.max_size - size);
        self.insert_count += 1;
        let entry = Entry {
            name: name.to_vec(),
            value: value.to_vec(),
            insert_seq: self.insert_count,
        };
        self.name_index
            .entry(entry.name.clone())
            .or_default()
            .push(entry.insert_seq);
        self.entries.push_front(entry);
        self.current_size += size;
        StaticTable::FIRST_UNUSED_INDEX
    }

    /// Applies a dynamic table size update. The new maximum must stay
    /// within the limit determined by the enclosing protocol; a value
    /// that exceeds it is a decoding error (`RFC7541-6.3`).
    pub fn update_size(&mut self, new_max_size: usize) -> Result<(), HpackError> {
        if new_max_size > self.protocol_max_size {
            return Err(HpackError::Protocol(
                "dynamic table size update exceeds protocol maximum",
            ));
        }
        self.evict_until_fits(new_max_size);
        self.max_size = new_max_size;
        Ok(())
    }

    /// Records a new protocol hard limit, shrinking the current maximum
    /// when it now exceeds the limit.
    pub fn set_protocol_max_size(&mut self, protocol_max_size: usize) {
        self.protocol_max_size = protocol_max_size;
        if self.max_size > protocol_max_size {
            self.evict_until_fits(protocol_max_size);
            self.max_size = protocol_max_size;
        }
    }

    /// Gets the `(name, value)` pair at the given index of the combined
    /// address space. The views are invalidated by the next
    /// `add_entry` or eviction.
    pub fn get_entry(&self, index: usize) -> Option<(&[u8], &[u8])> {
        let pos = index.checked_sub(StaticTable::FIRST_UNUSED_INDEX)?;
        self.entries
            .get(pos)
            .map(|entry| (entry.name.as_slice(), entry.value.as_slice()))
    }

    /// Searches for `(name, value)`. The name-keyed multimap yields the
    /// live entries bearing the name; value equality is a scan across
    /// them. The newest match wins, and a value match upgrades the
    /// result to fully indexed.
    pub fn find(&self, name: &[u8], value: &[u8]) -> FindResult {
        let seqs = match self.name_index.get(name) {
            Some(seqs) => seqs,
            None => return FindResult::default(),
        };
        let mut name_index = 0usize;
        let mut value_index = 0usize;
        for seq in seqs.iter() {
            let index = self.index_of(*seq);
            if name_index == 0 || index < name_index {
                name_index = index;
            }
            if let Some((_, entry_value)) = self.get_entry(index) {
                if entry_value == value && (value_index == 0 || index < value_index) {
                    value_index = index;
                }
            }
        }
        if value_index != 0 {
            FindResult::full(value_index)
        } else if name_index != 0 {
            FindResult::name_only(name_index)
        } else {
            FindResult::default()
        }
    }

    /// Searches for a value match when the name is already known by its
    /// dynamic index.
    pub fn find_by_index(&self, name_index: usize, value: &[u8]) -> FindResult {
        let (entry_name, entry_value) = match self.get_entry(name_index) {
            Some(entry) => entry,
            None => return FindResult::default(),
        };
        if entry_value == value {
            return FindResult::full(name_index);
        }
        self.find(entry_name, value)
    }

    /// Destroys all entries and releases their memory.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.name_index.clear();
        self.current_size = 0;
    }

    /// Current index of the entry inserted as number `seq`.
    fn index_of(&self, seq: u64) -> usize {
        StaticTable::FIRST_UNUSED_INDEX + (self.insert_count - seq) as usize
    }

    fn evict_until_fits(&mut self, bytes: usize) {
        while self.current_size > bytes {
            match self.entries.pop_back() {
                Some(entry) => {
                    self.current_size -= entry.size();
                    self.unindex(&entry);
                }
                None => break,
            }
        }
    }

    fn unindex(&mut self, entry: &Entry) {
        if let Some(seqs) = self.name_index.get_mut(&entry.name) {
            seqs.retain(|seq| *seq != entry.insert_seq);
            if seqs.is_empty() {
                self.name_index.remove(&entry.name);
            }
        }
    }
}

/// `TableSearcher` resolves the combined static and dynamic address
/// space for a decoder or encoder.
pub(crate) struct TableSearcher<'a> {
    dynamic: &'a DynamicTable,
}

impl<'a> TableSearcher<'a> {
    pub(crate) fn new(dynamic: &'a DynamicTable) -> Self {
        Self { dynamic }
    }

    /// Gets the `(name, value)` pair at the given index. Index `0` and
    /// indices past the end of the dynamic table are decoding errors
    /// (`RFC7541-6.1`).
    pub(crate) fn entry(&self, index: usize) -> Result<(&'a [u8], &'a [u8]), HpackError> {
        if index == 0 {
            return Err(HpackError::Protocol("index 0 is not used"));
        }
        if index < StaticTable::FIRST_UNUSED_INDEX {
            StaticTable::get_entry(index)
                .ok_or(HpackError::Protocol("index beyond table bounds"))
        } else {
            self.dynamic
                .get_entry(index)
                .ok_or(HpackError::Protocol("index beyond table bounds"))
        }
    }

    /// Searches both tables for `(name, value)`. The static table has
    /// priority over the dynamic table when both would match.
    pub(crate) fn find(&self, name: &[u8], value: &[u8]) -> FindResult {
        let st = StaticTable::find(name, value);
        if st.value_indexed {
            return st;
        }
        let dy = self.dynamic.find(name, value);
        if dy.value_indexed {
            return dy;
        }
        if st.found() {
            st
        } else {
            dy
        }
    }
}
