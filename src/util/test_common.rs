// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Synthetic page/column-chunk builders shared by unit tests across the
//! crate (`column`, `file`, `record`, `filter`). Not part of the public
//! API: only compiled under `#[cfg(test)]`.

use std::io::Cursor;

use parquet_format::PageHeader;
use thrift::protocol::{TCompactOutputProtocol, TSerializable};

use crate::basic::Compression;
use crate::column::page::Page;
use crate::compression::create_codec;
use crate::data_type::{DataType, ParquetValueType};
use crate::encodings::encoding::{get_encoder, Encoder};
use crate::encodings::levels::LevelEncoder;
use crate::file::metadata;
use crate::schema::types::ColumnDescPtr;
use crate::util::memory::ByteBufferPtr;

pub trait DataPageBuilder {
    fn add_rep_levels(&mut self, max_level: i16, rep_levels: &[i16]);
    fn add_def_levels(&mut self, max_level: i16, def_levels: &[i16]);
    fn add_values<T: DataType>(&mut self, encoding: crate::basic::Encoding, values: &[T::T])
    where
        T::T: ParquetValueType;
    fn add_indices(&mut self, indices: ByteBufferPtr, encoding: crate::basic::Encoding);
    fn consume(self) -> Page;
}

/// Builds one `Page::DataPage`/`Page::DataPageV2`, uncompressed, for tests
/// that need a page without going through the full column writer.
///
/// Callers add, in order: `add_rep_levels`, `add_def_levels`, then either
/// `add_values` (a plain/delta/etc. encoded data page) or `add_indices` (a
/// dictionary-indexed data page), then `consume`.
pub struct DataPageBuilderImpl {
    desc: ColumnDescPtr,
    encoding: Option<crate::basic::Encoding>,
    num_values: u32,
    buffer: Vec<u8>,
    rep_levels_byte_len: u32,
    def_levels_byte_len: u32,
    datapage_v2: bool,
}

impl DataPageBuilderImpl {
    pub fn new(desc: ColumnDescPtr, num_values: u32, datapage_v2: bool) -> Self {
        Self {
            desc,
            encoding: None,
            num_values,
            buffer: Vec::new(),
            rep_levels_byte_len: 0,
            def_levels_byte_len: 0,
            datapage_v2,
        }
    }

    fn add_levels(&mut self, max_level: i16, levels: &[i16]) -> u32 {
        let mut encoder = LevelEncoder::new(max_level);
        encoder.put(levels);
        if self.datapage_v2 {
            let body = encoder.consume_v2();
            let len = body.len() as u32;
            self.buffer.extend_from_slice(&body);
            len
        } else {
            let framed = encoder.consume_v1();
            // `consume_v1` includes its own 4-byte length prefix; report
            // only the body length back, matching DataPageV2's byte_len
            // semantics used by the DataPage v1 reader (which re-derives
            // the prefix from the bytes themselves).
            let body_len = framed.len().saturating_sub(4) as u32;
            self.buffer.extend_from_slice(&framed);
            body_len
        }
    }
}

impl DataPageBuilder for DataPageBuilderImpl {
    fn add_rep_levels(&mut self, max_level: i16, rep_levels: &[i16]) {
        self.num_values = rep_levels.len() as u32;
        self.rep_levels_byte_len = self.add_levels(max_level, rep_levels);
    }

    fn add_def_levels(&mut self, max_level: i16, def_levels: &[i16]) {
        assert_eq!(
            self.num_values,
            def_levels.len() as u32,
            "add_rep_levels() must be called first with the same length"
        );
        self.def_levels_byte_len = self.add_levels(max_level, def_levels);
    }

    fn add_values<T: DataType>(&mut self, encoding: crate::basic::Encoding, values: &[T::T])
    where
        T::T: ParquetValueType,
    {
        assert!(self.num_values >= values.len() as u32);
        self.encoding = Some(encoding);
        let mut encoder: Box<dyn Encoder<T>> = get_encoder::<T>(encoding).expect("get_encoder() should succeed");
        encoder.put(values).expect("put() should succeed");
        let encoded = encoder.flush_buffer().expect("flush_buffer() should succeed");
        self.buffer.extend_from_slice(encoded.data());
    }

    fn add_indices(&mut self, indices: ByteBufferPtr, encoding: crate::basic::Encoding) {
        self.encoding = Some(encoding);
        self.buffer.extend_from_slice(indices.data());
    }

    fn consume(self) -> Page {
        let _ = &self.desc;
        if self.datapage_v2 {
            Page::DataPageV2 {
                buf: ByteBufferPtr::new(self.buffer),
                num_values: self.num_values,
                encoding: self.encoding.unwrap(),
                num_nulls: 0,
                num_rows: self.num_values,
                def_levels_byte_len: self.def_levels_byte_len,
                rep_levels_byte_len: self.rep_levels_byte_len,
                is_compressed: false,
                statistics: None,
            }
        } else {
            Page::DataPage {
                buf: ByteBufferPtr::new(self.buffer),
                num_values: self.num_values,
                encoding: self.encoding.unwrap(),
                def_level_encoding: crate::basic::Encoding::RLE,
                rep_level_encoding: crate::basic::Encoding::RLE,
                statistics: None,
            }
        }
    }
}

fn page_header_for(page: &Page, uncompressed_size: usize, compressed_size: usize) -> PageHeader {
    let mut header = PageHeader {
        type_: page.page_type().into(),
        uncompressed_page_size: uncompressed_size as i32,
        compressed_page_size: compressed_size as i32,
        crc: None,
        data_page_header: None,
        index_page_header: None,
        dictionary_page_header: None,
        data_page_header_v2: None,
    };
    match page {
        Page::DictionaryPage {
            num_values,
            encoding,
            is_sorted,
            ..
        } => {
            header.dictionary_page_header = Some(parquet_format::DictionaryPageHeader {
                num_values: *num_values as i32,
                encoding: (*encoding).into(),
                is_sorted: Some(*is_sorted),
            });
        }
        Page::DataPage {
            num_values,
            encoding,
            def_level_encoding,
            rep_level_encoding,
            statistics,
            ..
        } => {
            header.data_page_header = Some(parquet_format::DataPageHeader {
                num_values: *num_values as i32,
                encoding: (*encoding).into(),
                definition_level_encoding: (*def_level_encoding).into(),
                repetition_level_encoding: (*rep_level_encoding).into(),
                statistics: statistics.as_ref().map(metadata::to_thrift),
            });
        }
        Page::DataPageV2 {
            num_values,
            encoding,
            num_nulls,
            num_rows,
            def_levels_byte_len,
            rep_levels_byte_len,
            is_compressed,
            statistics,
            ..
        } => {
            header.data_page_header_v2 = Some(parquet_format::DataPageHeaderV2 {
                num_values: *num_values as i32,
                num_nulls: *num_nulls as i32,
                num_rows: *num_rows as i32,
                encoding: (*encoding).into(),
                definition_levels_byte_length: *def_levels_byte_len as i32,
                repetition_levels_byte_length: *rep_levels_byte_len as i32,
                is_compressed: Some(*is_compressed),
                statistics: statistics.as_ref().map(metadata::to_thrift),
            });
        }
    }
    header
}

/// Serializes `pages` (as produced by `DataPageBuilderImpl`) with real page
/// headers, optionally compressing each with `codec`, into the bytes one
/// column chunk would occupy on disk. Used by `SerializedPageReader` tests
/// that need a realistic byte stream without running the column writer.
pub fn make_column_chunk_bytes(_descr: &crate::schema::types::SchemaDescriptor, codec: Compression, pages: Vec<Page>) -> Vec<u8> {
    let mut out = Vec::new();
    for page in pages {
        let uncompressed = page.buffer().clone();
        let compressed = match create_codec(codec).expect("codec should be supported") {
            None => uncompressed.data().to_vec(),
            Some(mut c) => {
                let mut buf = Vec::new();
                c.compress(uncompressed.data(), &mut buf).expect("compress should succeed");
                buf
            }
        };
        let header = page_header_for(&page, uncompressed.len(), compressed.len());
        let mut header_bytes = Vec::new();
        {
            let mut prot = TCompactOutputProtocol::new(Cursor::new(&mut header_bytes));
            header.write_to_out_protocol(&mut prot).expect("page header should serialize");
        }
        out.extend_from_slice(&header_bytes);
        out.extend_from_slice(&compressed);
    }
    out
}
