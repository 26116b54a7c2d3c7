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

//! Decoded page representations and the reader/writer page-stream traits.
//! A `Page` is the unit the column reader
//! consumes; a `CompressedPage` is its write-side mirror, still compressed
//! and framed, ready for `PageWriter` to serialize.

use crate::basic::{Compression, Encoding, PageType};
use crate::errors::Result;
use crate::file::metadata::Statistics;
use crate::util::memory::ByteBufferPtr;

/// One decoded page, its compression and level encodings already resolved.
#[derive(Clone, Debug)]
pub enum Page {
    DictionaryPage {
        buf: ByteBufferPtr,
        num_values: u32,
        encoding: Encoding,
        is_sorted: bool,
    },
    DataPage {
        buf: ByteBufferPtr,
        num_values: u32,
        encoding: Encoding,
        def_level_encoding: Encoding,
        rep_level_encoding: Encoding,
        statistics: Option<Statistics>,
    },
    DataPageV2 {
        buf: ByteBufferPtr,
        num_values: u32,
        encoding: Encoding,
        num_nulls: u32,
        num_rows: u32,
        def_levels_byte_len: u32,
        rep_levels_byte_len: u32,
        is_compressed: bool,
        statistics: Option<Statistics>,
    },
}

impl Page {
    pub fn page_type(&self) -> PageType {
        match self {
            Page::DictionaryPage { .. } => PageType::DICTIONARY_PAGE,
            Page::DataPage { .. } => PageType::DATA_PAGE,
            Page::DataPageV2 { .. } => PageType::DATA_PAGE_V2,
        }
    }

    pub fn buffer(&self) -> &ByteBufferPtr {
        match self {
            Page::DictionaryPage { buf, .. } => buf,
            Page::DataPage { buf, .. } => buf,
            Page::DataPageV2 { buf, .. } => buf,
        }
    }

    pub fn num_values(&self) -> u32 {
        match self {
            Page::DictionaryPage { num_values, .. } => *num_values,
            Page::DataPage { num_values, .. } => *num_values,
            Page::DataPageV2 { num_values, .. } => *num_values,
        }
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            Page::DictionaryPage { encoding, .. } => *encoding,
            Page::DataPage { encoding, .. } => *encoding,
            Page::DataPageV2 { encoding, .. } => *encoding,
        }
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        match self {
            Page::DictionaryPage { .. } => None,
            Page::DataPage { statistics, .. } => statistics.as_ref(),
            Page::DataPageV2 { statistics, .. } => statistics.as_ref(),
        }
    }
}

/// Produces the pages of one column chunk, in storage order (dictionary
/// page first if present, then data pages until the chunk's value count is
/// exhausted).
pub trait PageReader: Iterator<Item = Result<Page>> {
    fn get_next_page(&mut self) -> Result<Option<Page>>;
}

/// A still-compressed page ready to be framed with a page header and
/// written out, the write-side mirror of `Page`.
#[derive(Clone, Debug)]
pub enum CompressedPage {
    DictionaryPage {
        buf: ByteBufferPtr,
        num_values: u32,
        encoding: Encoding,
        is_sorted: bool,
        uncompressed_size: usize,
    },
    DataPage {
        buf: ByteBufferPtr,
        num_values: u32,
        encoding: Encoding,
        def_level_encoding: Encoding,
        rep_level_encoding: Encoding,
        statistics: Option<Statistics>,
        uncompressed_size: usize,
    },
    DataPageV2 {
        buf: ByteBufferPtr,
        num_values: u32,
        encoding: Encoding,
        num_nulls: u32,
        num_rows: u32,
        def_levels_byte_len: u32,
        rep_levels_byte_len: u32,
        is_compressed: bool,
        statistics: Option<Statistics>,
        uncompressed_size: usize,
    },
}

impl CompressedPage {
    pub fn page_type(&self) -> PageType {
        match self {
            CompressedPage::DictionaryPage { .. } => PageType::DICTIONARY_PAGE,
            CompressedPage::DataPage { .. } => PageType::DATA_PAGE,
            CompressedPage::DataPageV2 { .. } => PageType::DATA_PAGE_V2,
        }
    }

    pub fn buf(&self) -> &ByteBufferPtr {
        match self {
            CompressedPage::DictionaryPage { buf, .. } => buf,
            CompressedPage::DataPage { buf, .. } => buf,
            CompressedPage::DataPageV2 { buf, .. } => buf,
        }
    }

    pub fn compressed_size(&self) -> usize {
        self.buf().len()
    }

    pub fn uncompressed_size(&self) -> usize {
        match self {
            CompressedPage::DictionaryPage { uncompressed_size, .. } => *uncompressed_size,
            CompressedPage::DataPage { uncompressed_size, .. } => *uncompressed_size,
            CompressedPage::DataPageV2 { uncompressed_size, .. } => *uncompressed_size,
        }
    }

    pub fn num_values(&self) -> u32 {
        match self {
            CompressedPage::DictionaryPage { num_values, .. } => *num_values,
            CompressedPage::DataPage { num_values, .. } => *num_values,
            CompressedPage::DataPageV2 { num_values, .. } => *num_values,
        }
    }
}

/// What one written page cost in bytes, so the column writer can accumulate
/// `ColumnChunkMetaData` totals across every page of the chunk.
#[derive(Debug, Default, Clone, Copy)]
pub struct PageWriteSpec {
    pub bytes_written: u64,
    pub num_values: u32,
    pub uncompressed_size: usize,
    pub compressed_size: usize,
}

/// Accepts a column chunk's compressed pages, in storage order, and writes
/// them with a page header. Implemented by `SerializedPageWriter`.
pub trait PageWriter {
    fn write_page(&mut self, page: CompressedPage) -> Result<PageWriteSpec>;

    /// Called once after the last page of a column chunk, so the writer can
    /// flush buffered bytes and report the final byte ranges written.
    fn close(&mut self) -> Result<()>;
}
