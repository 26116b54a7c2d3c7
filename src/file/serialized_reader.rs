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

//! Implementations of `FileReader`/`RowGroupReader`/`PageReader` over a
//! concrete byte source: page-header
//! framing, decompression, and row-group predicate filtering.

use std::convert::TryFrom;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use bytes::{Buf, Bytes};
use parquet_format::{PageHeader, PageType as ThriftPageType};
use thrift::protocol::{TCompactInputProtocol, TSerializable};

use crate::basic::{Compression, Encoding, Type};
use crate::column::page::{Page, PageReader};
use crate::compression::{create_codec, Codec};
use crate::errors::{ParquetError, Result};
use crate::file::footer;
use crate::file::metadata::{self, ParquetMetaData, RowGroupMetaData};
use crate::file::reader::{ChunkReader, FileReader, Length, RowGroupReader};
use crate::record::{Row, RowIter};
use crate::schema::types::Type as SchemaType;
use crate::util::io::{FileSource, TryClone};
use crate::util::memory::ByteBufferPtr;

impl Length for File {
    fn len(&self) -> u64 {
        self.metadata().map(|m| m.len()).unwrap_or(0u64)
    }
}

impl TryClone for File {
    fn try_clone(&self) -> std::io::Result<Self> {
        File::try_clone(self)
    }
}

impl ChunkReader for File {
    type T = FileSource<File>;

    fn get_read(&self, start: u64, length: usize) -> Result<Self::T> {
        Ok(FileSource::new(self, start, length))
    }
}

impl Length for Bytes {
    fn len(&self) -> u64 {
        Bytes::len(self) as u64
    }
}

impl TryClone for Bytes {
    fn try_clone(&self) -> std::io::Result<Self> {
        Ok(self.clone())
    }
}

impl ChunkReader for Bytes {
    type T = bytes::buf::Reader<Bytes>;

    fn get_read(&self, start: u64, length: usize) -> Result<Self::T> {
        let start = start as usize;
        Ok(self.slice(start..start + length).reader())
    }
}

impl TryFrom<File> for SerializedFileReader<File> {
    type Error = ParquetError;

    fn try_from(file: File) -> Result<Self> {
        Self::new(file)
    }
}

impl<'a> TryFrom<&'a Path> for SerializedFileReader<File> {
    type Error = ParquetError;

    fn try_from(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::try_from(file)
    }
}

impl TryFrom<String> for SerializedFileReader<File> {
    type Error = ParquetError;

    fn try_from(path: String) -> Result<Self> {
        Self::try_from(Path::new(&path))
    }
}

impl<'a> TryFrom<&'a str> for SerializedFileReader<File> {
    type Error = ParquetError;

    fn try_from(path: &str) -> Result<Self> {
        Self::try_from(Path::new(path))
    }
}

/// Consumes a `SerializedFileReader<File>` into a `RowIter` over the whole
/// file's default schema, owning the reader itself.
impl IntoIterator for SerializedFileReader<File> {
    type Item = Row;
    type IntoIter = RowIter<'static>;

    fn into_iter(self) -> Self::IntoIter {
        RowIter::from_file_owned(None, Box::new(self)).expect("row assembly over an already-parsed file cannot fail")
    }
}

/// A `FileReader` over any `ChunkReader` byte source.
pub struct SerializedFileReader<R: ChunkReader> {
    chunk_reader: Arc<R>,
    metadata: ParquetMetaData,
}

/// Row-group predicates chained with AND, applied at `SerializedFileReader`
/// construction time.
pub struct ReadOptionsBuilder {
    predicates: Vec<Box<dyn FnMut(&RowGroupMetaData, usize) -> bool>>,
}

impl Default for ReadOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadOptionsBuilder {
    pub fn new() -> Self {
        Self { predicates: vec![] }
    }

    /// Filter to only row groups that match `predicate`.
    pub fn with_predicate(mut self, predicate: Box<dyn FnMut(&RowGroupMetaData, usize) -> bool>) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Filter to row groups whose byte-range midpoint falls in `[start,
    /// end)`.
    pub fn with_range(mut self, start: i64, end: i64) -> Self {
        assert!(start < end);
        let predicate = move |rg: &RowGroupMetaData, _: usize| {
            let mid = midpoint_offset(rg);
            mid >= start && mid < end
        };
        self.predicates.push(Box::new(predicate));
        self
    }

    pub fn build(self) -> ReadOptions {
        ReadOptions {
            predicates: self.predicates,
        }
    }
}

pub struct ReadOptions {
    predicates: Vec<Box<dyn FnMut(&RowGroupMetaData, usize) -> bool>>,
}

fn midpoint_offset(meta: &RowGroupMetaData) -> i64 {
    let col = meta.column(0);
    let mut offset = col.data_page_offset();
    if let Some(dict_offset) = col.dictionary_page_offset() {
        if offset > dict_offset {
            offset = dict_offset;
        }
    }
    offset + meta.total_byte_size() / 2
}

impl<R: 'static + ChunkReader> SerializedFileReader<R> {
    pub fn new(chunk_reader: R) -> Result<Self> {
        let metadata = footer::parse_metadata(&chunk_reader)?;
        Ok(Self {
            chunk_reader: Arc::new(chunk_reader),
            metadata,
        })
    }

    pub fn new_with_options(chunk_reader: R, options: ReadOptions) -> Result<Self> {
        let metadata = footer::parse_metadata(&chunk_reader)?;
        let mut predicates = options.predicates;
        let mut filtered_row_groups = Vec::new();
        for (i, rg_meta) in metadata.row_groups().iter().cloned().enumerate() {
            let keep = predicates.iter_mut().all(|p| p(&rg_meta, i));
            if keep {
                filtered_row_groups.push(rg_meta);
            }
        }
        Ok(Self {
            chunk_reader: Arc::new(chunk_reader),
            metadata: ParquetMetaData::new(metadata.file_metadata().clone(), filtered_row_groups),
        })
    }
}

impl<R: 'static + ChunkReader> FileReader for SerializedFileReader<R> {
    fn metadata(&self) -> &ParquetMetaData {
        &self.metadata
    }

    fn num_row_groups(&self) -> usize {
        self.metadata.num_row_groups()
    }

    fn get_row_group(&self, i: usize) -> Result<Box<dyn RowGroupReader + '_>> {
        let row_group_metadata = self.metadata.row_group(i);
        log::trace!("opening row group {} ({} columns)", i, row_group_metadata.num_columns());
        Ok(Box::new(SerializedRowGroupReader::new(
            Arc::clone(&self.chunk_reader),
            row_group_metadata,
        )))
    }

    fn get_row_iter(&self, projection: Option<SchemaType>) -> Result<RowIter> {
        RowIter::from_file(projection, self)
    }
}

/// A `RowGroupReader` over one row group's columns, sharing the parent's
/// `ChunkReader` so each column page reader can be opened independently
/// without re-reading the file.
pub struct SerializedRowGroupReader<'a, R: ChunkReader> {
    chunk_reader: Arc<R>,
    metadata: &'a RowGroupMetaData,
}

impl<'a, R: ChunkReader> SerializedRowGroupReader<'a, R> {
    fn new(chunk_reader: Arc<R>, metadata: &'a RowGroupMetaData) -> Self {
        Self {
            chunk_reader,
            metadata,
        }
    }
}

impl<'a, R: 'static + ChunkReader> RowGroupReader for SerializedRowGroupReader<'a, R> {
    fn metadata(&self) -> &RowGroupMetaData {
        self.metadata
    }

    fn num_columns(&self) -> usize {
        self.metadata.num_columns()
    }

    fn get_column_page_reader(&self, i: usize) -> Result<Box<dyn PageReader>> {
        let col = self.metadata.column(i);
        let (col_start, col_length) = col.byte_range();
        let chunk = self.chunk_reader.get_read(col_start, col_length as usize)?;
        let page_reader = SerializedPageReader::new(
            chunk,
            col.num_values(),
            col.compression(),
            col.column_descr().physical_type(),
        )?;
        Ok(Box::new(page_reader))
    }

    fn get_row_iter(&self, projection: Option<SchemaType>) -> Result<RowIter> {
        RowIter::from_row_group(projection, self)
    }
}

/// Reads one `PageHeader` off `input` via the thrift compact protocol.
pub(crate) fn read_page_header<T: Read>(input: &mut T) -> Result<PageHeader> {
    let mut prot = TCompactInputProtocol::new(input);
    PageHeader::read_from_in_protocol(&mut prot)
        .map_err(|e| ParquetError::General(format!("underlying Thrift error: {}", e)))
}

/// Decompresses (if needed) and interprets `buffer` per `page_header`
///: for `DataPageV2`, the repetition/definition level bytes
/// at the front of the page are never compressed, only the value bytes
/// that follow them are.
pub(crate) fn decode_page(
    page_header: PageHeader,
    buffer: ByteBufferPtr,
    physical_type: Type,
    decompressor: Option<&mut Box<dyn Codec>>,
) -> Result<Page> {
    let mut offset = 0usize;
    let mut can_decompress = true;

    if let Some(header_v2) = page_header.data_page_header_v2.as_ref() {
        offset = (header_v2.definition_levels_byte_length + header_v2.repetition_levels_byte_length) as usize;
        can_decompress = header_v2.is_compressed.unwrap_or(true);
    }

    let buffer = match decompressor {
        Some(decompressor) if can_decompress => {
            let uncompressed_size = page_header.uncompressed_page_size as usize;
            let mut decompressed = Vec::with_capacity(uncompressed_size);
            decompressed.extend_from_slice(&buffer.as_ref()[..offset]);
            let compressed = &buffer.as_ref()[offset..];
            decompressor.decompress(compressed, &mut decompressed)?;
            if decompressed.len() != uncompressed_size {
                return Err(general_err!(
                    "decompressed page size {} does not match the header's {}",
                    decompressed.len(),
                    uncompressed_size
                ));
            }
            ByteBufferPtr::new(decompressed)
        }
        _ => buffer,
    };

    let page = match page_header.type_ {
        ThriftPageType::DictionaryPage => {
            let header = page_header
                .dictionary_page_header
                .ok_or_else(|| general_err!("dictionary page header is missing"))?;
            Page::DictionaryPage {
                buf: buffer,
                num_values: header.num_values as u32,
                encoding: Encoding::from(header.encoding),
                is_sorted: header.is_sorted.unwrap_or(false),
            }
        }
        ThriftPageType::DataPage => {
            let header = page_header
                .data_page_header
                .ok_or_else(|| general_err!("data page header is missing"))?;
            Page::DataPage {
                buf: buffer,
                num_values: header.num_values as u32,
                encoding: Encoding::from(header.encoding),
                def_level_encoding: Encoding::from(header.definition_level_encoding),
                rep_level_encoding: Encoding::from(header.repetition_level_encoding),
                statistics: metadata::from_thrift(physical_type, header.statistics),
            }
        }
        ThriftPageType::DataPageV2 => {
            let header = page_header
                .data_page_header_v2
                .ok_or_else(|| general_err!("data page v2 header is missing"))?;
            Page::DataPageV2 {
                buf: buffer,
                num_values: header.num_values as u32,
                encoding: Encoding::from(header.encoding),
                num_nulls: header.num_nulls as u32,
                num_rows: header.num_rows as u32,
                def_levels_byte_len: header.definition_levels_byte_length as u32,
                rep_levels_byte_len: header.repetition_levels_byte_length as u32,
                is_compressed: header.is_compressed.unwrap_or(true),
                statistics: metadata::from_thrift(physical_type, header.statistics),
            }
        }
        other => return Err(nyi_err!("page type {:?} is not supported", other)),
    };

    Ok(page)
}

/// Walks one column chunk's page stream off a bounded `Read`, framing each
/// page header with the thrift compact protocol and decompressing with the
/// chunk's codec.
pub struct SerializedPageReader<T: Read> {
    buf: T,
    decompressor: Option<Box<dyn Codec>>,
    seen_num_values: i64,
    total_num_values: i64,
    physical_type: Type,
}

impl<T: Read> SerializedPageReader<T> {
    pub fn new(buf: T, total_num_values: i64, compression: Compression, physical_type: Type) -> Result<Self> {
        let decompressor = create_codec(compression)?;
        Ok(Self {
            buf,
            total_num_values,
            seen_num_values: 0,
            decompressor,
            physical_type,
        })
    }
}

impl<T: Read + Send> Iterator for SerializedPageReader<T> {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        self.get_next_page().transpose()
    }
}

impl<T: Read + Send> PageReader for SerializedPageReader<T> {
    fn get_next_page(&mut self) -> Result<Option<Page>> {
        while self.seen_num_values < self.total_num_values {
            let page_header = read_page_header(&mut self.buf)?;
            log::trace!(
                "page header parsed: type={:?} compressed_size={} uncompressed_size={}",
                page_header.type_,
                page_header.compressed_page_size,
                page_header.uncompressed_page_size
            );
            let to_read = page_header.compressed_page_size as usize;
            let mut buffer = Vec::with_capacity(to_read);
            let read = (&mut self.buf).take(to_read as u64).read_to_end(&mut buffer)?;
            if read != to_read {
                return Err(eof_err!("expected {} bytes of page, read {}", to_read, read));
            }

            let buffer = ByteBufferPtr::new(buffer);
            return match page_header.type_ {
                ThriftPageType::DataPage | ThriftPageType::DataPageV2 => {
                    let page = decode_page(page_header, buffer, self.physical_type, self.decompressor.as_mut())?;
                    self.seen_num_values += page.num_values() as i64;
                    Ok(Some(page))
                }
                ThriftPageType::DictionaryPage => Ok(Some(decode_page(
                    page_header,
                    buffer,
                    self.physical_type,
                    self.decompressor.as_mut(),
                )?)),
                _ => continue,
            };
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Repetition, Type as PhysicalType};
    use crate::data_type::Int32Type;
    use crate::record::RowAccessor;
    use crate::schema::types::{SchemaDescriptor, Type as SchemaType};
    use crate::util::test_common::{make_column_chunk_bytes, DataPageBuilder, DataPageBuilderImpl};

    fn single_int32_column_file(values: &[i32]) -> Bytes {
        let field = SchemaType::primitive_type_builder("id", PhysicalType::INT32)
            .with_repetition(Repetition::REQUIRED)
            .build()
            .unwrap();
        let schema = SchemaType::group_type_builder("schema")
            .with_fields(&mut vec![Arc::new(field)])
            .build()
            .unwrap();
        let descr = Arc::new(SchemaDescriptor::new(Arc::new(schema)));
        let col = descr.column(0);

        let mut builder = DataPageBuilderImpl::new(col.clone(), values.len() as u32, true);
        builder.add_values::<Int32Type>(Encoding::PLAIN, values);
        let page = builder.consume();

        Bytes::from(make_column_chunk_bytes(&descr, Compression::UNCOMPRESSED, vec![page]))
    }

    #[test]
    fn test_serialized_file_reader_roundtrip() {
        let bytes = single_int32_column_file(&[4, 5, 6, 7]);
        let reader = SerializedFileReader::new(bytes).unwrap();
        assert_eq!(reader.metadata().num_row_groups(), 1);
        assert_eq!(reader.metadata().file_metadata().num_rows(), 4);

        let row_group = reader.get_row_group(0).unwrap();
        let mut page_reader = row_group.get_column_page_reader(0).unwrap();
        let page = page_reader.get_next_page().unwrap().unwrap();
        assert_eq!(page.num_values(), 4);
    }

    #[test]
    fn test_file_reader_filter_row_groups_with_predicate() {
        let bytes = single_int32_column_file(&[1, 2, 3]);
        let options = ReadOptionsBuilder::new()
            .with_predicate(Box::new(|_, _| false))
            .build();
        let reader = SerializedFileReader::new_with_options(bytes, options).unwrap();
        assert_eq!(reader.metadata().num_row_groups(), 0);
    }

    #[test]
    fn test_row_iter_over_file() {
        let bytes = single_int32_column_file(&[4, 5, 6, 7]);
        let reader = SerializedFileReader::new(bytes).unwrap();
        let rows: Vec<_> = reader.get_row_iter(None).unwrap().collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].get_int(0).unwrap(), 4);
        assert_eq!(rows[3].get_int(0).unwrap(), 7);
    }
}
