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

//! Implementations of `PageWriter`/`FileWriter` over a concrete byte sink,
//! the write-side mirror of `file::serialized_reader`.
//! `SerializedFileWriter` owns the sink, `SerializedRowGroupWriter` hands
//! out one `ColumnWriter` per column in schema order, and `close` on each
//! level rolls the child's metadata up into the parent's.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;

use parquet_format::{
    DataPageHeader, DataPageHeaderV2, DictionaryPageHeader, PageHeader, PageType as ThriftPageType,
};
use thrift::protocol::{TCompactOutputProtocol, TSerializable};

use crate::column::page::{CompressedPage, PageWriteSpec, PageWriter};
use crate::column::writer::{close_column_writer, get_column_writer, ColumnWriter};
use crate::errors::{ParquetError, Result};
use crate::file::footer;
use crate::file::metadata::{self, ColumnChunkMetaData, FileMetaData, ParquetMetaData, RowGroupMetaData};
use crate::file::properties::WriterPropertiesPtr;
use crate::schema::types::{SchemaDescriptor, Type as SchemaType};

const PARQUET_WRITER_VERSION: i32 = 1;

/// A `Write` sink that counts the bytes passed through it, so page and
/// column writers can record the absolute offsets `ColumnChunkMetaData`
/// needs without the file writer tracking a parallel cursor.
struct TrackedWrite<W: Write> {
    inner: W,
    bytes_written: u64,
}

impl<W: Write> TrackedWrite<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes_written: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl<W: Write> Write for TrackedWrite<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Builds the thrift `PageHeader` that precedes a page's (already
/// compressed) bytes, the write-side mirror of `serialized_reader::decode_page`.
fn build_page_header(page: &CompressedPage) -> PageHeader {
    let uncompressed_page_size = page.uncompressed_size() as i32;
    let compressed_page_size = page.compressed_size() as i32;

    let (type_, data_page_header, data_page_header_v2, dictionary_page_header) = match page {
        CompressedPage::DictionaryPage {
            num_values,
            encoding,
            is_sorted,
            ..
        } => (
            ThriftPageType::DictionaryPage,
            None,
            None,
            Some(DictionaryPageHeader {
                num_values: *num_values as i32,
                encoding: (*encoding).into(),
                is_sorted: Some(*is_sorted),
            }),
        ),
        CompressedPage::DataPage {
            num_values,
            encoding,
            def_level_encoding,
            rep_level_encoding,
            statistics,
            ..
        } => (
            ThriftPageType::DataPage,
            Some(DataPageHeader {
                num_values: *num_values as i32,
                encoding: (*encoding).into(),
                definition_level_encoding: (*def_level_encoding).into(),
                repetition_level_encoding: (*rep_level_encoding).into(),
                statistics: statistics.as_ref().map(metadata::to_thrift),
            }),
            None,
            None,
        ),
        CompressedPage::DataPageV2 {
            num_values,
            encoding,
            num_nulls,
            num_rows,
            def_levels_byte_len,
            rep_levels_byte_len,
            is_compressed,
            statistics,
            ..
        } => (
            ThriftPageType::DataPageV2,
            None,
            Some(DataPageHeaderV2 {
                num_values: *num_values as i32,
                num_nulls: *num_nulls as i32,
                num_rows: *num_rows as i32,
                encoding: (*encoding).into(),
                definition_levels_byte_length: *def_levels_byte_len as i32,
                repetition_levels_byte_length: *rep_levels_byte_len as i32,
                is_compressed: Some(*is_compressed),
                statistics: statistics.as_ref().map(metadata::to_thrift),
            }),
            None,
        ),
    };

    PageHeader {
        type_,
        uncompressed_page_size,
        compressed_page_size,
        crc: None,
        data_page_header,
        index_page_header: None,
        dictionary_page_header,
        data_page_header_v2,
    }
}

/// A `PageWriter` that frames each page with a thrift-encoded `PageHeader`
/// and appends its (already compressed) bytes to the shared file sink.
/// Several instances share the same sink via `Rc<RefCell<_>>` since only
/// one column chunk is written at a time within a row group.
pub struct SerializedPageWriter<W: Write> {
    sink: Rc<RefCell<TrackedWrite<W>>>,
}

impl<W: Write> SerializedPageWriter<W> {
    fn new(sink: Rc<RefCell<TrackedWrite<W>>>) -> Self {
        Self { sink }
    }
}

impl<W: 'static + Write> PageWriter for SerializedPageWriter<W> {
    fn write_page(&mut self, page: CompressedPage) -> Result<PageWriteSpec> {
        let num_values = page.num_values();
        let uncompressed_size = page.uncompressed_size();
        let compressed_size = page.compressed_size();
        let header = build_page_header(&page);

        let mut sink = self.sink.borrow_mut();
        let start = sink.bytes_written();
        {
            let mut protocol = TCompactOutputProtocol::new(&mut *sink);
            header
                .write_to_out_protocol(&mut protocol)
                .map_err(|e| ParquetError::General(format!("underlying Thrift error: {}", e)))?;
        }
        sink.write_all(page.buf().as_ref())?;

        Ok(PageWriteSpec {
            bytes_written: sink.bytes_written() - start,
            num_values,
            uncompressed_size,
            compressed_size,
        })
    }

    fn close(&mut self) -> Result<()> {
        self.sink.borrow_mut().flush()?;
        Ok(())
    }
}

/// Hands out one `ColumnWriter` per leaf column of the schema, in order,
/// and accumulates the `ColumnChunkMetaData` each produces at `close` into
/// a `RowGroupMetaData`.
pub struct SerializedRowGroupWriter<W: Write> {
    schema_descr: Arc<SchemaDescriptor>,
    props: WriterPropertiesPtr,
    sink: Rc<RefCell<TrackedWrite<W>>>,
    column_chunks: Vec<ColumnChunkMetaData>,
    column_index: usize,
    num_rows: i64,
}

impl<W: 'static + Write> SerializedRowGroupWriter<W> {
    fn new(schema_descr: Arc<SchemaDescriptor>, props: WriterPropertiesPtr, sink: Rc<RefCell<TrackedWrite<W>>>) -> Self {
        Self {
            schema_descr,
            props,
            sink,
            column_chunks: Vec::new(),
            column_index: 0,
            num_rows: 0,
        }
    }

    /// Opens the next column in schema order, or `None` once every column
    /// has been written. Columns must be written and closed (via
    /// `close_column`) one at a time, in schema order.
    pub fn next_column(&mut self) -> Result<Option<ColumnWriter>> {
        if self.column_index >= self.schema_descr.num_columns() {
            return Ok(None);
        }
        let descr = self.schema_descr.column(self.column_index);
        let start_offset = self.sink.borrow().bytes_written() as i64;
        let page_writer = Box::new(SerializedPageWriter::new(self.sink.clone()));
        let column_writer = get_column_writer(descr, self.props.clone(), page_writer, start_offset);
        self.column_index += 1;
        Ok(Some(column_writer))
    }

    /// Finalizes a column chunk opened by `next_column`, folding its
    /// metadata into this row group.
    pub fn close_column(&mut self, column_writer: ColumnWriter) -> Result<()> {
        if self.num_rows == 0 {
            self.num_rows = column_writer.num_buffered_rows();
        }
        let chunk_meta = close_column_writer(column_writer)?;
        self.column_chunks.push(chunk_meta);
        Ok(())
    }

    /// Finalizes the row group. Every column the schema names must have
    /// been written and closed first.
    pub fn close(self) -> Result<RowGroupMetaData> {
        if self.column_chunks.len() != self.schema_descr.num_columns() {
            return Err(general_err!(
                "row group expected {} columns, only {} were written",
                self.schema_descr.num_columns(),
                self.column_chunks.len()
            ));
        }
        let total_byte_size = self.column_chunks.iter().map(|c| c.uncompressed_size()).sum();
        Ok(RowGroupMetaData::new(
            self.column_chunks,
            self.num_rows,
            total_byte_size,
            self.schema_descr,
        ))
    }
}

/// A Parquet file opened for writing over any `Write` sink: writes the
/// leading magic immediately, then one row group at a time, and assembles
/// the footer (thrift-encoded `FileMetaData`, its length, trailing magic)
/// on `close`.
pub struct SerializedFileWriter<W: Write> {
    sink: Rc<RefCell<TrackedWrite<W>>>,
    schema_descr: Arc<SchemaDescriptor>,
    props: WriterPropertiesPtr,
    row_groups: Vec<RowGroupMetaData>,
}

impl<W: 'static + Write> SerializedFileWriter<W> {
    pub fn new(mut buf: W, schema: Arc<SchemaType>, properties: WriterPropertiesPtr) -> Result<Self> {
        buf.write_all(footer::PARQUET_MAGIC)?;
        Ok(Self {
            sink: Rc::new(RefCell::new(TrackedWrite::new(buf))),
            schema_descr: Arc::new(SchemaDescriptor::new(schema)),
            props: properties,
            row_groups: Vec::new(),
        })
    }

    /// Opens a new row group writer. The previous one, if any, must already
    /// have been closed with `close_row_group`.
    pub fn next_row_group(&mut self) -> Result<SerializedRowGroupWriter<W>> {
        Ok(SerializedRowGroupWriter::new(
            self.schema_descr.clone(),
            self.props.clone(),
            self.sink.clone(),
        ))
    }

    pub fn close_row_group(&mut self, row_group_writer: SerializedRowGroupWriter<W>) -> Result<()> {
        let row_group_metadata = row_group_writer.close()?;
        self.row_groups.push(row_group_metadata);
        Ok(())
    }

    /// Writes the footer and returns the metadata describing the completed
    /// file: magic, thrift-encoded `FileMetaData`, its 4-byte little-endian
    /// length, trailing magic.
    pub fn close(self) -> Result<ParquetMetaData> {
        let num_rows = self.row_groups.iter().map(|rg| rg.num_rows()).sum();
        let file_metadata = FileMetaData::new(
            PARQUET_WRITER_VERSION,
            num_rows,
            Some(self.props.created_by().to_owned()),
            None,
            self.schema_descr.clone(),
            None,
        );
        let thrift_row_groups: Vec<parquet_format::RowGroup> =
            self.row_groups.iter().map(footer::row_group_to_thrift).collect();
        let metadata_bytes = footer::write_metadata(&file_metadata, &thrift_row_groups)?;

        let mut sink = self.sink.borrow_mut();
        sink.write_all(&metadata_bytes)?;
        sink.write_all(&(metadata_bytes.len() as u32).to_le_bytes())?;
        sink.write_all(footer::PARQUET_MAGIC)?;
        sink.flush()?;
        drop(sink);

        Ok(ParquetMetaData::new(file_metadata, self.row_groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Repetition, Type as PhysicalType};
    use crate::column::writer::get_typed_column_writer;
    use crate::data_type::Int32Type;
    use crate::file::properties::WriterProperties;
    use crate::file::reader::FileReader;
    use crate::file::serialized_reader::SerializedFileReader;
    use crate::record::RowAccessor;

    /// A `Write` sink over a reference-counted buffer, so a test can keep
    /// its own handle on the bytes after the sink is moved into a
    /// `SerializedFileWriter`.
    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn int32_schema() -> Arc<SchemaType> {
        let field = SchemaType::primitive_type_builder("id", PhysicalType::INT32)
            .with_repetition(Repetition::REQUIRED)
            .build()
            .unwrap();
        Arc::new(
            SchemaType::group_type_builder("schema")
                .with_fields(&mut vec![Arc::new(field)])
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_written_file_reads_back_correctly() {
        let schema = int32_schema();
        let props = Arc::new(WriterProperties::builder().set_dictionary_enabled(false).build());
        let sink = SharedBuffer::default();

        let mut writer = SerializedFileWriter::new(sink.clone(), schema, props).unwrap();
        let mut row_group_writer = writer.next_row_group().unwrap();
        let column_writer = row_group_writer.next_column().unwrap().unwrap();
        let mut typed = get_typed_column_writer::<Int32Type>(column_writer);
        typed.write_batch(&[10, 20, 30], None, None).unwrap();
        row_group_writer
            .close_column(ColumnWriter::Int32ColumnWriter(typed))
            .unwrap();
        writer.close_row_group(row_group_writer).unwrap();
        let written_metadata = writer.close().unwrap();
        assert_eq!(written_metadata.file_metadata().num_rows(), 3);

        let bytes = sink.0.borrow().clone();
        let reader = SerializedFileReader::new(bytes::Bytes::from(bytes)).unwrap();
        assert_eq!(reader.metadata().num_row_groups(), 1);
        assert_eq!(reader.metadata().file_metadata().num_rows(), 3);

        let rows: Vec<_> = reader.get_row_iter(None).unwrap().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get_int(0).unwrap(), 10);
        assert_eq!(rows[2].get_int(0).unwrap(), 30);
    }

    #[test]
    fn test_row_group_close_rejects_missing_columns() {
        let schema = int32_schema();
        let props = Arc::new(WriterProperties::builder().build());
        let sink = SharedBuffer::default();
        let mut writer = SerializedFileWriter::new(sink, schema, props).unwrap();
        let row_group_writer = writer.next_row_group().unwrap();
        assert!(row_group_writer.close().is_err());
    }
}
