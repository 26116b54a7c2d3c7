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

//! Typed column writers, the inverse of `column::reader`.
//! `write_batch` accepts the same
//! `(values, def_levels, rep_levels)` triplet shape `read_batch` produces,
//! buffers an entire column chunk in memory, and `close` decides a
//! dictionary, splits the buffered rows into DataPage (v1) pages, and emits
//! them through a `PageWriter`.

use std::cmp::Ordering;

use crate::basic::{Compression, Encoding, Type as PhysicalType};
use crate::column::page::{CompressedPage, PageWriter};
use crate::compression::create_codec;
use crate::data_type::{
    BoolType, ByteArray, ByteArrayType, DataType, DoubleType, FixedLenByteArrayType, FloatType,
    Int32Type, Int64Type, Int96Type, ParquetValueType,
};
use crate::encodings::decoding::dict_index_bit_width;
use crate::encodings::encoding::{get_encoder, DictEncoder, Encoder};
use crate::encodings::levels::LevelEncoder;
use crate::encodings::rle::RleEncoder;
use crate::errors::Result;
use crate::file::metadata::{ColumnChunkMetaData, Statistics};
use crate::file::properties::WriterPropertiesPtr;
use crate::schema::types::ColumnDescPtr;
use crate::util::memory::ByteBufferPtr;

/// A column writer for one of the eight physical types, as a sum type
/// (mirrors `column::reader::ColumnReader`).
pub enum ColumnWriter {
    BoolColumnWriter(ColumnWriterImpl<BoolType>),
    Int32ColumnWriter(ColumnWriterImpl<Int32Type>),
    Int64ColumnWriter(ColumnWriterImpl<Int64Type>),
    Int96ColumnWriter(ColumnWriterImpl<Int96Type>),
    FloatColumnWriter(ColumnWriterImpl<FloatType>),
    DoubleColumnWriter(ColumnWriterImpl<DoubleType>),
    ByteArrayColumnWriter(ColumnWriterImpl<ByteArrayType>),
    FixedLenByteArrayColumnWriter(ColumnWriterImpl<FixedLenByteArrayType>),
}

/// Builds the typed writer appropriate for the column's physical type.
/// `column_start_offset` is the absolute byte position in the file where
/// this column chunk's first page will land, so the writer can record
/// `dictionary_page_offset`/`data_page_offset` in the metadata it produces
/// at `close`.
pub fn get_column_writer(
    descr: ColumnDescPtr,
    props: WriterPropertiesPtr,
    page_writer: Box<dyn PageWriter>,
    column_start_offset: i64,
) -> ColumnWriter {
    match descr.physical_type() {
        PhysicalType::BOOLEAN => {
            ColumnWriter::BoolColumnWriter(ColumnWriterImpl::new(descr, props, page_writer, column_start_offset))
        }
        PhysicalType::INT32 => {
            ColumnWriter::Int32ColumnWriter(ColumnWriterImpl::new(descr, props, page_writer, column_start_offset))
        }
        PhysicalType::INT64 => {
            ColumnWriter::Int64ColumnWriter(ColumnWriterImpl::new(descr, props, page_writer, column_start_offset))
        }
        PhysicalType::INT96 => {
            ColumnWriter::Int96ColumnWriter(ColumnWriterImpl::new(descr, props, page_writer, column_start_offset))
        }
        PhysicalType::FLOAT => {
            ColumnWriter::FloatColumnWriter(ColumnWriterImpl::new(descr, props, page_writer, column_start_offset))
        }
        PhysicalType::DOUBLE => {
            ColumnWriter::DoubleColumnWriter(ColumnWriterImpl::new(descr, props, page_writer, column_start_offset))
        }
        PhysicalType::BYTE_ARRAY => ColumnWriter::ByteArrayColumnWriter(ColumnWriterImpl::new(
            descr,
            props,
            page_writer,
            column_start_offset,
        )),
        PhysicalType::FIXED_LEN_BYTE_ARRAY => ColumnWriter::FixedLenByteArrayColumnWriter(ColumnWriterImpl::new(
            descr,
            props,
            page_writer,
            column_start_offset,
        )),
    }
}

/// Unwraps a `ColumnWriter` into its typed form, failing if `T` does not
/// match the physical type the writer was built for.
pub fn get_typed_column_writer<T: DataType>(column_writer: ColumnWriter) -> ColumnWriterImpl<T> {
    T::get_column_writer(column_writer).unwrap_or_else(|| panic!("column writer physical type mismatch"))
}

/// Finalizes whichever typed writer a `ColumnWriter` holds, the untyped
/// counterpart of `get_typed_column_writer` that `SerializedRowGroupWriter`
/// uses so it never has to know a column's physical type.
pub fn close_column_writer(column_writer: ColumnWriter) -> Result<ColumnChunkMetaData> {
    match column_writer {
        ColumnWriter::BoolColumnWriter(w) => w.close(),
        ColumnWriter::Int32ColumnWriter(w) => w.close(),
        ColumnWriter::Int64ColumnWriter(w) => w.close(),
        ColumnWriter::Int96ColumnWriter(w) => w.close(),
        ColumnWriter::FloatColumnWriter(w) => w.close(),
        ColumnWriter::DoubleColumnWriter(w) => w.close(),
        ColumnWriter::ByteArrayColumnWriter(w) => w.close(),
        ColumnWriter::FixedLenByteArrayColumnWriter(w) => w.close(),
    }
}

impl ColumnWriter {
    /// The number of top-level rows buffered in whichever typed writer this
    /// holds (see `ColumnWriterImpl::num_buffered_rows`).
    pub fn num_buffered_rows(&self) -> i64 {
        match self {
            ColumnWriter::BoolColumnWriter(w) => w.num_buffered_rows(),
            ColumnWriter::Int32ColumnWriter(w) => w.num_buffered_rows(),
            ColumnWriter::Int64ColumnWriter(w) => w.num_buffered_rows(),
            ColumnWriter::Int96ColumnWriter(w) => w.num_buffered_rows(),
            ColumnWriter::FloatColumnWriter(w) => w.num_buffered_rows(),
            ColumnWriter::DoubleColumnWriter(w) => w.num_buffered_rows(),
            ColumnWriter::ByteArrayColumnWriter(w) => w.num_buffered_rows(),
            ColumnWriter::FixedLenByteArrayColumnWriter(w) => w.num_buffered_rows(),
        }
    }
}

/// Buffers one column chunk's values and repetition/definition levels,
/// deferring all encoding decisions to `close`.
pub struct ColumnWriterImpl<T: DataType>
where
    T::T: ParquetValueType,
{
    descr: ColumnDescPtr,
    props: WriterPropertiesPtr,
    page_writer: Box<dyn PageWriter>,

    rep_levels: Vec<i16>,
    def_levels: Vec<i16>,
    values: Vec<T::T>,

    null_count: i64,
    num_buffered_rows: i64,
    min: Option<T::T>,
    max: Option<T::T>,

    cur_offset: i64,
    dictionary_page_offset: Option<i64>,
    data_page_offset: Option<i64>,
    total_compressed_size: i64,
    total_uncompressed_size: i64,
}

impl<T: DataType> ColumnWriterImpl<T>
where
    T::T: ParquetValueType + PartialOrd,
{
    pub fn new(
        descr: ColumnDescPtr,
        props: WriterPropertiesPtr,
        page_writer: Box<dyn PageWriter>,
        column_start_offset: i64,
    ) -> Self {
        Self {
            descr,
            props,
            page_writer,
            rep_levels: Vec::new(),
            def_levels: Vec::new(),
            values: Vec::new(),
            null_count: 0,
            num_buffered_rows: 0,
            min: None,
            max: None,
            cur_offset: column_start_offset,
            dictionary_page_offset: None,
            data_page_offset: None,
            total_compressed_size: 0,
            total_uncompressed_size: 0,
        }
    }

    pub fn column_descr(&self) -> &ColumnDescPtr {
        &self.descr
    }

    /// The number of top-level rows buffered so far (positions where
    /// `rep_level == 0`, or every position for a column with no repeated
    /// ancestor). Used by `SerializedRowGroupWriter` to derive the row
    /// group's `num_rows` without requiring the caller to track it
    /// separately.
    pub fn num_buffered_rows(&self) -> i64 {
        self.num_buffered_rows
    }

    /// Appends one batch of already-computed values and levels, the
    /// write-side mirror of `ColumnReaderImpl::read_batch`'s sparse-sequence
    /// contract: a position with `def_level < max_def_level` is null and
    /// consumes no slot in `values`. `def_levels`/`rep_levels` of `None`
    /// mean "every position is present at the max level" (a REQUIRED,
    /// non-repeated column). Returns the number of values consumed from
    /// `values`.
    pub fn write_batch(
        &mut self,
        values: &[T::T],
        def_levels: Option<&[i16]>,
        rep_levels: Option<&[i16]>,
    ) -> Result<usize> {
        let max_def_level = self.descr.max_def_level();
        let max_rep_level = self.descr.max_rep_level();
        let num_levels = match (def_levels, rep_levels) {
            (Some(d), _) => d.len(),
            (None, Some(r)) => r.len(),
            (None, None) => values.len(),
        };

        let mut value_idx = 0;
        for i in 0..num_levels {
            let def = def_levels.map(|d| d[i]).unwrap_or(max_def_level);
            let rep = rep_levels.map(|r| r[i]).unwrap_or(0);
            self.def_levels.push(def);
            self.rep_levels.push(rep);

            if rep == 0 {
                self.num_buffered_rows += 1;
            }
            if def == max_def_level {
                let v = values[value_idx].clone();
                self.update_statistics(&v);
                self.values.push(v);
                value_idx += 1;
            } else {
                self.null_count += 1;
            }
        }
        let _ = max_rep_level;
        Ok(value_idx)
    }

    fn update_statistics(&mut self, v: &T::T) {
        let is_new_min = match &self.min {
            None => true,
            Some(cur) => matches!(v.partial_cmp(cur), Some(Ordering::Less)),
        };
        if is_new_min {
            self.min = Some(v.clone());
        }
        let is_new_max = match &self.max {
            None => true,
            Some(cur) => matches!(v.partial_cmp(cur), Some(Ordering::Greater)),
        };
        if is_new_max {
            self.max = Some(v.clone());
        }
    }

    /// Finalizes the column chunk: decides a dictionary, splits the
    /// buffered rows into `write_batch_size`-sized data pages, and returns
    /// the accumulated `ColumnChunkMetaData`.
    pub fn close(mut self) -> Result<ColumnChunkMetaData> {
        let path = self.descr.path().clone();
        let use_dictionary = self.props.dictionary_enabled(&path);
        let codec = self.props.compression(&path);
        let write_batch_size = self.props.write_batch_size().max(1);
        let max_rep = self.descr.max_rep_level();
        let max_def = self.descr.max_def_level();
        let num_levels = self.rep_levels.len();

        let mut encodings_used: Vec<Encoding> = Vec::new();
        if max_rep > 0 || max_def > 0 {
            encodings_used.push(Encoding::RLE);
        }

        let dict_encoder: Option<DictEncoder<T>> = if use_dictionary {
            let mut enc: DictEncoder<T> = DictEncoder::new();
            enc.put(&self.values);
            Some(enc)
        } else {
            None
        };

        let value_encoding = if let Some(dict_encoder) = &dict_encoder {
            push_unique(&mut encodings_used, Encoding::PLAIN);
            push_unique(&mut encodings_used, Encoding::RLE_DICTIONARY);
            let mut dict_bytes = Vec::with_capacity(dict_encoder.num_entries() * 8);
            for v in dict_encoder.dictionary() {
                Self::write_plain_for_stats(v, &mut dict_bytes);
            }
            self.write_dictionary_page(dict_bytes, dict_encoder.num_entries() as u32, codec)?;
            Encoding::RLE_DICTIONARY
        } else {
            let encoding = self.props.encoding(&path).unwrap_or(Encoding::PLAIN);
            push_unique(&mut encodings_used, encoding);
            encoding
        };

        let mut value_encoder: Option<Box<dyn Encoder<T>>> = if dict_encoder.is_none() {
            Some(get_encoder::<T>(value_encoding)?)
        } else {
            None
        };

        if num_levels == 0 {
            self.write_data_page(Vec::new(), 0, value_encoding, codec)?;
        } else {
            let mut level_pos = 0usize;
            let mut value_pos = 0usize;
            while level_pos < num_levels {
                let chunk_len = write_batch_size.min(num_levels - level_pos);
                let rep_slice = &self.rep_levels[level_pos..level_pos + chunk_len];
                let def_slice = &self.def_levels[level_pos..level_pos + chunk_len];
                let non_null = if max_def > 0 {
                    def_slice.iter().filter(|&&d| d == max_def).count()
                } else {
                    chunk_len
                };

                let mut buf = Vec::new();
                if max_rep > 0 {
                    let mut enc = LevelEncoder::new(max_rep);
                    enc.put(rep_slice);
                    buf.extend_from_slice(&enc.consume_v1());
                }
                if max_def > 0 {
                    let mut enc = LevelEncoder::new(max_def);
                    enc.put(def_slice);
                    buf.extend_from_slice(&enc.consume_v1());
                }

                if let Some(dict_encoder) = &dict_encoder {
                    let indices = &dict_encoder.indices()[value_pos..value_pos + non_null];
                    let bit_width = dict_index_bit_width(dict_encoder.num_entries());
                    let mut rle = RleEncoder::new(bit_width, indices.len() * 4 + 16);
                    for &idx in indices {
                        rle.put(idx as u64);
                    }
                    buf.push(bit_width);
                    buf.extend_from_slice(&rle.consume());
                } else {
                    let encoder = value_encoder.as_mut().expect("value encoder set when not using a dictionary");
                    encoder.put(&self.values[value_pos..value_pos + non_null])?;
                    let encoded = encoder.flush_buffer()?;
                    buf.extend_from_slice(encoded.data());
                }

                self.write_data_page(buf, chunk_len as u32, value_encoding, codec)?;
                level_pos += chunk_len;
                value_pos += non_null;
            }
        }

        self.page_writer.close()?;

        let statistics = if self.min.is_some() || self.max.is_some() || self.null_count > 0 {
            Some(Statistics {
                min: self.min.as_ref().map(Self::encode_stat_bytes),
                max: self.max.as_ref().map(Self::encode_stat_bytes),
                null_count: Some(self.null_count),
                distinct_count: None,
                is_min_value_exact: true,
                is_max_value_exact: true,
            })
        } else {
            None
        };

        let data_page_offset = self.data_page_offset.unwrap_or(self.cur_offset);
        let file_offset = self.dictionary_page_offset.unwrap_or(data_page_offset);

        Ok(ColumnChunkMetaData::new(
            self.descr.clone(),
            encodings_used,
            path,
            codec,
            num_levels as i64,
            self.total_compressed_size,
            self.total_uncompressed_size,
            data_page_offset,
            self.dictionary_page_offset,
            statistics,
            file_offset,
        ))
    }

    fn write_plain_for_stats(v: &T::T, out: &mut Vec<u8>) {
        match T::get_physical_type() {
            PhysicalType::FIXED_LEN_BYTE_ARRAY => {
                // SAFETY: the physical-type check guarantees T::T is
                // ByteArray, the value type both BYTE_ARRAY and
                // FIXED_LEN_BYTE_ARRAY share (see encodings::encoding::PlainEncoder::put).
                let v: &ByteArray = unsafe { &*(v as *const T::T as *const ByteArray) };
                out.extend_from_slice(v.data());
            }
            _ => v.write_plain(out),
        }
    }

    /// Statistics min/max bytes follow the same per-physical-type framing as
    /// a PLAIN-encoded value, except BOOLEAN: `ParquetValueType::write_plain`
    /// for `bool` writes nothing (PLAIN-encoded booleans are bit-packed
    /// across the page, not one byte per value), but stats still need a
    /// single-byte representation.
    fn encode_stat_bytes(v: &T::T) -> Vec<u8> {
        let mut buf = Vec::new();
        match T::get_physical_type() {
            PhysicalType::BOOLEAN => buf.push(v.as_plain_bool() as u8),
            _ => Self::write_plain_for_stats(v, &mut buf),
        }
        buf
    }

    fn compress(codec: Compression, raw: &[u8]) -> Result<Vec<u8>> {
        match create_codec(codec)? {
            None => Ok(raw.to_vec()),
            Some(mut c) => {
                let mut out = Vec::new();
                c.compress(raw, &mut out)?;
                Ok(out)
            }
        }
    }

    fn write_dictionary_page(&mut self, raw: Vec<u8>, num_values: u32, codec: Compression) -> Result<()> {
        let uncompressed_size = raw.len();
        let compressed = Self::compress(codec, &raw)?;
        let compressed_size = compressed.len();
        let page = CompressedPage::DictionaryPage {
            buf: ByteBufferPtr::new(compressed),
            num_values,
            encoding: Encoding::PLAIN,
            is_sorted: false,
            uncompressed_size,
        };
        if self.dictionary_page_offset.is_none() {
            self.dictionary_page_offset = Some(self.cur_offset);
        }
        let spec = self.page_writer.write_page(page)?;
        self.cur_offset += spec.bytes_written as i64;
        self.total_compressed_size += compressed_size as i64;
        self.total_uncompressed_size += uncompressed_size as i64;
        Ok(())
    }

    fn write_data_page(&mut self, raw: Vec<u8>, num_values: u32, encoding: Encoding, codec: Compression) -> Result<()> {
        let uncompressed_size = raw.len();
        let compressed = Self::compress(codec, &raw)?;
        let compressed_size = compressed.len();
        let page = CompressedPage::DataPage {
            buf: ByteBufferPtr::new(compressed),
            num_values,
            encoding,
            def_level_encoding: Encoding::RLE,
            rep_level_encoding: Encoding::RLE,
            statistics: None,
            uncompressed_size,
        };
        if self.data_page_offset.is_none() {
            self.data_page_offset = Some(self.cur_offset);
        }
        let spec = self.page_writer.write_page(page)?;
        self.cur_offset += spec.bytes_written as i64;
        self.total_compressed_size += compressed_size as i64;
        self.total_uncompressed_size += uncompressed_size as i64;
        Ok(())
    }
}

fn push_unique(encodings: &mut Vec<Encoding>, encoding: Encoding) {
    if !encodings.contains(&encoding) {
        encodings.push(encoding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::Int32Type;
    use crate::file::properties::WriterProperties;
    use crate::schema::types::{ColumnDescriptor, Type as SchemaType};
    use std::sync::Arc;

    struct VecPageWriter {
        pages: Vec<CompressedPage>,
    }

    impl PageWriter for VecPageWriter {
        fn write_page(&mut self, page: CompressedPage) -> Result<crate::column::page::PageWriteSpec> {
            let spec = crate::column::page::PageWriteSpec {
                bytes_written: (page.compressed_size() + 16) as u64,
                num_values: page.num_values(),
                uncompressed_size: page.uncompressed_size(),
                compressed_size: page.compressed_size(),
            };
            self.pages.push(page);
            Ok(spec)
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn int32_descr(max_def: i16, max_rep: i16) -> ColumnDescPtr {
        Arc::new(ColumnDescriptor::new(
            Arc::new(
                SchemaType::primitive_type_builder("a", crate::basic::Type::INT32)
                    .build()
                    .unwrap(),
            ),
            max_def,
            max_rep,
            crate::schema::types::ColumnPath::new(vec!["a".to_owned()]),
        ))
    }

    #[test]
    fn test_write_batch_required_column_no_dictionary() {
        let descr = int32_descr(0, 0);
        let props = Arc::new(
            WriterProperties::builder()
                .set_dictionary_enabled(false)
                .build(),
        );
        let writer = VecPageWriter { pages: Vec::new() };
        let mut col: ColumnWriterImpl<Int32Type> = ColumnWriterImpl::new(descr, props, Box::new(writer), 0);
        let written = col.write_batch(&[1, 2, 3, 4], None, None).unwrap();
        assert_eq!(written, 4);
        let meta = col.close().unwrap();
        assert_eq!(meta.num_values(), 4);
        assert!(meta.dictionary_page_offset().is_none());
        assert_eq!(meta.encodings(), &[Encoding::PLAIN]);
        let stats = meta.statistics().unwrap();
        assert_eq!(stats.min, Some(1i32.to_le_bytes().to_vec()));
        assert_eq!(stats.max, Some(4i32.to_le_bytes().to_vec()));
    }

    #[test]
    fn test_write_batch_optional_column_tracks_nulls() {
        let descr = int32_descr(1, 0);
        let props = Arc::new(WriterProperties::builder().build());
        let writer = VecPageWriter { pages: Vec::new() };
        let mut col: ColumnWriterImpl<Int32Type> = ColumnWriterImpl::new(descr, props, Box::new(writer), 0);
        let def_levels = [1i16, 0, 1, 1];
        let written = col.write_batch(&[10, 20, 30], Some(&def_levels), None).unwrap();
        assert_eq!(written, 3);
        assert_eq!(col.num_buffered_rows(), 4);
        let meta = col.close().unwrap();
        assert_eq!(meta.num_values(), 4);
        assert_eq!(meta.statistics().unwrap().null_count, Some(1));
    }

    #[test]
    fn test_dictionary_encoding_used_by_default() {
        let descr = int32_descr(0, 0);
        let props = Arc::new(WriterProperties::builder().build());
        let writer = VecPageWriter { pages: Vec::new() };
        let mut col: ColumnWriterImpl<Int32Type> = ColumnWriterImpl::new(descr, props, Box::new(writer), 0);
        col.write_batch(&[7, 7, 7, 9], None, None).unwrap();
        let meta = col.close().unwrap();
        assert!(meta.dictionary_page_offset().is_some());
        assert!(meta.encodings().contains(&Encoding::RLE_DICTIONARY));
    }
}
