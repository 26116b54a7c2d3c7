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

//! Typed column readers: walks a column
//! chunk's page stream, caches the dictionary if one is present, and
//! decodes repetition/definition levels plus values batch by batch. One
//! `ColumnReaderImpl<T>` instance owns exactly one column chunk's page
//! reader for its lifetime.

use crate::basic::{Encoding, Type as PhysicalType};
use crate::column::page::{Page, PageReader};
use crate::data_type::{
    BoolType, ByteArrayType, DataType, DoubleType, FixedLenByteArrayType, FloatType, Int32Type,
    Int64Type, Int96Type, ParquetValueType,
};
use crate::encodings::decoding::{get_decoder, Decoder, DictIndexDecoder};
use crate::encodings::levels::LevelDecoder;
use crate::errors::{ParquetError, Result};
use crate::schema::types::ColumnDescPtr;

/// A column reader for one of the eight physical types, as a sum type.
pub enum ColumnReader {
    BoolColumnReader(ColumnReaderImpl<BoolType>),
    Int32ColumnReader(ColumnReaderImpl<Int32Type>),
    Int64ColumnReader(ColumnReaderImpl<Int64Type>),
    Int96ColumnReader(ColumnReaderImpl<Int96Type>),
    FloatColumnReader(ColumnReaderImpl<FloatType>),
    DoubleColumnReader(ColumnReaderImpl<DoubleType>),
    ByteArrayColumnReader(ColumnReaderImpl<ByteArrayType>),
    FixedLenByteArrayColumnReader(ColumnReaderImpl<FixedLenByteArrayType>),
}

/// Builds the typed reader appropriate for the column's physical type.
pub fn get_column_reader(descr: ColumnDescPtr, page_reader: Box<dyn PageReader>) -> ColumnReader {
    match descr.physical_type() {
        PhysicalType::BOOLEAN => ColumnReader::BoolColumnReader(ColumnReaderImpl::new(descr, page_reader)),
        PhysicalType::INT32 => ColumnReader::Int32ColumnReader(ColumnReaderImpl::new(descr, page_reader)),
        PhysicalType::INT64 => ColumnReader::Int64ColumnReader(ColumnReaderImpl::new(descr, page_reader)),
        PhysicalType::INT96 => ColumnReader::Int96ColumnReader(ColumnReaderImpl::new(descr, page_reader)),
        PhysicalType::FLOAT => ColumnReader::FloatColumnReader(ColumnReaderImpl::new(descr, page_reader)),
        PhysicalType::DOUBLE => ColumnReader::DoubleColumnReader(ColumnReaderImpl::new(descr, page_reader)),
        PhysicalType::BYTE_ARRAY => {
            ColumnReader::ByteArrayColumnReader(ColumnReaderImpl::new(descr, page_reader))
        }
        PhysicalType::FIXED_LEN_BYTE_ARRAY => {
            ColumnReader::FixedLenByteArrayColumnReader(ColumnReaderImpl::new(descr, page_reader))
        }
    }
}

/// Unwraps a `ColumnReader` into its typed form, failing if `T` does not
/// match the physical type the reader was built for.
pub fn get_typed_column_reader<T: DataType>(column_reader: ColumnReader) -> ColumnReaderImpl<T> {
    T::get_column_reader(column_reader)
        .unwrap_or_else(|| panic!("column reader physical type mismatch"))
}

enum ValueSource<T: DataType> {
    Plain(Box<dyn Decoder<T>>),
    Dictionary(DictIndexDecoder),
}

/// Reads one column chunk's values, plus its repetition/definition levels,
/// batch by batch.
pub struct ColumnReaderImpl<T: DataType>
where
    T::T: ParquetValueType,
{
    descr: ColumnDescPtr,
    page_reader: Box<dyn PageReader>,
    def_level_decoder: Option<LevelDecoder>,
    rep_level_decoder: Option<LevelDecoder>,
    value_source: Option<ValueSource<T>>,
    dictionary: Option<Vec<T::T>>,
    // Levels already decoded from the current page but not yet consumed.
    num_buffered_values: usize,
    num_decoded_values: usize,
}

impl<T: DataType> ColumnReaderImpl<T>
where
    T::T: ParquetValueType,
{
    pub fn new(descr: ColumnDescPtr, page_reader: Box<dyn PageReader>) -> Self {
        Self {
            descr,
            page_reader,
            def_level_decoder: None,
            rep_level_decoder: None,
            value_source: None,
            dictionary: None,
            num_buffered_values: 0,
            num_decoded_values: 0,
        }
    }

    pub fn column_descr(&self) -> &ColumnDescPtr {
        &self.descr
    }

    /// Reads up to `batch_size` levels, placing the non-null values
    /// produced along the way into `values`. Returns `(values_read,
    /// levels_read)`: `values_read` is how many slots of `values` were
    /// filled, `levels_read` is the total number of rows/elements advanced
    /// (including nulls). Positions with `def_level < max_def_level` are
    /// null and consume no
    /// slot in `values`.
    pub fn read_batch(
        &mut self,
        batch_size: usize,
        mut def_levels: Option<&mut [i16]>,
        mut rep_levels: Option<&mut [i16]>,
        values: &mut [T::T],
    ) -> Result<(usize, usize)> {
        let mut levels_read = 0;
        let mut values_read = 0;
        let max_def_level = self.descr.max_def_level();
        let max_rep_level = self.descr.max_rep_level();

        while levels_read < batch_size {
            if self.num_decoded_values >= self.num_buffered_values && !self.read_new_page()? {
                break;
            }
            let remaining_in_page = self.num_buffered_values - self.num_decoded_values;
            let want = (batch_size - levels_read).min(remaining_in_page);
            if want == 0 {
                break;
            }

            let num_non_null = if max_def_level > 0 {
                let def_decoder = self
                    .def_level_decoder
                    .as_mut()
                    .ok_or_else(|| ParquetError::General("missing definition level decoder".to_owned()))?;
                let mut tmp = vec![0i16; want];
                let got = def_decoder.get_batch(&mut tmp)?;
                if got != want {
                    return Err(ParquetError::BadLevelCount(format!(
                        "expected {} definition levels, decoded {}",
                        want, got
                    )));
                }
                if let Some(out) = def_levels.as_deref_mut() {
                    out[levels_read..levels_read + want].copy_from_slice(&tmp);
                }
                let non_null = tmp.iter().filter(|&&d| d == max_def_level).count();
                if max_rep_level > 0 {
                    let rep_decoder = self.rep_level_decoder.as_mut().ok_or_else(|| {
                        ParquetError::General("missing repetition level decoder".to_owned())
                    })?;
                    let mut rtmp = vec![0i16; want];
                    let rgot = rep_decoder.get_batch(&mut rtmp)?;
                    if rgot != want {
                        return Err(ParquetError::BadLevelCount(format!(
                            "expected {} repetition levels, decoded {}",
                            want, rgot
                        )));
                    }
                    if let Some(out) = rep_levels.as_deref_mut() {
                        out[levels_read..levels_read + want].copy_from_slice(&rtmp);
                    }
                }
                non_null
            } else {
                if let Some(out) = def_levels.as_deref_mut() {
                    for slot in &mut out[levels_read..levels_read + want] {
                        *slot = 0;
                    }
                }
                if let Some(out) = rep_levels.as_deref_mut() {
                    for slot in &mut out[levels_read..levels_read + want] {
                        *slot = 0;
                    }
                }
                want
            };

            self.read_values(num_non_null, &mut values[values_read..values_read + num_non_null])?;
            values_read += num_non_null;
            levels_read += want;
            self.num_decoded_values += want;
        }

        Ok((values_read, levels_read))
    }

    fn read_values(&mut self, num_values: usize, out: &mut [T::T]) -> Result<()> {
        if num_values == 0 {
            return Ok(());
        }
        match self.value_source.as_mut() {
            Some(ValueSource::Plain(decoder)) => {
                let got = decoder.get(out)?;
                if got != num_values {
                    return Err(ParquetError::BadValueCount(format!(
                        "expected {} values, decoded {}",
                        num_values, got
                    )));
                }
            }
            Some(ValueSource::Dictionary(decoder)) => {
                let dictionary = self
                    .dictionary
                    .as_ref()
                    .ok_or_else(|| ParquetError::General("dictionary page was never read".to_owned()))?;
                let mut indices = vec![0i32; num_values];
                let got = decoder.get_indices(&mut indices)?;
                if got != num_values {
                    return Err(ParquetError::BadValueCount(format!(
                        "expected {} dictionary indices, decoded {}",
                        num_values, got
                    )));
                }
                for (slot, idx) in out.iter_mut().zip(indices.iter()) {
                    let idx = *idx as usize;
                    *slot = dictionary.get(idx).cloned().ok_or_else(|| {
                        ParquetError::General(format!("dictionary index {} out of range", idx))
                    })?;
                }
            }
            None => {
                return Err(ParquetError::General(
                    "no value decoder set for the current page".to_owned(),
                ))
            }
        }
        Ok(())
    }

    /// Advances to the next page, transparently consuming and caching a
    /// leading dictionary page if present. Returns
    /// `false` once the column chunk's pages are exhausted.
    fn read_new_page(&mut self) -> Result<bool> {
        loop {
            match self.page_reader.get_next_page()? {
                None => return Ok(false),
                Some(Page::DictionaryPage {
                    buf,
                    num_values,
                    encoding,
                    ..
                }) => {
                    if encoding != Encoding::PLAIN && encoding != Encoding::PLAIN_DICTIONARY {
                        return Err(ParquetError::UnsupportedEncoding(format!(
                            "dictionary page encoding must be PLAIN, got {:?}",
                            encoding
                        )));
                    }
                    let mut decoder = crate::encodings::decoding::PlainDecoder::<T>::new(self.descr.clone());
                    decoder.set_data(buf, num_values as usize)?;
                    let mut dict = vec![T::T::default(); num_values as usize];
                    let got = decoder.get(&mut dict)?;
                    if got != num_values as usize {
                        return Err(ParquetError::BadValueCount(
                            "dictionary page declared more values than it contained".to_owned(),
                        ));
                    }
                    self.dictionary = Some(dict);
                }
                Some(Page::DataPage {
                    buf,
                    num_values,
                    encoding,
                    def_level_encoding,
                    rep_level_encoding,
                    ..
                }) => {
                    let max_def_level = self.descr.max_def_level();
                    let max_rep_level = self.descr.max_rep_level();
                    let mut offset = 0usize;

                    if max_rep_level > 0 {
                        let mut decoder = LevelDecoder::new(max_rep_level);
                        let consumed = decoder.set_data_v1(rep_level_encoding, buf.start_from(offset))?;
                        offset += consumed;
                        self.rep_level_decoder = Some(decoder);
                    } else {
                        self.rep_level_decoder = None;
                    }
                    if max_def_level > 0 {
                        let mut decoder = LevelDecoder::new(max_def_level);
                        let consumed = decoder.set_data_v1(def_level_encoding, buf.start_from(offset))?;
                        offset += consumed;
                        self.def_level_decoder = Some(decoder);
                    } else {
                        self.def_level_decoder = None;
                    }

                    self.value_source = Some(self.make_value_source(encoding, buf.start_from(offset), num_values as usize)?);
                    self.num_buffered_values = num_values as usize;
                    self.num_decoded_values = 0;
                    return Ok(true);
                }
                Some(Page::DataPageV2 {
                    buf,
                    num_values,
                    encoding,
                    def_levels_byte_len,
                    rep_levels_byte_len,
                    ..
                }) => {
                    let max_def_level = self.descr.max_def_level();
                    let max_rep_level = self.descr.max_rep_level();
                    let mut offset = 0usize;

                    if max_rep_level > 0 {
                        let mut decoder = LevelDecoder::new(max_rep_level);
                        decoder.set_data_v2(buf.start_from(offset), rep_levels_byte_len as usize)?;
                        self.rep_level_decoder = Some(decoder);
                    } else {
                        self.rep_level_decoder = None;
                    }
                    offset += rep_levels_byte_len as usize;
                    if max_def_level > 0 {
                        let mut decoder = LevelDecoder::new(max_def_level);
                        decoder.set_data_v2(buf.start_from(offset), def_levels_byte_len as usize)?;
                        self.def_level_decoder = Some(decoder);
                    } else {
                        self.def_level_decoder = None;
                    }
                    offset += def_levels_byte_len as usize;

                    self.value_source = Some(self.make_value_source(encoding, buf.start_from(offset), num_values as usize)?);
                    self.num_buffered_values = num_values as usize;
                    self.num_decoded_values = 0;
                    return Ok(true);
                }
            }
        }
    }

    fn make_value_source(
        &self,
        encoding: Encoding,
        data: crate::util::memory::ByteBufferPtr,
        num_values: usize,
    ) -> Result<ValueSource<T>> {
        match encoding {
            Encoding::RLE_DICTIONARY | Encoding::PLAIN_DICTIONARY => {
                let mut decoder = DictIndexDecoder::new();
                decoder.set_data(data, num_values)?;
                Ok(ValueSource::Dictionary(decoder))
            }
            other => {
                let mut decoder = get_decoder::<T>(self.descr.clone(), other)?;
                decoder.set_data(data, num_values)?;
                Ok(ValueSource::Plain(decoder))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Encoding, Repetition};
    use crate::data_type::Int32Type;
    use crate::encodings::levels::LevelEncoder;
    use crate::schema::types::{SchemaDescriptor, Type as SchemaType};
    use crate::util::memory::ByteBufferPtr;
    use rand::Rng;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// A `PageReader` that hands back a fixed, in-memory list of pages —
    /// enough to exercise `ColumnReaderImpl::read_batch` across page
    /// boundaries without going through the on-disk framing.
    struct TestPageReader {
        pages: VecDeque<Page>,
    }

    impl Iterator for TestPageReader {
        type Item = Result<Page>;
        fn next(&mut self) -> Option<Result<Page>> {
            self.get_next_page().transpose()
        }
    }

    impl PageReader for TestPageReader {
        fn get_next_page(&mut self) -> Result<Option<Page>> {
            Ok(self.pages.pop_front())
        }
    }

    fn int32_descr(max_def_level: i16) -> ColumnDescPtr {
        let repetition = if max_def_level > 0 {
            Repetition::OPTIONAL
        } else {
            Repetition::REQUIRED
        };
        let field = SchemaType::primitive_type_builder("a", PhysicalType::INT32)
            .with_repetition(repetition)
            .build()
            .unwrap();
        let schema = SchemaType::group_type_builder("schema")
            .with_fields(&mut vec![Arc::new(field)])
            .build()
            .unwrap();
        SchemaDescriptor::new(Arc::new(schema)).column(0)
    }

    /// Builds a v1 data page carrying `values` with an optional sparse def
    /// level stream (`None` entries become nulls), RLE-encoded the way
    /// `DataPageV1` levels are framed (a 4-byte length prefix then the
    /// hybrid stream).
    fn make_data_page(max_def_level: i16, entries: &[Option<i32>]) -> Page {
        let mut buf = if max_def_level > 0 {
            let def_levels: Vec<i16> = entries
                .iter()
                .map(|v| if v.is_some() { max_def_level } else { 0 })
                .collect();
            let mut encoder = LevelEncoder::new(max_def_level);
            encoder.put(&def_levels);
            encoder.consume_v1()
        } else {
            Vec::new()
        };

        let values: Vec<i32> = entries.iter().filter_map(|v| *v).collect();
        for v in &values {
            buf.extend_from_slice(&v.to_le_bytes());
        }

        Page::DataPage {
            buf: ByteBufferPtr::new(buf),
            num_values: entries.len() as u32,
            encoding: Encoding::PLAIN,
            def_level_encoding: Encoding::RLE,
            rep_level_encoding: Encoding::RLE,
            statistics: None,
        }
    }

    #[test]
    fn test_read_batch_required_single_page() {
        let descr = int32_descr(0);
        let entries: Vec<Option<i32>> = (0..20).map(Some).collect();
        let page = make_data_page(0, &entries);
        let page_reader = Box::new(TestPageReader { pages: VecDeque::from(vec![page]) });
        let mut reader = ColumnReaderImpl::<Int32Type>::new(descr, page_reader);

        let mut values = vec![0i32; 20];
        let (values_read, levels_read) = reader.read_batch(20, None, None, &mut values).unwrap();
        assert_eq!(values_read, 20);
        assert_eq!(levels_read, 20);
        assert_eq!(values, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_read_batch_optional_with_nulls_spans_pages() {
        let descr = int32_descr(1);
        let mut rng = rand::thread_rng();
        let entries: Vec<Option<i32>> = (0..64)
            .map(|i| if rng.gen_bool(0.3) { None } else { Some(i) })
            .collect();
        let page_a = make_data_page(1, &entries[0..32]);
        let page_b = make_data_page(1, &entries[32..]);
        let page_reader = Box::new(TestPageReader { pages: VecDeque::from(vec![page_a, page_b]) });
        let mut reader = ColumnReaderImpl::<Int32Type>::new(descr, page_reader);

        // Read in small batches that straddle the page boundary to exercise
        // `read_new_page` being called mid-`read_batch`.
        let mut def_levels = vec![0i16; entries.len()];
        let mut values = vec![0i32; entries.len()];
        let mut levels_read_total = 0;
        let mut values_read_total = 0;
        let batch_size = 10;
        loop {
            let (values_read, levels_read) = reader
                .read_batch(
                    batch_size,
                    Some(&mut def_levels[levels_read_total..]),
                    None,
                    &mut values[values_read_total..],
                )
                .unwrap();
            if levels_read == 0 {
                break;
            }
            levels_read_total += levels_read;
            values_read_total += values_read;
        }

        assert_eq!(levels_read_total, entries.len());
        let expected_values: Vec<i32> = entries.iter().filter_map(|v| *v).collect();
        assert_eq!(values_read_total, expected_values.len());
        assert_eq!(&values[..values_read_total], &expected_values[..]);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(def_levels[i] == 1, entry.is_some());
        }
    }

    #[test]
    fn test_read_batch_exhausted_page_reader_returns_short() {
        let descr = int32_descr(0);
        let page = make_data_page(0, &[Some(1), Some(2), Some(3)]);
        let page_reader = Box::new(TestPageReader { pages: VecDeque::from(vec![page]) });
        let mut reader = ColumnReaderImpl::<Int32Type>::new(descr, page_reader);

        let mut values = vec![0i32; 10];
        let (values_read, levels_read) = reader.read_batch(10, None, None, &mut values).unwrap();
        assert_eq!(values_read, 3);
        assert_eq!(levels_read, 3);
        assert_eq!(&values[..3], &[1, 2, 3]);
    }
}
