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

//! Value decoders: PLAIN, DELTA_BINARY_PACKED,
//! DELTA_LENGTH_BYTE_ARRAY, DELTA_BYTE_ARRAY, BYTE_STREAM_SPLIT,
//! RLE_DICTIONARY.

use std::marker::PhantomData;

use crate::basic::Encoding;
use crate::data_type::{ByteArray, DataType, ParquetValueType};
use crate::encodings::rle::RleDecoder;
use crate::errors::{ParquetError, Result};
use crate::schema::types::ColumnDescPtr;
use crate::util::bit_util::{num_required_bits, BitReader};
use crate::util::memory::ByteBufferPtr;

/// A decoder for one value encoding of one physical type.
pub trait Decoder<T: DataType>: Send {
    /// Sets the encoded byte buffer this decoder will read `num_values`
    /// values from.
    fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()>;

    /// Decodes up to `buffer.len()` values into `buffer`. Returns the
    /// number actually decoded.
    fn get(&mut self, buffer: &mut [T::T]) -> Result<usize>;

    /// Values remaining to be decoded from the current buffer.
    fn values_left(&self) -> usize;

    fn encoding(&self) -> Encoding;
}

/// Constructs a decoder for `encoding` appropriate to the column's physical
/// type. RLE_DICTIONARY/PLAIN_DICTIONARY are handled separately by the
/// column reader, which owns the dictionary cache.
pub fn get_decoder<T: DataType>(descr: ColumnDescPtr, encoding: Encoding) -> Result<Box<dyn Decoder<T>>>
where
    T::T: ParquetValueType,
{
    match encoding {
        Encoding::PLAIN => Ok(Box::new(PlainDecoder::new(descr))),
        Encoding::DELTA_BINARY_PACKED => Ok(Box::new(DeltaBitPackedDecoder::new())),
        Encoding::DELTA_LENGTH_BYTE_ARRAY => Ok(Box::new(DeltaLengthByteArrayDecoder::<T>::new())),
        Encoding::DELTA_BYTE_ARRAY => Ok(Box::new(DeltaByteArrayDecoder::<T>::new())),
        Encoding::BYTE_STREAM_SPLIT => Ok(Box::new(ByteStreamSplitDecoder::<T>::new())),
        Encoding::RLE_DICTIONARY | Encoding::PLAIN_DICTIONARY => Err(general_err(
            "dictionary decoding is handled by the column value decoder, not get_decoder",
        )),
        e => Err(ParquetError::UnsupportedEncoding(format!("{:?}", e))),
    }
}

fn general_err(msg: &str) -> ParquetError {
    ParquetError::General(msg.to_owned())
}

// ----------------------------------------------------------------------
// PLAIN

pub struct PlainDecoder<T: DataType> {
    descr: ColumnDescPtr,
    data: ByteBufferPtr,
    offset: usize,
    num_values: usize,
    _phantom: PhantomData<T>,
}

impl<T: DataType> PlainDecoder<T> {
    pub fn new(descr: ColumnDescPtr) -> Self {
        Self {
            descr,
            data: ByteBufferPtr::new(Vec::new()),
            offset: 0,
            num_values: 0,
            _phantom: PhantomData,
        }
    }
}

impl<T: DataType> Decoder<T> for PlainDecoder<T>
where
    T::T: ParquetValueType,
{
    fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
        self.data = data;
        self.offset = 0;
        self.num_values = num_values;
        Ok(())
    }

    fn get(&mut self, buffer: &mut [T::T]) -> Result<usize> {
        if T::get_physical_type() == crate::basic::Type::BOOLEAN {
            return self.get_bool(buffer);
        }
        let max = buffer.len().min(self.num_values);
        let type_length = self.descr.type_length();
        for slot in buffer.iter_mut().take(max) {
            let remaining = &self.data.data()[self.offset..];
            let (value, consumed) = T::T::read_plain(remaining, type_length)?;
            self.offset += consumed;
            *slot = value;
        }
        self.num_values -= max;
        Ok(max)
    }

    fn values_left(&self) -> usize {
        self.num_values
    }

    fn encoding(&self) -> Encoding {
        Encoding::PLAIN
    }
}

impl<T: DataType> PlainDecoder<T> {
    /// BOOLEAN is bit-packed LSB-first with no hybrid framing, unlike every
    /// other physical type's PLAIN encoding.
    fn get_bool(&mut self, buffer: &mut [T::T]) -> Result<usize> {
        debug_assert_eq!(std::mem::size_of::<T::T>(), std::mem::size_of::<bool>());
        let max = buffer.len().min(self.num_values);
        let mut reader = BitReader::new(self.data.start_from(self.offset));
        for slot in buffer.iter_mut().take(max) {
            let bit = reader.get_value(1)? != 0;
            // SAFETY: this branch only runs when T::T == bool, asserted above.
            *slot = unsafe { std::mem::transmute_copy(&bit) };
        }
        self.offset += (max + 7) / 8;
        self.num_values -= max;
        Ok(max)
    }
}

// ----------------------------------------------------------------------
// DELTA_BINARY_PACKED

/// Decodes the DELTA_BINARY_PACKED integer stream shared by
/// DELTA_BINARY_PACKED itself, DELTA_LENGTH_BYTE_ARRAY's length stream, and
/// DELTA_BYTE_ARRAY's two length streams.
pub struct DeltaBitPackedDecoder<T: DataType> {
    reader: Option<BitReader>,
    block_size: usize,
    miniblocks_in_block: usize,
    values_per_miniblock: usize,
    total_value_count: usize,
    // Count of values unpacked into `current_block` across all blocks so far,
    // including the header's first value; distinct from `emitted` below.
    loaded: usize,
    last_value: i64,
    // Buffered values from the block currently being unpacked, not yet
    // returned to the caller.
    current_block: Vec<i64>,
    current_index: usize,
    emitted: usize,
    _phantom: PhantomData<T>,
}

impl<T: DataType> DeltaBitPackedDecoder<T> {
    pub fn new() -> Self {
        Self {
            reader: None,
            block_size: 0,
            miniblocks_in_block: 0,
            values_per_miniblock: 0,
            total_value_count: 0,
            loaded: 0,
            last_value: 0,
            current_block: Vec::new(),
            current_index: 0,
            emitted: 0,
            _phantom: PhantomData,
        }
    }

    fn init_header(&mut self) -> Result<()> {
        let reader = self.reader.as_mut().unwrap();
        self.block_size = reader.get_vlq_int()? as usize;
        self.miniblocks_in_block = reader.get_vlq_int()? as usize;
        self.total_value_count = reader.get_vlq_int()? as usize;
        self.last_value = reader.get_zigzag_vlq_int()?;

        if self.block_size == 0 || self.block_size % 128 != 0 {
            return Err(general_err("DELTA_BINARY_PACKED: block_size must be a positive multiple of 128"));
        }
        if self.miniblocks_in_block == 0 || self.block_size % self.miniblocks_in_block != 0 {
            return Err(general_err(
                "DELTA_BINARY_PACKED: miniblocks_in_block must divide block_size",
            ));
        }
        self.values_per_miniblock = self.block_size / self.miniblocks_in_block;
        if self.values_per_miniblock % 32 != 0 {
            return Err(general_err(
                "DELTA_BINARY_PACKED: values per miniblock must be a multiple of 32",
            ));
        }
        self.loaded = 0;
        self.current_block.clear();
        self.current_index = 0;
        self.emitted = 0;
        if self.total_value_count > 0 {
            self.current_block.push(self.last_value);
            self.loaded += 1;
        }
        Ok(())
    }

    fn load_block(&mut self) -> Result<()> {
        if self.loaded >= self.total_value_count {
            return Ok(());
        }
        let remaining = self.total_value_count - self.loaded;
        let reader = self.reader.as_mut().unwrap();
        let min_delta = reader.get_zigzag_vlq_int()?;

        let mut bit_widths = Vec::with_capacity(self.miniblocks_in_block);
        for _ in 0..self.miniblocks_in_block {
            bit_widths.push(reader.get_aligned::<u8>(1)?);
        }

        let mut block_values = Vec::with_capacity(self.block_size);
        let mut left = remaining;
        for &bw in &bit_widths {
            let take = left.min(self.values_per_miniblock);
            for i in 0..self.values_per_miniblock {
                let packed = reader.get_value(bw as usize)? as i64;
                if i < take {
                    block_values.push(packed + min_delta);
                }
            }
            left = left.saturating_sub(take);
        }

        self.current_block.clear();
        self.current_index = 0;
        let mut prev = self.last_value;
        for delta in block_values {
            prev += delta;
            self.current_block.push(prev);
        }
        self.loaded += self.current_block.len();
        self.last_value = prev;
        Ok(())
    }

    /// Decodes up to `max` raw (zigzag-reconstructed) i64 values.
    pub fn get_i64(&mut self, out: &mut [i64], max: usize) -> Result<usize> {
        let mut produced = 0;
        while produced < max && self.emitted < self.total_value_count {
            if self.current_index >= self.current_block.len() {
                self.load_block()?;
                if self.current_index >= self.current_block.len() {
                    break;
                }
            }
            while self.current_index < self.current_block.len() && produced < max {
                out[produced] = self.current_block[self.current_index];
                self.current_index += 1;
                self.emitted += 1;
                produced += 1;
            }
        }
        Ok(produced)
    }

    /// Bytes of the input stream consumed so far. Valid only once every
    /// value has been drained via `get_i64`/`get`; used by
    /// `DeltaLengthByteArrayDecoder`/`DeltaByteArrayDecoder` to locate the
    /// raw payload that follows this length stream.
    pub fn consumed_bytes(&self) -> usize {
        self.reader.as_ref().map(|r| r.get_byte_offset()).unwrap_or(0)
    }
}

impl<T: DataType> Decoder<T> for DeltaBitPackedDecoder<T>
where
    T::T: ParquetValueType,
{
    fn set_data(&mut self, data: ByteBufferPtr, _num_values: usize) -> Result<()> {
        self.reader = Some(BitReader::new(data));
        self.init_header()
    }

    fn get(&mut self, buffer: &mut [T::T]) -> Result<usize> {
        let max = buffer.len();
        let mut raw = vec![0i64; max];
        let n = self.get_i64(&mut raw, max)?;
        for i in 0..n {
            buffer[i] = cast_i64::<T>(raw[i])?;
        }
        Ok(n)
    }

    fn values_left(&self) -> usize {
        self.total_value_count.saturating_sub(self.emitted)
    }

    fn encoding(&self) -> Encoding {
        Encoding::DELTA_BINARY_PACKED
    }
}

fn cast_i64<T: DataType>(v: i64) -> Result<T::T>
where
    T::T: ParquetValueType,
{
    match T::get_physical_type() {
        crate::basic::Type::INT32 | crate::basic::Type::INT64 => Ok(T::T::from_i64(v)),
        other => Err(general_err(&format!(
            "DELTA_BINARY_PACKED is only valid for INT32/INT64, got {:?}",
            other
        ))),
    }
}

// ----------------------------------------------------------------------
// DELTA_LENGTH_BYTE_ARRAY

pub struct DeltaLengthByteArrayDecoder<T: DataType> {
    lengths: Vec<i32>,
    current: usize,
    data: ByteBufferPtr,
    offset: usize,
    _phantom: PhantomData<T>,
}

impl<T: DataType> DeltaLengthByteArrayDecoder<T> {
    pub fn new() -> Self {
        Self {
            lengths: Vec::new(),
            current: 0,
            data: ByteBufferPtr::new(Vec::new()),
            offset: 0,
            _phantom: PhantomData,
        }
    }
}

impl<T: DataType> Decoder<T> for DeltaLengthByteArrayDecoder<T>
where
    T::T: ParquetValueType,
{
    fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
        if T::get_physical_type() != crate::basic::Type::BYTE_ARRAY {
            return Err(general_err("DELTA_LENGTH_BYTE_ARRAY is only valid for BYTE_ARRAY columns"));
        }
        let mut len_decoder: DeltaBitPackedDecoder<crate::data_type::Int32Type> =
            DeltaBitPackedDecoder::new();
        len_decoder.set_data(data.clone(), num_values)?;
        let mut raw = vec![0i64; num_values];
        len_decoder.get_i64(&mut raw, num_values)?;
        self.lengths = raw.iter().map(|&v| v as i32).collect();
        self.current = 0;
        self.offset = len_decoder.consumed_bytes();
        self.data = data;
        Ok(())
    }

    fn get(&mut self, buffer: &mut [T::T]) -> Result<usize> {
        let max = buffer.len().min(self.lengths.len() - self.current);
        for slot in buffer.iter_mut().take(max) {
            let len = self.lengths[self.current] as usize;
            let value = ByteArray::new(self.data.data()[self.offset..self.offset + len].to_vec());
            self.offset += len;
            self.current += 1;
            // SAFETY: `set_data` rejected any T whose physical type isn't
            // BYTE_ARRAY, so T::T is ByteArray here (the only value type the
            // BYTE_ARRAY/FIXED_LEN_BYTE_ARRAY physical types use).
            *slot = unsafe { std::mem::transmute_copy(&value) };
            std::mem::forget(value);
        }
        Ok(max)
    }

    fn values_left(&self) -> usize {
        self.lengths.len() - self.current
    }

    fn encoding(&self) -> Encoding {
        Encoding::DELTA_LENGTH_BYTE_ARRAY
    }
}

// ----------------------------------------------------------------------
// DELTA_BYTE_ARRAY

pub struct DeltaByteArrayDecoder<T: DataType> {
    prefix_lengths: Vec<i32>,
    suffix_lengths: Vec<i32>,
    current: usize,
    data: ByteBufferPtr,
    offset: usize,
    previous: Vec<u8>,
    _phantom: PhantomData<T>,
}

impl<T: DataType> DeltaByteArrayDecoder<T> {
    pub fn new() -> Self {
        Self {
            prefix_lengths: Vec::new(),
            suffix_lengths: Vec::new(),
            current: 0,
            data: ByteBufferPtr::new(Vec::new()),
            offset: 0,
            previous: Vec::new(),
            _phantom: PhantomData,
        }
    }
}

impl<T: DataType> Decoder<T> for DeltaByteArrayDecoder<T>
where
    T::T: ParquetValueType,
{
    fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
        if T::get_physical_type() != crate::basic::Type::BYTE_ARRAY {
            return Err(general_err("DELTA_BYTE_ARRAY is only valid for BYTE_ARRAY columns"));
        }
        let mut prefix_decoder: DeltaBitPackedDecoder<crate::data_type::Int32Type> =
            DeltaBitPackedDecoder::new();
        prefix_decoder.set_data(data.clone(), num_values)?;
        let mut prefixes = vec![0i64; num_values];
        prefix_decoder.get_i64(&mut prefixes, num_values)?;
        let prefix_bytes = prefix_decoder.consumed_bytes();

        let suffix_data = data.start_from(prefix_bytes);
        let mut suffix_decoder: DeltaBitPackedDecoder<crate::data_type::Int32Type> =
            DeltaBitPackedDecoder::new();
        suffix_decoder.set_data(suffix_data.clone(), num_values)?;
        let mut suffixes = vec![0i64; num_values];
        suffix_decoder.get_i64(&mut suffixes, num_values)?;
        let suffix_bytes = suffix_decoder.consumed_bytes();

        self.prefix_lengths = prefixes.iter().map(|&v| v as i32).collect();
        self.suffix_lengths = suffixes.iter().map(|&v| v as i32).collect();
        self.current = 0;
        self.previous = Vec::new();
        self.data = suffix_data;
        self.offset = suffix_bytes;
        Ok(())
    }

    fn get(&mut self, buffer: &mut [T::T]) -> Result<usize> {
        let max = buffer.len().min(self.prefix_lengths.len() - self.current);
        for slot in buffer.iter_mut().take(max) {
            let prefix_len = self.prefix_lengths[self.current] as usize;
            let suffix_len = self.suffix_lengths[self.current] as usize;
            let suffix = &self.data.data()[self.offset..self.offset + suffix_len];
            let mut value = self.previous[..prefix_len.min(self.previous.len())].to_vec();
            value.extend_from_slice(suffix);
            self.offset += suffix_len;
            self.current += 1;
            self.previous = value.clone();
            let value = ByteArray::new(value);
            // SAFETY: see `DeltaLengthByteArrayDecoder::get`.
            *slot = unsafe { std::mem::transmute_copy(&value) };
            std::mem::forget(value);
        }
        Ok(max)
    }

    fn values_left(&self) -> usize {
        self.prefix_lengths.len() - self.current
    }

    fn encoding(&self) -> Encoding {
        Encoding::DELTA_BYTE_ARRAY
    }
}

// ----------------------------------------------------------------------
// BYTE_STREAM_SPLIT

pub struct ByteStreamSplitDecoder<T: DataType> {
    data: ByteBufferPtr,
    num_values: usize,
    current: usize,
    width: usize,
    _phantom: PhantomData<T>,
}

impl<T: DataType> ByteStreamSplitDecoder<T> {
    pub fn new() -> Self {
        let width = match T::get_physical_type() {
            crate::basic::Type::FLOAT => 4,
            crate::basic::Type::DOUBLE => 8,
            _ => 0,
        };
        Self {
            data: ByteBufferPtr::new(Vec::new()),
            num_values: 0,
            current: 0,
            width,
            _phantom: PhantomData,
        }
    }
}

impl<T: DataType> Decoder<T> for ByteStreamSplitDecoder<T>
where
    T::T: ParquetValueType,
{
    fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
        if self.width == 0 {
            return Err(general_err("BYTE_STREAM_SPLIT is only valid for FLOAT/DOUBLE"));
        }
        if data.len() < num_values * self.width {
            return Err(ParquetError::TruncatedPage(
                "BYTE_STREAM_SPLIT stream shorter than num_values * width".to_owned(),
            ));
        }
        self.data = data;
        self.num_values = num_values;
        self.current = 0;
        Ok(())
    }

    fn get(&mut self, buffer: &mut [T::T]) -> Result<usize> {
        let max = buffer.len().min(self.num_values - self.current);
        let n = self.num_values;
        let w = self.width;
        let bytes = self.data.data();
        for k in 0..max {
            let i = self.current + k;
            let mut value_bytes = [0u8; 8];
            for b in 0..w {
                value_bytes[b] = bytes[b * n + i];
            }
            let (decoded, _) = T::T::read_plain(&value_bytes[..w], -1)?;
            buffer[k] = decoded;
        }
        self.current += max;
        Ok(max)
    }

    fn values_left(&self) -> usize {
        self.num_values - self.current
    }

    fn encoding(&self) -> Encoding {
        Encoding::BYTE_STREAM_SPLIT
    }
}

// ----------------------------------------------------------------------
// RLE_DICTIONARY (index stream; dictionary values are decoded separately
// as PLAIN by the owning `ColumnValueDecoder`)

pub struct DictIndexDecoder {
    decoder: Option<RleDecoder>,
    num_values: usize,
    decoded: usize,
}

impl DictIndexDecoder {
    pub fn new() -> Self {
        Self {
            decoder: None,
            num_values: 0,
            decoded: 0,
        }
    }

    /// The values stream begins with a single byte giving the bit width of
    /// the indices that follow; this is authoritative
    /// regardless of the dictionary's own size.
    pub fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
        if data.is_empty() {
            if num_values != 0 {
                return Err(ParquetError::TruncatedPage(
                    "RLE_DICTIONARY stream missing bit-width byte".to_owned(),
                ));
            }
            self.decoder = None;
            self.num_values = 0;
            self.decoded = 0;
            return Ok(());
        }
        let bit_width = data.data()[0];
        if bit_width > 32 {
            return Err(ParquetError::UnsupportedEncoding(format!(
                "RLE_DICTIONARY bit width {} out of range",
                bit_width
            )));
        }
        let mut decoder = RleDecoder::new(bit_width);
        decoder.set_data(data.start_from(1));
        self.decoder = Some(decoder);
        self.num_values = num_values;
        self.decoded = 0;
        Ok(())
    }

    pub fn get_indices(&mut self, out: &mut [i32]) -> Result<usize> {
        let decoder = match self.decoder.as_mut() {
            Some(d) => d,
            None => return Ok(0),
        };
        let max = out.len().min(self.num_values - self.decoded);
        let n = decoder.get_batch(out, max)?;
        self.decoded += n;
        Ok(n)
    }

    pub fn values_left(&self) -> usize {
        self.num_values - self.decoded
    }
}

/// Bit width the encoder-side dictionary index stream should declare, given
/// `dict_len` distinct values.
pub fn dict_index_bit_width(dict_len: usize) -> u8 {
    if dict_len <= 1 {
        0
    } else {
        num_required_bits((dict_len - 1) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::{DoubleType, FloatType, Int32Type, Int64Type};
    use crate::encodings::encoding::{get_encoder, Encoder};
    use crate::schema::types::{ColumnDescriptor, ColumnPath, Type as SchemaType};
    use std::sync::Arc;

    fn int32_descr() -> ColumnDescPtr {
        Arc::new(ColumnDescriptor::new(
            Arc::new(
                SchemaType::primitive_type_builder("a", crate::basic::Type::INT32)
                    .build()
                    .unwrap(),
            ),
            0,
            0,
            ColumnPath::new(vec!["a".to_owned()]),
        ))
    }

    #[test]
    fn test_plain_int32_round_trip() {
        let descr = int32_descr();
        let values: Vec<i32> = (0..100).map(|i| i * 7 - 50).collect();
        let mut encoder = get_encoder::<Int32Type>(Encoding::PLAIN).unwrap();
        encoder.put(&values).unwrap();
        let bytes = encoder.flush_buffer().unwrap();

        let mut decoder: PlainDecoder<Int32Type> = PlainDecoder::new(descr);
        decoder.set_data(bytes, values.len()).unwrap();
        let mut out = vec![0i32; values.len()];
        let n = decoder.get(&mut out).unwrap();
        assert_eq!(n, values.len());
        assert_eq!(out, values);
    }

    #[test]
    fn test_delta_binary_packed_round_trip_i32() {
        let values: Vec<i32> = (0..1000).map(|i| (i * i) % 10007 - 5000).collect();
        let mut encoder = get_encoder::<Int32Type>(Encoding::DELTA_BINARY_PACKED).unwrap();
        encoder.put(&values).unwrap();
        let bytes = encoder.flush_buffer().unwrap();

        let mut decoder: DeltaBitPackedDecoder<Int32Type> = DeltaBitPackedDecoder::new();
        decoder.set_data(bytes, values.len()).unwrap();
        let mut out = vec![0i32; values.len()];
        let n = decoder.get(&mut out).unwrap();
        assert_eq!(n, values.len());
        assert_eq!(out, values);
    }

    #[test]
    fn test_delta_binary_packed_round_trip_i64() {
        let values: Vec<i64> = (0..513).map(|i| i as i64 - 100).collect();
        let mut encoder = get_encoder::<Int64Type>(Encoding::DELTA_BINARY_PACKED).unwrap();
        encoder.put(&values).unwrap();
        let bytes = encoder.flush_buffer().unwrap();

        let mut decoder: DeltaBitPackedDecoder<Int64Type> = DeltaBitPackedDecoder::new();
        decoder.set_data(bytes, values.len()).unwrap();
        let mut out = vec![0i64; values.len()];
        let n = decoder.get(&mut out).unwrap();
        assert_eq!(n, values.len());
        assert_eq!(out, values);
    }

    #[test]
    fn test_byte_stream_split_round_trip_float() {
        let values: Vec<f32> = vec![1.7640524, -0.6917583, 0.3700559, 123.456, -9.0];
        let mut encoder = get_encoder::<FloatType>(Encoding::BYTE_STREAM_SPLIT).unwrap();
        encoder.put(&values).unwrap();
        let bytes = encoder.flush_buffer().unwrap();

        let mut decoder: ByteStreamSplitDecoder<FloatType> = ByteStreamSplitDecoder::new();
        decoder.set_data(bytes, values.len()).unwrap();
        let mut out = vec![0f32; values.len()];
        let n = decoder.get(&mut out).unwrap();
        assert_eq!(n, values.len());
        assert_eq!(out, values);
    }

    #[test]
    fn test_byte_stream_split_round_trip_double() {
        let values: Vec<f64> = vec![-1.30652685, 0.0, 42.1234567, -0.17858909];
        let mut encoder = get_encoder::<DoubleType>(Encoding::BYTE_STREAM_SPLIT).unwrap();
        encoder.put(&values).unwrap();
        let bytes = encoder.flush_buffer().unwrap();

        let mut decoder: ByteStreamSplitDecoder<DoubleType> = ByteStreamSplitDecoder::new();
        decoder.set_data(bytes, values.len()).unwrap();
        let mut out = vec![0f64; values.len()];
        let n = decoder.get(&mut out).unwrap();
        assert_eq!(n, values.len());
        assert_eq!(out, values);
    }
}
