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

//! Value encoders, the write-side mirror of
//! `encodings::decoding` for every encoding a writer needs to produce:
//! PLAIN, DELTA_BINARY_PACKED, DELTA_LENGTH_BYTE_ARRAY,
//! DELTA_BYTE_ARRAY, BYTE_STREAM_SPLIT, RLE_DICTIONARY.

use std::collections::HashMap;
use std::marker::PhantomData;

use crate::basic::Encoding;
use crate::data_type::{ByteArray, DataType, ParquetValueType};
use crate::encodings::decoding::dict_index_bit_width;
use crate::encodings::rle::RleEncoder;
use crate::errors::Result;
use crate::util::bit_util::{num_required_bits, BitWriter};
use crate::util::memory::ByteBufferPtr;

/// An encoder for one value encoding of one physical type.
pub trait Encoder<T: DataType>: Send {
    fn put(&mut self, values: &[T::T]) -> Result<()>;

    /// Finalizes and returns the accumulated encoded bytes, resetting
    /// internal state so the encoder can be reused for the next page.
    fn flush_buffer(&mut self) -> Result<ByteBufferPtr>;

    fn estimated_data_encoded_size(&self) -> usize;

    fn encoding(&self) -> Encoding;
}

pub fn get_encoder<T: DataType>(encoding: Encoding) -> Result<Box<dyn Encoder<T>>>
where
    T::T: ParquetValueType,
{
    match encoding {
        Encoding::PLAIN => Ok(Box::new(PlainEncoder::new())),
        Encoding::DELTA_BINARY_PACKED => Ok(Box::new(DeltaBitPackedEncoder::new())),
        Encoding::DELTA_LENGTH_BYTE_ARRAY => Ok(Box::new(DeltaLengthByteArrayEncoder::<T>::new())),
        Encoding::DELTA_BYTE_ARRAY => Ok(Box::new(DeltaByteArrayEncoder::<T>::new())),
        Encoding::BYTE_STREAM_SPLIT => Ok(Box::new(ByteStreamSplitEncoder::new())),
        e => Err(crate::errors::ParquetError::UnsupportedEncoding(format!("{:?}", e))),
    }
}

// ----------------------------------------------------------------------
// PLAIN

pub struct PlainEncoder<T: DataType> {
    buffer: Vec<u8>,
    bool_writer: BitWriter,
    _phantom: PhantomData<T>,
}

impl<T: DataType> PlainEncoder<T> {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            bool_writer: BitWriter::new(),
            _phantom: PhantomData,
        }
    }
}

impl<T: DataType> Encoder<T> for PlainEncoder<T>
where
    T::T: ParquetValueType,
{
    fn put(&mut self, values: &[T::T]) -> Result<()> {
        match T::get_physical_type() {
            crate::basic::Type::BOOLEAN => {
                for v in values {
                    self.bool_writer.put_value(v.as_plain_bool() as u64, 1);
                }
            }
            crate::basic::Type::FIXED_LEN_BYTE_ARRAY => {
                // Unlike BYTE_ARRAY, PLAIN-encoded FIXED_LEN_BYTE_ARRAY has no
                // length prefix (the width lives in the schema), so this
                // can't go through `ParquetValueType::write_plain`, which
                // always length-prefixes `ByteArray`.
                // SAFETY: the physical-type check guarantees T::T is
                // `ByteArray`, the value type both BYTE_ARRAY and
                // FIXED_LEN_BYTE_ARRAY share.
                let values: &[ByteArray] = unsafe {
                    std::slice::from_raw_parts(values.as_ptr() as *const ByteArray, values.len())
                };
                for v in values {
                    self.buffer.extend_from_slice(v.data());
                }
            }
            _ => {
                for v in values {
                    v.write_plain(&mut self.buffer);
                }
            }
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
        if T::get_physical_type() == crate::basic::Type::BOOLEAN {
            let writer = std::mem::replace(&mut self.bool_writer, BitWriter::new());
            return Ok(ByteBufferPtr::new(writer.consume()));
        }
        Ok(ByteBufferPtr::new(std::mem::take(&mut self.buffer)))
    }

    fn estimated_data_encoded_size(&self) -> usize {
        self.buffer.len() + self.bool_writer.len()
    }

    fn encoding(&self) -> Encoding {
        Encoding::PLAIN
    }
}

// ----------------------------------------------------------------------
// DELTA_BINARY_PACKED

const DEFAULT_BLOCK_SIZE: usize = 128;
const DEFAULT_MINIBLOCKS_PER_BLOCK: usize = 4;
const VALUES_PER_MINIBLOCK: usize = DEFAULT_BLOCK_SIZE / DEFAULT_MINIBLOCKS_PER_BLOCK;

pub struct DeltaBitPackedEncoder<T: DataType> {
    values: Vec<i64>,
    _phantom: PhantomData<T>,
}

impl<T: DataType> DeltaBitPackedEncoder<T> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Encodes `self.values` (already narrowed to i64) as a complete
    /// DELTA_BINARY_PACKED stream.
    fn encode_i64(values: &[i64]) -> Vec<u8> {
        let mut writer = BitWriter::new();
        writer.put_vlq_int(DEFAULT_BLOCK_SIZE as u64);
        writer.put_vlq_int(DEFAULT_MINIBLOCKS_PER_BLOCK as u64);
        writer.put_vlq_int(values.len() as u64);
        if values.is_empty() {
            writer.put_zigzag_vlq_int(0);
            return writer.consume();
        }
        writer.put_zigzag_vlq_int(values[0]);

        let deltas: Vec<i64> = values.windows(2).map(|w| w[1] - w[0]).collect();
        let mut i = 0;
        while i < deltas.len() {
            let block: Vec<i64> = deltas[i..(i + DEFAULT_BLOCK_SIZE).min(deltas.len())].to_vec();
            let min_delta = *block.iter().min().unwrap();
            writer.put_zigzag_vlq_int(min_delta);

            let mut bit_widths = Vec::with_capacity(DEFAULT_MINIBLOCKS_PER_BLOCK);
            let mut miniblocks: Vec<Vec<u64>> = Vec::with_capacity(DEFAULT_MINIBLOCKS_PER_BLOCK);
            for m in 0..DEFAULT_MINIBLOCKS_PER_BLOCK {
                let start = m * VALUES_PER_MINIBLOCK;
                let mut mini: Vec<u64> = Vec::with_capacity(VALUES_PER_MINIBLOCK);
                let mut max_bits = 0u8;
                for k in 0..VALUES_PER_MINIBLOCK {
                    let idx = start + k;
                    let shifted = if idx < block.len() {
                        (block[idx] - min_delta) as u64
                    } else {
                        0
                    };
                    max_bits = max_bits.max(num_required_bits(shifted));
                    mini.push(shifted);
                }
                bit_widths.push(max_bits);
                miniblocks.push(mini);
            }
            for &bw in &bit_widths {
                writer.put_aligned_bytes(&[bw]);
            }
            for (bw, mini) in bit_widths.iter().zip(miniblocks.iter()) {
                for &v in mini {
                    writer.put_value(v, *bw as usize);
                }
            }
            i += DEFAULT_BLOCK_SIZE;
        }
        writer.consume()
    }
}

impl<T: DataType> Encoder<T> for DeltaBitPackedEncoder<T>
where
    T::T: ParquetValueType,
{
    fn put(&mut self, values: &[T::T]) -> Result<()> {
        match T::get_physical_type() {
            crate::basic::Type::INT32 | crate::basic::Type::INT64 => {
                self.values.extend(values.iter().map(|v| v.to_i64()));
                Ok(())
            }
            other => Err(crate::errors::ParquetError::General(format!(
                "DELTA_BINARY_PACKED is only valid for INT32/INT64, got {:?}",
                other
            ))),
        }
    }

    fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
        let values = std::mem::take(&mut self.values);
        Ok(ByteBufferPtr::new(Self::encode_i64(&values)))
    }

    fn estimated_data_encoded_size(&self) -> usize {
        self.values.len() * 8
    }

    fn encoding(&self) -> Encoding {
        Encoding::DELTA_BINARY_PACKED
    }
}

// ----------------------------------------------------------------------
// DELTA_LENGTH_BYTE_ARRAY / DELTA_BYTE_ARRAY share the length stream

pub struct DeltaLengthByteArrayEncoder<T: DataType> {
    lengths: Vec<i64>,
    data: Vec<u8>,
    _phantom: PhantomData<T>,
}

impl<T: DataType> DeltaLengthByteArrayEncoder<T> {
    pub fn new() -> Self {
        Self {
            lengths: Vec::new(),
            data: Vec::new(),
            _phantom: PhantomData,
        }
    }
}

impl<T: DataType> Encoder<T> for DeltaLengthByteArrayEncoder<T>
where
    T::T: ParquetValueType,
{
    fn put(&mut self, values: &[T::T]) -> Result<()> {
        if T::get_physical_type() != crate::basic::Type::BYTE_ARRAY {
            return Err(crate::errors::ParquetError::General(
                "DELTA_LENGTH_BYTE_ARRAY is only valid for BYTE_ARRAY columns".to_owned(),
            ));
        }
        // SAFETY: the physical-type check above guarantees T::T is
        // ByteArray, the only value type BYTE_ARRAY/FIXED_LEN_BYTE_ARRAY use.
        let values: &[ByteArray] =
            unsafe { std::slice::from_raw_parts(values.as_ptr() as *const ByteArray, values.len()) };
        for v in values {
            self.lengths.push(v.len() as i64);
            self.data.extend_from_slice(v.data());
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
        let lengths = std::mem::take(&mut self.lengths);
        let data = std::mem::take(&mut self.data);
        let mut out = DeltaBitPackedEncoder::<crate::data_type::Int32Type>::encode_i64(&lengths);
        out.extend_from_slice(&data);
        Ok(ByteBufferPtr::new(out))
    }

    fn estimated_data_encoded_size(&self) -> usize {
        self.data.len() + self.lengths.len() * 4
    }

    fn encoding(&self) -> Encoding {
        Encoding::DELTA_LENGTH_BYTE_ARRAY
    }
}

pub struct DeltaByteArrayEncoder<T: DataType> {
    prefix_lengths: Vec<i64>,
    suffix_lengths: Vec<i64>,
    suffix_data: Vec<u8>,
    previous: Vec<u8>,
    _phantom: PhantomData<T>,
}

impl<T: DataType> DeltaByteArrayEncoder<T> {
    pub fn new() -> Self {
        Self {
            prefix_lengths: Vec::new(),
            suffix_lengths: Vec::new(),
            suffix_data: Vec::new(),
            previous: Vec::new(),
            _phantom: PhantomData,
        }
    }
}

impl<T: DataType> Encoder<T> for DeltaByteArrayEncoder<T>
where
    T::T: ParquetValueType,
{
    fn put(&mut self, values: &[T::T]) -> Result<()> {
        if T::get_physical_type() != crate::basic::Type::BYTE_ARRAY {
            return Err(crate::errors::ParquetError::General(
                "DELTA_BYTE_ARRAY is only valid for BYTE_ARRAY columns".to_owned(),
            ));
        }
        // SAFETY: see `DeltaLengthByteArrayEncoder::put`.
        let values: &[ByteArray] =
            unsafe { std::slice::from_raw_parts(values.as_ptr() as *const ByteArray, values.len()) };
        for v in values {
            let bytes = v.data();
            let shared = bytes
                .iter()
                .zip(self.previous.iter())
                .take_while(|(a, b)| a == b)
                .count();
            self.prefix_lengths.push(shared as i64);
            self.suffix_lengths.push((bytes.len() - shared) as i64);
            self.suffix_data.extend_from_slice(&bytes[shared..]);
            self.previous = bytes.to_vec();
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
        let prefixes = std::mem::take(&mut self.prefix_lengths);
        let suffixes = std::mem::take(&mut self.suffix_lengths);
        let data = std::mem::take(&mut self.suffix_data);
        self.previous.clear();

        let mut out = DeltaBitPackedEncoder::<crate::data_type::Int32Type>::encode_i64(&prefixes);
        out.extend_from_slice(&DeltaBitPackedEncoder::<crate::data_type::Int32Type>::encode_i64(
            &suffixes,
        ));
        out.extend_from_slice(&data);
        Ok(ByteBufferPtr::new(out))
    }

    fn estimated_data_encoded_size(&self) -> usize {
        self.suffix_data.len() + (self.prefix_lengths.len() + self.suffix_lengths.len()) * 4
    }

    fn encoding(&self) -> Encoding {
        Encoding::DELTA_BYTE_ARRAY
    }
}

// ----------------------------------------------------------------------
// BYTE_STREAM_SPLIT

pub struct ByteStreamSplitEncoder<T: DataType> {
    values: Vec<Vec<u8>>,
    width: usize,
    _phantom: PhantomData<T>,
}

impl<T: DataType> ByteStreamSplitEncoder<T> {
    pub fn new() -> Self {
        let width = match T::get_physical_type() {
            crate::basic::Type::FLOAT => 4,
            crate::basic::Type::DOUBLE => 8,
            _ => 0,
        };
        Self {
            values: Vec::new(),
            width,
            _phantom: PhantomData,
        }
    }
}

impl<T: DataType> Encoder<T> for ByteStreamSplitEncoder<T>
where
    T::T: ParquetValueType,
{
    fn put(&mut self, values: &[T::T]) -> Result<()> {
        if self.width == 0 {
            return Err(crate::errors::ParquetError::General(
                "BYTE_STREAM_SPLIT is only valid for FLOAT/DOUBLE".to_owned(),
            ));
        }
        for v in values {
            let mut bytes = Vec::with_capacity(self.width);
            v.write_plain(&mut bytes);
            self.values.push(bytes);
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
        let values = std::mem::take(&mut self.values);
        let n = values.len();
        let mut out = vec![0u8; n * self.width];
        for (i, bytes) in values.iter().enumerate() {
            for (b, &byte) in bytes.iter().enumerate() {
                out[b * n + i] = byte;
            }
        }
        Ok(ByteBufferPtr::new(out))
    }

    fn estimated_data_encoded_size(&self) -> usize {
        self.values.len() * self.width
    }

    fn encoding(&self) -> Encoding {
        Encoding::BYTE_STREAM_SPLIT
    }
}

// ----------------------------------------------------------------------
// RLE_DICTIONARY

/// Builds a dictionary of distinct values plus an RLE-encoded index stream.
/// The dictionary page itself is PLAIN-encoded by the
/// column writer; this type only tracks the mapping and the index stream.
///
/// Keyed on each value's PLAIN byte encoding rather than `T::T` itself, since
/// `f32`/`f64` (FLOAT/DOUBLE) have no `Eq`/`Hash` impl.
pub struct DictEncoder<T: DataType>
where
    T::T: ParquetValueType,
{
    map: HashMap<Vec<u8>, i32>,
    dict: Vec<T::T>,
    indices: Vec<i32>,
}

impl<T: DataType> DictEncoder<T>
where
    T::T: ParquetValueType,
{
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            dict: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn put(&mut self, values: &[T::T]) {
        for v in values {
            let mut key = Vec::new();
            v.write_plain(&mut key);
            let idx = *self.map.entry(key).or_insert_with(|| {
                self.dict.push(v.clone());
                (self.dict.len() - 1) as i32
            });
            self.indices.push(idx);
        }
    }

    pub fn dictionary(&self) -> &[T::T] {
        &self.dict
    }

    pub fn num_entries(&self) -> usize {
        self.dict.len()
    }

    /// The raw per-value dictionary indices accumulated so far, in the order
    /// `put` saw them. Lets the column writer slice out one data page's
    /// worth of indices without re-running `write_indices`' RLE encoding
    /// over the whole column chunk at once.
    pub fn indices(&self) -> &[i32] {
        &self.indices
    }

    /// The RLE_DICTIONARY values-stream bytes: a leading bit-width byte
    /// followed by the RLE/bit-packed-hybrid encoded indices.
    pub fn write_indices(&mut self) -> Vec<u8> {
        let bit_width = dict_index_bit_width(self.dict.len());
        let mut encoder = RleEncoder::new(bit_width, self.indices.len() * 4 + 16);
        for &idx in &self.indices {
            encoder.put(idx as u64);
        }
        let body = encoder.consume();
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(bit_width);
        out.extend_from_slice(&body);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::Int32Type;

    #[test]
    fn test_dict_encoder_assigns_stable_indices() {
        let mut encoder: DictEncoder<Int32Type> = DictEncoder::new();
        encoder.put(&[5, 7, 5, 9, 7]);
        assert_eq!(encoder.dictionary(), &[5, 7, 9]);
        assert_eq!(encoder.indices, vec![0, 1, 0, 2, 1]);
    }
}
