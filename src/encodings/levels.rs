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

//! Repetition/definition level streams, layered on top of
//! `encodings::rle`. DataPage (v1) level streams are prefixed with a
//! 4-byte little-endian length and use the hybrid RLE/bit-packed encoding
//! unconditionally; DataPageV2 streams carry their own declared byte length
//! in the page header and are never further length-prefixed.

use crate::basic::Encoding;
use crate::errors::{ParquetError, Result};
use crate::util::bit_util::num_required_bits;
use crate::util::memory::ByteBufferPtr;

use super::rle::{RleDecoder, RleEncoder};

/// Reads one level column's repetition or definition level stream.
pub struct LevelDecoder {
    bit_width: u8,
    rle: Option<RleDecoder>,
}

impl LevelDecoder {
    pub fn new(max_level: i16) -> Self {
        Self {
            bit_width: num_required_bits(max_level as u64),
            rle: None,
        }
    }

    /// Sets a DataPage (v1) level stream: reads the leading 4-byte length
    /// prefix, then decodes `num_values` levels from the following bytes.
    /// Returns the total bytes consumed (prefix + body), so the page
    /// decoder can advance past this stream into the next one.
    pub fn set_data_v1(&mut self, encoding: Encoding, data: ByteBufferPtr) -> Result<usize> {
        if self.bit_width == 0 {
            self.rle = None;
            return Ok(0);
        }
        match encoding {
            Encoding::RLE => {
                if data.len() < 4 {
                    return Err(ParquetError::TruncatedPage(
                        "level stream missing 4-byte length prefix".to_owned(),
                    ));
                }
                let len = u32::from_le_bytes(data.data()[0..4].try_into().unwrap()) as usize;
                if data.len() < 4 + len {
                    return Err(ParquetError::TruncatedPage(
                        "level stream shorter than declared length".to_owned(),
                    ));
                }
                let mut rle = RleDecoder::new(self.bit_width);
                rle.set_data(data.range(4, len));
                self.rle = Some(rle);
                Ok(4 + len)
            }
            other => Err(ParquetError::UnsupportedEncoding(format!(
                "level stream encoding must be RLE, got {:?}",
                other
            ))),
        }
    }

    /// Sets a DataPageV2 level stream: no length prefix, `byte_len` comes
    /// from the page header directly.
    pub fn set_data_v2(&mut self, data: ByteBufferPtr, byte_len: usize) -> Result<()> {
        if self.bit_width == 0 {
            self.rle = None;
            return Ok(());
        }
        if data.len() < byte_len {
            return Err(ParquetError::TruncatedPage(
                "DataPageV2 level stream shorter than declared length".to_owned(),
            ));
        }
        let mut rle = RleDecoder::new(self.bit_width);
        rle.set_data(data.range(0, byte_len));
        self.rle = Some(rle);
        Ok(())
    }

    /// Decodes up to `buffer.len()` levels. Columns whose max level is 0
    /// (no OPTIONAL/REPEATED ancestors) never have a level stream at all;
    /// every slot is implicitly the max level.
    pub fn get_batch(&mut self, buffer: &mut [i16]) -> Result<usize> {
        if self.bit_width == 0 {
            return Ok(0);
        }
        let rle = self
            .rle
            .as_mut()
            .ok_or_else(|| ParquetError::General("LevelDecoder has no data set".to_owned()))?;
        let mut raw = vec![0i32; buffer.len()];
        let n = rle.get_batch(&mut raw, buffer.len())?;
        for i in 0..n {
            buffer[i] = raw[i] as i16;
        }
        Ok(n)
    }
}

/// Write-side mirror of `LevelDecoder`.
pub struct LevelEncoder {
    bit_width: u8,
    values: Vec<i16>,
}

impl LevelEncoder {
    pub fn new(max_level: i16) -> Self {
        Self {
            bit_width: num_required_bits(max_level as u64),
            values: Vec::new(),
        }
    }

    pub fn put(&mut self, levels: &[i16]) {
        self.values.extend_from_slice(levels);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Produces the RLE-encoded body only, for DataPageV2 (which declares
    /// its own byte length in the page header, no prefix needed).
    pub fn consume_v2(self) -> Vec<u8> {
        if self.bit_width == 0 {
            return Vec::new();
        }
        let mut encoder = RleEncoder::new(self.bit_width, self.values.len() * 2 + 16);
        for &v in &self.values {
            encoder.put(v as u64);
        }
        encoder.consume()
    }

    /// Produces the DataPage (v1) form: a 4-byte length prefix followed by
    /// the RLE-encoded body.
    pub fn consume_v1(self) -> Vec<u8> {
        let bit_width = self.bit_width;
        let is_empty = self.values.is_empty();
        let body = self.consume_v2();
        if bit_width == 0 && is_empty {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(body.len() + 4);
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_round_trip_v1() {
        let levels: Vec<i16> = (0..200).map(|i| (i % 4) as i16).collect();
        let mut encoder = LevelEncoder::new(3);
        encoder.put(&levels);
        let bytes = encoder.consume_v1();

        let mut decoder = LevelDecoder::new(3);
        let consumed = decoder.set_data_v1(Encoding::RLE, ByteBufferPtr::new(bytes.clone())).unwrap();
        assert_eq!(consumed, bytes.len());
        let mut out = vec![0i16; levels.len()];
        let n = decoder.get_batch(&mut out).unwrap();
        assert_eq!(n, levels.len());
        assert_eq!(out, levels);
    }

    #[test]
    fn test_level_round_trip_v2() {
        let levels: Vec<i16> = (0..50).map(|i| (i % 2) as i16).collect();
        let mut encoder = LevelEncoder::new(1);
        encoder.put(&levels);
        let bytes = encoder.consume_v2();

        let mut decoder = LevelDecoder::new(1);
        decoder.set_data_v2(ByteBufferPtr::new(bytes.clone()), bytes.len()).unwrap();
        let mut out = vec![0i16; levels.len()];
        let n = decoder.get_batch(&mut out).unwrap();
        assert_eq!(n, levels.len());
        assert_eq!(out, levels);
    }

    #[test]
    fn test_zero_max_level_has_no_stream() {
        let mut decoder = LevelDecoder::new(0);
        let consumed = decoder.set_data_v1(Encoding::RLE, ByteBufferPtr::new(Vec::new())).unwrap();
        assert_eq!(consumed, 0);
        let mut out = vec![0i16; 10];
        let n = decoder.get_batch(&mut out).unwrap();
        assert_eq!(n, 0);
    }
}
