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

//! The hybrid RLE / bit-packed run encoding, used for
//! repetition and definition level streams and, with a
//! caller-supplied bit width, for RLE_DICTIONARY value indices (§4.5).
//!
//! Each run starts with an unsigned varint header: LSB=1 selects an RLE run
//! (`count = header >> 1` repeats of one value), LSB=0 selects a bit-packed
//! run (`header >> 1` groups of 8 values, each `w` bits wide, LSB-first).

use crate::errors::{ParquetError, Result};
use crate::util::bit_util::{ceil, BitReader, BitWriter};
use crate::util::memory::ByteBufferPtr;

const RLE_MIN_RUN_LEN: usize = 8;

pub struct RleDecoder {
    bit_width: u8,
    reader: Option<BitReader>,
    // Remaining repeats of `rle_value` in the current RLE run.
    rle_left: usize,
    rle_value: u64,
    // Remaining values in the current bit-packed run (already read into `buffered`).
    bit_packed_left: usize,
}

impl RleDecoder {
    pub fn new(bit_width: u8) -> Self {
        Self {
            bit_width,
            reader: None,
            rle_left: 0,
            rle_value: 0,
            bit_packed_left: 0,
        }
    }

    pub fn set_data(&mut self, data: ByteBufferPtr) {
        self.reader = Some(BitReader::new(data));
        self.rle_left = 0;
        self.bit_packed_left = 0;
    }

    fn reader_mut(&mut self) -> Result<&mut BitReader> {
        self.reader
            .as_mut()
            .ok_or_else(|| ParquetError::General("RleDecoder has no data set".to_owned()))
    }

    fn load_next_group(&mut self) -> Result<bool> {
        let width = self.bit_width as usize;
        let reader = self.reader_mut()?;
        if reader.bytes_left() == 0 {
            return Ok(false);
        }
        let header = reader.get_vlq_int()?;
        if header & 1 == 1 {
            let count = (header >> 1) as usize;
            let value = if width == 0 {
                0
            } else {
                let num_bytes = ceil(width as i64, 8) as usize;
                reader.get_aligned::<u64>(num_bytes)?
            };
            self.rle_value = value;
            self.rle_left = count;
        } else {
            let num_groups = (header >> 1) as usize;
            self.bit_packed_left = num_groups * 8;
        }
        Ok(true)
    }

    /// Decodes up to `max_values` values, appending them to `out`. Returns
    /// the number actually decoded.
    pub fn get_batch(&mut self, out: &mut [i32], max_values: usize) -> Result<usize> {
        let mut decoded = 0;
        let width = self.bit_width as usize;
        while decoded < max_values {
            if self.rle_left == 0 && self.bit_packed_left == 0 && !self.load_next_group()? {
                break;
            }
            if self.rle_left > 0 {
                let n = self.rle_left.min(max_values - decoded);
                for i in 0..n {
                    out[decoded + i] = self.rle_value as i32;
                }
                self.rle_left -= n;
                decoded += n;
            } else if self.bit_packed_left > 0 {
                let n = self.bit_packed_left.min(max_values - decoded);
                let reader = self.reader_mut()?;
                for i in 0..n {
                    out[decoded + i] = reader.get_value(width)? as i32;
                }
                self.bit_packed_left -= n;
                decoded += n;
            }
        }
        Ok(decoded)
    }

    pub fn get(&mut self) -> Result<Option<i32>> {
        let mut buf = [0i32; 1];
        let n = self.get_batch(&mut buf, 1)?;
        Ok(if n == 1 { Some(buf[0]) } else { None })
    }
}

pub struct RleEncoder {
    bit_width: u8,
    buffer: Vec<i32>,
    writer: BitWriter,
}

impl RleEncoder {
    pub fn new(bit_width: u8, buffer_len: usize) -> Self {
        Self {
            bit_width,
            buffer: Vec::new(),
            writer: BitWriter::with_capacity(buffer_len),
        }
    }

    pub fn put(&mut self, value: u64) {
        self.buffer.push(value as i32);
    }

    /// Flushes all buffered values into runs, heuristically choosing RLE
    /// for runs of >= 8 repeats and bit-packing the rest in groups of 8.
    /// Special-cases `bit_width == 0`: the entire stream is
    /// emitted as a single RLE run of zeros.
    pub fn consume(mut self) -> Vec<u8> {
        if self.bit_width == 0 {
            if !self.buffer.is_empty() {
                self.writer.put_vlq_int((self.buffer.len() as u64) << 1);
            }
            return self.writer.consume();
        }

        let values = std::mem::take(&mut self.buffer);
        let mut i = 0;
        while i < values.len() {
            let run_len = run_length(&values, i);
            if run_len >= RLE_MIN_RUN_LEN {
                self.writer.put_vlq_int((run_len as u64) << 1);
                let num_bytes = ceil(self.bit_width as i64, 8) as usize;
                let bytes = (values[i] as u64).to_le_bytes();
                self.writer.put_aligned_bytes(&bytes[..num_bytes]);
                i += run_len;
            } else {
                // Bit-pack in whole groups of 8 up to the next run (or end).
                let mut group_values_end = i;
                while group_values_end < values.len() {
                    let next_run = run_length(&values, group_values_end);
                    if next_run >= RLE_MIN_RUN_LEN {
                        break;
                    }
                    group_values_end += next_run.max(1);
                }
                let mut chunk: Vec<i32> = values[i..group_values_end].to_vec();
                let num_groups = ceil(chunk.len() as i64, 8) as usize;
                while chunk.len() < num_groups * 8 {
                    chunk.push(0);
                }
                self.writer.put_vlq_int((num_groups as u64) << 1);
                for &v in &chunk {
                    self.writer.put_value(v as u64, self.bit_width as usize);
                }
                i = group_values_end;
            }
        }
        self.writer.consume()
    }
}

fn run_length(values: &[i32], start: usize) -> usize {
    let mut len = 1;
    while start + len < values.len() && values[start + len] == values[start] {
        len += 1;
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(values: &[i32], bit_width: u8) {
        let mut encoder = RleEncoder::new(bit_width, 256);
        for &v in values {
            encoder.put(v as u64);
        }
        let bytes = encoder.consume();

        let mut decoder = RleDecoder::new(bit_width);
        decoder.set_data(ByteBufferPtr::new(bytes));
        let mut out = vec![0i32; values.len()];
        let n = decoder.get_batch(&mut out, values.len()).unwrap();
        assert_eq!(n, values.len());
        assert_eq!(out, values);
    }

    #[test]
    fn test_rle_all_same() {
        round_trip(&[3; 100], 3);
    }

    #[test]
    fn test_bit_packed_only() {
        let values: Vec<i32> = (0..40).map(|i| i % 5).collect();
        round_trip(&values, 3);
    }

    #[test]
    fn test_mixed_runs() {
        let mut values = vec![1; 20];
        values.extend((0..10).map(|i| i % 3));
        values.extend(vec![7; 9]);
        round_trip(&values, 4);
    }

    #[test]
    fn test_zero_bit_width() {
        let values = vec![0; 50];
        round_trip(&values, 0);
    }

    #[test]
    fn test_empty_stream() {
        round_trip(&[], 4);
    }

    #[test]
    fn test_all_bit_widths() {
        for width in 0u8..=32 {
            let max = if width == 0 { 1 } else { 1u64 << width.min(20) };
            let values: Vec<i32> = (0..37).map(|i| ((i as u64) % max) as i32).collect();
            round_trip(&values, width.min(20));
        }
    }
}
