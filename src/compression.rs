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

//! Compression dispatch: maps a codec id to a decoder/encoder
//! pair. Each codec is a pure `decode(bytes) -> bytes` / `encode(bytes) ->
//! bytes` primitive; the individual algorithms themselves are external
//! collaborators (`flate2`, `snap`, `zstd`, `lz4_flex`).

use std::io::{Read, Write};

use crate::basic::Compression;
use crate::errors::{ParquetError, Result};

/// A symmetric compression codec.
pub trait Codec: Send {
    /// Decompresses `input` into `output`, appending to whatever is already
    /// there. Returns the number of bytes appended.
    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize>;

    /// Compresses `input`, appending the compressed bytes to `output`.
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()>;
}

/// Returns a new codec for `codec`, or `None` for `UNCOMPRESSED` (the page
/// pipeline skips decompression entirely in that case rather than running a
/// no-op codec).
pub fn create_codec(codec: Compression) -> Result<Option<Box<dyn Codec>>> {
    log::trace!("codec dispatch chosen: {:?}", codec);
    match codec {
        Compression::UNCOMPRESSED => Ok(None),
        Compression::SNAPPY => Ok(Some(Box::new(SnappyCodec::default()))),
        Compression::GZIP => Ok(Some(Box::new(GzipCodec::default()))),
        Compression::ZSTD => Ok(Some(Box::new(ZstdCodec::default()))),
        Compression::LZ4_RAW => Ok(Some(Box::new(Lz4RawCodec::default()))),
        Compression::BROTLI => Err(ParquetError::UnsupportedCodec(
            "BROTLI is not implemented".to_owned(),
        )),
        Compression::LZO => Err(ParquetError::UnsupportedCodec(
            "LZO is not implemented".to_owned(),
        )),
        Compression::LZ4 => Err(ParquetError::UnsupportedCodec(
            "legacy (framed) LZ4 is not implemented, only LZ4_RAW".to_owned(),
        )),
    }
}

#[derive(Default)]
struct SnappyCodec {}

impl Codec for SnappyCodec {
    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        let len = snap::raw::decompress_len(input)
            .map_err(|e| ParquetError::CodecError(format!("snappy: {}", e)))?;
        let offset = output.len();
        output.resize(offset + len, 0);
        let mut decoder = snap::raw::Decoder::new();
        decoder
            .decompress(input, &mut output[offset..])
            .map_err(|e| ParquetError::CodecError(format!("snappy: {}", e)))?;
        Ok(len)
    }

    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        let mut encoder = snap::raw::Encoder::new();
        let max_len = snap::raw::max_compress_len(input.len());
        let offset = output.len();
        output.resize(offset + max_len, 0);
        let written = encoder
            .compress(input, &mut output[offset..])
            .map_err(|e| ParquetError::CodecError(format!("snappy: {}", e)))?;
        output.truncate(offset + written);
        Ok(())
    }
}

/// GZIP must transparently consume concatenated members:
/// `MultiGzDecoder` loops internally until the source is exhausted, unlike
/// a plain `GzDecoder` which stops after the first member's trailer.
#[derive(Default)]
struct GzipCodec {}

impl Codec for GzipCodec {
    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        let mut decoder = flate2::read::MultiGzDecoder::new(input);
        let before = output.len();
        decoder
            .read_to_end(output)
            .map_err(|e| ParquetError::CodecError(format!("gzip: {}", e)))?;
        Ok(output.len() - before)
    }

    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        let mut encoder =
            flate2::write::GzEncoder::new(output, flate2::Compression::default());
        encoder
            .write_all(input)
            .map_err(|e| ParquetError::CodecError(format!("gzip: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| ParquetError::CodecError(format!("gzip: {}", e)))?;
        Ok(())
    }
}

#[derive(Default)]
struct ZstdCodec {}

impl Codec for ZstdCodec {
    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        let before = output.len();
        zstd::stream::copy_decode(input, &mut *output)
            .map_err(|e| ParquetError::CodecError(format!("zstd: {}", e)))?;
        Ok(output.len() - before)
    }

    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        let compressed = zstd::stream::encode_all(input, 0)
            .map_err(|e| ParquetError::CodecError(format!("zstd: {}", e)))?;
        output.extend_from_slice(&compressed);
        Ok(())
    }
}

/// LZ4_RAW carries no length in its framing, so the caller must supply the
/// expected uncompressed size; the page pipeline always
/// knows it from `uncompressed_page_size`.
#[derive(Default)]
struct Lz4RawCodec {}

impl Codec for Lz4RawCodec {
    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        // The page pipeline pre-sizes `output` to `uncompressed_page_size`
        // before calling decompress for LZ4_RAW; use its existing capacity
        // (beyond current len) as the expected size hint.
        let expected = output.capacity() - output.len();
        let offset = output.len();
        output.resize(offset + expected.max(input.len() * 4 + 64), 0);
        let written = lz4_flex::block::decompress_into(input, &mut output[offset..])
            .map_err(|e| ParquetError::CodecError(format!("lz4_raw: {}", e)))?;
        output.truncate(offset + written);
        Ok(written)
    }

    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        let compressed = lz4_flex::block::compress(input);
        output.extend_from_slice(&compressed);
        Ok(())
    }
}

/// Decompresses a full page payload given the expected uncompressed size
/// (used directly by callers, e.g. the page pipeline, that already know the
/// target length up front rather than growing `output` incrementally).
pub fn decompress(
    codec: Compression,
    src: &[u8],
    expected_uncompressed_size: usize,
) -> Result<Vec<u8>> {
    match create_codec(codec)? {
        None => Ok(src.to_vec()),
        Some(mut c) => {
            let mut out = Vec::with_capacity(expected_uncompressed_size);
            c.decompress(src, &mut out)?;
            if out.len() != expected_uncompressed_size {
                return Err(ParquetError::CodecError(format!(
                    "decompressed size mismatch: expected {}, got {}",
                    expected_uncompressed_size,
                    out.len()
                )));
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(codec: Compression) {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(8);
        let mut compressed = Vec::new();
        create_codec(codec)
            .unwrap()
            .unwrap()
            .compress(&data, &mut compressed)
            .unwrap();
        let mut decompressed = Vec::new();
        create_codec(codec)
            .unwrap()
            .unwrap()
            .decompress(&compressed, &mut decompressed)
            .unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_snappy_round_trip() {
        round_trip(Compression::SNAPPY);
    }

    #[test]
    fn test_gzip_round_trip() {
        round_trip(Compression::GZIP);
    }

    #[test]
    fn test_zstd_round_trip() {
        round_trip(Compression::ZSTD);
    }

    #[test]
    fn test_lz4_raw_round_trip() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(8);
        let mut compressed = Vec::new();
        create_codec(Compression::LZ4_RAW)
            .unwrap()
            .unwrap()
            .compress(&data, &mut compressed)
            .unwrap();
        let mut decompressed = Vec::with_capacity(data.len());
        create_codec(Compression::LZ4_RAW)
            .unwrap()
            .unwrap()
            .decompress(&compressed, &mut decompressed)
            .unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_gzip_concatenated_members() {
        let first = b"hello ".to_vec();
        let second = b"world".to_vec();
        let mut member1 = Vec::new();
        create_codec(Compression::GZIP)
            .unwrap()
            .unwrap()
            .compress(&first, &mut member1)
            .unwrap();
        let mut member2 = Vec::new();
        create_codec(Compression::GZIP)
            .unwrap()
            .unwrap()
            .compress(&second, &mut member2)
            .unwrap();
        let mut concatenated = member1;
        concatenated.extend_from_slice(&member2);

        let mut decompressed = Vec::new();
        create_codec(Compression::GZIP)
            .unwrap()
            .unwrap()
            .decompress(&concatenated, &mut decompressed)
            .unwrap();
        assert_eq!(decompressed, b"hello world");
    }

    #[test]
    fn test_unsupported_codec() {
        assert!(matches!(
            create_codec(Compression::LZO),
            Err(ParquetError::UnsupportedCodec(_))
        ));
        assert!(matches!(
            create_codec(Compression::BROTLI),
            Err(ParquetError::UnsupportedCodec(_))
        ));
    }
}
