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

//! Contains Parquet's basic enums, mirroring the wire identifiers the compact
//! footer format and page headers use.

use std::fmt;
use std::str::FromStr;

use crate::errors::ParquetError;

/// Physical type for leaf-level primitive columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    BOOLEAN,
    INT32,
    INT64,
    INT96,
    FLOAT,
    DOUBLE,
    BYTE_ARRAY,
    FIXED_LEN_BYTE_ARRAY,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Repetition of a schema node: whether the field can be absent (OPTIONAL),
/// can occur more than once (REPEATED), or is always present (REQUIRED).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetition {
    REQUIRED,
    OPTIONAL,
    REPEATED,
}

/// High-level grouping of a logical column, recognized by structural pattern
/// matching over the flattened leaf list (see `schema::types::build_leaves`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalColumnKind {
    PRIMITIVE,
    LIST,
    MAP,
    STRUCT,
}

/// Encoding identifiers used for both levels and values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    PLAIN,
    /// Deprecated, equivalent to `PLAIN_DICTIONARY` pointing at `RLE_DICTIONARY`.
    PLAIN_DICTIONARY,
    RLE,
    /// Legacy unframed bit-packing, kept for level streams written by old files.
    BIT_PACKED,
    DELTA_BINARY_PACKED,
    DELTA_LENGTH_BYTE_ARRAY,
    DELTA_BYTE_ARRAY,
    RLE_DICTIONARY,
    BYTE_STREAM_SPLIT,
}

/// Compression codec identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    UNCOMPRESSED,
    SNAPPY,
    GZIP,
    LZO,
    BROTLI,
    LZ4,
    ZSTD,
    LZ4_RAW,
}

/// Page type discriminant, as carried by the page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    DATA_PAGE,
    INDEX_PAGE,
    DICTIONARY_PAGE,
    DATA_PAGE_V2,
}

/// Ordering of values within a column, as reported by the file metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnOrder {
    TYPE_DEFINED_ORDER,
    UNDEFINED,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for Compression {
    type Err = ParquetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "UNCOMPRESSED" => Ok(Compression::UNCOMPRESSED),
            "SNAPPY" => Ok(Compression::SNAPPY),
            "GZIP" => Ok(Compression::GZIP),
            "LZO" => Ok(Compression::LZO),
            "BROTLI" => Ok(Compression::BROTLI),
            "LZ4" => Ok(Compression::LZ4),
            "ZSTD" => Ok(Compression::ZSTD),
            "LZ4_RAW" => Ok(Compression::LZ4_RAW),
            other => Err(general_err_display(other)),
        }
    }
}

fn general_err_display(s: &str) -> ParquetError {
    ParquetError::UnsupportedCodec(format!("unrecognized codec name: {}", s))
}

// ----------------------------------------------------------------------
// Conversions to/from the `parquet-format` Thrift-generated enums. These
// are the seam where the compact footer protocol meets this crate's own
// enums.

impl From<parquet_format::Type> for Type {
    fn from(value: parquet_format::Type) -> Self {
        match value {
            parquet_format::Type::Boolean => Type::BOOLEAN,
            parquet_format::Type::Int32 => Type::INT32,
            parquet_format::Type::Int64 => Type::INT64,
            parquet_format::Type::Int96 => Type::INT96,
            parquet_format::Type::Float => Type::FLOAT,
            parquet_format::Type::Double => Type::DOUBLE,
            parquet_format::Type::ByteArray => Type::BYTE_ARRAY,
            parquet_format::Type::FixedLenByteArray => Type::FIXED_LEN_BYTE_ARRAY,
            _ => panic!("unexpected parquet-format Type {:?}", value),
        }
    }
}

impl From<Type> for parquet_format::Type {
    fn from(value: Type) -> Self {
        match value {
            Type::BOOLEAN => parquet_format::Type::Boolean,
            Type::INT32 => parquet_format::Type::Int32,
            Type::INT64 => parquet_format::Type::Int64,
            Type::INT96 => parquet_format::Type::Int96,
            Type::FLOAT => parquet_format::Type::Float,
            Type::DOUBLE => parquet_format::Type::Double,
            Type::BYTE_ARRAY => parquet_format::Type::ByteArray,
            Type::FIXED_LEN_BYTE_ARRAY => parquet_format::Type::FixedLenByteArray,
        }
    }
}

impl From<parquet_format::FieldRepetitionType> for Repetition {
    fn from(value: parquet_format::FieldRepetitionType) -> Self {
        match value {
            parquet_format::FieldRepetitionType::Required => Repetition::REQUIRED,
            parquet_format::FieldRepetitionType::Optional => Repetition::OPTIONAL,
            parquet_format::FieldRepetitionType::Repeated => Repetition::REPEATED,
            _ => panic!("unexpected parquet-format FieldRepetitionType {:?}", value),
        }
    }
}

impl From<Repetition> for parquet_format::FieldRepetitionType {
    fn from(value: Repetition) -> Self {
        match value {
            Repetition::REQUIRED => parquet_format::FieldRepetitionType::Required,
            Repetition::OPTIONAL => parquet_format::FieldRepetitionType::Optional,
            Repetition::REPEATED => parquet_format::FieldRepetitionType::Repeated,
        }
    }
}

impl From<parquet_format::Encoding> for Encoding {
    fn from(value: parquet_format::Encoding) -> Self {
        match value {
            parquet_format::Encoding::Plain => Encoding::PLAIN,
            parquet_format::Encoding::PlainDictionary => Encoding::PLAIN_DICTIONARY,
            parquet_format::Encoding::Rle => Encoding::RLE,
            parquet_format::Encoding::BitPacked => Encoding::BIT_PACKED,
            parquet_format::Encoding::DeltaBinaryPacked => Encoding::DELTA_BINARY_PACKED,
            parquet_format::Encoding::DeltaLengthByteArray => {
                Encoding::DELTA_LENGTH_BYTE_ARRAY
            }
            parquet_format::Encoding::DeltaByteArray => Encoding::DELTA_BYTE_ARRAY,
            parquet_format::Encoding::RleDictionary => Encoding::RLE_DICTIONARY,
            parquet_format::Encoding::ByteStreamSplit => Encoding::BYTE_STREAM_SPLIT,
            _ => panic!("unexpected parquet-format Encoding {:?}", value),
        }
    }
}

impl From<Encoding> for parquet_format::Encoding {
    fn from(value: Encoding) -> Self {
        match value {
            Encoding::PLAIN => parquet_format::Encoding::Plain,
            Encoding::PLAIN_DICTIONARY => parquet_format::Encoding::PlainDictionary,
            Encoding::RLE => parquet_format::Encoding::Rle,
            Encoding::BIT_PACKED => parquet_format::Encoding::BitPacked,
            Encoding::DELTA_BINARY_PACKED => parquet_format::Encoding::DeltaBinaryPacked,
            Encoding::DELTA_LENGTH_BYTE_ARRAY => {
                parquet_format::Encoding::DeltaLengthByteArray
            }
            Encoding::DELTA_BYTE_ARRAY => parquet_format::Encoding::DeltaByteArray,
            Encoding::RLE_DICTIONARY => parquet_format::Encoding::RleDictionary,
            Encoding::BYTE_STREAM_SPLIT => parquet_format::Encoding::ByteStreamSplit,
        }
    }
}

impl From<parquet_format::CompressionCodec> for Compression {
    fn from(value: parquet_format::CompressionCodec) -> Self {
        match value {
            parquet_format::CompressionCodec::Uncompressed => Compression::UNCOMPRESSED,
            parquet_format::CompressionCodec::Snappy => Compression::SNAPPY,
            parquet_format::CompressionCodec::Gzip => Compression::GZIP,
            parquet_format::CompressionCodec::Lzo => Compression::LZO,
            parquet_format::CompressionCodec::Brotli => Compression::BROTLI,
            parquet_format::CompressionCodec::Lz4 => Compression::LZ4,
            parquet_format::CompressionCodec::Zstd => Compression::ZSTD,
            parquet_format::CompressionCodec::Lz4Raw => Compression::LZ4_RAW,
            _ => panic!("unexpected parquet-format CompressionCodec {:?}", value),
        }
    }
}

impl From<Compression> for parquet_format::CompressionCodec {
    fn from(value: Compression) -> Self {
        match value {
            Compression::UNCOMPRESSED => parquet_format::CompressionCodec::Uncompressed,
            Compression::SNAPPY => parquet_format::CompressionCodec::Snappy,
            Compression::GZIP => parquet_format::CompressionCodec::Gzip,
            Compression::LZO => parquet_format::CompressionCodec::Lzo,
            Compression::BROTLI => parquet_format::CompressionCodec::Brotli,
            Compression::LZ4 => parquet_format::CompressionCodec::Lz4,
            Compression::ZSTD => parquet_format::CompressionCodec::Zstd,
            Compression::LZ4_RAW => parquet_format::CompressionCodec::Lz4Raw,
        }
    }
}

impl From<parquet_format::PageType> for PageType {
    fn from(value: parquet_format::PageType) -> Self {
        match value {
            parquet_format::PageType::DataPage => PageType::DATA_PAGE,
            parquet_format::PageType::IndexPage => PageType::INDEX_PAGE,
            parquet_format::PageType::DictionaryPage => PageType::DICTIONARY_PAGE,
            parquet_format::PageType::DataPageV2 => PageType::DATA_PAGE_V2,
            _ => panic!("unexpected parquet-format PageType {:?}", value),
        }
    }
}

impl From<PageType> for parquet_format::PageType {
    fn from(value: PageType) -> Self {
        match value {
            PageType::DATA_PAGE => parquet_format::PageType::DataPage,
            PageType::INDEX_PAGE => parquet_format::PageType::IndexPage,
            PageType::DICTIONARY_PAGE => parquet_format::PageType::DictionaryPage,
            PageType::DATA_PAGE_V2 => parquet_format::PageType::DataPageV2,
        }
    }
}
