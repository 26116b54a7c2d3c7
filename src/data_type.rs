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

//! Physical-type-level data model: one marker struct per Parquet physical
//! type, each with an associated Rust value representation `T`. Generic
//! encoder/decoder/writer/reader code is written once against `DataType`
//! and monomorphized per marker, the same shape
//! `column::reader::ColumnReaderImpl<T>` is instantiated against.

use std::cmp::Ordering;
use std::fmt;

use crate::basic::Type as PhysicalType;
use crate::column::reader::{ColumnReader, ColumnReaderImpl};
use crate::column::writer::{ColumnWriter, ColumnWriterImpl};

/// A 12-byte legacy timestamp value. Decoded but otherwise treated as an
/// opaque value (INT96 is legacy-only).
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct Int96 {
    value: [u32; 3],
}

impl Int96 {
    pub fn new(elem0: u32, elem1: u32, elem2: u32) -> Self {
        Self {
            value: [elem0, elem1, elem2],
        }
    }

    pub fn data(&self) -> &[u32; 3] {
        &self.value
    }

    pub fn set_data(&mut self, elem0: u32, elem1: u32, elem2: u32) {
        self.value = [elem0, elem1, elem2];
    }
}

impl fmt::Debug for Int96 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Int96 {{ {:?} }}", self.value)
    }
}

impl PartialOrd for Int96 {
    fn partial_cmp(&self, other: &Int96) -> Option<Ordering> {
        Some(self.value.cmp(&other.value))
    }
}

/// A length-prefixed variable-length byte sequence (BYTE_ARRAY) or a
/// fixed-length one sized by the schema (FIXED_LEN_BYTE_ARRAY); both share
/// this representation because the physical bytes are identical once the
/// length is known.
#[derive(Clone, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ByteArray {
    data: Vec<u8>,
}

impl ByteArray {
    pub fn new(data: Vec<u8>) -> Self {
        ByteArray { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn as_utf8(&self) -> crate::errors::Result<&str> {
        Ok(std::str::from_utf8(self.data.as_slice())?)
    }
}

impl AsRef<[u8]> for ByteArray {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for ByteArray {
    fn from(data: Vec<u8>) -> Self {
        ByteArray::new(data)
    }
}

impl From<&str> for ByteArray {
    fn from(s: &str) -> Self {
        ByteArray::new(s.as_bytes().to_vec())
    }
}

impl fmt::Debug for ByteArray {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ByteArray {{ data: {:?} }}", self.data)
    }
}

/// A FIXED_LEN_BYTE_ARRAY is indistinguishable in memory from a `ByteArray`;
/// the fixed width lives in the schema, not in the value.
pub type FixedLenByteArray = ByteArray;

/// One marker struct per physical type, each implementing `DataType`. This
/// sum-type-over-markers shape keeps a runtime type discriminant from
/// leaking into the value layer: the discriminant only exists at the
/// `ColumnReader`/`ColumnWriter` enum boundary, never inside the generic
/// decode path.
pub trait DataType: 'static + Send {
    type T: std::fmt::Debug + Clone + Default + PartialEq + Send;

    fn get_physical_type() -> PhysicalType;

    fn get_type_size() -> usize;

    fn get_column_reader(column_reader: ColumnReader) -> Option<ColumnReaderImpl<Self>>
    where
        Self: Sized;

    fn get_column_reader_ref(column_reader: &mut ColumnReader) -> Option<&mut ColumnReaderImpl<Self>>
    where
        Self: Sized;

    fn get_column_writer(column_writer: ColumnWriter) -> Option<ColumnWriterImpl<Self>>
    where
        Self: Sized;

    fn get_column_writer_ref(column_writer: &mut ColumnWriter) -> Option<&mut ColumnWriterImpl<Self>>
    where
        Self: Sized;
}

macro_rules! make_type {
    ($name:ident, $reader_variant:ident, $writer_variant:ident, $native_ty:ty, $physical_ty:expr, $size:expr) => {
        #[derive(Clone)]
        pub struct $name {}

        impl DataType for $name {
            type T = $native_ty;

            fn get_physical_type() -> PhysicalType {
                $physical_ty
            }

            fn get_type_size() -> usize {
                $size
            }

            fn get_column_reader(column_reader: ColumnReader) -> Option<ColumnReaderImpl<Self>> {
                match column_reader {
                    ColumnReader::$reader_variant(typed) => Some(typed),
                    _ => None,
                }
            }

            fn get_column_reader_ref(
                column_reader: &mut ColumnReader,
            ) -> Option<&mut ColumnReaderImpl<Self>> {
                match column_reader {
                    ColumnReader::$reader_variant(typed) => Some(typed),
                    _ => None,
                }
            }

            fn get_column_writer(column_writer: ColumnWriter) -> Option<ColumnWriterImpl<Self>> {
                match column_writer {
                    ColumnWriter::$writer_variant(typed) => Some(typed),
                    _ => None,
                }
            }

            fn get_column_writer_ref(
                column_writer: &mut ColumnWriter,
            ) -> Option<&mut ColumnWriterImpl<Self>> {
                match column_writer {
                    ColumnWriter::$writer_variant(typed) => Some(typed),
                    _ => None,
                }
            }
        }
    };
}

make_type!(BoolType, BoolColumnReader, BoolColumnWriter, bool, PhysicalType::BOOLEAN, 1);
make_type!(Int32Type, Int32ColumnReader, Int32ColumnWriter, i32, PhysicalType::INT32, 4);
make_type!(Int64Type, Int64ColumnReader, Int64ColumnWriter, i64, PhysicalType::INT64, 8);
make_type!(Int96Type, Int96ColumnReader, Int96ColumnWriter, Int96, PhysicalType::INT96, 12);
make_type!(FloatType, FloatColumnReader, FloatColumnWriter, f32, PhysicalType::FLOAT, 4);
make_type!(DoubleType, DoubleColumnReader, DoubleColumnWriter, f64, PhysicalType::DOUBLE, 8);
make_type!(
    ByteArrayType,
    ByteArrayColumnReader,
    ByteArrayColumnWriter,
    ByteArray,
    PhysicalType::BYTE_ARRAY,
    0
);
make_type!(
    FixedLenByteArrayType,
    FixedLenByteArrayColumnReader,
    FixedLenByteArrayColumnWriter,
    FixedLenByteArray,
    PhysicalType::FIXED_LEN_BYTE_ARRAY,
    0
);

/// Bytes-as-slice view over fixed-width native values, used by PLAIN and
/// BYTE_STREAM_SPLIT encode/decode paths that operate on raw little-endian
/// lanes rather than per-value parsing.
pub trait AsBytes {
    fn as_bytes(&self) -> &[u8];
}

macro_rules! impl_as_bytes_le {
    ($ty:ty) => {
        impl AsBytes for $ty {
            fn as_bytes(&self) -> &[u8] {
                unsafe {
                    std::slice::from_raw_parts(
                        self as *const $ty as *const u8,
                        std::mem::size_of::<$ty>(),
                    )
                }
            }
        }
    };
}

impl_as_bytes_le!(i32);
impl_as_bytes_le!(i64);
impl_as_bytes_le!(f32);
impl_as_bytes_le!(f64);

impl AsBytes for bool {
    fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self as *const bool as *const u8, 1) }
    }
}

impl AsBytes for Int96 {
    fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.value.as_ptr() as *const u8, 12) }
    }
}

impl AsBytes for ByteArray {
    fn as_bytes(&self) -> &[u8] {
        self.data.as_slice()
    }
}

impl AsBytes for [u8] {
    fn as_bytes(&self) -> &[u8] {
        self
    }
}

/// Per-value PLAIN encode/decode, implemented once per
/// concrete Rust value type rather than per `DataType` marker, since
/// `ByteArrayType` and `FixedLenByteArrayType` share the same value
/// representation but differ in how much of the buffer one value occupies.
pub trait ParquetValueType: Clone + Default + std::fmt::Debug + PartialEq + Send + 'static {
    /// Decodes one PLAIN-encoded value from the front of `data`, given the
    /// schema-declared fixed length (only meaningful for
    /// FIXED_LEN_BYTE_ARRAY). Returns the value and the number of bytes
    /// consumed.
    fn read_plain(data: &[u8], type_length: i32) -> crate::errors::Result<(Self, usize)>;

    /// Appends the PLAIN encoding of `self` to `out`.
    fn write_plain(&self, out: &mut Vec<u8>);

    /// Widens a DELTA_BINARY_PACKED-reconstructed `i64` back to this type.
    /// Only meaningful for `i32`/`i64`, the two physical types that stream
    /// uses; other implementors never have this called.
    fn from_i64(_v: i64) -> Self {
        panic!("from_i64 is only valid for INT32/INT64 value types")
    }

    /// Narrows this value to `i64` for the DELTA_BINARY_PACKED encoder.
    /// Only meaningful for `i32`/`i64`.
    fn to_i64(&self) -> i64 {
        panic!("to_i64 is only valid for INT32/INT64 value types")
    }

    /// Extracts the single bit this value represents. Only meaningful for
    /// the BOOLEAN physical type's own value type, `bool`.
    fn as_plain_bool(&self) -> bool {
        panic!("as_plain_bool is only valid for the BOOLEAN value type")
    }
}

macro_rules! impl_parquet_value_fixed_width {
    ($ty:ty, $size:expr, $from_i64:expr, $to_i64:expr) => {
        impl ParquetValueType for $ty {
            fn read_plain(data: &[u8], _type_length: i32) -> crate::errors::Result<(Self, usize)> {
                if data.len() < $size {
                    return Err(crate::errors::ParquetError::TruncatedInput(format!(
                        "expected {} bytes, found {}",
                        $size,
                        data.len()
                    )));
                }
                Ok((crate::util::bit_util::read_num_bytes!($ty, $size, data), $size))
            }

            fn write_plain(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(self.as_bytes());
            }

            fn from_i64(v: i64) -> Self {
                let f = $from_i64;
                f(v)
            }

            fn to_i64(&self) -> i64 {
                let f = $to_i64;
                f(*self)
            }
        }
    };
}

impl_parquet_value_fixed_width!(i32, 4, |v: i64| v as i32, |v: i32| v as i64);
impl_parquet_value_fixed_width!(i64, 8, |v: i64| v, |v: i64| v);
impl_parquet_value_fixed_width!(
    f32,
    4,
    |_v: i64| panic!("from_i64 is only valid for INT32/INT64 value types"),
    |_v: f32| panic!("to_i64 is only valid for INT32/INT64 value types")
);
impl_parquet_value_fixed_width!(
    f64,
    8,
    |_v: i64| panic!("from_i64 is only valid for INT32/INT64 value types"),
    |_v: f64| panic!("to_i64 is only valid for INT32/INT64 value types")
);

impl ParquetValueType for bool {
    fn read_plain(data: &[u8], _type_length: i32) -> crate::errors::Result<(Self, usize)> {
        // BOOLEAN PLAIN is bit-packed across the whole value buffer rather
        // than one byte per value, so normal decode goes through the
        // dedicated `PlainDecoder::get_bool` path instead of this method.
        Ok((data.first().copied().unwrap_or(0) & 1 != 0, 0))
    }

    fn write_plain(&self, _out: &mut Vec<u8>) {}

    fn as_plain_bool(&self) -> bool {
        *self
    }
}

impl ParquetValueType for Int96 {
    fn read_plain(data: &[u8], _type_length: i32) -> crate::errors::Result<(Self, usize)> {
        if data.len() < 12 {
            return Err(crate::errors::ParquetError::TruncatedInput(
                "expected 12 bytes for INT96".to_owned(),
            ));
        }
        let a = crate::util::bit_util::read_num_bytes!(u32, 4, &data[0..4]);
        let b = crate::util::bit_util::read_num_bytes!(u32, 4, &data[4..8]);
        let c = crate::util::bit_util::read_num_bytes!(u32, 4, &data[8..12]);
        Ok((Int96::new(a, b, c), 12))
    }

    fn write_plain(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }
}

impl ParquetValueType for ByteArray {
    fn read_plain(data: &[u8], type_length: i32) -> crate::errors::Result<(Self, usize)> {
        if type_length >= 0 {
            let len = type_length as usize;
            if data.len() < len {
                return Err(crate::errors::ParquetError::TruncatedInput(format!(
                    "expected {} bytes for FIXED_LEN_BYTE_ARRAY, found {}",
                    len,
                    data.len()
                )));
            }
            Ok((ByteArray::new(data[..len].to_vec()), len))
        } else {
            if data.len() < 4 {
                return Err(crate::errors::ParquetError::TruncatedInput(
                    "expected 4-byte length prefix".to_owned(),
                ));
            }
            let len = crate::util::bit_util::read_num_bytes!(u32, 4, data) as usize;
            if data.len() < 4 + len {
                return Err(crate::errors::ParquetError::TruncatedInput(format!(
                    "expected {} bytes of BYTE_ARRAY payload, found {}",
                    len,
                    data.len() - 4
                )));
            }
            Ok((ByteArray::new(data[4..4 + len].to_vec()), 4 + len))
        }
    }

    fn write_plain(&self, out: &mut Vec<u8>) {
        // Length-prefixed BYTE_ARRAY framing; FIXED_LEN_BYTE_ARRAY writers
        // call `data()` directly instead of through this trait (see
        // `column::writer`), since the prefix is implied by the schema.
        out.extend_from_slice(&(self.len() as u32).to_le_bytes());
        out.extend_from_slice(self.data());
    }
}
