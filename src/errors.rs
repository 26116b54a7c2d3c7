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

//! Common Parquet errors and macros.

use std::error::Error;
use std::fmt;
use std::result;

/// Set of errors that can be produced during Parquet codec operations.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ParquetError {
    /// The footer's leading or trailing magic bytes were not "PAR1".
    NotAParquetFile(String),
    /// The footer length field or the encoded metadata record tree was malformed.
    CorruptFooter(String),
    /// The file declares a format version this crate does not implement.
    UnsupportedVersion(String),
    /// The compression codec id is not implemented.
    UnsupportedCodec(String),
    /// The value or level encoding is not implemented.
    UnsupportedEncoding(String),
    /// A read ran past the end of the available bytes.
    TruncatedInput(String),
    /// A page's declared size did not match the bytes available for it.
    TruncatedPage(String),
    /// The decoded repetition/definition level count did not match the page header.
    BadLevelCount(String),
    /// The decoded value count did not match the expected non-null count.
    BadValueCount(String),
    /// A compression codec failed to decode or encode its input.
    CodecError(String),
    /// A varint consumed more than 10 bytes without a terminator.
    VarintOverflow,
    /// A decoder was asked to produce a type incompatible with the physical type.
    TypeMismatch(String),
    /// The schema tree is ill-formed, or its leaves cannot be reassembled.
    SchemaError(String),
    /// Catch-all for invariant violations not covered by a more specific kind.
    General(String),
    /// Wraps an underlying I/O failure.
    IoError(String),
    /// A feature is known but intentionally unimplemented.
    NYI(String),
}

impl fmt::Display for ParquetError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParquetError::NotAParquetFile(message) => {
                write!(fmt, "Not a Parquet file: {}", message)
            }
            ParquetError::CorruptFooter(message) => write!(fmt, "Corrupt footer: {}", message),
            ParquetError::UnsupportedVersion(message) => {
                write!(fmt, "Unsupported version: {}", message)
            }
            ParquetError::UnsupportedCodec(message) => {
                write!(fmt, "Unsupported codec: {}", message)
            }
            ParquetError::UnsupportedEncoding(message) => {
                write!(fmt, "Unsupported encoding: {}", message)
            }
            ParquetError::TruncatedInput(message) => write!(fmt, "Truncated input: {}", message),
            ParquetError::TruncatedPage(message) => write!(fmt, "Truncated page: {}", message),
            ParquetError::BadLevelCount(message) => write!(fmt, "Bad level count: {}", message),
            ParquetError::BadValueCount(message) => write!(fmt, "Bad value count: {}", message),
            ParquetError::CodecError(message) => write!(fmt, "Codec error: {}", message),
            ParquetError::VarintOverflow => write!(fmt, "Varint overflow"),
            ParquetError::TypeMismatch(message) => write!(fmt, "Type mismatch: {}", message),
            ParquetError::SchemaError(message) => write!(fmt, "Schema error: {}", message),
            ParquetError::General(message) => write!(fmt, "Parquet error: {}", message),
            ParquetError::IoError(message) => write!(fmt, "IO error: {}", message),
            ParquetError::NYI(message) => write!(fmt, "Not yet implemented: {}", message),
        }
    }
}

impl Error for ParquetError {}

impl From<std::io::Error> for ParquetError {
    fn from(e: std::io::Error) -> ParquetError {
        ParquetError::IoError(format!("{}", e))
    }
}

impl From<std::str::Utf8Error> for ParquetError {
    fn from(e: std::str::Utf8Error) -> ParquetError {
        ParquetError::General(format!("underlying UTF-8 error: {}", e))
    }
}

impl From<std::string::FromUtf8Error> for ParquetError {
    fn from(e: std::string::FromUtf8Error) -> ParquetError {
        ParquetError::General(format!("underlying UTF-8 error: {}", e))
    }
}

impl From<thrift::Error> for ParquetError {
    fn from(e: thrift::Error) -> ParquetError {
        ParquetError::CorruptFooter(format!("underlying Thrift error: {}", e))
    }
}

/// A specialized `Result` for Parquet operations.
pub type Result<T, E = ParquetError> = result::Result<T, E>;

// Convenient macros for different kinds of errors.

#[macro_export]
macro_rules! general_err {
    ($fmt:expr) => ($crate::errors::ParquetError::General($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => ($crate::errors::ParquetError::General(format!($fmt, $($args),*)));
}

#[macro_export]
macro_rules! eof_err {
    ($fmt:expr) => ($crate::errors::ParquetError::TruncatedInput($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => ($crate::errors::ParquetError::TruncatedInput(format!($fmt, $($args),*)));
}

#[macro_export]
macro_rules! nyi_err {
    ($fmt:expr) => ($crate::errors::ParquetError::NYI($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => ($crate::errors::ParquetError::NYI(format!($fmt, $($args),*)));
}
