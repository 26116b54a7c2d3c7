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

//! A self-contained reader and writer for the Apache Parquet columnar file
//! format: footer metadata, page framing, the RLE/bit-packed hybrid and
//! delta/byte-stream-split value encodings, dictionary expansion,
//! compression codec dispatch, Dremel-style nested row assembly, and
//! statistics-driven predicate pushdown, plus the writer-side counterpart of
//! each.
//!
//! The crate is organized the way the on-disk format itself is layered:
//!
//! - [`basic`] — wire-level enums (physical type, encoding, compression, ...)
//! - [`schema`] — the nested group/primitive type tree and its leaf flattening
//! - [`file`] — footer codec, typed metadata, and the `FileReader`/`FileWriter` entry points
//! - [`column`] — per-column page streams, readers and writers
//! - [`encodings`] — level and value encodings
//! - [`compression`] — codec dispatch over the supported compression backends
//! - [`record`] — nested row assembly over a projected schema
//! - [`filter`] — row-level predicates with statistics-based row-group pushdown

pub mod basic;
pub mod column;
pub mod compression;
pub mod data_type;
pub mod encodings;
pub mod errors;
pub mod file;
pub mod filter;
pub mod record;
pub mod schema;
pub mod util;

pub use errors::{ParquetError, Result};
