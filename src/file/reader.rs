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

//! Reader-side traits for the row-group pipeline:
//! `ChunkReader` abstracts random reads into a byte-addressed store,
//! `FileReader`/`RowGroupReader` expose the row-group/page walk.

use std::io::Read;

use crate::column::page::PageReader;
use crate::errors::Result;
use crate::file::metadata::ParquetMetaData;
use crate::record::RowIter;
use crate::schema::types::Type as SchemaType;

/// The length of the underlying byte source, in bytes.
pub trait Length {
    fn len(&self) -> u64;
}

/// Random-read access into a byte-addressed store. Implemented for `File`
/// and in-memory `bytes::Bytes` by `file::serialized_reader`.
pub trait ChunkReader: Length + Send + Sync {
    type T: Read + Send;

    fn get_read(&self, start: u64, length: usize) -> Result<Self::T>;
}

/// A Parquet file opened for reading: exposes file-level metadata and one
/// `RowGroupReader` per row group.
pub trait FileReader {
    fn metadata(&self) -> &ParquetMetaData;

    fn num_row_groups(&self) -> usize;

    fn get_row_group(&self, i: usize) -> Result<Box<dyn RowGroupReader + '_>>;

    /// A row iterator over every row group, in order, optionally projected
    /// to a subset of the schema.
    fn get_row_iter(&self, projection: Option<SchemaType>) -> Result<RowIter>;
}

/// A single row group's column chunks.
pub trait RowGroupReader {
    fn metadata(&self) -> &crate::file::metadata::RowGroupMetaData;

    fn num_columns(&self) -> usize;

    /// Lower-level access to the page sequence for column `i`.
    fn get_column_page_reader(&self, i: usize) -> Result<Box<dyn PageReader>>;

    fn get_row_iter(&self, projection: Option<SchemaType>) -> Result<RowIter>;
}
