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

//! Typed in-memory metadata structures:
//! `FileMetaData`, `RowGroupMetaData`, `ColumnChunkMetaData`, `Statistics`.
//! These are the decoded form of the footer's compact record tree, built by
//! `file::footer` and consumed by `file::serialized_reader`.

use std::sync::Arc;

use crate::basic::{Compression, ColumnOrder, Encoding, Type as PhysicalType};
use crate::schema::types::{ColumnDescPtr, ColumnPath, SchemaDescriptor, Type as SchemaType};

/// Per-column min/max/null_count, interpreted as opaque bytes typed by the
/// leaf's physical type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Statistics {
    pub min: Option<Vec<u8>>,
    pub max: Option<Vec<u8>>,
    pub null_count: Option<i64>,
    pub distinct_count: Option<i64>,
    pub is_min_value_exact: bool,
    pub is_max_value_exact: bool,
}

impl Statistics {
    pub fn has_min_max_set(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }
}

/// Maps a decoded `parquet_format::Statistics` into our own type, given the
/// column's physical type (statistics bytes are opaque and interpreted the
/// same way regardless of type, so `physical_type` is accepted for
/// signature symmetry with the encode direction but not otherwise needed
/// here).
pub fn from_thrift(
    _physical_type: PhysicalType,
    stats: Option<parquet_format::Statistics>,
) -> Option<Statistics> {
    stats.map(|s| Statistics {
        min: s.min_value.or(s.min),
        max: s.max_value.or(s.max),
        null_count: s.null_count,
        distinct_count: s.distinct_count,
        is_min_value_exact: s.is_min_value_exact.unwrap_or(true),
        is_max_value_exact: s.is_max_value_exact.unwrap_or(true),
    })
}

pub fn to_thrift(stats: &Statistics) -> parquet_format::Statistics {
    parquet_format::Statistics {
        min: stats.min.clone(),
        max: stats.max.clone(),
        null_count: stats.null_count,
        distinct_count: stats.distinct_count,
        min_value: stats.min.clone(),
        max_value: stats.max.clone(),
        is_max_value_exact: Some(stats.is_max_value_exact),
        is_min_value_exact: Some(stats.is_min_value_exact),
    }
}

/// Decoded `ColumnMetaData` for one column chunk.
#[derive(Debug, Clone)]
pub struct ColumnChunkMetaData {
    column_descr: ColumnDescPtr,
    encodings: Vec<Encoding>,
    path: ColumnPath,
    codec: Compression,
    num_values: i64,
    compressed_size: i64,
    uncompressed_size: i64,
    data_page_offset: i64,
    dictionary_page_offset: Option<i64>,
    statistics: Option<Statistics>,
    file_offset: i64,
}

impl ColumnChunkMetaData {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        column_descr: ColumnDescPtr,
        encodings: Vec<Encoding>,
        path: ColumnPath,
        codec: Compression,
        num_values: i64,
        compressed_size: i64,
        uncompressed_size: i64,
        data_page_offset: i64,
        dictionary_page_offset: Option<i64>,
        statistics: Option<Statistics>,
        file_offset: i64,
    ) -> Self {
        Self {
            column_descr,
            encodings,
            path,
            codec,
            num_values,
            compressed_size,
            uncompressed_size,
            data_page_offset,
            dictionary_page_offset,
            statistics,
            file_offset,
        }
    }

    pub fn column_descr(&self) -> &ColumnDescPtr {
        &self.column_descr
    }

    pub fn column_path(&self) -> &ColumnPath {
        &self.path
    }

    pub fn encodings(&self) -> &[Encoding] {
        &self.encodings
    }

    pub fn compression(&self) -> Compression {
        self.codec
    }

    pub fn num_values(&self) -> i64 {
        self.num_values
    }

    pub fn compressed_size(&self) -> i64 {
        self.compressed_size
    }

    pub fn uncompressed_size(&self) -> i64 {
        self.uncompressed_size
    }

    pub fn data_page_offset(&self) -> i64 {
        self.data_page_offset
    }

    pub fn dictionary_page_offset(&self) -> Option<i64> {
        self.dictionary_page_offset
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    pub fn file_offset(&self) -> i64 {
        self.file_offset
    }

    /// `(start, length)` of this chunk's bytes within the file, starting at
    /// whichever of the dictionary/data page offsets comes first.
    pub fn byte_range(&self) -> (u64, u64) {
        let start = match self.dictionary_page_offset {
            Some(off) if off < self.data_page_offset => off,
            _ => self.data_page_offset,
        };
        (start as u64, self.compressed_size as u64)
    }
}

/// Decoded `RowGroup`.
#[derive(Debug, Clone)]
pub struct RowGroupMetaData {
    columns: Vec<ColumnChunkMetaData>,
    num_rows: i64,
    total_byte_size: i64,
    schema_descr: Arc<SchemaDescriptor>,
}

impl RowGroupMetaData {
    pub fn new(
        columns: Vec<ColumnChunkMetaData>,
        num_rows: i64,
        total_byte_size: i64,
        schema_descr: Arc<SchemaDescriptor>,
    ) -> Self {
        Self {
            columns,
            num_rows,
            total_byte_size,
            schema_descr,
        }
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, i: usize) -> &ColumnChunkMetaData {
        &self.columns[i]
    }

    pub fn columns(&self) -> &[ColumnChunkMetaData] {
        &self.columns
    }

    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    pub fn total_byte_size(&self) -> i64 {
        self.total_byte_size
    }

    pub fn schema_descr(&self) -> &SchemaDescriptor {
        &self.schema_descr
    }
}

/// Decoded `FileMetaData`.
#[derive(Debug, Clone)]
pub struct FileMetaData {
    version: i32,
    num_rows: i64,
    created_by: Option<String>,
    key_value_metadata: Option<Vec<(String, Option<String>)>>,
    schema_descr: Arc<SchemaDescriptor>,
    column_orders: Option<Vec<ColumnOrder>>,
}

impl FileMetaData {
    pub fn new(
        version: i32,
        num_rows: i64,
        created_by: Option<String>,
        key_value_metadata: Option<Vec<(String, Option<String>)>>,
        schema_descr: Arc<SchemaDescriptor>,
        column_orders: Option<Vec<ColumnOrder>>,
    ) -> Self {
        Self {
            version,
            num_rows,
            created_by,
            key_value_metadata,
            schema_descr,
            column_orders,
        }
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn key_value_metadata(&self) -> Option<&Vec<(String, Option<String>)>> {
        self.key_value_metadata.as_ref()
    }

    pub fn schema(&self) -> &SchemaType {
        self.schema_descr.root_schema()
    }

    pub fn schema_descr(&self) -> &SchemaDescriptor {
        &self.schema_descr
    }

    pub fn schema_descr_ptr(&self) -> Arc<SchemaDescriptor> {
        self.schema_descr.clone()
    }

    pub fn column_order(&self, i: usize) -> ColumnOrder {
        self.column_orders
            .as_ref()
            .and_then(|orders| orders.get(i).copied())
            .unwrap_or(ColumnOrder::UNDEFINED)
    }

    pub fn column_orders(&self) -> Option<&Vec<ColumnOrder>> {
        self.column_orders.as_ref()
    }
}

/// The file-level view combining `FileMetaData` and the (possibly
/// predicate-filtered) list of row groups, as returned by
/// `FileReader::metadata`.
#[derive(Debug, Clone)]
pub struct ParquetMetaData {
    file_metadata: FileMetaData,
    row_groups: Vec<RowGroupMetaData>,
}

impl ParquetMetaData {
    pub fn new(file_metadata: FileMetaData, row_groups: Vec<RowGroupMetaData>) -> Self {
        Self {
            file_metadata,
            row_groups,
        }
    }

    pub fn file_metadata(&self) -> &FileMetaData {
        &self.file_metadata
    }

    pub fn num_row_groups(&self) -> usize {
        self.row_groups.len()
    }

    pub fn row_group(&self, i: usize) -> &RowGroupMetaData {
        &self.row_groups[i]
    }

    pub fn row_groups(&self) -> &[RowGroupMetaData] {
        &self.row_groups
    }
}
