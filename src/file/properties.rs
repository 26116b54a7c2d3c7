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

//! Writer configuration: default codec/encoding, row-group
//! and page size thresholds, dictionary-encoding enablement, with optional
//! per-column overrides. Mirrors the builder idiom `file::serialized_reader`
//! uses for `ReadOptions`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::basic::{Compression, Encoding};
use crate::schema::types::ColumnPath;

pub const DEFAULT_PAGE_SIZE: usize = 1024 * 1024;
pub const DEFAULT_MAX_ROW_GROUP_SIZE: usize = 128 * 1024 * 1024;
pub const DEFAULT_WRITE_BATCH_SIZE: usize = 1024;
pub const DEFAULT_DICTIONARY_ENABLED: bool = true;
pub const DEFAULT_COMPRESSION: Compression = Compression::UNCOMPRESSED;
pub const DEFAULT_ENCODING: Encoding = Encoding::PLAIN;

pub type WriterPropertiesPtr = Arc<WriterProperties>;

#[derive(Debug, Clone, Default)]
struct ColumnProperties {
    encoding: Option<Encoding>,
    compression: Option<Compression>,
    dictionary_enabled: Option<bool>,
}

/// Immutable, shareable writer configuration, built via
/// `WriterPropertiesBuilder`.
#[derive(Debug, Clone)]
pub struct WriterProperties {
    data_page_size_limit: usize,
    max_row_group_size: usize,
    write_batch_size: usize,
    dictionary_enabled: bool,
    compression: Compression,
    encoding: Option<Encoding>,
    column_properties: HashMap<ColumnPath, ColumnProperties>,
    created_by: String,
}

impl WriterProperties {
    pub fn builder() -> WriterPropertiesBuilder {
        WriterPropertiesBuilder::with_defaults()
    }

    pub fn data_page_size_limit(&self) -> usize {
        self.data_page_size_limit
    }

    pub fn max_row_group_size(&self) -> usize {
        self.max_row_group_size
    }

    pub fn write_batch_size(&self) -> usize {
        self.write_batch_size
    }

    pub fn dictionary_enabled(&self, col: &ColumnPath) -> bool {
        self.column_properties
            .get(col)
            .and_then(|p| p.dictionary_enabled)
            .unwrap_or(self.dictionary_enabled)
    }

    pub fn compression(&self, col: &ColumnPath) -> Compression {
        self.column_properties
            .get(col)
            .and_then(|p| p.compression)
            .unwrap_or(self.compression)
    }

    /// The encoding to use for values once the dictionary fallback (if any)
    /// is disabled. `None` means "let the writer choose a default given the
    /// physical type" (PLAIN, except BOOLEAN which is always PLAIN as well
    /// since RLE offers no benefit there).
    pub fn encoding(&self, col: &ColumnPath) -> Option<Encoding> {
        self.column_properties
            .get(col)
            .and_then(|p| p.encoding)
            .or(self.encoding)
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }
}

/// Builds a `WriterProperties`, following the same builder-pattern
/// convention as `PrimitiveTypeBuilder`/`GroupTypeBuilder` in `schema::types`.
pub struct WriterPropertiesBuilder {
    data_page_size_limit: usize,
    max_row_group_size: usize,
    write_batch_size: usize,
    dictionary_enabled: bool,
    compression: Compression,
    encoding: Option<Encoding>,
    column_properties: HashMap<ColumnPath, ColumnProperties>,
    created_by: String,
}

impl WriterPropertiesBuilder {
    fn with_defaults() -> Self {
        Self {
            data_page_size_limit: DEFAULT_PAGE_SIZE,
            max_row_group_size: DEFAULT_MAX_ROW_GROUP_SIZE,
            write_batch_size: DEFAULT_WRITE_BATCH_SIZE,
            dictionary_enabled: DEFAULT_DICTIONARY_ENABLED,
            compression: DEFAULT_COMPRESSION,
            encoding: None,
            column_properties: HashMap::new(),
            created_by: "parquet-core".to_owned(),
        }
    }

    pub fn build(self) -> WriterProperties {
        WriterProperties {
            data_page_size_limit: self.data_page_size_limit,
            max_row_group_size: self.max_row_group_size,
            write_batch_size: self.write_batch_size,
            dictionary_enabled: self.dictionary_enabled,
            compression: self.compression,
            encoding: self.encoding,
            column_properties: self.column_properties,
            created_by: self.created_by,
        }
    }

    pub fn set_data_page_size_limit(mut self, value: usize) -> Self {
        self.data_page_size_limit = value;
        self
    }

    pub fn set_max_row_group_size(mut self, value: usize) -> Self {
        self.max_row_group_size = value;
        self
    }

    pub fn set_write_batch_size(mut self, value: usize) -> Self {
        self.write_batch_size = value;
        self
    }

    pub fn set_dictionary_enabled(mut self, enabled: bool) -> Self {
        self.dictionary_enabled = enabled;
        self
    }

    pub fn set_compression(mut self, codec: Compression) -> Self {
        self.compression = codec;
        self
    }

    pub fn set_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn set_created_by(mut self, created_by: String) -> Self {
        self.created_by = created_by;
        self
    }

    pub fn set_column_dictionary_enabled(mut self, col: ColumnPath, enabled: bool) -> Self {
        self.column_properties.entry(col).or_default().dictionary_enabled = Some(enabled);
        self
    }

    pub fn set_column_compression(mut self, col: ColumnPath, codec: Compression) -> Self {
        self.column_properties.entry(col).or_default().compression = Some(codec);
        self
    }

    pub fn set_column_encoding(mut self, col: ColumnPath, encoding: Encoding) -> Self {
        self.column_properties.entry(col).or_default().encoding = Some(encoding);
        self
    }
}

impl Default for WriterPropertiesBuilder {
    fn default() -> Self {
        Self::with_defaults()
    }
}
