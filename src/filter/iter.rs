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

//! The filtering iterator: wraps the row iterator, skips
//! whole row groups using column chunk statistics before opening them, and
//! yields only the rows that satisfy the filter tree.

use crate::errors::Result;
use crate::file::reader::FileReader;
use crate::filter::{pushdown, FilterExpr};
use crate::record::{Row, RowIter};

/// Iterates the rows of `file_reader` that satisfy `expr`, skipping entire
/// row groups up front via [`pushdown::skip_row_group`] and otherwise
/// materializing a row group's rows and evaluating `expr` row by row.
pub struct FilterIter<'a> {
    file_reader: &'a dyn FileReader,
    expr: FilterExpr,
    next_group: usize,
    current: Option<RowIter<'a>>,
}

impl<'a> FilterIter<'a> {
    pub fn new(file_reader: &'a dyn FileReader, expr: FilterExpr) -> Self {
        Self {
            file_reader,
            expr,
            next_group: 0,
            current: None,
        }
    }

    /// Opens the next row group that cannot be proven empty by statistics,
    /// materializing its rows. Returns `Ok(false)` once every row group has
    /// been considered.
    fn advance_group(&mut self) -> Result<bool> {
        let schema = self.file_reader.metadata().file_metadata().schema_descr();
        while self.next_group < self.file_reader.num_row_groups() {
            let idx = self.next_group;
            self.next_group += 1;
            let rg_meta = self.file_reader.metadata().row_group(idx);
            if pushdown::skip_row_group(&self.expr, schema, rg_meta) {
                log::debug!("filter pushdown skipped row group {}", idx);
                continue;
            }
            let row_group = self.file_reader.get_row_group(idx)?;
            self.current = Some(RowIter::from_row_group(None, row_group.as_ref())?);
            return Ok(true);
        }
        Ok(false)
    }
}

impl<'a> Iterator for FilterIter<'a> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Result<Row>> {
        loop {
            if let Some(iter) = self.current.as_mut() {
                match iter.next() {
                    Some(row) => {
                        if self.expr.matches(&row) {
                            return Some(Ok(row));
                        }
                        continue;
                    }
                    None => self.current = None,
                }
            }
            match self.advance_group() {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Compression, Encoding, Repetition};
    use crate::data_type::Int32Type;
    use crate::file::serialized_reader::SerializedFileReader;
    use crate::filter::{ColumnFilter, Join, Predicate};
    use crate::record::RowAccessor;
    use crate::schema::types::{SchemaDescriptor, Type as SchemaType};
    use crate::util::test_common::{make_column_chunk_bytes, DataPageBuilder, DataPageBuilderImpl};
    use std::sync::Arc;

    fn make_id_file(values: Vec<i32>) -> Vec<u8> {
        let field = SchemaType::primitive_type_builder("id", crate::basic::Type::INT32)
            .with_repetition(Repetition::REQUIRED)
            .build()
            .unwrap();
        let schema = SchemaType::group_type_builder("schema")
            .with_fields(&mut vec![Arc::new(field)])
            .build()
            .unwrap();
        let descr = Arc::new(SchemaDescriptor::new(Arc::new(schema)));
        let col = descr.column(0);
        let mut builder = DataPageBuilderImpl::new(col.clone(), values.len() as u32, true);
        builder.add_values::<Int32Type>(Encoding::PLAIN, &values);
        let page = builder.consume();
        make_column_chunk_bytes(&descr, Compression::UNCOMPRESSED, vec![page])
    }

    #[test]
    fn test_filter_iter_yields_matching_rows_only() {
        let bytes = make_id_file(vec![0, 1, 2, 3, 4, 5, 6, 7]);
        let reader = SerializedFileReader::new(bytes::Bytes::from(bytes)).unwrap();

        let expr = FilterExpr::Predicate(ColumnFilter {
            column: "id".to_owned(),
            map_key: None,
            predicate: Predicate::LessThan(3i32.into()),
        });
        let rows: Result<Vec<Row>> = FilterIter::new(&reader, expr).collect();
        let rows = rows.unwrap();
        assert_eq!(rows.len(), 3);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.get_int(0).unwrap(), i as i32);
        }
    }

    #[test]
    fn test_filter_iter_any_of_two_equals() {
        let bytes = make_id_file(vec![0, 1, 2, 3, 4, 5, 6, 7]);
        let reader = SerializedFileReader::new(bytes::Bytes::from(bytes)).unwrap();

        let expr = FilterExpr::Set(
            Join::Any,
            vec![
                FilterExpr::Predicate(ColumnFilter {
                    column: "id".to_owned(),
                    map_key: None,
                    predicate: Predicate::Equal(0i32.into()),
                }),
                FilterExpr::Predicate(ColumnFilter {
                    column: "id".to_owned(),
                    map_key: None,
                    predicate: Predicate::Equal(7i32.into()),
                }),
            ],
        );
        let rows: Vec<Row> = FilterIter::new(&reader, expr).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_filter_iter_all_range() {
        let bytes = make_id_file(vec![0, 1, 2, 3, 4, 5, 6, 7]);
        let reader = SerializedFileReader::new(bytes::Bytes::from(bytes)).unwrap();

        let expr = FilterExpr::Set(
            Join::All,
            vec![
                FilterExpr::Predicate(ColumnFilter {
                    column: "id".to_owned(),
                    map_key: None,
                    predicate: Predicate::GreaterThanOrEqual(3i32.into()),
                }),
                FilterExpr::Predicate(ColumnFilter {
                    column: "id".to_owned(),
                    map_key: None,
                    predicate: Predicate::LessThanOrEqual(6i32.into()),
                }),
            ],
        );
        let rows: Vec<Row> = FilterIter::new(&reader, expr).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(rows.len(), 4);
    }
}
