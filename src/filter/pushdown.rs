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

//! Statistics-based row-group/page skipping: decides, from a
//! column chunk's `min`/`max`/`null_count` alone, whether *no* row in that
//! chunk could possibly satisfy a filter — without decoding a single page.

use std::cmp::Ordering;

use crate::basic::Type as PhysicalType;
use crate::file::metadata::{RowGroupMetaData, Statistics};
use crate::filter::{compare_stat, FilterExpr, FilterValue, Join, Predicate};
use crate::schema::types::{recognize_logical_columns, SchemaDescriptor};

/// Decodes a column chunk's opaque statistics bytes into a comparable
/// [`FilterValue`], typed by the leaf's physical type. `None` is
/// returned for a physical type or byte length this crate cannot interpret
/// as a scalar (e.g. `INT96`, or a truncated/garbled stat) — callers must
/// then refuse to skip.
pub fn decode_stat_value(physical_type: PhysicalType, bytes: &[u8]) -> Option<FilterValue> {
    match physical_type {
        PhysicalType::BOOLEAN => bytes.first().map(|b| FilterValue::Bool(*b != 0)),
        PhysicalType::INT32 => <[u8; 4]>::try_from(bytes)
            .ok()
            .map(|b| FilterValue::Int(i32::from_le_bytes(b))),
        PhysicalType::INT64 => <[u8; 8]>::try_from(bytes)
            .ok()
            .map(|b| FilterValue::Long(i64::from_le_bytes(b))),
        PhysicalType::FLOAT => <[u8; 4]>::try_from(bytes)
            .ok()
            .map(|b| FilterValue::Float(f32::from_le_bytes(b))),
        PhysicalType::DOUBLE => <[u8; 8]>::try_from(bytes)
            .ok()
            .map(|b| FilterValue::Double(f64::from_le_bytes(b))),
        PhysicalType::BYTE_ARRAY | PhysicalType::FIXED_LEN_BYTE_ARRAY => {
            Some(FilterValue::Str(String::from_utf8_lossy(bytes).into_owned()))
        }
        PhysicalType::INT96 => None,
    }
}

/// Whether `stats`/`predicate` prove that no row of the chunk could match,
/// per the per-operator comparison rules. Conservative on anything it
/// cannot decide: returns `false` (never skip) rather than risk dropping a
/// matching row.
fn predicate_may_skip(predicate: &Predicate, physical_type: PhysicalType, num_values: i64, stats: Option<&Statistics>) -> bool {
    let stats = match stats {
        Some(s) => s,
        None => return false,
    };

    match predicate {
        Predicate::IsNull => stats.null_count == Some(0),
        Predicate::IsNotNull => stats.null_count.map(|n| n == num_values).unwrap_or(false),
        Predicate::Contains(_) | Predicate::Prefix(_) | Predicate::Suffix(_) => false,
        Predicate::NotEqual(_) => false,
        Predicate::Equal(v) => bound_skip(stats, physical_type, |min, max| {
            compare_stat(&min, v) == Some(Ordering::Greater) || compare_stat(&max, v) == Some(Ordering::Less)
        }),
        Predicate::LessThan(v) => {
            bound_skip(stats, physical_type, |min, _| matches!(compare_stat(&min, v), Some(o) if o != Ordering::Less))
        }
        Predicate::LessThanOrEqual(v) => {
            bound_skip(stats, physical_type, |min, _| compare_stat(&min, v) == Some(Ordering::Greater))
        }
        Predicate::GreaterThan(v) => {
            bound_skip(stats, physical_type, |_, max| matches!(compare_stat(&max, v), Some(o) if o != Ordering::Greater))
        }
        Predicate::GreaterThanOrEqual(v) => {
            bound_skip(stats, physical_type, |_, max| compare_stat(&max, v) == Some(Ordering::Less))
        }
    }
}

fn bound_skip(
    stats: &Statistics,
    physical_type: PhysicalType,
    f: impl Fn(FilterValue, FilterValue) -> bool,
) -> bool {
    let (min, max) = match (&stats.min, &stats.max) {
        (Some(min), Some(max)) => (min, max),
        _ => return false,
    };
    match (
        decode_stat_value(physical_type, min),
        decode_stat_value(physical_type, max),
    ) {
        (Some(min), Some(max)) => f(min, max),
        _ => false,
    }
}

/// Returns `true` when `expr` proves `row_group` contains no matching row,
/// so the caller may skip opening it entirely. Only
/// [`crate::basic::LogicalColumnKind::PRIMITIVE`] columns with no map-key
/// scope carry chunk-level statistics this crate can reason about; any
/// other shape never skips.
pub fn skip_row_group(expr: &FilterExpr, schema: &SchemaDescriptor, row_group: &RowGroupMetaData) -> bool {
    match expr {
        FilterExpr::Predicate(cf) => {
            if cf.map_key.is_some() {
                return false;
            }
            let logical = recognize_logical_columns(schema);
            let col = match logical.iter().find(|c| c.name == cf.column) {
                Some(c) if c.leaves.len() == 1 => c,
                _ => return false,
            };
            let leaf_idx = col.leaves[0];
            let chunk = row_group.column(leaf_idx);
            predicate_may_skip(
                &cf.predicate,
                schema.column(leaf_idx).physical_type(),
                chunk.num_values(),
                chunk.statistics(),
            )
        }
        FilterExpr::Set(Join::All, children) => children.iter().any(|c| skip_row_group(c, schema, row_group)),
        FilterExpr::Set(Join::Any, children) => {
            !children.is_empty() && children.iter().all(|c| skip_row_group(c, schema, row_group))
        }
    }
}

/// Adapts [`skip_row_group`] into the closure shape
/// `SerializedReaderOptions`/`ReadOptionsBuilder::with_predicate` expects,
/// so a `FilterExpr` can gate row-group construction directly instead of
/// only post-filtering materialized rows.
pub fn as_row_group_predicate(
    expr: FilterExpr,
    schema: std::sync::Arc<SchemaDescriptor>,
) -> Box<dyn FnMut(&RowGroupMetaData, usize) -> bool> {
    Box::new(move |rg: &RowGroupMetaData, _idx: usize| !skip_row_group(&expr, &schema, rg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Compression;
    use crate::file::metadata::ColumnChunkMetaData;
    use crate::schema::types::{ColumnPath, SchemaDescriptor, Type as SchemaType};
    use std::sync::Arc;

    fn int32_schema() -> Arc<SchemaDescriptor> {
        let field = SchemaType::primitive_type_builder("id", crate::basic::Type::INT32)
            .with_repetition(crate::basic::Repetition::REQUIRED)
            .build()
            .unwrap();
        let schema = SchemaType::group_type_builder("schema")
            .with_fields(&mut vec![Arc::new(field)])
            .build()
            .unwrap();
        Arc::new(SchemaDescriptor::new(Arc::new(schema)))
    }

    fn row_group_with_stats(descr: &Arc<SchemaDescriptor>, min: i32, max: i32, null_count: i64) -> RowGroupMetaData {
        let stats = Statistics {
            min: Some(min.to_le_bytes().to_vec()),
            max: Some(max.to_le_bytes().to_vec()),
            null_count: Some(null_count),
            distinct_count: None,
            is_min_value_exact: true,
            is_max_value_exact: true,
        };
        let chunk = ColumnChunkMetaData::new(
            descr.column(0),
            vec![crate::basic::Encoding::PLAIN],
            ColumnPath::new(vec!["id".to_owned()]),
            Compression::UNCOMPRESSED,
            100,
            40,
            40,
            0,
            None,
            Some(stats),
            0,
        );
        RowGroupMetaData::new(vec![chunk], 100, 40, descr.clone())
    }

    #[test]
    fn test_equal_out_of_bounds_skips() {
        let descr = int32_schema();
        let rg = row_group_with_stats(&descr, 10, 20, 0);
        let expr = FilterExpr::Predicate(crate::filter::ColumnFilter {
            column: "id".to_owned(),
            map_key: None,
            predicate: Predicate::Equal(FilterValue::from(5i32)),
        });
        assert!(skip_row_group(&expr, &descr, &rg));

        let expr = FilterExpr::Predicate(crate::filter::ColumnFilter {
            column: "id".to_owned(),
            map_key: None,
            predicate: Predicate::Equal(FilterValue::from(15i32)),
        });
        assert!(!skip_row_group(&expr, &descr, &rg));
    }

    #[test]
    fn test_less_than_skip_when_min_at_or_above_bound() {
        let descr = int32_schema();
        let rg = row_group_with_stats(&descr, 10, 20, 0);
        let expr = FilterExpr::Predicate(crate::filter::ColumnFilter {
            column: "id".to_owned(),
            map_key: None,
            predicate: Predicate::LessThan(FilterValue::from(10i32)),
        });
        assert!(skip_row_group(&expr, &descr, &rg));

        let expr = FilterExpr::Predicate(crate::filter::ColumnFilter {
            column: "id".to_owned(),
            map_key: None,
            predicate: Predicate::LessThan(FilterValue::from(11i32)),
        });
        assert!(!skip_row_group(&expr, &descr, &rg));
    }

    #[test]
    fn test_is_null_skip_requires_zero_null_count() {
        let descr = int32_schema();
        let rg = row_group_with_stats(&descr, 10, 20, 0);
        let expr = FilterExpr::Predicate(crate::filter::ColumnFilter {
            column: "id".to_owned(),
            map_key: None,
            predicate: Predicate::IsNull,
        });
        assert!(skip_row_group(&expr, &descr, &rg));

        let rg_with_nulls = row_group_with_stats(&descr, 10, 20, 3);
        assert!(!skip_row_group(&expr, &descr, &rg_with_nulls));
    }

    #[test]
    fn test_contains_never_skips() {
        let descr = int32_schema();
        let rg = row_group_with_stats(&descr, 10, 20, 0);
        let expr = FilterExpr::Predicate(crate::filter::ColumnFilter {
            column: "id".to_owned(),
            map_key: None,
            predicate: Predicate::Contains(FilterValue::from(999i32)),
        });
        assert!(!skip_row_group(&expr, &descr, &rg));
    }

    #[test]
    fn test_filter_set_all_skips_if_any_child_skips() {
        let descr = int32_schema();
        let rg = row_group_with_stats(&descr, 10, 20, 0);
        let out_of_range = FilterExpr::Predicate(crate::filter::ColumnFilter {
            column: "id".to_owned(),
            map_key: None,
            predicate: Predicate::Equal(FilterValue::from(999i32)),
        });
        let in_range = FilterExpr::Predicate(crate::filter::ColumnFilter {
            column: "id".to_owned(),
            map_key: None,
            predicate: Predicate::GreaterThan(FilterValue::from(5i32)),
        });
        assert!(skip_row_group(
            &FilterExpr::Set(Join::All, vec![out_of_range.clone(), in_range.clone()]),
            &descr,
            &rg
        ));
        assert!(!skip_row_group(
            &FilterExpr::Set(Join::Any, vec![out_of_range, in_range]),
            &descr,
            &rg
        ));
    }
}
