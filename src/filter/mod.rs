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

//! Composable column-filter algebra over materialized rows, plus
//! statistics-based row-group/page skipping in
//! [`pushdown`] and a small recursive-descent parser for the CLI-style
//! query grammar in [`query`].
//!
//! Filters are always *bound*: a [`ColumnFilter`] names a logical column by
//! its top-level name and is produced through
//! [`ColumnFilters::create_filter`], which validates the name against a
//! schema rather than letting an unbound predicate float around untyped.

pub mod iter;
pub mod pushdown;
pub mod query;

pub use iter::FilterIter;

use std::cmp::Ordering;

use crate::errors::{ParquetError, Result};
use crate::record::{Field, Row};
use crate::schema::types::{recognize_logical_columns, SchemaDescriptor};

/// A filter operand. Numeric variants compare across width (an `Int` filter
/// matches a `Long` or `Double` field and vice versa) since the query
/// grammar carries no type annotation; `Bool` and `Str` only
/// ever compare against their own kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        FilterValue::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        FilterValue::Int(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Long(v)
    }
}

impl From<f32> for FilterValue {
    fn from(v: f32) -> Self {
        FilterValue::Float(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        FilterValue::Double(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Str(v.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Str(v)
    }
}

fn as_numeric(v: &FilterValue) -> Option<f64> {
    match v {
        FilterValue::Int(v) => Some(*v as f64),
        FilterValue::Long(v) => Some(*v as f64),
        FilterValue::Float(v) => Some(*v as f64),
        FilterValue::Double(v) => Some(*v),
        _ => None,
    }
}

fn field_as_numeric(field: &Field) -> Option<f64> {
    match field {
        Field::Int(v) => Some(*v as f64),
        Field::Long(v) => Some(*v as f64),
        Field::Float(v) => Some(*v as f64),
        Field::Double(v) => Some(*v),
        _ => None,
    }
}

/// Compares a materialized field against a filter operand. Returns `None`
/// on a type mismatch.
fn compare(field: &Field, value: &FilterValue) -> Option<Ordering> {
    match (field, value) {
        (Field::Bool(a), FilterValue::Bool(b)) => a.partial_cmp(b),
        (Field::Bytes(a), FilterValue::Str(b)) => Some(a.data().cmp(b.as_bytes())),
        _ => match (field_as_numeric(field), as_numeric(value)) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    }
}

/// Compares two filter operands directly (not a materialized field), used
/// by [`pushdown`] to compare a chunk's decoded min/max statistic against
/// a predicate's operand.
pub(crate) fn compare_stat(a: &FilterValue, b: &FilterValue) -> Option<Ordering> {
    match (a, b) {
        (FilterValue::Bool(x), FilterValue::Bool(y)) => x.partial_cmp(y),
        (FilterValue::Str(x), FilterValue::Str(y)) => Some(x.as_bytes().cmp(y.as_bytes())),
        _ => match (as_numeric(a), as_numeric(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    }
}

fn bytes_as_str(field: &Field) -> Option<&str> {
    match field {
        Field::Bytes(b) => b.as_utf8().ok(),
        _ => None,
    }
}

/// A single predicate over one logical column's materialized value.
/// String operators (`Contains`/`Prefix`/`Suffix`) also
/// apply to `Contains` as list membership: `Contains(V)` on a repeated
/// column is a membership test over its values.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equal(FilterValue),
    NotEqual(FilterValue),
    LessThan(FilterValue),
    LessThanOrEqual(FilterValue),
    GreaterThan(FilterValue),
    GreaterThanOrEqual(FilterValue),
    Contains(FilterValue),
    Prefix(FilterValue),
    Suffix(FilterValue),
    IsNull,
    IsNotNull,
}

impl Predicate {
    /// Evaluates this predicate against one materialized field. Never
    /// fails: an operand/value type mismatch evaluates to `false` so that a
    /// heterogeneous predicate sweeping mixed-type columns stays total.
    pub fn matches(&self, field: &Field) -> bool {
        match self {
            Predicate::IsNull => field.is_null(),
            Predicate::IsNotNull => !field.is_null(),
            _ if field.is_null() => false,
            Predicate::Equal(v) => compare(field, v) == Some(Ordering::Equal),
            Predicate::NotEqual(v) => matches!(compare(field, v), Some(o) if o != Ordering::Equal),
            Predicate::LessThan(v) => compare(field, v) == Some(Ordering::Less),
            Predicate::LessThanOrEqual(v) => {
                matches!(compare(field, v), Some(o) if o != Ordering::Greater)
            }
            Predicate::GreaterThan(v) => compare(field, v) == Some(Ordering::Greater),
            Predicate::GreaterThanOrEqual(v) => {
                matches!(compare(field, v), Some(o) if o != Ordering::Less)
            }
            Predicate::Contains(v) => match field {
                Field::ListInternal(items) => items.iter().any(|item| Predicate::Equal(v.clone()).matches(item)),
                _ => match (bytes_as_str(field), v) {
                    (Some(s), FilterValue::Str(needle)) => s.contains(needle.as_str()),
                    _ => false,
                },
            },
            Predicate::Prefix(v) => match (bytes_as_str(field), v) {
                (Some(s), FilterValue::Str(needle)) => s.starts_with(needle.as_str()),
                _ => false,
            },
            Predicate::Suffix(v) => match (bytes_as_str(field), v) {
                (Some(s), FilterValue::Str(needle)) => s.ends_with(needle.as_str()),
                _ => false,
            },
        }
    }
}

/// A predicate bound to a logical column, and optionally scoped to one
/// key of a MAP logical column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFilter {
    pub column: String,
    pub map_key: Option<String>,
    pub predicate: Predicate,
}

impl ColumnFilter {
    /// Resolves this filter's operand out of `row` and applies its
    /// predicate. A column absent from the row (e.g. dropped by a
    /// projection) or a map-key lookup that misses is treated as null,
    ///: "missing keys as null".
    pub fn matches(&self, row: &Row) -> bool {
        self.predicate.matches(&self.resolve(row))
    }

    fn resolve(&self, row: &Row) -> Field {
        let field = row.get(&self.column).cloned().unwrap_or(Field::Null);
        match &self.map_key {
            None => field,
            Some(key) => match field {
                Field::MapInternal(entries) => entries
                    .into_iter()
                    .find(|(k, _)| matches!(k, Field::Bytes(b) if b.as_utf8().map(|s| s == key).unwrap_or(false)))
                    .map(|(_, v)| v)
                    .unwrap_or(Field::Null),
                _ => Field::Null,
            },
        }
    }
}

/// How a [`FilterSet`]'s children compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    All,
    Any,
}

/// A predicate tree: either a single bound [`ColumnFilter`] or a
/// [`Join`]-composed set of nested expressions. `All` with
/// no children is `true`; `Any` with no children is `false` — both fall
/// out of `Iterator::all`/`Iterator::any` on an empty slice without special
/// casing.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Predicate(ColumnFilter),
    Set(Join, Vec<FilterExpr>),
}

impl FilterExpr {
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            FilterExpr::Predicate(cf) => cf.matches(row),
            FilterExpr::Set(Join::All, children) => children.iter().all(|c| c.matches(row)),
            FilterExpr::Set(Join::Any, children) => children.iter().any(|c| c.matches(row)),
        }
    }
}

/// Factory that binds predicates to a schema's logical columns: filters are
/// always bound, so this returns a bound filter given the schema rather than
/// a free-floating predicate.
pub struct ColumnFilters<'a> {
    schema: &'a SchemaDescriptor,
}

impl<'a> ColumnFilters<'a> {
    pub fn new(schema: &'a SchemaDescriptor) -> Self {
        Self { schema }
    }

    /// Builds a bound [`ColumnFilter`], failing with `SchemaError` if
    /// `column` does not name a top-level logical column of this schema.
    pub fn create_filter(
        &self,
        column: &str,
        predicate: Predicate,
        map_key: Option<String>,
    ) -> Result<ColumnFilter> {
        let known = recognize_logical_columns(self.schema);
        if !known.iter().any(|c| c.name == column) {
            return Err(ParquetError::SchemaError(format!(
                "no such logical column: {}",
                column
            )));
        }
        Ok(ColumnFilter {
            column: column.to_owned(),
            map_key,
            predicate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::ByteArray;

    #[test]
    fn test_equal_matches_across_numeric_width() {
        let p = Predicate::Equal(FilterValue::Long(3));
        assert!(p.matches(&Field::Int(3)));
        assert!(!p.matches(&Field::Int(4)));
    }

    #[test]
    fn test_type_mismatch_is_false_not_error() {
        let p = Predicate::Equal(FilterValue::Int(3));
        assert!(!p.matches(&Field::Bytes(ByteArray::from("3"))));
        let p = Predicate::NotEqual(FilterValue::Int(3));
        assert!(!p.matches(&Field::Bytes(ByteArray::from("3"))));
    }

    #[test]
    fn test_is_null_and_is_not_null() {
        assert!(Predicate::IsNull.matches(&Field::Null));
        assert!(!Predicate::IsNotNull.matches(&Field::Null));
        assert!(Predicate::IsNotNull.matches(&Field::Int(1)));
    }

    #[test]
    fn test_string_prefix_suffix_contains() {
        let v = Field::Bytes(ByteArray::from("apple_banana_mango0"));
        assert!(Predicate::Prefix(FilterValue::from("apple")).matches(&v));
        assert!(Predicate::Suffix(FilterValue::from("mango0")).matches(&v));
        assert!(Predicate::Contains(FilterValue::from("banana")).matches(&v));
        assert!(!Predicate::Contains(FilterValue::from("missing")).matches(&v));
    }

    #[test]
    fn test_contains_is_list_membership() {
        let list = Field::ListInternal(vec![Field::Int(1), Field::Int(2), Field::Int(3)]);
        assert!(Predicate::Contains(FilterValue::from(2i32)).matches(&list));
        assert!(!Predicate::Contains(FilterValue::from(9i32)).matches(&list));
    }

    #[test]
    fn test_column_filter_map_key_missing_is_null() {
        let mut row = Row::new();
        row.push(
            "m".to_owned(),
            Field::MapInternal(vec![(
                Field::Bytes(ByteArray::from("a")),
                Field::Int(1),
            )]),
        );
        let cf = ColumnFilter {
            column: "m".to_owned(),
            map_key: Some("missing".to_owned()),
            predicate: Predicate::IsNull,
        };
        assert!(cf.matches(&row));

        let cf = ColumnFilter {
            column: "m".to_owned(),
            map_key: Some("a".to_owned()),
            predicate: Predicate::Equal(FilterValue::from(1i32)),
        };
        assert!(cf.matches(&row));
    }

    #[test]
    fn test_filter_set_all_any_composition() {
        let mut row = Row::new();
        row.push("id".to_owned(), Field::Int(5));

        let all_empty = FilterExpr::Set(Join::All, vec![]);
        assert!(all_empty.matches(&row));
        let any_empty = FilterExpr::Set(Join::Any, vec![]);
        assert!(!any_empty.matches(&row));

        let eq5 = FilterExpr::Predicate(ColumnFilter {
            column: "id".to_owned(),
            map_key: None,
            predicate: Predicate::Equal(FilterValue::from(5i32)),
        });
        let eq6 = FilterExpr::Predicate(ColumnFilter {
            column: "id".to_owned(),
            map_key: None,
            predicate: Predicate::Equal(FilterValue::from(6i32)),
        });
        assert!(FilterExpr::Set(Join::Any, vec![eq5.clone(), eq6.clone()]).matches(&row));
        assert!(!FilterExpr::Set(Join::All, vec![eq5, eq6]).matches(&row));
    }

    #[test]
    fn test_create_filter_rejects_unknown_column() {
        use crate::basic::Repetition;
        use crate::schema::types::Type as SchemaType;
        use std::sync::Arc;

        let field = SchemaType::primitive_type_builder("id", crate::basic::Type::INT32)
            .with_repetition(Repetition::REQUIRED)
            .build()
            .unwrap();
        let schema = SchemaType::group_type_builder("schema")
            .with_fields(&mut vec![Arc::new(field)])
            .build()
            .unwrap();
        let descr = SchemaDescriptor::new(Arc::new(schema));
        let factory = ColumnFilters::new(&descr);
        assert!(factory.create_filter("id", Predicate::IsNotNull, None).is_ok());
        assert!(factory.create_filter("nope", Predicate::IsNotNull, None).is_err());
    }
}
