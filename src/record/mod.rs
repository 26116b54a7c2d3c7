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

//! Nested row assembly: reconstructs logical
//! rows from the flat per-leaf value/level streams `column::reader` produces,
//! using the Dremel record-shredding rules over LIST/MAP/STRUCT logical
//! columns recognized by `schema::types::recognize_logical_columns`.

pub mod reader;
pub mod triplet;

use std::fmt;

use crate::data_type::{ByteArray, Int96};
use crate::errors::{ParquetError, Result};

pub use reader::RowIter;

/// One decoded leaf or composite value.
///
/// `Bytes` covers both BYTE_ARRAY and FIXED_LEN_BYTE_ARRAY; interpreting it
/// as UTF-8 is never automatic, only via `ByteArray::as_utf8`
/// or `RowAccessor::get_string`.
#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Int96(Int96),
    Float(f32),
    Double(f64),
    Bytes(ByteArray),
    Group(Row),
    ListInternal(Vec<Field>),
    MapInternal(Vec<(Field, Field)>),
}

impl Field {
    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Field::Null => write!(f, "null"),
            Field::Bool(v) => write!(f, "{}", v),
            Field::Int(v) => write!(f, "{}", v),
            Field::Long(v) => write!(f, "{}", v),
            Field::Int96(v) => write!(f, "{:?}", v.data()),
            Field::Float(v) => write!(f, "{}", v),
            Field::Double(v) => write!(f, "{}", v),
            Field::Bytes(v) => match v.as_utf8() {
                Ok(s) => write!(f, "\"{}\"", s),
                Err(_) => write!(f, "{:?}", v.data()),
            },
            Field::Group(row) => write!(f, "{}", row),
            Field::ListInternal(elements) => {
                write!(f, "[")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "]")
            }
            Field::MapInternal(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} -> {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// A reconstructed logical row: an ordered list of (field name, value) pairs,
/// one per top-level logical column in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Field)>,
}

impl Row {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn push(&mut self, name: String, value: Field) {
        self.fields.push((name, value));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[(String, Field)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}

fn type_mismatch(name: &str, expected: &str, field: &Field) -> ParquetError {
    ParquetError::TypeMismatch(format!(
        "field '{}' is not a {} (found {:?})",
        name, expected, field
    ))
}

fn field_at<'a>(row: &'a Row, i: usize) -> Result<&'a Field> {
    row.fields
        .get(i)
        .map(|(_, v)| v)
        .ok_or_else(|| ParquetError::General(format!("field index {} out of range", i)))
}

/// Typed accessors over a `Row`'s fields by position, mirroring the
/// teacher's `RowAccessor` convention for ergonomic record consumption.
pub trait RowAccessor {
    fn get_bool(&self, i: usize) -> Result<bool>;
    fn get_int(&self, i: usize) -> Result<i32>;
    fn get_long(&self, i: usize) -> Result<i64>;
    fn get_float(&self, i: usize) -> Result<f32>;
    fn get_double(&self, i: usize) -> Result<f64>;
    fn get_string(&self, i: usize) -> Result<&str>;
    fn get_bytes(&self, i: usize) -> Result<&ByteArray>;
    fn get_group(&self, i: usize) -> Result<&Row>;
    fn get_list(&self, i: usize) -> Result<&[Field]>;
    fn get_map(&self, i: usize) -> Result<&[(Field, Field)]>;
}

impl RowAccessor for Row {
    fn get_bool(&self, i: usize) -> Result<bool> {
        match field_at(self, i)? {
            Field::Bool(v) => Ok(*v),
            f => Err(type_mismatch(&self.fields[i].0, "bool", f)),
        }
    }

    fn get_int(&self, i: usize) -> Result<i32> {
        match field_at(self, i)? {
            Field::Int(v) => Ok(*v),
            f => Err(type_mismatch(&self.fields[i].0, "int", f)),
        }
    }

    fn get_long(&self, i: usize) -> Result<i64> {
        match field_at(self, i)? {
            Field::Long(v) => Ok(*v),
            f => Err(type_mismatch(&self.fields[i].0, "long", f)),
        }
    }

    fn get_float(&self, i: usize) -> Result<f32> {
        match field_at(self, i)? {
            Field::Float(v) => Ok(*v),
            f => Err(type_mismatch(&self.fields[i].0, "float", f)),
        }
    }

    fn get_double(&self, i: usize) -> Result<f64> {
        match field_at(self, i)? {
            Field::Double(v) => Ok(*v),
            f => Err(type_mismatch(&self.fields[i].0, "double", f)),
        }
    }

    fn get_string(&self, i: usize) -> Result<&str> {
        match field_at(self, i)? {
            Field::Bytes(v) => Ok(v.as_utf8()?),
            f => Err(type_mismatch(&self.fields[i].0, "string", f)),
        }
    }

    fn get_bytes(&self, i: usize) -> Result<&ByteArray> {
        match field_at(self, i)? {
            Field::Bytes(v) => Ok(v),
            f => Err(type_mismatch(&self.fields[i].0, "bytes", f)),
        }
    }

    fn get_group(&self, i: usize) -> Result<&Row> {
        match field_at(self, i)? {
            Field::Group(v) => Ok(v),
            f => Err(type_mismatch(&self.fields[i].0, "group", f)),
        }
    }

    fn get_list(&self, i: usize) -> Result<&[Field]> {
        match field_at(self, i)? {
            Field::ListInternal(v) => Ok(v),
            f => Err(type_mismatch(&self.fields[i].0, "list", f)),
        }
    }

    fn get_map(&self, i: usize) -> Result<&[(Field, Field)]> {
        match field_at(self, i)? {
            Field::MapInternal(v) => Ok(v),
            f => Err(type_mismatch(&self.fields[i].0, "map", f)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_display() {
        let mut row = Row::new();
        row.push("a".to_owned(), Field::Int(1));
        row.push("b".to_owned(), Field::Null);
        assert_eq!(format!("{}", row), "{a: 1, b: null}");
    }

    #[test]
    fn test_row_accessor_type_mismatch() {
        let mut row = Row::new();
        row.push("a".to_owned(), Field::Int(1));
        assert!(matches!(row.get_long(0), Err(ParquetError::TypeMismatch(_))));
        assert_eq!(row.get_int(0).unwrap(), 1);
    }

    #[test]
    fn test_row_get_by_name() {
        let mut row = Row::new();
        row.push("a".to_owned(), Field::Int(7));
        assert_eq!(row.get("a"), Some(&Field::Int(7)));
        assert_eq!(row.get("missing"), None);
    }
}
