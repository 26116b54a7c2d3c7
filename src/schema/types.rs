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

//! Schema model: the nested group/primitive tree, flattened
//! into leaf columns with their max definition/repetition levels, and the
//! structural recognition of LIST/MAP/STRUCT logical columns over runs of
//! leaves.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::basic::{LogicalColumnKind, Repetition, Type as PhysicalType};
use crate::errors::{ParquetError, Result};

/// A node in the schema tree: either a primitive leaf or a group of children.
#[derive(Clone, Debug)]
pub enum Type {
    PrimitiveType {
        basic_info: BasicTypeInfo,
        physical_type: PhysicalType,
        type_length: i32,
        scale: i32,
        precision: i32,
    },
    GroupType {
        basic_info: BasicTypeInfo,
        fields: Vec<TypePtr>,
    },
}

pub type TypePtr = Arc<Type>;

#[derive(Clone, Debug)]
pub struct BasicTypeInfo {
    name: String,
    repetition: Option<Repetition>,
    id: Option<i32>,
}

impl BasicTypeInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repetition(&self) -> Option<Repetition> {
        self.repetition
    }

    pub fn has_repetition(&self) -> bool {
        self.repetition.is_some()
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }
}

impl Type {
    pub fn name(&self) -> &str {
        self.get_basic_info().name()
    }

    pub fn get_basic_info(&self) -> &BasicTypeInfo {
        match self {
            Type::PrimitiveType { basic_info, .. } => basic_info,
            Type::GroupType { basic_info, .. } => basic_info,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::PrimitiveType { .. })
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Type::GroupType { .. })
    }

    pub fn get_fields(&self) -> &[TypePtr] {
        match self {
            Type::GroupType { fields, .. } => fields,
            _ => &[],
        }
    }

    pub fn get_physical_type(&self) -> PhysicalType {
        match self {
            Type::PrimitiveType { physical_type, .. } => *physical_type,
            _ => panic!("get_physical_type() called on a group type"),
        }
    }

    pub fn get_precision_scale(&self) -> (i32, i32) {
        match self {
            Type::PrimitiveType {
                precision, scale, ..
            } => (*precision, *scale),
            _ => (0, 0),
        }
    }

    pub fn primitive_type_builder(name: &str, physical_type: PhysicalType) -> PrimitiveTypeBuilder {
        PrimitiveTypeBuilder::new(name, physical_type)
    }

    pub fn group_type_builder(name: &str) -> GroupTypeBuilder {
        GroupTypeBuilder::new(name)
    }
}

pub struct PrimitiveTypeBuilder {
    name: String,
    physical_type: PhysicalType,
    repetition: Repetition,
    type_length: i32,
    scale: i32,
    precision: i32,
    id: Option<i32>,
}

impl PrimitiveTypeBuilder {
    pub fn new(name: &str, physical_type: PhysicalType) -> Self {
        Self {
            name: name.to_owned(),
            physical_type,
            repetition: Repetition::OPTIONAL,
            type_length: -1,
            scale: -1,
            precision: -1,
            id: None,
        }
    }

    pub fn with_repetition(mut self, repetition: Repetition) -> Self {
        self.repetition = repetition;
        self
    }

    pub fn with_length(mut self, length: i32) -> Self {
        self.type_length = length;
        self
    }

    pub fn with_precision_scale(mut self, precision: i32, scale: i32) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn build(self) -> Result<Type> {
        if self.physical_type == PhysicalType::FIXED_LEN_BYTE_ARRAY && self.type_length < 0 {
            return Err(ParquetError::SchemaError(format!(
                "invalid length {} for FIXED_LEN_BYTE_ARRAY field '{}'",
                self.type_length, self.name
            )));
        }
        Ok(Type::PrimitiveType {
            basic_info: BasicTypeInfo {
                name: self.name,
                repetition: Some(self.repetition),
                id: self.id,
            },
            physical_type: self.physical_type,
            type_length: self.type_length,
            scale: self.scale,
            precision: self.precision,
        })
    }
}

pub struct GroupTypeBuilder {
    name: String,
    repetition: Option<Repetition>,
    fields: Vec<TypePtr>,
    id: Option<i32>,
}

impl GroupTypeBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            repetition: None,
            fields: Vec::new(),
            id: None,
        }
    }

    pub fn with_repetition(mut self, repetition: Repetition) -> Self {
        self.repetition = Some(repetition);
        self
    }

    pub fn with_fields(mut self, fields: &mut Vec<TypePtr>) -> Self {
        self.fields.append(fields);
        self
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn build(self) -> Result<Type> {
        Ok(Type::GroupType {
            basic_info: BasicTypeInfo {
                name: self.name,
                repetition: self.repetition,
                id: self.id,
            },
            fields: self.fields,
        })
    }
}

/// The dot-joined sequence of ancestor field names identifying a leaf.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColumnPath {
    parts: Vec<String>,
}

impl ColumnPath {
    pub fn new(parts: Vec<String>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn string(&self) -> String {
        self.parts.join(".")
    }
}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.string())
    }
}

impl From<Vec<String>> for ColumnPath {
    fn from(parts: Vec<String>) -> Self {
        ColumnPath::new(parts)
    }
}

/// A flattened leaf (primitive) column: its physical type, its path, and
/// its recomputed max definition/repetition levels.
#[derive(Clone, Debug)]
pub struct ColumnDescriptor {
    primitive_type: TypePtr,
    max_def_level: i16,
    max_rep_level: i16,
    path: ColumnPath,
}

pub type ColumnDescPtr = Arc<ColumnDescriptor>;

impl ColumnDescriptor {
    pub fn new(
        primitive_type: TypePtr,
        max_def_level: i16,
        max_rep_level: i16,
        path: ColumnPath,
    ) -> Self {
        Self {
            primitive_type,
            max_def_level,
            max_rep_level,
            path,
        }
    }

    pub fn max_def_level(&self) -> i16 {
        self.max_def_level
    }

    pub fn max_rep_level(&self) -> i16 {
        self.max_rep_level
    }

    pub fn path(&self) -> &ColumnPath {
        &self.path
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.primitive_type.get_physical_type()
    }

    pub fn type_length(&self) -> i32 {
        match self.primitive_type.as_ref() {
            Type::PrimitiveType { type_length, .. } => *type_length,
            _ => -1,
        }
    }

    pub fn self_type(&self) -> &Type {
        &self.primitive_type
    }
}

/// The flattened view of a schema: every leaf in pre-order, plus the root
/// group type.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    schema: TypePtr,
    leaves: Vec<ColumnDescPtr>,
    leaf_to_base: Vec<usize>,
}

impl SchemaDescriptor {
    pub fn new(schema: TypePtr) -> Self {
        assert!(schema.is_group(), "schema root must be a group type");
        let mut leaves = Vec::new();
        let mut leaf_to_base = Vec::new();
        for (i, field) in schema.get_fields().iter().enumerate() {
            build_leaves(field.clone(), 0, 0, vec![], &mut leaves);
            while leaf_to_base.len() < leaves.len() {
                leaf_to_base.push(i);
            }
        }
        Self {
            schema,
            leaves,
            leaf_to_base,
        }
    }

    pub fn root_schema(&self) -> &Type {
        &self.schema
    }

    pub fn root_schema_ptr(&self) -> TypePtr {
        self.schema.clone()
    }

    pub fn num_columns(&self) -> usize {
        self.leaves.len()
    }

    pub fn column(&self, i: usize) -> ColumnDescPtr {
        self.leaves[i].clone()
    }

    pub fn columns(&self) -> &[ColumnDescPtr] {
        &self.leaves
    }

    /// Index of the top-level field a given leaf belongs to.
    pub fn get_column_root_idx(&self, leaf_idx: usize) -> usize {
        self.leaf_to_base[leaf_idx]
    }
}

fn build_leaves(
    node: TypePtr,
    parent_max_def: i16,
    parent_max_rep: i16,
    mut path: Vec<String>,
    leaves: &mut Vec<ColumnDescPtr>,
) {
    let repetition = node.get_basic_info().repetition().unwrap_or(Repetition::REQUIRED);
    let max_def = parent_max_def
        + (repetition == Repetition::OPTIONAL || repetition == Repetition::REPEATED) as i16;
    let max_rep = parent_max_rep + (repetition == Repetition::REPEATED) as i16;
    path.push(node.name().to_owned());

    match node.as_ref() {
        Type::PrimitiveType { .. } => {
            leaves.push(Arc::new(ColumnDescriptor::new(
                node.clone(),
                max_def,
                max_rep,
                ColumnPath::new(path),
            )));
        }
        Type::GroupType { fields, .. } => {
            for field in fields {
                build_leaves(field.clone(), max_def, max_rep, path.clone(), leaves);
            }
        }
    }
}

/// A user-visible column assembled from one or more leaves.
#[derive(Debug, Clone)]
pub struct LogicalColumn {
    pub kind: LogicalColumnKind,
    pub name: String,
    /// Indices into `SchemaDescriptor::columns()` participating in this
    /// logical column, in declaration order. PRIMITIVE/LIST have one leaf;
    /// MAP has exactly two (key, value); STRUCT has one or more.
    pub leaves: Vec<usize>,
}

/// Recognizes logical columns by structural pattern matching over
/// contiguous leaf-path prefixes:
///  - MAP: two leaves sharing a `<name>.(map|key_value)` prefix ending in
///    `key`/`value`.
///  - LIST: a leaf path ending in `.list.element` (nested repeatedly).
///  - STRUCT: multiple leaves sharing a non-empty common prefix, otherwise.
///  - PRIMITIVE: anything else.
pub fn recognize_logical_columns(schema: &SchemaDescriptor) -> Vec<LogicalColumn> {
    let root = schema.root_schema();
    let mut result = Vec::new();
    for field in root.get_fields() {
        let leaf_indices: Vec<usize> = schema
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.path().parts().first().map(|s| s.as_str()) == Some(field.name()))
            .map(|(i, _)| i)
            .collect();
        result.push(classify(field.name(), &leaf_indices, schema));
    }
    result
}

fn classify(name: &str, leaf_indices: &[usize], schema: &SchemaDescriptor) -> LogicalColumn {
    if leaf_indices.len() == 1 {
        let path = schema.column(leaf_indices[0]).path().clone();
        if is_list_path(path.parts()) {
            return LogicalColumn {
                kind: LogicalColumnKind::LIST,
                name: name.to_owned(),
                leaves: leaf_indices.to_vec(),
            };
        }
        return LogicalColumn {
            kind: LogicalColumnKind::PRIMITIVE,
            name: name.to_owned(),
            leaves: leaf_indices.to_vec(),
        };
    }

    if leaf_indices.len() == 2 && is_map(leaf_indices, schema) {
        return LogicalColumn {
            kind: LogicalColumnKind::MAP,
            name: name.to_owned(),
            leaves: leaf_indices.to_vec(),
        };
    }

    LogicalColumn {
        kind: LogicalColumnKind::STRUCT,
        name: name.to_owned(),
        leaves: leaf_indices.to_vec(),
    }
}

fn is_list_path(parts: &[String]) -> bool {
    parts.len() >= 2 && parts[parts.len() - 2] == "list" && parts[parts.len() - 1] == "element"
}

fn is_map(leaf_indices: &[usize], schema: &SchemaDescriptor) -> bool {
    let paths: Vec<&ColumnPath> = leaf_indices
        .iter()
        .map(|&i| schema.column(i).path())
        .collect();
    if paths.len() != 2 {
        return false;
    }
    let suffixes: Vec<&str> = paths
        .iter()
        .map(|p| p.parts().last().map(|s| s.as_str()).unwrap_or(""))
        .collect();
    let has_key = suffixes.contains(&"key");
    let has_value = suffixes.contains(&"value");
    if !(has_key && has_value) {
        return false;
    }
    // legacy variants: `<name>.key_value.key`/`.key_value.value` or
    // `<name>.map.key`/`.map.value`.
    paths.iter().all(|p| {
        let parts = p.parts();
        parts.len() >= 2 && (parts[parts.len() - 2] == "key_value" || parts[parts.len() - 2] == "map")
    })
}

/// Builds a `name -> leaf index` lookup for a schema, used by the filter
/// factory.
pub fn leaf_path_index(schema: &SchemaDescriptor) -> HashMap<String, usize> {
    schema
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| (c.path().string(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Type as PhysicalType;

    fn leaf(name: &str, repetition: Repetition) -> TypePtr {
        Arc::new(
            Type::primitive_type_builder(name, PhysicalType::INT32)
                .with_repetition(repetition)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_flatten_simple_schema() {
        let schema = Type::group_type_builder("schema")
            .with_fields(&mut vec![
                leaf("a", Repetition::REQUIRED),
                leaf("b", Repetition::OPTIONAL),
            ])
            .build()
            .unwrap();
        let descr = SchemaDescriptor::new(Arc::new(schema));
        assert_eq!(descr.num_columns(), 2);
        assert_eq!(descr.column(0).max_def_level(), 0);
        assert_eq!(descr.column(0).max_rep_level(), 0);
        assert_eq!(descr.column(1).max_def_level(), 1);
        assert_eq!(descr.column(1).max_rep_level(), 0);
    }

    #[test]
    fn test_flatten_nested_list() {
        let element = leaf("element", Repetition::OPTIONAL);
        let list = Type::group_type_builder("list")
            .with_repetition(Repetition::REPEATED)
            .with_fields(&mut vec![element])
            .build()
            .unwrap();
        let outer = Type::group_type_builder("my_list")
            .with_repetition(Repetition::OPTIONAL)
            .with_fields(&mut vec![Arc::new(list)])
            .build()
            .unwrap();
        let schema = Type::group_type_builder("schema")
            .with_fields(&mut vec![Arc::new(outer)])
            .build()
            .unwrap();
        let descr = SchemaDescriptor::new(Arc::new(schema));
        assert_eq!(descr.num_columns(), 1);
        let col = descr.column(0);
        // my_list(OPTIONAL) -> +1 def, list(REPEATED) -> +1 def +1 rep, element(OPTIONAL) -> +1 def
        assert_eq!(col.max_def_level(), 3);
        assert_eq!(col.max_rep_level(), 1);
        assert_eq!(col.path().string(), "my_list.list.element");

        let logical = recognize_logical_columns(&descr);
        assert_eq!(logical.len(), 1);
        assert_eq!(logical[0].kind, LogicalColumnKind::LIST);
    }

    #[test]
    fn test_recognize_map() {
        let key = leaf("key", Repetition::REQUIRED);
        let value = leaf("value", Repetition::OPTIONAL);
        let key_value = Type::group_type_builder("key_value")
            .with_repetition(Repetition::REPEATED)
            .with_fields(&mut vec![key, value])
            .build()
            .unwrap();
        let outer = Type::group_type_builder("my_map")
            .with_repetition(Repetition::OPTIONAL)
            .with_fields(&mut vec![Arc::new(key_value)])
            .build()
            .unwrap();
        let schema = Type::group_type_builder("schema")
            .with_fields(&mut vec![Arc::new(outer)])
            .build()
            .unwrap();
        let descr = SchemaDescriptor::new(Arc::new(schema));
        assert_eq!(descr.num_columns(), 2);
        let logical = recognize_logical_columns(&descr);
        assert_eq!(logical.len(), 1);
        assert_eq!(logical[0].kind, LogicalColumnKind::MAP);
    }

    #[test]
    fn test_recognize_struct() {
        let a = leaf("a", Repetition::REQUIRED);
        let b = leaf("b", Repetition::OPTIONAL);
        let inner = Type::group_type_builder("my_struct")
            .with_repetition(Repetition::OPTIONAL)
            .with_fields(&mut vec![a, b])
            .build()
            .unwrap();
        let schema = Type::group_type_builder("schema")
            .with_fields(&mut vec![Arc::new(inner)])
            .build()
            .unwrap();
        let descr = SchemaDescriptor::new(Arc::new(schema));
        let logical = recognize_logical_columns(&descr);
        assert_eq!(logical.len(), 1);
        assert_eq!(logical[0].kind, LogicalColumnKind::STRUCT);
        assert_eq!(logical[0].leaves.len(), 2);
    }
}
