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

//! Reads one leaf column's full (repetition level, definition level, value)
//! triplet out of a row group, the input the assembler in
//! `record::reader` consumes.

use crate::basic::Type as PhysicalType;
use crate::data_type::{
    BoolType, ByteArrayType, DoubleType, FixedLenByteArrayType, FloatType, Int32Type, Int64Type,
    Int96Type,
};
use crate::errors::{ParquetError, Result};
use crate::file::reader::RowGroupReader;
use crate::record::Field;

/// One leaf column's values for an entire row group, alongside a level slot
/// per potential value/null/repeat position. `values` holds only the
/// non-null values (`values.len() == values_read` from the underlying
/// `ColumnReaderImpl::read_batch`); `def_levels`/`rep_levels` hold one entry
/// per level slot (`def_levels.len() == num_values` from the column chunk's
/// metadata).
pub struct LeafTriplet {
    pub rep_levels: Vec<i16>,
    pub def_levels: Vec<i16>,
    pub values: Vec<Field>,
    pub max_def: i16,
    pub max_rep: i16,
}

macro_rules! read_typed_triplet {
    ($row_group:expr, $descr:expr, $page_reader:expr, $num_values:expr, $max_def:expr, $max_rep:expr, $marker:ty, $wrap:expr) => {{
        let mut reader = crate::column::reader::ColumnReaderImpl::<$marker>::new($descr.clone(), $page_reader);
        let mut def_levels = vec![0i16; $num_values];
        let mut rep_levels = vec![0i16; $num_values];
        let mut raw = vec![Default::default(); $num_values];
        let def_out = if $max_def > 0 { Some(def_levels.as_mut_slice()) } else { None };
        let rep_out = if $max_rep > 0 { Some(rep_levels.as_mut_slice()) } else { None };
        let (values_read, levels_read) = reader.read_batch($num_values, def_out, rep_out, &mut raw)?;
        if levels_read != $num_values {
            return Err(ParquetError::BadLevelCount(format!(
                "expected {} levels, decoded {}",
                $num_values, levels_read
            )));
        }
        if $max_def == 0 {
            def_levels = vec![0i16; $num_values];
        }
        if $max_rep == 0 {
            rep_levels = vec![0i16; $num_values];
        }
        raw.truncate(values_read);
        let values = raw.into_iter().map($wrap).collect();
        (def_levels, rep_levels, values)
    }};
}

/// Reads the entire value/level stream for leaf `leaf_idx` out of one row
/// group's `read_column`.
pub fn read_leaf_triplet(row_group: &dyn RowGroupReader, leaf_idx: usize) -> Result<LeafTriplet> {
    let descr = row_group.metadata().schema_descr().column(leaf_idx);
    let num_values = row_group.metadata().column(leaf_idx).num_values() as usize;
    let max_def = descr.max_def_level();
    let max_rep = descr.max_rep_level();
    let page_reader = row_group.get_column_page_reader(leaf_idx)?;

    let (def_levels, rep_levels, values) = match descr.physical_type() {
        PhysicalType::BOOLEAN => {
            read_typed_triplet!(row_group, descr, page_reader, num_values, max_def, max_rep, BoolType, Field::Bool)
        }
        PhysicalType::INT32 => {
            read_typed_triplet!(row_group, descr, page_reader, num_values, max_def, max_rep, Int32Type, Field::Int)
        }
        PhysicalType::INT64 => {
            read_typed_triplet!(row_group, descr, page_reader, num_values, max_def, max_rep, Int64Type, Field::Long)
        }
        PhysicalType::INT96 => {
            read_typed_triplet!(row_group, descr, page_reader, num_values, max_def, max_rep, Int96Type, Field::Int96)
        }
        PhysicalType::FLOAT => {
            read_typed_triplet!(row_group, descr, page_reader, num_values, max_def, max_rep, FloatType, Field::Float)
        }
        PhysicalType::DOUBLE => {
            read_typed_triplet!(row_group, descr, page_reader, num_values, max_def, max_rep, DoubleType, Field::Double)
        }
        PhysicalType::BYTE_ARRAY => {
            read_typed_triplet!(row_group, descr, page_reader, num_values, max_def, max_rep, ByteArrayType, Field::Bytes)
        }
        PhysicalType::FIXED_LEN_BYTE_ARRAY => {
            read_typed_triplet!(row_group, descr, page_reader, num_values, max_def, max_rep, FixedLenByteArrayType, Field::Bytes)
        }
    };

    Ok(LeafTriplet {
        rep_levels,
        def_levels,
        values,
        max_def,
        max_rep,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Compression, Encoding, Repetition};
    use crate::file::reader::FileReader;
    use crate::file::serialized_reader::SerializedFileReader;
    use crate::schema::types::{SchemaDescriptor, Type as SchemaType};
    use crate::util::test_common::{make_column_chunk_bytes, DataPageBuilderImpl, DataPageBuilder};
    use std::sync::Arc;

    fn make_one_column_file(values: Vec<i32>, def_levels: Option<Vec<i16>>, max_def: i16) -> Vec<u8> {
        let field = SchemaType::primitive_type_builder("a", crate::basic::Type::INT32)
            .with_repetition(if max_def > 0 {
                Repetition::OPTIONAL
            } else {
                Repetition::REQUIRED
            })
            .build()
            .unwrap();
        let schema = SchemaType::group_type_builder("schema")
            .with_fields(&mut vec![Arc::new(field)])
            .build()
            .unwrap();
        let descr = Arc::new(SchemaDescriptor::new(Arc::new(schema)));
        let col = descr.column(0);

        let mut builder = DataPageBuilderImpl::new(col.clone(), values.len() as u32, true);
        if let Some(d) = &def_levels {
            builder.add_def_levels(max_def, d);
        }
        builder.add_values::<Int32Type>(Encoding::PLAIN, &values);
        let page = builder.consume();

        make_column_chunk_bytes(&descr, Compression::UNCOMPRESSED, vec![page])
    }

    use crate::data_type::Int32Type;

    #[test]
    fn test_read_required_leaf_triplet() {
        let bytes = make_one_column_file(vec![1, 2, 3], None, 0);
        let reader = SerializedFileReader::new(bytes::Bytes::from(bytes)).unwrap();
        let row_group = reader.get_row_group(0).unwrap();
        let triplet = read_leaf_triplet(row_group.as_ref(), 0).unwrap();
        assert_eq!(triplet.values.len(), 3);
        assert_eq!(triplet.values[0], Field::Int(1));
        assert!(triplet.def_levels.iter().all(|&d| d == 0));
    }

    #[test]
    fn test_read_optional_leaf_triplet_with_nulls() {
        let bytes = make_one_column_file(vec![1, 3], Some(vec![1, 0, 1]), 1);
        let reader = SerializedFileReader::new(bytes::Bytes::from(bytes)).unwrap();
        let row_group = reader.get_row_group(0).unwrap();
        let triplet = read_leaf_triplet(row_group.as_ref(), 0).unwrap();
        assert_eq!(triplet.def_levels, vec![1, 0, 1]);
        assert_eq!(triplet.values.len(), 2);
        assert_eq!(triplet.values[0], Field::Int(1));
        assert_eq!(triplet.values[1], Field::Int(3));
    }
}
