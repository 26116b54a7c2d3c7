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

//! Footer metadata codec: magic validation,
//! footer-length framing, and the thrift compact-protocol decode of the
//! `FileMetaData` record tree into this crate's own typed structures.

use std::io::Cursor;
use std::sync::Arc;

use thrift::protocol::{TCompactInputProtocol, TCompactOutputProtocol, TSerializable};

use crate::basic::ColumnOrder as OurColumnOrder;
use crate::basic::{Compression, Encoding};
use crate::errors::{ParquetError, Result};
use crate::file::metadata::{
    self, ColumnChunkMetaData, FileMetaData, ParquetMetaData, RowGroupMetaData,
};
use crate::file::reader::{ChunkReader, Length};
use crate::schema::types::{ColumnPath, SchemaDescriptor, Type as SchemaType};

pub const FOOTER_SIZE: usize = 8;
pub const PARQUET_MAGIC: &[u8; 4] = b"PAR1";

/// Reads the trailing magic, without attempting to parse any metadata.
/// Exposed separately so a caller can cheaply probe whether a byte source
/// looks like a Parquet file before paying for a full footer decode.
pub fn verify_magic<R: ChunkReader>(chunk_reader: &R) -> Result<bool> {
    let file_size = chunk_reader.len();
    if file_size < FOOTER_SIZE as u64 {
        return Ok(false);
    }
    let mut footer = [0u8; FOOTER_SIZE];
    let mut source = chunk_reader.get_read(file_size - FOOTER_SIZE as u64, FOOTER_SIZE)?;
    std::io::Read::read_exact(&mut source, &mut footer)?;
    Ok(&footer[4..8] == PARQUET_MAGIC)
}

/// Parses the footer and decodes `FileMetaData` into `ParquetMetaData` with
/// every row group present and unfiltered.
pub fn parse_metadata<R: ChunkReader>(chunk_reader: &R) -> Result<ParquetMetaData> {
    let file_size = chunk_reader.len();
    if file_size < FOOTER_SIZE as u64 {
        return Err(ParquetError::NotAParquetFile(format!(
            "file size {} is smaller than the minimal footer size",
            file_size
        )));
    }

    let mut footer = [0u8; FOOTER_SIZE];
    let mut source = chunk_reader.get_read(file_size - FOOTER_SIZE as u64, FOOTER_SIZE)?;
    std::io::Read::read_exact(&mut source, &mut footer)?;

    if &footer[4..8] != PARQUET_MAGIC {
        return Err(ParquetError::NotAParquetFile(
            "trailing magic bytes are not 'PAR1'".to_owned(),
        ));
    }

    let metadata_len = u32::from_le_bytes(footer[0..4].try_into().unwrap()) as u64;
    let footer_metadata_len = FOOTER_SIZE as u64 + metadata_len;
    if footer_metadata_len > file_size {
        return Err(ParquetError::CorruptFooter(format!(
            "footer metadata length {} exceeds file size {}",
            footer_metadata_len, file_size
        )));
    }

    let start = file_size - footer_metadata_len;
    let metadata_read = chunk_reader.get_read(start, metadata_len as usize)?;
    decode_metadata(metadata_read)
}

fn decode_metadata<R: std::io::Read>(input: R) -> Result<ParquetMetaData> {
    let mut prot = TCompactInputProtocol::new(input);
    let t_file_metadata = parquet_format::FileMetaData::read_from_in_protocol(&mut prot)
        .map_err(|e| ParquetError::CorruptFooter(format!("underlying Thrift error: {}", e)))?;

    let schema = build_schema_tree(&t_file_metadata.schema)?;
    let schema_descr = Arc::new(SchemaDescriptor::new(Arc::new(schema)));

    let column_orders = t_file_metadata.column_orders.map(|orders| {
        orders
            .iter()
            .map(|order| match order {
                parquet_format::ColumnOrder::TYPEORDER(_) => OurColumnOrder::TYPE_DEFINED_ORDER,
            })
            .collect()
    });

    let key_value_metadata = t_file_metadata
        .key_value_metadata
        .map(|kvs| kvs.into_iter().map(|kv| (kv.key, kv.value)).collect());

    let file_metadata = FileMetaData::new(
        t_file_metadata.version,
        t_file_metadata.num_rows,
        t_file_metadata.created_by,
        key_value_metadata,
        schema_descr.clone(),
        column_orders,
    );

    let row_groups = t_file_metadata
        .row_groups
        .into_iter()
        .map(|rg| build_row_group(rg, &schema_descr))
        .collect::<Result<Vec<_>>>()?;

    Ok(ParquetMetaData::new(file_metadata, row_groups))
}

/// Reconstructs the nested schema tree from the flattened, `num_children`-
/// annotated `SchemaElement` list.
fn build_schema_tree(elements: &[parquet_format::SchemaElement]) -> Result<SchemaType> {
    if elements.is_empty() {
        return Err(ParquetError::CorruptFooter(
            "schema element list is empty".to_owned(),
        ));
    }
    let mut index = 0;
    let root = build_schema_node(elements, &mut index)?;
    if index != elements.len() {
        return Err(ParquetError::CorruptFooter(format!(
            "schema element list has {} trailing unconsumed elements",
            elements.len() - index
        )));
    }
    if !root.is_group() {
        return Err(ParquetError::SchemaError(
            "schema root must be a group type".to_owned(),
        ));
    }
    Ok(root)
}

fn build_schema_node(elements: &[parquet_format::SchemaElement], index: &mut usize) -> Result<SchemaType> {
    let element = elements.get(*index).ok_or_else(|| {
        ParquetError::CorruptFooter("schema element list ended unexpectedly".to_owned())
    })?;
    *index += 1;

    let repetition = element
        .repetition_type
        .map(crate::basic::Repetition::from);
    let num_children = element.num_children.unwrap_or(0);

    if num_children > 0 {
        let mut fields = Vec::with_capacity(num_children as usize);
        for _ in 0..num_children {
            fields.push(Arc::new(build_schema_node(elements, index)?));
        }
        let mut builder = SchemaType::group_type_builder(&element.name).with_fields(&mut fields);
        if let Some(rep) = repetition {
            builder = builder.with_repetition(rep);
        }
        if let Some(id) = element.field_id {
            builder = builder.with_id(id);
        }
        builder.build()
    } else {
        let physical_type = element
            .type_
            .map(crate::basic::Type::from)
            .ok_or_else(|| ParquetError::CorruptFooter(format!("leaf '{}' has no physical type", element.name)))?;
        let mut builder = SchemaType::primitive_type_builder(&element.name, physical_type)
            .with_repetition(repetition.unwrap_or(crate::basic::Repetition::REQUIRED))
            .with_length(element.type_length.unwrap_or(-1));
        if let (Some(precision), Some(scale)) = (element.precision, element.scale) {
            builder = builder.with_precision_scale(precision, scale);
        }
        if let Some(id) = element.field_id {
            builder = builder.with_id(id);
        }
        builder.build()
    }
}

fn build_row_group(
    rg: parquet_format::RowGroup,
    schema_descr: &Arc<SchemaDescriptor>,
) -> Result<RowGroupMetaData> {
    if rg.columns.len() != schema_descr.num_columns() {
        return Err(ParquetError::CorruptFooter(format!(
            "row group declares {} columns, schema has {}",
            rg.columns.len(),
            schema_descr.num_columns()
        )));
    }
    let mut columns = Vec::with_capacity(rg.columns.len());
    for (i, col) in rg.columns.into_iter().enumerate() {
        columns.push(build_column_chunk(col, schema_descr.column(i))?);
    }
    Ok(RowGroupMetaData::new(
        columns,
        rg.num_rows,
        rg.total_byte_size,
        schema_descr.clone(),
    ))
}

fn build_column_chunk(
    chunk: parquet_format::ColumnChunk,
    descr: crate::schema::types::ColumnDescPtr,
) -> Result<ColumnChunkMetaData> {
    let meta = chunk.meta_data.ok_or_else(|| {
        ParquetError::CorruptFooter("column chunk is missing meta_data".to_owned())
    })?;
    let physical_type = crate::basic::Type::from(meta.type_);
    let statistics = metadata::from_thrift(physical_type, meta.statistics);
    Ok(ColumnChunkMetaData::new(
        descr,
        meta.encodings.into_iter().map(Encoding::from).collect(),
        ColumnPath::new(meta.path_in_schema),
        Compression::from(meta.codec),
        meta.num_values,
        meta.total_compressed_size,
        meta.total_uncompressed_size,
        meta.data_page_offset,
        meta.dictionary_page_offset,
        statistics,
        chunk.file_offset,
    ))
}

/// Serializes `FileMetaData` (plus every row group) back into the thrift
/// compact-protocol record tree the writer emits.
pub fn to_thrift(
    file_metadata: &FileMetaData,
    row_groups: &[parquet_format::RowGroup],
) -> parquet_format::FileMetaData {
    let schema = flatten_schema(file_metadata.schema());
    parquet_format::FileMetaData {
        version: file_metadata.version(),
        schema,
        num_rows: file_metadata.num_rows(),
        row_groups: row_groups.to_vec(),
        key_value_metadata: file_metadata.key_value_metadata().map(|kvs| {
            kvs.iter()
                .map(|(k, v)| parquet_format::KeyValue {
                    key: k.clone(),
                    value: v.clone(),
                })
                .collect()
        }),
        created_by: file_metadata.created_by().map(|s| s.to_owned()),
        column_orders: None,
        encryption_algorithm: None,
        footer_signing_key_metadata: None,
    }
}

fn flatten_schema(root: &SchemaType) -> Vec<parquet_format::SchemaElement> {
    let mut out = Vec::new();
    flatten_schema_node(root, &mut out, true);
    out
}

fn flatten_schema_node(node: &SchemaType, out: &mut Vec<parquet_format::SchemaElement>, is_root: bool) {
    match node {
        SchemaType::GroupType { basic_info, fields } => {
            out.push(parquet_format::SchemaElement {
                type_: None,
                type_length: None,
                repetition_type: if is_root {
                    None
                } else {
                    basic_info.repetition().map(|r| r.into())
                },
                name: basic_info.name().to_owned(),
                num_children: Some(fields.len() as i32),
                converted_type: None,
                scale: None,
                precision: None,
                field_id: basic_info.id(),
                logical_type: None,
            });
            for field in fields {
                flatten_schema_node(field, out, false);
            }
        }
        SchemaType::PrimitiveType {
            basic_info,
            physical_type,
            type_length,
            scale,
            precision,
        } => {
            out.push(parquet_format::SchemaElement {
                type_: Some((*physical_type).into()),
                type_length: if *type_length >= 0 { Some(*type_length) } else { None },
                repetition_type: basic_info.repetition().map(|r| r.into()),
                name: basic_info.name().to_owned(),
                num_children: None,
                converted_type: None,
                scale: if *scale >= 0 { Some(*scale) } else { None },
                precision: if *precision >= 0 { Some(*precision) } else { None },
                field_id: basic_info.id(),
                logical_type: None,
            });
        }
    }
}

/// The inverse of `build_column_chunk`: re-encodes a written column chunk's
/// metadata into the thrift record `SerializedFileWriter::close` embeds in
/// the footer.
pub fn column_chunk_to_thrift(meta: &ColumnChunkMetaData) -> parquet_format::ColumnChunk {
    let column_metadata = parquet_format::ColumnMetaData {
        type_: meta.column_descr().physical_type().into(),
        encodings: meta.encodings().iter().map(|e| (*e).into()).collect(),
        path_in_schema: meta.column_path().parts().to_vec(),
        codec: meta.compression().into(),
        num_values: meta.num_values(),
        total_uncompressed_size: meta.uncompressed_size(),
        total_compressed_size: meta.compressed_size(),
        key_value_metadata: None,
        data_page_offset: meta.data_page_offset(),
        index_page_offset: None,
        dictionary_page_offset: meta.dictionary_page_offset(),
        statistics: meta.statistics().map(metadata::to_thrift),
        encoding_stats: None,
        bloom_filter_offset: None,
    };
    parquet_format::ColumnChunk {
        file_path: None,
        file_offset: meta.file_offset(),
        meta_data: Some(column_metadata),
        offset_index_offset: None,
        offset_index_length: None,
        column_index_offset: None,
        column_index_length: None,
        crypto_metadata: None,
        encrypted_column_metadata: None,
    }
}

/// The inverse of `build_row_group`.
pub fn row_group_to_thrift(meta: &RowGroupMetaData) -> parquet_format::RowGroup {
    parquet_format::RowGroup {
        columns: meta.columns().iter().map(column_chunk_to_thrift).collect(),
        total_byte_size: meta.total_byte_size(),
        num_rows: meta.num_rows(),
        sorting_columns: None,
        file_offset: None,
        total_compressed_size: None,
        ordinal: None,
    }
}

/// Serializes a decoded `FileMetaData`/row-group pair with the compact
/// protocol, used by `SerializedFileWriter::close` before appending the
/// 4-byte length and trailing magic.
pub fn write_metadata(
    file_metadata: &FileMetaData,
    row_groups: &[parquet_format::RowGroup],
) -> Result<Vec<u8>> {
    let t_file_metadata = to_thrift(file_metadata, row_groups);
    let mut buf = Vec::new();
    {
        let mut prot = TCompactOutputProtocol::new(Cursor::new(&mut buf));
        t_file_metadata
            .write_to_out_protocol(&mut prot)
            .map_err(|e| ParquetError::General(format!("underlying Thrift error: {}", e)))?;
    }
    Ok(buf)
}
