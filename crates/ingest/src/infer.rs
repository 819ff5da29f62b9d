//! CSV schema inference and catalog type mapping.
//!
//! Each run re-infers from scratch and overwrites whatever the catalog held
//! before; there is no schema evolution or conflict resolution.

use crate::error::Result;
use arrow_csv::reader::Format;
use arrow_schema::DataType;
use std::io::Cursor;

/// One inferred column: name, catalog data type, 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredColumn {
    pub name: String,
    pub data_type: String,
    pub order: i32,
}

/// Infer the column layout of a CSV file.
///
/// The first row is taken as the header. Columns with a blank header are
/// dropped. `max_records` bounds how many records the type inference reads;
/// `None` reads the whole file.
pub fn infer_columns(data: &[u8], max_records: Option<usize>) -> Result<Vec<InferredColumn>> {
    let format = Format::default().with_header(true);
    let (schema, _) = format.infer_schema(Cursor::new(data), max_records)?;

    let columns = schema
        .fields()
        .iter()
        .filter(|field| !field.name().trim().is_empty())
        .enumerate()
        .map(|(idx, field)| InferredColumn {
            name: field.name().clone(),
            data_type: catalog_type(field.data_type()).to_string(),
            order: (idx + 1) as i32,
        })
        .collect();

    Ok(columns)
}

/// Map an inferred Arrow type to the catalog's type vocabulary.
///
/// Unknown types fall back to `string`, the way the original dtype map did.
pub fn catalog_type(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Int8 | DataType::Int16 | DataType::Int32 => "int",
        DataType::Int64 => "bigint",
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 => "int",
        DataType::UInt64 => "bigint",
        DataType::Float16 | DataType::Float32 => "float",
        DataType::Float64 => "double",
        DataType::Boolean => "boolean",
        DataType::Utf8 | DataType::LargeUtf8 => "string",
        DataType::Timestamp(_, _) => "timestamp",
        DataType::Date32 | DataType::Date64 => "date",
        _ => "string",
    }
}
