//! Conversion of record batches into JSON rows.
//!
//! [`project_batch`] first narrows a batch to the columns a stream emits.
//! [`normalize_batch`] runs on every batch before conversion and replaces
//! NaN in float columns with nulls. [`batch_to_rows`] then turns each row
//! into a field-name to value mapping.

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, RecordBatch};
use arrow::compute::{cast, nullif};
use arrow::datatypes::{
    ArrowPrimitiveType, ArrowTemporalType, DataType, Date32Type, Date64Type, Decimal128Type,
    Decimal256Type, Float16Type, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type,
    Int64Type, Schema, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType, UInt8Type, UInt16Type, UInt32Type, UInt64Type,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use snafu::prelude::*;

use crate::error::{NormalizeSnafu, ReaderError, UnsupportedColumnSnafu};
use crate::time::format_timestamp;

/// One record: field name to JSON value.
pub type Row = Map<String, Value>;

/// Keep only the columns named in `fields`, in file order.
///
/// Columns a stream does not emit are never converted, so they cannot fail
/// conversion.
pub fn project_batch<'a>(
    batch: &RecordBatch,
    fields: impl IntoIterator<Item = &'a str>,
) -> Result<RecordBatch, ReaderError> {
    let keep: HashSet<&str> = fields.into_iter().collect();
    let indices: Vec<usize> = batch
        .schema()
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, field)| keep.contains(field.name().as_str()))
        .map(|(index, _)| index)
        .collect();

    batch.project(&indices).context(NormalizeSnafu {
        column: "<projection>",
    })
}

/// Replace NaN values in float columns with nulls.
///
/// Affected fields become nullable. Other columns are passed through.
pub fn normalize_batch(batch: &RecordBatch) -> Result<RecordBatch, ReaderError> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut columns = Vec::with_capacity(batch.num_columns());

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let nan_mask = match column.data_type() {
            DataType::Float32 => Some(BooleanArray::from_unary(
                column.as_primitive::<Float32Type>(),
                |v| v.is_nan(),
            )),
            DataType::Float64 => Some(BooleanArray::from_unary(
                column.as_primitive::<Float64Type>(),
                |v| v.is_nan(),
            )),
            _ => None,
        };

        match nan_mask {
            Some(mask) if mask.true_count() > 0 => {
                let replaced = nullif(column, &mask).context(NormalizeSnafu {
                    column: field.name(),
                })?;
                fields.push(Arc::new(field.as_ref().clone().with_nullable(true)));
                columns.push(replaced);
            }
            _ => {
                fields.push(Arc::clone(field));
                columns.push(Arc::clone(column));
            }
        }
    }

    let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
    RecordBatch::try_new(Arc::new(schema), columns).context(NormalizeSnafu {
        column: "<batch>",
    })
}

/// Convert every row of a batch into a JSON object keyed by column name.
pub fn batch_to_rows(batch: &RecordBatch) -> Result<Vec<Row>, ReaderError> {
    let schema = batch.schema();
    let mut rows = vec![Row::new(); batch.num_rows()];

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let values = column_values(field.name(), column)?;
        for (row, value) in rows.iter_mut().zip(values) {
            row.insert(field.name().clone(), value);
        }
    }

    Ok(rows)
}

fn primitive_values<T, F>(array: &dyn Array, convert: F) -> Vec<Value>
where
    T: ArrowPrimitiveType,
    F: Fn(T::Native) -> Value,
{
    array
        .as_primitive::<T>()
        .iter()
        .map(|v| v.map_or(Value::Null, &convert))
        .collect()
}

fn timestamp_value(ts: Option<DateTime<Utc>>) -> Value {
    ts.map_or(Value::Null, |ts| Value::String(format_timestamp(&ts)))
}

fn decimal_value(repr: String) -> Value {
    repr.parse::<f64>().map_or(Value::Null, Value::from)
}

/// JSON values of one column, one per row.
fn column_values(name: &str, array: &ArrayRef) -> Result<Vec<Value>, ReaderError> {
    let values = match array.data_type() {
        DataType::Null => vec![Value::Null; array.len()],
        DataType::Boolean => array
            .as_boolean()
            .iter()
            .map(|v| v.map_or(Value::Null, Value::Bool))
            .collect(),
        DataType::Int8 => primitive_values::<Int8Type, _>(array, Value::from),
        DataType::Int16 => primitive_values::<Int16Type, _>(array, Value::from),
        DataType::Int32 => primitive_values::<Int32Type, _>(array, Value::from),
        DataType::Int64 => primitive_values::<Int64Type, _>(array, Value::from),
        DataType::UInt8 => primitive_values::<UInt8Type, _>(array, Value::from),
        DataType::UInt16 => primitive_values::<UInt16Type, _>(array, Value::from),
        DataType::UInt32 => primitive_values::<UInt32Type, _>(array, Value::from),
        DataType::UInt64 => primitive_values::<UInt64Type, _>(array, Value::from),
        // Non-finite floats have no JSON form and become null
        DataType::Float16 => primitive_values::<Float16Type, _>(array, |v| Value::from(v.to_f64())),
        DataType::Float32 => primitive_values::<Float32Type, _>(array, |v| Value::from(v as f64)),
        DataType::Float64 => primitive_values::<Float64Type, _>(array, Value::from),
        DataType::Decimal128(_, _) => {
            let decimals = array.as_primitive::<Decimal128Type>();
            (0..decimals.len())
                .map(|i| match decimals.is_valid(i) {
                    true => decimal_value(decimals.value_as_string(i)),
                    false => Value::Null,
                })
                .collect()
        }
        DataType::Decimal256(_, _) => {
            let decimals = array.as_primitive::<Decimal256Type>();
            (0..decimals.len())
                .map(|i| match decimals.is_valid(i) {
                    true => decimal_value(decimals.value_as_string(i)),
                    false => Value::Null,
                })
                .collect()
        }
        DataType::Utf8 => string_values(array.as_string::<i32>().iter()),
        DataType::LargeUtf8 => string_values(array.as_string::<i64>().iter()),
        DataType::Utf8View => string_values(array.as_string_view().iter()),
        DataType::Date32 => date_values::<Date32Type>(array),
        DataType::Date64 => date_values::<Date64Type>(array),
        DataType::Timestamp(TimeUnit::Second, _) => {
            primitive_values::<TimestampSecondType, _>(array, |v| {
                timestamp_value(DateTime::from_timestamp(v, 0))
            })
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            primitive_values::<TimestampMillisecondType, _>(array, |v| {
                timestamp_value(DateTime::from_timestamp_millis(v))
            })
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            primitive_values::<TimestampMicrosecondType, _>(array, |v| {
                timestamp_value(DateTime::from_timestamp_micros(v))
            })
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            primitive_values::<TimestampNanosecondType, _>(array, |v| {
                timestamp_value(Some(DateTime::from_timestamp_nanos(v)))
            })
        }
        DataType::List(_) => {
            let list = array.as_list::<i32>();
            nested_values(name, list.len(), |i| list.is_valid(i).then(|| list.value(i)))?
        }
        DataType::LargeList(_) => {
            let list = array.as_list::<i64>();
            nested_values(name, list.len(), |i| list.is_valid(i).then(|| list.value(i)))?
        }
        DataType::FixedSizeList(_, _) => {
            let list = array.as_fixed_size_list();
            nested_values(name, list.len(), |i| list.is_valid(i).then(|| list.value(i)))?
        }
        DataType::Struct(fields) => {
            let strukt = array.as_struct();
            let children = fields
                .iter()
                .zip(strukt.columns())
                .map(|(field, child)| {
                    let path = format!("{name}.{}", field.name());
                    Ok((field.name().clone(), column_values(&path, child)?))
                })
                .collect::<Result<Vec<_>, ReaderError>>()?;

            (0..strukt.len())
                .map(|i| match strukt.is_valid(i) {
                    true => Value::Object(
                        children
                            .iter()
                            .map(|(key, values)| (key.clone(), values[i].clone()))
                            .collect(),
                    ),
                    false => Value::Null,
                })
                .collect()
        }
        DataType::Dictionary(_, value_type) => {
            let decoded = cast(array, value_type).context(NormalizeSnafu { column: name })?;
            column_values(name, &decoded)?
        }
        other => {
            return UnsupportedColumnSnafu {
                column: name,
                data_type: other.to_string(),
            }
            .fail();
        }
    };

    Ok(values)
}

fn string_values<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<Value> {
    values
        .map(|v| v.map_or(Value::Null, |s| Value::String(s.to_string())))
        .collect()
}

fn date_values<T>(array: &dyn Array) -> Vec<Value>
where
    T: ArrowTemporalType,
    i64: From<T::Native>,
{
    let dates = array.as_primitive::<T>();
    (0..dates.len())
        .map(|i| {
            dates
                .is_valid(i)
                .then(|| dates.value_as_date(i))
                .flatten()
                .map_or(Value::Null, |d| Value::String(d.format("%Y-%m-%d").to_string()))
        })
        .collect()
}

fn nested_values<F>(name: &str, len: usize, element: F) -> Result<Vec<Value>, ReaderError>
where
    F: Fn(usize) -> Option<ArrayRef>,
{
    (0..len)
        .map(|i| match element(i) {
            Some(items) => Ok(Value::Array(column_values(name, &items)?)),
            None => Ok(Value::Null),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{
        BinaryArray, Date32Array, DictionaryArray, Float64Array, Int32Array, ListArray, StringArray,
        StructArray, TimestampMicrosecondArray,
    };
    use arrow::datatypes::{Field, Int32Type};
    use serde_json::json;

    fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
        RecordBatch::try_from_iter(columns).unwrap()
    }

    #[test]
    fn test_normalize_replaces_nan_with_null() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("x", DataType::Float64, false),
            Field::new("id", DataType::Int32, false),
        ]));
        let input = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Float64Array::from(vec![1.5, f64::NAN, 3.0])),
                Arc::new(Int32Array::from(vec![1, 2, 3])),
            ],
        )
        .unwrap();

        let normalized = normalize_batch(&input).unwrap();

        let x = normalized.column(0).as_primitive::<Float64Type>();
        assert_eq!(x.null_count(), 1);
        assert!(x.is_null(1));
        assert_eq!(x.value(2), 3.0);
        assert!(normalized.schema().field(0).is_nullable());
        assert!(!normalized.schema().field(1).is_nullable());
        assert_eq!(input.column(0).null_count(), 0);
    }

    #[test]
    fn test_projection_keeps_named_columns_in_file_order() {
        let input = batch(vec![
            ("id", Arc::new(Int32Array::from(vec![1, 2])) as ArrayRef),
            (
                "thumb",
                Arc::new(BinaryArray::from(vec![b"a".as_ref(), b"b".as_ref()])) as ArrayRef,
            ),
            ("name", Arc::new(StringArray::from(vec!["x", "y"])) as ArrayRef),
        ]);

        let projected = project_batch(&input, ["name", "id", "missing"]).unwrap();

        let names: Vec<_> = projected
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(projected.num_rows(), 2);
        assert_eq!(
            batch_to_rows(&projected).unwrap()[1],
            json!({"id": 2, "name": "y"}).as_object().unwrap().clone()
        );
    }

    #[test]
    fn test_projection_to_no_columns_keeps_row_count() {
        let input = batch(vec![("id", Arc::new(Int32Array::from(vec![1, 2, 3])) as ArrayRef)]);

        let projected = project_batch(&input, std::iter::empty()).unwrap();

        assert_eq!(projected.num_columns(), 0);
        assert_eq!(batch_to_rows(&projected).unwrap().len(), 3);
    }

    #[test]
    fn test_normalize_without_nan_is_unchanged() {
        let input = batch(vec![(
            "x",
            Arc::new(Float64Array::from(vec![Some(1.0), None])) as ArrayRef,
        )]);
        assert_eq!(normalize_batch(&input).unwrap(), input);
    }

    #[test]
    fn test_rows_from_scalar_columns() {
        let input = batch(vec![
            ("id", Arc::new(Int32Array::from(vec![Some(1), None])) as ArrayRef),
            (
                "name",
                Arc::new(StringArray::from(vec![Some("a"), Some("b")])) as ArrayRef,
            ),
            (
                "score",
                Arc::new(Float64Array::from(vec![f64::INFINITY, 0.5])) as ArrayRef,
            ),
        ]);

        let rows = batch_to_rows(&input).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            Value::Object(rows[0].clone()),
            json!({"id": 1, "name": "a", "score": null})
        );
        assert_eq!(
            Value::Object(rows[1].clone()),
            json!({"id": null, "name": "b", "score": 0.5})
        );
    }

    #[test]
    fn test_rows_format_dates_and_timestamps() {
        let input = batch(vec![
            ("day", Arc::new(Date32Array::from(vec![18293])) as ArrayRef),
            (
                "at",
                Arc::new(
                    TimestampMicrosecondArray::from(vec![1_580_515_200_000_000])
                        .with_timezone("UTC"),
                ) as ArrayRef,
            ),
        ]);

        let rows = batch_to_rows(&input).unwrap();
        assert_eq!(rows[0]["day"], json!("2020-02-01"));
        assert_eq!(rows[0]["at"], json!("2020-02-01T00:00:00+00:00"));
    }

    #[test]
    fn test_rows_from_nested_columns() {
        let list = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![
            Some(vec![Some(1), Some(2)]),
            None,
        ]);
        let strukt = StructArray::from(vec![(
            Arc::new(Field::new("k", DataType::Utf8, true)),
            Arc::new(StringArray::from(vec!["x", "y"])) as ArrayRef,
        )]);
        let dict: DictionaryArray<Int32Type> = vec!["red", "blue"].into_iter().collect();

        let input = batch(vec![
            ("tags", Arc::new(list) as ArrayRef),
            ("attrs", Arc::new(strukt) as ArrayRef),
            ("color", Arc::new(dict) as ArrayRef),
        ]);

        let rows = batch_to_rows(&input).unwrap();
        assert_eq!(rows[0]["tags"], json!([1, 2]));
        assert_eq!(rows[1]["tags"], Value::Null);
        assert_eq!(rows[0]["attrs"], json!({"k": "x"}));
        assert_eq!(rows[1]["color"], json!("blue"));
    }

    #[test]
    fn test_unsupported_column_is_named() {
        let input = batch(vec![(
            "blob",
            Arc::new(BinaryArray::from(vec![b"ab".as_ref()])) as ArrayRef,
        )]);

        let err = batch_to_rows(&input).unwrap_err();
        assert!(
            matches!(err, ReaderError::UnsupportedColumn { ref column, .. } if column == "blob")
        );
    }
}
