use ecmap_core::{
    mapping::{CLASS_ID, INSTANCE_ID},
    schema::ec::{ClassId, PrimitiveType},
    stmt::Value,
    view::ViewColumn,
    Result,
};

use indexmap::IndexMap;

/// One instance read through a select view, keyed by access string.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: IndexMap<String, Value>,
}

impl Row {
    /// Types the values of one result row by the view's leaf types.
    pub(super) fn decode(columns: &[ViewColumn], values: Vec<Value>) -> Result<Row> {
        if columns.len() != values.len() {
            ecmap_core::bail!(
                "view returned {} values for {} columns",
                values.len(),
                columns.len()
            );
        }

        let values = columns
            .iter()
            .zip(values)
            .map(|(column, value)| Ok((column.name.clone(), decode(column, value)?)))
            .collect::<Result<_>>()?;

        Ok(Row { values })
    }

    /// Value of an access string, ignoring ASCII case.
    pub fn get(&self, access_string: &str) -> Option<&Value> {
        self.values.get(access_string).or_else(|| {
            self.values
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(access_string))
                .map(|(_, value)| value)
        })
    }

    pub fn instance_id(&self) -> Option<i64> {
        self.get(INSTANCE_ID).and_then(Value::as_i64)
    }

    pub fn class_id(&self) -> Option<ClassId> {
        self.get(CLASS_ID)
            .and_then(Value::as_i64)
            .map(|id| ClassId(id as u64))
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> + '_ {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn decode(column: &ViewColumn, value: Value) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    if !column.array {
        return scalar(&column.name, column.ty, value);
    }

    let json: serde_json::Value = match &value {
        Value::Bytes(bytes) => serde_json::from_slice(bytes)?,
        Value::String(text) => serde_json::from_str(text)?,
        other => ecmap_core::bail!("`{}` holds {other:?}, not an encoded array", column.name),
    };

    match Value::from_json(&json) {
        Value::List(items) => items
            .into_iter()
            .map(|item| scalar(&column.name, column.ty, item))
            .collect::<Result<_>>()
            .map(Value::List),
        other => ecmap_core::bail!("`{}` holds {other:?}, not an encoded array", column.name),
    }
}

/// The engine stores integers for `Integer`, `Boolean` and whole `Double`
/// values, and text for date-times.
fn scalar(name: &str, ty: PrimitiveType, value: Value) -> Result<Value> {
    Ok(match (ty, value) {
        (_, Value::Null) => Value::Null,
        (PrimitiveType::Integer, Value::I64(v)) => match i32::try_from(v) {
            Ok(v) => Value::I32(v),
            Err(_) => ecmap_core::bail!("`{name}` holds {v}, out of range for an Integer"),
        },
        (PrimitiveType::Boolean, Value::I64(v)) => Value::Bool(v != 0),
        (
            PrimitiveType::Double | PrimitiveType::Point2d | PrimitiveType::Point3d,
            Value::I64(v),
        ) => Value::F64(v as f64),
        (PrimitiveType::DateTime, Value::String(text)) => Value::parse_date_time(&text)?,
        (PrimitiveType::Binary | PrimitiveType::Geometry, Value::List(items)) => Value::Bytes(
            items
                .iter()
                .map(|item| item.to_i64().map(|byte| byte as u8))
                .collect::<Result<_>>()?,
        ),
        (_, value) => value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn make_columns() -> Vec<ViewColumn> {
        vec![
            ViewColumn {
                name: "ECInstanceId".into(),
                ty: PrimitiveType::Long,
                array: false,
            },
            ViewColumn {
                name: "Count".into(),
                ty: PrimitiveType::Integer,
                array: false,
            },
            ViewColumn {
                name: "Alive".into(),
                ty: PrimitiveType::Boolean,
                array: false,
            },
            ViewColumn {
                name: "Born".into(),
                ty: PrimitiveType::DateTime,
                array: false,
            },
            ViewColumn {
                name: "Weights".into(),
                ty: PrimitiveType::Double,
                array: true,
            },
        ]
    }

    #[test]
    fn values_are_typed_by_leaf() {
        let row = Row::decode(
            &make_columns(),
            vec![
                Value::I64(7),
                Value::I64(3),
                Value::I64(1),
                Value::from("2024-02-29T13:45:00.000"),
                Value::Bytes(b"[1.5,2]".to_vec()),
            ],
        )
        .unwrap();

        let born = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(13, 45, 0)
            .unwrap();

        assert_eq!(row.instance_id(), Some(7));
        assert_eq!(row.get("count"), Some(&Value::I32(3)));
        assert_eq!(row.get("Alive"), Some(&Value::Bool(true)));
        assert_eq!(row.get("Born"), Some(&Value::DateTime(born)));
        assert_eq!(
            row.get("Weights"),
            Some(&Value::List(vec![Value::F64(1.5), Value::F64(2.0)]))
        );
    }

    #[test]
    fn integers_out_of_range_are_rejected() {
        let columns = &make_columns()[..2];
        let err = Row::decode(columns, vec![Value::I64(1), Value::I64(i64::MAX)]).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
    }
}
