use serde_json::Value;

use crate::outcome::SchemaError;

/// What a listing body contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Length of `items`, if it was present and an array.
    pub item_count: Option<usize>,
    pub schema: Result<(), SchemaError>,
}

impl Payload {
    fn invalid(err: SchemaError) -> Self {
        Self {
            item_count: None,
            schema: Err(err),
        }
    }
}

/// Inspects a listing body of the form `{"items": [{"id": int, "name": str, "price": num}]}`.
///
/// An empty `items` array is valid. Extra fields are ignored.
pub fn inspect(body: &[u8]) -> Payload {
    let Ok(doc) = serde_json::from_slice::<Value>(body) else {
        return Payload::invalid(SchemaError::InvalidJson);
    };

    let Some(items) = doc.get("items") else {
        return Payload::invalid(SchemaError::MissingItems);
    };
    let Some(items) = items.as_array() else {
        return Payload::invalid(SchemaError::ItemsNotArray);
    };

    let schema = items
        .iter()
        .enumerate()
        .try_for_each(|(index, item)| check_item(index, item));

    Payload {
        item_count: Some(items.len()),
        schema,
    }
}

fn check_item(index: usize, item: &Value) -> Result<(), SchemaError> {
    let Some(obj) = item.as_object() else {
        return Err(SchemaError::ItemNotObject { index });
    };

    let fields: [(&'static str, fn(&Value) -> bool); 3] = [
        ("id", |v| v.is_i64() || v.is_u64()),
        ("name", Value::is_string),
        ("price", Value::is_number),
    ];

    for (field, ok) in fields {
        match obj.get(field) {
            None => return Err(SchemaError::MissingField { index, field }),
            Some(v) if !ok(v) => return Err(SchemaError::WrongFieldType { index, field }),
            Some(_) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_items_are_valid() {
        let body = br#"{"items":[{"id":1,"name":"a","price":1.0},{"id":2,"name":"b","price":3}]}"#;
        let p = inspect(body);
        assert_eq!(p.item_count, Some(2));
        assert_eq!(p.schema, Ok(()));
    }

    #[test]
    fn empty_items_is_valid_and_distinct_from_missing() {
        let p = inspect(br#"{"items":[]}"#);
        assert_eq!(p.item_count, Some(0));
        assert_eq!(p.schema, Ok(()));

        let p = inspect(br#"{"data":[]}"#);
        assert_eq!(p.item_count, None);
        assert_eq!(p.schema, Err(SchemaError::MissingItems));
    }

    #[test]
    fn non_array_items_is_invalid() {
        let p = inspect(br#"{"items":{"id":1}}"#);
        assert_eq!(p.item_count, None);
        assert_eq!(p.schema, Err(SchemaError::ItemsNotArray));
    }

    #[test]
    fn garbage_body_is_invalid_json() {
        assert_eq!(inspect(b"<html>").schema, Err(SchemaError::InvalidJson));
        assert_eq!(inspect(b"").schema, Err(SchemaError::InvalidJson));
    }

    #[test]
    fn first_bad_item_is_reported() {
        let body = br#"{"items":[{"id":1,"name":"a","price":1},{"id":2,"name":"b"},{"id":"3"}]}"#;
        let p = inspect(body);
        assert_eq!(p.item_count, Some(3));
        assert_eq!(
            p.schema,
            Err(SchemaError::MissingField {
                index: 1,
                field: "price"
            })
        );
    }

    #[test]
    fn field_types_are_checked() {
        let p = inspect(br#"{"items":[{"id":1.5,"name":"a","price":1}]}"#);
        assert_eq!(
            p.schema,
            Err(SchemaError::WrongFieldType {
                index: 0,
                field: "id"
            })
        );

        let p = inspect(br#"{"items":[{"id":1,"name":7,"price":1}]}"#);
        assert_eq!(
            p.schema,
            Err(SchemaError::WrongFieldType {
                index: 0,
                field: "name"
            })
        );

        let p = inspect(br#"{"items":[{"id":1,"name":"a","price":"9.99"}]}"#);
        assert_eq!(
            p.schema,
            Err(SchemaError::WrongFieldType {
                index: 0,
                field: "price"
            })
        );

        let p = inspect(br#"{"items":[3]}"#);
        assert_eq!(p.schema, Err(SchemaError::ItemNotObject { index: 0 }));
    }
}
