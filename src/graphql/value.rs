//! Conversions between serde values and resolver results.

use async_graphql::dynamic::{FieldFuture, FieldValue};
use async_graphql::Value;
use serde::Serialize;

use super::resolver::{Resolver, erase};
use crate::app_error::AppError;

/// Key a parent object may carry to name its concrete GraphQL type, for
/// fields declared as an interface or union.
pub const TYPENAME_KEY: &str = "__typename";

/// Serialises `value` into a resolver result.
///
/// Objects become parents for their sub-fields, arrays become lists, and
/// JSON `null` resolves to GraphQL `null`.
///
/// ```rust
/// use async_graphql::dynamic::FieldFuture;
/// use trellis::graphql::{ResolverMap, to_field_value};
///
/// #[derive(serde::Serialize)]
/// struct User { id: u32 }
///
/// let resolvers = ResolverMap::new().resolve("Query", "users", |_ctx| {
///     FieldFuture::new(async move { to_field_value(&vec![User { id: 1 }]) })
/// });
/// ```
pub fn to_field_value<'a, T: Serialize + ?Sized>(
    value: &T,
) -> async_graphql::Result<Option<FieldValue<'a>>> {
    let json = serde_json::to_value(value).map_err(AppError::from)?;
    let value = Value::from_json(json).map_err(AppError::from)?;
    Ok(from_value(value))
}

/// Resolver used for non-root fields that have none registered: reads
/// `field` from the parent object.
pub(crate) fn default_resolver(field: String) -> Resolver {
    erase(move |ctx| {
        let child = match ctx.parent_value.as_value() {
            Some(Value::Object(map)) => map.get(field.as_str()).cloned(),
            _ => None,
        };
        FieldFuture::new(async move { Ok(child.and_then(from_value)) })
    })
}

fn from_value<'a>(value: Value) -> Option<FieldValue<'a>> {
    match value {
        Value::Null => None,
        Value::List(items) => Some(FieldValue::list(
            items.into_iter().map(|item| from_value(item).unwrap_or(FieldValue::NULL)),
        )),
        Value::Object(map) => {
            let typename = match map.get(TYPENAME_KEY) {
                Some(Value::String(name)) => Some(name.clone()),
                _ => None,
            };
            let field = FieldValue::value(Value::Object(map));
            Some(match typename {
                Some(name) => field.with_type(name),
                None => field,
            })
        }
        scalar => Some(FieldValue::value(scalar)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn null_resolves_to_none() {
        assert!(to_field_value(&json!(null)).unwrap().is_none());
    }

    #[test]
    fn arrays_become_lists() {
        let value = to_field_value(&json!([1, null, 3])).unwrap().unwrap();
        let items = value.as_list().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].as_value(), Some(&Value::Null));
        assert_eq!(items[2].as_value(), Some(&Value::from(3)));
    }

    #[test]
    fn objects_stay_values() {
        let value = to_field_value(&json!({ "id": 1, "name": "ada" })).unwrap().unwrap();
        let Some(Value::Object(map)) = value.as_value() else {
            panic!("expected an object value");
        };
        assert_eq!(map.get("name"), Some(&Value::from("ada")));
    }
}
