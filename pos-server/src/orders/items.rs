//! Line item normalization
//!
//! POS clients of different generations post items in slightly different
//! shapes (`itemName` or `name`, `quantity` or `qty`, addons as objects or bare
//! strings). Everything is parsed into [`OrderItem`] here; the first malformed
//! entry rejects the whole order with its path, e.g. `items[1].addons[0].price`.

use serde_json::{Map, Value};
use shared::models::{Addon, OrderItem};
use shared::{AppError, AppResult, ErrorCode};

fn invalid(path: &str, msg: &str) -> AppError {
    AppError::with_message(ErrorCode::InvalidOrderItem, format!("{}: {}", path, msg))
        .with_detail("field", path)
}

/// First present, non-null field among `names`
fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<(&'a str, &'a Value)> {
    names.iter().find_map(|name| {
        obj.get_key_value(*name)
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.as_str(), v))
    })
}

fn non_empty_string(value: &Value, path: &str) -> AppResult<String> {
    match value.as_str().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        Some(_) => Err(invalid(path, "must not be empty")),
        None => Err(invalid(path, "must be a string")),
    }
}

fn price(value: &Value, path: &str) -> AppResult<f64> {
    match value.as_f64() {
        Some(p) if p.is_finite() && p >= 0.0 => Ok(p),
        Some(_) => Err(invalid(path, "must be a number >= 0")),
        None => Err(invalid(path, "must be a number")),
    }
}

fn quantity(value: &Value, path: &str) -> AppResult<u32> {
    let n = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        _ => None,
    };
    match n.and_then(|n| u32::try_from(n).ok()) {
        Some(q) if q >= 1 => Ok(q),
        _ => Err(invalid(path, "must be an integer >= 1")),
    }
}

fn menu_item_id(value: &Value, path: &str) -> AppResult<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::Number(n) if n.is_u64() || n.is_i64() => Ok(n.to_string()),
        _ => Err(invalid(path, "must be a string or integer id")),
    }
}

fn addon(value: &Value, path: &str) -> AppResult<Addon> {
    match value {
        Value::String(_) => Ok(Addon {
            name: non_empty_string(value, path)?,
            price: 0.0,
        }),
        Value::Object(obj) => {
            let name = match obj.get("name") {
                Some(v) => non_empty_string(v, &format!("{}.name", path))?,
                None => return Err(invalid(&format!("{}.name", path), "is required")),
            };
            let price = match obj.get("price").filter(|v| !v.is_null()) {
                Some(v) => price(v, &format!("{}.price", path))?,
                None => 0.0,
            };
            Ok(Addon { name, price })
        }
        _ => Err(invalid(path, "must be an object or a string")),
    }
}

fn item(value: &Value, path: &str) -> AppResult<OrderItem> {
    let obj = value
        .as_object()
        .ok_or_else(|| invalid(path, "must be an object"))?;

    let item_name = match field(obj, &["itemName", "name"]) {
        Some((key, v)) => non_empty_string(v, &format!("{}.{}", path, key))?,
        None => return Err(invalid(&format!("{}.itemName", path), "is required")),
    };

    let quantity = match field(obj, &["quantity", "qty"]) {
        Some((key, v)) => quantity(v, &format!("{}.{}", path, key))?,
        None => return Err(invalid(&format!("{}.quantity", path), "is required")),
    };

    let price = match field(obj, &["price"]) {
        Some((key, v)) => price(v, &format!("{}.{}", path, key))?,
        None => return Err(invalid(&format!("{}.price", path), "is required")),
    };

    let menu_item_id = field(obj, &["menuItemId", "_id"])
        .map(|(key, v)| menu_item_id(v, &format!("{}.{}", path, key)))
        .transpose()?;

    let addons = match obj.get("addons") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(list)) => list
            .iter()
            .enumerate()
            .map(|(i, a)| addon(a, &format!("{}.addons[{}]", path, i)))
            .collect::<AppResult<Vec<_>>>()?,
        Some(_) => return Err(invalid(&format!("{}.addons", path), "must be an array")),
    };

    Ok(OrderItem {
        menu_item_id,
        item_name,
        quantity,
        price,
        addons,
    })
}

/// Parse raw request items into line items
pub fn normalize_items(raw: &[Value]) -> AppResult<Vec<OrderItem>> {
    raw.iter()
        .enumerate()
        .map(|(i, v)| item(v, &format!("items[{}]", i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_of(err: &AppError) -> &str {
        err.details.as_ref().unwrap()["field"].as_str().unwrap()
    }

    #[test]
    fn test_canonical_shape() {
        let items = normalize_items(&[json!({
            "menuItemId": "m-chai",
            "itemName": "Masala Chai",
            "quantity": 2,
            "price": 20,
            "addons": [{"name": "Ginger", "price": 5}]
        })])
        .unwrap();

        assert_eq!(
            items,
            vec![OrderItem {
                menu_item_id: Some("m-chai".into()),
                item_name: "Masala Chai".into(),
                quantity: 2,
                price: 20.0,
                addons: vec![Addon {
                    name: "Ginger".into(),
                    price: 5.0
                }],
            }]
        );
    }

    #[test]
    fn test_short_field_names() {
        let items = normalize_items(&[
            json!({"name": "Chai", "qty": 2, "price": 20}),
            json!({"name": "Samosa", "qty": 1, "price": 15, "_id": 17}),
        ])
        .unwrap();

        assert_eq!(items[0].item_name, "Chai");
        assert_eq!(items[0].quantity, 2);
        assert!(items[0].addons.is_empty());
        assert_eq!(items[1].menu_item_id.as_deref(), Some("17"));
    }

    #[test]
    fn test_string_addons_and_defaults() {
        let items = normalize_items(&[json!({
            "itemName": "Bun Maska",
            "quantity": 1.0,
            "price": 30.5,
            "addons": ["Extra butter", {"name": "Jam"}]
        })])
        .unwrap();

        assert_eq!(items[0].quantity, 1);
        assert_eq!(
            items[0].addons,
            vec![
                Addon {
                    name: "Extra butter".into(),
                    price: 0.0
                },
                Addon {
                    name: "Jam".into(),
                    price: 0.0
                },
            ]
        );
    }

    #[test]
    fn test_rejects_bad_quantity() {
        for qty in [json!(0), json!(-1), json!(1.5), json!("2")] {
            let err =
                normalize_items(&[json!({"itemName": "Chai", "quantity": qty, "price": 20})])
                    .unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidOrderItem);
            assert_eq!(field_of(&err), "items[0].quantity");
        }
    }

    #[test]
    fn test_rejects_negative_price() {
        let err = normalize_items(&[
            json!({"itemName": "Chai", "quantity": 1, "price": 20}),
            json!({"itemName": "Samosa", "qty": 1, "price": -15}),
        ])
        .unwrap_err();
        assert_eq!(field_of(&err), "items[1].price");
        assert!(err.message.starts_with("items[1].price:"));
    }

    #[test]
    fn test_rejects_malformed_addon() {
        let err = normalize_items(&[json!({
            "itemName": "Chai",
            "quantity": 1,
            "price": 20,
            "addons": [{"name": "Ginger", "price": "free"}]
        })])
        .unwrap_err();
        assert_eq!(field_of(&err), "items[0].addons[0].price");

        let err = normalize_items(&[json!({
            "itemName": "Chai",
            "quantity": 1,
            "price": 20,
            "addons": [42]
        })])
        .unwrap_err();
        assert_eq!(field_of(&err), "items[0].addons[0]");

        let err = normalize_items(&[json!({
            "itemName": "Chai",
            "quantity": 1,
            "price": 20,
            "addons": [{"price": 5}]
        })])
        .unwrap_err();
        assert_eq!(field_of(&err), "items[0].addons[0].name");
    }

    #[test]
    fn test_rejects_missing_fields() {
        let err = normalize_items(&[json!({"quantity": 1, "price": 20})]).unwrap_err();
        assert_eq!(field_of(&err), "items[0].itemName");

        let err = normalize_items(&[json!({"itemName": "Chai", "price": 20})]).unwrap_err();
        assert_eq!(field_of(&err), "items[0].quantity");

        let err = normalize_items(&[json!({"itemName": "  ", "quantity": 1, "price": 20})])
            .unwrap_err();
        assert_eq!(field_of(&err), "items[0].itemName");

        let err = normalize_items(&[json!("Chai")]).unwrap_err();
        assert_eq!(field_of(&err), "items[0]");
    }
}
