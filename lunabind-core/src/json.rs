//! Conversion between variants and `serde_json` values

use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use crate::variant::{Variant, VariantMap};

impl Variant {
    /// Build a variant from JSON. Integral numbers become `Integer`,
    /// everything else numeric becomes `Real`.
    pub fn from_json(value: &JsonValue) -> Variant {
        match value {
            JsonValue::Null => Variant::Null,
            JsonValue::Bool(b) => Variant::Boolean(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Variant::Integer(i),
                None => Variant::Real(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Variant::String(s.clone()),
            JsonValue::Array(items) => Variant::List(items.iter().map(Variant::from_json).collect()),
            JsonValue::Object(fields) => Variant::Map(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Variant::from_json(v)))
                    .collect::<VariantMap>(),
            ),
        }
    }

    /// JSON form of this variant. `Invalid` and non-finite reals map to `null`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Variant::Invalid | Variant::Null => JsonValue::Null,
            Variant::Boolean(b) => JsonValue::Bool(*b),
            Variant::Integer(i) => JsonValue::Number(Number::from(*i)),
            Variant::Real(r) => Number::from_f64(*r).map_or(JsonValue::Null, JsonValue::Number),
            Variant::String(s) => JsonValue::String(s.clone()),
            Variant::List(items) => JsonValue::Array(items.iter().map(Variant::to_json).collect()),
            Variant::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<JsonMap<String, JsonValue>>(),
            ),
        }
    }
}

impl From<&JsonValue> for Variant {
    fn from(value: &JsonValue) -> Self {
        Variant::from_json(value)
    }
}
