//! A minimal structural schema for `match_schema`.

use crate::value::Value;

/// A structural shape description. Only the subset `match_schema` needs:
/// declared type, optional required table keys, and optional recursive
/// per-key schemas.
pub enum Schema {
    AnyType,
    Type(&'static str),
    Table(Vec<(String, Schema)>),
    ArrayOf(Box<Schema>),
}

impl Schema {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Schema::AnyType => true,
            Schema::Type(name) => value.type_name() == *name,
            Schema::Table(fields) => fields.iter().all(|(key, schema)| {
                value
                    .get_property(key)
                    .map(|v| schema.matches(&v))
                    .unwrap_or(false)
            }),
            Schema::ArrayOf(inner) => match value {
                Value::Array(items) => items.borrow().iter().all(|item| inner.matches(item)),
                _ => false,
            },
        }
    }
}
