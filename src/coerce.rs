//! Conversion of resolved override text into typed field values.
//!
//! The policy is fixed per [`FieldKind`]:
//!
//! | Kind | Accepted text |
//! |------|---------------|
//! | `integer` | `i64`, surrounding whitespace ignored |
//! | `float` | finite `f64`, surrounding whitespace ignored |
//! | `boolean` | `true` / `false`, ASCII case-insensitive |
//! | `string` | anything, kept verbatim |
//! | `symbol` | one of the declared variants, exact match |

use serde::Serialize;

use crate::error::FieldError;
use crate::schema::FieldKind;

/// A typed field value, serialized as a bare JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Symbol(String),
}

/// Coerce `raw` into a value of `kind`. `field` is only used for error reporting.
pub fn coerce(field: &str, raw: &str, kind: &FieldKind) -> Result<FieldValue, FieldError> {
    let fail = || FieldError::TypeCoercion {
        field: field.to_string(),
        raw: raw.to_string(),
        target: kind.clone(),
    };

    match kind {
        FieldKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|_| fail()),
        FieldKind::Float => match raw.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(FieldValue::Float(f)),
            _ => Err(fail()),
        },
        FieldKind::Boolean => {
            let s = raw.trim();
            if s.eq_ignore_ascii_case("true") {
                Ok(FieldValue::Boolean(true))
            } else if s.eq_ignore_ascii_case("false") {
                Ok(FieldValue::Boolean(false))
            } else {
                Err(fail())
            }
        }
        FieldKind::String => Ok(FieldValue::String(raw.to_string())),
        FieldKind::Symbol(variants) => variants
            .iter()
            .find(|v| v.as_str() == raw)
            .map(|v| FieldValue::Symbol(v.clone()))
            .ok_or_else(fail),
    }
}
