use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Clamp a quantity to `>= 0`. NaN and infinities become 0.
pub fn non_negative(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 {
        x
    } else {
        0.0
    }
}

/// Clamp a percentage to `[0, 100]`. NaN and infinities become 0.
pub fn percent(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Parse user-entered numeric text. Blank or malformed text is 0.
pub fn coerce_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            if !trimmed.is_empty() {
                tracing::warn!(value = trimmed, "not a number, using 0");
            }
            0.0
        }
    }
}

/// A flat set of usage parameters for one engine, persisted as one JSON object.
pub trait ParameterBundle: Serialize + DeserializeOwned + Default + Clone {
    /// Storage key for this bundle.
    const KEY: &'static str;

    /// Copy with every field clamped into its valid domain.
    fn sanitized(&self) -> Self;

    /// Apply a single `field=value` edit.
    fn assign(&mut self, field: &str, raw: &str) -> Result<()> {
        assign_field(self, field, raw)
    }

    /// Field names accepted by [`ParameterBundle::assign`].
    fn field_names() -> Vec<String> {
        match serde_json::to_value(Self::default()) {
            Ok(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

/// Set one top-level field by name, going through the bundle's JSON form.
/// String fields take the raw text. Blank text or `none` clears an optional
/// field; every other value is coerced to a number.
pub fn assign_field<T>(bundle: &mut T, field: &str, raw: &str) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(&*bundle)?;
    let Some(map) = value.as_object_mut() else {
        bail!("parameter bundle is not an object");
    };

    if !map.contains_key(field) {
        let mut known: Vec<&str> = map.keys().map(String::as_str).collect();
        known.sort_unstable();
        bail!("unknown field `{field}` (expected one of: {})", known.join(", "));
    }

    let slot = map
        .get_mut(field)
        .with_context(|| format!("unknown field `{field}`"))?;
    if slot.is_string() {
        *slot = Value::String(raw.trim().to_string());
    } else {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            *slot = Value::Null;
            if let Ok(b) = serde_json::from_value(value.clone()) {
                *bundle = b;
                return Ok(());
            }
            // Not optional: blank counts as 0.
            if let Some(slot) = value.get_mut(field) {
                *slot = serde_json::json!(0.0);
            }
        } else {
            *slot = serde_json::json!(coerce_number(raw));
        }
    }

    *bundle = serde_json::from_value(value)
        .with_context(|| format!("invalid value `{raw}` for `{field}`"))?;
    Ok(())
}

/// Split `field=value`.
pub fn parse_assignment(s: &str) -> Result<(String, String)> {
    let Some((field, value)) = s.split_once('=') else {
        bail!("expected FIELD=VALUE, got `{s}`");
    };
    let field = field.trim();
    if field.is_empty() {
        bail!("empty field name in `{s}`");
    }
    Ok((field.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Sample {
        name: String,
        count: f64,
        cap: Option<f64>,
    }

    #[test]
    fn clamps() {
        assert_eq!(non_negative(-3.0), 0.0);
        assert_eq!(non_negative(f64::NAN), 0.0);
        assert_eq!(non_negative(f64::INFINITY), 0.0);
        assert_eq!(non_negative(4.5), 4.5);
        assert_eq!(percent(-1.0), 0.0);
        assert_eq!(percent(150.0), 100.0);
        assert_eq!(percent(f64::NAN), 0.0);
        assert_eq!(percent(12.5), 12.5);
    }

    #[test]
    fn coerce_malformed_text_to_zero() {
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("abc"), 0.0);
        assert_eq!(coerce_number("NaN"), 0.0);
        assert_eq!(coerce_number(" 42 "), 42.0);
        assert_eq!(coerce_number("1.5"), 1.5);
    }

    #[test]
    fn assign_sets_numbers_and_strings() {
        let mut s = Sample::default();
        assign_field(&mut s, "count", "7").unwrap();
        assign_field(&mut s, "name", " hello ").unwrap();
        assign_field(&mut s, "cap", "3").unwrap();
        assert_eq!(
            s,
            Sample {
                name: "hello".into(),
                count: 7.0,
                cap: Some(3.0),
            }
        );

        assign_field(&mut s, "count", "oops").unwrap();
        assert_eq!(s.count, 0.0);
    }

    #[test]
    fn blank_or_none_clears_optional_fields() {
        let mut s = Sample {
            count: 4.0,
            cap: Some(9.0),
            ..Default::default()
        };
        assign_field(&mut s, "cap", "").unwrap();
        assert_eq!(s.cap, None);

        s.cap = Some(9.0);
        assign_field(&mut s, "cap", "None").unwrap();
        assert_eq!(s.cap, None);

        assign_field(&mut s, "count", " ").unwrap();
        assert_eq!(s.count, 0.0);
        assign_field(&mut s, "count", "none").unwrap();
        assert_eq!(s.count, 0.0);
    }

    #[test]
    fn assign_rejects_unknown_field() {
        let mut s = Sample::default();
        let err = assign_field(&mut s, "nope", "1").unwrap_err();
        assert!(err.to_string().contains("unknown field `nope`"));
    }

    #[test]
    fn parse_assignment_splits_on_first_equals() {
        assert_eq!(
            parse_assignment("seats=10").unwrap(),
            ("seats".to_string(), "10".to_string())
        );
        assert_eq!(
            parse_assignment("a=b=c").unwrap(),
            ("a".to_string(), "b=c".to_string())
        );
        assert!(parse_assignment("seats").is_err());
        assert!(parse_assignment("=3").is_err());
    }
}
