// ── Company domain type ──

use serde::{Deserialize, Deserializer, Serialize};

/// Text shown in place of a missing phone number.
pub const PHONE_PLACEHOLDER: &str = "N/A";

/// One directory entry.
///
/// Decoded fresh from every snapshot and never mutated afterwards. `id` is
/// only a sort key: several records may share one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(default, deserialize_with = "integral_id")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    /// Opened verbatim, never parsed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub webpage: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Company {
    /// Phone number, or `"N/A"` when absent.
    pub fn phone_or_na(&self) -> &str {
        self.phone.as_deref().unwrap_or(PHONE_PLACEHOLDER)
    }

    /// Subtitle line of the large card: `"{city} - Phone: {phone}"`.
    pub fn contact_line(&self) -> String {
        format!("{} - Phone: {}", self.city, self.phone_or_na())
    }

    /// Whether a logo image should be shown instead of the placeholder.
    pub fn has_logo(&self) -> bool {
        self.logo_url.is_some()
    }
}

// ── Field decoders ───────────────────────────────────────────────────

/// `null` reads as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a JSON integer, or a float that holds an integral value.
#[allow(clippy::as_conversions, clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(0);
    };
    if let Some(id) = number.as_i64() {
        return Ok(id);
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => Ok(f as i64),
        _ => Err(serde::de::Error::custom(format!(
            "id {number} is not an integer in range"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decode(value: serde_json::Value) -> Result<Company, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn full_record() {
        let c = decode(json!({
            "id": 3,
            "title": "Acme",
            "city": "Oslo",
            "webpage": "https://acme.example",
            "logoUrl": "https://acme.example/logo.png",
            "phone": "+47 1234"
        }))
        .unwrap();
        assert_eq!(c.id, 3);
        assert_eq!(c.logo_url.as_deref(), Some("https://acme.example/logo.png"));
        assert_eq!(c.contact_line(), "Oslo - Phone: +47 1234");
        assert!(c.has_logo());
    }

    #[test]
    fn missing_and_null_fields_take_defaults() {
        let c = decode(json!({"title": null, "phone": null})).unwrap();
        assert_eq!(c, Company::default());
        assert_eq!(c.phone_or_na(), "N/A");
        assert_eq!(c.contact_line(), " - Phone: N/A");
        assert!(!c.has_logo());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let c = decode(json!({"id": 1, "founded": 1999, "tags": ["x"]})).unwrap();
        assert_eq!(c.id, 1);
    }

    #[test]
    fn integral_float_id_is_accepted() {
        assert_eq!(decode(json!({"id": 7.0})).unwrap().id, 7);
        assert_eq!(decode(json!({"id": null})).unwrap().id, 0);
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(decode(json!({"id": 1.5})).is_err());
        assert!(decode(json!({"id": "1"})).is_err());
        assert!(decode(json!({"id": 1e300})).is_err());
        assert!(decode(json!({"title": 5})).is_err());
        assert!(decode(json!({"phone": true})).is_err());
        assert!(decode(json!("just a string")).is_err());
        assert!(decode(json!([1, 2])).is_err());
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let c = Company {
            id: 1,
            logo_url: Some("l".into()),
            ..Company::default()
        };
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["logoUrl"], "l");
    }
}
