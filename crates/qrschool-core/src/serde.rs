use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexibleId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl FlexibleId {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Signed(n) => n.to_string(),
            Self::Unsigned(n) => n.to_string(),
        }
    }
}

/// Accepts `42` or `"42"` and yields `"42"`.
pub fn deserialize_flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    FlexibleId::deserialize(deserializer).map(FlexibleId::into_string)
}

/// Like [`deserialize_flexible_id`], but `null`, a missing value or an empty
/// string become `None`.
pub fn deserialize_optional_flexible_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<FlexibleId> = Option::deserialize(deserializer)?;
    Ok(opt.map(FlexibleId::into_string).filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(deserialize_with = "deserialize_flexible_id")]
        id: String,
        #[serde(default, deserialize_with = "deserialize_optional_flexible_id")]
        other: Option<String>,
    }

    #[test]
    fn test_numeric_and_string_ids_agree() {
        let a: Holder = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        let b: Holder = serde_json::from_str(r#"{"id": "42"}"#).unwrap();
        assert_eq!(a.id, "42");
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_optional_id_empty_and_null() {
        let missing: Holder = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        let null: Holder = serde_json::from_str(r#"{"id": 1, "other": null}"#).unwrap();
        let empty: Holder = serde_json::from_str(r#"{"id": 1, "other": ""}"#).unwrap();
        let set: Holder = serde_json::from_str(r#"{"id": 1, "other": 7}"#).unwrap();
        assert_eq!(missing.other, None);
        assert_eq!(null.other, None);
        assert_eq!(empty.other, None);
        assert_eq!(set.other.as_deref(), Some("7"));
    }

    #[test]
    fn test_rejects_non_scalar_id() {
        let result = serde_json::from_str::<Holder>(r#"{"id": [1]}"#);
        assert!(result.is_err());
    }
}
