use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Tri-state value of an operator-supplied attribute.
///
/// `Unknown` means the operator did not set the attribute and a default rule
/// applies. `Null` is an explicit absence. Serialized as an optional value;
/// a missing key deserializes to `Unknown` when the field carries
/// `#[serde(default)]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Unknown,
    Null,
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Unknown
    }
}

impl<T> Field<T> {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Field::Unknown)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    /// The concrete value, if one was set.
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(value) => Some(value),
            Field::Unknown | Field::Null => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Field::Value(value) => Some(value),
            Field::Unknown | Field::Null => None,
        }
    }

    /// `None` becomes `Unknown`, so the default rule applies again.
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Field::Unknown, Field::Value)
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Value(value)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Field::Value(value) => serializer.serialize_some(value),
            Field::Unknown | Field::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|value| value.map_or(Field::Null, Field::Value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, Serialize)]
    struct Probe {
        #[serde(default, skip_serializing_if = "Field::is_unknown")]
        zone: Field<String>,
    }

    #[test]
    fn test_missing_key_is_unknown() {
        let probe: Probe = serde_json::from_value(json!({})).unwrap();
        assert!(probe.zone.is_unknown());
    }

    #[test]
    fn test_explicit_null_is_null() {
        let probe: Probe = serde_json::from_value(json!({ "zone": null })).unwrap();
        assert!(probe.zone.is_null());
    }

    #[test]
    fn test_value_is_value() {
        let probe: Probe = serde_json::from_value(json!({ "zone": "rbx" })).unwrap();
        assert_eq!(probe.zone.value().map(String::as_str), Some("rbx"));
    }

    #[test]
    fn test_unknown_is_not_serialized() {
        let probe = Probe {
            zone: Field::Unknown,
        };
        assert_eq!(serde_json::to_value(&probe).unwrap(), json!({}));

        let probe = Probe { zone: Field::Null };
        assert_eq!(serde_json::to_value(&probe).unwrap(), json!({ "zone": null }));
    }

    #[test]
    fn test_from_option() {
        assert!(Field::<bool>::from_option(None).is_unknown());
        assert_eq!(Field::from_option(Some(true)), Field::Value(true));
    }
}
