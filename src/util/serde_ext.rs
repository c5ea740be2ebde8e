//! Serde adapters for AWS JSON wire conventions.

/// Timestamps as fractional epoch seconds.
pub(crate) mod epoch_seconds {
    use serde::Serializer;
    use time::OffsetDateTime;

    pub(crate) fn to_f64(value: &OffsetDateTime) -> f64 {
        value.unix_timestamp_nanos() as f64 / 1_000_000_000.0
    }

    pub(crate) fn from_f64(secs: f64) -> Option<OffsetDateTime> {
        if !secs.is_finite() {
            return None;
        }
        let nanos = (secs * 1_000_000_000.0).round() as i128;
        OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
    }

    pub(crate) fn serialize<S: Serializer>(
        value: &OffsetDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(to_f64(value))
    }

    pub(crate) mod option {
        use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
        use time::OffsetDateTime;

        pub(crate) fn serialize<S: Serializer>(
            value: &Option<OffsetDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.serialize_some(&super::to_f64(v)),
                None => serializer.serialize_none(),
            }
        }

        pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<OffsetDateTime>, D::Error> {
            Option::<f64>::deserialize(deserializer)?
                .map(|secs| {
                    super::from_f64(secs).ok_or_else(|| D::Error::custom("timestamp out of range"))
                })
                .transpose()
        }
    }

    pub(crate) mod vec {
        use serde::{Deserialize, Deserializer, de::Error as _};
        use time::OffsetDateTime;

        pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<OffsetDateTime>, D::Error> {
            Vec::<f64>::deserialize(deserializer)?
                .into_iter()
                .map(|secs| {
                    super::from_f64(secs).ok_or_else(|| D::Error::custom("timestamp out of range"))
                })
                .collect()
        }
    }
}

/// Optional RFC 3339 timestamps read from element or string text.
///
/// Goes through `String` rather than `deserialize_any`, which the XML reader
/// answers with a map for elements.
pub(crate) mod rfc3339_text {
    pub(crate) mod option {
        use serde::{Deserialize, Deserializer, de::Error as _};
        use time::{OffsetDateTime, format_description::well_known::Rfc3339};

        pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<OffsetDateTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|text| OffsetDateTime::parse(text.trim(), &Rfc3339).map_err(D::Error::custom))
                .transpose()
        }
    }
}

/// Blobs as standard base64 text.
pub(crate) mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub(crate) fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(D::Error::custom)
    }

    pub(crate) mod vec {
        use base64::{Engine as _, engine::general_purpose::STANDARD};
        use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

        pub(crate) fn serialize<S: Serializer>(
            value: &[Vec<u8>],
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(value.iter().map(|v| STANDARD.encode(v)))
        }

        pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<Vec<u8>>, D::Error> {
            Vec::<String>::deserialize(deserializer)?
                .into_iter()
                .map(|text| STANDARD.decode(text.as_bytes()).map_err(D::Error::custom))
                .collect()
        }
    }
}
