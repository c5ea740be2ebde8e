use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Typed message attribute. `DataType` is `String`, `Number` or `Binary`
/// (optionally with a custom suffix such as `Number.float`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageAttributeValue {
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "optional_base64"
    )]
    pub binary_value: Option<Vec<u8>>,
}

impl MessageAttributeValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            data_type: "String".to_string(),
            string_value: Some(value.into()),
            binary_value: None,
        }
    }

    pub fn number(value: impl ToString) -> Self {
        Self {
            data_type: "Number".to_string(),
            string_value: Some(value.to_string()),
            binary_value: None,
        }
    }

    pub fn binary(value: impl Into<Vec<u8>>) -> Self {
        Self {
            data_type: "Binary".to_string(),
            string_value: None,
            binary_value: Some(value.into()),
        }
    }
}

mod optional_base64 {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub(super) fn serialize<S: Serializer>(
        value: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| STANDARD.decode(text.as_bytes()).map_err(D::Error::custom))
            .transpose()
    }
}

/// A message to send. `id` is filled in by the batch helpers when absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendMessageEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub message_body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<u32>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub message_attributes: HashMap<String, MessageAttributeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_deduplication_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_group_id: Option<String>,
}

impl SendMessageEntry {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            message_body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: MessageAttributeValue) -> Self {
        self.message_attributes.insert(name.into(), value);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteMessageEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub receipt_handle: String,
}

impl DeleteMessageEntry {
    pub fn new(receipt_handle: impl Into<String>) -> Self {
        Self {
            id: None,
            receipt_handle: receipt_handle.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeVisibilityEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub receipt_handle: String,
    pub visibility_timeout: u32,
}

impl ChangeVisibilityEntry {
    pub fn new(receipt_handle: impl Into<String>, visibility_timeout: u32) -> Self {
        Self {
            id: None,
            receipt_handle: receipt_handle.into(),
            visibility_timeout,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendMessageBatchInput {
    pub queue_url: String,
    pub entries: Vec<SendMessageEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteMessageBatchInput {
    pub queue_url: String,
    pub entries: Vec<DeleteMessageEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeMessageVisibilityBatchInput {
    pub queue_url: String,
    pub entries: Vec<ChangeVisibilityEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendMessageResult {
    pub id: String,
    pub message_id: String,
    #[serde(rename = "MD5OfMessageBody", default)]
    pub md5_of_message_body: Option<String>,
    #[serde(rename = "MD5OfMessageAttributes", default)]
    pub md5_of_message_attributes: Option<String>,
    #[serde(default)]
    pub sequence_number: Option<String>,
}

/// Success entry of the delete and change-visibility batch calls.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchEntryResult {
    pub id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchResultErrorEntry {
    pub id: String,
    /// `true` when the entry itself is invalid; such entries are not retried.
    pub sender_fault: bool,
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchOutput<S> {
    #[serde(default = "Vec::new")]
    pub successful: Vec<S>,
    #[serde(default)]
    pub failed: Vec<BatchResultErrorEntry>,
}

pub type SendMessageBatchOutput = BatchOutput<SendMessageResult>;
pub type DeleteMessageBatchOutput = BatchOutput<BatchEntryResult>;
pub type ChangeMessageVisibilityBatchOutput = BatchOutput<BatchEntryResult>;
