use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::Error;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListObjectsV2Input {
    pub bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_keys: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

impl ListObjectsV2Input {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListObjectsV2Output {
    #[serde(default)]
    pub contents: Vec<Object>,
    #[serde(default)]
    pub common_prefixes: Vec<CommonPrefix>,
    #[serde(default)]
    pub is_truncated: bool,
    #[serde(default)]
    pub next_continuation_token: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Object {
    pub key: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_modified: Option<OffsetDateTime>,
    #[serde(rename = "ETag", default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub storage_class: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommonPrefix {
    pub prefix: String,
}

/// `InputSerialization` of an S3 Select request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InputSerialization {
    #[serde(rename = "JSON", skip_serializing_if = "Option::is_none")]
    pub json: Option<JsonInput>,
    #[serde(rename = "CSV", skip_serializing_if = "Option::is_none")]
    pub csv: Option<CsvInput>,
    /// `NONE`, `GZIP` or `BZIP2`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JsonInput {
    /// `DOCUMENT` or `LINES`.
    #[serde(rename = "Type")]
    pub kind: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsvInput {
    /// `USE`, `IGNORE` or `NONE`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_header_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_delimiter: Option<String>,
}

/// Input presets for S3 Select, keyed by file extension.
///
/// The CSV and TSV presets expect a header row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SelectFormat {
    Json,
    JsonGz,
    Jsonl,
    JsonlGz,
    Csv,
    CsvGz,
    Tsv,
    TsvGz,
}

impl SelectFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::JsonGz => "json.gz",
            Self::Jsonl => "jsonl",
            Self::JsonlGz => "jsonl.gz",
            Self::Csv => "csv",
            Self::CsvGz => "csv.gz",
            Self::Tsv => "tsv",
            Self::TsvGz => "tsv.gz",
        }
    }

    pub fn input_serialization(self) -> InputSerialization {
        let json_input = |kind: &str| JsonInput {
            kind: kind.to_string(),
        };
        let delimited = |delimiter: &str| CsvInput {
            file_header_info: Some("USE".to_string()),
            field_delimiter: Some(delimiter.to_string()),
        };
        let (json, csv, gzip) = match self {
            Self::Json => (Some(json_input("DOCUMENT")), None, false),
            Self::JsonGz => (Some(json_input("DOCUMENT")), None, true),
            Self::Jsonl => (Some(json_input("LINES")), None, false),
            Self::JsonlGz => (Some(json_input("LINES")), None, true),
            Self::Csv => (None, Some(delimited(",")), false),
            Self::CsvGz => (None, Some(delimited(",")), true),
            Self::Tsv => (None, Some(delimited("\t")), false),
            Self::TsvGz => (None, Some(delimited("\t")), true),
        };
        InputSerialization {
            json,
            csv,
            compression_type: gzip.then(|| "GZIP".to_string()),
        }
    }
}

impl std::str::FromStr for SelectFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "json" => Self::Json,
            "json.gz" => Self::JsonGz,
            "jsonl" => Self::Jsonl,
            "jsonl.gz" => Self::JsonlGz,
            "csv" => Self::Csv,
            "csv.gz" => Self::CsvGz,
            "tsv" => Self::Tsv,
            "tsv.gz" => Self::TsvGz,
            other => {
                return Err(Error::invalid_input(format!(
                    "unknown S3 Select format: {other}"
                )));
            }
        })
    }
}

impl From<SelectFormat> for InputSerialization {
    fn from(value: SelectFormat) -> Self {
        value.input_serialization()
    }
}

/// `OutputSerialization` of an S3 Select request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutputSerialization {
    #[serde(rename = "JSON")]
    pub json: JsonOutput,
}

impl OutputSerialization {
    /// One JSON record per line.
    pub fn json_lines() -> Self {
        Self {
            json: JsonOutput {
                record_delimiter: Some("\n".to_string()),
            },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JsonOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_delimiter: Option<String>,
}

/// An S3 Select request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SelectObjectContentInput {
    pub bucket: String,
    pub key: String,
    pub expression: String,
    pub expression_type: String,
    pub input_serialization: InputSerialization,
    pub output_serialization: OutputSerialization,
}

/// One event of the S3 Select response stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectEvent {
    /// A chunk of output. Chunks may split a record anywhere.
    Records(Bytes),
    Stats {
        bytes_scanned: u64,
        bytes_processed: u64,
        bytes_returned: u64,
    },
    Progress,
    Continuation,
    End,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn presets_serialize_like_s3_expects() {
        let tsv: InputSerialization = "tsv.gz".parse::<SelectFormat>().unwrap().into();
        assert_eq!(
            serde_json::to_value(&tsv).unwrap(),
            json!({"CSV": {"FileHeaderInfo": "USE", "FieldDelimiter": "\t"}, "CompressionType": "GZIP"})
        );
        assert_eq!(
            serde_json::to_value(SelectFormat::Jsonl.input_serialization()).unwrap(),
            json!({"JSON": {"Type": "LINES"}})
        );
        assert!("parquet".parse::<SelectFormat>().is_err());
    }

    #[test]
    fn output_is_json_lines() {
        assert_eq!(
            serde_json::to_value(OutputSerialization::json_lines()).unwrap(),
            json!({"JSON": {"RecordDelimiter": "\n"}})
        );
    }
}
