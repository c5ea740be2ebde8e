//! XML bodies of Query-protocol services (STS).

use serde::{Deserialize, de::DeserializeOwned};

use crate::error::Error;

#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct XmlError {
    #[serde(rename = "Code", default)]
    pub(crate) code: Option<String>,
    #[serde(rename = "Message", default)]
    pub(crate) message: Option<String>,
    #[serde(rename = "RequestId", default)]
    pub(crate) request_id: Option<String>,
}

/// Parses `<ErrorResponse><Error>..</Error><RequestId>..</RequestId></ErrorResponse>`
/// or a bare `<Error>` element.
pub(crate) fn parse_error_xml(body: &str) -> Option<XmlError> {
    #[derive(Deserialize)]
    struct ErrorResponse {
        #[serde(rename = "Error")]
        error: XmlError,
        #[serde(rename = "RequestId", default)]
        request_id: Option<String>,
    }

    if !body.trim_start().starts_with('<') {
        return None;
    }
    if let Ok(wrapped) = quick_xml::de::from_str::<ErrorResponse>(body) {
        let mut error = wrapped.error;
        error.request_id = error.request_id.or(wrapped.request_id);
        return Some(error);
    }
    quick_xml::de::from_str::<XmlError>(body)
        .ok()
        .filter(|e| e.code.is_some())
}

/// Extracts `<{Operation}Result>` from `<{Operation}Response>`.
pub(crate) fn parse_query_result<T: DeserializeOwned>(
    body: &str,
    operation: &str,
) -> Result<T, Error> {
    #[derive(Deserialize)]
    struct Envelope<T> {
        #[serde(
            rename = "AssumeRoleResult",
            alias = "GetCallerIdentityResult",
            alias = "AssumeRoleWithWebIdentityResult"
        )]
        result: T,
    }

    quick_xml::de::from_str::<Envelope<T>>(body)
        .map(|envelope| envelope.result)
        .map_err(|e| {
            Error::decode(
                format!("failed to parse {operation} XML response"),
                Some(Box::new(e)),
            )
        })
}
