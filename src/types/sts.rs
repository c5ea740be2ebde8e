use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{auth::Credentials, error::Result};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssumeRoleInput {
    pub role_arn: String,
    /// Filled with a random name when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_session_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_code: Option<String>,
}

impl AssumeRoleInput {
    pub fn new(role_arn: impl Into<String>) -> Self {
        Self {
            role_arn: role_arn.into(),
            ..Self::default()
        }
    }

    pub fn session_name(mut self, name: impl Into<String>) -> Self {
        self.role_session_name = Some(name.into());
        self
    }

    /// Form parameters for the Query protocol, excluding `Action`/`Version`.
    #[cfg(feature = "client")]
    pub(crate) fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("RoleArn", self.role_arn.clone())];
        let optional = [
            ("RoleSessionName", self.role_session_name.clone()),
            ("DurationSeconds", self.duration_seconds.map(|d| d.to_string())),
            ("ExternalId", self.external_id.clone()),
            ("Policy", self.policy.clone()),
            ("SerialNumber", self.serial_number.clone()),
            ("TokenCode", self.token_code.clone()),
        ];
        params.extend(
            optional
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, v))),
        );
        params
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssumeRoleOutput {
    pub credentials: StsCredentials,
    #[serde(default)]
    pub assumed_role_user: Option<AssumedRoleUser>,
    #[serde(default)]
    pub packed_policy_size: Option<u32>,
}

/// Temporary credentials issued by STS.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    #[serde(
        default,
        deserialize_with = "crate::util::serde_ext::rfc3339_text::option::deserialize"
    )]
    pub expiration: Option<OffsetDateTime>,
}

impl StsCredentials {
    /// Signing credentials for clients acting as the assumed role.
    pub fn to_credentials(&self) -> Result<Credentials> {
        Credentials::new(&self.access_key_id, &self.secret_access_key)?
            .with_session_token(&self.session_token)
    }
}

impl fmt::Debug for StsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StsCredentials")
            .field(
                "access_key_id",
                &crate::util::text::redact_value(&self.access_key_id),
            )
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssumedRoleUser {
    pub assumed_role_id: String,
    pub arn: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetCallerIdentityOutput {
    pub user_id: String,
    pub account: String,
    pub arn: String,
}
