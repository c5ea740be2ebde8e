use std::{env, fmt, str::FromStr};

use crate::{error::Error, util::text::redact_value};

/// AWS region name, e.g. `us-east-2`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Region(String);

impl Region {
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        non_blank(&name, "region")?;
        Ok(Self(name))
    }

    /// `AWS_REGION`, or `AWS_DEFAULT_REGION` when that is unset.
    pub fn from_env() -> Result<Self, Error> {
        env::var("AWS_REGION")
            .or_else(|_| env::var("AWS_DEFAULT_REGION"))
            .map_err(|_| Error::invalid_config("neither AWS_REGION nor AWS_DEFAULT_REGION is set"))
            .and_then(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::new(name)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Long-term or temporary access keys.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Present for temporary credentials, e.g. from `AssumeRole`.
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Result<Self, Error> {
        let access_key_id = access_key_id.into();
        let secret_access_key = secret_access_key.into();
        non_blank(&access_key_id, "access key id")?;
        non_blank(&secret_access_key, "secret access key")?;
        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token: None,
        })
    }

    pub fn with_session_token(self, session_token: impl Into<String>) -> Result<Self, Error> {
        let session_token = session_token.into();
        non_blank(&session_token, "session token")?;
        Ok(Self {
            session_token: Some(session_token),
            ..self
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = self.session_token.as_deref().map(redact_value);
        f.debug_struct("Credentials")
            .field("access_key_id", &redact_value(&self.access_key_id))
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &token)
            .finish()
    }
}

/// How outbound requests are authenticated.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum Auth {
    /// Requests go out unsigned.
    Anonymous,
    Static(Credentials),
}

impl Auth {
    /// `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`, plus
    /// `AWS_SESSION_TOKEN` when it is set and not blank.
    pub fn from_env() -> Result<Self, Error> {
        let var = |name: &str| {
            env::var(name).map_err(|_| Error::invalid_config(format!("{name} is not set")))
        };
        let mut credentials = Credentials::new(
            var("AWS_ACCESS_KEY_ID")?,
            var("AWS_SECRET_ACCESS_KEY")?,
        )?;
        if let Some(token) = env::var("AWS_SESSION_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
        {
            credentials = credentials.with_session_token(token)?;
        }
        Ok(Self::Static(credentials))
    }

    #[cfg(feature = "client")]
    pub(crate) fn credentials(&self) -> Option<&Credentials> {
        match self {
            Self::Anonymous => None,
            Self::Static(credentials) => Some(credentials),
        }
    }
}

impl From<Credentials> for Auth {
    fn from(credentials: Credentials) -> Self {
        Self::Static(credentials)
    }
}

fn non_blank(value: &str, what: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::invalid_config(format!("{what} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_config_errors() {
        assert!(Region::new("  ").is_err());
        assert!("".parse::<Region>().is_err());
        assert!(Credentials::new("", "secret").is_err());
        assert!(
            Credentials::new("AKID", "secret")
                .unwrap()
                .with_session_token(" ")
                .is_err()
        );
    }

    #[test]
    fn debug_output_hides_secrets() {
        let credentials = Credentials::new("AKIDEXAMPLE123", "wJalrXUtnFEMI")
            .unwrap()
            .with_session_token("session-token-value")
            .unwrap();
        let shown = format!("{credentials:?}");
        assert!(shown.contains("AKID...E123"));
        assert!(!shown.contains("wJalrXUtnFEMI"));
        assert!(!shown.contains("session-token-value"));
    }
}
