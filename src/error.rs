use std::{error::Error as StdError, fmt, time::Duration};

use http::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Error type for helper configuration, service calls and response decoding.
///
/// Errors returned by an injected service client pass through the helpers
/// unchanged. Only configuration and input problems detected by the helpers
/// themselves are created here.
#[non_exhaustive]
pub enum Error {
    /// Invalid configuration or parameters, detected before any call.
    InvalidConfig { message: String },

    /// The caller asked for something the service data does not contain.
    InvalidInput { message: String },

    /// Request signing failed.
    Signing { message: String },

    /// Request was throttled by the service.
    RateLimited {
        retry_after: Option<Duration>,
        request_id: Option<String>,
    },

    /// Service returned an error response.
    Api {
        status: StatusCode,
        code: Option<String>,
        message: Option<String>,
        request_id: Option<String>,
        body_snippet: Option<String>,
    },

    /// Transport-level failure (HTTP client, IO, TLS).
    Transport {
        message: String,
        source: Option<BoxError>,
    },

    /// Response decode or parse failure.
    Decode {
        message: String,
        source: Option<BoxError>,
    },
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { message }
            | Self::InvalidInput { message }
            | Self::Signing { message } => f
                .debug_struct(self.kind())
                .field("message", message)
                .finish(),
            Self::RateLimited {
                retry_after,
                request_id,
            } => f
                .debug_struct(self.kind())
                .field("retry_after", retry_after)
                .field("request_id", request_id)
                .finish(),
            Self::Api {
                status,
                code,
                message,
                request_id,
                body_snippet,
            } => f
                .debug_struct(self.kind())
                .field("status", status)
                .field("code", code)
                .field("message", message)
                .field("request_id", request_id)
                .field("body_snippet", body_snippet)
                .finish(),
            Self::Transport { message, source } | Self::Decode { message, source } => f
                .debug_struct(self.kind())
                .field("message", message)
                .field("source", source)
                .finish(),
        }
    }
}

impl Error {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    pub fn transport(
        message: impl Into<String>,
        source: Option<BoxError>,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source,
        }
    }

    pub fn decode(
        message: impl Into<String>,
        source: Option<BoxError>,
    ) -> Self {
        Self::Decode {
            message: message.into(),
            source,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "InvalidConfig",
            Self::InvalidInput { .. } => "InvalidInput",
            Self::Signing { .. } => "Signing",
            Self::RateLimited { .. } => "RateLimited",
            Self::Api { .. } => "Api",
            Self::Transport { .. } => "Transport",
            Self::Decode { .. } => "Decode",
        }
    }

    /// HTTP status, for service errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            _ => None,
        }
    }

    /// Service error code, e.g. `ResourceNotFoundException`.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Request id reported by the service, if any.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Api { request_id, .. } | Self::RateLimited { request_id, .. } => {
                request_id.as_deref()
            }
            _ => None,
        }
    }

    /// Throttling, 5xx responses and transport failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Transport { .. } => true,
            Self::Api { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { message } => write!(f, "invalid config: {message}"),
            Self::InvalidInput { message } => write!(f, "invalid input: {message}"),
            Self::Signing { message } => write!(f, "signing error: {message}"),
            Self::RateLimited { retry_after, .. } => {
                f.write_str("rate limited")?;
                if let Some(wait) = retry_after {
                    write!(f, " (retry after {}s)", wait.as_secs())?;
                }
                Ok(())
            }
            Self::Api {
                status,
                code,
                message,
                request_id,
                ..
            } => {
                write!(f, "api error: {status}")?;
                let non_empty = |v: &Option<String>| v.clone().filter(|v| !v.is_empty());
                if let Some(code) = non_empty(code) {
                    write!(f, " code={code}")?;
                }
                if let Some(id) = non_empty(request_id) {
                    write!(f, " request_id={id}")?;
                }
                if let Some(message) = non_empty(message) {
                    write!(f, " ({message})")?;
                }
                Ok(())
            }
            Self::Transport { message, .. } => write!(f, "transport error: {message}"),
            Self::Decode { message, .. } => write!(f, "decode error: {message}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Transport { source, .. } | Self::Decode { source, .. } => {
                source.as_deref().map(|e| e as &(dyn StdError + 'static))
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::decode("invalid JSON", Some(Box::new(err)))
    }
}
