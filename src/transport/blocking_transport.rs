use std::time::Duration;

#[cfg(feature = "metrics")]
use std::time::Instant;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::{
    error::{Error, Result},
    transport::{RetryConfig, backoff_delay},
};

/// Response with the body read to the end.
#[derive(Debug)]
pub(crate) struct HttpResponse {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl HttpResponse {
    pub(crate) fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub(crate) struct BlockingTransport {
    agent: ureq::Agent,
    retry: RetryConfig,
    timeout: Option<Duration>,
    user_agent: String,
}

impl BlockingTransport {
    pub(crate) fn new(
        retry: RetryConfig,
        user_agent: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        if retry.max_attempts == 0 {
            return Err(Error::invalid_config("max_attempts must be at least 1"));
        }

        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();

        Ok(Self {
            agent: ureq::Agent::new_with_config(config),
            retry,
            timeout,
            user_agent: user_agent.unwrap_or_else(default_user_agent),
        })
    }

    /// Sends the request, retrying transport failures, `429` and `5xx`.
    ///
    /// Returns the last response whatever its status; callers turn non-2xx
    /// into errors.
    pub(crate) fn send(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<HttpResponse> {
        let max_attempts = self.retry.max_attempts;

        for attempt in 1..=max_attempts {
            #[cfg(feature = "metrics")]
            metrics::counter!("aws_http_attempts_total", "method" => method_label(&method))
                .increment(1);
            #[cfg(feature = "tracing")]
            let _guard = tracing::debug_span!(
                "aws.http",
                method = %method,
                host = url.host_str().unwrap_or(""),
                path = url.path(),
                attempt,
            )
            .entered();
            #[cfg(feature = "metrics")]
            let start = Instant::now();

            let result = match method.as_str() {
                "GET" | "HEAD" | "DELETE" => {
                    if !body.is_empty() {
                        return Err(Error::invalid_input(format!(
                            "{method} requests do not carry a body"
                        )));
                    }
                    let req = match method.as_str() {
                        "GET" => self.agent.get(url.as_str()),
                        "HEAD" => self.agent.head(url.as_str()),
                        _ => self.agent.delete(url.as_str()),
                    };
                    apply_headers(req, &headers, &self.user_agent, self.timeout).call()
                }
                "POST" | "PUT" | "PATCH" => {
                    let req = match method.as_str() {
                        "POST" => self.agent.post(url.as_str()),
                        "PUT" => self.agent.put(url.as_str()),
                        _ => self.agent.patch(url.as_str()),
                    };
                    apply_headers(req, &headers, &self.user_agent, self.timeout)
                        .send(body.as_ref())
                }
                _ => {
                    return Err(Error::invalid_input(format!(
                        "unsupported HTTP method {method}"
                    )));
                }
            };

            let resp = match result {
                Ok(resp) => resp,
                Err(err) => {
                    if attempt < max_attempts && should_retry_error(&err) {
                        #[cfg(feature = "metrics")]
                        metrics::counter!(
                            "aws_http_retries_total",
                            "method" => method_label(&method),
                            "reason" => "transport"
                        )
                        .increment(1);
                        #[cfg(feature = "tracing")]
                        tracing::debug!(error = ?err, "retrying after transport error");

                        std::thread::sleep(backoff_delay(self.retry, attempt));
                        continue;
                    }

                    #[cfg(feature = "metrics")]
                    metrics::counter!(
                        "aws_http_errors_total",
                        "method" => method_label(&method),
                        "kind" => "transport"
                    )
                    .increment(1);

                    return Err(Error::transport(
                        format!("request failed: {}", request_context(&method, &url)),
                        Some(Box::new(err)),
                    ));
                }
            };

            #[cfg(feature = "metrics")]
            {
                metrics::counter!(
                    "aws_http_responses_total",
                    "method" => method_label(&method),
                    "class" => status_class(resp.status()),
                )
                .increment(1);
                metrics::histogram!(
                    "aws_http_request_duration_seconds",
                    "method" => method_label(&method),
                )
                .record(start.elapsed().as_secs_f64());
            }

            if should_retry_status(resp.status()) && attempt < max_attempts {
                #[cfg(feature = "metrics")]
                metrics::counter!(
                    "aws_http_retries_total",
                    "method" => method_label(&method),
                    "reason" => "status"
                )
                .increment(1);
                #[cfg(feature = "tracing")]
                tracing::debug!(status = %resp.status(), "retrying after response status");

                let delay = retry_delay_from_headers(self.retry, attempt, resp.headers());
                std::thread::sleep(delay);
                continue;
            }

            let (parts, mut body) = resp.into_parts();
            let body = body.read_to_vec().map_err(|e| {
                Error::transport(
                    format!(
                        "failed to read response body: {}",
                        request_context(&method, &url)
                    ),
                    Some(Box::new(e)),
                )
            })?;
            return Ok(HttpResponse {
                status: parts.status,
                headers: parts.headers,
                body: Bytes::from(body),
            });
        }

        #[cfg(feature = "metrics")]
        metrics::counter!(
            "aws_http_errors_total",
            "method" => method_label(&method),
            "kind" => "exhausted"
        )
        .increment(1);
        Err(Error::transport(
            format!(
                "request failed after retries: {}",
                request_context(&method, &url)
            ),
            None,
        ))
    }
}

/// Error codes AWS JSON services use for throttling on a `400`.
const THROTTLING_CODES: [&str; 5] = [
    "ThrottlingException",
    "Throttling",
    "ProvisionedThroughputExceededException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
];

/// Turns a non-2xx response into an [`Error`].
///
/// Understands the AWS JSON error body (`__type`, `message`) and the Query
/// protocol XML body. Throttling becomes [`Error::RateLimited`].
pub(crate) fn response_error(status: StatusCode, headers: &HeaderMap, body: &str) -> Error {
    let header_request_id = ["x-amzn-requestid", "x-amz-request-id"]
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let parsed = parse_error_json(body).or_else(|| {
        crate::util::xml::parse_error_xml(body).map(|xml| ParsedError {
            code: xml.code,
            message: xml.message,
            request_id: xml.request_id,
        })
    });
    let code = parsed
        .as_ref()
        .and_then(|p| p.code.clone())
        .or_else(|| error_type_header(headers));

    let throttled = status == StatusCode::TOO_MANY_REQUESTS
        || code
            .as_deref()
            .is_some_and(|code| THROTTLING_CODES.contains(&code));
    if throttled {
        let retry_after = headers
            .get(http::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);

        return Error::RateLimited {
            retry_after,
            request_id: header_request_id,
        };
    }

    let (message, request_id) = match parsed {
        Some(parsed) => (parsed.message, parsed.request_id.or(header_request_id)),
        None => (None, header_request_id),
    };
    Error::Api {
        status,
        code,
        message,
        request_id,
        body_snippet: Some(crate::util::text::truncate_snippet(body, 4096)),
    }
}

pub(crate) struct ParsedError {
    pub(crate) code: Option<String>,
    pub(crate) message: Option<String>,
    pub(crate) request_id: Option<String>,
}

/// `{"__type": "com.amazonaws.dynamodb.v20120810#ResourceNotFoundException", "message": "..."}`
pub(crate) fn parse_error_json(body: &str) -> Option<ParsedError> {
    #[derive(Deserialize)]
    struct JsonError {
        #[serde(rename = "__type", alias = "code", default)]
        kind: Option<String>,
        #[serde(alias = "Message", default)]
        message: Option<String>,
    }

    if body.trim().is_empty() {
        return None;
    }
    let parsed = serde_json::from_str::<JsonError>(body).ok()?;
    if parsed.kind.is_none() && parsed.message.is_none() {
        return None;
    }
    Some(ParsedError {
        code: parsed.kind.as_deref().map(short_error_code),
        message: parsed.message,
        request_id: None,
    })
}

/// `x-amzn-ErrorType: ResourceNotFoundException:http://internal.amazon.com/...`
fn error_type_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("x-amzn-errortype")?.to_str().ok()?;
    let code = value.split(':').next().unwrap_or(value);
    (!code.is_empty()).then(|| code.to_string())
}

fn short_error_code(kind: &str) -> String {
    kind.rsplit('#').next().unwrap_or(kind).to_string()
}

fn retry_delay_from_headers(config: RetryConfig, attempt: u32, headers: &HeaderMap) -> Duration {
    if let Some(retry_after) = headers
        .get(http::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
    {
        return Duration::from_secs(retry_after);
    }
    backoff_delay(config, attempt)
}

fn should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn should_retry_error(err: &ureq::Error) -> bool {
    matches!(
        err,
        ureq::Error::Timeout(_)
            | ureq::Error::Protocol(_)
            | ureq::Error::Io(_)
            | ureq::Error::HostNotFound
            | ureq::Error::ConnectionFailed
    )
}

fn request_context(method: &Method, url: &Url) -> String {
    let authority = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };

    if authority.is_empty() {
        format!("{method} {}", url.path())
    } else {
        format!("{method} {authority}{}", url.path())
    }
}

#[cfg(feature = "metrics")]
fn status_class(status: StatusCode) -> &'static str {
    if status.is_success() {
        "2xx"
    } else if status.is_client_error() {
        "4xx"
    } else if status.is_server_error() {
        "5xx"
    } else {
        "other"
    }
}

#[cfg(feature = "metrics")]
fn method_label(method: &Method) -> &'static str {
    match method.as_str() {
        "GET" => "GET",
        "PUT" => "PUT",
        "HEAD" => "HEAD",
        "DELETE" => "DELETE",
        "POST" => "POST",
        "PATCH" => "PATCH",
        _ => "OTHER",
    }
}

fn apply_headers<B>(
    mut req: ureq::RequestBuilder<B>,
    headers: &HeaderMap,
    user_agent: &str,
    timeout: Option<Duration>,
) -> ureq::RequestBuilder<B> {
    req = req.header(http::header::USER_AGENT, user_agent);
    for (name, value) in headers.iter() {
        let Ok(value_str) = value.to_str() else {
            continue;
        };
        req = req.header(name.as_str(), value_str);
    }

    if let Some(timeout) = timeout {
        req = req.config().timeout_global(Some(timeout)).build();
    }

    req
}

fn default_user_agent() -> String {
    format!("aws-helpers/{}", env!("CARGO_PKG_VERSION"))
}
