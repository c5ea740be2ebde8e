use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method};
use serde::{Serialize, de::DeserializeOwned};
use time::OffsetDateTime;
use url::Url;

use crate::{
    auth::{Auth, Region},
    batch::Backoff,
    client::JsonService,
    error::{Error, Result},
    transport::{
        RetryConfig,
        blocking_transport::{BlockingTransport, HttpResponse, response_error},
    },
    util,
};

/// Blocking AWS client speaking the JSON protocol, signed with SigV4.
///
/// Cheap to clone; clones share one connection pool.
///
/// ```no_run
/// # fn demo() -> aws_helpers::Result<()> {
/// use aws_helpers::{Auth, AwsClient, api::dynamodb, types::dynamodb::ScanInput};
///
/// let client = AwsClient::builder()
///     .region("us-east-2")
///     .auth(Auth::from_env()?)
///     .build()?;
/// for item in dynamodb::scan_table(&client, ScanInput::new("example-table")) {
///     println!("{:?}", item?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AwsClient {
    inner: Arc<Inner>,
}

pub struct AwsClientBuilder {
    region: Option<String>,
    auth: Auth,
    endpoint: Option<String>,
    retry: RetryConfig,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

struct Inner {
    region: Region,
    auth: Auth,
    /// Replaces the regional endpoint of every service, e.g. for LocalStack.
    endpoint: Option<Url>,
    transport: BlockingTransport,
}

impl AwsClient {
    pub fn builder() -> AwsClientBuilder {
        AwsClientBuilder::new()
    }

    pub fn region(&self) -> &Region {
        &self.inner.region
    }

    /// Calls `operation` on a JSON protocol service.
    pub fn call_json<I, O>(&self, service: &JsonService, operation: &str, input: &I) -> Result<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        #[cfg(feature = "tracing")]
        let _guard = tracing::info_span!(
            "aws.request",
            service = service.signing_name,
            operation,
            region = self.inner.region.as_str(),
        )
        .entered();

        let body = Bytes::from(serde_json::to_vec(input)?);
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            header_value(&service.content_type())?,
        );
        headers.insert("x-amz-target", header_value(&service.target(operation))?);

        let base = self.endpoint_for(service.endpoint_prefix)?;
        let resp = self.execute(service.signing_name, Method::POST, &base, "/", headers, body)?;
        if !resp.status.is_success() {
            return Err(response_error(resp.status, &resp.headers, &resp.text()));
        }

        let body: &[u8] = if resp.body.is_empty() { b"{}" } else { &resp.body };
        serde_json::from_slice(body).map_err(|e| {
            Error::decode(
                format!("failed to parse {operation} response"),
                Some(Box::new(e)),
            )
        })
    }

    /// Regional endpoint for `prefix`, unless the client has an override.
    pub(crate) fn endpoint_for(&self, prefix: &str) -> Result<Url> {
        match &self.inner.endpoint {
            Some(endpoint) => Ok(endpoint.clone()),
            None => util::url::regional_endpoint(prefix, self.inner.region.as_str()),
        }
    }

    /// Signs (when credentials are configured) and sends one request.
    pub(crate) fn execute(
        &self,
        signing_name: &str,
        method: Method,
        base: &Url,
        path_and_query: &str,
        mut headers: HeaderMap,
        body: Bytes,
    ) -> Result<HttpResponse> {
        let resolved = util::url::resolve_url(base, path_and_query)?;

        if let Some(creds) = self.inner.auth.credentials() {
            let payload_hash = util::signing::payload_hash(&body);
            util::signing::sign_headers(
                &method,
                &resolved,
                &mut headers,
                &payload_hash,
                util::signing::SigV4Params {
                    region: &self.inner.region,
                    service: signing_name,
                    credentials: creds,
                    now: OffsetDateTime::now_utc(),
                },
            )?;
        }

        self.inner
            .transport
            .send(method, resolved.url, headers, body)
    }
}

impl AwsClientBuilder {
    fn new() -> Self {
        Self {
            region: None,
            auth: Auth::Anonymous,
            endpoint: None,
            retry: RetryConfig::default(),
            timeout: None,
            user_agent: None,
        }
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets the region only if none is set yet.
    pub(crate) fn region_or(mut self, region: &str) -> Self {
        self.region.get_or_insert_with(|| region.to_string());
        self
    }

    /// Defaults to [`Auth::Anonymous`], which sends requests unsigned.
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    /// Sends every request to `endpoint` instead of
    /// `https://{service}.{region}.amazonaws.com`.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// HTTP attempts per request, including the first.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.retry.max_attempts = max_attempts;
        self
    }

    /// Upper bound of the jittered wait between HTTP attempts.
    pub fn retry_backoff(mut self, backoff: Backoff) -> Self {
        self.retry.backoff = backoff;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<AwsClient> {
        let region = self
            .region
            .ok_or_else(|| Error::invalid_config("region is required"))
            .and_then(Region::new)?;
        let endpoint = self
            .endpoint
            .as_deref()
            .map(util::url::parse_endpoint)
            .transpose()?;
        let transport = BlockingTransport::new(self.retry, self.user_agent, self.timeout)?;

        Ok(AwsClient {
            inner: Arc::new(Inner {
                region,
                auth: self.auth,
                endpoint,
                transport,
            }),
        })
    }
}

impl std::fmt::Debug for AwsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsClient")
            .field("region", &self.inner.region)
            .field("auth", &self.inner.auth)
            .field("endpoint", &self.inner.endpoint.as_ref().map(Url::as_str))
            .finish()
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::invalid_input(format!("invalid header value: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;

    #[test]
    fn build_requires_region() {
        let err = AwsClient::builder().build().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn endpoint_override_applies_to_every_service() {
        let client = AwsClient::builder()
            .region("us-east-2")
            .endpoint("http://localhost:4566")
            .build()
            .unwrap();
        for prefix in ["dynamodb", "sqs", "monitoring"] {
            assert_eq!(
                client.endpoint_for(prefix).unwrap().as_str(),
                "http://localhost:4566/"
            );
        }
    }

    #[test]
    fn regional_endpoint_by_default() {
        let client = AwsClient::builder().region("eu-west-1").build().unwrap();
        assert_eq!(
            client.endpoint_for("kinesis").unwrap().as_str(),
            "https://kinesis.eu-west-1.amazonaws.com/"
        );
    }

    #[test]
    fn rejects_endpoint_with_path_and_zero_attempts() {
        assert!(
            AwsClient::builder()
                .region("us-east-2")
                .endpoint("http://localhost:4566/prefix")
                .build()
                .is_err()
        );
        assert!(
            AwsClient::builder()
                .region("us-east-2")
                .max_attempts(0)
                .build()
                .is_err()
        );
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let client = AwsClient::builder()
            .region("us-east-2")
            .auth(Auth::Static(
                Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY")
                    .unwrap(),
            ))
            .build()
            .unwrap();
        let shown = format!("{client:?}");
        assert!(!shown.contains("wJalrXUtnFEMI"));
    }

    #[test]
    fn json_targets_and_content_types() {
        assert_eq!(
            JsonService::DYNAMODB.target("BatchWriteItem"),
            "DynamoDB_20120810.BatchWriteItem"
        );
        assert_eq!(
            JsonService::KINESIS.content_type(),
            "application/x-amz-json-1.1"
        );
    }
}
