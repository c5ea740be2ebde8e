//! Signed requests to AWS APIs this crate has no helper for.

use bytes::Bytes;
use http::{HeaderMap, Method};

use crate::{
    client::AwsClient,
    error::{Error, Result},
    transport::blocking_transport::parse_error_json,
    util,
};

/// Sends a SigV4-signed request to `endpoint` of `service` and returns the
/// parsed JSON response.
///
/// `base_url` defaults to `https://{service}.{region}.amazonaws.com` (or the
/// client's endpoint override). A leading `/` on `endpoint` is optional; it
/// may carry a query string. Any non-2xx status is [`Error::Api`] with the
/// response body attached. An empty body is `null`.
///
/// ```no_run
/// # fn demo(client: &aws_helpers::AwsClient) -> aws_helpers::Result<()> {
/// use aws_helpers::signed_requests::sigv4_request;
/// use http::Method;
///
/// let functions = sigv4_request(client, "lambda", Method::GET, "2015-03-31/functions", None)?;
/// # let _ = functions;
/// # Ok(())
/// # }
/// ```
pub fn sigv4_request(
    client: &AwsClient,
    service: &str,
    method: Method,
    endpoint: &str,
    base_url: Option<&str>,
) -> Result<serde_json::Value> {
    #[cfg(feature = "tracing")]
    let _guard = tracing::info_span!("aws.request", service, method = %method, endpoint).entered();

    let base = match base_url {
        Some(url) => util::url::parse_endpoint(url)?,
        None => client.endpoint_for(service)?,
    };
    let path = format!("/{}", endpoint.trim_start_matches('/'));
    let resp = client.execute(service, method, &base, &path, HeaderMap::new(), Bytes::new())?;

    if !resp.status.is_success() {
        let text = resp.text();
        let parsed = parse_error_json(&text);
        let request_id = resp
            .headers
            .get("x-amzn-requestid")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let (code, message) = parsed.map_or((None, None), |p| (p.code, p.message));
        return Err(Error::Api {
            status: resp.status,
            code,
            message,
            request_id,
            body_snippet: Some(util::text::truncate_snippet(&text, 4096)),
        });
    }

    if resp.body.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_slice(&resp.body).map_err(|e| {
        Error::decode(
            format!("failed to parse response from {service}"),
            Some(Box::new(e)),
        )
    })
}
