//! AWS Signature Version 4 header signing.

use hmac::{Hmac, Mac as _};
use http::{HeaderMap, HeaderValue, Method};
use sha2::{Digest as _, Sha256};
use time::OffsetDateTime;

use crate::{
    auth::{Credentials, Region},
    error::Error,
    util::url::ResolvedUrl,
};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Everything that scopes a signature besides the request itself.
#[derive(Clone, Copy)]
pub(crate) struct SigV4Params<'a> {
    pub(crate) region: &'a Region,
    /// Signing name, e.g. `dynamodb`, `sts`, `monitoring`.
    pub(crate) service: &'a str,
    pub(crate) credentials: &'a Credentials,
    pub(crate) now: OffsetDateTime,
}

pub(crate) fn payload_hash(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Adds `x-amz-date`, `host`, an optional `x-amz-security-token` and the
/// `authorization` header to `headers`.
pub(crate) fn sign_headers(
    method: &Method,
    resolved: &ResolvedUrl,
    headers: &mut HeaderMap,
    payload_hash: &str,
    params: SigV4Params<'_>,
) -> Result<(), Error> {
    insert_header(headers, "x-amz-date", &amz_datetime(params.now))?;
    if let Some(token) = &params.credentials.session_token {
        insert_header(headers, "x-amz-security-token", token)?;
    }
    headers.insert(http::header::HOST, host_header_value(&resolved.url)?);

    let (canonical_headers, signed_headers) = canonicalize_headers(headers);
    let canonical_request = format!(
        "{method}\n{}\n{}\n{canonical_headers}\n{signed_headers}\n{payload_hash}",
        resolved.canonical_uri, resolved.canonical_query_string,
    );

    let scope = credential_scope(params.region, params.service, params.now);
    let string_to_sign = format!(
        "{ALGORITHM}\n{}\n{scope}\n{}",
        amz_datetime(params.now),
        payload_hash_str(&canonical_request),
    );
    let signature = signature(&params, &string_to_sign)?;

    let authorization = format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
        params.credentials.access_key_id,
    );
    insert_header(headers, "authorization", &authorization)
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), Error> {
    let value = HeaderValue::from_str(value)
        .map_err(|_| Error::signing(format!("invalid {name} header value")))?;
    headers.insert(name, value);
    Ok(())
}

fn host_header_value(url: &url::Url) -> Result<HeaderValue, Error> {
    let host = url
        .host_str()
        .ok_or_else(|| Error::invalid_config("endpoint must include host"))?;
    // `Url::port` is `None` when the port is the scheme default.
    let host = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    HeaderValue::from_str(&host).map_err(|_| Error::signing("invalid host header value"))
}

fn canonicalize_headers(headers: &HeaderMap) -> (String, String) {
    let mut pairs = headers
        .iter()
        .filter(|(name, _)| should_sign_header(name.as_str()))
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_ascii_lowercase(), collapse_whitespace(value)))
        })
        .collect::<Vec<_>>();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let canonical = pairs
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect::<String>();
    let signed = pairs
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");
    (canonical, signed)
}

fn should_sign_header(name: &str) -> bool {
    matches!(name, "host" | "content-type" | "content-md5") || name.starts_with("x-amz-")
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn signature(params: &SigV4Params<'_>, string_to_sign: &str) -> Result<String, Error> {
    let secret = format!("AWS4{}", params.credentials.secret_access_key);
    let mut key = hmac_sha256(secret.as_bytes(), date_stamp(params.now).as_bytes())?;
    for part in [params.region.as_str(), params.service, "aws4_request"] {
        key = hmac_sha256(&key, part.as_bytes())?;
    }
    Ok(hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|_| Error::signing("invalid HMAC key"))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn payload_hash_str(data: &str) -> String {
    payload_hash(data.as_bytes())
}

fn date_stamp(now: OffsetDateTime) -> String {
    format!(
        "{:04}{:02}{:02}",
        now.year(),
        u8::from(now.month()),
        now.day()
    )
}

fn amz_datetime(now: OffsetDateTime) -> String {
    format!(
        "{}T{:02}{:02}{:02}Z",
        date_stamp(now),
        now.hour(),
        now.minute(),
        now.second()
    )
}

fn credential_scope(region: &Region, service: &str, now: OffsetDateTime) -> String {
    format!("{}/{}/{service}/aws4_request", date_stamp(now), region.as_str())
}
