use url::Url;

use crate::error::Error;

pub(crate) struct ResolvedUrl {
    pub(crate) url: Url,
    pub(crate) canonical_uri: String,
    pub(crate) canonical_query_string: String,
}

/// Validates a service endpoint: absolute http(s) URL with a host and no
/// path, query or fragment.
pub(crate) fn parse_endpoint(endpoint: &str) -> Result<Url, Error> {
    let url = Url::parse(endpoint)
        .map_err(|_| Error::invalid_config("endpoint must be a valid absolute URL"))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::invalid_config("endpoint scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(Error::invalid_config("endpoint must include host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::invalid_config(
            "endpoint must not include query or fragment",
        ));
    }
    if url.path() != "/" && !url.path().is_empty() {
        return Err(Error::invalid_config("endpoint must not include a path"));
    }
    Ok(url)
}

/// `https://{prefix}.{region}.amazonaws.com`
pub(crate) fn regional_endpoint(prefix: &str, region: &str) -> Result<Url, Error> {
    parse_endpoint(&format!("https://{prefix}.{region}.amazonaws.com"))
}

/// Joins `path_and_query` (e.g. `/2015-03-31/functions?MaxItems=5`) onto
/// `base` and computes the canonical pieces SigV4 needs.
pub(crate) fn resolve_url(base: &Url, path_and_query: &str) -> Result<ResolvedUrl, Error> {
    let (raw_path, raw_query) = match path_and_query.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path_and_query, None),
    };

    let raw_path = format!("/{}", raw_path.trim_start_matches('/'));
    let params = raw_query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let canonical_uri = crate::util::encode::aws_percent_encode_path(&raw_path);
    let canonical_query_string = crate::util::encode::canonical_query_string(&params);

    let mut url = base.clone();
    url.set_path(&canonical_uri);
    if canonical_query_string.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&canonical_query_string));
    }

    Ok(ResolvedUrl {
        url,
        canonical_uri,
        canonical_query_string,
    })
}
