use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method};

use crate::{
    api::sts::StsApi,
    auth::Region,
    client::AwsClient,
    error::Result,
    transport::blocking_transport::response_error,
    types::sts::{AssumeRoleInput, AssumeRoleOutput, GetCallerIdentityOutput},
    util,
};

const SIGNING_NAME: &str = "sts";
const API_VERSION: &str = "2011-06-15";

/// STS over the Query protocol, sharing an [`AwsClient`]'s credentials,
/// region and connection pool.
#[derive(Clone, Debug)]
pub struct StsClient {
    client: AwsClient,
}

impl StsClient {
    pub fn new(client: AwsClient) -> Self {
        Self { client }
    }

    fn call<T: serde::de::DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        #[cfg(feature = "tracing")]
        let _guard = tracing::info_span!("aws.request", service = SIGNING_NAME, operation = action)
            .entered();

        let mut form = vec![("Action", action), ("Version", API_VERSION)];
        form.extend(params.iter().map(|(k, v)| (*k, v.as_str())));
        let body = Bytes::from(util::encode::form_body(&form));

        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let base = self.client.endpoint_for(SIGNING_NAME)?;
        let resp = self
            .client
            .execute(SIGNING_NAME, Method::POST, &base, "/", headers, body)?;
        let text = resp.text();
        if !resp.status.is_success() {
            return Err(response_error(resp.status, &resp.headers, &text));
        }
        util::xml::parse_query_result(&text, action)
    }
}

impl StsApi for StsClient {
    fn assume_role(&self, input: &AssumeRoleInput) -> Result<AssumeRoleOutput> {
        self.call("AssumeRole", &input.query_params())
    }

    fn get_caller_identity(&self) -> Result<GetCallerIdentityOutput> {
        self.call("GetCallerIdentity", &[])
    }

    fn region(&self) -> &Region {
        self.client.region()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_comes_from_the_shared_client() {
        let client = AwsClient::builder().region("ap-south-1").build().unwrap();
        let sts = StsClient::new(client);
        assert_eq!(sts.region().as_str(), "ap-south-1");
    }
}
