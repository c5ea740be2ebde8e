//! Role assumption.

use crate::{
    auth::{Credentials, Region},
    error::Result,
    types::sts::{AssumeRoleInput, AssumeRoleOutput, GetCallerIdentityOutput},
};

/// The STS calls the helpers need.
pub trait StsApi {
    fn assume_role(&self, input: &AssumeRoleInput) -> Result<AssumeRoleOutput>;
    fn get_caller_identity(&self) -> Result<GetCallerIdentityOutput>;
    /// Region the client talks to.
    fn region(&self) -> &Region;
}

/// Assumes `input.role_arn` and returns the temporary credentials.
///
/// Without a `RoleSessionName` a random 8-hex-digit one is used.
pub fn assumed_role_credentials<C>(sts: &C, mut input: AssumeRoleInput) -> Result<Credentials>
where
    C: StsApi + ?Sized,
{
    if input.role_session_name.is_none() {
        input.role_session_name = Some(random_session_name());
    }

    #[cfg(feature = "tracing")]
    let _guard = tracing::info_span!(
        "aws_helpers.sts.assume_role",
        role_arn = %input.role_arn,
        session = input.role_session_name.as_deref().unwrap_or(""),
    )
    .entered();

    sts.assume_role(&input)?.credentials.to_credentials()
}

/// Builds `builder` into an [`AwsClient`](crate::client::AwsClient) acting
/// as the assumed role.
///
/// Endpoint, retry and timeout settings come from `builder`; its auth is
/// replaced. Without a region on `builder` the STS client's is used.
#[cfg(feature = "client")]
pub fn assumed_role_client<C>(
    sts: &C,
    input: AssumeRoleInput,
    builder: crate::client::AwsClientBuilder,
) -> Result<crate::client::AwsClient>
where
    C: StsApi + ?Sized,
{
    let credentials = assumed_role_credentials(sts, input)?;
    builder
        .region_or(sts.region().as_str())
        .auth(credentials.into())
        .build()
}

fn random_session_name() -> String {
    let mut name = uuid::Uuid::new_v4().simple().to_string();
    name.truncate(8);
    name
}
