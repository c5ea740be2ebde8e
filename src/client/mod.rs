//! Blocking SigV4 clients for the services whose helper traits this crate
//! implements itself.

mod blocking_client;
mod sts_client;

pub use blocking_client::{AwsClient, AwsClientBuilder};
pub use sts_client::StsClient;

/// Addressing and signing details of an AWS JSON protocol service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JsonService {
    /// First label of the regional endpoint host.
    pub endpoint_prefix: &'static str,
    /// SigV4 service name.
    pub signing_name: &'static str,
    /// Prefix of the `X-Amz-Target` header, before `.{Operation}`.
    pub target_prefix: &'static str,
    /// `1.0` or `1.1`.
    pub json_version: &'static str,
}

impl JsonService {
    pub const DYNAMODB: Self = Self {
        endpoint_prefix: "dynamodb",
        signing_name: "dynamodb",
        target_prefix: "DynamoDB_20120810",
        json_version: "1.0",
    };

    pub const SQS: Self = Self {
        endpoint_prefix: "sqs",
        signing_name: "sqs",
        target_prefix: "AmazonSQS",
        json_version: "1.0",
    };

    pub const KINESIS: Self = Self {
        endpoint_prefix: "kinesis",
        signing_name: "kinesis",
        target_prefix: "Kinesis_20131202",
        json_version: "1.1",
    };

    pub const EVENTS: Self = Self {
        endpoint_prefix: "events",
        signing_name: "events",
        target_prefix: "AWSEvents",
        json_version: "1.1",
    };

    pub const CLOUDWATCH: Self = Self {
        endpoint_prefix: "monitoring",
        signing_name: "monitoring",
        target_prefix: "GraniteServiceVersion20100801",
        json_version: "1.0",
    };

    pub(crate) fn content_type(&self) -> String {
        format!("application/x-amz-json-{}", self.json_version)
    }

    pub(crate) fn target(&self, operation: &str) -> String {
        format!("{}.{operation}", self.target_prefix)
    }
}
