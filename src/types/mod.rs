//! Request and response shapes, one module per service.
//!
//! Field names follow each service's JSON (PascalCase) so any transport can
//! serialize them as-is.

pub mod cloudwatch;
pub mod dynamodb;
pub mod events;
pub mod kinesis;
pub mod lambda;
pub mod medialive;
pub mod mediatailor;
pub mod s3;
pub mod scheduler;
pub mod sqs;
pub mod sts;
