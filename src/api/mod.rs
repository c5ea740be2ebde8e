//! Service helpers.
//!
//! Each module defines the trait a service client has to implement for its
//! helpers, and the helpers themselves. Helpers take the client by reference
//! and never construct one.

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

pub use cloudwatch::CloudWatchApi;
pub use dynamodb::DynamoDbApi;
pub use events::EventsApi;
pub use kinesis::KinesisApi;
pub use lambda::LambdaApi;
pub use medialive::MediaLiveApi;
pub use mediatailor::MediaTailorApi;
pub use s3::S3Api;
pub use scheduler::SchedulerApi;
pub use sqs::SqsApi;
pub use sts::StsApi;
