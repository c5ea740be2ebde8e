//! Pagination, batching and retry helpers for AWS service clients.
//!
//! The helpers in [`api`] are written against small per-service traits
//! ([`api::DynamoDbApi`], [`api::SqsApi`], ...), so they run on top of any
//! client that implements them. With the `client` feature (on by default)
//! [`AwsClient`] implements the JSON-protocol ones and [`StsClient`] the STS
//! one.
//!
//! ## Paging
//!
//! ```no_run
//! # #[cfg(feature = "client")]
//! # fn demo() -> aws_helpers::Result<()> {
//! use aws_helpers::{Auth, AwsClient, api::dynamodb, types::dynamodb::ScanInput};
//!
//! let client = AwsClient::builder()
//!     .region("us-east-2")
//!     .auth(Auth::from_env()?)
//!     .build()?;
//! let items = dynamodb::scan_table(&client, ScanInput::new("example-table"))
//!     .collect::<aws_helpers::Result<Vec<_>>>()?;
//! println!("{} items", items.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Bulk writes
//!
//! Bulk helpers never fail because the service left part of a batch
//! unprocessed. Whatever is left after the last attempt comes back in
//! [`batch::BulkOutput::unprocessed`]. A call that errors stops the run with
//! a [`batch::BulkError`] holding the output so far and every item not yet
//! confirmed.
//!
//! ```no_run
//! # #[cfg(feature = "client")]
//! # fn demo(client: &aws_helpers::AwsClient, items: Vec<aws_helpers::types::dynamodb::Item>)
//! # -> aws_helpers::Result<()> {
//! use aws_helpers::{api::dynamodb, batch::BatchPolicy};
//!
//! let output = dynamodb::put_items(client, "example-table", items, &BatchPolicy::dynamodb_write())?;
//! if !output.is_complete() {
//!     eprintln!("{} writes left over", output.unprocessed.len());
//! }
//! # Ok(())
//! # }
//! ```

/// Service traits and the helpers built on them.
pub mod api;
pub mod arn;
pub mod batch;
#[cfg(feature = "client")]
pub mod client;
pub mod paginate;
#[cfg(feature = "client")]
pub mod signed_requests;
/// Request and response shapes.
pub mod types;

mod auth;
mod error;
#[cfg(feature = "client")]
mod transport;
mod util;

pub use auth::{Auth, Credentials, Region};
#[cfg(feature = "client")]
pub use client::{AwsClient, AwsClientBuilder, StsClient};
pub use error::{Error, Result};
