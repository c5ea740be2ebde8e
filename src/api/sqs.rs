//! SQS batch helpers.
//!
//! Entries are split into batches that fit the SQS limits, entries without an
//! `Id` get one, and entries that failed through no fault of their own are
//! resubmitted per the [`BatchPolicy`].

use std::collections::HashMap;

use crate::{
    batch::{
        BatchPolicy, BatchResponse, BulkError, BulkOutput, partition, partition_weighted,
        submit_batches,
    },
    error::Result,
    types::sqs::{
        BatchEntryResult, BatchOutput, BatchResultErrorEntry, ChangeMessageVisibilityBatchInput,
        ChangeMessageVisibilityBatchOutput, ChangeVisibilityEntry, DeleteMessageBatchInput,
        DeleteMessageBatchOutput, DeleteMessageEntry, SendMessageBatchInput,
        SendMessageBatchOutput, SendMessageEntry, SendMessageResult,
    },
};

/// Entries per batch call.
pub const MESSAGE_LIMIT: usize = 10;
/// Summed message size per `SendMessageBatch` call (256 KiB).
pub const SIZE_LIMIT: usize = 262_144;

/// The SQS calls the helpers need.
pub trait SqsApi {
    fn send_message_batch(&self, input: &SendMessageBatchInput) -> Result<SendMessageBatchOutput>;

    fn delete_message_batch(
        &self,
        input: &DeleteMessageBatchInput,
    ) -> Result<DeleteMessageBatchOutput>;

    fn change_message_visibility_batch(
        &self,
        input: &ChangeMessageVisibilityBatchInput,
    ) -> Result<ChangeMessageVisibilityBatchOutput>;
}

/// An entry that was not completed, with the last error SQS reported for it.
#[derive(Clone, Debug, PartialEq)]
pub struct FailedEntry<E> {
    pub entry: E,
    /// `None` only if the service dropped the entry without reporting on it.
    pub error: Option<BatchResultErrorEntry>,
}

/// Result of an SQS bulk operation.
///
/// `failed` holds entries rejected as sender faults plus entries still failing
/// after the last attempt.
#[must_use = "failed entries are reported here, not as an error"]
#[derive(Clone, Debug, PartialEq)]
pub struct SqsBatchOutput<E, S> {
    pub successful: Vec<S>,
    pub failed: Vec<FailedEntry<E>>,
    /// Batch calls made, retries included.
    pub calls: usize,
}

impl<E, S> SqsBatchOutput<E, S> {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<E, S> Default for SqsBatchOutput<E, S> {
    fn default() -> Self {
        Self {
            successful: Vec::new(),
            failed: Vec::new(),
            calls: 0,
        }
    }
}

/// Result of an SQS bulk helper. On error, entries of finished batches are
/// settled in the output and the rest are in [`BulkError::pending`].
pub type SqsBatchResult<E, S> =
    std::result::Result<SqsBatchOutput<E, S>, BulkError<SqsBatchOutput<E, S>, E>>;

/// Sends `messages` to `queue_url` with as few `SendMessageBatch` calls as the
/// count and [`SIZE_LIMIT`] allow.
///
/// A new batch starts when the next message would exceed either limit. A
/// single message larger than the size limit is sent alone and left for SQS
/// to reject.
pub fn send_batches<C, I>(
    client: &C,
    queue_url: &str,
    messages: I,
    policy: &BatchPolicy,
) -> SqsBatchResult<SendMessageEntry, SendMessageResult>
where
    C: SqsApi + ?Sized,
    I: IntoIterator<Item = SendMessageEntry>,
{
    if let Err(error) = policy.ensure_batch_size_at_most(MESSAGE_LIMIT, "SendMessageBatch") {
        return Err(BulkError::not_started(error, messages));
    }

    #[cfg(feature = "tracing")]
    let _guard = tracing::info_span!("aws_helpers.sqs.send_batches", queue_url).entered();

    let batches = match partition_weighted(
        with_entry_ids(messages),
        policy.batch_size(),
        SIZE_LIMIT,
        message_size,
    ) {
        Ok(batches) => batches,
        Err(error) => return Err(BulkError::not_started(error, [])),
    };
    submit_entries(batches, policy, |entries| {
        let input = SendMessageBatchInput {
            queue_url: queue_url.to_string(),
            entries,
        };
        let output = client.send_message_batch(&input)?;
        Ok((input.entries, output))
    })
}

/// Deletes `messages` from `queue_url` in `DeleteMessageBatch` calls.
pub fn delete_batches<C, I>(
    client: &C,
    queue_url: &str,
    messages: I,
    policy: &BatchPolicy,
) -> SqsBatchResult<DeleteMessageEntry, BatchEntryResult>
where
    C: SqsApi + ?Sized,
    I: IntoIterator<Item = DeleteMessageEntry>,
{
    if let Err(error) = policy.ensure_batch_size_at_most(MESSAGE_LIMIT, "DeleteMessageBatch") {
        return Err(BulkError::not_started(error, messages));
    }

    #[cfg(feature = "tracing")]
    let _guard = tracing::info_span!("aws_helpers.sqs.delete_batches", queue_url).entered();

    let batches = match partition(with_entry_ids(messages), policy.batch_size()) {
        Ok(batches) => batches,
        Err(error) => return Err(BulkError::not_started(error, [])),
    };
    submit_entries(batches, policy, |entries| {
        let input = DeleteMessageBatchInput {
            queue_url: queue_url.to_string(),
            entries,
        };
        let output = client.delete_message_batch(&input)?;
        Ok((input.entries, output))
    })
}

/// Changes the visibility timeout of `messages` in
/// `ChangeMessageVisibilityBatch` calls.
pub fn change_visibility_batches<C, I>(
    client: &C,
    queue_url: &str,
    messages: I,
    policy: &BatchPolicy,
) -> SqsBatchResult<ChangeVisibilityEntry, BatchEntryResult>
where
    C: SqsApi + ?Sized,
    I: IntoIterator<Item = ChangeVisibilityEntry>,
{
    if let Err(error) = policy.ensure_batch_size_at_most(MESSAGE_LIMIT, "ChangeMessageVisibilityBatch") {
        return Err(BulkError::not_started(error, messages));
    }

    let batches = match partition(with_entry_ids(messages), policy.batch_size()) {
        Ok(batches) => batches,
        Err(error) => return Err(BulkError::not_started(error, [])),
    };
    submit_entries(batches, policy, |entries| {
        let input = ChangeMessageVisibilityBatchInput {
            queue_url: queue_url.to_string(),
            entries,
        };
        let output = client.change_message_visibility_batch(&input)?;
        Ok((input.entries, output))
    })
}

/// Bytes a message counts against [`SIZE_LIMIT`]: the UTF-8 body plus each
/// attribute's name, data type and value. System attributes are free.
pub fn message_size(message: &SendMessageEntry) -> usize {
    let attributes = message
        .message_attributes
        .iter()
        .map(|(name, attr)| {
            let value = match (&attr.string_value, &attr.binary_value) {
                (Some(s), _) => s.len(),
                (None, Some(b)) => b.len(),
                (None, None) => 0,
            };
            name.len() + attr.data_type.len() + value
        })
        .sum::<usize>();
    message.message_body.len() + attributes
}

trait BatchEntry {
    fn id(&self) -> Option<&str>;
    fn set_id(&mut self, id: String);
}

macro_rules! batch_entry {
    ($($ty:ty),+) => {$(
        impl BatchEntry for $ty {
            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn set_id(&mut self, id: String) {
                self.id = Some(id);
            }
        }
    )+};
}

batch_entry!(SendMessageEntry, DeleteMessageEntry, ChangeVisibilityEntry);

/// Fills missing ids with `<8 hex chars>-<1-based position>`; the prefix is
/// random per call so ids stay distinct across helper runs.
fn with_entry_ids<E, I>(entries: I) -> impl Iterator<Item = E>
where
    E: BatchEntry,
    I: IntoIterator<Item = E>,
{
    let prefix = uuid::Uuid::new_v4().simple().to_string();
    let prefix = prefix[..8].to_string();
    entries
        .into_iter()
        .enumerate()
        .map(move |(i, mut entry)| {
            if entry.id().is_none() {
                entry.set_id(format!("{prefix}-{}", i + 1));
            }
            entry
        })
}

enum Outcome<E, S> {
    Succeeded(S),
    Rejected(FailedEntry<E>),
}

fn submit_entries<E, S, B, F>(
    batches: B,
    policy: &BatchPolicy,
    mut call: F,
) -> SqsBatchResult<E, S>
where
    E: BatchEntry + Clone,
    B: IntoIterator<Item = Vec<E>>,
    F: FnMut(Vec<E>) -> Result<(Vec<E>, BatchOutput<S>)>,
{
    let mut last_errors = HashMap::<String, BatchResultErrorEntry>::new();

    let bulk = submit_batches(batches, policy, |pending| {
        let (submitted, output) = call(pending)?;
        let mut failures = output
            .failed
            .into_iter()
            .map(|f| (f.id.clone(), f))
            .collect::<HashMap<_, _>>();

        let mut settled = output
            .successful
            .into_iter()
            .map(Outcome::Succeeded)
            .collect::<Vec<_>>();
        let mut retry = Vec::new();
        for entry in submitted {
            let Some(error) = entry.id().and_then(|id| failures.remove(id)) else {
                continue;
            };
            if error.sender_fault {
                settled.push(Outcome::Rejected(FailedEntry {
                    entry,
                    error: Some(error),
                }));
            } else {
                last_errors.insert(error.id.clone(), error);
                retry.push(entry);
            }
        }

        #[cfg(feature = "tracing")]
        {
            if !failures.is_empty() {
                tracing::warn!(
                    unknown = failures.len(),
                    "batch response reported failures for ids that were not submitted"
                );
            }
        }

        Ok(BatchResponse::new(settled, retry))
    });

    match bulk {
        Ok(bulk) => Ok(settle(bulk, &mut last_errors)),
        Err(err) => Err(err.map_output(|bulk| settle(bulk, &mut last_errors))),
    }
}

fn settle<E: BatchEntry, S>(
    bulk: BulkOutput<E, Outcome<E, S>>,
    last_errors: &mut HashMap<String, BatchResultErrorEntry>,
) -> SqsBatchOutput<E, S> {
    let mut out = SqsBatchOutput {
        calls: bulk.calls,
        ..SqsBatchOutput::default()
    };
    for outcome in bulk.acknowledged {
        match outcome {
            Outcome::Succeeded(s) => out.successful.push(s),
            Outcome::Rejected(f) => out.failed.push(f),
        }
    }
    for entry in bulk.unprocessed {
        let error = entry.id().and_then(|id| last_errors.remove(id));
        out.failed.push(FailedEntry { entry, error });
    }
    out
}

#[cfg(feature = "client")]
impl SqsApi for crate::client::AwsClient {
    fn send_message_batch(&self, input: &SendMessageBatchInput) -> Result<SendMessageBatchOutput> {
        self.call_json(&crate::client::JsonService::SQS, "SendMessageBatch", input)
    }

    fn delete_message_batch(
        &self,
        input: &DeleteMessageBatchInput,
    ) -> Result<DeleteMessageBatchOutput> {
        self.call_json(&crate::client::JsonService::SQS, "DeleteMessageBatch", input)
    }

    fn change_message_visibility_batch(
        &self,
        input: &ChangeMessageVisibilityBatchInput,
    ) -> Result<ChangeMessageVisibilityBatchOutput> {
        self.call_json(
            &crate::client::JsonService::SQS,
            "ChangeMessageVisibilityBatch",
            input,
        )
    }
}
