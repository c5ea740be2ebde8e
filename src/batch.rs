//! Batch splitting and retry of partially processed batches.
//!
//! Bulk helpers partition the caller's items into capped batches, submit each
//! batch once, and resubmit only the items the service reports back as
//! unprocessed. Items still unprocessed after the last attempt are returned in
//! [`BulkOutput::unprocessed`]; they are never dropped.

use std::time::Duration;

use crate::error::{Error, Result};

/// Delay policy between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately.
    None,
    /// `base * attempt`, capped at `max`.
    Linear { base: Duration, max: Duration },
    /// `base * 2^(attempt - 1)`, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    pub fn linear(base: Duration, max: Duration) -> Self {
        Self::Linear { base, max }
    }

    pub fn exponential(base: Duration, max: Duration) -> Self {
        Self::Exponential { base, max }
    }

    /// Delay to wait after the 1-based `attempt` before the next one.
    pub fn delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match *self {
            Self::None => Duration::ZERO,
            Self::Linear { base, max } => base.saturating_mul(attempt).min(max),
            Self::Exponential { base, max } => {
                let factor = 1u32 << (attempt - 1).min(16);
                base.saturating_mul(factor).min(max)
            }
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_secs(2),
        }
    }
}

/// Batch size, attempt budget and backoff for one bulk operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchPolicy {
    batch_size: usize,
    max_attempts: u32,
    backoff: Backoff,
}

/// Builder for [`BatchPolicy`].
#[derive(Clone, Copy, Debug)]
pub struct BatchPolicyBuilder {
    batch_size: usize,
    max_attempts: u32,
    backoff: Backoff,
}

pub(crate) const DEFAULT_MAX_ATTEMPTS: u32 = 5;

impl BatchPolicy {
    pub fn builder() -> BatchPolicyBuilder {
        BatchPolicyBuilder {
            batch_size: 25,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::default(),
        }
    }

    /// Policy with the given batch size and default retry settings.
    pub fn with_batch_size(batch_size: usize) -> Result<Self> {
        Self::builder().batch_size(batch_size).build()
    }

    /// BatchWriteItem: 25 requests per call.
    pub fn dynamodb_write() -> Self {
        Self::preset(crate::api::dynamodb::BATCH_WRITE_LIMIT)
    }

    /// BatchGetItem: 100 keys per call.
    pub fn dynamodb_get() -> Self {
        Self::preset(crate::api::dynamodb::BATCH_GET_LIMIT)
    }

    /// SQS batch actions: 10 entries per call.
    pub fn sqs() -> Self {
        Self::preset(crate::api::sqs::MESSAGE_LIMIT)
    }

    fn preset(batch_size: usize) -> Self {
        Self {
            batch_size,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::default(),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Rejects a batch size above a service's documented cap.
    pub(crate) fn ensure_batch_size_at_most(&self, cap: usize, operation: &str) -> Result<()> {
        if self.batch_size > cap {
            return Err(Error::invalid_config(format!(
                "{operation} accepts at most {cap} entries per call, batch size is {}",
                self.batch_size
            )));
        }
        Ok(())
    }
}

impl BatchPolicyBuilder {
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Total attempts per batch, counting the first submission.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn build(self) -> Result<BatchPolicy> {
        if self.batch_size == 0 {
            return Err(Error::invalid_config("batch size must be > 0"));
        }
        if self.max_attempts == 0 {
            return Err(Error::invalid_config("max attempts must be > 0"));
        }
        Ok(BatchPolicy {
            batch_size: self.batch_size,
            max_attempts: self.max_attempts,
            backoff: self.backoff,
        })
    }
}

/// Consecutive batches of at most `size` items, in input order.
pub fn partition<I>(items: I, size: usize) -> Result<Batches<I::IntoIter>>
where
    I: IntoIterator,
{
    if size == 0 {
        return Err(Error::invalid_config("batch size must be > 0"));
    }
    Ok(Batches {
        items: items.into_iter(),
        size,
    })
}

/// Iterator returned by [`partition`].
pub struct Batches<I> {
    items: I,
    size: usize,
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch = self.items.by_ref().take(self.size).collect::<Vec<_>>();
        if batch.is_empty() { None } else { Some(batch) }
    }
}

/// Like [`partition`], but also starts a new batch when adding an item would
/// push the summed weight past `max_weight`.
///
/// An item heavier than `max_weight` on its own still gets a batch to itself,
/// so the service can reject it.
pub fn partition_weighted<I, W>(
    items: I,
    size: usize,
    max_weight: usize,
    weigh: W,
) -> Result<WeightedBatches<I::IntoIter, W>>
where
    I: IntoIterator,
    W: FnMut(&I::Item) -> usize,
{
    if size == 0 {
        return Err(Error::invalid_config("batch size must be > 0"));
    }
    if max_weight == 0 {
        return Err(Error::invalid_config("batch payload limit must be > 0"));
    }
    Ok(WeightedBatches {
        items: items.into_iter().peekable(),
        size,
        max_weight,
        weigh,
    })
}

/// Iterator returned by [`partition_weighted`].
pub struct WeightedBatches<I: Iterator, W> {
    items: std::iter::Peekable<I>,
    size: usize,
    max_weight: usize,
    weigh: W,
}

impl<I, W> Iterator for WeightedBatches<I, W>
where
    I: Iterator,
    W: FnMut(&I::Item) -> usize,
{
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::new();
        let mut weight = 0usize;
        while batch.len() < self.size {
            let Some(item) = self.items.peek() else {
                break;
            };
            let item_weight = (self.weigh)(item);
            if !batch.is_empty() && weight.saturating_add(item_weight) > self.max_weight {
                break;
            }
            weight = weight.saturating_add(item_weight);
            batch.extend(self.items.next());
        }
        if batch.is_empty() { None } else { Some(batch) }
    }
}

/// What one submission call reported.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchResponse<T, A> {
    /// Per-item or per-call acknowledgements to hand back to the caller.
    pub acknowledged: Vec<A>,
    /// Submitted items the service did not complete; resubmitted as-is.
    pub unprocessed: Vec<T>,
}

impl<T, A> BatchResponse<T, A> {
    pub fn new(acknowledged: Vec<A>, unprocessed: Vec<T>) -> Self {
        Self {
            acknowledged,
            unprocessed,
        }
    }

    pub fn complete(acknowledged: Vec<A>) -> Self {
        Self::new(acknowledged, Vec::new())
    }
}

/// Result of a bulk operation.
///
/// `unprocessed` holds every item that was still unprocessed after the last
/// allowed attempt of its batch. An empty `unprocessed` means every item was
/// accepted.
#[must_use = "unprocessed items are reported here, not as an error"]
#[derive(Clone, Debug, PartialEq)]
pub struct BulkOutput<T, A> {
    pub acknowledged: Vec<A>,
    pub unprocessed: Vec<T>,
    /// Batches the input was split into.
    pub batches: usize,
    /// Submission calls made, retries included.
    pub calls: usize,
}

impl<T, A> BulkOutput<T, A> {
    pub fn is_complete(&self) -> bool {
        self.unprocessed.is_empty()
    }
}

impl<T, A> Default for BulkOutput<T, A> {
    fn default() -> Self {
        Self {
            acknowledged: Vec::new(),
            unprocessed: Vec::new(),
            batches: 0,
            calls: 0,
        }
    }
}

/// A bulk run stopped by an error, with the progress made before it.
///
/// `output` covers the batches that finished, residue included. `pending`
/// holds every item the service never confirmed: the items of the call that
/// failed and every batch after it, in input order.
#[derive(Debug)]
pub struct BulkError<O, T> {
    pub error: Error,
    pub output: O,
    pub pending: Vec<T>,
}

/// Result of a bulk helper.
pub type BulkResult<T, A> =
    std::result::Result<BulkOutput<T, A>, BulkError<BulkOutput<T, A>, T>>;

impl<O: Default, T> BulkError<O, T> {
    /// An error raised before any call; all of `items` is still pending.
    pub(crate) fn not_started(error: Error, items: impl IntoIterator<Item = T>) -> Self {
        Self {
            error,
            output: O::default(),
            pending: items.into_iter().collect(),
        }
    }
}

impl<O, T> BulkError<O, T> {
    pub fn into_error(self) -> Error {
        self.error
    }

    pub(crate) fn map_output<P>(self, f: impl FnOnce(O) -> P) -> BulkError<P, T> {
        BulkError {
            error: self.error,
            output: f(self.output),
            pending: self.pending,
        }
    }
}

impl<O, T> std::fmt::Display for BulkError<O, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "bulk operation stopped with {} items pending: {}",
            self.pending.len(),
            self.error
        )
    }
}

impl<O: std::fmt::Debug, T: std::fmt::Debug> std::error::Error for BulkError<O, T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<O, T> From<BulkError<O, T>> for Error {
    fn from(err: BulkError<O, T>) -> Self {
        err.error
    }
}

/// Submits each batch, retrying exactly the unprocessed subset until it is
/// empty or `policy.max_attempts()` submissions of that batch have been made.
///
/// Batches are submitted one at a time, in order. Waits between attempts
/// block the calling thread. An error from `submit` stops the run and comes
/// back unchanged in [`BulkError::error`], next to the output so far and the
/// items still pending.
pub fn submit_batches<T, A, I, F>(
    batches: I,
    policy: &BatchPolicy,
    mut submit: F,
) -> BulkResult<T, A>
where
    T: Clone,
    I: IntoIterator<Item = Vec<T>>,
    F: FnMut(Vec<T>) -> Result<BatchResponse<T, A>>,
{
    let mut output = BulkOutput::default();
    let mut batches = batches.into_iter();

    while let Some(batch) = batches.next() {
        if batch.is_empty() {
            continue;
        }
        output.batches += 1;

        #[cfg(feature = "tracing")]
        let _guard = tracing::debug_span!(
            "aws_helpers.batch",
            batch = output.batches,
            size = batch.len()
        )
        .entered();

        let mut pending = batch;
        let mut attempt = 1u32;
        loop {
            #[cfg(feature = "metrics")]
            metrics::counter!("aws_helpers_batch_calls_total").increment(1);

            let response = match submit(pending.clone()) {
                Ok(response) => response,
                Err(error) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %error, attempt, "batch call failed, stopping");

                    pending.extend(batches.by_ref().flatten());
                    return Err(BulkError {
                        error,
                        output,
                        pending,
                    });
                }
            };
            output.calls += 1;
            output.acknowledged.extend(response.acknowledged);

            if response.unprocessed.is_empty() {
                break;
            }

            if attempt >= policy.max_attempts {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    attempts = attempt,
                    unprocessed = response.unprocessed.len(),
                    "batch still has unprocessed items after final attempt"
                );
                #[cfg(feature = "metrics")]
                metrics::counter!("aws_helpers_batch_unprocessed_total")
                    .increment(response.unprocessed.len() as u64);

                output.unprocessed.extend(response.unprocessed);
                break;
            }

            let delay = policy.backoff.delay(attempt);
            #[cfg(feature = "tracing")]
            tracing::debug!(
                attempt,
                unprocessed = response.unprocessed.len(),
                delay_ms = delay.as_millis() as u64,
                "retrying unprocessed items"
            );
            #[cfg(feature = "metrics")]
            metrics::counter!("aws_helpers_batch_retries_total").increment(1);

            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            attempt += 1;
            pending = response.unprocessed;
        }
    }

    Ok(output)
}
