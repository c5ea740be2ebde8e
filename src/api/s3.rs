//! S3 listing and S3 Select helpers.

use std::collections::VecDeque;

use crate::{
    error::{Error, Result},
    paginate::{Page, Paginator},
    types::s3::{
        InputSerialization, ListObjectsV2Input, ListObjectsV2Output, Object,
        OutputSerialization, SelectEvent, SelectObjectContentInput,
    },
};

/// Event stream of one `SelectObjectContent` response.
pub type SelectEventStream<'a> = Box<dyn Iterator<Item = Result<SelectEvent>> + 'a>;

/// The S3 calls the helpers need.
pub trait S3Api {
    fn list_objects_v2(&self, input: &ListObjectsV2Input) -> Result<ListObjectsV2Output>;

    fn select_object_content(
        &self,
        input: &SelectObjectContentInput,
    ) -> Result<SelectEventStream<'_>>;
}

/// Every object `input` lists, following `NextContinuationToken`.
pub fn list_objects<'a, C>(
    client: &'a C,
    input: ListObjectsV2Input,
) -> impl Iterator<Item = Result<Object>> + 'a
where
    C: S3Api + ?Sized,
{
    let start = input.continuation_token.clone();
    Paginator::starting_at(start, move |token: Option<String>| {
        let mut request = input.clone();
        request.continuation_token = token;
        let page = client.list_objects_v2(&request)?;
        Ok(Page::new(page.contents, page.next_continuation_token))
    })
}

/// Runs an S3 Select `expression` over `bucket/key` and yields each output
/// record decoded from JSON.
///
/// `input` is a [`SelectFormat`](crate::types::s3::SelectFormat) preset or a
/// full [`InputSerialization`]. The request is sent before this returns;
/// records are decoded as events arrive.
pub fn query_object<'a, C>(
    client: &'a C,
    bucket: &str,
    key: &str,
    expression: &str,
    input: impl Into<InputSerialization>,
) -> Result<SelectRecords<SelectEventStream<'a>>>
where
    C: S3Api + ?Sized,
{
    #[cfg(feature = "tracing")]
    let _guard = tracing::info_span!("aws_helpers.s3.query_object", bucket, key).entered();

    let events = client.select_object_content(&SelectObjectContentInput {
        bucket: bucket.to_string(),
        key: key.to_string(),
        expression: expression.to_string(),
        expression_type: "SQL".to_string(),
        input_serialization: input.into(),
        output_serialization: OutputSerialization::json_lines(),
    })?;
    Ok(SelectRecords::new(events))
}

/// Reassembles newline-delimited JSON records from `Records` events.
///
/// Records may be split across events. Other event kinds are skipped. A
/// record that fails to decode is yielded as an error and iteration goes on;
/// a stream error ends iteration.
pub struct SelectRecords<I> {
    events: I,
    buffer: Vec<u8>,
    ready: VecDeque<Result<serde_json::Value>>,
    done: bool,
}

impl<I> SelectRecords<I>
where
    I: Iterator<Item = Result<SelectEvent>>,
{
    pub fn new(events: I) -> Self {
        Self {
            events,
            buffer: Vec::new(),
            ready: VecDeque::new(),
            done: false,
        }
    }

    fn drain_lines(&mut self) {
        while let Some(end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line = self.buffer.drain(..=end).collect::<Vec<_>>();
            self.push_record(&line);
        }
    }

    fn push_record(&mut self, line: &[u8]) {
        if line.iter().all(u8::is_ascii_whitespace) {
            return;
        }
        self.ready
            .push_back(serde_json::from_slice(line).map_err(Error::from));
    }
}

impl<I> Iterator for SelectRecords<I>
where
    I: Iterator<Item = Result<SelectEvent>>,
{
    type Item = Result<serde_json::Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.ready.pop_front() {
                return Some(record);
            }
            if self.done {
                return None;
            }
            match self.events.next() {
                Some(Ok(SelectEvent::Records(chunk))) => {
                    self.buffer.extend_from_slice(&chunk);
                    self.drain_lines();
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                None => {
                    self.done = true;
                    // S3 terminates every record, but keep a trailing one.
                    let rest = std::mem::take(&mut self.buffer);
                    self.push_record(&rest);
                }
            }
        }
    }
}
