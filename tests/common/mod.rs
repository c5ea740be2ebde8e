#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    env,
    sync::atomic::{AtomicUsize, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use aws_helpers::{
    Auth, Error, Region, Result,
    api::{DynamoDbApi, SqsApi},
    types::{
        dynamodb::{
            AttributeValue, BatchGetItemInput, BatchGetItemOutput, BatchWriteItemInput,
            BatchWriteItemOutput, Item, ItemPage, QueryInput, ScanInput, UpdateItemInput,
            UpdateItemOutput, WriteRequest,
        },
        sqs::{
            BatchEntryResult, BatchOutput, BatchResultErrorEntry, ChangeMessageVisibilityBatchInput,
            ChangeMessageVisibilityBatchOutput, DeleteMessageBatchInput, DeleteMessageBatchOutput,
            SendMessageBatchInput, SendMessageBatchOutput, SendMessageResult,
        },
    },
};

static NAME_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub(crate) struct TestConfig {
    pub(crate) endpoint: String,
    pub(crate) region: Region,
    pub(crate) auth: Auth,
    pub(crate) table: Option<String>,
}

/// Live settings, or `None` when `AWS_HELPERS_TEST_ENDPOINT` is unset.
pub(crate) fn load_config() -> Result<Option<TestConfig>> {
    let Ok(endpoint) = env::var("AWS_HELPERS_TEST_ENDPOINT") else {
        return Ok(None);
    };

    let region = env::var("AWS_HELPERS_TEST_REGION").unwrap_or_else(|_| "us-east-1".to_string());
    let region = Region::new(region)?;

    let Ok(auth) = Auth::from_env() else {
        return Ok(None);
    };

    Ok(Some(TestConfig {
        endpoint,
        region,
        auth,
        table: env::var("AWS_HELPERS_TEST_TABLE").ok(),
    }))
}

pub(crate) fn unique_name(prefix: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let n = NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}{now}-{n}")
}

pub(crate) fn item(id: usize) -> Item {
    HashMap::from([("id".to_string(), AttributeValue::n(id))])
}

pub(crate) fn item_id(item: &Item) -> usize {
    item["id"]
        .as_n()
        .and_then(|n| n.parse().ok())
        .unwrap_or(usize::MAX)
}

/// In-memory DynamoDB.
///
/// `BatchWriteItem` call `i` leaves the last `unprocessed[i]` requests of its
/// batch unprocessed (zero once the script runs out). `Scan` walks `pages`,
/// using the page index as `LastEvaluatedKey`. Call `fail_write_at` or
/// `fail_scan_at` (1-based) fails in transport.
#[derive(Default)]
pub(crate) struct FakeDynamo {
    pub(crate) unprocessed: RefCell<VecDeque<usize>>,
    pub(crate) pages: Vec<Vec<Item>>,
    pub(crate) write_calls: RefCell<Vec<Vec<WriteRequest>>>,
    pub(crate) scan_calls: RefCell<Vec<ScanInput>>,
    pub(crate) fail_scan_at: Option<usize>,
    pub(crate) fail_write_at: Option<usize>,
}

impl FakeDynamo {
    pub(crate) fn with_unprocessed(script: impl IntoIterator<Item = usize>) -> Self {
        Self {
            unprocessed: RefCell::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    pub(crate) fn with_pages(pages: Vec<Vec<Item>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub(crate) fn write_sizes(&self) -> Vec<usize> {
        self.write_calls.borrow().iter().map(Vec::len).collect()
    }
}

impl DynamoDbApi for FakeDynamo {
    fn query(&self, _input: &QueryInput) -> Result<ItemPage> {
        Ok(ItemPage::default())
    }

    fn scan(&self, input: &ScanInput) -> Result<ItemPage> {
        let calls = {
            let mut calls = self.scan_calls.borrow_mut();
            calls.push(input.clone());
            calls.len()
        };
        if self.fail_scan_at == Some(calls) {
            return Err(Error::transport("connection reset", None));
        }

        let index = input
            .exclusive_start_key
            .as_ref()
            .map_or(0, |key| item_id(key));
        let items = self.pages.get(index).cloned().unwrap_or_default();
        let last_evaluated_key = (index + 1 < self.pages.len()).then(|| item(index + 1));
        Ok(ItemPage {
            count: items.len() as u32,
            scanned_count: items.len() as u32,
            items,
            last_evaluated_key,
        })
    }

    fn update_item(&self, _input: &UpdateItemInput) -> Result<UpdateItemOutput> {
        Ok(UpdateItemOutput::default())
    }

    fn batch_write_item(&self, input: &BatchWriteItemInput) -> Result<BatchWriteItemOutput> {
        let mut unprocessed_items = HashMap::new();
        for (table, requests) in &input.request_items {
            let calls = {
                let mut calls = self.write_calls.borrow_mut();
                calls.push(requests.clone());
                calls.len()
            };
            if self.fail_write_at == Some(calls) {
                return Err(Error::transport("connection reset", None));
            }
            let left = self
                .unprocessed
                .borrow_mut()
                .pop_front()
                .unwrap_or(0)
                .min(requests.len());
            if left > 0 {
                unprocessed_items.insert(
                    table.clone(),
                    requests[requests.len() - left..].to_vec(),
                );
            }
        }
        Ok(BatchWriteItemOutput { unprocessed_items })
    }

    fn batch_get_item(&self, input: &BatchGetItemInput) -> Result<BatchGetItemOutput> {
        let responses = input
            .request_items
            .iter()
            .map(|(table, keys)| (table.clone(), keys.keys.clone()))
            .collect();
        Ok(BatchGetItemOutput {
            responses,
            unprocessed_keys: HashMap::new(),
        })
    }
}

/// In-memory SQS.
///
/// Entries whose body or receipt handle starts with `bad` fail as sender
/// faults. Entries starting with `busy` fail as service faults on their first
/// `busy_failures` submissions.
#[derive(Default)]
pub(crate) struct FakeSqs {
    pub(crate) busy_failures: usize,
    pub(crate) seen: RefCell<HashMap<String, usize>>,
    pub(crate) batch_sizes: RefCell<Vec<usize>>,
}

impl FakeSqs {
    fn outcome<S>(
        &self,
        entries: impl Iterator<Item = (String, String)>,
        ok: impl Fn(&str) -> S,
    ) -> BatchOutput<S> {
        let mut output = BatchOutput {
            successful: Vec::new(),
            failed: Vec::new(),
        };
        let mut size = 0;
        for (id, payload) in entries {
            size += 1;
            let attempt = {
                let mut seen = self.seen.borrow_mut();
                let count = seen.entry(payload.clone()).or_default();
                *count += 1;
                *count
            };
            if payload.starts_with("bad") {
                output.failed.push(error_entry(&id, true, "InvalidParameterValue"));
            } else if payload.starts_with("busy") && attempt <= self.busy_failures {
                output.failed.push(error_entry(&id, false, "InternalError"));
            } else {
                output.successful.push(ok(&id));
            }
        }
        self.batch_sizes.borrow_mut().push(size);
        output
    }
}

fn error_entry(id: &str, sender_fault: bool, code: &str) -> BatchResultErrorEntry {
    BatchResultErrorEntry {
        id: id.to_string(),
        sender_fault,
        code: code.to_string(),
        message: None,
    }
}

impl SqsApi for FakeSqs {
    fn send_message_batch(&self, input: &SendMessageBatchInput) -> Result<SendMessageBatchOutput> {
        let entries = input
            .entries
            .iter()
            .map(|e| (e.id.clone().unwrap_or_default(), e.message_body.clone()));
        Ok(self.outcome(entries, |id| SendMessageResult {
            id: id.to_string(),
            message_id: format!("msg-{id}"),
            ..SendMessageResult::default()
        }))
    }

    fn delete_message_batch(
        &self,
        input: &DeleteMessageBatchInput,
    ) -> Result<DeleteMessageBatchOutput> {
        let entries = input
            .entries
            .iter()
            .map(|e| (e.id.clone().unwrap_or_default(), e.receipt_handle.clone()));
        Ok(self.outcome(entries, |id| BatchEntryResult { id: id.to_string() }))
    }

    fn change_message_visibility_batch(
        &self,
        input: &ChangeMessageVisibilityBatchInput,
    ) -> Result<ChangeMessageVisibilityBatchOutput> {
        let entries = input
            .entries
            .iter()
            .map(|e| (e.id.clone().unwrap_or_default(), e.receipt_handle.clone()));
        Ok(self.outcome(entries, |id| BatchEntryResult { id: id.to_string() }))
    }
}
