mod common;

use aws_helpers::{
    Error,
    api::{dynamodb, sqs},
    batch::{Backoff, BatchPolicy},
    types::{
        dynamodb::WriteRequest,
        sqs::{DeleteMessageEntry, SendMessageEntry},
    },
};

use common::{FakeDynamo, FakeSqs, item, item_id};

fn policy(batch_size: usize, max_attempts: u32) -> BatchPolicy {
    BatchPolicy::builder()
        .batch_size(batch_size)
        .max_attempts(max_attempts)
        .backoff(Backoff::None)
        .build()
        .unwrap()
}

fn written_ids(requests: &[WriteRequest]) -> Vec<usize> {
    requests
        .iter()
        .map(|r| match r {
            WriteRequest::PutRequest { item } => item_id(item),
            WriteRequest::DeleteRequest { key } => item_id(key),
        })
        .collect()
}

#[test]
fn sixty_puts_go_out_as_25_25_10() {
    let client = FakeDynamo::default();
    let output = dynamodb::put_items(&client, "t", (0..60).map(item), &policy(25, 3)).unwrap();

    assert_eq!(client.write_sizes(), vec![25, 25, 10]);
    assert!(output.is_complete());
    assert_eq!(output.acknowledged.len(), 60);
    assert_eq!(output.batches, 3);
    assert_eq!(output.calls, 3);
    assert_eq!(written_ids(&output.acknowledged), (0..60).collect::<Vec<_>>());
}

#[test]
fn only_the_unprocessed_subset_is_resubmitted() {
    let client = FakeDynamo::with_unprocessed([3, 0]);
    let output = dynamodb::put_items(&client, "t", (0..25).map(item), &policy(25, 3)).unwrap();

    assert_eq!(client.write_sizes(), vec![25, 3]);
    assert_eq!(
        written_ids(&client.write_calls.borrow()[1]),
        vec![22, 23, 24]
    );
    assert!(output.is_complete());
    assert_eq!(output.calls, 2);
    assert_eq!(output.acknowledged.len(), 25);
}

#[test]
fn residue_after_last_attempt_is_returned() {
    let client = FakeDynamo::with_unprocessed([5, 5, 5]);
    let output = dynamodb::delete_keys(&client, "t", (0..10).map(item), &policy(25, 3)).unwrap();

    assert_eq!(client.write_sizes(), vec![10, 5, 5]);
    assert!(!output.is_complete());
    assert_eq!(written_ids(&output.unprocessed), vec![5, 6, 7, 8, 9]);
    assert_eq!(written_ids(&output.acknowledged), vec![0, 1, 2, 3, 4]);
    assert_eq!(output.calls, 3);
}

#[test]
fn empty_input_makes_no_calls() {
    let client = FakeDynamo::default();
    let output = dynamodb::put_items(&client, "t", Vec::new(), &policy(25, 3)).unwrap();

    assert!(client.write_calls.borrow().is_empty());
    assert!(output.is_complete());
    assert_eq!(output.calls, 0);
}

#[test]
fn bad_policies_fail_before_any_call() {
    assert!(matches!(
        BatchPolicy::with_batch_size(0),
        Err(Error::InvalidConfig { .. })
    ));
    assert!(matches!(
        BatchPolicy::builder().max_attempts(0).build(),
        Err(Error::InvalidConfig { .. })
    ));

    let client = FakeDynamo::default();
    let err = dynamodb::put_items(&client, "t", (0..30).map(item), &policy(26, 3)).unwrap_err();
    assert!(matches!(err.error, Error::InvalidConfig { .. }));
    assert_eq!(written_ids(&err.pending), (0..30).collect::<Vec<_>>());
    assert!(client.write_calls.borrow().is_empty());
}

#[test]
fn failed_call_keeps_earlier_results_and_returns_unsent_items() {
    let client = FakeDynamo {
        fail_write_at: Some(2),
        ..FakeDynamo::with_unprocessed([1])
    };
    let err = dynamodb::put_items(&client, "t", (0..4).map(item), &policy(2, 1)).unwrap_err();

    assert!(matches!(err.error, Error::Transport { .. }));
    assert_eq!(written_ids(&err.output.acknowledged), vec![0]);
    assert_eq!(written_ids(&err.output.unprocessed), vec![1]);
    assert_eq!(err.output.calls, 1);
    assert_eq!(written_ids(&err.pending), vec![2, 3]);
    assert_eq!(client.write_sizes(), vec![2, 2]);

    let err: Error = err.into();
    assert!(err.is_retryable());
}

#[test]
fn batch_get_returns_found_items() {
    let client = FakeDynamo::default();
    let output =
        dynamodb::batch_get_items(&client, "t", (0..150).map(item), &BatchPolicy::dynamodb_get())
            .unwrap();

    assert!(output.is_complete());
    assert_eq!(output.calls, 2);
    assert_eq!(output.acknowledged.len(), 150);
}

#[test]
fn sqs_retries_service_faults_and_reports_sender_faults() {
    let client = FakeSqs {
        busy_failures: 1,
        ..FakeSqs::default()
    };
    let mut handles: Vec<String> = (0..23).map(|i| format!("handle-{i}")).collect();
    handles[0] = "busy-0".to_string();
    handles[12] = "bad-12".to_string();

    let output = sqs::delete_batches(
        &client,
        "https://sqs.us-east-2.amazonaws.com/000000000000/q",
        handles.into_iter().map(DeleteMessageEntry::new),
        &policy(10, 3),
    )
    .unwrap();

    assert_eq!(*client.batch_sizes.borrow(), vec![10, 1, 10, 3]);
    assert_eq!(output.calls, 4);
    assert_eq!(output.successful.len(), 22);
    assert_eq!(output.failed.len(), 1);
    let failed = &output.failed[0];
    assert_eq!(failed.entry.receipt_handle, "bad-12");
    assert!(failed.error.as_ref().unwrap().sender_fault);
}

#[test]
fn sqs_send_assigns_ids_and_gives_up_on_persistent_faults() {
    let client = FakeSqs {
        busy_failures: usize::MAX,
        ..FakeSqs::default()
    };
    let messages = vec![
        SendMessageEntry::new("hello"),
        SendMessageEntry::new("busy-forever"),
    ];

    let output = sqs::send_batches(&client, "q", messages, &policy(10, 2)).unwrap();

    assert_eq!(*client.batch_sizes.borrow(), vec![2, 1]);
    assert_eq!(output.successful.len(), 1);
    assert!(output.successful[0].id.ends_with("-1"));
    assert_eq!(output.failed.len(), 1);
    let failed = &output.failed[0];
    assert!(failed.entry.id.as_deref().unwrap().ends_with("-2"));
    assert_eq!(failed.error.as_ref().unwrap().code, "InternalError");
}
