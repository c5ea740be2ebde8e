//! Kinesis shard listing and "read what is there now" record helpers.

use crate::{
    error::Result,
    paginate::{Page, Paginator},
    types::kinesis::{
        GetRecordsInput, GetRecordsOutput, GetShardIteratorInput, GetShardIteratorOutput,
        ListShardsInput, ListShardsOutput, Record, Shard, ShardIteratorType,
    },
};

/// The Kinesis calls the helpers need.
pub trait KinesisApi {
    fn list_shards(&self, input: &ListShardsInput) -> Result<ListShardsOutput>;
    fn get_shard_iterator(&self, input: &GetShardIteratorInput) -> Result<GetShardIteratorOutput>;
    fn get_records(&self, input: &GetRecordsInput) -> Result<GetRecordsOutput>;
}

/// Every shard `input` lists.
///
/// `ListShards` rejects `StreamName`, `ExclusiveStartShardId` and
/// `StreamCreationTimestamp` alongside `NextToken`, so they are dropped from
/// every request that carries a token.
pub fn list_all_shards<'a, C>(
    client: &'a C,
    input: ListShardsInput,
) -> impl Iterator<Item = Result<Shard>> + 'a
where
    C: KinesisApi + ?Sized,
{
    let start = input.next_token.clone();
    Paginator::starting_at(start, move |token: Option<String>| {
        let mut request = input.clone();
        if token.is_some() {
            request.stream_name = None;
            request.exclusive_start_shard_id = None;
            request.stream_creation_timestamp = None;
        }
        request.next_token = token;
        let page = client.list_shards(&request)?;
        Ok(Page::new(page.shards, page.next_token))
    })
}

/// Records currently available in one shard.
///
/// Gets an iterator per `input`, then calls `GetRecords` until the shard is
/// caught up (`MillisBehindLatest == 0`) or closed (no next iterator). Empty
/// responses in between are followed.
pub fn available_shard_records<'a, C>(
    client: &'a C,
    input: GetShardIteratorInput,
) -> impl Iterator<Item = Result<Record>> + 'a
where
    C: KinesisApi + ?Sized,
{
    Paginator::new(move |iterator: Option<String>| {
        let shard_iterator = match iterator {
            Some(iterator) => iterator,
            None => client.get_shard_iterator(&input)?.shard_iterator,
        };
        let page = client.get_records(&GetRecordsInput {
            shard_iterator,
            limit: None,
        })?;
        let next = match page.millis_behind_latest {
            Some(0) => None,
            _ => page.next_shard_iterator,
        };
        Ok(Page::new(page.records, next))
    })
}

/// Records currently available in every shard of `stream_name`, read from
/// `TRIM_HORIZON`, one shard after another in listing order.
pub fn available_stream_records<'a, C>(
    client: &'a C,
    stream_name: &str,
) -> impl Iterator<Item = Result<Record>> + 'a
where
    C: KinesisApi + ?Sized,
{
    let stream_name = stream_name.to_string();
    list_all_shards(client, ListShardsInput::for_stream(stream_name.clone())).flat_map(
        move |shard| -> Box<dyn Iterator<Item = Result<Record>> + 'a> {
            match shard {
                Ok(shard) => Box::new(available_shard_records(
                    client,
                    GetShardIteratorInput::new(
                        stream_name.clone(),
                        shard.shard_id,
                        ShardIteratorType::TrimHorizon,
                    ),
                )),
                Err(err) => Box::new(std::iter::once(Err(err))),
            }
        },
    )
}

#[cfg(feature = "client")]
impl KinesisApi for crate::client::AwsClient {
    fn list_shards(&self, input: &ListShardsInput) -> Result<ListShardsOutput> {
        self.call_json(&crate::client::JsonService::KINESIS, "ListShards", input)
    }

    fn get_shard_iterator(&self, input: &GetShardIteratorInput) -> Result<GetShardIteratorOutput> {
        self.call_json(&crate::client::JsonService::KINESIS, "GetShardIterator", input)
    }

    fn get_records(&self, input: &GetRecordsInput) -> Result<GetRecordsOutput> {
        self.call_json(&crate::client::JsonService::KINESIS, "GetRecords", input)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap};

    use super::*;

    fn record(seq: &str) -> Record {
        Record {
            sequence_number: seq.to_string(),
            partition_key: "pk".to_string(),
            data: seq.as_bytes().to_vec(),
            approximate_arrival_timestamp: None,
        }
    }

    fn shard(id: &str) -> Shard {
        Shard {
            shard_id: id.to_string(),
            ..Shard::default()
        }
    }

    #[derive(Default)]
    struct FakeStream {
        shard_pages: Vec<ListShardsOutput>,
        list_requests: RefCell<Vec<ListShardsInput>>,
        /// Shard iterator to the response for it.
        records: HashMap<String, GetRecordsOutput>,
        iterator_requests: RefCell<Vec<GetShardIteratorInput>>,
    }

    impl KinesisApi for FakeStream {
        fn list_shards(&self, input: &ListShardsInput) -> Result<ListShardsOutput> {
            let mut requests = self.list_requests.borrow_mut();
            requests.push(input.clone());
            Ok(self.shard_pages[requests.len() - 1].clone())
        }

        fn get_shard_iterator(
            &self,
            input: &GetShardIteratorInput,
        ) -> Result<GetShardIteratorOutput> {
            self.iterator_requests.borrow_mut().push(input.clone());
            Ok(GetShardIteratorOutput {
                shard_iterator: format!("{}/0", input.shard_id),
            })
        }

        fn get_records(&self, input: &GetRecordsInput) -> Result<GetRecordsOutput> {
            Ok(self.records[&input.shard_iterator].clone())
        }
    }

    fn two_shard_stream() -> FakeStream {
        let step = |records: Vec<Record>, next: Option<&str>, behind: u64| GetRecordsOutput {
            records,
            next_shard_iterator: next.map(str::to_string),
            millis_behind_latest: Some(behind),
        };
        FakeStream {
            shard_pages: vec![
                ListShardsOutput {
                    shards: vec![shard("shard-a")],
                    next_token: Some("tok".to_string()),
                },
                ListShardsOutput {
                    shards: vec![shard("shard-b")],
                    next_token: None,
                },
            ],
            records: HashMap::from([
                (
                    "shard-a/0".to_string(),
                    step(vec![record("a1"), record("a2")], Some("shard-a/1"), 500),
                ),
                ("shard-a/1".to_string(), step(vec![], Some("shard-a/2"), 100)),
                (
                    "shard-a/2".to_string(),
                    step(vec![record("a3")], Some("shard-a/3"), 0),
                ),
                (
                    "shard-b/0".to_string(),
                    GetRecordsOutput {
                        records: vec![record("b1")],
                        next_shard_iterator: None,
                        millis_behind_latest: Some(20),
                    },
                ),
            ]),
            ..FakeStream::default()
        }
    }

    #[test]
    fn token_requests_drop_conflicting_fields() {
        let stream = two_shard_stream();
        let mut input = ListShardsInput::for_stream("s");
        input.exclusive_start_shard_id = Some("shard-0".to_string());

        let shards = list_all_shards(&stream, input)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(shards, vec![shard("shard-a"), shard("shard-b")]);

        let requests = stream.list_requests.borrow();
        assert_eq!(requests[0].stream_name.as_deref(), Some("s"));
        assert_eq!(requests[0].next_token, None);
        assert_eq!(requests[1].next_token.as_deref(), Some("tok"));
        assert_eq!(requests[1].stream_name, None);
        assert_eq!(requests[1].exclusive_start_shard_id, None);
    }

    #[test]
    fn shard_reading_stops_when_caught_up() {
        let stream = two_shard_stream();
        let seqs = available_shard_records(
            &stream,
            GetShardIteratorInput::new("s", "shard-a", ShardIteratorType::Latest),
        )
        .map(|r| r.map(|r| r.sequence_number))
        .collect::<Result<Vec<_>>>()
        .unwrap();

        // "shard-a/3" is never requested; it is not in the fake.
        assert_eq!(seqs, vec!["a1", "a2", "a3"]);
        assert_eq!(
            stream.iterator_requests.borrow()[0].shard_iterator_type,
            ShardIteratorType::Latest
        );
    }

    #[test]
    fn stream_reads_every_shard_from_trim_horizon() {
        let stream = two_shard_stream();
        let seqs = available_stream_records(&stream, "s")
            .map(|r| r.map(|r| r.sequence_number))
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(seqs, vec!["a1", "a2", "a3", "b1"]);
        let iterators = stream.iterator_requests.borrow();
        assert_eq!(iterators.len(), 2);
        assert!(
            iterators
                .iter()
                .all(|i| i.shard_iterator_type == ShardIteratorType::TrimHorizon
                    && i.stream_name == "s")
        );
    }
}
