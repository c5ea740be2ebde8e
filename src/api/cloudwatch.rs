//! Single-metric `GetMetricData` helper.

use std::collections::BTreeMap;

use time::OffsetDateTime;

use crate::{
    error::Result,
    paginate::{Page, Paginator},
    types::cloudwatch::{
        Dimension, GetMetricDataInput, GetMetricDataOutput, Metric, MetricDataQuery, MetricStat,
    },
};

/// The CloudWatch calls the helpers need.
pub trait CloudWatchApi {
    fn get_metric_data(&self, input: &GetMetricDataInput) -> Result<GetMetricDataOutput>;
}

/// One metric, one statistic, one time range.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricDataRequest {
    pub namespace: String,
    pub metric_name: String,
    /// Empty for metrics without dimensions.
    pub dimensions: BTreeMap<String, String>,
    /// Granularity of the returned points, in seconds.
    pub period: u32,
    /// e.g. `Maximum`, `Sum`, `p99`.
    pub stat: String,
    pub start_time: OffsetDateTime,
    pub end_time: OffsetDateTime,
    pub unit: Option<String>,
    pub expression: Option<String>,
    /// Query-level period, sent alongside the statistic's own.
    pub query_period: Option<u32>,
    pub account_id: Option<String>,
}

impl MetricDataRequest {
    pub fn new(
        namespace: impl Into<String>,
        metric_name: impl Into<String>,
        period: u32,
        stat: impl Into<String>,
        start_time: OffsetDateTime,
        end_time: OffsetDateTime,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            metric_name: metric_name.into(),
            dimensions: BTreeMap::new(),
            period,
            stat: stat.into(),
            start_time,
            end_time,
            unit: None,
            expression: None,
            query_period: None,
            account_id: None,
        }
    }

    pub fn dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.insert(name.into(), value.into());
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    fn to_input(&self) -> GetMetricDataInput {
        let query = MetricDataQuery {
            id: "query0".to_string(),
            metric_stat: Some(MetricStat {
                metric: Metric {
                    namespace: self.namespace.clone(),
                    metric_name: self.metric_name.clone(),
                    dimensions: self
                        .dimensions
                        .iter()
                        .map(|(name, value)| Dimension {
                            name: name.clone(),
                            value: value.clone(),
                        })
                        .collect(),
                },
                period: self.period,
                stat: self.stat.clone(),
                unit: self.unit.clone(),
            }),
            expression: self.expression.clone(),
            period: self.query_period,
            account_id: self.account_id.clone(),
            ..MetricDataQuery::default()
        };
        GetMetricDataInput {
            metric_data_queries: vec![query],
            start_time: self.start_time,
            end_time: self.end_time,
            next_token: None,
            scan_by: Some("TimestampAscending".to_string()),
            max_datapoints: None,
        }
    }
}

/// Every `(timestamp, value)` point of the metric, oldest first, across all
/// pages.
pub fn metric_data<'a, C>(
    client: &'a C,
    request: &MetricDataRequest,
) -> impl Iterator<Item = Result<(OffsetDateTime, f64)>> + 'a
where
    C: CloudWatchApi + ?Sized,
{
    let input = request.to_input();
    Paginator::new(move |token: Option<String>| {
        let mut page_input = input.clone();
        page_input.next_token = token;
        let page = client.get_metric_data(&page_input)?;
        let points = page
            .metric_data_results
            .into_iter()
            .flat_map(|result| result.timestamps.into_iter().zip(result.values))
            .collect();
        Ok(Page::new(points, page.next_token))
    })
}

#[cfg(feature = "client")]
impl CloudWatchApi for crate::client::AwsClient {
    fn get_metric_data(&self, input: &GetMetricDataInput) -> Result<GetMetricDataOutput> {
        self.call_json(&crate::client::JsonService::CLOUDWATCH, "GetMetricData", input)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::types::cloudwatch::MetricDataResult;

    struct FakeCloudWatch {
        pages: Vec<GetMetricDataOutput>,
        requests: RefCell<Vec<GetMetricDataInput>>,
    }

    impl CloudWatchApi for FakeCloudWatch {
        fn get_metric_data(&self, input: &GetMetricDataInput) -> Result<GetMetricDataOutput> {
            let mut requests = self.requests.borrow_mut();
            requests.push(input.clone());
            Ok(self.pages[requests.len() - 1].clone())
        }
    }

    fn at(secs: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(secs).unwrap()
    }

    fn result(points: &[(i64, f64)]) -> MetricDataResult {
        MetricDataResult {
            id: "query0".to_string(),
            timestamps: points.iter().map(|(t, _)| at(*t)).collect(),
            values: points.iter().map(|(_, v)| *v).collect(),
            ..MetricDataResult::default()
        }
    }

    #[test]
    fn yields_points_across_pages() {
        let cw = FakeCloudWatch {
            pages: vec![
                GetMetricDataOutput {
                    metric_data_results: vec![result(&[(0, 1.0), (60, 2.0)])],
                    next_token: Some("n1".to_string()),
                },
                GetMetricDataOutput {
                    metric_data_results: vec![result(&[(120, 3.5)])],
                    next_token: None,
                },
            ],
            requests: RefCell::new(Vec::new()),
        };
        let request = MetricDataRequest::new("AWS/S3", "NumberOfObjects", 86_400, "Maximum", at(0), at(180))
            .dimension("StorageType", "AllStorageTypes")
            .dimension("BucketName", "example-bucket");

        let points = metric_data(&cw, &request)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(points, vec![(at(0), 1.0), (at(60), 2.0), (at(120), 3.5)]);

        let requests = cw.requests.borrow();
        assert_eq!(requests[1].next_token.as_deref(), Some("n1"));
        let wire = serde_json::to_value(&requests[0]).unwrap();
        assert_eq!(
            wire,
            json!({
                "MetricDataQueries": [{
                    "Id": "query0",
                    "MetricStat": {
                        "Metric": {
                            "Namespace": "AWS/S3",
                            "MetricName": "NumberOfObjects",
                            "Dimensions": [
                                {"Name": "BucketName", "Value": "example-bucket"},
                                {"Name": "StorageType", "Value": "AllStorageTypes"},
                            ],
                        },
                        "Period": 86400,
                        "Stat": "Maximum",
                    },
                }],
                "StartTime": 0.0,
                "EndTime": 180.0,
                "ScanBy": "TimestampAscending",
            })
        );
    }

    #[test]
    fn unit_goes_on_the_statistic() {
        let request = MetricDataRequest::new("ns", "m", 60, "Sum", at(0), at(60))
            .unit("Count")
            .account_id("123456789012");
        let input = request.to_input();
        let query = &input.metric_data_queries[0];
        assert_eq!(
            query.metric_stat.as_ref().and_then(|s| s.unit.as_deref()),
            Some("Count")
        );
        assert_eq!(query.account_id.as_deref(), Some("123456789012"));
        assert_eq!(query.period, None);
    }
}
