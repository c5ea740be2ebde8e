#![cfg(feature = "client")]

mod common;

use std::collections::HashMap;

use aws_helpers::{
    AwsClient, Error,
    api::dynamodb,
    batch::BatchPolicy,
    types::dynamodb::{AttributeValue, ScanInput},
};

fn build_client(cfg: &common::TestConfig) -> Result<AwsClient, Error> {
    AwsClient::builder()
        .region(cfg.region.as_str())
        .auth(cfg.auth.clone())
        .endpoint(&cfg.endpoint)
        .build()
}

/// Needs `AWS_HELPERS_TEST_TABLE`: an existing table keyed by string `pk`.
#[test]
fn live_dynamodb_put_scan_delete() -> Result<(), Error> {
    let Some(cfg) = common::load_config()? else {
        return Ok(());
    };
    let Some(table) = cfg.table.clone() else {
        return Ok(());
    };

    let client = build_client(&cfg)?;
    let prefix = common::unique_name("aws-helpers-it-");
    let keys: Vec<_> = (0..30)
        .map(|i| HashMap::from([("pk".to_string(), AttributeValue::s(format!("{prefix}-{i}")))]))
        .collect();

    let put = dynamodb::put_items(&client, &table, keys.clone(), &BatchPolicy::dynamodb_write())?;
    assert!(put.is_complete());
    assert!(put.calls >= 2);

    let found = dynamodb::scan_table(&client, ScanInput::new(&table))
        .filter(|item| {
            item.as_ref().map_or(true, |item| {
                item.get("pk")
                    .and_then(AttributeValue::as_s)
                    .is_some_and(|pk| pk.starts_with(&prefix))
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    assert_eq!(found.len(), 30);

    let deleted = dynamodb::delete_keys(&client, &table, keys, &BatchPolicy::dynamodb_write())?;
    assert!(deleted.is_complete());
    Ok(())
}
