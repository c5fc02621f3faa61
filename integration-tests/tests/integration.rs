use std::sync::Arc;

use dynamo_frames::auth::{Direct, Simple};
use dynamo_frames::dynamo::region;
use dynamo_frames::dynamo::{AttributeValue, AttributeValueUpdate, Attributes, Region, Transport};
use dynamo_frames::retry::ReRegion;

use dynamo_frames_integration_tests::config::{Secrets, load_secrets};

fn create_region(secrets: &Secrets) -> Arc<dyn Region> {
    let keys = Simple::new(&secrets.key, &secrets.secret, &secrets.region);
    let credentials = Direct::new(keys, &secrets.endpoint);
    Arc::new(ReRegion::new(Arc::new(region::Simple::new(credentials))))
}

async fn hash_key(region: &dyn Region, table: &str) -> Result<String, String> {
    let aws = region.aws().await.map_err(|e| e.to_string())?;
    let keys = aws.describe_keys(table).await.map_err(|e| e.to_string())?;
    keys.into_iter()
        .next()
        .ok_or_else(|| format!("Table {table} has no keys"))
}

#[tokio::test]
async fn put_and_read_smoke() -> Result<(), String> {
    let Some(secrets) = load_secrets()? else {
        eprintln!("secrets.json not found, skipping");
        return Ok(());
    };
    let region = create_region(&secrets);
    let key = hash_key(region.as_ref(), &secrets.table).await?;
    let table = region.table(&secrets.table);

    let id = uuid::Uuid::new_v4().to_string();
    let item = table
        .put(&Attributes::new().with(key.as_str(), id.as_str()).with("visits", 1))
        .await
        .map_err(|e| e.to_string())?;

    let updated = item
        .put("visits", AttributeValueUpdate::add(2))
        .await
        .map_err(|e| e.to_string())?;
    assert_eq!(updated.get("visits"), Some(&AttributeValue::from(3)));

    let frame = table.frame().where_eq(&key, AttributeValue::from(id.as_str()));
    assert_eq!(frame.size().await.map_err(|e| e.to_string())?, 1);

    table
        .delete(&Attributes::new().with(key.as_str(), id.as_str()))
        .await
        .map_err(|e| e.to_string())?;
    assert!(frame.is_empty().await.map_err(|e| e.to_string())?);

    Ok(())
}

#[tokio::test]
async fn iterator_remove_smoke() -> Result<(), String> {
    let Some(secrets) = load_secrets()? else {
        eprintln!("secrets.json not found, skipping");
        return Ok(());
    };
    let region = create_region(&secrets);
    let key = hash_key(region.as_ref(), &secrets.table).await?;
    let table = region.table(&secrets.table);

    let batch = uuid::Uuid::new_v4().to_string();
    for i in 0..3 {
        table
            .put(
                &Attributes::new()
                    .with(key.as_str(), format!("{batch}-{i}"))
                    .with("batch", batch.as_str()),
            )
            .await
            .map_err(|e| e.to_string())?;
    }

    let frame = table.frame().where_eq("batch", AttributeValue::from(batch.as_str()));
    let cursor = frame.iterator();
    let mut removed = 0;
    while cursor.has_next().await.map_err(|e| e.to_string())? {
        cursor.next().await.map_err(|e| e.to_string())?;
        cursor.remove().await.map_err(|e| e.to_string())?;
        removed += 1;
    }

    assert_eq!(removed, 3, "Expected every record of the batch to be removed");
    assert_eq!(frame.size().await.map_err(|e| e.to_string())?, 0);

    Ok(())
}
