use std::sync::Arc;

use dynamo_frames::dynamo::{AttributeValue, Attributes, Region, ScanValve, Transport};

use crate::config::Secrets;

pub async fn run(region: &dyn Region, secrets: &Secrets) -> Result<(), String> {
    println!("Scenario: frames");

    let aws = region.aws().await.map_err(|e| e.to_string())?;
    let keys = aws
        .describe_keys(&secrets.table)
        .await
        .map_err(|e| e.to_string())?;
    let key = keys
        .first()
        .ok_or_else(|| format!("Table {} has no keys", secrets.table))?;

    let table = region.table(&secrets.table);
    for i in 0..5 {
        table
            .put(
                &Attributes::new()
                    .with(key.as_str(), format!("sample-{i}"))
                    .with("kind", "sample"),
            )
            .await
            .map_err(|e| e.to_string())?;
    }

    let frame = table
        .frame()
        .where_eq("kind", AttributeValue::from("sample"))
        .through(Arc::new(ScanValve::new().with_limit(2)));
    println!("Frame holds {} record(s)", frame.size().await.map_err(|e| e.to_string())?);

    let cursor = frame.iterator();
    while cursor.has_next().await.map_err(|e| e.to_string())? {
        let item = cursor.next().await.map_err(|e| e.to_string())?;
        println!("Removing {}", item.attributes());
        cursor.remove().await.map_err(|e| e.to_string())?;
    }
    println!(
        "Frame is empty after removal: {}",
        frame.is_empty().await.map_err(|e| e.to_string())?
    );

    Ok(())
}
