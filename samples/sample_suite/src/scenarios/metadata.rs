use dynamo_frames::dynamo::{Region, Transport};

use crate::config::Secrets;

pub async fn run(region: &dyn Region, secrets: &Secrets) -> Result<(), String> {
    println!("Scenario: metadata");

    let aws = region.aws().await.map_err(|e| e.to_string())?;
    let keys = aws
        .describe_keys(&secrets.table)
        .await
        .map_err(|e| e.to_string())?;
    println!("Keys of {}: {}", secrets.table, keys.join(", "));

    Ok(())
}
