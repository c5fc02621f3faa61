mod config;
mod scenarios;

use std::sync::Arc;

use dynamo_frames::LogLevel;
use dynamo_frames::auth::{Direct, Simple};
use dynamo_frames::dynamo::{Region, region};
use dynamo_frames::retry::ReRegion;

use config::load_secrets;

#[tokio::main]
async fn main() -> Result<(), String> {
    let secrets = load_secrets()?;

    let log_level = if secrets.debug {
        LogLevel::Debug
    } else {
        LogLevel::Information
    };
    let keys = Simple::new(&secrets.key, &secrets.secret, &secrets.region).with_log_level(log_level);
    let credentials = Direct::new(keys, &secrets.endpoint);
    let region: Arc<dyn Region> = Arc::new(ReRegion::new(Arc::new(region::Simple::new(credentials))));

    scenarios::metadata::run(region.as_ref(), &secrets).await?;
    scenarios::frames::run(region.as_ref(), &secrets).await?;

    Ok(())
}
