use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use notewell_gaps::GapService;
use notewell_lambda::config::LambdaConfig;
use notewell_lambda::router;
use notewell_lambda::state::AppState;
use notewell_storage::s3::S3Store;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Structured JSON logging for CloudWatch
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = LambdaConfig::from_env()?;
    tracing::info!(bucket = %config.bucket, detection = ?config.detection, "starting notewell");

    let store = Arc::new(S3Store::from_env(config.bucket.clone()).await);
    let service = GapService::from_store(store, config.detection);

    let app = router(AppState::new(service));

    lambda_http::run(app).await.map_err(|e| eyre::eyre!(e))
}
