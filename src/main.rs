use anyhow::Context;
use memora::{
    api::{build_router, ApiLimits, AppState},
    classify::{ClassificationQueue, Classifier, InMemoryClassificationStore},
    config::Config,
    llm::{AnthropicClient, TextGenerator},
    summary::{HierarchicalSummarizer, InMemorySummaryStore, ScriptWeightedEstimator},
    telemetry,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_path = std::env::var("MEMORA_CONFIG").unwrap_or_else(|_| "config".to_string());
    let config = Config::from_file(&config_path).context("Failed to load configuration")?;

    telemetry::init_tracing(&config.logging);

    let client = AnthropicClient::new(config.llm.clone().from_env())
        .context("Failed to create text-generation client")?;
    info!("Using model {}", client.config().model);
    let generator: Arc<dyn TextGenerator> = Arc::new(client);

    let summarizer = Arc::new(HierarchicalSummarizer::new(
        generator.clone(),
        config.summary.clone(),
    )?);
    let estimator = ScriptWeightedEstimator::from_config(&config.summary.budget)?;
    let classifier = Arc::new(Classifier::new(
        generator,
        estimator,
        config.classifier.clone(),
    ));

    let store = Arc::new(InMemoryClassificationStore::new());
    let (queue, _worker) =
        ClassificationQueue::spawn(classifier.clone(), store.clone(), config.queue.clone());

    let state = AppState {
        summarizer,
        classifier,
        queue,
        store,
        summaries: Arc::new(InMemorySummaryStore::new()),
        limits: ApiLimits::from(&config.server),
    };
    let router = build_router(state, config.server.max_body_bytes);

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!("Memora listening on {}", address);
    axum::serve(listener, router).await?;

    Ok(())
}
