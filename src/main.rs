//! Cagrag entrypoint: answers one question per stdin line, one JSON response per stdout line.

use std::sync::Arc;

use anyhow::Context;
use mimalloc::MiMalloc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;

use cagrag::cache::{SemanticCache, SemanticCacheConfig};
use cagrag::chain::{CacheChain, ChainConfig};
use cagrag::config::Config;
use cagrag::embedding::{EmbeddingProvider, OllamaEmbedder, OllamaEmbedderConfig, StubEmbedder};
use cagrag::generation::{GenaiGenerator, Generator};
use cagrag::ingest::{DocumentIngestor, QuestionPattern};
use cagrag::retrieval::{ElasticsearchConfig, ElasticsearchRetriever, RetrievalFallback};
use cagrag::vectordb::QdrantClient;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let qdrant = QdrantClient::new(&config.qdrant_url)?;
    if std::env::args().any(|arg| arg == "--health-check") {
        let code = match qdrant.health_check().await {
            Ok(()) => 0,
            Err(e) => {
                tracing::error!(error = %e, "Health check failed");
                1
            }
        };
        std::process::exit(code);
    }

    tracing::info!(
        qdrant_url = %config.qdrant_url,
        collection = %config.cache_collection,
        threshold = config.similarity_threshold,
        "Cagrag starting"
    );

    let embedder: Arc<dyn EmbeddingProvider> = match &config.embedding_url {
        Some(url) => Arc::new(OllamaEmbedder::new(OllamaEmbedderConfig::new(
            url.clone(),
            config.embedding_model.clone(),
        ))?),
        None => {
            tracing::warn!("No CAGRAG_EMBEDDING_URL configured, running embedder in stub mode");
            Arc::new(StubEmbedder::default())
        }
    };

    let mut cache = SemanticCache::open(
        qdrant,
        Arc::clone(&embedder),
        SemanticCacheConfig::from_config(&config),
    )
    .await
    .context("failed to open semantic cache")?;

    if let Some(path) = &config.question_pattern_file {
        let pattern = QuestionPattern::from_file(path)?;
        tracing::info!(pattern = pattern.as_str(), "Question pattern loaded");
        cache = cache.with_ingestor(DocumentIngestor::new(pattern));
    }

    if let Some(path) = &config.precache_path {
        match cache.pre_cache_file(path).await {
            Ok(count) => tracing::info!(count, path = %path.display(), "Pre-cache complete"),
            Err(e) => tracing::warn!(error = %e, path = %path.display(), "Pre-cache failed"),
        }
    }

    let retriever: Arc<dyn RetrievalFallback> = Arc::new(ElasticsearchRetriever::new(
        ElasticsearchConfig::new(
            config.elasticsearch_url.clone(),
            config.elasticsearch_index.clone(),
        ),
        Arc::clone(&embedder),
    )?);
    let generator: Arc<dyn Generator> = Arc::new(GenaiGenerator::new(
        config.generator_model.clone(),
    ));

    let chain = CacheChain::new(
        Arc::new(cache),
        retriever,
        generator,
        ChainConfig::from_config(&config),
    )?;

    tokio::select! {
        result = serve_stdin(&chain) => result?,
        _ = signal::ctrl_c() => tracing::info!("Received Ctrl+C, shutting down"),
    }

    tracing::info!("Cagrag shutdown complete");
    Ok(())
}

async fn serve_stdin(chain: &CacheChain<QdrantClient>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let response = chain.answer(&line).await;
        let mut json = serde_json::to_vec(&response)?;
        json.push(b'\n');
        stdout.write_all(&json).await?;
        stdout.flush().await?;
    }
    Ok(())
}
