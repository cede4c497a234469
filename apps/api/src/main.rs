mod config;
mod db;
mod embeddings;
mod errors;
mod llm_client;
mod loaders;
mod puzzle;
mod ranking;
mod retrieval;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::embeddings::{Embedder, HttpEmbedder};
use crate::llm_client::LlmClient;
use crate::loaders::load_jd_from_file;
use crate::puzzle::{LlmPuzzleStages, PuzzleOrchestrator, PuzzleStages};
use crate::ranking::{LlmResumeChains, RankingOrchestrator, ResumeChains, ScoringEngine};
use crate::retrieval::{PgResumeStore, ResumeIndex, ResumeStore, COLLECTION_NAME};
use crate::routes::build_router;
use crate::state::AppState;

const EMBEDDING_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(
    name = "pipelines",
    version,
    about = "Puzzle solver and resume ranking pipelines"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Solve the puzzle in a text file
    Solve {
        #[arg(long)]
        file: PathBuf,
        /// Overrides MAX_RETRIES
        #[arg(long)]
        max_retries: Option<u32>,
    },
    /// Ingest every PDF/DOCX resume in a folder
    Ingest {
        /// Defaults to RESUME_FOLDER
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Rank stored resumes against a job description (ingests first if the store is empty)
    Rank {
        #[arg(long)]
        jd_file: PathBuf,
        /// Defaults to RESUME_FOLDER
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long)]
        top_k_stage1: Option<usize>,
        #[arg(long)]
        top_k_final: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars or bad weights)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting pipelines v{}", env!("CARGO_PKG_VERSION"));

    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_model.clone())?;
    info!("LLM client initialized (model: {})", llm.model());

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, llm).await,
        Command::Solve { file, max_retries } => solve(&config, llm, &file, max_retries).await,
        Command::Ingest { dir } => {
            let index = build_resume_index(&config, build_embedder(&config)?).await?;
            let folder = dir.unwrap_or_else(|| PathBuf::from(&config.resume_folder));
            let summary = index.ingest_folder(&folder).await?;
            print_json(&summary)
        }
        Command::Rank {
            jd_file,
            dir,
            top_k_stage1,
            top_k_final,
        } => {
            let folder = dir.unwrap_or_else(|| PathBuf::from(&config.resume_folder));
            rank(
                &config,
                llm,
                &jd_file,
                &folder,
                top_k_stage1.unwrap_or(config.top_k_stage1),
                top_k_final.unwrap_or(config.top_k_final),
            )
            .await
        }
    }
}

async fn serve(config: Config, llm: LlmClient) -> Result<()> {
    let embedder = build_embedder(&config)?;
    let resume_index = Arc::new(build_resume_index(&config, embedder.clone()).await?);

    let puzzle_stages: Arc<dyn PuzzleStages> =
        Arc::new(LlmPuzzleStages::new(llm.clone(), config.temperature));
    let resume_chains: Arc<dyn ResumeChains> = Arc::new(LlmResumeChains::new(llm));

    let state = AppState {
        scoring: build_scoring(&config),
        config: config.clone(),
        puzzle_stages,
        resume_chains,
        embedder,
        resume_index,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn solve(
    config: &Config,
    llm: LlmClient,
    file: &Path,
    max_retries: Option<u32>,
) -> Result<()> {
    let puzzle = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read puzzle file {}", file.display()))?;
    let stages = LlmPuzzleStages::new(llm, config.temperature);
    let orchestrator = PuzzleOrchestrator::new(
        &stages,
        max_retries.unwrap_or(config.max_retries),
        config.stage_failure_policy,
    );

    let result = orchestrator.solve(puzzle.trim()).await?;
    print_json(&result)
}

async fn rank(
    config: &Config,
    llm: LlmClient,
    jd_file: &Path,
    folder: &Path,
    top_k_stage1: usize,
    top_k_final: usize,
) -> Result<()> {
    let jd_text = load_jd_from_file(jd_file)
        .with_context(|| format!("failed to read JD file {}", jd_file.display()))?;

    let embedder = build_embedder(config)?;
    let index = build_resume_index(config, embedder.clone()).await?;

    let existing = index.count().await?;
    if existing == 0 {
        info!("No resumes in store; ingesting from {}", folder.display());
        let summary = index.ingest_folder(folder).await?;
        info!("Ingested {} resumes", summary.ingested);
    } else {
        info!("Found {existing} resumes already vectorized");
    }

    let chains = LlmResumeChains::new(llm);
    let scoring = build_scoring(config);
    let orchestrator = RankingOrchestrator::new(&chains, embedder.as_ref(), &index, &scoring);

    let response = orchestrator
        .rank(jd_text.trim(), top_k_stage1, top_k_final)
        .await?;
    print_json(&response)
}

fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let embedder = HttpEmbedder::new(
        &config.embedding_url,
        config.embedding_api_key.clone(),
        config.embedding_model.clone(),
        EMBEDDING_TIMEOUT,
    )?;
    info!(
        "Embedding client initialized ({} at {})",
        config.embedding_model, config.embedding_url
    );
    Ok(Arc::new(embedder))
}

/// Connects the Postgres store, sized to the embedder's output, and wraps it in an index.
async fn build_resume_index(config: &Config, embedder: Arc<dyn Embedder>) -> Result<ResumeIndex> {
    let pool = create_pool(config.database_url()?).await?;
    let store = PgResumeStore::new(pool, COLLECTION_NAME, embedder.dimensions());
    store.ensure_collection().await?;
    Ok(ResumeIndex::new(embedder, Arc::new(store)))
}

fn build_scoring(config: &Config) -> ScoringEngine {
    let scoring = ScoringEngine::new(config.scoring_weights);
    info!("Scoring weights: {:?}", scoring.weights());
    scoring
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
