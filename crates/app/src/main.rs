mod server;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use server::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tfidf_recommender_core::{
    AnyGateway, ConfiguredVectorizer, CorpusTfIdf, DocumentKind, EntityId, HttpGateway,
    MemoryGateway, MismatchPolicy, RecommendationOptions, RecommendationsRequest, Recommender,
    TfIdfOptions, VectorizeJobRequest, VectorizeProblemRequest, VectorizeUserRequest,
    VectorizerMode, Vectorizer,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "tfidf-recommender", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Vectorizer mode: per-document (fresh model per call) or corpus
    #[arg(long, env = "RECOMMENDER_VECTORIZER_MODE", default_value = "per-document")]
    vectorizer_mode: VectorizerMode,

    /// Corpus file for corpus mode (JSON array of strings or one document per line)
    #[arg(long, env = "RECOMMENDER_CORPUS_FILE")]
    corpus_file: Option<PathBuf>,

    /// Vector store backend
    #[arg(long, env = "RECOMMENDER_GATEWAY", value_enum, default_value_t = GatewayBackend::Memory)]
    gateway: GatewayBackend,

    /// Base URL of the REST vector store (http backend)
    #[arg(long, env = "RECOMMENDER_GATEWAY_URL", default_value = "http://localhost:8081")]
    gateway_url: String,

    /// Per-request timeout for the REST vector store, in seconds
    #[arg(long, env = "RECOMMENDER_GATEWAY_TIMEOUT_SECS", default_value = "30")]
    gateway_timeout_secs: u64,

    /// JSON snapshot file for the memory backend
    #[arg(long, env = "RECOMMENDER_STORE_FILE")]
    store_file: Option<PathBuf>,

    /// Number of recommendations returned per list
    #[arg(long, env = "RECOMMENDER_TOP_K", default_value = "10")]
    top_k: usize,

    /// What to do with candidates whose length differs from the user vector: fail or skip
    #[arg(long, env = "RECOMMENDER_ON_DIMENSION_MISMATCH", default_value = "fail")]
    on_dimension_mismatch: MismatchPolicy,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GatewayBackend {
    Memory,
    Http,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Serve {
        /// Address to listen on
        #[arg(long, env = "RECOMMENDER_BIND", default_value = "0.0.0.0:5000")]
        bind: String,
        /// Store every computed vector through the gateway.
        #[arg(long, env = "RECOMMENDER_PERSIST_VECTORS", default_value_t = false)]
        persist_vectors: bool,
        /// Allow cross-origin requests from any origin.
        #[arg(long, env = "RECOMMENDER_CORS", default_value_t = false)]
        cors: bool,
    },
    /// Vectorize a user profile (bio + profession) and print it as JSON.
    VectorizeUser {
        #[arg(long)]
        user_id: EntityId,
        #[arg(long)]
        bio: String,
        #[arg(long)]
        profession: String,
        /// Also store the vector through the gateway.
        #[arg(long, default_value_t = false)]
        store: bool,
    },
    /// Vectorize a job (title + description) and print it as JSON.
    VectorizeJob {
        #[arg(long)]
        id: EntityId,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value_t = false)]
        store: bool,
    },
    /// Vectorize a problem (name + description) and print it as JSON.
    VectorizeProblem {
        #[arg(long)]
        id: EntityId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value_t = false)]
        store: bool,
    },
    /// Rank stored jobs and problems for a user and print them as JSON.
    Recommend {
        #[arg(long)]
        user_id: EntityId,
    },
}

fn build_vectorizer(cli: &Cli) -> anyhow::Result<ConfiguredVectorizer> {
    match cli.vectorizer_mode {
        VectorizerMode::PerDocument => {
            warn!("per-document vectorizer: vectors from different documents do not share a vocabulary");
            Ok(ConfiguredVectorizer::per_document()?)
        }
        VectorizerMode::Corpus => {
            let path = cli
                .corpus_file
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("--corpus-file is required in corpus mode"))?;
            let model = CorpusTfIdf::from_file(path, TfIdfOptions::default())?;
            info!(
                corpus = %path.display(),
                documents = model.document_count(),
                vocabulary = model.vocabulary_len(),
                "corpus vectorizer fitted"
            );
            Ok(ConfiguredVectorizer::corpus(model))
        }
    }
}

async fn build_gateway(cli: &Cli) -> anyhow::Result<AnyGateway> {
    let gateway = match cli.gateway {
        GatewayBackend::Memory => match &cli.store_file {
            Some(path) => AnyGateway::Memory(MemoryGateway::open(path).await?),
            None => AnyGateway::Memory(MemoryGateway::new()),
        },
        GatewayBackend::Http => AnyGateway::Http(HttpGateway::with_timeout(
            &cli.gateway_url,
            Duration::from_secs(cli.gateway_timeout_secs),
        )?),
    };
    Ok(gateway)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let vectorizer = build_vectorizer(&cli)?;
    let gateway = build_gateway(&cli).await?;
    let options = RecommendationOptions {
        top_k: cli.top_k,
        on_dimension_mismatch: cli.on_dimension_mismatch,
    };
    let recommender = Recommender::new(gateway, vectorizer, options);

    info!(
        version = app_version,
        mode = %recommender.vectorizer().mode(),
        started_at = %Utc::now().to_rfc3339(),
        "tfidf-recommender boot"
    );

    match cli.command {
        Command::Serve {
            bind,
            persist_vectors,
            cors,
        } => {
            let state = Arc::new(AppState {
                recommender,
                persist_vectors,
            });
            server::serve(state, &bind, cors).await?;
        }
        Command::VectorizeUser {
            user_id,
            bio,
            profession,
            store,
        } => {
            let result = recommender.vectorize_user(&VectorizeUserRequest {
                user_id: Some(user_id),
                bio: Some(bio),
                profession: Some(profession),
            })?;
            if store {
                recommender
                    .store(DocumentKind::User, &result.user_id, &result.vector)
                    .await?;
            }
            print_json(&result)?;
        }
        Command::VectorizeJob {
            id,
            title,
            description,
            store,
        } => {
            let result = recommender.vectorize_job(&VectorizeJobRequest {
                id: Some(id),
                name: Some(title),
                description: Some(description),
            })?;
            if store {
                recommender
                    .store(DocumentKind::Job, &result.id, &result.vector)
                    .await?;
            }
            print_json(&result)?;
        }
        Command::VectorizeProblem {
            id,
            name,
            description,
            store,
        } => {
            let result = recommender.vectorize_problem(&VectorizeProblemRequest {
                id: Some(id),
                name: Some(name),
                description: Some(description),
            })?;
            if store {
                recommender
                    .store(DocumentKind::Problem, &result.id, &result.vector)
                    .await?;
            }
            print_json(&result)?;
        }
        Command::Recommend { user_id } => {
            let result = recommender
                .recommendations(&RecommendationsRequest {
                    user_id: Some(user_id),
                })
                .await?;
            print_json(&result)?;
        }
    }

    Ok(())
}
