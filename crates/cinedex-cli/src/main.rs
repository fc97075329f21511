mod config;

use cinedex_core::EntityType;
use cinedex_gateway::{AppState, AuthConfig, GatewayServer};
use cinedex_index::{
    create_embedding_provider, create_vector_store, EntityRepository, FileRepository,
    HybridSearchEngine, Indexer, IndexerSettings, Reconciler, ReindexScheduler, SearchResponse,
    SyncOutcome, VectorBackendKind,
};
use clap::{Parser, Subcommand};
use config::CinedexConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cinedex", about = "Cinedex: vector indexing and hybrid search for the cinema catalog")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "cinedex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the search gateway with startup reconciliation and event-driven re-indexing
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Rebuild one collection (movies, showtimes, promotions, cinemas) or `all`
    Reindex {
        target: String,
    },
    /// Compare repository and store counts and rebuild drifted collections
    Sync,
    /// Run a query against the index
    Search {
        query: String,
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
        /// Skip the vector path
        #[arg(long, conflicts_with = "vector_only")]
        keyword_only: bool,
        /// Skip the keyword path
        #[arg(long)]
        vector_only: bool,
        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },
}

struct Services {
    indexer: Arc<Indexer>,
    engine: Arc<HybridSearchEngine>,
}

fn build_services(config: &CinedexConfig) -> anyhow::Result<Services> {
    let embedder = create_embedding_provider(&config.embedding)?;
    let store = create_vector_store(&config.vector_store)?;
    let repository: Arc<dyn EntityRepository> =
        Arc::new(FileRepository::new(config.repository.path.clone()));

    info!(
        embedder = embedder.name(),
        dimension = embedder.dimension(),
        store = store.name(),
        repository = %config.repository.path.display(),
        "Services configured"
    );

    let settings = IndexerSettings::from(&config.indexer);
    let horizon = settings.showtime_horizon;
    let indexer = Arc::new(Indexer::new(
        embedder.clone(),
        store.clone(),
        repository.clone(),
        settings,
    ));
    let engine = Arc::new(
        HybridSearchEngine::new(embedder, store, repository).with_showtime_horizon(horizon),
    );

    Ok(Services { indexer, engine })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = CinedexConfig::load(&cli.config).await?;
    config.resolve_paths(&cli.config);
    let services = build_services(&config)?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            if let Err(e) = services.indexer.ensure_collections().await {
                warn!(error = %e, "Could not create collections at startup");
            }

            let _reconciliation = Reconciler::new(services.indexer.clone()).spawn();
            let scheduler =
                ReindexScheduler::start(services.indexer.clone(), config.scheduler.debounce());

            let auth = AuthConfig::new(config.server.api_keys.clone());
            if !auth.is_enabled() {
                warn!("No server.api_keys configured, administrative routes are open");
            }

            let state = AppState {
                engine: services.engine,
                indexer: services.indexer,
                scheduler,
            };
            let app = GatewayServer::build_with_auth(state, auth);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("Cinedex gateway listening on {}", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Commands::Reindex { target } => {
            if target.eq_ignore_ascii_case("all") {
                let summary = services.indexer.reindex_everything().await?;
                for entity in EntityType::ALL {
                    println!("{:<12} {}", entity.collection_name(), summary.get(entity));
                }
                println!("\nTotal: {} point(s)", summary.total());
            } else {
                let entity: EntityType = target.parse()?;
                let count = services.indexer.reset_collection(entity).await?;
                println!("{:<12} {}", entity.collection_name(), count);
            }
        }
        Commands::Sync => {
            let outcomes = Reconciler::new(services.indexer).run().await;
            for (entity, outcome) in outcomes {
                let line = match outcome {
                    SyncOutcome::InSync { count } => format!("in sync ({count})"),
                    SyncOutcome::Reset {
                        expected,
                        found,
                        indexed,
                    } => format!("reset: expected {expected}, found {found}, indexed {indexed}"),
                    SyncOutcome::Failed { error } => format!("failed: {error}"),
                };
                println!("{:<12} {}", entity.collection_name(), line);
            }
        }
        Commands::Search {
            query,
            limit,
            keyword_only,
            vector_only,
            json,
        } => {
            if config.vector_store.backend == VectorBackendKind::Memory && !keyword_only {
                // Nothing persists between runs; populate before querying.
                services.indexer.reindex_everything().await?;
            }
            let response = if keyword_only {
                services.engine.keyword_search(&query, limit).await
            } else if vector_only {
                services.engine.search(&query, limit).await?
            } else {
                services.engine.hybrid_search(&query, limit).await
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_response(&response);
            }
        }
    }

    Ok(())
}

fn print_response(response: &SearchResponse) {
    if response.is_empty() {
        println!("No results.");
        return;
    }
    for source in &response.sources {
        println!(
            "{:.3}  {:<7}  {:<10} #{:<6} {}",
            source.combined_score,
            format!("{:?}", source.source).to_lowercase(),
            source.entity_type.collection_name(),
            source.id,
            source.title
        );
    }
    if !response.context.is_empty() {
        println!("\n{}", response.context);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
