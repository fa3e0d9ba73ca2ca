use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use diesel::RunQueryDsl;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cortex::auth::AuthKeys;
use cortex::config::{get_config, CliArgs, Config};
use cortex::llm::OpenAiClient;
use cortex::storage::FileStore;
use cortex::{create_app, db, run_migrations, AppState};

/// Installs the tracing subscriber; the returned guard must stay alive
/// so the non-blocking file writer flushes on shutdown.
fn init_tracing(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "cortex.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables from a .env file when present
    dotenv::dotenv().ok();

    let args = CliArgs::parse();
    let config = get_config(args);
    let _log_guard = init_tracing(&config);

    // Initialize the database pool and verify connectivity before
    // accepting traffic; a dead database is a startup failure.
    let pool = Arc::new(db::init_pool(&config.database_url));
    let mut conn = match pool.get() {
        Ok(conn) => conn,
        Err(e) => {
            error!("Database connectivity check failed: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = diesel::sql_query("SELECT 1").execute(&mut conn) {
        error!("Database connectivity check failed: {}", e);
        std::process::exit(1);
    }
    run_migrations(&mut conn);
    drop(conn);

    let storage = FileStore::new(&config.upload_dir).unwrap_or_else(|e| {
        error!("Failed to prepare upload directory {}: {}", config.upload_dir, e);
        std::process::exit(1);
    });

    if config.openai_api_key.is_none() {
        info!("No model API key configured; AI endpoints will return errors");
    }

    let state = AppState {
        pool,
        llm: Arc::new(OpenAiClient::new(
            config.openai_api_key.clone(),
            config.openai_model.clone(),
        )),
        auth: Arc::new(AuthKeys::new(&config.jwt_secret)),
        storage: Arc::new(storage),
    };

    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app).await.expect("Server error");
}
