use std::sync::Arc;

use tracing::{error, info, warn};

use postbox::clock::SystemClock;
use postbox::db::{Database, SqliteKvStore};
use postbox::web::WebServer;
use postbox::{build_state, moderation, Config};

#[tokio::main]
async fn main() {
    // Load configuration
    let (config, load_error) = match Config::load_with_env("config.toml") {
        Ok(config) => (config, None),
        Err(e) => {
            let mut config = Config::default();
            config.apply_env_overrides();
            (config, Some(e))
        }
    };

    // Initialize logging
    if let Err(e) = postbox::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        postbox::logging::init_console_only(&config.logging.level);
    }

    if let Some(e) = load_error {
        warn!("Failed to load config.toml ({e}), using default configuration");
    }

    if let Err(e) = run(config).await {
        error!("Fatal: {e}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> postbox::Result<()> {
    config.validate()?;

    info!("Post Box starting");
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    let db = Database::open(&config.database.path).await?;
    let kv = Arc::new(SqliteKvStore::new(db.pool().clone()));
    let moderator = moderation::from_config(&config.moderation)?;

    let state = build_state(&config, kv, moderator, Arc::new(SystemClock)).await?;
    info!(
        "Loaded {} users and {} letters",
        state.office.identities().count().await,
        state.office.letters().len().await
    );

    WebServer::new(&config.server, state)?.run().await
}
