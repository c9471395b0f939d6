use std::sync::Arc;

use cinelist_api::{
    api::{create_router, AppState, Backends, PictureSettings},
    config::Config,
    db::{create_pool, create_redis_client, run_migrations, Cache, PostgresUserStore},
    services::{FirebaseIdentity, FirebaseStorage, TmdbCatalog},
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let config = Config::from_env()?;

    let (cache, cache_writer) = match &config.redis_url {
        Some(url) => {
            let (cache, writer) = Cache::new(create_redis_client(url)?);
            tracing::info!("Catalog cache enabled");
            (Some(cache), Some(writer))
        }
        None => {
            tracing::info!("REDIS_URL not set, catalog cache disabled");
            (None, None)
        }
    };

    let catalog = Arc::new(TmdbCatalog::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.tmdb_language.clone(),
        cache,
    ));

    let backends = build_backends(&config).await?;

    let (state, session_listener) = AppState::new(
        catalog,
        config.watch_region.clone(),
        backends,
        PictureSettings {
            default_url: config.default_profile_picture_url.clone(),
            max_bytes: config.max_profile_picture_bytes,
        },
    );

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, offline = config.offline, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    session_listener.shutdown().await;
    if let Some(writer) = cache_writer {
        writer.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn build_backends(config: &Config) -> anyhow::Result<Backends> {
    if config.offline {
        tracing::warn!("Offline mode: identity, user and picture stores are in memory");
        return Ok(Backends::in_memory());
    }

    let firebase = config.firebase()?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    Ok(Backends {
        identity: Arc::new(FirebaseIdentity::new(
            firebase.api_key,
            config.identity_api_url.clone(),
        )),
        users: Arc::new(PostgresUserStore::new(pool)),
        blobs: Arc::new(FirebaseStorage::new(
            config.storage_api_url.clone(),
            firebase.storage_bucket,
        )),
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
