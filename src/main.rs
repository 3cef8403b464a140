use std::{process, sync::Arc};

use invito::{
    application::{
        error::AppError,
        invite::InviteCache,
        kv::KvStore,
        rate_limit::RateLimiter,
        repos::{RsvpsRepo, SectionsRepo, TenantsRepo},
        rsvp::RsvpService,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AppState},
        kv::{MemoryKvStore, RedisKvStore},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let kv = init_kv_store(&settings).await?;

    let tenants: Arc<dyn TenantsRepo> = repositories.clone();
    let sections: Arc<dyn SectionsRepo> = repositories.clone();
    let rsvps_repo: Arc<dyn RsvpsRepo> = repositories.clone();

    let invites = Arc::new(InviteCache::new(
        kv.clone(),
        tenants.clone(),
        sections,
        settings.cache.namespace.clone(),
        settings.cache.ttl,
    ));
    let limiter = Arc::new(RateLimiter::new(
        kv,
        settings.rate_limit.namespace.clone(),
    ));
    let rsvps = Arc::new(RsvpService::new(
        limiter,
        tenants,
        rsvps_repo,
        settings.rate_limit.max_attempts.get(),
        settings.rate_limit.window,
    ));

    let state = AppState {
        invites,
        rsvps,
        db: repositories,
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "invito::serve",
        addr = %settings.server.public_addr,
        "Serving public endpoints"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn init_kv_store(settings: &config::Settings) -> Result<Arc<dyn KvStore>, AppError> {
    match settings.kv.url.as_ref() {
        Some(url) => {
            let store = RedisKvStore::connect(url).await.map_err(AppError::from)?;
            Ok(Arc::new(store))
        }
        None => {
            // Single-replica fallback: cached views and rate-limit buckets
            // die with the process and are not shared across replicas.
            warn!(
                target = "invito::serve",
                "No key-value store configured; using the in-process store"
            );
            Ok(Arc::new(MemoryKvStore::new()))
        }
    }
}
