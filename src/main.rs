//! Readiness probe: pings the configured database and cache under the
//! operation timeout and exits non-zero when either is unreachable.

use std::process::ExitCode;
use std::sync::Arc;

use datakit::infrastructure::{KeyValueStore, KvCache, MemoryStore, RedisStore};
use datakit::{BaseCache, DomainError, DomainFactory, OpContext, config, db, telemetry};

async fn check_database(config: &config::Config) -> Result<(), DomainError> {
    let ctx = OpContext::with_timeout(config.operation_timeout);
    ctx.run(async {
        let conn = db::init_db(&config.database_url).await?;
        db::ping(&conn).await?;
        Ok(())
    })
    .await
}

async fn check_cache<S: KeyValueStore>(
    store: S,
    config: &config::Config,
) -> Result<(), DomainError> {
    // Health needs no entity mappings
    let cache = KvCache::new(store, Arc::new(DomainFactory::new()), "probe");
    cache
        .health(&OpContext::with_timeout(config.operation_timeout))
        .await
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    dotenvy::dotenv().ok();

    // Check for --profile CLI argument
    let args: Vec<String> = std::env::args().collect();
    let profile = args
        .iter()
        .position(|arg| arg == "--profile")
        .and_then(|pos| args.get(pos + 1));

    let config = config::Config::from_env_with_profile(profile.map(String::as_str));
    telemetry::init_tracing(&config.log_level);
    tracing::info!("Probing profile '{}'", config.profile);

    let mut healthy = true;

    match check_database(&config).await {
        Ok(()) => tracing::info!("Database reachable"),
        Err(e) => {
            tracing::error!("Database check failed: {}", e);
            healthy = false;
        }
    }

    let cache_result = match &config.cache_url {
        Some(url) => {
            let ctx = OpContext::with_timeout(config.operation_timeout);
            match ctx.run(RedisStore::connect(url)).await {
                Ok(store) => check_cache(store, &config).await,
                Err(e) => Err(e),
            }
        }
        None => check_cache(MemoryStore::new(), &config).await,
    };
    match cache_result {
        Ok(()) => tracing::info!("Cache reachable"),
        Err(e) => {
            tracing::error!("Cache check failed: {}", e);
            healthy = false;
        }
    }

    if healthy {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
