use std::sync::Arc;

use league_of_gains::commands::Cooldowns;
use league_of_gains::config::{self, Config};
use league_of_gains::db::{SharedDatabase, Store};
use league_of_gains::error::AppError;
use league_of_gains::logging;
use league_of_gains::notifier::DiscordMessenger;
use league_of_gains::poller::{InFlightChecks, scheduler};
use league_of_gains::riot::{ClientOptions, RateLimiter, RetryPolicy, RiotClient};
use league_of_gains::tasks::{TaskContext, TaskSubmitter, WorkerPool};
use serenity::http::Http;
use tracing::{error, info, warn};

fn main() {
    if let Err(e) = run() {
        error!("🚨 Fatal error: {e}");
        eprintln!("Fatal error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;
    logging::init(&config.log)?;

    info!("🏋️ Starting League of Gains...");

    let db = SharedDatabase::open(&config.database_path)?;
    if let Some(path) = &config.exercises_file {
        match config::load_exercises(path) {
            Ok(exercises) => db.seed_exercises(&exercises)?,
            Err(e) => warn!(path = %path.display(), "🗄️ ⚠️ Exercise catalogue not loaded: {e}"),
        }
    }

    let limiter = Arc::new(RateLimiter::new(
        config.riot_rate_limit_tokens,
        config.riot_rate_limit_window,
    ));
    // The blocking client must be built outside of the async runtime.
    let riot = RiotClient::new(
        config.riot_api_key.clone(),
        limiter,
        ClientOptions {
            request_timeout: config.riot_request_timeout,
            retry: RetryPolicy::default(),
            base_url: None,
        },
    )?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("discord-io")
        .build()?;
    let http = Arc::new(Http::new(&config.discord_token));
    let messenger = DiscordMessenger::new(http, runtime.handle().clone());

    let submitter = TaskSubmitter::new();
    let ctx = Arc::new(TaskContext {
        store: Arc::new(db),
        api: Arc::new(riot),
        messenger: Arc::new(messenger),
        submitter: submitter.clone(),
        cooldowns: Cooldowns::default(),
        in_flight: InFlightChecks::default(),
        match_history_depth: config.match_history_depth,
    });
    let pool = WorkerPool::start(&submitter, config.worker_threads, ctx)?;

    runtime.block_on(async {
        let poller = tokio::spawn(scheduler::run(submitter.clone(), config.poll_interval));

        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("🛑 Shutdown requested"),
            Err(e) => error!("🛑 Could not listen for shutdown signal: {e}"),
        }
        poller.abort();
    });

    pool.shutdown();
    info!("👋 League of Gains stopped");

    Ok(())
}
