use anyhow::Result;
use forum_reputation::settings::settings;
use forum_reputation::utils::{
    log_db_error, log_db_ready, log_db_status, log_leaderboard, log_migrations_applied,
    log_scores_recomputed, log_startup_config,
};
use forum_reputation::ForumHandler;
use tracing::subscriber::set_global_default;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("forum_reputation=info".parse()?))
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        );
    set_global_default(subscriber)?;

    let s = settings();
    log_startup_config(&s.database.url, s.database.pool_size, s.factions.policy);

    log_db_status("Initializing SQLite connection pool...");
    let handler = ForumHandler::open(&s.database)?;

    let applied = match handler.migrate() {
        Ok(applied) => applied,
        Err(e) => {
            log_db_error("migration failed:", &e.to_string());
            return Err(e.into());
        }
    };
    log_migrations_applied(applied);
    log_db_ready();

    let recomputed = handler.recompute_all_scores()?;
    log_scores_recomputed(recomputed);

    log_leaderboard(&handler.leaderboard(None)?);

    Ok(())
}
