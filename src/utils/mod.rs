pub mod logs;

pub use logs::{
    log_db_error, log_db_ready, log_db_status, log_leaderboard, log_migrations_applied,
    log_score_report, log_scores_recomputed, log_startup_config, log_user_not_found,
};
