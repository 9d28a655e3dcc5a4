use diesel::{Connection, SqliteConnection};
use forum_reputation::db::{configure_connection, find_user_by_name, run_migrations};
use forum_reputation::scoring::{preview_user, recompute_score, ScoreBreakdown};
use forum_reputation::settings::settings;
use forum_reputation::utils::{log_db_error, log_score_report, log_user_not_found};
use forum_reputation::ForumError;
use serde::Serialize;
use std::env;
use std::process;

fn print_usage() {
    eprintln!("Usage: user-score <username> [--json] [--save]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <username>  User whose reputation to recompute");
    eprintln!("  --json      Print the breakdown as JSON");
    eprintln!("  --save      Store the recomputed score (default is a dry run)");
}

#[derive(Serialize)]
struct Report<'a> {
    username: &'a str,
    #[serde(flatten)]
    breakdown: &'a ScoreBreakdown,
    saved: bool,
}

fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    let as_json = args.iter().any(|a| a == "--json");
    let save = args.iter().any(|a| a == "--save");
    let Some(username) = args.iter().find(|a| !a.starts_with("--")) else {
        print_usage();
        process::exit(1);
    };

    let s = settings();
    let mut conn = match SqliteConnection::establish(&s.database.url) {
        Ok(conn) => conn,
        Err(e) => {
            log_db_error("failed to open database:", &e.to_string());
            process::exit(1);
        }
    };
    if let Err(e) = configure_connection(&mut conn, s.database.busy_timeout_ms) {
        log_db_error("failed to configure connection:", &e.to_string());
        process::exit(1);
    }
    if let Err(e) = run_migrations(&mut conn) {
        log_db_error("migration failed:", &e.to_string());
        process::exit(1);
    }

    let user = match find_user_by_name(&mut conn, username) {
        Ok(user) => user,
        Err(ForumError::NotFound { .. }) => {
            log_user_not_found(username);
            process::exit(1);
        }
        Err(e) => {
            log_db_error("lookup failed:", &e.to_string());
            process::exit(1);
        }
    };

    let breakdown = match preview_user(&mut conn, user.id) {
        Ok(breakdown) => breakdown,
        Err(e) => {
            log_db_error("recompute failed:", &e.to_string());
            process::exit(1);
        }
    };

    if save {
        if let Err(e) = recompute_score(&mut conn, user.id) {
            log_db_error("save failed:", &e.to_string());
            process::exit(1);
        }
    }

    if as_json {
        let report = Report {
            username: &user.username,
            breakdown: &breakdown,
            saved: save,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        log_score_report(&user, &breakdown);
    }
}
