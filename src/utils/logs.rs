use console::{measure_text_width, Style};

use crate::db::User;
use crate::factions::FactionPolicy;
use crate::scoring::ScoreBreakdown;

pub const TREE_BRANCH: char = '\u{251C}';
pub const TREE_END: char = '\u{2514}';
pub const TREE_HORIZ: char = '\u{2500}';
pub const TREE_VERT: char = '\u{2502}';

const TREE_PREFIX_WIDTH: usize = 4;
const VALUE_COLUMN: usize = 25;

fn tree_branch() -> String {
    dim()
        .apply_to(format!("{}{}{} ", TREE_BRANCH, TREE_HORIZ, TREE_HORIZ))
        .to_string()
}

fn tree_end() -> String {
    dim()
        .apply_to(format!("{}{}{} ", TREE_END, TREE_HORIZ, TREE_HORIZ))
        .to_string()
}

fn tree_indent() -> String {
    dim().apply_to(format!("{}   ", TREE_VERT)).to_string()
}

pub fn dim() -> Style {
    Style::new().dim()
}

fn blue() -> Style {
    Style::new().blue()
}

fn cyan() -> Style {
    Style::new().cyan()
}

fn green() -> Style {
    Style::new().green()
}

fn red() -> Style {
    Style::new().red()
}

fn yellow() -> Style {
    Style::new().yellow()
}

fn bold() -> Style {
    Style::new().bold()
}

fn init_prefix() -> String {
    blue().apply_to("[INIT]").to_string()
}

fn db_prefix() -> String {
    cyan().apply_to("[DB]").to_string()
}

fn score_prefix() -> String {
    yellow().apply_to("[SCORE]").to_string()
}

pub fn pad_label(label: &str, depth: usize) -> String {
    let prefix_width = depth * TREE_PREFIX_WIDTH;
    let target_width = VALUE_COLUMN.saturating_sub(prefix_width);
    let current_width = measure_text_width(label);
    if current_width < target_width {
        format!("{}{}", label, " ".repeat(target_width - current_width))
    } else {
        format!("{} ", label)
    }
}

pub fn format_signed(value: f64) -> String {
    let sign = if value >= 0.0 { "+" } else { "-" };
    format!("{}{:.5}", dim().apply_to(sign), value.abs())
}

pub fn log_startup_config(database_url: &str, pool_size: u32, policy: FactionPolicy) {
    println!(
        "{} starting forum-reputation on {}...",
        init_prefix(),
        cyan().apply_to(database_url),
    );
    println!("{}{} {}", tree_branch(), pad_label("pool size", 1), bold().apply_to(pool_size));
    println!(
        "{}{} {}",
        tree_end(),
        pad_label("faction policy", 1),
        bold().apply_to(policy)
    );
}

pub fn log_db_status(message: &str) {
    println!("{} {}", db_prefix(), message);
}

pub fn log_db_ready() {
    println!("{} {}", db_prefix(), green().apply_to("ready!"));
}

pub fn log_migrations_applied(count: usize) {
    if count > 0 {
        println!(
            "{} applied {} migration(s)",
            db_prefix(),
            bold().apply_to(count)
        );
    }
}

pub fn log_db_error(context: &str, error: &str) {
    println!(
        "{} {} {}",
        db_prefix(),
        red().apply_to(context),
        dim().apply_to(error)
    );
}

pub fn log_scores_recomputed(users: usize) {
    println!(
        "{} recomputed {} user score(s)",
        score_prefix(),
        bold().apply_to(users)
    );
}

pub fn log_leaderboard(users: &[User]) {
    if users.is_empty() {
        println!("{} {}", score_prefix(), dim().apply_to("no users yet"));
        return;
    }

    println!("{} leaderboard", score_prefix());
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        let branch = if i == count - 1 {
            tree_end()
        } else {
            tree_branch()
        };
        println!(
            "{}{}{:.5}",
            branch,
            pad_label(&format!("{}. {}", i + 1, user.username), 1),
            bold().apply_to(user.score)
        );
    }
}

pub fn log_user_not_found(username: &str) {
    println!(
        "{} {} {}",
        score_prefix(),
        red().apply_to("unknown user"),
        bold().apply_to(username)
    );
}

/// Tree rendering of a user's score, in the same layout as the startup logs.
pub fn log_score_report(user: &User, breakdown: &ScoreBreakdown) {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!(
        "{} {}",
        yellow().apply_to(bold().apply_to("[SCORE REPORT]")),
        bold().apply_to(&user.username)
    ));

    lines.push(String::new());
    lines.push(format!("{}", bold().apply_to("RECEIVED")));
    lines.push(format!("{}{}", tree_branch(), pad_label("posts", 1)));
    lines.push(format!(
        "{}{}{}{}",
        tree_indent(),
        tree_branch(),
        pad_label("likes", 2),
        green().apply_to(breakdown.post_likes)
    ));
    lines.push(format!(
        "{}{}{}{}",
        tree_indent(),
        tree_end(),
        pad_label("dislikes", 2),
        red().apply_to(breakdown.post_dislikes)
    ));
    lines.push(format!("{}{}", tree_end(), pad_label("comments", 1)));
    lines.push(format!(
        "    {}{}{}",
        tree_branch(),
        pad_label("likes", 2),
        green().apply_to(breakdown.comment_likes)
    ));
    lines.push(format!(
        "    {}{}{}",
        tree_end(),
        pad_label("dislikes", 2),
        red().apply_to(breakdown.comment_dislikes)
    ));

    lines.push(String::new());
    lines.push(format!("{}", bold().apply_to("SCORE")));
    lines.push(format!(
        "{}{}{:.5}",
        tree_branch(),
        pad_label("stored", 1),
        breakdown.previous
    ));
    lines.push(format!(
        "{}{}{}",
        tree_branch(),
        pad_label("gained", 1),
        format_signed(breakdown.gained)
    ));
    lines.push(format!(
        "{}{}{}",
        tree_branch(),
        pad_label("lost", 1),
        format_signed(-breakdown.lost)
    ));

    let total_style = if breakdown.is_floored() { yellow() } else { green() };
    let floored = if breakdown.is_floored() {
        format!(" {}", dim().apply_to("(floor)"))
    } else {
        String::new()
    };
    lines.push(format!(
        "{}{}{}{}",
        tree_end(),
        pad_label("recomputed", 1),
        total_style.apply_to(format!("{:.5}", breakdown.score)),
        floored
    ));

    println!("{}\n", lines.join("\n"));
}
