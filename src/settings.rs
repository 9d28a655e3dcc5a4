use crate::factions::FactionPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

static SETTINGS: OnceLock<Settings> = OnceLock::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: Database,
    pub reputation: Reputation,
    pub factions: Factions,
    pub feed: Feed,
    pub leaderboard: Leaderboard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub url: String,
    pub pool_size: u32,
    pub busy_timeout_ms: u32,
}

/// Constants of the reputation formula. A vote is worth
/// `max(voter, floor) / (base * (1 + max(author, floor) / damping))`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reputation {
    pub floor: f64,
    pub post: VoteWeights,
    pub comment: VoteWeights,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoteWeights {
    pub base: f64,
    pub like_damping: f64,
    pub dislike_damping: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Factions {
    pub policy: FactionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub hot_view_weight: f64,
    pub hot_like_weight: f64,
    pub default_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaderboard {
    pub size: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: Database {
                url: "forum.db".to_string(),
                pool_size: 5,
                busy_timeout_ms: 2000,
            },
            reputation: Reputation::default(),
            factions: Factions {
                policy: FactionPolicy::ChooseOnce,
            },
            feed: Feed {
                hot_view_weight: 0.6,
                hot_like_weight: 0.4,
                default_limit: 20,
            },
            leaderboard: Leaderboard { size: 10 },
        }
    }
}

impl Default for Reputation {
    fn default() -> Self {
        Self {
            floor: 1.0,
            post: VoteWeights {
                base: 500.0,
                like_damping: 10.0,
                dislike_damping: 20.0,
            },
            comment: VoteWeights {
                base: 100.0,
                like_damping: 5.0,
                dislike_damping: 10.0,
            },
        }
    }
}

impl Settings {
    pub fn load() -> &'static Settings {
        SETTINGS.get_or_init(Self::load_from_files)
    }

    fn load_from_files() -> Settings {
        let default_path = Path::new("settings.default.ron");
        let override_path = Path::new("settings.ron");

        let mut settings = if default_path.exists() {
            fs::read_to_string(default_path)
                .ok()
                .and_then(|content| ron::from_str(&content).ok())
                .unwrap_or_default()
        } else {
            Settings::default()
        };

        if override_path.exists() {
            if let Ok(content) = fs::read_to_string(override_path) {
                match ron::from_str::<Settings>(&content) {
                    Ok(overrides) => settings = overrides,
                    Err(e) => tracing::warn!("ignoring settings.ron: {e}"),
                }
            }
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            settings.database.url = url;
        }

        settings
    }
}

pub fn settings() -> &'static Settings {
    Settings::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_roundtrip_through_ron() {
        let defaults = Settings::default();
        let text = ron::to_string(&defaults).expect("serialize");
        let parsed: Settings = ron::from_str(&text).expect("parse");
        assert_eq!(parsed.reputation.post.base, 500.0);
        assert_eq!(parsed.reputation.comment.like_damping, 5.0);
        assert_eq!(parsed.factions.policy, FactionPolicy::ChooseOnce);
    }

    #[test]
    fn test_shipped_defaults_parse() {
        let content = include_str!("../settings.default.ron");
        let parsed: Settings = ron::from_str(content).expect("settings.default.ron must parse");
        let defaults = Settings::default();
        assert_eq!(parsed.reputation.floor, defaults.reputation.floor);
        assert_eq!(parsed.reputation.post.dislike_damping, 20.0);
        assert_eq!(parsed.reputation.comment.dislike_damping, 10.0);
        assert_eq!(parsed.feed.default_limit, defaults.feed.default_limit);
    }
}
