//! Error types for forum operations.

use crate::factions::Faction;
use thiserror::Error;

/// Result type alias for forum operations.
pub type Result<T> = std::result::Result<T, ForumError>;

/// Errors surfaced to request handlers. Every variant is recoverable at the
/// request boundary.
#[derive(Error, Debug)]
pub enum ForumError {
    /// The referenced user, post or comment does not exist
    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    /// Unknown interaction action, or an action the target does not support
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// Faction name outside of pro/anti (or pro/anti/neutral for comments)
    #[error("invalid faction: {0}")]
    InvalidFaction(String),

    /// The choose-once path found an existing faction for this post
    #[error("user {user_id} already chose the {existing} faction on post {post_id}")]
    AlreadyChosen {
        user_id: i32,
        post_id: i32,
        existing: Faction,
    },

    /// A faction comment was posted without membership in that faction
    #[error("user {user_id} is not in the {faction} faction on post {post_id}")]
    NotInFaction {
        user_id: i32,
        post_id: i32,
        faction: Faction,
    },

    #[error("username already taken: {0}")]
    UsernameTaken(String),

    #[error("content must not be empty")]
    EmptyContent,

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("migration error: {0}")]
    Migration(String),
}

impl ForumError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// True for errors caused by the request itself rather than storage.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::Pool(_) | Self::Migration(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(ForumError::not_found("post", 3).is_client_error());
        assert!(ForumError::EmptyContent.is_client_error());
        assert!(!ForumError::Database(diesel::result::Error::NotFound).is_client_error());
    }

    #[test]
    fn test_messages() {
        let err = ForumError::AlreadyChosen {
            user_id: 1,
            post_id: 2,
            existing: Faction::Pro,
        };
        assert_eq!(
            err.to_string(),
            "user 1 already chose the pro faction on post 2"
        );
        assert_eq!(ForumError::not_found("comment", 9).to_string(), "comment 9 not found");
    }
}
