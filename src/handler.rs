use crate::comments::{self, FactionThreads};
use crate::db::{self, Comment, DbPool, Post, User};
use crate::error::Result;
use crate::factions::{self, Faction, FactionOutcome, Side};
use crate::interactions::{self, Action, InteractionOutcome};
use crate::scoring;
use crate::settings::{settings, Database};
use serde::Serialize;

/// Everything a post page shows.
#[derive(Debug, Clone, Serialize)]
pub struct PostPage {
    pub post: Post,
    pub threads: FactionThreads,
    pub viewer_faction: Option<Faction>,
}

/// Entry point for request handlers. Raw action and faction names from the
/// request are parsed here; each call checks out one pooled connection.
#[derive(Clone)]
pub struct ForumHandler {
    pool: DbPool,
}

impl ForumHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn open(config: &Database) -> Result<Self> {
        Ok(Self::new(db::establish_pool(config)?))
    }

    pub fn migrate(&self) -> Result<usize> {
        let mut conn = self.pool.get()?;
        db::run_migrations(&mut conn)
    }

    pub fn apply_post_interaction(
        &self,
        actor_id: i32,
        post_id: i32,
        action: &str,
    ) -> Result<InteractionOutcome> {
        let action: Action = action.parse()?;
        let mut conn = self.pool.get()?;
        interactions::apply_post_interaction(&mut conn, actor_id, post_id, action)
    }

    pub fn apply_comment_interaction(
        &self,
        actor_id: i32,
        comment_id: i32,
        action: &str,
    ) -> Result<InteractionOutcome> {
        let action: Action = action.parse()?;
        let mut conn = self.pool.get()?;
        interactions::apply_comment_interaction(&mut conn, actor_id, comment_id, action)
    }

    pub fn set_faction(&self, actor_id: i32, post_id: i32, faction: &str) -> Result<FactionOutcome> {
        let faction: Faction = faction.parse()?;
        let mut conn = self.pool.get()?;
        factions::set_faction(&mut conn, actor_id, post_id, faction)
    }

    pub fn recompute_score(&self, user_id: i32) -> Result<f64> {
        let mut conn = self.pool.get()?;
        scoring::recompute_score(&mut conn, user_id)
    }

    pub fn recompute_all_scores(&self) -> Result<usize> {
        let mut conn = self.pool.get()?;
        scoring::recompute_all_scores(&mut conn)
    }

    pub fn create_user(&self, username: &str) -> Result<User> {
        let mut conn = self.pool.get()?;
        db::create_user(&mut conn, username)
    }

    pub fn create_post(&self, author_id: i32, title: &str, content: &str) -> Result<Post> {
        let mut conn = self.pool.get()?;
        db::create_post(&mut conn, author_id, title, content)
    }

    pub fn create_comment(
        &self,
        author_id: i32,
        post_id: i32,
        content: &str,
        side: &str,
    ) -> Result<Comment> {
        let side: Side = side.parse()?;
        let mut conn = self.pool.get()?;
        comments::create_comment(&mut conn, author_id, post_id, content, side)
    }

    /// Counts the view and loads the post with its comment threads.
    pub fn view_post(&self, post_id: i32, viewer_id: Option<i32>) -> Result<PostPage> {
        let mut conn = self.pool.get()?;
        db::record_view(&mut conn, post_id)?;
        let post = db::find_post(&mut conn, post_id)?;
        let threads = comments::comments_by_faction(&mut conn, post_id)?;
        let viewer_faction = match viewer_id {
            Some(id) => factions::faction_of(&mut conn, id, post_id)?,
            None => None,
        };
        Ok(PostPage {
            post,
            threads,
            viewer_faction,
        })
    }

    pub fn hot_posts(&self, limit: Option<i64>) -> Result<Vec<Post>> {
        let feed = &settings().feed;
        let mut conn = self.pool.get()?;
        db::hot_posts(
            &mut conn,
            feed.hot_view_weight,
            feed.hot_like_weight,
            limit.unwrap_or(feed.default_limit),
        )
    }

    pub fn leaderboard(&self, limit: Option<i64>) -> Result<Vec<User>> {
        let mut conn = self.pool.get()?;
        db::leaderboard(&mut conn, limit.unwrap_or(settings().leaderboard.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForumError;

    fn memory_handler() -> ForumHandler {
        let handler = ForumHandler::open(&Database {
            url: ":memory:".to_string(),
            pool_size: 1,
            busy_timeout_ms: 100,
        })
        .expect("pool should open");
        handler.migrate().expect("migrations should apply");
        handler
    }

    #[test]
    fn test_request_names_are_validated() {
        let handler = memory_handler();
        let alice = handler.create_user("alice").unwrap();
        let post = handler.create_post(alice.id, "title", "body").unwrap();

        assert!(matches!(
            handler.apply_post_interaction(alice.id, post.id, "join_faction"),
            Err(ForumError::InvalidAction(_))
        ));
        assert!(matches!(
            handler.apply_comment_interaction(alice.id, 1, "favorite"),
            Err(ForumError::InvalidAction(_))
        ));
        assert!(matches!(
            handler.set_faction(alice.id, post.id, "neutral"),
            Err(ForumError::InvalidFaction(_))
        ));
        assert!(matches!(
            handler.create_comment(alice.id, post.id, "hi", "centre"),
            Err(ForumError::InvalidFaction(_))
        ));
    }

    #[test]
    fn test_debate_flow() {
        let handler = memory_handler();
        let alice = handler.create_user("alice").unwrap();
        let bob = handler.create_user("bob").unwrap();
        let post = handler.create_post(alice.id, "Pineapple on pizza", "Yes or no").unwrap();

        let err = handler
            .create_comment(bob.id, post.id, "obviously yes", "pro")
            .unwrap_err();
        assert!(matches!(err, ForumError::NotInFaction { .. }));

        assert!(handler.set_faction(bob.id, post.id, "pro").unwrap().active);
        let comment = handler
            .create_comment(bob.id, post.id, "obviously yes", "pro")
            .unwrap();

        let liked = handler
            .apply_comment_interaction(alice.id, comment.id, "like")
            .unwrap();
        assert!(liked.active);
        assert_eq!(liked.count, 1);
        assert!(liked.author_score.unwrap() > 1.0);

        let page = handler.view_post(post.id, Some(bob.id)).unwrap();
        assert_eq!(page.post.view_count, 1);
        assert_eq!(page.threads.pro.len(), 1);
        assert_eq!(page.viewer_faction, Some(Faction::Pro));

        let board = handler.leaderboard(None).unwrap();
        assert_eq!(board[0].id, bob.id);
    }

    #[test]
    fn test_outcome_serializes_for_clients() {
        let handler = memory_handler();
        let alice = handler.create_user("alice").unwrap();
        let bob = handler.create_user("bob").unwrap();
        let post = handler.create_post(alice.id, "title", "body").unwrap();

        let outcome = handler
            .apply_post_interaction(bob.id, post.id, "favorite")
            .unwrap();
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "action": "favorite", "active": true, "count": 1 })
        );
    }
}
