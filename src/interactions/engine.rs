use super::machine::{self, Action, Counts, Transition};
use super::store::{
    get_or_create_comment_interaction, get_or_create_post_interaction, save_comment_interaction,
    save_post_interaction,
};
use crate::db::{find_comment, find_post, find_user};
use crate::error::{ForumError, Result};
use crate::schema::{comments, posts, users};
use crate::scoring::recompute_user;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

/// What a request handler renders after an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InteractionOutcome {
    pub action: Action,
    pub active: bool,
    pub count: i32,
    /// The target author's new score when the change was qualifying.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_score: Option<f64>,
}

impl InteractionOutcome {
    fn new(transition: &Transition, author_score: Option<f64>) -> Self {
        Self {
            action: transition.action,
            active: transition.active(),
            count: transition.count,
            author_score,
        }
    }
}

/// Like, dislike or favorite a post. Flag, counters and the author's score
/// are written in one immediate (write-locked) transaction.
pub fn apply_post_interaction(
    conn: &mut SqliteConnection,
    actor_id: i32,
    post_id: i32,
    action: Action,
) -> Result<InteractionOutcome> {
    conn.immediate_transaction(|conn| {
        find_user(conn, actor_id)?;
        let post = find_post(conn, post_id)?;

        let mut record = get_or_create_post_interaction(conn, actor_id, post_id)?;
        let mut flags = record.flags();
        let mut counts = Counts {
            likes: post.like_count,
            dislikes: post.dislike_count,
            favorites: post.favorite_count,
        };

        let transition = machine::apply(&mut flags, &mut counts, action);

        record.set_flags(flags);
        record.interacted_at = Utc::now().timestamp();
        save_post_interaction(conn, &record)?;

        diesel::update(posts::table.find(post_id))
            .set((
                posts::like_count.eq(counts.likes),
                posts::dislike_count.eq(counts.dislikes),
                posts::favorite_count.eq(counts.favorites),
            ))
            .execute(conn)?;

        let author_score = if transition.is_qualifying() {
            let delta = transition.like_delta();
            if delta != 0 {
                diesel::update(users::table.find(post.author_id))
                    .set(users::post_likes_received.eq(users::post_likes_received + delta))
                    .execute(conn)?;
            }
            Some(recompute_user(conn, post.author_id)?.score)
        } else {
            None
        };

        tracing::debug!(
            actor_id,
            post_id,
            %action,
            active = transition.active(),
            count = transition.count,
            qualifying = transition.is_qualifying(),
            "post interaction"
        );

        Ok(InteractionOutcome::new(&transition, author_score))
    })
}

/// Like or dislike a comment. Comments cannot be favorited.
pub fn apply_comment_interaction(
    conn: &mut SqliteConnection,
    actor_id: i32,
    comment_id: i32,
    action: Action,
) -> Result<InteractionOutcome> {
    if action == Action::Favorite {
        return Err(ForumError::InvalidAction(action.to_string()));
    }

    conn.immediate_transaction(|conn| {
        find_user(conn, actor_id)?;
        let comment = find_comment(conn, comment_id)?;

        let mut record = get_or_create_comment_interaction(conn, actor_id, comment_id)?;
        let mut flags = record.flags();
        let mut counts = Counts {
            likes: comment.like_count,
            dislikes: comment.dislike_count,
            favorites: 0,
        };

        let transition = machine::apply(&mut flags, &mut counts, action);

        record.set_flags(flags);
        record.interacted_at = Utc::now().timestamp();
        save_comment_interaction(conn, &record)?;

        diesel::update(comments::table.find(comment_id))
            .set((
                comments::like_count.eq(counts.likes),
                comments::dislike_count.eq(counts.dislikes),
            ))
            .execute(conn)?;

        let author_score = if transition.is_qualifying() {
            let delta = transition.like_delta();
            if delta != 0 {
                diesel::update(users::table.find(comment.author_id))
                    .set(users::comment_likes_received.eq(users::comment_likes_received + delta))
                    .execute(conn)?;
            }
            Some(recompute_user(conn, comment.author_id)?.score)
        } else {
            None
        };

        tracing::debug!(
            actor_id,
            comment_id,
            %action,
            active = transition.active(),
            count = transition.count,
            qualifying = transition.is_qualifying(),
            "comment interaction"
        );

        Ok(InteractionOutcome::new(&transition, author_score))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use crate::schema::post_interactions;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_like_twice_restores_state() {
        let mut conn = test_connection();
        let alice = seed_user(&mut conn, "alice");
        let bob = seed_user(&mut conn, "bob");
        let post = seed_post(&mut conn, alice.id);

        let liked = apply_post_interaction(&mut conn, bob.id, post.id, Action::Like).unwrap();
        assert!(liked.active);
        assert_eq!(liked.count, 1);

        let unliked = apply_post_interaction(&mut conn, bob.id, post.id, Action::Like).unwrap();
        assert!(!unliked.active);
        assert_eq!(unliked.count, 0);

        assert_eq!(find_post(&mut conn, post.id).unwrap().like_count, 0);
        let author = find_user(&mut conn, alice.id).unwrap();
        assert_eq!(author.score, 1.0);
        assert_eq!(author.post_likes_received, 0);
    }

    #[test]
    fn test_dislike_after_like_moves_counts() {
        let mut conn = test_connection();
        let alice = seed_user(&mut conn, "alice");
        let bob = seed_user(&mut conn, "bob");
        let post = seed_post(&mut conn, alice.id);

        apply_post_interaction(&mut conn, bob.id, post.id, Action::Like).unwrap();
        let outcome = apply_post_interaction(&mut conn, bob.id, post.id, Action::Dislike).unwrap();
        assert!(outcome.active);
        assert_eq!(outcome.count, 1);

        let post = find_post(&mut conn, post.id).unwrap();
        assert_eq!(post.like_count, 0);
        assert_eq!(post.dislike_count, 1);

        let record = get_or_create_post_interaction(&mut conn, bob.id, post.id).unwrap();
        assert!(!record.liked && record.disliked);
    }

    #[test]
    fn test_like_scores_author() {
        let mut conn = test_connection();
        let alice = seed_user(&mut conn, "alice");
        let bob = seed_user(&mut conn, "bob");
        let post = seed_post(&mut conn, bob.id);

        let outcome = apply_post_interaction(&mut conn, alice.id, post.id, Action::Like).unwrap();
        let expected = 1.0 + 1.0 / (500.0 * 1.1);
        assert!(approx(outcome.author_score.unwrap(), expected));

        let bob = find_user(&mut conn, bob.id).unwrap();
        assert!(approx(bob.score, expected));
        assert_eq!(bob.post_likes_received, 1);
    }

    #[test]
    fn test_favorite_does_not_rescore() {
        let mut conn = test_connection();
        let alice = seed_user(&mut conn, "alice");
        let bob = seed_user(&mut conn, "bob");
        let post = seed_post(&mut conn, alice.id);

        let outcome = apply_post_interaction(&mut conn, bob.id, post.id, Action::Favorite).unwrap();
        assert!(outcome.active);
        assert_eq!(outcome.count, 1);
        assert_eq!(outcome.author_score, None);
        assert_eq!(find_post(&mut conn, post.id).unwrap().favorite_count, 1);
        assert_eq!(find_user(&mut conn, alice.id).unwrap().score, 1.0);
    }

    #[test]
    fn test_counts_match_records() {
        let mut conn = test_connection();
        let author = seed_user(&mut conn, "author");
        let post = seed_post(&mut conn, author.id);
        let voters: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|name| seed_user(&mut conn, name))
            .collect();

        apply_post_interaction(&mut conn, voters[0].id, post.id, Action::Like).unwrap();
        apply_post_interaction(&mut conn, voters[1].id, post.id, Action::Like).unwrap();
        apply_post_interaction(&mut conn, voters[1].id, post.id, Action::Dislike).unwrap();
        apply_post_interaction(&mut conn, voters[2].id, post.id, Action::Favorite).unwrap();
        apply_post_interaction(&mut conn, voters[2].id, post.id, Action::Dislike).unwrap();

        let post = find_post(&mut conn, post.id).unwrap();
        let count_where = |conn: &mut SqliteConnection, column: &str| -> i64 {
            let rows = post_interactions::table
                .filter(post_interactions::post_id.eq(post.id))
                .select((
                    post_interactions::liked,
                    post_interactions::disliked,
                    post_interactions::favorited,
                ))
                .load::<(bool, bool, bool)>(conn)
                .unwrap();
            rows.iter()
                .filter(|(l, d, f)| match column {
                    "liked" => *l,
                    "disliked" => *d,
                    _ => *f,
                })
                .count() as i64
        };
        assert_eq!(post.like_count as i64, count_where(&mut conn, "liked"));
        assert_eq!(post.dislike_count as i64, count_where(&mut conn, "disliked"));
        assert_eq!(post.favorite_count as i64, count_where(&mut conn, "favorited"));
        assert_eq!((post.like_count, post.dislike_count, post.favorite_count), (1, 2, 1));
    }

    #[test]
    fn test_unknown_targets() {
        let mut conn = test_connection();
        let bob = seed_user(&mut conn, "bob");
        assert!(matches!(
            apply_post_interaction(&mut conn, bob.id, 404, Action::Like),
            Err(ForumError::NotFound { entity: "post", .. })
        ));
        assert!(matches!(
            apply_comment_interaction(&mut conn, bob.id, 404, Action::Like),
            Err(ForumError::NotFound { entity: "comment", .. })
        ));
    }

    #[test]
    fn test_comment_rejects_favorite() {
        let mut conn = test_connection();
        let alice = seed_user(&mut conn, "alice");
        let post = seed_post(&mut conn, alice.id);
        let comment = seed_comment(&mut conn, alice.id, post.id);
        assert!(matches!(
            apply_comment_interaction(&mut conn, alice.id, comment.id, Action::Favorite),
            Err(ForumError::InvalidAction(a)) if a == "favorite"
        ));
    }

    #[test]
    fn test_comment_dislike_from_rich_voter_stays_at_floor() {
        let mut conn = test_connection();
        let alice = seed_user(&mut conn, "alice");
        let bob = seed_user(&mut conn, "bob");
        set_score(&mut conn, alice.id, 10.0);
        let post = seed_post(&mut conn, alice.id);
        let comment = seed_comment(&mut conn, bob.id, post.id);

        let outcome =
            apply_comment_interaction(&mut conn, alice.id, comment.id, Action::Dislike).unwrap();
        assert!(outcome.active);
        assert_eq!(outcome.count, 1);
        assert_eq!(outcome.author_score, Some(1.0));
        assert_eq!(find_comment(&mut conn, comment.id).unwrap().dislike_count, 1);
    }

    #[test]
    fn test_comment_like_counts_received() {
        let mut conn = test_connection();
        let alice = seed_user(&mut conn, "alice");
        let bob = seed_user(&mut conn, "bob");
        let post = seed_post(&mut conn, alice.id);
        let comment = seed_comment(&mut conn, bob.id, post.id);

        let outcome = apply_comment_interaction(&mut conn, alice.id, comment.id, Action::Like).unwrap();
        let expected = 1.0 + 1.0 / (100.0 * 1.2);
        assert!(approx(outcome.author_score.unwrap(), expected));
        assert_eq!(find_user(&mut conn, bob.id).unwrap().comment_likes_received, 1);

        apply_comment_interaction(&mut conn, alice.id, comment.id, Action::Dislike).unwrap();
        let bob = find_user(&mut conn, bob.id).unwrap();
        assert_eq!(bob.comment_likes_received, 0);
        assert_eq!(bob.score, 1.0);
    }
}
