use crate::db::{find_post, find_user, insert_comment, Comment, NewComment};
use crate::error::{ForumError, Result};
use crate::factions::{require_membership, Side};
use crate::schema::comments;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

/// Comments on a post split by side, newest first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FactionThreads {
    pub pro: Vec<Comment>,
    pub anti: Vec<Comment>,
    pub neutral: Vec<Comment>,
}

impl FactionThreads {
    pub fn len(&self) -> usize {
        self.pro.len() + self.anti.len() + self.neutral.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Posts a comment. Pro/anti comments require membership in that faction.
pub fn create_comment(
    conn: &mut SqliteConnection,
    author_id: i32,
    post_id: i32,
    content: &str,
    side: Side,
) -> Result<Comment> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ForumError::EmptyContent);
    }

    conn.immediate_transaction(|conn| {
        find_user(conn, author_id)?;
        find_post(conn, post_id)?;

        if let Some(faction) = side.faction() {
            require_membership(conn, author_id, post_id, faction)?;
        }

        insert_comment(
            conn,
            &NewComment {
                author_id,
                post_id,
                content,
                faction: side.as_ref(),
                created_at: Utc::now().timestamp(),
            },
        )
    })
}

pub fn comments_by_faction(conn: &mut SqliteConnection, post_id: i32) -> Result<FactionThreads> {
    let all: Vec<Comment> = comments::table
        .filter(comments::post_id.eq(post_id))
        .select(Comment::as_select())
        .order((comments::created_at.desc(), comments::id.desc()))
        .load(conn)?;

    let mut threads = FactionThreads::default();
    for comment in all {
        // rows with an unrecognised side are not shown in any thread
        match comment.faction.parse::<Side>() {
            Ok(Side::Pro) => threads.pro.push(comment),
            Ok(Side::Anti) => threads.anti.push(comment),
            Ok(Side::Neutral) => threads.neutral.push(comment),
            Err(_) => {}
        }
    }
    Ok(threads)
}

pub fn comments_by_author(conn: &mut SqliteConnection, author_id: i32) -> Result<Vec<Comment>> {
    Ok(comments::table
        .filter(comments::author_id.eq(author_id))
        .select(Comment::as_select())
        .order((comments::created_at.desc(), comments::id.desc()))
        .load(conn)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use crate::factions::{choose_faction, Faction};

    #[test]
    fn test_faction_comment_requires_membership() {
        let mut conn = test_connection();
        let alice = seed_user(&mut conn, "alice");
        let bob = seed_user(&mut conn, "bob");
        let post = seed_post(&mut conn, alice.id);

        let err = create_comment(&mut conn, bob.id, post.id, "pro argument", Side::Pro).unwrap_err();
        assert!(matches!(err, ForumError::NotInFaction { .. }));

        choose_faction(&mut conn, bob.id, post.id, Faction::Pro).unwrap();
        let comment = create_comment(&mut conn, bob.id, post.id, "pro argument", Side::Pro).unwrap();
        assert_eq!(comment.faction, "pro");

        let err = create_comment(&mut conn, bob.id, post.id, "anti argument", Side::Anti).unwrap_err();
        assert!(matches!(err, ForumError::NotInFaction { faction: Faction::Anti, .. }));
    }

    #[test]
    fn test_neutral_comment_needs_no_membership() {
        let mut conn = test_connection();
        let alice = seed_user(&mut conn, "alice");
        let bob = seed_user(&mut conn, "bob");
        let post = seed_post(&mut conn, alice.id);

        let comment = create_comment(&mut conn, bob.id, post.id, "  just watching  ", Side::Neutral)
            .unwrap();
        assert_eq!(comment.content, "just watching");
        assert_eq!(comment.faction, "neutral");
    }

    #[test]
    fn test_empty_comment_rejected() {
        let mut conn = test_connection();
        let alice = seed_user(&mut conn, "alice");
        let post = seed_post(&mut conn, alice.id);
        assert!(matches!(
            create_comment(&mut conn, alice.id, post.id, "   ", Side::Neutral),
            Err(ForumError::EmptyContent)
        ));
    }

    #[test]
    fn test_threads_split_by_side() {
        let mut conn = test_connection();
        let alice = seed_user(&mut conn, "alice");
        let bob = seed_user(&mut conn, "bob");
        let carol = seed_user(&mut conn, "carol");
        let post = seed_post(&mut conn, alice.id);

        choose_faction(&mut conn, bob.id, post.id, Faction::Pro).unwrap();
        choose_faction(&mut conn, carol.id, post.id, Faction::Anti).unwrap();
        create_comment(&mut conn, bob.id, post.id, "yes", Side::Pro).unwrap();
        let second = create_comment(&mut conn, bob.id, post.id, "yes again", Side::Pro).unwrap();
        create_comment(&mut conn, carol.id, post.id, "no", Side::Anti).unwrap();
        create_comment(&mut conn, alice.id, post.id, "hm", Side::Neutral).unwrap();

        let threads = comments_by_faction(&mut conn, post.id).unwrap();
        assert_eq!(threads.len(), 4);
        assert_eq!(threads.pro.len(), 2);
        assert_eq!(threads.pro[0].id, second.id);
        assert_eq!(threads.anti.len(), 1);
        assert_eq!(threads.neutral.len(), 1);
        assert_eq!(comments_by_author(&mut conn, bob.id).unwrap().len(), 2);
    }
}
