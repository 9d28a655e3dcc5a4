use super::machine::Flags;
use crate::schema::{comment_interactions, post_interactions};
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = post_interactions)]
pub struct PostInteraction {
    pub id: i32,
    pub user_id: i32,
    pub post_id: i32,
    pub liked: bool,
    pub disliked: bool,
    pub favorited: bool,
    pub interacted_at: i64,
}

impl PostInteraction {
    pub fn flags(&self) -> Flags {
        Flags {
            liked: self.liked,
            disliked: self.disliked,
            favorited: self.favorited,
        }
    }

    pub fn set_flags(&mut self, flags: Flags) {
        self.liked = flags.liked;
        self.disliked = flags.disliked;
        self.favorited = flags.favorited;
    }
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = comment_interactions)]
pub struct CommentInteraction {
    pub id: i32,
    pub user_id: i32,
    pub comment_id: i32,
    pub liked: bool,
    pub disliked: bool,
    pub interacted_at: i64,
}

impl CommentInteraction {
    pub fn flags(&self) -> Flags {
        Flags {
            liked: self.liked,
            disliked: self.disliked,
            favorited: false,
        }
    }

    pub fn set_flags(&mut self, flags: Flags) {
        self.liked = flags.liked;
        self.disliked = flags.disliked;
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = post_interactions)]
struct NewPostInteraction {
    user_id: i32,
    post_id: i32,
    interacted_at: i64,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = comment_interactions)]
struct NewCommentInteraction {
    user_id: i32,
    comment_id: i32,
    interacted_at: i64,
}

/// Returns the single record for (user, post), creating a blank one on first
/// contact. The unique (user_id, post_id) index makes the insert a no-op when
/// the row already exists.
pub fn get_or_create_post_interaction(
    conn: &mut SqliteConnection,
    user_id: i32,
    post_id: i32,
) -> QueryResult<PostInteraction> {
    diesel::insert_or_ignore_into(post_interactions::table)
        .values(&NewPostInteraction {
            user_id,
            post_id,
            interacted_at: Utc::now().timestamp(),
        })
        .execute(conn)?;

    post_interactions::table
        .filter(post_interactions::user_id.eq(user_id))
        .filter(post_interactions::post_id.eq(post_id))
        .select(PostInteraction::as_select())
        .first(conn)
}

pub fn save_post_interaction(
    conn: &mut SqliteConnection,
    record: &PostInteraction,
) -> QueryResult<usize> {
    diesel::update(post_interactions::table.find(record.id))
        .set((
            post_interactions::liked.eq(record.liked),
            post_interactions::disliked.eq(record.disliked),
            post_interactions::favorited.eq(record.favorited),
            post_interactions::interacted_at.eq(record.interacted_at),
        ))
        .execute(conn)
}

pub fn get_or_create_comment_interaction(
    conn: &mut SqliteConnection,
    user_id: i32,
    comment_id: i32,
) -> QueryResult<CommentInteraction> {
    diesel::insert_or_ignore_into(comment_interactions::table)
        .values(&NewCommentInteraction {
            user_id,
            comment_id,
            interacted_at: Utc::now().timestamp(),
        })
        .execute(conn)?;

    comment_interactions::table
        .filter(comment_interactions::user_id.eq(user_id))
        .filter(comment_interactions::comment_id.eq(comment_id))
        .select(CommentInteraction::as_select())
        .first(conn)
}

pub fn save_comment_interaction(
    conn: &mut SqliteConnection,
    record: &CommentInteraction,
) -> QueryResult<usize> {
    diesel::update(comment_interactions::table.find(record.id))
        .set((
            comment_interactions::liked.eq(record.liked),
            comment_interactions::disliked.eq(record.disliked),
            comment_interactions::interacted_at.eq(record.interacted_at),
        ))
        .execute(conn)
}
