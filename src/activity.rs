//! Read-only views over interactions: who liked what, and what a user saved.

use crate::db::{find_post, Comment, Post, User};
use crate::error::Result;
use crate::interactions::{CommentInteraction, PostInteraction};
use crate::schema::{comment_interactions, comments, post_interactions, posts, users};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

/// Users currently liking a post, most recent first.
pub fn post_likers(conn: &mut SqliteConnection, post_id: i32) -> Result<Vec<User>> {
    find_post(conn, post_id)?;

    Ok(post_interactions::table
        .inner_join(users::table)
        .filter(post_interactions::post_id.eq(post_id))
        .filter(post_interactions::liked.eq(true))
        .order((
            post_interactions::interacted_at.desc(),
            post_interactions::id.desc(),
        ))
        .select(User::as_select())
        .load(conn)?)
}

/// Likes received on the user's posts, most recent first.
pub fn received_post_likes(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<Vec<(PostInteraction, Post)>> {
    Ok(post_interactions::table
        .inner_join(posts::table)
        .filter(posts::author_id.eq(user_id))
        .filter(post_interactions::liked.eq(true))
        .order((
            post_interactions::interacted_at.desc(),
            post_interactions::id.desc(),
        ))
        .select((PostInteraction::as_select(), Post::as_select()))
        .load(conn)?)
}

pub fn received_comment_likes(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<Vec<(CommentInteraction, Comment)>> {
    Ok(comment_interactions::table
        .inner_join(comments::table)
        .filter(comments::author_id.eq(user_id))
        .filter(comment_interactions::liked.eq(true))
        .order((
            comment_interactions::interacted_at.desc(),
            comment_interactions::id.desc(),
        ))
        .select((CommentInteraction::as_select(), Comment::as_select()))
        .load(conn)?)
}

pub fn user_favorites(conn: &mut SqliteConnection, user_id: i32) -> Result<Vec<Post>> {
    Ok(post_interactions::table
        .inner_join(posts::table)
        .filter(post_interactions::user_id.eq(user_id))
        .filter(post_interactions::favorited.eq(true))
        .order((
            post_interactions::interacted_at.desc(),
            post_interactions::id.desc(),
        ))
        .select(Post::as_select())
        .load(conn)?)
}
