use super::reputation::{recompute, ReceivedVote, ScoreBreakdown, VoteKind, VoteTarget};
use crate::db::{all_user_ids, find_user};
use crate::error::Result;
use crate::schema::{comment_interactions, comments, post_interactions, posts, users};
use crate::settings::settings;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

fn vote_kind(liked: bool, disliked: bool) -> Option<VoteKind> {
    match (liked, disliked) {
        (true, _) => Some(VoteKind::Like),
        (false, true) => Some(VoteKind::Dislike),
        (false, false) => None,
    }
}

/// Every like/dislike on the user's posts, then on their comments, in
/// interaction order.
pub fn received_votes(conn: &mut SqliteConnection, user_id: i32) -> QueryResult<Vec<ReceivedVote>> {
    let post_rows: Vec<(i32, f64, bool, bool)> = post_interactions::table
        .inner_join(posts::table)
        .inner_join(users::table.on(users::id.eq(post_interactions::user_id)))
        .filter(posts::author_id.eq(user_id))
        .filter(post_interactions::liked.or(post_interactions::disliked))
        .order(post_interactions::id.asc())
        .select((
            post_interactions::user_id,
            users::score,
            post_interactions::liked,
            post_interactions::disliked,
        ))
        .load(conn)?;

    let comment_rows: Vec<(i32, f64, bool, bool)> = comment_interactions::table
        .inner_join(comments::table)
        .inner_join(users::table.on(users::id.eq(comment_interactions::user_id)))
        .filter(comments::author_id.eq(user_id))
        .filter(comment_interactions::liked.or(comment_interactions::disliked))
        .order(comment_interactions::id.asc())
        .select((
            comment_interactions::user_id,
            users::score,
            comment_interactions::liked,
            comment_interactions::disliked,
        ))
        .load(conn)?;

    let tagged = post_rows
        .into_iter()
        .map(|row| (row, VoteTarget::Post))
        .chain(comment_rows.into_iter().map(|row| (row, VoteTarget::Comment)));

    Ok(tagged
        .filter_map(|((voter_id, voter_score, liked, disliked), target)| {
            vote_kind(liked, disliked).map(|kind| ReceivedVote {
                voter_id,
                voter_score,
                kind,
                target,
            })
        })
        .collect())
}

/// Computes what the user's score would be now, without storing it.
pub fn preview_user(conn: &mut SqliteConnection, user_id: i32) -> Result<ScoreBreakdown> {
    let user = find_user(conn, user_id)?;
    let votes = received_votes(conn, user_id)?;
    Ok(recompute(user.score, &votes, &settings().reputation))
}

/// Recomputes and stores the user's score. Runs inside the caller's
/// transaction.
pub fn recompute_user(conn: &mut SqliteConnection, user_id: i32) -> Result<ScoreBreakdown> {
    let breakdown = preview_user(conn, user_id)?;

    diesel::update(users::table.find(user_id))
        .set(users::score.eq(breakdown.score))
        .execute(conn)?;

    tracing::debug!(
        user_id,
        previous = breakdown.previous,
        score = breakdown.score,
        votes = breakdown.total_votes(),
        "score recomputed"
    );
    Ok(breakdown)
}

pub fn recompute_score(conn: &mut SqliteConnection, user_id: i32) -> Result<f64> {
    conn.immediate_transaction(|conn| Ok(recompute_user(conn, user_id)?.score))
}

/// Recomputes every user once, in id order. Each user sees the scores
/// already written for lower ids; there is no iteration to a fixpoint.
pub fn recompute_all_scores(conn: &mut SqliteConnection) -> Result<usize> {
    conn.immediate_transaction(|conn| {
        let ids = all_user_ids(conn)?;
        for id in &ids {
            recompute_user(conn, *id)?;
        }
        tracing::info!(users = ids.len(), "recomputed all scores");
        Ok(ids.len())
    })
}
