use crate::settings::{Reputation, VoteWeights};
use serde::Serialize;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Like,
    Dislike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VoteTarget {
    Post,
    Comment,
}

/// A like or dislike received on one of the user's posts or comments, with
/// the voter's currently stored score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReceivedVote {
    pub voter_id: i32,
    pub voter_score: f64,
    pub kind: VoteKind,
    pub target: VoteTarget,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub previous: f64,
    pub gained: f64,
    pub lost: f64,
    /// Seed plus all contributions, before the floor is applied.
    pub raw: f64,
    pub score: f64,
    pub post_likes: usize,
    pub post_dislikes: usize,
    pub comment_likes: usize,
    pub comment_dislikes: usize,
}

impl ScoreBreakdown {
    pub fn is_floored(&self) -> bool {
        self.raw < self.score
    }

    pub fn total_votes(&self) -> usize {
        self.post_likes + self.post_dislikes + self.comment_likes + self.comment_dislikes
    }
}

/// Magnitude of a single vote. Richer voters weigh more; the author's own
/// score damps it, more strongly for likes than for dislikes.
pub fn vote_weight(
    voter_score: f64,
    author_score: f64,
    kind: VoteKind,
    weights: &VoteWeights,
    floor: f64,
) -> f64 {
    let damping = match kind {
        VoteKind::Like => weights.like_damping,
        VoteKind::Dislike => weights.dislike_damping,
    };
    voter_score.max(floor) / (weights.base * (1.0 + author_score.max(floor) / damping))
}

/// Rebuilds a score from scratch: start at the floor, add every like, subtract
/// every dislike, clamp to the floor. `current` is the author's stored score,
/// used only for damping.
pub fn recompute(current: f64, votes: &[ReceivedVote], reputation: &Reputation) -> ScoreBreakdown {
    let floor = reputation.floor;
    let mut breakdown = ScoreBreakdown {
        previous: current,
        ..Default::default()
    };
    let mut score = floor;

    for vote in votes {
        let weights = match vote.target {
            VoteTarget::Post => &reputation.post,
            VoteTarget::Comment => &reputation.comment,
        };
        let weight = vote_weight(vote.voter_score, current, vote.kind, weights, floor);

        match (vote.kind, vote.target) {
            (VoteKind::Like, VoteTarget::Post) => breakdown.post_likes += 1,
            (VoteKind::Dislike, VoteTarget::Post) => breakdown.post_dislikes += 1,
            (VoteKind::Like, VoteTarget::Comment) => breakdown.comment_likes += 1,
            (VoteKind::Dislike, VoteTarget::Comment) => breakdown.comment_dislikes += 1,
        }

        match vote.kind {
            VoteKind::Like => {
                score += weight;
                breakdown.gained += weight;
            }
            VoteKind::Dislike => {
                score -= weight;
                breakdown.lost += weight;
            }
        }
    }

    breakdown.raw = score;
    breakdown.score = score.max(floor);
    breakdown
}
