mod reputation;
mod votes;

pub use reputation::{recompute, vote_weight, ReceivedVote, ScoreBreakdown, VoteKind, VoteTarget};
pub use votes::{preview_user, received_votes, recompute_all_scores, recompute_score, recompute_user};
