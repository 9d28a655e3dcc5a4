mod engine;
pub mod machine;
pub mod store;

pub use engine::{apply_comment_interaction, apply_post_interaction, InteractionOutcome};
pub use machine::{apply, Action, Counts, Flags, Transition};
pub use store::{
    get_or_create_comment_interaction, get_or_create_post_interaction, save_comment_interaction,
    save_post_interaction, CommentInteraction, PostInteraction,
};
