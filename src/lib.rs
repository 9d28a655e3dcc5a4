pub mod activity;
pub mod comments;
pub mod db;
pub mod error;
pub mod factions;
pub mod handler;
pub mod interactions;
mod schema;
pub mod scoring;
pub mod settings;
pub mod utils;

pub use error::{ForumError, Result};
pub use handler::ForumHandler;
