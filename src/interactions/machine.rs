use crate::error::ForumError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Like,
    Dislike,
    Favorite,
}

impl FromStr for Action {
    type Err = ForumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::iter()
            .find(|a| a.as_ref() == s)
            .ok_or_else(|| ForumError::InvalidAction(s.to_string()))
    }
}

/// Per-(user, target) interaction state. `liked` and `disliked` are never
/// both set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Flags {
    pub liked: bool,
    pub disliked: bool,
    pub favorited: bool,
}

impl Flags {
    fn flag_mut(&mut self, action: Action) -> &mut bool {
        match action {
            Action::Like => &mut self.liked,
            Action::Dislike => &mut self.disliked,
            Action::Favorite => &mut self.favorited,
        }
    }

    pub fn get(&self, action: Action) -> bool {
        match action {
            Action::Like => self.liked,
            Action::Dislike => self.disliked,
            Action::Favorite => self.favorited,
        }
    }
}

/// Denormalized counters on the target row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub likes: i32,
    pub dislikes: i32,
    pub favorites: i32,
}

impl Counts {
    fn slot_mut(&mut self, action: Action) -> &mut i32 {
        match action {
            Action::Like => &mut self.likes,
            Action::Dislike => &mut self.dislikes,
            Action::Favorite => &mut self.favorites,
        }
    }

    pub fn get(&self, action: Action) -> i32 {
        match action {
            Action::Like => self.likes,
            Action::Dislike => self.dislikes,
            Action::Favorite => self.favorites,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub action: Action,
    pub before: Flags,
    pub after: Flags,
    pub count: i32,
}

impl Transition {
    pub fn active(&self) -> bool {
        self.after.get(self.action)
    }

    /// A like/dislike flag changed, so the target author's score is stale.
    pub fn is_qualifying(&self) -> bool {
        self.before.liked != self.after.liked || self.before.disliked != self.after.disliked
    }

    /// +1 when a like was added, -1 when one was removed.
    pub fn like_delta(&self) -> i32 {
        i32::from(self.after.liked) - i32::from(self.before.liked)
    }
}

fn opposite(action: Action) -> Option<Action> {
    match action {
        Action::Like => Some(Action::Dislike),
        Action::Dislike => Some(Action::Like),
        Action::Favorite => None,
    }
}

/// Toggles the flag for `action`, keeping like/dislike exclusive and the
/// counters in step with the flags.
pub fn apply(flags: &mut Flags, counts: &mut Counts, action: Action) -> Transition {
    let before = *flags;

    if flags.get(action) {
        *flags.flag_mut(action) = false;
        *counts.slot_mut(action) -= 1;
    } else {
        *flags.flag_mut(action) = true;
        *counts.slot_mut(action) += 1;
        if let Some(other) = opposite(action) {
            if flags.get(other) {
                *flags.flag_mut(other) = false;
                *counts.slot_mut(other) -= 1;
            }
        }
    }

    Transition {
        action,
        before,
        after: *flags,
        count: counts.get(action),
    }
}
