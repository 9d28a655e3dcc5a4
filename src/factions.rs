//! Debate factions: which side of a post a user has joined, and the gate
//! that keeps faction-tagged comments to members of that faction.
//!
//! Two membership paths exist. The choose-once path rejects any second
//! choice on the same post; the toggle path lets a user leave or switch
//! sides. [`set_faction`] routes to exactly one of them according to the
//! configured [`FactionPolicy`].

use crate::db::{find_post, find_user};
use crate::error::{ForumError, Result};
use crate::schema::post_factions;
use crate::settings::settings;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Pro,
    Anti,
}

impl FromStr for Faction {
    type Err = ForumError;

    fn from_str(s: &str) -> Result<Self> {
        Faction::iter()
            .find(|f| f.as_ref() == s)
            .ok_or_else(|| ForumError::InvalidFaction(s.to_string()))
    }
}

/// The side a comment is posted on. Neutral comments need no membership.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Pro,
    Anti,
    Neutral,
}

impl Side {
    pub fn faction(self) -> Option<Faction> {
        match self {
            Side::Pro => Some(Faction::Pro),
            Side::Anti => Some(Faction::Anti),
            Side::Neutral => None,
        }
    }
}

impl FromStr for Side {
    type Err = ForumError;

    fn from_str(s: &str) -> Result<Self> {
        Side::iter()
            .find(|side| side.as_ref() == s)
            .ok_or_else(|| ForumError::InvalidFaction(s.to_string()))
    }
}

impl From<Faction> for Side {
    fn from(faction: Faction) -> Self {
        match faction {
            Faction::Pro => Side::Pro,
            Faction::Anti => Side::Anti,
        }
    }
}

/// Which membership path `set_faction` follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum FactionPolicy {
    /// First choice is permanent; re-choosing fails with `AlreadyChosen`.
    ChooseOnce,
    /// Same faction leaves, other faction switches, none joins.
    Toggle,
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = post_factions)]
pub struct PostFaction {
    pub id: i32,
    pub user_id: i32,
    pub post_id: i32,
    pub faction: String,
    pub created_at: i64,
}

impl PostFaction {
    pub fn faction(&self) -> Result<Faction> {
        self.faction.parse()
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = post_factions)]
struct NewPostFaction<'a> {
    user_id: i32,
    post_id: i32,
    faction: &'a str,
    created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "lowercase")]
pub enum FactionToggle {
    Joined { faction: Faction },
    Switched { from: Faction, to: Faction },
    Left { faction: Faction },
}

impl FactionToggle {
    pub fn is_active(&self) -> bool {
        !matches!(self, FactionToggle::Left { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FactionOutcome {
    pub active: bool,
}

fn membership(
    conn: &mut SqliteConnection,
    user_id: i32,
    post_id: i32,
) -> QueryResult<Option<PostFaction>> {
    post_factions::table
        .filter(post_factions::user_id.eq(user_id))
        .filter(post_factions::post_id.eq(post_id))
        .select(PostFaction::as_select())
        .first(conn)
        .optional()
}

fn insert_membership(
    conn: &mut SqliteConnection,
    user_id: i32,
    post_id: i32,
    faction: Faction,
) -> QueryResult<PostFaction> {
    diesel::insert_into(post_factions::table)
        .values(&NewPostFaction {
            user_id,
            post_id,
            faction: faction.as_ref(),
            created_at: Utc::now().timestamp(),
        })
        .returning(PostFaction::as_returning())
        .get_result(conn)
}

pub fn faction_of(conn: &mut SqliteConnection, user_id: i32, post_id: i32) -> Result<Option<Faction>> {
    membership(conn, user_id, post_id)?
        .map(|row| row.faction())
        .transpose()
}

/// Joins `faction` on a post for good. Any existing membership, whichever
/// side, is left untouched and reported as `AlreadyChosen`.
pub fn choose_faction(
    conn: &mut SqliteConnection,
    user_id: i32,
    post_id: i32,
    faction: Faction,
) -> Result<PostFaction> {
    conn.immediate_transaction(|conn| {
        find_user(conn, user_id)?;
        find_post(conn, post_id)?;

        if let Some(existing) = membership(conn, user_id, post_id)? {
            return Err(ForumError::AlreadyChosen {
                user_id,
                post_id,
                existing: existing.faction()?,
            });
        }

        let row = insert_membership(conn, user_id, post_id, faction)?;
        tracing::debug!(user_id, post_id, %faction, "faction chosen");
        Ok(row)
    })
}

pub fn toggle_faction(
    conn: &mut SqliteConnection,
    user_id: i32,
    post_id: i32,
    faction: Faction,
) -> Result<FactionToggle> {
    conn.immediate_transaction(|conn| {
        find_user(conn, user_id)?;
        find_post(conn, post_id)?;

        let existing = match membership(conn, user_id, post_id)? {
            Some(row) => Some((row.id, row.faction()?)),
            None => None,
        };

        let change = match existing {
            Some((id, current)) if current == faction => {
                diesel::delete(post_factions::table.find(id)).execute(conn)?;
                FactionToggle::Left { faction }
            }
            Some((id, from)) => {
                diesel::update(post_factions::table.find(id))
                    .set(post_factions::faction.eq(faction.as_ref()))
                    .execute(conn)?;
                FactionToggle::Switched { from, to: faction }
            }
            None => {
                insert_membership(conn, user_id, post_id, faction)?;
                FactionToggle::Joined { faction }
            }
        };

        tracing::debug!(user_id, post_id, ?change, "faction toggled");
        Ok(change)
    })
}

/// Applies the configured canonical faction policy.
pub fn set_faction(
    conn: &mut SqliteConnection,
    user_id: i32,
    post_id: i32,
    faction: Faction,
) -> Result<FactionOutcome> {
    set_faction_with(conn, settings().factions.policy, user_id, post_id, faction)
}

pub fn set_faction_with(
    conn: &mut SqliteConnection,
    policy: FactionPolicy,
    user_id: i32,
    post_id: i32,
    faction: Faction,
) -> Result<FactionOutcome> {
    let active = match policy {
        FactionPolicy::ChooseOnce => {
            choose_faction(conn, user_id, post_id, faction)?;
            true
        }
        FactionPolicy::Toggle => toggle_faction(conn, user_id, post_id, faction)?.is_active(),
    };
    Ok(FactionOutcome { active })
}

/// Fails with `NotInFaction` unless the user is a member of exactly this
/// faction on the post.
pub fn require_membership(
    conn: &mut SqliteConnection,
    user_id: i32,
    post_id: i32,
    faction: Faction,
) -> Result<()> {
    let count: i64 = post_factions::table
        .filter(post_factions::user_id.eq(user_id))
        .filter(post_factions::post_id.eq(post_id))
        .filter(post_factions::faction.eq(faction.as_ref()))
        .count()
        .get_result(conn)?;

    if count == 0 {
        return Err(ForumError::NotInFaction {
            user_id,
            post_id,
            faction,
        });
    }
    Ok(())
}
