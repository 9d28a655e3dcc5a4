use crate::error::{ForumError, Result};
use crate::schema::{comments, posts, users};
use crate::settings::Database;
use chrono::Utc;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Double;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use serde::Serialize;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

#[derive(Debug, Clone, Copy)]
struct SqlitePragmas {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        configure_connection(conn, self.busy_timeout_ms).map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn establish_pool(config: &Database) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(&config.url);
    let pool = Pool::builder()
        .max_size(config.pool_size)
        .connection_customizer(Box::new(SqlitePragmas {
            busy_timeout_ms: config.busy_timeout_ms,
        }))
        .build(manager)?;
    Ok(pool)
}

pub fn configure_connection(conn: &mut SqliteConnection, busy_timeout_ms: u32) -> QueryResult<()> {
    conn.batch_execute(&format!("PRAGMA busy_timeout = {busy_timeout_ms};"))?;
    conn.batch_execute("PRAGMA journal_mode = WAL;")?;
    conn.batch_execute("PRAGMA synchronous = NORMAL;")?;
    conn.batch_execute("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

/// Applies any pending embedded migrations, returning how many ran.
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<usize> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| ForumError::Migration(e.to_string()))?;
    for version in &applied {
        tracing::info!(%version, "applied migration");
    }
    Ok(applied.len())
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub score: f64,
    pub post_count: i32,
    pub post_likes_received: i32,
    pub comment_likes_received: i32,
    pub created_at: i64,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub created_at: i64,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = posts)]
pub struct Post {
    pub id: i32,
    pub author_id: i32,
    pub title: String,
    pub content: String,
    pub like_count: i32,
    pub dislike_count: i32,
    pub favorite_count: i32,
    pub view_count: i32,
    pub created_at: i64,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = posts)]
pub struct NewPost<'a> {
    pub author_id: i32,
    pub title: &'a str,
    pub content: &'a str,
    pub created_at: i64,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = comments)]
pub struct Comment {
    pub id: i32,
    pub author_id: i32,
    pub post_id: i32,
    pub content: String,
    pub faction: String,
    pub like_count: i32,
    pub dislike_count: i32,
    pub created_at: i64,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = comments)]
pub struct NewComment<'a> {
    pub author_id: i32,
    pub post_id: i32,
    pub content: &'a str,
    pub faction: &'a str,
    pub created_at: i64,
}

pub fn create_user(conn: &mut SqliteConnection, username: &str) -> Result<User> {
    let new_user = NewUser {
        username,
        created_at: Utc::now().timestamp(),
    };

    diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                ForumError::UsernameTaken(username.to_string())
            }
            other => other.into(),
        })
}

pub fn find_user(conn: &mut SqliteConnection, user_id: i32) -> Result<User> {
    users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ForumError::not_found("user", user_id))
}

pub fn find_user_by_name(conn: &mut SqliteConnection, name: &str) -> Result<User> {
    users::table
        .filter(users::username.eq(name))
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ForumError::not_found("user", name))
}

/// Inserts a post and bumps the author's `post_count` in one transaction.
pub fn create_post(
    conn: &mut SqliteConnection,
    author_id: i32,
    title: &str,
    content: &str,
) -> Result<Post> {
    if title.trim().is_empty() || content.trim().is_empty() {
        return Err(ForumError::EmptyContent);
    }

    conn.immediate_transaction(|conn| {
        find_user(conn, author_id)?;

        let post = diesel::insert_into(posts::table)
            .values(&NewPost {
                author_id,
                title: title.trim(),
                content,
                created_at: Utc::now().timestamp(),
            })
            .returning(Post::as_returning())
            .get_result(conn)?;

        diesel::update(users::table.find(author_id))
            .set(users::post_count.eq(users::post_count + 1))
            .execute(conn)?;

        Ok(post)
    })
}

pub fn find_post(conn: &mut SqliteConnection, post_id: i32) -> Result<Post> {
    posts::table
        .find(post_id)
        .select(Post::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ForumError::not_found("post", post_id))
}

pub fn find_comment(conn: &mut SqliteConnection, comment_id: i32) -> Result<Comment> {
    comments::table
        .find(comment_id)
        .select(Comment::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ForumError::not_found("comment", comment_id))
}

pub fn insert_comment(conn: &mut SqliteConnection, new_comment: &NewComment) -> Result<Comment> {
    Ok(diesel::insert_into(comments::table)
        .values(new_comment)
        .returning(Comment::as_returning())
        .get_result(conn)?)
}

/// Counts a page view and returns the new total.
pub fn record_view(conn: &mut SqliteConnection, post_id: i32) -> Result<i32> {
    diesel::update(posts::table.find(post_id))
        .set(posts::view_count.eq(posts::view_count + 1))
        .returning(posts::view_count)
        .get_result(conn)
        .optional()?
        .ok_or_else(|| ForumError::not_found("post", post_id))
}

/// Front-page ranking: `view_count * view_weight + like_count * like_weight`.
pub fn hot_posts(
    conn: &mut SqliteConnection,
    view_weight: f64,
    like_weight: f64,
    limit: i64,
) -> Result<Vec<Post>> {
    let hotness = diesel::dsl::sql::<Double>("view_count * ")
        .bind::<Double, _>(view_weight)
        .sql(" + like_count * ")
        .bind::<Double, _>(like_weight);

    Ok(posts::table
        .select(Post::as_select())
        .order(hotness.desc())
        .then_order_by(posts::id.desc())
        .limit(limit)
        .load(conn)?)
}

pub fn posts_by_author(conn: &mut SqliteConnection, author_id: i32) -> Result<Vec<Post>> {
    Ok(posts::table
        .filter(posts::author_id.eq(author_id))
        .select(Post::as_select())
        .order((posts::created_at.desc(), posts::id.desc()))
        .load(conn)?)
}

pub fn leaderboard(conn: &mut SqliteConnection, limit: i64) -> Result<Vec<User>> {
    Ok(users::table
        .select(User::as_select())
        .order((users::score.desc(), users::id.asc()))
        .limit(limit)
        .load(conn)?)
}

pub fn all_user_ids(conn: &mut SqliteConnection) -> QueryResult<Vec<i32>> {
    users::table.select(users::id).order(users::id.asc()).load(conn)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Fresh in-memory database with all migrations applied.
    pub fn test_connection() -> SqliteConnection {
        let mut conn =
            SqliteConnection::establish(":memory:").expect("in-memory sqlite should open");
        conn.batch_execute("PRAGMA foreign_keys = ON;")
            .expect("pragma should apply");
        run_migrations(&mut conn).expect("migrations should apply");
        conn
    }

    pub fn seed_user(conn: &mut SqliteConnection, name: &str) -> User {
        create_user(conn, name).expect("user should insert")
    }

    pub fn seed_post(conn: &mut SqliteConnection, author_id: i32) -> Post {
        create_post(conn, author_id, "Is tabs better than spaces?", "Discuss.")
            .expect("post should insert")
    }

    pub fn seed_comment(conn: &mut SqliteConnection, author_id: i32, post_id: i32) -> Comment {
        insert_comment(
            conn,
            &NewComment {
                author_id,
                post_id,
                content: "I agree",
                faction: "neutral",
                created_at: Utc::now().timestamp(),
            },
        )
        .expect("comment should insert")
    }

    pub fn set_score(conn: &mut SqliteConnection, user_id: i32, value: f64) {
        diesel::update(users::table.find(user_id))
            .set(users::score.eq(value))
            .execute(conn)
            .expect("score should update");
    }
}
