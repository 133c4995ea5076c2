//! User Repository

use super::{RepoError, RepoResult};
use shared::models::{Role, User};
use sqlx::SqlitePool;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, branch_code, created_at, updated_at";

/// Row to insert; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub branch_code: Option<String>,
}

/// Columns to change; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    /// `Some(None)` clears the branch
    pub branch_code: Option<Option<String>>,
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM user ORDER BY created_at, id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Case-insensitive lookup (column is `COLLATE NOCASE`)
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM user WHERE email = ? LIMIT 1"
    ))
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn count_by_role(pool: &SqlitePool, role: &Role) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user WHERE role = ?")
        .bind(role.as_str())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn create(pool: &SqlitePool, data: NewUser, now: i64) -> RepoResult<User> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO user (id, name, email, password_hash, role, branch_code, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(data.email.trim())
    .bind(&data.password_hash)
    .bind(data.role.as_str())
    .bind(&data.branch_code)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!("Email {} already registered", data.email)),
        other => other,
    })?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: UserChanges, now: i64) -> RepoResult<User> {
    let set_branch = data.branch_code.is_some();
    let branch_code = data.branch_code.flatten();

    let rows = sqlx::query(
        "UPDATE user SET name = COALESCE(?1, name), email = COALESCE(?2, email), \
         password_hash = COALESCE(?3, password_hash), role = COALESCE(?4, role), \
         branch_code = CASE WHEN ?5 THEN ?6 ELSE branch_code END, updated_at = ?7 \
         WHERE id = ?8",
    )
    .bind(data.name)
    .bind(data.email.as_deref().map(str::trim))
    .bind(data.password_hash)
    .bind(data.role.as_ref().map(Role::as_str))
    .bind(set_branch)
    .bind(branch_code)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate("Email already registered".into()),
        other => other,
    })?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM user WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
