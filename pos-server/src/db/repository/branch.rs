//! Branch Repository

use super::{RepoError, RepoResult};
use shared::models::{Branch, BranchCreate, BranchUpdate};
use sqlx::SqlitePool;

const BRANCH_COLUMNS: &str = "branch_code, name, address, printer_ip, created_at, updated_at";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Branch>> {
    let branches = sqlx::query_as::<_, Branch>(&format!(
        "SELECT {BRANCH_COLUMNS} FROM branch ORDER BY branch_code"
    ))
    .fetch_all(pool)
    .await?;
    Ok(branches)
}

pub async fn find_by_code(pool: &SqlitePool, branch_code: &str) -> RepoResult<Option<Branch>> {
    let branch = sqlx::query_as::<_, Branch>(&format!(
        "SELECT {BRANCH_COLUMNS} FROM branch WHERE branch_code = ?"
    ))
    .bind(branch_code)
    .fetch_optional(pool)
    .await?;
    Ok(branch)
}

pub async fn create(pool: &SqlitePool, data: BranchCreate, now: i64) -> RepoResult<Branch> {
    sqlx::query(
        "INSERT INTO branch (branch_code, name, address, printer_ip, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&data.branch_code)
    .bind(&data.name)
    .bind(&data.address)
    .bind(&data.printer_ip)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => {
            RepoError::Duplicate(format!("Branch {} already exists", data.branch_code))
        }
        other => other,
    })?;

    find_by_code(pool, &data.branch_code)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create branch".into()))
}

/// Partial update; an empty `printer_ip` clears the printer
pub async fn update(
    pool: &SqlitePool,
    branch_code: &str,
    data: BranchUpdate,
    now: i64,
) -> RepoResult<Branch> {
    let clear_printer = data.printer_ip.as_deref().is_some_and(|ip| ip.trim().is_empty());
    let printer_ip = data.printer_ip.filter(|ip| !ip.trim().is_empty());

    let rows = sqlx::query(
        "UPDATE branch SET name = COALESCE(?1, name), address = COALESCE(?2, address), \
         printer_ip = CASE WHEN ?3 THEN NULL ELSE COALESCE(?4, printer_ip) END, updated_at = ?5 \
         WHERE branch_code = ?6",
    )
    .bind(data.name)
    .bind(data.address)
    .bind(clear_printer)
    .bind(printer_ip)
    .bind(now)
    .bind(branch_code)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Branch {branch_code} not found")));
    }
    find_by_code(pool, branch_code)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Branch {branch_code} not found")))
}
