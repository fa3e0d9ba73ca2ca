use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

use crate::db::DbPool;
use crate::models::Summary;
use crate::schema::summaries;

/// Inserts a new summary.
#[instrument(skip(pool, summary), fields(summary_id = %summary.get_id(), user_id = %summary.get_user_id()))]
pub fn create_summary(pool: &DbPool, summary: Summary) -> Result<Summary> {
    debug!("Creating new summary");
    let conn = &mut pool.get()?;
    diesel::insert_into(summaries::table)
        .values(summary.clone())
        .execute(conn)?;
    info!("Created summary {}", summary.get_id());
    Ok(summary)
}

/// Retrieves a summary scoped to its owner.
#[instrument(skip(pool), fields(summary_id = %summary_id, user_id = %user_id))]
pub fn get_summary(pool: &DbPool, summary_id: &str, user_id: &str) -> Result<Option<Summary>> {
    let conn = &mut pool.get()?;
    let summary = summaries::table
        .filter(summaries::id.eq(summary_id))
        .filter(summaries::user_id.eq(user_id))
        .select(Summary::as_select())
        .first(conn)
        .optional()?;
    Ok(summary)
}

/// Lists a user's summaries, newest first.
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn list_summaries(
    pool: &DbPool,
    user_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Summary>> {
    let conn = &mut pool.get()?;
    let list = summaries::table
        .filter(summaries::user_id.eq(user_id))
        .order(summaries::created_at.desc())
        .limit(limit)
        .offset(offset)
        .select(Summary::as_select())
        .load(conn)?;
    Ok(list)
}

/// Replaces a summary's content (manual edit or AI reformat).
#[instrument(skip(pool, content), fields(summary_id = %summary_id, user_id = %user_id))]
pub fn update_summary_content(
    pool: &DbPool,
    summary_id: &str,
    user_id: &str,
    content: &str,
) -> Result<usize> {
    let conn = &mut pool.get()?;
    let updated = diesel::update(
        summaries::table
            .filter(summaries::id.eq(summary_id))
            .filter(summaries::user_id.eq(user_id)),
    )
    .set((
        summaries::content.eq(content),
        summaries::updated_at.eq(Utc::now().naive_utc()),
    ))
    .execute(conn)?;
    Ok(updated)
}

/// Deletes a summary.
#[instrument(skip(pool), fields(summary_id = %summary_id, user_id = %user_id))]
pub fn delete_summary(pool: &DbPool, summary_id: &str, user_id: &str) -> Result<usize> {
    let conn = &mut pool.get()?;
    let deleted = diesel::delete(
        summaries::table
            .filter(summaries::id.eq(summary_id))
            .filter(summaries::user_id.eq(user_id)),
    )
    .execute(conn)?;
    Ok(deleted)
}
