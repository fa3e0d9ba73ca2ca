use anyhow::Result;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

use crate::db::DbPool;
use crate::models::FlashcardSet;
use crate::schema::flashcard_sets;

/// Inserts a new flashcard set.
#[instrument(skip(pool, set), fields(set_id = %set.get_id(), user_id = %set.get_user_id()))]
pub fn create_flashcard_set(pool: &DbPool, set: FlashcardSet) -> Result<FlashcardSet> {
    debug!("Creating new flashcard set");
    let conn = &mut pool.get()?;
    diesel::insert_into(flashcard_sets::table)
        .values(set.clone())
        .execute(conn)?;
    info!("Created flashcard set {}", set.get_id());
    Ok(set)
}

/// Retrieves a flashcard set scoped to its owner.
#[instrument(skip(pool), fields(set_id = %set_id, user_id = %user_id))]
pub fn get_flashcard_set(
    pool: &DbPool,
    set_id: &str,
    user_id: &str,
) -> Result<Option<FlashcardSet>> {
    let conn = &mut pool.get()?;
    let set = flashcard_sets::table
        .filter(flashcard_sets::id.eq(set_id))
        .filter(flashcard_sets::user_id.eq(user_id))
        .select(FlashcardSet::as_select())
        .first(conn)
        .optional()?;
    Ok(set)
}

/// Lists a user's flashcard sets, newest first.
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn list_flashcard_sets(
    pool: &DbPool,
    user_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<FlashcardSet>> {
    let conn = &mut pool.get()?;
    let list = flashcard_sets::table
        .filter(flashcard_sets::user_id.eq(user_id))
        .order(flashcard_sets::created_at.desc())
        .limit(limit)
        .offset(offset)
        .select(FlashcardSet::as_select())
        .load(conn)?;
    Ok(list)
}

/// Deletes a flashcard set.
#[instrument(skip(pool), fields(set_id = %set_id, user_id = %user_id))]
pub fn delete_flashcard_set(pool: &DbPool, set_id: &str, user_id: &str) -> Result<usize> {
    let conn = &mut pool.get()?;
    let deleted = diesel::delete(
        flashcard_sets::table
            .filter(flashcard_sets::id.eq(set_id))
            .filter(flashcard_sets::user_id.eq(user_id)),
    )
    .execute(conn)?;
    Ok(deleted)
}
