use anyhow::Result;
use diesel::prelude::*;
use tracing::{info, instrument};

use crate::db::DbPool;
use crate::models::CourseHighlight;
use crate::schema::course_highlights;

/// Lists the stored highlights of a course, in document order.
#[instrument(skip(pool), fields(course_id = %course_id, user_id = %user_id))]
pub fn list_highlights(
    pool: &DbPool,
    course_id: &str,
    user_id: &str,
) -> Result<Vec<CourseHighlight>> {
    let conn = &mut pool.get()?;
    let highlights = course_highlights::table
        .filter(course_highlights::course_id.eq(course_id))
        .filter(course_highlights::user_id.eq(user_id))
        .order(course_highlights::start_offset.asc())
        .select(CourseHighlight::as_select())
        .load(conn)?;
    Ok(highlights)
}

/// Replaces the whole highlight set of a course.
///
/// Highlights carry no identity across saves: the client always sends
/// the full set, so the stored rows are deleted and re-inserted in one
/// transaction.
#[instrument(skip(pool, highlights), fields(course_id = %course_id, user_id = %user_id, count = highlights.len()))]
pub fn replace_highlights(
    pool: &DbPool,
    course_id: &str,
    user_id: &str,
    highlights: Vec<CourseHighlight>,
) -> Result<Vec<CourseHighlight>> {
    let conn = &mut pool.get()?;

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        diesel::delete(
            course_highlights::table
                .filter(course_highlights::course_id.eq(course_id))
                .filter(course_highlights::user_id.eq(user_id)),
        )
        .execute(conn)?;

        for highlight in &highlights {
            diesel::insert_into(course_highlights::table)
                .values(highlight.clone())
                .execute(conn)?;
        }
        Ok(())
    })?;

    info!("Replaced highlights for course {} ({} rows)", course_id, highlights.len());
    Ok(highlights)
}
