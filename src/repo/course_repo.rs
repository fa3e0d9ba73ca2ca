use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

use crate::db::DbPool;
use crate::models::Course;
use crate::schema::{course_highlights, courses, flashcard_sets, quiz_attempts, quizzes};

/// Inserts a new course record.
#[instrument(skip(pool, course), fields(course_id = %course.get_id(), user_id = %course.get_user_id()))]
pub fn create_course(pool: &DbPool, course: Course) -> Result<Course> {
    debug!("Creating new course");
    let conn = &mut pool.get()?;
    diesel::insert_into(courses::table)
        .values(course.clone())
        .execute(conn)?;
    info!("Created course {}", course.get_id());
    Ok(course)
}

/// Retrieves a course scoped to its owner.
///
/// A course that exists but belongs to somebody else comes back as
/// `None`, indistinguishable from a missing row.
#[instrument(skip(pool), fields(course_id = %course_id, user_id = %user_id))]
pub fn get_course(pool: &DbPool, course_id: &str, user_id: &str) -> Result<Option<Course>> {
    let conn = &mut pool.get()?;
    let course = courses::table
        .filter(courses::id.eq(course_id))
        .filter(courses::user_id.eq(user_id))
        .select(Course::as_select())
        .first(conn)
        .optional()?;
    Ok(course)
}

/// Lists a user's courses, newest first.
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn list_courses(pool: &DbPool, user_id: &str, limit: i64, offset: i64) -> Result<Vec<Course>> {
    let conn = &mut pool.get()?;
    let list = courses::table
        .filter(courses::user_id.eq(user_id))
        .order(courses::created_at.desc())
        .limit(limit)
        .offset(offset)
        .select(Course::as_select())
        .load(conn)?;
    Ok(list)
}

/// Stores the edited (or AI-reformatted) version of the content.
#[instrument(skip(pool, content), fields(course_id = %course_id, user_id = %user_id))]
pub fn update_edited_text(
    pool: &DbPool,
    course_id: &str,
    user_id: &str,
    content: &str,
) -> Result<usize> {
    let conn = &mut pool.get()?;
    let updated = diesel::update(
        courses::table
            .filter(courses::id.eq(course_id))
            .filter(courses::user_id.eq(user_id)),
    )
    .set((
        courses::edited_text.eq(content),
        courses::updated_at.eq(Utc::now().naive_utc()),
    ))
    .execute(conn)?;
    Ok(updated)
}

/// Deletes a course and its dependent rows.
///
/// Quizzes derived from the course go with it (attempts first), as do
/// flashcard sets and highlights. Summaries survive: they only carry a
/// denormalized copy of the course title. The stored file is removed by
/// the caller, outside the transaction.
#[instrument(skip(pool), fields(course_id = %course_id, user_id = %user_id))]
pub fn delete_course_cascade(pool: &DbPool, course_id: &str, user_id: &str) -> Result<usize> {
    debug!("Deleting course and dependents");
    let conn = &mut pool.get()?;

    let deleted = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let quiz_ids: Vec<String> = quizzes::table
            .filter(quizzes::course_id.eq(course_id))
            .filter(quizzes::user_id.eq(user_id))
            .select(quizzes::id)
            .load(conn)?;

        diesel::delete(quiz_attempts::table.filter(quiz_attempts::quiz_id.eq_any(&quiz_ids)))
            .execute(conn)?;
        diesel::delete(quizzes::table.filter(quizzes::id.eq_any(&quiz_ids))).execute(conn)?;
        diesel::delete(
            flashcard_sets::table
                .filter(flashcard_sets::course_id.eq(course_id))
                .filter(flashcard_sets::user_id.eq(user_id)),
        )
        .execute(conn)?;
        diesel::delete(
            course_highlights::table
                .filter(course_highlights::course_id.eq(course_id))
                .filter(course_highlights::user_id.eq(user_id)),
        )
        .execute(conn)?;

        let deleted = diesel::delete(
            courses::table
                .filter(courses::id.eq(course_id))
                .filter(courses::user_id.eq(user_id)),
        )
        .execute(conn)?;
        Ok(deleted)
    })?;

    info!("Deleted course {} ({} row)", course_id, deleted);
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::repo::tests::setup_test_db;

    fn user(pool: &DbPool, email: &str) -> User {
        crate::repo::create_user(
            pool,
            User::new(email.to_string(), "hash".to_string(), "U".to_string()),
        )
        .unwrap()
    }

    fn course(owner: &User) -> Course {
        Course::new(
            owner.get_id(),
            "Optique".to_string(),
            Some("Chapitre 3".to_string()),
            "Physique".to_string(),
            "Première".to_string(),
            "cours".to_string(),
            None,
            None,
            Some("La lumière se propage en ligne droite.".to_string()),
        )
    }

    #[test]
    fn test_owner_scoping_hides_foreign_courses() {
        let pool = setup_test_db();
        let alice = user(&pool, "alice@example.com");
        let bob = user(&pool, "bob@example.com");

        let stored = create_course(&pool, course(&alice)).unwrap();

        assert!(get_course(&pool, &stored.get_id(), &alice.get_id())
            .unwrap()
            .is_some());
        assert!(get_course(&pool, &stored.get_id(), &bob.get_id())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_list_is_paginated() {
        let pool = setup_test_db();
        let owner = user(&pool, "list@example.com");
        for _ in 0..5 {
            create_course(&pool, course(&owner)).unwrap();
        }

        assert_eq!(list_courses(&pool, &owner.get_id(), 3, 0).unwrap().len(), 3);
        assert_eq!(list_courses(&pool, &owner.get_id(), 3, 3).unwrap().len(), 2);
    }

    #[test]
    fn test_cascade_delete_takes_derived_quizzes() {
        let pool = setup_test_db();
        let owner = user(&pool, "cascade@example.com");
        let stored = create_course(&pool, course(&owner)).unwrap();

        let quiz = crate::repo::create_quiz(
            &pool,
            crate::models::Quiz::new(
                owner.get_id(),
                Some(stored.get_id()),
                "Quiz d'optique".to_string(),
                "moyen".to_string(),
                &crate::llm::mock::sample_questions(),
            )
            .unwrap(),
        )
        .unwrap();

        delete_course_cascade(&pool, &stored.get_id(), &owner.get_id()).unwrap();

        assert!(get_course(&pool, &stored.get_id(), &owner.get_id())
            .unwrap()
            .is_none());
        assert!(crate::repo::get_quiz(&pool, &quiz.get_id(), &owner.get_id())
            .unwrap()
            .is_none());
    }
}
