use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use tracing::{info, instrument};

use crate::db::DbPool;
use crate::models::{JsonValue, StudentProfile};
use crate::schema::student_profiles;

/// Inserts the onboarding profile for a user.
#[instrument(skip(pool, profile), fields(user_id = %profile.get_user_id()))]
pub fn create_profile(pool: &DbPool, profile: StudentProfile) -> Result<StudentProfile> {
    let conn = &mut pool.get()?;
    diesel::insert_into(student_profiles::table)
        .values(profile.clone())
        .execute(conn)?;
    info!("Created profile for user {}", profile.get_user_id());
    Ok(profile)
}

/// Retrieves a user's profile, if onboarding has been completed.
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn get_profile(pool: &DbPool, user_id: &str) -> Result<Option<StudentProfile>> {
    let conn = &mut pool.get()?;
    let profile = student_profiles::table
        .filter(student_profiles::user_id.eq(user_id))
        .select(StudentProfile::as_select())
        .first(conn)
        .optional()?;
    Ok(profile)
}

/// Overwrites every editable field of an existing profile.
///
/// ### Returns
///
/// The number of rows touched: zero when the user has no profile yet.
#[instrument(skip(pool, study_year, major, strengths, weaknesses, goals, difficulty_preference), fields(user_id = %user_id))]
#[allow(clippy::too_many_arguments)]
pub fn update_profile(
    pool: &DbPool,
    user_id: &str,
    study_year: &str,
    major: &str,
    strengths: &[String],
    weaknesses: &[String],
    goals: &[String],
    difficulty_preference: &str,
) -> Result<usize> {
    let conn = &mut pool.get()?;
    let updated = diesel::update(
        student_profiles::table.filter(student_profiles::user_id.eq(user_id)),
    )
    .set((
        student_profiles::study_year.eq(study_year),
        student_profiles::major.eq(major),
        student_profiles::strengths.eq(JsonValue::encode(&strengths)?),
        student_profiles::weaknesses.eq(JsonValue::encode(&weaknesses)?),
        student_profiles::goals.eq(JsonValue::encode(&goals)?),
        student_profiles::difficulty_preference.eq(difficulty_preference),
        student_profiles::updated_at.eq(Utc::now().naive_utc()),
    ))
    .execute(conn)?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::repo::tests::setup_test_db;

    #[test]
    fn test_profile_round_trip_and_update() {
        let pool = setup_test_db();
        let user = crate::repo::create_user(
            &pool,
            User::new("p@example.com".to_string(), "hash".to_string(), "P".to_string()),
        )
        .unwrap();

        let profile = StudentProfile::new(
            user.get_id(),
            "Terminale".to_string(),
            "Scientifique".to_string(),
            &["Maths".to_string()],
            &["Physique".to_string()],
            &["Mention bien".to_string()],
            "moyen".to_string(),
        )
        .unwrap();
        create_profile(&pool, profile).unwrap();

        let stored = get_profile(&pool, &user.get_id()).unwrap().unwrap();
        assert_eq!(stored.get_strengths().unwrap(), vec!["Maths".to_string()]);

        let touched = update_profile(
            &pool,
            &user.get_id(),
            "Licence 1",
            "Informatique",
            &[],
            &[],
            &["Valider l'année".to_string()],
            "difficile",
        )
        .unwrap();
        assert_eq!(touched, 1);

        let stored = get_profile(&pool, &user.get_id()).unwrap().unwrap();
        assert_eq!(stored.get_study_year(), "Licence 1");
        assert_eq!(stored.get_difficulty_preference(), "difficile");
    }

    #[test]
    fn test_update_without_profile_touches_nothing() {
        let pool = setup_test_db();
        let touched =
            update_profile(&pool, "nobody", "T", "M", &[], &[], &[], "moyen").unwrap();
        assert_eq!(touched, 0);
    }
}
