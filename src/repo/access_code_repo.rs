use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::db::DbPool;
use crate::models::{AccessCode, CodeRedemption};
use crate::schema::{access_codes, code_redemptions, users};

/// Why a redemption was refused.
///
/// Inactive, expired and exhausted codes share one variant on purpose:
/// they are all detected by the conditional increment matching zero
/// rows, and the client gets the same message for each.
#[derive(Error, Debug)]
pub enum RedeemError {
    #[error("Invalid activation code")]
    UnknownCode,

    #[error("This code has already been used on this account")]
    AlreadyRedeemed,

    #[error("This code is no longer valid")]
    NotRedeemable,

    #[error(transparent)]
    Db(#[from] anyhow::Error),
}

impl From<diesel::result::Error> for RedeemError {
    fn from(err: diesel::result::Error) -> Self {
        RedeemError::Db(err.into())
    }
}

/// Inserts a new activation code.
#[instrument(skip(pool, code), fields(code_id = %code.get_id(), max_uses = code.get_max_uses()))]
pub fn create_access_code(pool: &DbPool, code: AccessCode) -> Result<AccessCode> {
    let conn = &mut pool.get()?;
    diesel::insert_into(access_codes::table)
        .values(code.clone())
        .execute(conn)?;
    info!("Created access code {}", code.get_id());
    Ok(code)
}

/// Looks up a code by the string students type in.
#[instrument(skip(pool, code))]
pub fn get_access_code(pool: &DbPool, code: &str) -> Result<Option<AccessCode>> {
    let conn = &mut pool.get()?;
    let row = access_codes::table
        .filter(access_codes::code.eq(code))
        .select(AccessCode::as_select())
        .first(conn)
        .optional()?;
    Ok(row)
}

/// Redeems an activation code for a user, granting the AI features.
///
/// Runs entirely inside one transaction:
///
/// 1. resolve the code string (unknown → [`RedeemError::UnknownCode`]);
/// 2. reject a second redemption by the same user;
/// 3. conditionally increment the usage counter: the `UPDATE` only
///    matches while the code is active, unexpired and strictly under
///    `max_uses`, so two racing redemptions of the last remaining use
///    cannot both succeed;
/// 4. insert the redemption row and flip the user's AI-access flag.
#[instrument(skip(pool, code), fields(user_id = %user_id))]
pub fn redeem_code(pool: &DbPool, code: &str, user_id: &str) -> Result<(), RedeemError> {
    debug!("Redeeming access code");
    let conn = &mut pool.get().map_err(anyhow::Error::from)?;

    conn.transaction::<_, RedeemError, _>(|conn| {
        let row: Option<AccessCode> = access_codes::table
            .filter(access_codes::code.eq(code))
            .select(AccessCode::as_select())
            .first(conn)
            .optional()?;
        let row = row.ok_or(RedeemError::UnknownCode)?;

        let prior: Option<CodeRedemption> = code_redemptions::table
            .filter(code_redemptions::code_id.eq(row.get_id()))
            .filter(code_redemptions::user_id.eq(user_id))
            .select(CodeRedemption::as_select())
            .first(conn)
            .optional()?;
        if prior.is_some() {
            return Err(RedeemError::AlreadyRedeemed);
        }

        let now = Utc::now().naive_utc();
        let claimed = diesel::update(
            access_codes::table
                .filter(access_codes::id.eq(row.get_id()))
                .filter(access_codes::active.eq(true))
                .filter(access_codes::current_uses.lt(access_codes::max_uses))
                .filter(
                    access_codes::expires_at
                        .is_null()
                        .or(access_codes::expires_at.gt(now)),
                ),
        )
        .set(access_codes::current_uses.eq(access_codes::current_uses + 1))
        .execute(conn)?;

        if claimed == 0 {
            return Err(RedeemError::NotRedeemable);
        }

        diesel::insert_into(code_redemptions::table)
            .values(CodeRedemption::new(row.get_id(), user_id.to_string()))
            .execute(conn)?;

        diesel::update(users::table.filter(users::id.eq(user_id)))
            .set((users::ai_access.eq(true), users::updated_at.eq(now)))
            .execute(conn)?;

        Ok(())
    })?;

    info!("User {} redeemed an access code", user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::repo::tests::setup_test_db;
    use chrono::Duration;

    fn new_user(pool: &DbPool, email: &str) -> User {
        crate::repo::create_user(
            pool,
            User::new(email.to_string(), "hash".to_string(), "U".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn test_redeem_grants_ai_access() {
        let pool = setup_test_db();
        let user = new_user(&pool, "r@example.com");
        create_access_code(&pool, AccessCode::new("WELCOME".to_string(), 5, None)).unwrap();

        redeem_code(&pool, "WELCOME", &user.get_id()).unwrap();

        let stored = crate::repo::get_user(&pool, &user.get_id()).unwrap().unwrap();
        assert!(stored.has_ai_access());

        let code = get_access_code(&pool, "WELCOME").unwrap().unwrap();
        assert_eq!(code.get_current_uses(), 1);
    }

    #[test]
    fn test_second_redemption_by_same_user_fails() {
        let pool = setup_test_db();
        let user = new_user(&pool, "twice@example.com");
        create_access_code(&pool, AccessCode::new("ONCE".to_string(), 5, None)).unwrap();

        redeem_code(&pool, "ONCE", &user.get_id()).unwrap();
        let err = redeem_code(&pool, "ONCE", &user.get_id()).unwrap_err();
        assert!(matches!(err, RedeemError::AlreadyRedeemed));

        // The failed attempt must not consume a use.
        let code = get_access_code(&pool, "ONCE").unwrap().unwrap();
        assert_eq!(code.get_current_uses(), 1);
    }

    #[test]
    fn test_uses_are_exhausted_deterministically() {
        let pool = setup_test_db();
        create_access_code(&pool, AccessCode::new("LIMITED".to_string(), 3, None)).unwrap();

        for i in 0..3 {
            let user = new_user(&pool, &format!("u{i}@example.com"));
            redeem_code(&pool, "LIMITED", &user.get_id()).unwrap();
        }

        let loser = new_user(&pool, "late@example.com");
        let err = redeem_code(&pool, "LIMITED", &loser.get_id()).unwrap_err();
        assert!(matches!(err, RedeemError::NotRedeemable));

        let code = get_access_code(&pool, "LIMITED").unwrap().unwrap();
        assert_eq!(code.get_current_uses(), 3);
    }

    #[test]
    fn test_unknown_and_expired_codes_are_rejected() {
        let pool = setup_test_db();
        let user = new_user(&pool, "e@example.com");

        let err = redeem_code(&pool, "NOPE", &user.get_id()).unwrap_err();
        assert!(matches!(err, RedeemError::UnknownCode));

        create_access_code(
            &pool,
            AccessCode::new("OLD".to_string(), 5, Some(Utc::now() - Duration::days(1))),
        )
        .unwrap();
        let err = redeem_code(&pool, "OLD", &user.get_id()).unwrap_err();
        assert!(matches!(err, RedeemError::NotRedeemable));

        let stored = crate::repo::get_user(&pool, &user.get_id()).unwrap().unwrap();
        assert!(!stored.has_ai_access());
    }
}
