use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

/// A redeemable activation code for the AI features.
///
/// Codes are global: any user may redeem one until `current_uses`
/// reaches `max_uses`, the code is deactivated, or it expires. The
/// counter is only ever advanced through the conditional update in the
/// redemption transaction.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = crate::schema::access_codes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccessCode {
    id: String,

    /// The code string students type in
    code: String,

    active: bool,
    max_uses: i32,
    current_uses: i32,
    expires_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
}

impl AccessCode {
    pub fn new(code: String, max_uses: i32, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            code,
            active: true,
            max_uses,
            current_uses: 0,
            expires_at: expires_at.map(|dt| dt.naive_utc()),
            created_at: Utc::now().naive_utc(),
        }
    }

    /// Mints a random alphanumeric code string.
    pub fn random_code(len: usize) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect::<String>()
            .to_uppercase()
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_code(&self) -> String {
        self.code.clone()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn get_max_uses(&self) -> i32 {
        self.max_uses
    }

    pub fn get_current_uses(&self) -> i32 {
        self.current_uses
    }

    pub fn get_expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at.map(|dt| dt.and_utc())
    }
}

/// A one-time (user, code) pairing recording a successful redemption.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = crate::schema::code_redemptions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CodeRedemption {
    id: String,
    code_id: String,
    user_id: String,
    redeemed_at: NaiveDateTime,
}

impl CodeRedemption {
    pub fn new(code_id: String, user_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            code_id,
            user_id,
            redeemed_at: Utc::now().naive_utc(),
        }
    }

    pub fn get_code_id(&self) -> String {
        self.code_id.clone()
    }

    pub fn get_user_id(&self) -> String {
        self.user_id.clone()
    }
}
