use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

/// A registered account.
///
/// The password hash never leaves the server: the struct serializes
/// without it, so handlers can return the model directly.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    /// Unique identifier (UUID v4 as string)
    id: String,

    /// Login email, unique across accounts
    email: String,

    /// bcrypt hash of the password
    #[serde(skip_serializing)]
    password_hash: String,

    /// Display name
    name: String,

    /// Whether the onboarding profile has been filled in
    onboarding_done: bool,

    /// Whether an activation code has been redeemed for the AI features
    ai_access: bool,

    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl User {
    /// Creates a new account with a pre-hashed password.
    pub fn new(email: String, password_hash: String, name: String) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            name,
            onboarding_done: false,
            ai_access: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_email(&self) -> String {
        self.email.clone()
    }

    pub fn get_password_hash(&self) -> String {
        self.password_hash.clone()
    }

    pub fn get_name(&self) -> String {
        self.name.clone()
    }

    pub fn is_onboarding_done(&self) -> bool {
        self.onboarding_done
    }

    pub fn has_ai_access(&self) -> bool {
        self.ai_access
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at.and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_omits_password_hash() {
        let user = User::new(
            "student@example.com".to_string(),
            "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            "Student".to_string(),
        );

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "student@example.com");
        assert_eq!(json["ai_access"], false);
    }
}
