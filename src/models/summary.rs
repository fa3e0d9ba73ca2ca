use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

/// A generated or hand-written summary.
///
/// `source_course_title` is a denormalized copy of the course title at
/// creation time, not a live reference; it survives course deletion.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = crate::schema::summaries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Summary {
    id: String,
    user_id: String,
    course_id: Option<String>,
    title: String,
    content: String,
    source_course_title: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl Summary {
    pub fn new(
        user_id: String,
        course_id: Option<String>,
        title: String,
        content: String,
        source_course_title: Option<String>,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            course_id,
            title,
            content,
            source_course_title,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_user_id(&self) -> String {
        self.user_id.clone()
    }

    pub fn get_title(&self) -> String {
        self.title.clone()
    }

    pub fn get_content(&self) -> String {
        self.content.clone()
    }

    pub fn get_source_course_title(&self) -> Option<String> {
        self.source_course_title.clone()
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at.and_utc()
    }
}
