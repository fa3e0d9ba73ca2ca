use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

/// A highlighted span of course text.
///
/// Highlights have no identity across saves: the client always sends
/// the full set and the stored rows are replaced wholesale.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = crate::schema::course_highlights)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CourseHighlight {
    id: String,
    course_id: String,
    user_id: String,

    /// The highlighted text itself
    text: String,

    /// Display color chosen by the client
    color: String,

    start_offset: i32,
    end_offset: i32,

    /// Page number for paginated documents
    page: Option<i32>,

    created_at: NaiveDateTime,
}

impl CourseHighlight {
    pub fn new(
        course_id: String,
        user_id: String,
        text: String,
        color: String,
        start_offset: i32,
        end_offset: i32,
        page: Option<i32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            course_id,
            user_id,
            text,
            color,
            start_offset,
            end_offset,
            page,
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_course_id(&self) -> String {
        self.course_id.clone()
    }

    pub fn get_text(&self) -> String {
        self.text.clone()
    }

    pub fn get_color(&self) -> String {
        self.color.clone()
    }

    pub fn get_offsets(&self) -> (i32, i32) {
        (self.start_offset, self.end_offset)
    }

    pub fn get_page(&self) -> Option<i32> {
        self.page
    }
}
