use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

/// An uploaded course document (or pasted text) owned by one user.
///
/// Exactly one of `file_path` and `text_content` is normally set at
/// creation; `edited_text` holds the student's edits or the reformatted
/// version and takes precedence when resolving content for generation.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = crate::schema::courses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Course {
    /// Unique identifier (UUID v4 as string)
    id: String,

    /// The owning user
    user_id: String,

    /// Display title ("titre" on the wire)
    title: String,

    description: Option<String>,

    /// Subject ("matiere" on the wire)
    subject: String,

    /// Target school year ("annee_cible" on the wire)
    target_year: String,

    /// Semantic document type ("type_document" on the wire)
    doc_type: String,

    /// Path of the stored file inside the uploads directory, if any
    file_path: Option<String>,

    /// The filename as uploaded, kept for extraction dispatch and streaming
    original_name: Option<String>,

    /// Inline text supplied instead of a file (paste or OCR result)
    text_content: Option<String>,

    /// User-edited or AI-reformatted version of the content
    edited_text: Option<String>,

    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl Course {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: String,
        title: String,
        description: Option<String>,
        subject: String,
        target_year: String,
        doc_type: String,
        file_path: Option<String>,
        original_name: Option<String>,
        text_content: Option<String>,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            title,
            description,
            subject,
            target_year,
            doc_type,
            file_path,
            original_name,
            text_content,
            edited_text: None,
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

    pub fn get_subject(&self) -> String {
        self.subject.clone()
    }

    pub fn get_file_path(&self) -> Option<String> {
        self.file_path.clone()
    }

    pub fn get_original_name(&self) -> Option<String> {
        self.original_name.clone()
    }

    pub fn get_text_content(&self) -> Option<String> {
        self.text_content.clone()
    }

    pub fn get_edited_text(&self) -> Option<String> {
        self.edited_text.clone()
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at.and_utc()
    }
}
