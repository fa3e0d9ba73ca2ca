use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use uuid::Uuid;

/// Extensions accepted by the course upload endpoint. Legacy formats
/// (.doc, .ppt, .pptx) are stored and streamed back but have no text
/// extractor.
pub const ALLOWED_UPLOAD_EXTENSIONS: &[&str] = &["pdf", "docx", "doc", "txt", "ppt", "pptx"];

/// Handle on the local uploads directory.
///
/// Stored names are randomized UUIDs (keeping the original extension),
/// so concurrent uploads cannot collide; the original filename is
/// persisted on the course record instead.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Whether a filename's extension is accepted for upload.
    pub fn extension_allowed(name: &str) -> bool {
        extension_of(name)
            .map(|ext| ALLOWED_UPLOAD_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    /// Writes the uploaded bytes under a randomized name and returns
    /// the stored (relative) filename.
    #[instrument(skip(self, bytes), fields(original_name = %original_name, size = bytes.len()))]
    pub fn store(&self, original_name: &str, bytes: &[u8]) -> io::Result<String> {
        let stored_name = match extension_of(original_name) {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        fs::write(self.root.join(&stored_name), bytes)?;
        debug!("Stored upload as {}", stored_name);
        Ok(stored_name)
    }

    /// Absolute path of a stored file.
    pub fn path_of(&self, stored_name: &str) -> PathBuf {
        self.root.join(stored_name)
    }

    pub fn read(&self, stored_name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path_of(stored_name))
    }

    pub fn remove(&self, stored_name: &str) -> io::Result<()> {
        fs::remove_file(self.path_of(stored_name))
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// MIME type for streaming a stored course file, computed from the
/// original filename's extension.
pub fn content_type_for(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("doc") => "application/msword",
        Some("txt") => "text/plain",
        Some("ppt") => "application/vnd.ms-powerpoint",
        Some("pptx") => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}
