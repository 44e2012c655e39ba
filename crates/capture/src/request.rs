use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime, Timelike};
use zolapad_core::is_content_document;
use zolapad_project::{resolve_workspace_root, WorkspaceRoot};

use crate::platform::Platform;

/// `YYYY-MM-DD-hh-mm-ss.png` for the given wall-clock reading.  
/// 依時間產生圖片檔名。
///
/// Second resolution only; two captures in the same second share a name.
pub fn capture_file_name(now: NaiveDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02}-{:02}-{:02}-{:02}.png",
        now.year(),
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// 一次擷取要求。 / One capture, decided before any process runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub platform: Platform,
    /// Site the document belongs to.
    pub root: WorkspaceRoot,
    pub file_name: String,
    pub target_dir: PathBuf,
}

impl CaptureRequest {
    /// Builds the request for pasting into `document`.
    ///
    /// Returns `None` when `document` is not a content document or lies
    /// outside every known site root; pasting an image there is simply not
    /// applicable.
    pub fn for_document(
        platform: Platform,
        document: &Path,
        known_roots: &[WorkspaceRoot],
        now: NaiveDateTime,
        extension: &str,
    ) -> Option<Self> {
        if !is_content_document(document, extension) {
            return None;
        }
        let Some(root) = resolve_workspace_root(document, known_roots) else {
            log::debug!("{} is outside every known site", document.display());
            return None;
        };
        let target_dir = document.parent()?.to_path_buf();
        Some(Self {
            platform,
            root,
            file_name: capture_file_name(now),
            target_dir,
        })
    }

    /// Absolute path the image is asked to be written to.
    pub fn image_path(&self) -> PathBuf {
        self.target_dir.join(&self.file_name)
    }
}
