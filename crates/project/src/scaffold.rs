use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::util::write_atomic;
use crate::workspace::WorkspaceRoot;

/// 建立新文章時的錯誤。 / Errors raised while scaffolding a post.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("failed to write post {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 建立結果。 / Result of [`new_post`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaffoldOutcome {
    Created(PathBuf),
    /// The post already existed and was left untouched.
    Existing(PathBuf),
}

impl ScaffoldOutcome {
    pub fn path(&self) -> &PathBuf {
        match self {
            ScaffoldOutcome::Created(path) | ScaffoldOutcome::Existing(path) => path,
        }
    }
}

/// TOML front matter for a post dated `date`.
pub fn post_front_matter(date: NaiveDate) -> String {
    let date = date.format("%Y-%m-%d");
    format!("+++\ntitle=\"{date}\"\ndate={date}\n+++\n")
}

/// 建立 `<root>/content/<yyyy-mm-dd>/index.md`。 / Creates the post bundle for `date`.
pub fn new_post(root: &WorkspaceRoot, date: NaiveDate) -> Result<ScaffoldOutcome, ScaffoldError> {
    let path = root
        .content_root()
        .join(date.format("%Y-%m-%d").to_string())
        .join("index.md");
    if path.exists() {
        return Ok(ScaffoldOutcome::Existing(path));
    }
    write_atomic(&path, post_front_matter(date).as_bytes()).map_err(|source| {
        ScaffoldError::Write {
            path: path.clone(),
            source,
        }
    })?;
    log::info!("created post {}", path.display());
    Ok(ScaffoldOutcome::Created(path))
}
