use std::fs;
use std::io;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths::CONTENT_DIR;
use crate::util::write_atomic;

/// Root directory of a Zola site project.  
/// Zola 網站專案的根目錄。
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceRoot(PathBuf);

impl WorkspaceRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Directory holding authored documents (`<root>/content`).  
    /// 文章所在的內容目錄。
    pub fn content_root(&self) -> PathBuf {
        self.0.join(CONTENT_DIR)
    }

    /// Returns whether `document` lives somewhere below this root.
    pub fn contains(&self, document: &Path) -> bool {
        document.starts_with(&self.0)
    }
}

/// Selects the known root that contains `document`; the longest root wins.  
/// 從已知根目錄中挑出包含文件者，取最長者。
///
/// Matching is done per path component, so `/site` does not claim
/// `/site-old/content/post.md`. `None` means the document is outside every
/// recognized project.
pub fn resolve_workspace_root<'a, I>(document: &Path, known_roots: I) -> Option<WorkspaceRoot>
where
    I: IntoIterator<Item = &'a WorkspaceRoot>,
{
    known_roots
        .into_iter()
        .filter(|root| root.contains(document))
        .max_by_key(|root| root.path().components().count())
        .cloned()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct WorkspaceIndexFile {
    #[serde(default)]
    roots: Vec<WorkspaceRoot>,
}

/// Errors raised by workspace registry persistence.  
/// 工作區清單儲存相關的錯誤。
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("workspace IO error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid workspace index {path}: {reason}")]
    InvalidIndex { path: PathBuf, reason: String },
    #[error("workspace root {0} is not a directory")]
    NotADirectory(PathBuf),
}

/// Persisted list of known site roots (`workspaces.json`).  
/// 已知網站根目錄的持久化清單。
#[derive(Debug)]
pub struct WorkspaceRegistry {
    index_path: PathBuf,
    roots: Vec<WorkspaceRoot>,
}

impl WorkspaceRegistry {
    /// File name used inside the configuration directory.
    pub const INDEX_FILE: &'static str = "workspaces.json";

    /// Creates an in-memory registry that saves to `index_path`.
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            roots: Vec::new(),
        }
    }

    /// Loads the registry; a missing index yields an empty registry.  
    /// 載入清單；檔案不存在時回傳空清單。
    pub fn load(index_path: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let index_path = index_path.into();
        let roots = match fs::read_to_string(&index_path) {
            Ok(contents) => serde_json::from_str::<WorkspaceIndexFile>(&contents)
                .map(|file| file.roots)
                .map_err(|err| WorkspaceError::InvalidIndex {
                    path: index_path.clone(),
                    reason: err.to_string(),
                })?,
            Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(WorkspaceError::Io(err)),
        };
        Ok(Self { index_path, roots })
    }

    pub fn roots(&self) -> &[WorkspaceRoot] {
        &self.roots
    }

    /// Registers a root if it is not already known. Returns `true` when added.  
    /// 加入新的根目錄（已存在則略過）。
    pub fn add(&mut self, root: impl Into<PathBuf>) -> Result<bool, WorkspaceError> {
        let path = root.into();
        if !path.is_dir() {
            return Err(WorkspaceError::NotADirectory(path));
        }
        let root = WorkspaceRoot::new(path);
        if self.roots.contains(&root) {
            return Ok(false);
        }
        self.roots.push(root);
        Ok(true)
    }

    pub fn remove(&mut self, root: &Path) -> bool {
        let before = self.roots.len();
        self.roots.retain(|known| known.path() != root);
        before != self.roots.len()
    }

    /// Resolves the workspace root of `document` against the known roots.
    pub fn resolve(&self, document: &Path) -> Option<WorkspaceRoot> {
        resolve_workspace_root(document, &self.roots)
    }

    pub fn save(&self) -> Result<(), WorkspaceError> {
        let file = WorkspaceIndexFile {
            roots: self.roots.clone(),
        };
        let json =
            serde_json::to_vec_pretty(&file).map_err(|err| WorkspaceError::InvalidIndex {
                path: self.index_path.clone(),
                reason: err.to_string(),
            })?;
        write_atomic(&self.index_path, &json)?;
        log::debug!("saved {} workspace roots", self.roots.len());
        Ok(())
    }
}
