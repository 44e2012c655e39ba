//! Workspace resolution, content paths and post scaffolding for ZolaPad.
//! 工作區解析、內容路徑與新文章建立。

mod util;

pub mod paths;
pub mod scaffold;
pub mod workspace;

pub use paths::{
    build_preview_url, content_relative_dir, image_reference, markdown_image,
    ContentRelativePath, CONTENT_DIR, PREVIEW_BASE_URL,
};
pub use scaffold::{new_post, post_front_matter, ScaffoldError, ScaffoldOutcome};
pub use workspace::{resolve_workspace_root, WorkspaceError, WorkspaceRegistry, WorkspaceRoot};
