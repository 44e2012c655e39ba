use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use zolapad_core::WatchError;
use zolapad_project::WorkspaceRoot;
use zolapad_runexec::RunError;

/// 預覽資源建立失敗。 / Failures while creating or driving preview resources.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("preview server: {0}")]
    Server(#[from] RunError),
    #[error("failed to write preview surface {path}: {source}")]
    Surface {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("document watch: {0}")]
    Watch(#[from] WatchError),
}

/// Options applied when the render surface is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceOptions {
    /// Whether scripts may run inside the displayed page.
    pub enable_scripts: bool,
}

/// 長駐的預覽伺服器程序。 / Long-running preview server process.
///
/// Fire and forget: its output is not read and its exit is not observed.
pub trait ServerProcess {
    fn shutdown(self: Box<Self>);
}

/// 顯示預覽頁面的表面。 / Display area showing the rendered preview.
///
/// Created once; its content is rewritten in place.
pub trait RenderSurface {
    fn set_html(&mut self, html: &str) -> Result<(), PreviewError>;
}

/// 單一文件的監看。 / Watch on one document path.
pub trait DocumentWatch {
    fn path(&self) -> &Path;
    fn stop(self: Box<Self>);
}

/// 建立預覽資源的工廠。 / Creates the resources a preview session owns.
pub trait PreviewBackend {
    /// Starts one process and sends it `cd <root>` followed by `serve_command`.
    fn launch_server(
        &mut self,
        root: &WorkspaceRoot,
        serve_command: &str,
    ) -> Result<Box<dyn ServerProcess>, PreviewError>;

    fn create_surface(
        &mut self,
        options: SurfaceOptions,
    ) -> Result<Box<dyn RenderSurface>, PreviewError>;

    fn watch_document(&mut self, path: &Path) -> Result<Box<dyn DocumentWatch>, PreviewError>;
}
