//! 即時預覽工作階段。 / Live preview session for a Zola site.

mod backend;
mod server;
mod session;
mod surface;
mod system;

pub use backend::{
    DocumentWatch, PreviewBackend, PreviewError, RenderSurface, ServerProcess, SurfaceOptions,
};
pub use server::ShellServer;
pub use session::{PreviewConfig, PreviewManager, SessionState, SkipReason, StartOutcome};
pub use surface::{render_preview_html, HtmlFileSurface, SURFACE_FILE_NAME};
pub use system::SystemBackend;
