use std::env;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;

use zolapad_core::{PollingDocumentWatch, WatchEvent, DEFAULT_POLL_INTERVAL};
use zolapad_project::WorkspaceRoot;
use zolapad_runexec::{OutputMode, ShellKind};

use crate::backend::{
    DocumentWatch, PreviewBackend, PreviewError, RenderSurface, ServerProcess, SurfaceOptions,
};
use crate::server::ShellServer;
use crate::surface::{HtmlFileSurface, SURFACE_FILE_NAME};

impl DocumentWatch for PollingDocumentWatch {
    fn path(&self) -> &Path {
        PollingDocumentWatch::path(self)
    }

    fn stop(self: Box<Self>) {
        PollingDocumentWatch::stop(*self);
    }
}

/// 實際執行環境的預覽後端。 / Backend wiring the preview to real processes and files.
#[derive(Debug, Clone)]
pub struct SystemBackend {
    surface_path: PathBuf,
    poll_interval: Duration,
    shell: ShellKind,
    output: OutputMode,
    events: Sender<WatchEvent>,
}

impl SystemBackend {
    /// Watch events are delivered to `events`; the host drains the receiver.
    pub fn new(events: Sender<WatchEvent>) -> Self {
        Self {
            surface_path: env::temp_dir().join(SURFACE_FILE_NAME),
            poll_interval: DEFAULT_POLL_INTERVAL,
            shell: ShellKind::native(),
            output: OutputMode::Inherit,
            events,
        }
    }

    pub fn with_surface_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.surface_path = path.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_shell(mut self, shell: ShellKind) -> Self {
        self.shell = shell;
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn surface_path(&self) -> &Path {
        &self.surface_path
    }
}

impl PreviewBackend for SystemBackend {
    fn launch_server(
        &mut self,
        root: &WorkspaceRoot,
        serve_command: &str,
    ) -> Result<Box<dyn ServerProcess>, PreviewError> {
        let server = ShellServer::launch(self.shell, self.output, root, serve_command)?;
        Ok(Box::new(server))
    }

    fn create_surface(
        &mut self,
        options: SurfaceOptions,
    ) -> Result<Box<dyn RenderSurface>, PreviewError> {
        log::info!(
            "preview page: {} (scripts {})",
            self.surface_path.display(),
            if options.enable_scripts { "enabled" } else { "disabled" }
        );
        Ok(Box::new(HtmlFileSurface::new(&self.surface_path)))
    }

    fn watch_document(&mut self, path: &Path) -> Result<Box<dyn DocumentWatch>, PreviewError> {
        let watch = PollingDocumentWatch::start(path, self.poll_interval, self.events.clone())?;
        Ok(Box::new(watch))
    }
}
