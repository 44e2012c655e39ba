use std::path::Path;

use zolapad_core::{is_content_document, WatchEvent, DEFAULT_DOCUMENT_EXTENSION};
use zolapad_project::{
    build_preview_url, content_relative_dir, resolve_workspace_root, WorkspaceRoot,
    PREVIEW_BASE_URL,
};

use crate::backend::{
    DocumentWatch, PreviewBackend, PreviewError, RenderSurface, ServerProcess, SurfaceOptions,
};
use crate::surface::render_preview_html;

/// 預覽工作階段狀態。 / Lifecycle state of the preview session.
///
/// There is no stopped state: once active, the session lives until the host
/// shuts down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Active,
}

/// 略過啟動的原因。 / Why a start request was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoDocument,
    NotContentDocument,
    NoWorkspaceRoot,
}

/// 啟動預覽的結果。 / Outcome of a start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { url: String },
    AlreadyActive,
    Skipped(SkipReason),
}

/// 預覽管理器的設定。 / Settings the manager reads on each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewConfig {
    pub serve_command: String,
    pub document_extension: String,
    pub base_url: String,
    /// When false the page forbids scripts and sandboxes the frame.
    pub enable_scripts: bool,
}

impl PreviewConfig {
    pub fn surface_options(&self) -> SurfaceOptions {
        SurfaceOptions {
            enable_scripts: self.enable_scripts,
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            serve_command: "zola serve".to_string(),
            document_extension: DEFAULT_DOCUMENT_EXTENSION.to_string(),
            base_url: PREVIEW_BASE_URL.to_string(),
            enable_scripts: true,
        }
    }
}

struct ActiveWatch {
    handle: Box<dyn DocumentWatch>,
    url: String,
}

/// 預覽工作階段管理器。 / Owns the single preview session of the host.
///
/// All entry points run on the host thread; watch events reach
/// [`PreviewManager::on_watch_event`] through the host's event queue.
pub struct PreviewManager<B: PreviewBackend> {
    backend: B,
    config: PreviewConfig,
    roots: Vec<WorkspaceRoot>,
    state: SessionState,
    server: Option<Box<dyn ServerProcess>>,
    surface: Option<Box<dyn RenderSurface>>,
    watch: Option<ActiveWatch>,
    displayed_url: Option<String>,
}

impl<B: PreviewBackend> PreviewManager<B> {
    pub fn new(backend: B, config: PreviewConfig, roots: Vec<WorkspaceRoot>) -> Self {
        Self {
            backend,
            config,
            roots,
            state: SessionState::Idle,
            server: None,
            surface: None,
            watch: None,
            displayed_url: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// URL shown by the latest rewrite.
    pub fn displayed_url(&self) -> Option<&str> {
        self.displayed_url.as_deref()
    }

    /// Document the active watch observes.
    pub fn watched_path(&self) -> Option<&Path> {
        self.watch.as_ref().map(|watch| watch.handle.path())
    }

    /// URL captured when the active watch was installed.
    pub fn watched_url(&self) -> Option<&str> {
        self.watch.as_ref().map(|watch| watch.url.as_str())
    }

    /// 啟動預覽。 / Starts the preview for the active document.
    ///
    /// Creates the server, then the surface, then the watch. A failure part way
    /// releases what was already created and leaves the manager idle.
    pub fn start(&mut self, active_document: Option<&Path>) -> Result<StartOutcome, PreviewError> {
        if self.surface.is_some() {
            log::debug!("preview already active");
            return Ok(StartOutcome::AlreadyActive);
        }
        let Some(document) = active_document else {
            return Ok(StartOutcome::Skipped(SkipReason::NoDocument));
        };
        if !is_content_document(document, &self.config.document_extension) {
            return Ok(StartOutcome::Skipped(SkipReason::NotContentDocument));
        }
        let Some(root) = resolve_workspace_root(document, &self.roots) else {
            return Ok(StartOutcome::Skipped(SkipReason::NoWorkspaceRoot));
        };

        self.state = SessionState::Starting;
        let url = self.url_for(&root, document);
        match self.bring_up(&root, document, &url) {
            Ok(()) => {
                self.state = SessionState::Active;
                log::info!("preview started for {} at {url}", document.display());
                Ok(StartOutcome::Started { url })
            }
            Err(err) => {
                self.teardown();
                Err(err)
            }
        }
    }

    fn bring_up(
        &mut self,
        root: &WorkspaceRoot,
        document: &Path,
        url: &str,
    ) -> Result<(), PreviewError> {
        let server = self.backend.launch_server(root, &self.config.serve_command)?;
        self.server = Some(server);

        let surface = self
            .backend
            .create_surface(self.config.surface_options())?;
        self.surface = Some(surface);
        self.render(url)?;

        self.install_watch(document, url.to_string())
    }

    /// 作用中文件切換時更新預覽。 / Follows the editor to a newly active document.
    ///
    /// The watch stays on the document it was created for. Returns whether the
    /// surface was rewritten.
    pub fn on_active_document_changed(&mut self, document: &Path) -> Result<bool, PreviewError> {
        if self.surface.is_none() {
            return Ok(false);
        }
        let Some(root) = resolve_workspace_root(document, &self.roots) else {
            log::debug!("{} is outside every known site", document.display());
            return Ok(false);
        };
        let url = self.url_for(&root, document);
        self.render(&url)?;
        Ok(true)
    }

    /// 文件儲存時重新整理預覽。 / Refreshes the surface when the watched document is saved.
    ///
    /// Uses the URL captured when the watch was installed, even if the editor
    /// has since moved to another document.
    pub fn on_document_saved(&mut self, path: &Path) -> Result<bool, PreviewError> {
        if !is_content_document(path, &self.config.document_extension) {
            return Ok(false);
        }
        let Some(url) = self.watch.as_ref().map(|watch| watch.url.clone()) else {
            return Ok(false);
        };
        self.render(&url)?;
        Ok(true)
    }

    pub fn on_watch_event(&mut self, event: &WatchEvent) -> Result<bool, PreviewError> {
        self.on_document_saved(&event.path)
    }

    fn url_for(&self, root: &WorkspaceRoot, document: &Path) -> String {
        let dir = content_relative_dir(root, document);
        build_preview_url(&self.config.base_url, &dir)
    }

    fn render(&mut self, url: &str) -> Result<(), PreviewError> {
        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };
        let html = render_preview_html(url, rand::random::<u64>(), self.config.surface_options());
        surface.set_html(&html)?;
        self.displayed_url = Some(url.to_string());
        Ok(())
    }

    fn install_watch(&mut self, document: &Path, url: String) -> Result<(), PreviewError> {
        if let Some(previous) = self.watch.take() {
            previous.handle.stop();
        }
        let handle = self.backend.watch_document(document)?;
        self.watch = Some(ActiveWatch { handle, url });
        Ok(())
    }

    /// 主程式結束時釋放資源。 / Releases everything when the host exits.
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(watch) = self.watch.take() {
            watch.handle.stop();
        }
        if let Some(server) = self.server.take() {
            server.shutdown();
        }
        self.surface = None;
        self.displayed_url = None;
        self.state = SessionState::Idle;
    }
}

impl<B: PreviewBackend> Drop for PreviewManager<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io;
    use std::path::PathBuf;
    use std::rc::Rc;

    use zolapad_core::WatchEventKind;

    #[derive(Debug, Default)]
    struct Journal {
        servers: Vec<(PathBuf, String)>,
        surfaces: Vec<SurfaceOptions>,
        pages: Vec<String>,
        watches: Vec<PathBuf>,
        unwatched: Vec<PathBuf>,
        killed: usize,
        order: Vec<&'static str>,
    }

    #[derive(Clone, Default)]
    struct RecordingBackend {
        journal: Rc<RefCell<Journal>>,
        fail_surface: bool,
    }

    struct RecordingServer(Rc<RefCell<Journal>>);

    impl ServerProcess for RecordingServer {
        fn shutdown(self: Box<Self>) {
            self.0.borrow_mut().killed += 1;
        }
    }

    struct RecordingSurface(Rc<RefCell<Journal>>);

    impl RenderSurface for RecordingSurface {
        fn set_html(&mut self, html: &str) -> Result<(), PreviewError> {
            self.0.borrow_mut().pages.push(html.to_string());
            Ok(())
        }
    }

    struct RecordingWatch {
        journal: Rc<RefCell<Journal>>,
        path: PathBuf,
    }

    impl DocumentWatch for RecordingWatch {
        fn path(&self) -> &Path {
            &self.path
        }

        fn stop(self: Box<Self>) {
            self.journal.borrow_mut().unwatched.push(self.path.clone());
        }
    }

    impl PreviewBackend for RecordingBackend {
        fn launch_server(
            &mut self,
            root: &WorkspaceRoot,
            serve_command: &str,
        ) -> Result<Box<dyn ServerProcess>, PreviewError> {
            let mut journal = self.journal.borrow_mut();
            journal
                .servers
                .push((root.path().to_path_buf(), serve_command.to_string()));
            journal.order.push("server");
            Ok(Box::new(RecordingServer(self.journal.clone())))
        }

        fn create_surface(
            &mut self,
            options: SurfaceOptions,
        ) -> Result<Box<dyn RenderSurface>, PreviewError> {
            if self.fail_surface {
                return Err(PreviewError::Surface {
                    path: PathBuf::from("/nowhere/preview.html"),
                    source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            let mut journal = self.journal.borrow_mut();
            journal.surfaces.push(options);
            journal.order.push("surface");
            Ok(Box::new(RecordingSurface(self.journal.clone())))
        }

        fn watch_document(&mut self, path: &Path) -> Result<Box<dyn DocumentWatch>, PreviewError> {
            let mut journal = self.journal.borrow_mut();
            journal.watches.push(path.to_path_buf());
            journal.order.push("watch");
            Ok(Box::new(RecordingWatch {
                journal: self.journal.clone(),
                path: path.to_path_buf(),
            }))
        }
    }

    fn site() -> WorkspaceRoot {
        WorkspaceRoot::new("/sites/blog")
    }

    fn manager() -> (PreviewManager<RecordingBackend>, Rc<RefCell<Journal>>) {
        let backend = RecordingBackend::default();
        let journal = backend.journal.clone();
        let manager = PreviewManager::new(backend, PreviewConfig::default(), vec![site()]);
        (manager, journal)
    }

    fn iframe_src(page: &str) -> &str {
        let start = page.find("<iframe src=\"").expect("iframe") + "<iframe src=\"".len();
        let end = start + page[start..].find('"').expect("closing quote");
        &page[start..end]
    }

    #[test]
    fn start_creates_server_surface_and_watch_in_order() {
        let (mut manager, journal) = manager();
        let document = Path::new("/sites/blog/content/posts/hello/index.md");

        let outcome = manager.start(Some(document)).unwrap();
        assert_eq!(
            outcome,
            StartOutcome::Started {
                url: "http://localhost:1111/posts/hello".into()
            }
        );
        assert_eq!(manager.state(), SessionState::Active);

        let journal = journal.borrow();
        assert_eq!(journal.order, vec!["server", "surface", "watch"]);
        assert_eq!(
            journal.servers,
            vec![(PathBuf::from("/sites/blog"), "zola serve".to_string())]
        );
        assert_eq!(
            journal.surfaces,
            vec![SurfaceOptions {
                enable_scripts: true
            }]
        );
        assert_eq!(journal.watches, vec![document.to_path_buf()]);
        assert_eq!(iframe_src(&journal.pages[0]), "http://localhost:1111/posts/hello");
    }

    #[test]
    fn disabled_scripts_reach_surface_and_every_page() {
        let backend = RecordingBackend::default();
        let journal = backend.journal.clone();
        let config = PreviewConfig {
            enable_scripts: false,
            ..PreviewConfig::default()
        };
        let mut manager = PreviewManager::new(backend, config, vec![site()]);

        manager
            .start(Some(Path::new("/sites/blog/content/a/index.md")))
            .unwrap();
        manager
            .on_active_document_changed(Path::new("/sites/blog/content/b/index.md"))
            .unwrap();

        let journal = journal.borrow();
        assert_eq!(
            journal.surfaces,
            vec![SurfaceOptions {
                enable_scripts: false
            }]
        );
        assert_eq!(journal.pages.len(), 2);
        for page in &journal.pages {
            assert!(page.contains("script-src 'none'"));
            assert!(page.contains("sandbox=\"allow-same-origin\""));
        }
    }

    #[test]
    fn second_start_keeps_single_surface_and_watch() {
        let (mut manager, journal) = manager();
        let first = Path::new("/sites/blog/content/a/index.md");
        let second = Path::new("/sites/blog/content/b/index.md");

        manager.start(Some(first)).unwrap();
        let outcome = manager.start(Some(second)).unwrap();

        assert_eq!(outcome, StartOutcome::AlreadyActive);
        let journal = journal.borrow();
        assert_eq!(journal.servers.len(), 1);
        assert_eq!(journal.surfaces.len(), 1);
        assert_eq!(journal.watches, vec![first.to_path_buf()]);
    }

    #[test]
    fn preconditions_skip_without_resources() {
        let (mut manager, journal) = manager();

        assert_eq!(
            manager.start(None).unwrap(),
            StartOutcome::Skipped(SkipReason::NoDocument)
        );
        assert_eq!(
            manager
                .start(Some(Path::new("/sites/blog/config.toml")))
                .unwrap(),
            StartOutcome::Skipped(SkipReason::NotContentDocument)
        );
        assert_eq!(
            manager
                .start(Some(Path::new("/elsewhere/content/post.md")))
                .unwrap(),
            StartOutcome::Skipped(SkipReason::NoWorkspaceRoot)
        );
        assert_eq!(manager.state(), SessionState::Idle);
        assert!(journal.borrow().order.is_empty());
    }

    #[test]
    fn switching_documents_moves_url_but_not_watch() {
        let (mut manager, journal) = manager();
        let a = Path::new("/sites/blog/content/a/index.md");
        let b = Path::new("/sites/blog/content/b/index.md");
        manager.start(Some(a)).unwrap();

        assert!(manager.on_active_document_changed(b).unwrap());
        assert_eq!(manager.displayed_url(), Some("http://localhost:1111/b"));
        assert_eq!(manager.watched_path(), Some(a));

        // 儲存 A 時回到 A 的網址。 / Saving A shows A's URL again.
        assert!(manager
            .on_watch_event(&WatchEvent {
                path: a.to_path_buf(),
                kind: WatchEventKind::Changed,
            })
            .unwrap());
        assert_eq!(manager.displayed_url(), Some("http://localhost:1111/a"));

        let journal = journal.borrow();
        assert_eq!(journal.watches.len(), 1);
        let urls: Vec<&str> = journal.pages.iter().map(|page| iframe_src(page)).collect();
        assert_eq!(
            urls,
            vec![
                "http://localhost:1111/a",
                "http://localhost:1111/b",
                "http://localhost:1111/a"
            ]
        );
    }

    #[test]
    fn document_change_before_start_is_ignored() {
        let (mut manager, journal) = manager();
        let changed = manager
            .on_active_document_changed(Path::new("/sites/blog/content/a/index.md"))
            .unwrap();
        assert!(!changed);
        assert!(journal.borrow().pages.is_empty());
    }

    #[test]
    fn saves_of_other_file_types_do_not_rewrite() {
        let (mut manager, journal) = manager();
        manager
            .start(Some(Path::new("/sites/blog/content/a/index.md")))
            .unwrap();
        let rewritten = manager
            .on_document_saved(Path::new("/sites/blog/content/a/notes.txt"))
            .unwrap();
        assert!(!rewritten);
        assert_eq!(journal.borrow().pages.len(), 1);
    }

    #[test]
    fn every_rewrite_of_the_same_url_differs() {
        let (mut manager, journal) = manager();
        let document = Path::new("/sites/blog/content/index.md");
        manager.start(Some(document)).unwrap();
        manager.on_document_saved(document).unwrap();
        manager.on_document_saved(document).unwrap();

        let journal = journal.borrow();
        assert_eq!(journal.pages.len(), 3);
        assert!(journal
            .pages
            .iter()
            .all(|page| iframe_src(page) == "http://localhost:1111"));
        assert_ne!(journal.pages[1], journal.pages[2]);
    }

    #[test]
    fn installing_a_watch_stops_the_previous_one() {
        let (mut manager, journal) = manager();
        let a = Path::new("/sites/blog/content/a/index.md");
        let b = Path::new("/sites/blog/content/b/index.md");
        manager.start(Some(a)).unwrap();

        manager
            .install_watch(b, "http://localhost:1111/b".into())
            .unwrap();

        assert_eq!(journal.borrow().unwatched, vec![a.to_path_buf()]);
        assert_eq!(manager.watched_path(), Some(b));
        assert_eq!(manager.watched_url(), Some("http://localhost:1111/b"));
    }

    #[test]
    fn failed_surface_releases_server() {
        let backend = RecordingBackend {
            fail_surface: true,
            ..RecordingBackend::default()
        };
        let journal = backend.journal.clone();
        let mut manager = PreviewManager::new(backend, PreviewConfig::default(), vec![site()]);

        let result = manager.start(Some(Path::new("/sites/blog/content/a.md")));
        assert!(matches!(result, Err(PreviewError::Surface { .. })));
        assert_eq!(manager.state(), SessionState::Idle);
        assert_eq!(journal.borrow().killed, 1);
        assert!(journal.borrow().watches.is_empty());
    }

    #[test]
    fn shutdown_kills_server_and_unwatches() {
        let (mut manager, journal) = manager();
        let document = Path::new("/sites/blog/content/a/index.md");
        manager.start(Some(document)).unwrap();
        manager.shutdown();

        let journal = journal.borrow();
        assert_eq!(journal.killed, 1);
        assert_eq!(journal.unwatched, vec![document.to_path_buf()]);
    }

    #[test]
    fn dropping_the_manager_also_tears_down() {
        let (mut manager, journal) = manager();
        manager
            .start(Some(Path::new("/sites/blog/content/a/index.md")))
            .unwrap();
        drop(manager);
        assert_eq!(journal.borrow().killed, 1);
    }
}
