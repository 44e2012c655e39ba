use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use zolapad_capture::{
    apply_capture_result, CaptureConfig, CapturePipeline, CaptureRequest, Platform,
};
use zolapad_clipboard::{block_snippet, classify, Classification};
use zolapad_core::{Caret, DiagnosticsChannel, EditorBuffer, EditorInsertion, Selection};
use zolapad_preview::{PreviewConfig, PreviewManager, SkipReason, StartOutcome, SystemBackend};
use zolapad_project::{
    new_post, resolve_workspace_root, ScaffoldOutcome, WorkspaceRegistry, WorkspaceRoot,
    PREVIEW_BASE_URL,
};
use zolapad_settings::{PreferencesStore, PREFERENCES_FILE};

#[derive(Parser)]
#[command(
    name = "zolapad",
    about = "Authoring helpers for Zola sites",
    author,
    version
)]
struct Cli {
    /// 設定資料夾；預設為目前目錄下的 `.zolapad`。 / Configuration directory (defaults to `./.zolapad`).
    #[arg(long, global = true, value_name = "DIR")]
    config: Option<PathBuf>,
    /// 額外的網站根目錄，僅本次執行有效。 / Extra site root for this invocation only.
    #[arg(long = "workspace", global = true, value_name = "PATH")]
    workspaces: Vec<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 啟動即時預覽。 / Start the live preview for a document.
    Preview(PreviewArgs),
    /// 依剪貼簿內容貼上嵌入碼或原文。 / Paste clipboard text as an embed shortcode or as is.
    PasteSpecial(PasteSpecialArgs),
    /// 貼上剪貼簿圖片。 / Save the clipboard image beside a document and insert its reference.
    PasteImage(PasteImageArgs),
    /// 插入 block 區塊。 / Insert a block shortcode.
    Block(BlockArgs),
    /// 建立今日文章。 / Create a dated post bundle.
    NewPost(NewPostArgs),
    /// 管理已知網站根目錄。 / Manage known site roots.
    #[command(subcommand)]
    Workspace(WorkspaceCommand),
}

#[derive(Args)]
struct PreviewArgs {
    /// 目前作用中的文件。 / Document active when the preview starts.
    #[arg(value_name = "FILE")]
    document: PathBuf,
    /// 預覽頁輸出位置。 / Where the preview page is written.
    #[arg(long, value_name = "FILE")]
    surface: Option<PathBuf>,
}

#[derive(Args)]
struct CaretArgs {
    /// 插入點位元組位移，可重複。 / Byte offset of a caret; repeatable.
    #[arg(long = "at", value_name = "OFFSET")]
    at: Vec<usize>,
    /// 要取代的範圍 `START:END`，可重複。 / Range `START:END` to replace; repeatable.
    #[arg(long = "select", value_name = "START:END", value_parser = parse_selection)]
    select: Vec<Selection>,
}

#[derive(Args)]
struct PasteSpecialArgs {
    /// 使用此文字而非系統剪貼簿。 / Use this text instead of the system clipboard.
    #[arg(long)]
    text: Option<String>,
    /// 寫入的文件；省略時輸出到標準輸出。 / Document to edit; prints the payload when omitted.
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,
    #[command(flatten)]
    carets: CaretArgs,
}

#[derive(Args)]
struct PasteImageArgs {
    #[arg(value_name = "FILE")]
    document: PathBuf,
    #[command(flatten)]
    carets: CaretArgs,
}

#[derive(Args)]
struct BlockArgs {
    /// 區塊內容。 / Body placed inside the block.
    #[arg(long, default_value = "")]
    text: String,
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,
    #[command(flatten)]
    carets: CaretArgs,
}

#[derive(Args)]
struct NewPostArgs {
    /// 網站根目錄；預設為包含目前目錄的已知根目錄。 / Site root; defaults to the known root containing the current directory.
    #[arg(long, value_name = "DIR")]
    site: Option<PathBuf>,
    /// 文章日期 `YYYY-MM-DD`；預設今天。 / Post date `YYYY-MM-DD`; defaults to today.
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum WorkspaceCommand {
    /// 新增網站根目錄。 / Register a site root.
    Add(WorkspacePathArgs),
    /// 移除網站根目錄。 / Forget a site root.
    Remove(WorkspacePathArgs),
    /// 列出網站根目錄。 / List registered site roots.
    List,
}

#[derive(Args)]
struct WorkspacePathArgs {
    #[arg(value_name = "DIR")]
    path: PathBuf,
}

/// 執行期間共用的設定與根目錄。 / Settings and roots shared by every command.
struct Host {
    preferences: PreferencesStore,
    registry: WorkspaceRegistry,
    extra_roots: Vec<WorkspaceRoot>,
    diagnostics: DiagnosticsChannel,
}

impl Host {
    fn load(config: Option<PathBuf>, workspaces: Vec<PathBuf>) -> Result<Self> {
        let config_dir = match config {
            Some(dir) => resolve_input_path(&dir)?,
            None => resolve_input_path(Path::new(".zolapad"))?,
        };
        let prefs_path = config_dir.join(PREFERENCES_FILE);
        let preferences = PreferencesStore::load(&prefs_path).with_context(|| {
            format!("failed to load preferences from {}", prefs_path.display())
        })?;
        let registry_path = config_dir.join(WorkspaceRegistry::INDEX_FILE);
        let registry = WorkspaceRegistry::load(&registry_path).with_context(|| {
            format!("failed to load site roots from {}", registry_path.display())
        })?;
        let extra_roots = workspaces
            .iter()
            .map(|path| resolve_input_path(path).map(WorkspaceRoot::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            preferences,
            registry,
            extra_roots,
            diagnostics: DiagnosticsChannel::new("zolapad"),
        })
    }

    /// Registered roots followed by the ones given on the command line.
    fn known_roots(&self) -> Vec<WorkspaceRoot> {
        let mut roots = self.registry.roots().to_vec();
        for root in &self.extra_roots {
            if !roots.contains(root) {
                roots.push(root.clone());
            }
        }
        roots
    }

    fn document_extension(&self) -> &str {
        &self.preferences.preferences().site.document_extension
    }

    /// 將診斷訊息輸出到標準錯誤。 / Echoes collected diagnostics to stderr.
    fn flush_diagnostics(&self) {
        for line in self.diagnostics.lines() {
            eprintln!("[{}] {line}", self.diagnostics.name());
        }
    }
}

/// 主程式事件佇列。 / Events handled by the host loop.
enum HostEvent {
    ActiveDocument(PathBuf),
    InputClosed,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli {
        config,
        workspaces,
        command,
    } = Cli::parse();
    let mut host = Host::load(config, workspaces)?;
    let result = match command {
        Commands::Preview(args) => execute_preview(args, &host),
        Commands::PasteSpecial(args) => execute_paste_special(args),
        Commands::PasteImage(args) => execute_paste_image(args, &host),
        Commands::Block(args) => execute_block(args),
        Commands::NewPost(args) => execute_new_post(args, &host),
        Commands::Workspace(subcommand) => execute_workspace_command(subcommand, &mut host),
    };
    host.flush_diagnostics();
    result
}

fn execute_preview(args: PreviewArgs, host: &Host) -> Result<()> {
    let document = resolve_input_path(&args.document)?;
    let prefs = host.preferences.preferences();

    let (watch_tx, watch_rx) = mpsc::channel();
    let mut backend =
        SystemBackend::new(watch_tx).with_poll_interval(prefs.preview.poll_interval());
    if let Some(surface) = args.surface.as_ref().or(prefs.preview.surface_path.as_ref()) {
        backend = backend.with_surface_path(resolve_input_path(surface)?);
    }
    let config = PreviewConfig {
        serve_command: prefs.preview.serve_command.clone(),
        document_extension: prefs.site.document_extension.clone(),
        base_url: PREVIEW_BASE_URL.to_string(),
        enable_scripts: prefs.preview.enable_scripts,
    };
    let mut manager = PreviewManager::new(backend, config, host.known_roots());

    match manager.start(Some(&document)) {
        Ok(StartOutcome::Started { url }) => {
            println!("Previewing {url}");
            println!("Preview page: {}", manager.backend().surface_path().display());
        }
        Ok(StartOutcome::AlreadyActive) => {}
        Ok(StartOutcome::Skipped(reason)) => {
            println!("{}", skip_message(reason, &document));
            return Ok(());
        }
        Err(err) => {
            host.diagnostics
                .append_line(format!("preview failed to start: {err}"));
            return Ok(());
        }
    }

    // 標準輸入每行代表新的作用中文件。 / Each stdin line names the newly active document.
    let (host_tx, host_rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if host_tx
                .send(HostEvent::ActiveDocument(PathBuf::from(trimmed)))
                .is_err()
            {
                return;
            }
        }
        let _ = host_tx.send(HostEvent::InputClosed);
    });

    let tick = prefs.preview.poll_interval();
    loop {
        for event in watch_rx.try_iter() {
            if let Err(err) = manager.on_watch_event(&event) {
                host.diagnostics
                    .append_line(format!("preview refresh failed: {err}"));
            }
        }
        match host_rx.recv_timeout(tick) {
            Ok(HostEvent::ActiveDocument(path)) => {
                let path = resolve_input_path(&path)?;
                match manager.on_active_document_changed(&path) {
                    Ok(true) => {
                        if let Some(url) = manager.displayed_url() {
                            println!("Previewing {url}");
                        }
                    }
                    Ok(false) => {}
                    Err(err) => host
                        .diagnostics
                        .append_line(format!("preview refresh failed: {err}")),
                }
            }
            Ok(HostEvent::InputClosed) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    manager.shutdown();
    Ok(())
}

fn skip_message(reason: SkipReason, document: &Path) -> String {
    match reason {
        SkipReason::NoDocument => "No active document; preview not started".to_string(),
        SkipReason::NotContentDocument => format!(
            "{} is not a content document; preview not started",
            document.display()
        ),
        SkipReason::NoWorkspaceRoot => format!(
            "{} is outside every known site root; preview not started",
            document.display()
        ),
    }
}

fn execute_paste_special(args: PasteSpecialArgs) -> Result<()> {
    let text = match args.text {
        Some(text) => text,
        None => read_clipboard_text()?,
    };
    let classification = classify(&text);
    if let Classification::RawText(_) = classification {
        log::debug!("pasting clipboard text unchanged");
    }
    emit_payload(&classification.render(), args.file.as_deref(), &args.carets)
}

fn read_clipboard_text() -> Result<String> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|err| anyhow!("clipboard unavailable: {err}"))?;
    clipboard
        .get_text()
        .map_err(|err| anyhow!("clipboard holds no text: {err}"))
}

fn execute_block(args: BlockArgs) -> Result<()> {
    emit_payload(&block_snippet(&args.text), args.file.as_deref(), &args.carets)
}

fn execute_paste_image(args: PasteImageArgs, host: &Host) -> Result<()> {
    let document = resolve_input_path(&args.document)?;
    let prefs = host.preferences.preferences();
    let platform = Platform::detect();
    log::debug!("capture platform: {platform:?}");
    let pipeline = CapturePipeline::new(CaptureConfig {
        script_dir: prefs.capture.script_dir.clone(),
        windows_user_dir: prefs.capture.windows_user_dir.clone(),
    });

    let Some(request) = CaptureRequest::for_document(
        platform,
        &document,
        &host.known_roots(),
        Local::now().naive_local(),
        host.document_extension(),
    ) else {
        println!("No image inserted");
        return Ok(());
    };
    let mut buffer = load_buffer(&document, &args.carets)?;

    // 擷取在背景執行，結果回到主執行緒套用。 / Capture runs on a worker; the result is applied here.
    let (done_tx, done_rx) = mpsc::channel();
    pipeline.capture_async(request, move |result| {
        let _ = done_tx.send(result);
    });
    let result = done_rx
        .recv()
        .map_err(|_| anyhow!("capture worker stopped without a result"))?;
    let inserted = apply_capture_result(&document, result, &mut buffer, &host.diagnostics);
    match inserted {
        Some(image) => {
            fs::write(&document, buffer.contents())
                .with_context(|| format!("failed to write {}", document.display()))?;
            println!("Inserted {}", image.display());
        }
        None => println!("No image inserted"),
    }
    Ok(())
}

fn execute_new_post(args: NewPostArgs, host: &Host) -> Result<()> {
    let root = match args.site {
        Some(site) => WorkspaceRoot::new(resolve_input_path(&site)?),
        None => {
            let cwd = std::env::current_dir().context("determine current directory")?;
            let roots = host.known_roots();
            resolve_workspace_root(&cwd, &roots)
                .or_else(|| roots.first().cloned())
                .ok_or_else(|| anyhow!("no site root; pass --site or --workspace"))?
        }
    };
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    match new_post(&root, date)? {
        ScaffoldOutcome::Created(path) => println!("Created {}", path.display()),
        ScaffoldOutcome::Existing(path) => println!("Already exists: {}", path.display()),
    }
    Ok(())
}

fn execute_workspace_command(command: WorkspaceCommand, host: &mut Host) -> Result<()> {
    match command {
        WorkspaceCommand::Add(args) => {
            let path = resolve_input_path(&args.path)?;
            if host.registry.add(&path)? {
                host.registry.save()?;
                println!("Added {}", path.display());
            } else {
                println!("Already registered: {}", path.display());
            }
        }
        WorkspaceCommand::Remove(args) => {
            let path = resolve_input_path(&args.path)?;
            if !host.registry.remove(&path) {
                bail!("'{}' is not a registered site root", path.display());
            }
            host.registry.save()?;
            println!("Removed {}", path.display());
        }
        WorkspaceCommand::List => {
            for root in host.known_roots() {
                println!("{}", root.path().display());
            }
        }
    }
    Ok(())
}

/// 寫入文件或輸出到標準輸出。 / Inserts `payload` into `file`, or prints it.
fn emit_payload(payload: &str, file: Option<&Path>, carets: &CaretArgs) -> Result<()> {
    let Some(file) = file else {
        println!("{payload}");
        return Ok(());
    };
    let file = resolve_input_path(file)?;
    let mut buffer = load_buffer(&file, carets)?;
    buffer
        .insert_payload(payload)
        .with_context(|| format!("failed to insert into {}", file.display()))?;
    fs::write(&file, buffer.contents())
        .with_context(|| format!("failed to write {}", file.display()))?;
    Ok(())
}

fn load_buffer(path: &Path, carets: &CaretArgs) -> Result<EditorBuffer> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if carets.at.is_empty() && carets.select.is_empty() {
        return Ok(EditorBuffer::new(text));
    }
    let carets = carets
        .at
        .iter()
        .map(|&offset| Caret::new(offset))
        .chain(carets.select.iter().cloned().map(Caret::selecting))
        .collect();
    EditorBuffer::with_carets(text, carets)
        .with_context(|| format!("invalid caret for {}", path.display()))
}

fn parse_selection(value: &str) -> Result<Selection, String> {
    let (start, end) = value
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got '{value}'"))?;
    let start = start
        .trim()
        .parse::<usize>()
        .map_err(|err| format!("invalid start '{start}': {err}"))?;
    let end = end
        .trim()
        .parse::<usize>()
        .map_err(|err| format!("invalid end '{end}': {err}"))?;
    Ok(Selection::new(start, end))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format!("invalid date '{value}': {err}"))
}

fn resolve_input_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("determine current directory")?
            .join(path))
    }
}
