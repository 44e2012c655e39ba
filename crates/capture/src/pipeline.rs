use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use zolapad_runexec::{RunError, RunExecutor, RunResult, RunSpec};

use crate::platform::{wsl_to_windows_path, Platform};
use crate::request::CaptureRequest;
use crate::scripts::{install_script, MACOS_CAPTURE_SCRIPT, WSL_CAPTURE_SCRIPT};
use crate::CaptureError;

/// Directory below the Windows user directory that receives the helper.
pub const WINDOWS_HELPER_DIR: &str = ".zolapad";

/// Output of the AppleScript when the clipboard holds no image.
const NO_IMAGE: &str = "no image";

/// 執行外部指令的介面。 / Seam over external process execution.
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &RunSpec) -> Result<RunResult, RunError>;
}

/// Runs commands for real through [`RunExecutor`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &RunSpec) -> Result<RunResult, RunError> {
        RunExecutor::execute(spec)
    }
}

/// 擷取設定。 / Locations used by the capture pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Where the macOS script is written; defaults to a temp directory.
    pub script_dir: Option<PathBuf>,
    /// Windows user directory as seen from WSL.
    pub windows_user_dir: Option<PathBuf>,
}

/// 擷取結果。 / What a capture produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Captured(PathBuf),
    /// Nothing to do on this platform.
    NoOp,
}

/// 平台分派的剪貼簿圖片擷取流程。 / Platform-dispatching clipboard image capture.
#[derive(Clone)]
pub struct CapturePipeline {
    config: CaptureConfig,
    runner: Arc<dyn CommandRunner>,
}

impl CapturePipeline {
    pub fn new(config: CaptureConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner))
    }

    pub fn with_runner(config: CaptureConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    /// Runs the capture for `request`, blocking until the helper exits.
    pub fn capture(&self, request: &CaptureRequest) -> Result<CaptureOutcome, CaptureError> {
        match &request.platform {
            Platform::MacOs => self.capture_macos(request).map(CaptureOutcome::Captured),
            Platform::Wsl { distro } => self
                .capture_wsl(request, distro.as_deref())
                .map(CaptureOutcome::Captured),
            Platform::Unsupported => {
                log::info!("clipboard image capture is not available on this platform");
                Ok(CaptureOutcome::NoOp)
            }
        }
    }

    /// Runs the capture on a worker thread; `on_done` is called exactly once.
    /// （在背景執行擷取，完成時呼叫 `on_done` 一次。）
    pub fn capture_async<F>(&self, request: CaptureRequest, on_done: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<CaptureOutcome, CaptureError>) + Send + 'static,
    {
        let pipeline = self.clone();
        RunExecutor::spawn(move || pipeline.capture(&request), on_done)
    }

    fn capture_macos(&self, request: &CaptureRequest) -> Result<PathBuf, CaptureError> {
        let script = install_script(&MACOS_CAPTURE_SCRIPT, &self.script_dir())?;
        let spec = RunSpec::new("osascript")
            .push_arg(script.path().to_string_lossy())
            .push_arg(request.image_path().to_string_lossy());
        let result = self.run_checked(&spec)?;

        // The script may normalise the path; its output is authoritative.
        let reported = result.stdout_text().trim().to_string();
        if reported.is_empty() || reported == NO_IMAGE {
            return Err(CaptureError::NoImage);
        }
        Ok(PathBuf::from(reported))
    }

    fn capture_wsl(
        &self,
        request: &CaptureRequest,
        distro: Option<&str>,
    ) -> Result<PathBuf, CaptureError> {
        let distro = distro.ok_or(CaptureError::MissingDistro)?;
        let helper_dir = self.windows_user_dir()?.join(WINDOWS_HELPER_DIR);
        let helper = install_script(&WSL_CAPTURE_SCRIPT, &helper_dir)?;

        let target = request.image_path();
        let spec = RunSpec::new("powershell.exe")
            .with_args([
                "-NoProfile",
                "-NonInteractive",
                "-ExecutionPolicy",
                "Bypass",
                "-File",
            ])
            .push_arg(wsl_to_windows_path(helper.path(), distro))
            .push_arg(wsl_to_windows_path(&target, distro));
        self.run_checked(&spec)?;
        Ok(target)
    }

    fn run_checked(&self, spec: &RunSpec) -> Result<RunResult, CaptureError> {
        let result = self.runner.run(spec).map_err(CaptureError::Run)?;
        if !result.success() {
            return Err(CaptureError::ScriptFailed {
                program: spec.program.clone(),
                exit_code: result.exit_code,
                stderr: result.stderr_text().trim().to_string(),
            });
        }
        Ok(result)
    }

    fn script_dir(&self) -> PathBuf {
        self.config
            .script_dir
            .clone()
            .unwrap_or_else(|| env::temp_dir().join("zolapad-scripts"))
    }

    fn windows_user_dir(&self) -> Result<PathBuf, CaptureError> {
        if let Some(dir) = &self.config.windows_user_dir {
            return Ok(dir.clone());
        }
        env::var("USER")
            .ok()
            .map(|user| PathBuf::from("/mnt/c/Users").join(user))
            .filter(|dir| dir.is_dir())
            .ok_or(CaptureError::WindowsUserDirUnknown)
    }
}
