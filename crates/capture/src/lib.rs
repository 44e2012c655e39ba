//! Clipboard image capture for ZolaPad.
//! 剪貼簿圖片擷取。
//!
//! A [`Platform`] is detected once; each paste builds a [`CaptureRequest`]
//! naming the file beside the active document, and the [`CapturePipeline`]
//! drives the platform helper to write it. Failures are best effort: the
//! paste helpers report them to a diagnostics channel and carry on.

pub mod paste;
pub mod pipeline;
pub mod platform;
pub mod request;
pub mod scripts;

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use zolapad_runexec::RunError;

pub use paste::{apply_capture_result, image_markdown, paste_clipboard_image};
pub use pipeline::{
    CaptureConfig, CaptureOutcome, CapturePipeline, CommandRunner, SystemRunner,
    WINDOWS_HELPER_DIR,
};
pub use platform::{wsl_to_windows_path, Platform, WSL_DISTRO_VAR};
pub use request::{capture_file_name, CaptureRequest};
pub use scripts::{install_script, BundledScript, InstallOutcome};

/// 擷取過程中的錯誤。 / Errors raised while capturing a clipboard image.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to install capture helper {path}: {source}")]
    InstallScript {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("capture helper could not run: {0}")]
    Run(#[source] RunError),
    #[error("{program} exited with {exit_code:?}: {stderr}")]
    ScriptFailed {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("the clipboard does not hold an image")]
    NoImage,
    #[error("{} is not set; cannot address WSL files from Windows", WSL_DISTRO_VAR)]
    MissingDistro,
    #[error("Windows user directory is unknown; set capture.windows_user_dir")]
    WindowsUserDirUnknown,
}
