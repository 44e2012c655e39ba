//! Helper scripts shipped inside the binary.
//! 內建於執行檔中的輔助腳本。

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::CaptureError;

/// A script embedded at build time and written out on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundledScript {
    pub file_name: &'static str,
    pub contents: &'static str,
}

/// AppleScript used on macOS.
pub const MACOS_CAPTURE_SCRIPT: BundledScript = BundledScript {
    file_name: "clipboard_image.applescript",
    contents: include_str!("../scripts/clipboard_image.applescript"),
};

/// PowerShell helper run on the Windows side of WSL.
pub const WSL_CAPTURE_SCRIPT: BundledScript = BundledScript {
    file_name: "clipboard_image.ps1",
    contents: include_str!("../scripts/clipboard_image.ps1"),
};

/// 安裝結果。 / Result of [`install_script`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(PathBuf),
    /// The destination already existed; nothing was written.
    AlreadyPresent(PathBuf),
}

impl InstallOutcome {
    pub fn path(&self) -> &Path {
        match self {
            InstallOutcome::Installed(path) | InstallOutcome::AlreadyPresent(path) => path,
        }
    }
}

/// 將腳本複製到目標資料夾；已存在則略過。 / Copies `script` into `dir` unless it is already there.
///
/// An existing destination is reported as [`InstallOutcome::AlreadyPresent`],
/// never as an error, so repeated captures reuse the first copy.
pub fn install_script(script: &BundledScript, dir: &Path) -> Result<InstallOutcome, CaptureError> {
    let destination = dir.join(script.file_name);
    fs::create_dir_all(dir).map_err(|source| CaptureError::InstallScript {
        path: destination.clone(),
        source,
    })?;

    let created = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&destination);
    let mut file = match created {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            log::debug!("{} already installed", destination.display());
            return Ok(InstallOutcome::AlreadyPresent(destination));
        }
        Err(source) => {
            return Err(CaptureError::InstallScript {
                path: destination,
                source,
            })
        }
    };
    file.write_all(script.contents.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|source| CaptureError::InstallScript {
            path: destination.clone(),
            source,
        })?;
    log::info!("installed capture helper {}", destination.display());
    Ok(InstallOutcome::Installed(destination))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn second_install_is_not_a_failure_and_keeps_one_copy() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(".zolapad");

        let first = install_script(&WSL_CAPTURE_SCRIPT, &dir).unwrap();
        let second = install_script(&WSL_CAPTURE_SCRIPT, &dir).unwrap();

        assert!(matches!(first, InstallOutcome::Installed(_)));
        assert!(matches!(second, InstallOutcome::AlreadyPresent(_)));
        assert_eq!(first.path(), second.path());

        let entries: Vec<_> = fs::read_dir(&dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            fs::read_to_string(first.path()).unwrap(),
            WSL_CAPTURE_SCRIPT.contents
        );
    }

    #[test]
    fn existing_file_is_left_untouched() {
        let temp = tempdir().unwrap();
        let existing = temp.path().join(MACOS_CAPTURE_SCRIPT.file_name);
        fs::write(&existing, "customised").unwrap();

        let outcome = install_script(&MACOS_CAPTURE_SCRIPT, temp.path()).unwrap();
        assert_eq!(outcome, InstallOutcome::AlreadyPresent(existing.clone()));
        assert_eq!(fs::read_to_string(existing).unwrap(), "customised");
    }

    #[test]
    fn bundled_scripts_are_not_empty() {
        assert!(MACOS_CAPTURE_SCRIPT.contents.contains("PNGf"));
        assert!(WSL_CAPTURE_SCRIPT.contents.contains("GetImage"));
    }
}
