use std::env;
use std::fs;
use std::path::{Component, Path};

/// Kernel release file consulted to recognise WSL.
const KERNEL_RELEASE: &str = "/proc/sys/kernel/osrelease";

/// Environment variable naming the running WSL distribution.
pub const WSL_DISTRO_VAR: &str = "WSL_DISTRO_NAME";

/// 支援的擷取平台。 / Platforms the capture pipeline knows how to drive.
///
/// Decided once at startup; everything else dispatches on this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    /// Native macOS: AppleScript through `osascript`.
    MacOs,
    /// Linux under WSL: a PowerShell helper on the Windows side.
    Wsl { distro: Option<String> },
    /// Anything else. Capture is a no-op.
    Unsupported,
}

impl Platform {
    /// 偵測目前平台。 / Inspects the running system.
    pub fn detect() -> Self {
        let release = fs::read_to_string(KERNEL_RELEASE).ok();
        let distro = env::var(WSL_DISTRO_VAR).ok();
        Self::from_signals(env::consts::OS, release.as_deref(), distro)
    }

    /// Pure decision table over the raw platform signals.
    pub fn from_signals(os: &str, kernel_release: Option<&str>, distro: Option<String>) -> Self {
        match os {
            "macos" => Platform::MacOs,
            "linux" if kernel_release.map(is_wsl_release).unwrap_or(false) => Platform::Wsl {
                distro: distro.filter(|name| !name.trim().is_empty()),
            },
            _ => Platform::Unsupported,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Platform::Unsupported)
    }
}

fn is_wsl_release(release: &str) -> bool {
    let release = release.to_ascii_lowercase();
    release.contains("microsoft") || release.contains("wsl")
}

/// 將 WSL 端路徑轉為 Windows 可讀的路徑。 / Converts a WSL path into one Windows programs can open.
///
/// `/mnt/<drive>/...` maps to `<DRIVE>:\...`; everything else goes through
/// the `\\wsl$\<distro>` share.
pub fn wsl_to_windows_path(path: &Path, distro: &str) -> String {
    let segments: Vec<String> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if segments.len() >= 2 && segments[0] == "mnt" && is_drive_letter(&segments[1]) {
        let drive = segments[1].to_ascii_uppercase();
        let rest = segments[2..].join("\\");
        return format!("{drive}:\\{rest}");
    }
    format!("\\\\wsl$\\{distro}\\{}", segments.join("\\"))
}

fn is_drive_letter(segment: &str) -> bool {
    segment.len() == 1 && segment.chars().all(|ch| ch.is_ascii_alphabetic())
}
