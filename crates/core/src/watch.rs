use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;

use notify::event::EventKind;
use notify::{Config, PollWatcher, RecursiveMode, Watcher};
use thiserror::Error;

/// 預設輪詢間隔。 / Default polling interval for document watches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// 監看文件時可能回傳的錯誤。 / Error type for document watches.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),
    #[error("document {0} does not exist")]
    Missing(PathBuf),
}

/// 偵測到的變更種類。 / Kind of change observed on the watched document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Changed,
    Created,
    Removed,
}

/// 監看事件。 / Change notification for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub kind: WatchEventKind,
}

/// 以輪詢方式監看單一文件。 / Polling watch on exactly one document path.
///
/// Events are forwarded to the sender supplied at creation; the receiving end
/// is the host's event queue, so handlers run on the host thread.
pub struct PollingDocumentWatch {
    watcher: PollWatcher,
    path: PathBuf,
}

impl PollingDocumentWatch {
    /// 開始監看指定文件。 / Starts polling `path` every `interval`.
    pub fn start(
        path: impl AsRef<Path>,
        interval: Duration,
        events: Sender<WatchEvent>,
    ) -> Result<Self, WatchError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(WatchError::Missing(path));
        }
        let config = Config::default().with_poll_interval(interval);
        let mut watcher = PollWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    for mapped in map_event(event) {
                        let _ = events.send(mapped);
                    }
                }
                Err(err) => log::warn!("document watch error: {err}"),
            },
            config,
        )?;
        watcher
            .watch(&path, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Watch {
                path: path.clone(),
                source,
            })?;
        log::debug!("watching {} every {:?}", path.display(), interval);
        Ok(Self { watcher, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 停止監看。 / Stops the watch and releases the polling thread.
    pub fn stop(mut self) {
        if let Err(err) = self.watcher.unwatch(&self.path) {
            log::debug!("unwatch {} failed: {err}", self.path.display());
        }
    }
}

fn map_event(event: notify::Event) -> Vec<WatchEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => WatchEventKind::Created,
        EventKind::Remove(_) => WatchEventKind::Removed,
        EventKind::Modify(_) | EventKind::Any => WatchEventKind::Changed,
        EventKind::Access(_) | EventKind::Other => return Vec::new(),
    };
    event
        .paths
        .into_iter()
        .map(|path| WatchEvent { path, kind })
        .collect()
}
