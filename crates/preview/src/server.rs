use zolapad_project::WorkspaceRoot;
use zolapad_runexec::{OutputMode, RunError, ShellKind, ShellSession};

use crate::backend::ServerProcess;

/// 在網站根目錄執行預覽指令的 shell。 / Shell running the serve command from the site root.
///
/// On POSIX shells the serve command replaces the shell via `exec`, so killing
/// the session stops the server itself.
pub struct ShellServer {
    session: ShellSession,
}

impl ShellServer {
    /// 啟動 shell，切換目錄後送出預覽指令。 / Spawns the shell, changes into `root`, then sends `serve_command`.
    pub fn launch(
        kind: ShellKind,
        output: OutputMode,
        root: &WorkspaceRoot,
        serve_command: &str,
    ) -> Result<Self, RunError> {
        let mut session = ShellSession::spawn(kind, output)?;
        session.change_dir(root.path())?;
        session.send_line(&serve_line(kind, serve_command))?;
        log::info!(
            "preview server started in {} (pid {})",
            root.path().display(),
            session.id()
        );
        Ok(Self { session })
    }

    pub fn id(&self) -> u32 {
        self.session.id()
    }
}

fn serve_line(kind: ShellKind, serve_command: &str) -> String {
    match kind {
        ShellKind::Posix => format!("exec {serve_command}"),
        ShellKind::Cmd => serve_command.to_string(),
    }
}

impl ServerProcess for ShellServer {
    fn shutdown(self: Box<Self>) {
        let id = self.session.id();
        match self.session.kill() {
            Ok(()) => log::info!("preview server {id} stopped"),
            Err(err) => log::warn!("failed to stop preview server {id}: {err}"),
        }
    }
}
