//! External command execution for capture helpers and the preview server.
//! （執行外部指令：擷取輔助腳本與預覽伺服器。）
//!
//! Two shapes are provided. [`RunExecutor`] runs a command to completion and
//! captures its output; [`RunExecutor::spawn`] moves such work onto a worker
//! thread that reports back through a one-shot continuation. [`ShellSession`] keeps an interactive
//! shell alive and feeds it command lines, the way a terminal would.
//! 提供兩種形式：[`RunExecutor`] 執行到結束並擷取輸出；[`ShellSession`] 維持一個
//! 互動式 shell 並逐行送出指令。

use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use thiserror::Error;

/// Errors that may surface while preparing or executing a command.
/// （準備或執行指令時可能發生的錯誤。）
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("process stdin not available")]
    StdinUnavailable,
    #[error("failed to write to stdin: {0}")]
    Stdin(std::io::Error),
    #[error("failed to read process output: {0}")]
    Output(std::io::Error),
    #[error("failed to wait for process: {0}")]
    Wait(std::io::Error),
    #[error("failed to terminate process: {0}")]
    Kill(std::io::Error),
}

/// Program plus arguments.
/// （指令與參數。）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl RunSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn push_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> RunError {
        RunError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

/// Result information produced by a command execution.
/// （指令執行完成後的結果。）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunResult {
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub duration_ms: u128,
}

impl RunResult {
    /// Exit code `0`.
    pub fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs commands to completion.
/// （執行指令直到結束。）
pub struct RunExecutor;

impl RunExecutor {
    /// Runs the command, blocking until it exits, and captures its output.
    /// There is no deadline: a hung command blocks the caller indefinitely.
    pub fn execute(spec: &RunSpec) -> Result<RunResult, RunError> {
        let mut command = spec.command();
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let start = Instant::now();
        let child = command.spawn().map_err(|err| spec.spawn_error(err))?;
        let output = child.wait_with_output().map_err(RunError::Output)?;
        log::debug!(
            "{} exited with {:?} after {:?}",
            spec.program,
            output.status.code(),
            start.elapsed()
        );

        Ok(RunResult {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
            duration_ms: start.elapsed().as_millis(),
        })
    }

    /// Runs `job` on a worker thread and hands its output to `on_done`.
    /// （在背景執行緒執行，完成後呼叫 `on_done` 一次。）
    ///
    /// `job` usually wraps one or more [`RunExecutor::execute`] calls.
    /// `on_done` is invoked exactly once, on the worker thread.
    pub fn spawn<T, J, F>(job: J, on_done: F) -> JoinHandle<()>
    where
        J: FnOnce() -> T + Send + 'static,
        F: FnOnce(T) + Send + 'static,
    {
        thread::spawn(move || on_done(job()))
    }
}

/// Where a long-lived shell writes its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Inherit,
    Discard,
}

impl OutputMode {
    fn stdio(self) -> Stdio {
        match self {
            OutputMode::Inherit => Stdio::inherit(),
            OutputMode::Discard => Stdio::null(),
        }
    }
}

/// Command-line dialect of the shell behind a [`ShellSession`].
/// （[`ShellSession`] 使用的 shell 語法。）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    Posix,
    Cmd,
}

impl ShellKind {
    /// Shell of the running platform.
    pub fn native() -> Self {
        if cfg!(windows) {
            ShellKind::Cmd
        } else {
            ShellKind::Posix
        }
    }

    /// Program used to start an interactive session of this shell.
    pub fn program(self) -> RunSpec {
        match self {
            ShellKind::Posix => RunSpec::new("sh"),
            ShellKind::Cmd => RunSpec::new("cmd").push_arg("/Q"),
        }
    }

    /// Command line that changes the working directory to `dir`.
    pub fn change_dir(self, dir: &Path) -> String {
        let dir = dir.to_string_lossy();
        match self {
            ShellKind::Posix => format!("cd {}", posix_quote(&dir)),
            ShellKind::Cmd => format!("cd /d \"{dir}\""),
        }
    }
}

fn posix_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// Interactive shell fed one command line at a time.
/// （逐行接收指令的互動式 shell。）
///
/// All lines go to the same process, so a `cd` affects the lines after it.
/// The session never restarts the shell; once it exits, further lines fail.
pub struct ShellSession {
    kind: ShellKind,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl ShellSession {
    pub fn spawn(kind: ShellKind, output: OutputMode) -> Result<Self, RunError> {
        let spec = kind.program();
        let mut command = spec.command();
        command.stdin(Stdio::piped());
        command.stdout(output.stdio());
        command.stderr(output.stdio());
        let mut child = command.spawn().map_err(|err| spec.spawn_error(err))?;
        let stdin = child.stdin.take().ok_or(RunError::StdinUnavailable)?;
        log::debug!("started {} shell (pid {})", spec.program, child.id());
        Ok(Self {
            kind,
            child,
            stdin: Some(stdin),
        })
    }

    pub fn kind(&self) -> ShellKind {
        self.kind
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Sends one command line to the shell.
    pub fn send_line(&mut self, line: &str) -> Result<(), RunError> {
        let stdin = self.stdin.as_mut().ok_or(RunError::StdinUnavailable)?;
        stdin
            .write_all(line.as_bytes())
            .and_then(|_| stdin.write_all(b"\n"))
            .and_then(|_| stdin.flush())
            .map_err(RunError::Stdin)
    }

    /// Sends a `cd` to `dir`.
    pub fn change_dir(&mut self, dir: &Path) -> Result<(), RunError> {
        let line = self.kind.change_dir(dir);
        self.send_line(&line)
    }

    /// Kills the shell (and with it anything it runs in the foreground).
    pub fn kill(mut self) -> Result<(), RunError> {
        drop(self.stdin.take());
        if self.child.try_wait().map_err(RunError::Wait)?.is_some() {
            return Ok(());
        }
        self.child.kill().map_err(RunError::Kill)?;
        self.child.wait().map_err(RunError::Wait)?;
        Ok(())
    }
}
