//! 診斷輸出通道。 / Diagnostics output channel.
//!
//! Best-effort operations report failures here instead of surfacing them to
//! the command dispatcher. Every message is also mirrored to the `log` facade.

use std::sync::{Arc, Mutex};

const DEFAULT_CAPACITY: usize = 256;

/// 可複製的診斷通道控制代碼。 / Cloneable handle to a shared diagnostics channel.
#[derive(Debug, Clone)]
pub struct DiagnosticsChannel {
    name: Arc<str>,
    capacity: usize,
    lines: Arc<Mutex<Vec<String>>>,
}

impl DiagnosticsChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            capacity: capacity.max(1),
            lines: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 記錄一行訊息，超出容量時丟棄最舊的訊息。 / Appends a line, dropping the oldest beyond capacity.
    pub fn append_line(&self, message: impl Into<String>) {
        let message = message.into();
        log::warn!(target: "zolapad::diagnostics", "[{}] {}", self.name, message);
        let mut lines = match self.lines.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push(message);
        if lines.len() > self.capacity {
            let excess = lines.len() - self.capacity;
            lines.drain(..excess);
        }
    }

    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }
}
