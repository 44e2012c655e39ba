//! Editor-side primitives shared by the ZolaPad crates.
//! ZolaPad 各元件共用的編輯器端基礎元件。

pub mod diagnostics;
pub mod document;
pub mod editor;
pub mod watch;

pub use diagnostics::DiagnosticsChannel;
pub use document::{is_content_document, DEFAULT_DOCUMENT_EXTENSION};
pub use editor::{Caret, EditorBuffer, EditorError, EditorInsertion, Selection};
pub use watch::{
    PollingDocumentWatch, WatchError, WatchEvent, WatchEventKind, DEFAULT_POLL_INTERVAL,
};
