use std::path::Path;

/// 預設的內容文件副檔名。 / Default extension of authored content documents.
pub const DEFAULT_DOCUMENT_EXTENSION: &str = "md";

/// 判斷路徑是否為可辨識的內容文件（副檔名相等）。 / Returns whether `path` is a recognized content document.
///
/// The comparison is plain extension equality; `extension` is given without
/// the leading dot.
pub fn is_content_document(path: &Path, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == wanted)
        .unwrap_or(false)
}
