use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use zolapad_core::{DiagnosticsChannel, EditorInsertion};
use zolapad_project::{image_reference, markdown_image, WorkspaceRoot};

use crate::pipeline::{CaptureOutcome, CapturePipeline};
use crate::platform::Platform;
use crate::request::CaptureRequest;
use crate::CaptureError;

/// Markdown that embeds `image` in `document`.
pub fn image_markdown(document: &Path, image: &Path) -> String {
    markdown_image(&image_reference(document, image))
}

/// 將擷取結果套用到編輯器；失敗只寫入診斷通道。 / Hands a finished capture to the editor.
///
/// Errors, including editor rejections, are written to `diagnostics` and
/// never returned. Returns the image path when something was inserted.
pub fn apply_capture_result<E>(
    document: &Path,
    result: Result<CaptureOutcome, CaptureError>,
    editor: &mut E,
    diagnostics: &DiagnosticsChannel,
) -> Option<PathBuf>
where
    E: EditorInsertion + ?Sized,
{
    let image = match result {
        Ok(CaptureOutcome::Captured(image)) => image,
        Ok(CaptureOutcome::NoOp) => return None,
        Err(err) => {
            diagnostics.append_line(format!("paste image failed: {err}"));
            return None;
        }
    };
    let markdown = image_markdown(document, &image);
    match editor.insert_payload(&markdown) {
        Ok(()) => Some(image),
        Err(err) => {
            diagnostics.append_line(format!("could not insert {markdown}: {err}"));
            None
        }
    }
}

/// 擷取剪貼簿圖片並插入參照。 / Captures the clipboard image and inserts its reference.
///
/// Does nothing, and runs no helper, when `document` is not a content
/// document or belongs to none of `known_roots`.
#[allow(clippy::too_many_arguments)]
pub fn paste_clipboard_image<E>(
    pipeline: &CapturePipeline,
    platform: &Platform,
    document: &Path,
    known_roots: &[WorkspaceRoot],
    extension: &str,
    now: NaiveDateTime,
    editor: &mut E,
    diagnostics: &DiagnosticsChannel,
) -> Option<PathBuf>
where
    E: EditorInsertion + ?Sized,
{
    let request =
        CaptureRequest::for_document(platform.clone(), document, known_roots, now, extension)?;
    let result = pipeline.capture(&request);
    apply_capture_result(document, result, editor, diagnostics)
}
