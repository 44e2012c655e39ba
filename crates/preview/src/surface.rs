use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::{PreviewError, RenderSurface, SurfaceOptions};

/// 預覽頁面的預設檔名。 / Default file name of the preview page.
pub const SURFACE_FILE_NAME: &str = "zolapad-preview.html";

/// 產生以 iframe 嵌入預覽網址的頁面。 / Renders the page that frames the preview URL.
///
/// `token` changes on every rewrite so the host never treats two renders as
/// identical content and always reloads the frame.
pub fn render_preview_html(url: &str, token: u64, options: SurfaceOptions) -> String {
    let policy = if options.enable_scripts {
        ""
    } else {
        "<meta http-equiv=\"Content-Security-Policy\" content=\"script-src 'none'\">\n"
    };
    let sandbox = if options.enable_scripts {
        ""
    } else {
        " sandbox=\"allow-same-origin\""
    };
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"zolapad-token\" content=\"{token:016x}\">\n\
         {policy}\
         <title>Zola preview</title>\n\
         <style>html, body, iframe {{ margin: 0; padding: 0; border: 0; width: 100%; height: 100%; }}</style>\n\
         </head>\n\
         <body>\n\
         <iframe src=\"{url}\" title=\"Zola preview\"{sandbox}></iframe>\n\
         </body>\n\
         </html>\n"
    )
}

/// 將預覽頁寫入檔案的表面。 / Render surface backed by an HTML file on disk.
#[derive(Debug)]
pub struct HtmlFileSurface {
    path: PathBuf,
}

impl HtmlFileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RenderSurface for HtmlFileSurface {
    fn set_html(&mut self, html: &str) -> Result<(), PreviewError> {
        let surface_error = |source| PreviewError::Surface {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(surface_error)?;
        }
        let tmp_path = self.path.with_extension("html.tmp");
        fs::write(&tmp_path, html.as_bytes()).map_err(surface_error)?;
        fs::rename(&tmp_path, &self.path).map_err(surface_error)?;
        log::debug!("preview page written to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SCRIPTS: SurfaceOptions = SurfaceOptions {
        enable_scripts: true,
    };

    #[test]
    fn page_frames_url_and_carries_token() {
        let html = render_preview_html("http://localhost:1111/blog", 0xabc, SCRIPTS);
        assert!(html.contains("<iframe src=\"http://localhost:1111/blog\""));
        assert!(html.contains("content=\"0000000000000abc\""));
        assert!(!html.contains("Content-Security-Policy"));
        assert!(!html.contains("sandbox"));
    }

    #[test]
    fn tokens_make_identical_urls_differ() {
        let first = render_preview_html("http://localhost:1111", 1, SCRIPTS);
        let second = render_preview_html("http://localhost:1111", 2, SCRIPTS);
        assert_ne!(first, second);
    }

    #[test]
    fn disabled_scripts_add_policy() {
        let html = render_preview_html(
            "http://localhost:1111",
            7,
            SurfaceOptions {
                enable_scripts: false,
            },
        );
        assert!(html.contains("script-src 'none'"));
        assert!(html.contains("sandbox=\"allow-same-origin\""));
    }

    #[test]
    fn file_surface_rewrites_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join(SURFACE_FILE_NAME);
        let mut surface = HtmlFileSurface::new(&path);
        surface.set_html("first").unwrap();
        surface.set_html("second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }
}
