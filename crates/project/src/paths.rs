//! Content-relative paths, preview URLs and image references.
//! 內容相對路徑、預覽網址與圖片參照。

use std::fmt;
use std::path::{Component, Path};

use crate::workspace::WorkspaceRoot;

/// Name of the content directory below a workspace root.
pub const CONTENT_DIR: &str = "content";

/// Address of the local preview server.
pub const PREVIEW_BASE_URL: &str = "http://localhost:1111";

/// Directory of a document relative to the content root, e.g. `/2021-11-09`.  
/// 文件所在目錄相對於內容根目錄的路徑。
///
/// When the document is outside the content root the value is the unmodified
/// directory string and [`ContentRelativePath::is_relative`] is `false`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentRelativePath {
    value: String,
    relative: bool,
}

impl ContentRelativePath {
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_relative(&self) -> bool {
        self.relative
    }
}

impl fmt::Display for ContentRelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Computes `dirname(path)` with `<root>/content` removed.  
/// 計算 `dirname(path)` 去掉 `<root>/content` 後的部分。
///
/// Segments are joined with `/`, each with a leading slash; the content root
/// itself maps to the empty string.
pub fn content_relative_dir(root: &WorkspaceRoot, path: &Path) -> ContentRelativePath {
    let dir = path.parent().unwrap_or(path);
    match dir.strip_prefix(root.content_root()) {
        Ok(rest) => {
            let mut value = String::new();
            for component in rest.components() {
                if let Component::Normal(segment) = component {
                    value.push('/');
                    value.push_str(&segment.to_string_lossy());
                }
            }
            ContentRelativePath {
                value,
                relative: true,
            }
        }
        Err(_) => ContentRelativePath {
            value: dir.to_string_lossy().into_owned(),
            relative: false,
        },
    }
}

/// Concatenates the base URL with the content-relative directory. No escaping.
pub fn build_preview_url(base_url: &str, dir: &ContentRelativePath) -> String {
    format!("{base_url}{}", dir.as_str())
}

/// Path of `image` as seen from the directory of `document`, `/`-separated.  
/// 從文件目錄看出去的圖片相對路徑。
pub fn image_reference(document: &Path, image: &Path) -> String {
    let from: Vec<Component<'_>> = document
        .parent()
        .unwrap_or(document)
        .components()
        .collect();
    let to: Vec<Component<'_>> = image.components().collect();

    let shared = from
        .iter()
        .zip(to.iter())
        .take_while(|(left, right)| left == right)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in shared..from.len() {
        segments.push("..".to_string());
    }
    for component in &to[shared..] {
        segments.push(component.as_os_str().to_string_lossy().into_owned());
    }
    segments.join("/")
}

/// Markdown image tag pointing at `reference`.
pub fn markdown_image(reference: &str) -> String {
    format!("![]({reference})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn site() -> WorkspaceRoot {
        WorkspaceRoot::new("/home/me/blog")
    }

    #[test]
    fn strips_content_root_from_document_dir() {
        let rel = content_relative_dir(
            &site(),
            Path::new("/home/me/blog/content/2021-11-09/index.md"),
        );
        assert_eq!(rel.as_str(), "/2021-11-09");
        assert!(rel.is_relative());
        assert_eq!(
            build_preview_url(PREVIEW_BASE_URL, &rel),
            "http://localhost:1111/2021-11-09"
        );
    }

    #[test]
    fn nested_sections_keep_every_segment() {
        let rel = content_relative_dir(
            &site(),
            Path::new("/home/me/blog/content/blog/2021/post/index.md"),
        );
        assert_eq!(rel.as_str(), "/blog/2021/post");
    }

    #[test]
    fn document_at_content_root_maps_to_site_root() {
        let rel = content_relative_dir(&site(), Path::new("/home/me/blog/content/_index.md"));
        assert_eq!(rel.as_str(), "");
        assert_eq!(build_preview_url(PREVIEW_BASE_URL, &rel), PREVIEW_BASE_URL);
    }

    #[test]
    fn outside_content_root_returns_directory_unchanged() {
        let rel = content_relative_dir(&site(), Path::new("/home/me/blog/templates/page.md"));
        assert_eq!(rel.as_str(), "/home/me/blog/templates");
        assert!(!rel.is_relative());
    }

    #[test]
    fn repeated_resolution_is_stable() {
        let doc = PathBuf::from("/home/me/blog/content/a/index.md");
        let first = content_relative_dir(&site(), &doc);
        let second = content_relative_dir(&site(), &doc);
        assert_eq!(first, second);
    }

    #[test]
    fn image_beside_document_is_referenced_by_name() {
        let reference = image_reference(
            Path::new("/home/me/blog/content/2021-11-09/index.md"),
            Path::new("/home/me/blog/content/2021-11-09/2021-11-09-14-03-07.png"),
        );
        assert_eq!(reference, "2021-11-09-14-03-07.png");
        assert_eq!(
            markdown_image(&reference),
            "![](2021-11-09-14-03-07.png)"
        );
    }

    #[test]
    fn relocated_image_gets_parent_segments() {
        let reference = image_reference(
            Path::new("/home/me/blog/content/posts/a/index.md"),
            Path::new("/home/me/blog/content/images/shot.png"),
        );
        assert_eq!(reference, "../../images/shot.png");
    }
}
