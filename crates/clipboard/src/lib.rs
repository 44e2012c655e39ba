//! Clipboard classification into Zola shortcodes.
//! （將剪貼簿文字分類為 Zola 短代碼。）

use once_cell::sync::Lazy;
use regex::Regex;

/// Loose "looks like an http(s) URL" gate applied before any site rule.
static URL_GATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("valid URL gate pattern"));

static EMBED_RULES: Lazy<Vec<EmbedRule>> = Lazy::new(|| {
    vec![
        EmbedRule::new(
            r"^https?://(?:www\.|m\.)?youtube\.com/watch\?(?:[^\s#]*&)?v=(?P<id>[A-Za-z0-9_-]+)",
            EmbedKind::YouTube,
        ),
        EmbedRule::new(
            r"^https?://(?:www\.|mobile\.)?twitter\.com/[A-Za-z0-9_]+/status/(?P<id>[0-9]+)",
            EmbedKind::Twitter,
        ),
        EmbedRule::new(
            r"^https?://(?:www\.)?instagram\.com/p/(?P<id>[A-Za-z0-9_-]+)",
            EmbedKind::Instagram,
        ),
    ]
});

/// Site whose links are turned into a shortcode.
/// （可轉換為短代碼的網站。）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedKind {
    YouTube,
    Twitter,
    Instagram,
}

impl EmbedKind {
    /// Shortcode name understood by the site templates.
    pub fn shortcode(self) -> &'static str {
        match self {
            EmbedKind::YouTube => "youtube",
            EmbedKind::Twitter => "twitter",
            EmbedKind::Instagram => "instagram",
        }
    }
}

/// Outcome of classifying clipboard text.
/// （剪貼簿文字的分類結果。）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    YouTube(String),
    Twitter(String),
    Instagram(String),
    RawText(String),
}

impl Classification {
    fn embed(kind: EmbedKind, id: String) -> Self {
        match kind {
            EmbedKind::YouTube => Classification::YouTube(id),
            EmbedKind::Twitter => Classification::Twitter(id),
            EmbedKind::Instagram => Classification::Instagram(id),
        }
    }

    pub fn is_embed(&self) -> bool {
        !matches!(self, Classification::RawText(_))
    }

    /// Text handed to the editor: a shortcode, or the clipboard text verbatim.
    pub fn render(&self) -> String {
        match self {
            Classification::YouTube(id) => embed_code(EmbedKind::YouTube, id),
            Classification::Twitter(id) => embed_code(EmbedKind::Twitter, id),
            Classification::Instagram(id) => embed_code(EmbedKind::Instagram, id),
            Classification::RawText(text) => text.clone(),
        }
    }
}

/// Formats `{{ <name>(id="<id>")}}`.
pub fn embed_code(kind: EmbedKind, id: &str) -> String {
    format!("{{{{ {}(id=\"{}\")}}}}", kind.shortcode(), id)
}

/// Pairs a pattern exposing an `id` group with the shortcode it produces.
/// （將含 `id` 擷取群組的樣式與短代碼配對。）
#[derive(Clone)]
struct EmbedRule {
    regex: Regex,
    kind: EmbedKind,
}

impl EmbedRule {
    fn new(pattern: &str, kind: EmbedKind) -> Self {
        Self {
            regex: Regex::new(pattern).expect("valid embed pattern"),
            kind,
        }
    }

    fn extract(&self, text: &str) -> Option<String> {
        self.regex
            .captures(text)
            .and_then(|captures| captures.name("id"))
            .map(|id| id.as_str().to_string())
    }
}

/// Classifies clipboard text. Pure and deterministic.
/// （分類剪貼簿文字；純函式。）
///
/// Text that does not look like a URL is returned as-is without trying any
/// site rule. URLs are tried against the rules in priority order
/// (YouTube, Twitter, Instagram); the first match wins. A URL matching no
/// rule is returned verbatim.
pub fn classify(clipboard_text: &str) -> Classification {
    let candidate = clipboard_text.trim();
    if !URL_GATE.is_match(candidate) {
        return Classification::RawText(clipboard_text.to_string());
    }
    EMBED_RULES
        .iter()
        .find_map(|rule| {
            rule.extract(candidate)
                .map(|id| Classification::embed(rule.kind, id))
        })
        .unwrap_or_else(|| Classification::RawText(clipboard_text.to_string()))
}

/// Wraps `body` in a `block()` shortcode.
pub fn block_snippet(body: &str) -> String {
    format!("{{% block() %}}\n{body}\n{{% end %}}")
}
