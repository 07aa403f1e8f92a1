use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<script.*?</script>").unwrap());
static STYLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<style.*?</style>").unwrap());
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</p>|</div>|</tr>|</h[1-6]>").unwrap());
static CELL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</t[dh]>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\r\f]+").unwrap());

/// Reduce an HTML rendition to line-oriented plain text: entities decoded,
/// scripts/styles/comments removed, block and row boundaries turned into
/// newlines, table cells separated, remaining tags stripped, Unicode
/// normalized to NFKC.
pub fn strip_markup(content: &str) -> String {
    let mut text = decode_html_entities(content).into_owned();
    text = SCRIPT_RE.replace_all(&text, "").into_owned();
    text = STYLE_RE.replace_all(&text, "").into_owned();
    text = COMMENT_RE.replace_all(&text, "").into_owned();
    text = CELL_RE.replace_all(&text, " | ").into_owned();
    text = BREAK_RE.replace_all(&text, "\n").into_owned();
    text = TAG_RE.replace_all(&text, " ").into_owned();
    normalize_whitespace(&text.nfkc().collect::<String>())
}

/// Collapse runs of horizontal whitespace and trim every line, dropping
/// lines that end up empty.
pub fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| SPACES_RE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rough token count used by the boilerplate heuristics.
pub fn token_count(line: &str) -> usize {
    line.split_whitespace().count()
}
