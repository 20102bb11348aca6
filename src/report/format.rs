use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Window node names: `nsGlobalWindowInner # 124 inner chrome://browser/content/browser.xhtml`.
static WINDOW_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"nsGlobalWindow(?:Inner|Outer) # \d+ (?:inner|outer) (\S+)")
        .expect("window name pattern is valid")
});

/// `JS Object (Function - getChromeURI)` -> `JS Function - getChromeURI`.
static JS_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^JS Object \((.+)\)$").expect("js object pattern is valid"));

/// Shortens verbose JS object wrapper names. Other names pass through untouched.
pub fn clean_name(name: &str) -> Cow<'_, str> {
    JS_OBJECT_RE.replace(name, "JS $1")
}

/// Extracts the URL embedded in a window node name, if the name has that shape.
pub fn extract_url(name: &str) -> Option<&str> {
    WINDOW_NAME_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Annotation appended to root nodes: `[root, N unknown ref(s)]`.
pub fn root_annotation(ref_count: u64, known_edges: u64) -> String {
    let unknown = ref_count as i64 - known_edges as i64;
    format!("[root, {unknown} unknown ref(s)]")
}
