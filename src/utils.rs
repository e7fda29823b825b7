// src/utils.rs
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Name used when a URL has no usable last path segment.
pub const DEFAULT_FILENAME: &str = "document.pdf";

/// Everything except `A-Z a-z 0-9 - _ . ~` is escaped, so an encoded value
/// can sit inside a query string or a markdown link target unchanged.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Reject `javascript:` and `data:` URLs. Relative paths and http(s) pass.
pub fn is_safe_url(url: &str) -> bool {
    let trimmed = url.trim().to_ascii_lowercase();
    if trimmed.is_empty() {
        return false;
    }
    !(trimmed.starts_with("javascript:") || trimmed.starts_with("data:"))
}

fn is_absolute_http(href: &str) -> bool {
    let lower = href.get(..8).unwrap_or(href).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolve a PDF href against the current route.
///
/// - absolute http(s) URL: returned as-is
/// - root-relative (`/...`): prefixed with `base_path`
/// - anything else: joined onto the route's directory, with `.` and `..`
///   collapsed. `..` never climbs above the root.
pub fn resolve_pdf_url(href: &str, base_path: &str, current_route: &str) -> String {
    if is_absolute_http(href) {
        return href.to_string();
    }

    let base = base_path.strip_suffix('/').unwrap_or(base_path);

    if href.starts_with('/') {
        return format!("{}{}", base, href);
    }

    let route = if current_route.is_empty() {
        "/"
    } else {
        current_route
    };
    let route_dir = match route.rfind('/') {
        Some(idx) => &route[..idx],
        None => route,
    };

    let mut segments: Vec<&str> = Vec::new();
    for part in route_dir.split('/').chain(href.split('/')) {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("{}/{}", base, segments.join("/"))
}

/// Last path segment of `url`, ignoring query and fragment.
pub fn filename_from_url(url: &str) -> String {
    let path = url.split('?').next().unwrap_or_default();
    let path = path.split('#').next().unwrap_or_default();
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_FILENAME.to_string(),
    }
}

/// Escape a value for use inside a double- or single-quoted HTML attribute
/// (also safe for text content).
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

pub fn decode_component(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

// ------ ROUTE STATE IN THE LOCATION FRAGMENT ------
//
// Docsify keeps its route in the fragment (`#/guide/page?x=1`), so the
// route-state parameter lives in the fragment's own query segment.

fn split_hash_query(hash: &str) -> (&str, Option<&str>) {
    match hash.find('?') {
        Some(idx) => (&hash[..idx], Some(&hash[idx + 1..])),
        None => (hash, None),
    }
}

/// `path` as a fragment. An empty location hash has no leading `#`.
fn as_fragment(path: &str) -> String {
    if path.starts_with('#') {
        path.to_string()
    } else {
        format!("#{}", path)
    }
}

fn param_key(pair: &str) -> &str {
    pair.split('=').next().unwrap_or_default()
}

/// Returns `hash` with `name=value` set, replacing an existing `name`.
pub fn hash_with_param(hash: &str, name: &str, value: &str) -> String {
    let (path, query) = split_hash_query(hash);
    let entry = format!("{}={}", name, encode_component(value));

    let mut pairs: Vec<String> = Vec::new();
    let mut replaced = false;
    for pair in query.unwrap_or_default().split('&').filter(|p| !p.is_empty()) {
        if param_key(pair) == name {
            if !replaced {
                pairs.push(entry.clone());
                replaced = true;
            }
        } else {
            pairs.push(pair.to_string());
        }
    }
    if !replaced {
        pairs.push(entry);
    }

    format!("{}?{}", as_fragment(path), pairs.join("&"))
}

/// Returns `hash` without `name`, or `None` when the parameter is absent.
pub fn hash_without_param(hash: &str, name: &str) -> Option<String> {
    let (path, query) = split_hash_query(hash);
    let query = query?;

    let pairs: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();
    let kept: Vec<&str> = pairs
        .iter()
        .copied()
        .filter(|pair| param_key(pair) != name)
        .collect();
    if kept.len() == pairs.len() {
        return None;
    }

    if kept.is_empty() {
        Some(as_fragment(path))
    } else {
        Some(format!("{}?{}", as_fragment(path), kept.join("&")))
    }
}

pub fn hash_has_param(hash: &str, name: &str) -> bool {
    match split_hash_query(hash) {
        (_, Some(query)) => query.split('&').any(|pair| param_key(pair) == name),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_safe_url_rejects_script_schemes() {
        assert!(!is_safe_url("javascript:alert(1)"));
        assert!(!is_safe_url("  JavaScript:alert(1)"));
        assert!(!is_safe_url("data:text/html,<script>alert(1)</script>"));
        assert!(!is_safe_url("DATA:application/pdf;base64,AAAA"));
        assert!(!is_safe_url(""));
        assert!(!is_safe_url("   "));
    }

    #[test]
    fn test_safe_url_accepts_http_and_relative() {
        assert!(is_safe_url("https://x/y.pdf"));
        assert!(is_safe_url("http://example.com/a.pdf"));
        assert!(is_safe_url("docs/a.pdf"));
        assert!(is_safe_url("/a.pdf"));
        assert!(is_safe_url("../a.pdf"));
    }

    #[test]
    fn test_resolve_parent_relative() {
        assert_eq!(resolve_pdf_url("../x.pdf", "", "/a/b/page"), "/a/x.pdf");
        assert_eq!(
            resolve_pdf_url("../x.pdf", "/docs", "/a/b/page"),
            "/docs/a/x.pdf"
        );
    }

    #[test]
    fn test_resolve_root_relative_ignores_route() {
        assert_eq!(resolve_pdf_url("/x.pdf", "/docs", "/a/b/page"), "/docs/x.pdf");
        assert_eq!(resolve_pdf_url("/x.pdf", "/docs/", "/"), "/docs/x.pdf");
        assert_eq!(resolve_pdf_url("/x.pdf", "", "/deep/er/route"), "/x.pdf");
    }

    #[test]
    fn test_resolve_absolute_passthrough() {
        let url = "https://cdn.example.com/files/a.pdf?v=2";
        assert_eq!(resolve_pdf_url(url, "/docs", "/a/b"), url);
        assert_eq!(resolve_pdf_url("HTTP://X/Y.PDF", "/docs", "/"), "HTTP://X/Y.PDF");
    }

    #[test]
    fn test_resolve_relative_against_route_directory() {
        assert_eq!(resolve_pdf_url("files/a.pdf", "", "/guide/intro"), "/guide/files/a.pdf");
        assert_eq!(resolve_pdf_url("./a.pdf", "", "/guide/intro"), "/guide/a.pdf");
        assert_eq!(resolve_pdf_url("a.pdf", "", "/"), "/a.pdf");
        assert_eq!(resolve_pdf_url("a.pdf", "", ""), "/a.pdf");
    }

    #[test]
    fn test_resolve_clamps_at_root() {
        assert_eq!(resolve_pdf_url("../../../x.pdf", "", "/a/page"), "/x.pdf");
        assert_eq!(resolve_pdf_url("../../x.pdf", "/docs", "/"), "/docs/x.pdf");
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(filename_from_url("/docs/files/report.pdf"), "report.pdf");
        assert_eq!(filename_from_url("report.pdf?download=1#page=3"), "report.pdf");
        assert_eq!(filename_from_url("https://x/y/"), DEFAULT_FILENAME);
        assert_eq!(filename_from_url(""), DEFAULT_FILENAME);
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(
            escape_attr(r#"a"b'c<d>&e"#),
            "a&quot;b&#39;c&lt;d&gt;&amp;e"
        );
        assert_eq!(escape_attr("plain.pdf"), "plain.pdf");
    }

    #[test]
    fn test_component_encoding_escapes_reserved() {
        assert_eq!(encode_component("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(encode_component("calc(50vh)"), "calc%2850vh%29");
        assert_eq!(decode_component("a%20b%26c%3Dd"), "a b&c=d");
    }

    #[test]
    fn test_hash_param_append_and_update() {
        assert_eq!(
            hash_with_param("#/guide", "pdf", "/docs/a.pdf"),
            "#/guide?pdf=%2Fdocs%2Fa.pdf"
        );
        assert_eq!(
            hash_with_param("#/guide?x=1", "pdf", "a.pdf"),
            "#/guide?x=1&pdf=a.pdf"
        );
        assert_eq!(
            hash_with_param("#/guide?pdf=old.pdf&x=1", "pdf", "new.pdf"),
            "#/guide?pdf=new.pdf&x=1"
        );
    }

    #[test]
    fn test_hash_param_removal() {
        assert_eq!(
            hash_without_param("#/guide?pdf=a.pdf", "pdf"),
            Some("#/guide".to_string())
        );
        assert_eq!(
            hash_without_param("#/guide?x=1&pdf=a.pdf", "pdf"),
            Some("#/guide?x=1".to_string())
        );
        assert_eq!(hash_without_param("#/guide?x=1", "pdf"), None);
        assert_eq!(hash_without_param("#/guide", "pdf"), None);
    }

    #[test]
    fn test_hash_param_on_empty_fragment() {
        assert_eq!(hash_with_param("", "pdf", "/a.pdf"), "#?pdf=%2Fa.pdf");
        assert_eq!(hash_with_param("#", "pdf", "a.pdf"), "#?pdf=a.pdf");
        assert_eq!(hash_without_param("#?pdf=a.pdf", "pdf"), Some("#".to_string()));
        assert_eq!(hash_without_param("?pdf=a.pdf", "pdf"), Some("#".to_string()));
    }

    #[test]
    fn test_hash_has_param() {
        assert!(hash_has_param("#/g?pdf=a.pdf", "pdf"));
        assert!(!hash_has_param("#/g?pdfx=a.pdf", "pdf"));
        assert!(!hash_has_param("#/g", "pdf"));
    }

    proptest! {
        #[test]
        fn test_resolve_is_idempotent_on_absolute(
            host in "[a-z]{1,10}",
            path in "[a-zA-Z0-9/_.-]{0,30}",
            base in "(/[a-z]{1,6}){0,2}",
            route in "(/[a-z]{1,6}){0,3}",
        ) {
            let url = format!("https://{}/{}", host, path);
            let once = resolve_pdf_url(&url, &base, &route);
            let twice = resolve_pdf_url(&once, &base, &route);
            prop_assert_eq!(once, twice);
        }
    }
}
