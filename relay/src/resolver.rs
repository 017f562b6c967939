use crate::query::Query;
use percent_encoding::percent_decode_str;

/// What a beacon request asks for, taken from its path, query and referrer.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    /// Tracking ID, the first path segment
    pub account: String,
    /// Everything after the first segment, absent for `/{account}`
    pub page: Option<String>,
    pub query: Query,
    /// Raw `Referer` header, empty when absent
    pub referer: String,
}

pub fn resolve(path: &str, raw_query: Option<&str>, referer: Option<&str>) -> ResolvedRequest {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let trimmed = decoded.trim_matches('/');
    let query = Query::parse(raw_query);
    let referer = referer.unwrap_or_default();

    let (mut account, mut page) = split_segments(trimmed);

    // With ?useReferer the referring page is tracked instead of the path
    if query.contains("useReferer") && !referer.is_empty() {
        let stripped = strip_scheme(referer);
        if !stripped.is_empty() {
            (account, page) = split_segments(&format!("{trimmed}/{stripped}"));
        }
    }

    ResolvedRequest {
        account,
        page,
        query,
        referer: referer.to_string(),
    }
}

fn split_segments(path: &str) -> (String, Option<String>) {
    match path.split_once('/') {
        Some((account, page)) => (account.to_string(), Some(page.to_string())),
        None => (path.to_string(), None),
    }
}

/// Removes the first `http://` and then the first `https://`.
fn strip_scheme(referer: &str) -> String {
    referer.replacen("http://", "", 1).replacen("https://", "", 1)
}
