use indexmap::IndexMap;

/// Query string parameters, keyed in order of first appearance with every
/// value of a repeated key kept in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: IndexMap<String, Vec<String>>,
}

impl Query {
    /// Parses a raw query string. A malformed query (bad percent escape or a
    /// `;` separator) yields an empty query rather than an error.
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = match raw {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Query::default(),
        };

        if !is_well_formed(raw) {
            tracing::debug!(query = raw, "Ignoring malformed query string");
            return Query::default();
        }

        let mut params: IndexMap<String, Vec<String>> = IndexMap::new();
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            params
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }

        Query { params }
    }

    /// First value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    #[cfg(test)]
    pub fn get_all(&self, key: &str) -> Option<&[String]> {
        self.params.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.params
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

fn is_well_formed(raw: &str) -> bool {
    if raw.contains(';') {
        return false;
    }

    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repeated_keys() {
        let query = Query::parse(Some("color=red&dt=Home+Page&cd=1&cd=2"));

        assert_eq!(query.len(), 3);
        assert_eq!(query.get("color"), Some("red"));
        assert_eq!(query.get("dt"), Some("Home Page"));
        assert_eq!(query.get_all("cd").unwrap(), ["1", "2"]);
        assert_eq!(query.get("missing"), None);

        let keys: Vec<&str> = query.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["color", "dt", "cd"]);
    }

    #[test]
    fn test_presence_only_key() {
        let query = Query::parse(Some("useReferer&type=pixel"));

        assert!(query.contains("useReferer"));
        assert_eq!(query.get("useReferer"), Some(""));
        assert_eq!(query.get("type"), Some("pixel"));
    }

    #[test]
    fn test_percent_decoding() {
        let query = Query::parse(Some("dp=%2Fblog%2Fpost&dr=a%26b"));

        assert_eq!(query.get("dp"), Some("/blog/post"));
        assert_eq!(query.get("dr"), Some("a&b"));
    }

    #[test]
    fn test_malformed_query_is_empty() {
        assert!(Query::parse(Some("color=red&dp=%zz")).is_empty());
        assert!(Query::parse(Some("color=red&dp=%4")).is_empty());
        assert!(Query::parse(Some("color=red;type=pixel")).is_empty());
    }

    #[test]
    fn test_empty_query() {
        assert!(Query::parse(None).is_empty());
        assert!(Query::parse(Some("")).is_empty());
        assert!(Query::parse(Some("&&")).is_empty());
    }
}
