//! Case-insensitive response header map.

/// Response headers with case-insensitive lookup.
///
/// Insertion order is preserved for iteration. Duplicate keys resolve to
/// the first occurrence on lookup; this matches the wire behavior of the
/// original client and is documented rather than changed.
#[derive(Clone, Debug, Default)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    /// An empty header map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a map from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a raw response header block.
    ///
    /// Accepts RFC-style CRLF-terminated lines; a leading status line
    /// (`HTTP/…`) is skipped. Each remaining line splits at the first
    /// `:`, with surrounding whitespace trimmed from the value. Lines
    /// without a `:` are ignored.
    #[must_use]
    pub fn parse(block: &str) -> Self {
        let mut map = Self::new();
        for line in block.split("\r\n") {
            let line = line.trim_end_matches('\n');
            if line.is_empty() || line.starts_with("HTTP/") {
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                map.push(key.trim(), value.trim());
            }
        }
        map
    }

    /// Append one header.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Look up a header value, case-insensitively. First occurrence wins.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Iterate headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of stored headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_block_with_status_line() {
        let map = HeaderMap::parse("HTTP/1.1 429\r\nX-RateLimit-RetryAfter: 30\r\n\r\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("X-RateLimit-RetryAfter"), Some("30"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let map = HeaderMap::parse("Content-Type: application/json\r\n");
        assert_eq!(map.get("content-type"), Some("application/json"));
        assert_eq!(map.get("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(map.get("Content-Type"), Some("application/json"));
    }

    #[test]
    fn missing_key_is_none() {
        let map = HeaderMap::parse("Accept: */*\r\n");
        assert_eq!(map.get("Authorization"), None);
    }

    #[test]
    fn values_are_trimmed() {
        let map = HeaderMap::parse("Server:   nginx  \r\n");
        assert_eq!(map.get("Server"), Some("nginx"));
    }

    #[test]
    fn value_may_contain_colons() {
        let map = HeaderMap::parse("Location: https://example.com:8443/next\r\n");
        assert_eq!(map.get("Location"), Some("https://example.com:8443/next"));
    }

    #[test]
    fn duplicates_resolve_to_first() {
        let map = HeaderMap::parse("Set-Thing: first\r\nSet-Thing: second\r\n");
        assert_eq!(map.get("set-thing"), Some("first"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let map = HeaderMap::parse("B: 2\r\nA: 1\r\nC: 3\r\n");
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["B", "A", "C"]);
    }

    #[test]
    fn from_pairs_and_push() {
        let mut map = HeaderMap::from_pairs([("Accept", "application/json")]);
        map.push("Authorization", "Bearer tok");
        assert_eq!(map.get("ACCEPT"), Some("application/json"));
        assert_eq!(map.get("authorization"), Some("Bearer tok"));
    }

    #[test]
    fn empty_block() {
        let map = HeaderMap::parse("");
        assert!(map.is_empty());
    }
}
