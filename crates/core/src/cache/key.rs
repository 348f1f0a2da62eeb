//! Canonical cache key derivation.
//!
//! Two requests that differ only in query-parameter order must map to
//! the same key, and a version bump must always produce a different key
//! so cache-format migrations never collide with records of the old
//! shape.

/// Derive a canonical cache key from a URL and a logical version tag.
///
/// Query parameters are sorted lexicographically by name and the query
/// string is rebuilt in that order, so parameter order never affects
/// the key. A URL that fails to parse falls back to the literal
/// `"{url}|v={version}"` form, so key derivation never fails.
pub fn normalize_key(url: &str, version: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            let mut pairs: Vec<(String, String)> = parsed
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            pairs.sort_by(|a, b| a.0.cmp(&b.0));

            if pairs.is_empty() {
                parsed.set_query(None);
            } else {
                let mut query = parsed.query_pairs_mut();
                query.clear();
                for (name, value) in &pairs {
                    query.append_pair(name, value);
                }
                drop(query);
            }

            format!("{parsed}|v={version}")
        }
        Err(_) => format!("{url}|v={version}"),
    }
}
