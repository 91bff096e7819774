/// Normalize a string for case-insensitive matching.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
}

/// A query is active only when it has non-whitespace content; a blank
/// query means "no filter".
pub fn active_query(query: &str) -> Option<&str> {
    if query.trim().is_empty() {
        None
    } else {
        Some(query)
    }
}

/// Case-insensitive substring match of `query` anywhere in `name`.
pub fn name_matches(name: &str, query: &str) -> bool {
    normalize(name).contains(&normalize(query))
}
