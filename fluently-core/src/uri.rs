//! URL resolution against a client base URL.

/// Returns `true` when `uri` carries its own scheme.
pub fn is_absolute(uri: &str) -> bool {
    uri.split_once("://")
        .is_some_and(|(scheme, _)| {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        })
}

/// Resolves `uri` against `base`.
///
/// Absolute URLs are returned unchanged. Relative ones are joined to the base
/// with exactly one `/` between them. Without a base the URL is returned as-is.
///
/// ```
/// use fluently_core::uri::resolve;
///
/// assert_eq!(
///     resolve(Some("https://sketch7.com/api/"), "/heroes/azmodan"),
///     "https://sketch7.com/api/heroes/azmodan"
/// );
/// assert_eq!(resolve(Some("https://a.io"), "https://b.io/x"), "https://b.io/x");
/// ```
pub fn resolve(base: Option<&str>, uri: &str) -> String {
    match base {
        _ if is_absolute(uri) => uri.to_owned(),
        Some(base) if uri.is_empty() => base.trim_end_matches('/').to_owned(),
        Some(base) => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            uri.trim_start_matches('/')
        ),
        None => uri.to_owned(),
    }
}
