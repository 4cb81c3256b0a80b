//! Category domain helpers.

/// Derive a URL slug from a category name.
///
/// Lowercases, turns whitespace runs into `-`, drops anything that is not an
/// ASCII word character or `-`, then collapses repeated hyphens and trims
/// them from both ends.
///
/// ```
/// use shopdeploy_domain::category::slugify;
///
/// assert_eq!(slugify("Home & Garden"), "home-garden");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for ch in name.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() || ch == '-' {
            pending_hyphen = true;
        } else if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        }
    }
    slug
}
