//! Output file naming for artifacts.
//!
//! Titles come straight from the client, so they are made filesystem safe before
//! use, and a counter suffix keeps a new artifact from replacing an existing one.

use std::path::Path;

/// Maximum length (in characters) of a sanitized title
pub const MAX_TITLE_CHARS: usize = 100;

/// Replaces path separators and Windows-reserved characters with `_`, then
/// truncates the result to [`MAX_TITLE_CHARS`] characters.
///
/// # Example
///
/// ```
/// use mediarelay::download::naming::sanitize_title;
///
/// assert_eq!(sanitize_title("a/b:c*d"), "a_b_c_d");
/// ```
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .take(MAX_TITLE_CHARS)
        .collect()
}

/// Picks `"{safe_title}.{extension}"`, or the first free `"{safe_title} (N).{extension}"`.
///
/// The check is not atomic with the later file creation: two jobs with the same
/// title can pick the same name if they race.
pub fn unique_name(directory: &Path, safe_title: &str, extension: &str) -> String {
    let mut candidate = format!("{}.{}", safe_title, extension);
    let mut counter: u64 = 1;
    while directory.join(&candidate).exists() {
        candidate = format!("{} ({}).{}", safe_title, counter, extension);
        counter += 1;
    }
    candidate
}
