use deunicode::deunicode;

/// slugify
///
/// Transliterates `title` to ASCII ("Café" -> "Cafe", "Привет" -> "Privet"),
/// lower-cases it and collapses every run of characters outside `[a-z0-9]`
/// into a single hyphen, with no hyphen at either end. Total: a title with
/// nothing alphanumeric left after transliteration yields an empty slug.
pub fn slugify(title: &str) -> String {
    deunicode(title)
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Slug candidate for the `n`th row sharing `base` (the first keeps `base` itself).
pub fn with_suffix(base: &str, n: i64) -> String {
    format!("{}-{}", base, n)
}
