//! Utility functions for file name and object path manipulation

/// Names the wiki accepts for the file namespace regardless of site language
pub const FILE_NAMESPACE_ALIASES: &[&str] = &["File", "Image", "Media"];

/// Strip a file namespace prefix (e.g. `File:`) from an image reference
///
/// The prefix is removed only when the text before the first `:` names one
/// of `namespaces` (case-insensitively, `_` counting as a space). Any other
/// colon is part of the file name.
///
/// # Examples
///
/// ```
/// use wiki_image_sync::utils::{FILE_NAMESPACE_ALIASES, strip_namespace};
///
/// assert_eq!(strip_namespace("File:car.jpg", FILE_NAMESPACE_ALIASES), "car.jpg");
/// assert_eq!(
///     strip_namespace("File:Map: north.png", FILE_NAMESPACE_ALIASES),
///     "Map: north.png"
/// );
/// assert_eq!(strip_namespace("Map: north.png", FILE_NAMESPACE_ALIASES), "Map: north.png");
/// ```
#[must_use]
pub fn strip_namespace<'a, S: AsRef<str>>(reference: &'a str, namespaces: &[S]) -> &'a str {
    let Some((prefix, rest)) = reference.split_once(':') else {
        return reference;
    };
    let prefix = normalize_namespace(prefix);
    if namespaces
        .iter()
        .any(|ns| normalize_namespace(ns.as_ref()) == prefix)
    {
        rest.trim_start()
    } else {
        reference
    }
}

fn normalize_namespace(name: &str) -> String {
    name.trim().replace('_', " ").to_lowercase()
}

/// Normalize whitespace the way wiki titles do
///
/// Leading and trailing whitespace is dropped and every interior run of
/// whitespace becomes a single underscore.
///
/// # Examples
///
/// ```
/// use wiki_image_sync::utils::normalize_title;
///
/// assert_eq!(normalize_title("Red  car photo.jpg"), "Red_car_photo.jpg");
/// assert_eq!(normalize_title(" logo.png "), "logo.png");
/// ```
#[must_use]
pub fn normalize_title(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Last dot-delimited segment of a file name
///
/// A name without a dot is its own last segment.
#[must_use]
pub fn extension_segment(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => name,
    }
}

/// File name with its final extension removed
///
/// # Examples
///
/// ```
/// use wiki_image_sync::utils::strip_extension;
///
/// assert_eq!(strip_extension("car.jpg"), "car");
/// assert_eq!(strip_extension("holiday.2024.png"), "holiday.2024");
/// assert_eq!(strip_extension("README"), "README");
/// ```
#[must_use]
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Build the blob storage path for an image: `<prefix>/<source_tag>/<file_name>`
///
/// Empty prefix or tag segments are skipped rather than producing `//`.
///
/// # Examples
///
/// ```
/// use wiki_image_sync::utils::blob_path;
///
/// assert_eq!(blob_path("images", "lakeside", "car.jpg"), "images/lakeside/car.jpg");
/// assert_eq!(blob_path("images/", "/lakeside/", "car.jpg"), "images/lakeside/car.jpg");
/// ```
#[must_use]
pub fn blob_path(prefix: &str, source_tag: &str, file_name: &str) -> String {
    [prefix, source_tag, file_name]
        .iter()
        .map(|segment| segment.trim_matches('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
