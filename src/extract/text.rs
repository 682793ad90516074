use scraper::ElementRef;

/// Collapses every whitespace run to a single space and trims both ends
///
/// Non-breaking spaces count as whitespace. The function is idempotent.
///
/// # Examples
///
/// ```
/// use catalog_harvest::extract::normalize_text;
///
/// assert_eq!(normalize_text("  Bike\n\t X \u{a0}2024 "), "Bike X 2024");
/// ```
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text content of an element and its descendants
pub fn element_text(element: &ElementRef<'_>) -> String {
    normalize_text(&element.text().collect::<String>())
}
