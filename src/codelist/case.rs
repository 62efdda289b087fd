use regex::Regex;
use std::sync::LazyLock;

#[expect(clippy::unwrap_used)]
static CAPITALISED_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(.)([A-Z][a-z]+)").unwrap());

#[expect(clippy::unwrap_used)]
static LOWER_THEN_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("([a-z0-9])([A-Z])").unwrap());

/// Converts a camelCase codelist identifier to lower case words joined by `-`.
///
/// Interest codes are already published in this form (`voting-rights`), so
/// person and entity types converted here line up with them.
pub fn camel_to_snake(name: &str) -> String {
    let name = CAPITALISED_WORD.replace_all(name, "${1}-${2}");
    LOWER_THEN_UPPER
        .replace_all(&name, "${1}-${2}")
        .to_lowercase()
}
