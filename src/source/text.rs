use crate::error::{ImportError, ImportResult};

/// Locale code of the text the importers keep
pub const ENGLISH: &str = "en";

/// An entry of a localized text list
pub trait Localized {
    fn language(&self) -> &str;
}

/// First English entry, or `None` if there is none
pub fn first_english<T: Localized>(entries: &[T]) -> Option<&T> {
    entries.iter().find(|e| e.language() == ENGLISH)
}

/// Extract the trailing numeric id from a resource URL,
/// e.g. `https://pokeapi.co/api/v2/move/85/` -> 85
pub fn extract_id_from_url(url: &str) -> ImportResult<i64> {
    let segment = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    segment
        .parse::<i64>()
        .map_err(|_| ImportError::format(format!("no numeric id in resource url '{}'", url)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entry(&'static str, &'static str);

    impl Localized for Entry {
        fn language(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_extract_id_from_url() {
        assert_eq!(
            extract_id_from_url("https://pokeapi.co/api/v2/move/85/").unwrap(),
            85
        );
        assert_eq!(
            extract_id_from_url("https://pokeapi.co/api/v2/pokemon-species/10001").unwrap(),
            10001
        );
    }

    #[test]
    fn test_extract_id_rejects_non_numeric() {
        assert!(matches!(
            extract_id_from_url("https://pokeapi.co/api/v2/move/thunderbolt/"),
            Err(ImportError::Format(_))
        ));
        assert!(extract_id_from_url("").is_err());
    }

    #[test]
    fn test_first_english() {
        let entries = [Entry("de", "Donner"), Entry("en", "Thunder"), Entry("en", "Later")];
        assert_eq!(first_english(&entries).map(|e| e.1), Some("Thunder"));

        let none = [Entry("ja", "かみなり")];
        assert!(first_english(&none).is_none());
    }
}
