//! Title-casing with acronym preservation, used to humanise route and stop
//! descriptions that arrive as ALL CAPS or all-lowercase from source feeds.

use std::collections::HashSet;
use std::sync::OnceLock;

fn acronyms() -> &'static HashSet<&'static str> {
    static ACRONYMS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    ACRONYMS.get_or_init(|| {
        [
            "YMCA", "PH", "P&R", "NHS", "BBC", "RAF", "RSPCA", "A&E", "UK", "USA",
        ]
        .into_iter()
        .collect()
    })
}

/// Title-cases `text`, tokenising on word boundaries (whitespace and `-`/`/`)
/// and leaving recognised acronyms upper-case.
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut word = String::new();

    let flush = |word: &mut String, result: &mut String| {
        if !word.is_empty() {
            result.push_str(&title_case_word(word));
            word.clear();
        }
    };

    for ch in text.chars() {
        if ch.is_whitespace() || ch == '-' || ch == '/' {
            flush(&mut word, &mut result);
            result.push(ch);
        } else {
            word.push(ch);
        }
    }
    flush(&mut word, &mut result);
    result
}

fn title_case_word(word: &str) -> String {
    let upper = word.to_uppercase();
    if acronyms().contains(upper.as_str()) {
        return upper;
    }
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_known_acronyms() {
        assert_eq!(title_case("YMCA - TOWN CENTRE"), "YMCA - Town Centre");
    }

    #[test]
    fn title_cases_plain_words() {
        assert_eq!(title_case("CITY CENTRE bus station"), "City Centre Bus Station");
    }
}
