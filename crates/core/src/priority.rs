//! Keyword rules for suggesting a complaint priority.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Priority;

/// Keyword groups, checked in order. The first keyword found wins.
const RULES: &[(&[&str], Priority)] = &[
    (&["academic", "exam", "professor", "teacher"], Priority::High),
    (&["certificate", "library"], Priority::Low),
    (&["infrastructure", "lab"], Priority::Medium),
    (&["plug"], Priority::Low),
    (&["water"], Priority::Medium),
    (&["emergency", "security", "guard"], Priority::High),
    (&["food", "canteen", "mess"], Priority::Low),
    (&["clean", "insect"], Priority::High),
    (&["mosquito", "wifi"], Priority::Medium),
    (&["ac"], Priority::High),
    (&["fan"], Priority::Low),
    (&["noise"], Priority::Medium),
    (&["parking"], Priority::Low),
    (&["bathroom", "leak", "lift", "hostel"], Priority::High),
];

static KEYWORD_PATTERNS: LazyLock<Vec<(Regex, Priority)>> = LazyLock::new(|| {
    RULES
        .iter()
        .flat_map(|(words, priority)| words.iter().map(move |word| (*word, *priority)))
        .filter_map(|(word, priority)| {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word)))
                .ok()
                .map(|re| (re, priority))
        })
        .collect()
});

/// Suggest a priority for free text, or `None` when no keyword matches.
///
/// Matching is case-insensitive and whole-word, so "fan" does not match
/// "fantastic".
#[must_use]
pub fn suggest_priority(text: &str) -> Option<Priority> {
    KEYWORD_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, priority)| *priority)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_match() {
        assert_eq!(suggest_priority("The LIFT is stuck"), Some(Priority::High));
        assert_eq!(suggest_priority("wifi keeps dropping"), Some(Priority::Medium));
        assert_eq!(suggest_priority("Canteen closes early"), Some(Priority::Low));
        assert_eq!(suggest_priority("nothing relevant here"), None);
    }

    #[test]
    fn test_whole_word_only() {
        assert_eq!(suggest_priority("a fantastic lecture"), None);
        assert_eq!(suggest_priority("the ac unit"), Some(Priority::High));
        assert_eq!(suggest_priority("academy"), None);
    }

    #[test]
    fn test_table_order_wins() {
        // "library" sits above "leak" in the table.
        assert_eq!(suggest_priority("leak in the library"), Some(Priority::Low));
        // "exam" sits above "fan".
        assert_eq!(suggest_priority("fan noise during exam"), Some(Priority::High));
    }
}
