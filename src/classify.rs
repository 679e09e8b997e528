/// Description tone
///
/// Maps a free-text description to a coarse tone label by keyword scoring.
/// The keyword lists are data: tune `DEFAULT_KEYWORDS` without touching the
/// scoring logic.
///
/// # Examples
///
/// ```
/// use catalog_dashboard::{classify, ContentCategory};
///
/// assert_eq!(classify(Some("A story of family and love")), ContentCategory::FamilyFriendly);
/// assert_eq!(classify(Some("War and death")), ContentCategory::Intense);
/// assert_eq!(classify(None), ContentCategory::Neutral);
/// ```

use serde::{Serialize, Serializer};
use std::fmt;

/// Tone label derived from a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentCategory {
    FamilyFriendly,
    Intense,
    Neutral,
}

impl ContentCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ContentCategory::FamilyFriendly => "Family-Friendly",
            ContentCategory::Intense => "Intense",
            ContentCategory::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ContentCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Negative and positive keyword lists. Keywords are lower-case.
#[derive(Debug, Clone, Copy)]
pub struct KeywordSet {
    pub negative: &'static [&'static str],
    pub positive: &'static [&'static str],
}

pub const DEFAULT_KEYWORDS: KeywordSet = KeywordSet {
    negative: &["kill", "violence", "murder", "death", "war", "crime", "blood"],
    positive: &["love", "family", "friendship", "comedy", "romance", "adventure", "fun"],
};

/// Classify a description with the default keyword lists.
pub fn classify(description: Option<&str>) -> ContentCategory {
    classify_with(&DEFAULT_KEYWORDS, description)
}

/// Classify a description against `keywords`.
///
/// Each keyword scores at most once, as a case-insensitive substring match.
/// More negative hits → Intense, more positive hits → Family-Friendly,
/// anything else (tie, no hits, absent text) → Neutral.
pub fn classify_with(keywords: &KeywordSet, description: Option<&str>) -> ContentCategory {
    let text = match description {
        Some(text) => text.to_lowercase(),
        None => return ContentCategory::Neutral,
    };

    let score = |list: &[&str]| list.iter().filter(|kw| text.contains(*kw)).count();
    let negative = score(keywords.negative);
    let positive = score(keywords.positive);

    if negative > positive {
        ContentCategory::Intense
    } else if positive > negative {
        ContentCategory::FamilyFriendly
    } else {
        ContentCategory::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_labels() {
        assert_eq!(classify(Some("a story of family and love")), ContentCategory::FamilyFriendly);
        assert_eq!(classify(Some("war and death")), ContentCategory::Intense);
        assert_eq!(classify(Some("a quiet documentary")), ContentCategory::Neutral);
        assert_eq!(classify(None), ContentCategory::Neutral);
        assert_eq!(classify(Some("")), ContentCategory::Neutral);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify(Some("MURDER in the FAMILY, BLOOD everywhere")), ContentCategory::Intense);
    }

    #[test]
    fn test_tie_is_neutral() {
        assert_eq!(classify(Some("love and war")), ContentCategory::Neutral);
    }

    #[test]
    fn test_keyword_counts_once() {
        // "kill" appears three times but scores once; two distinct positives win
        assert_eq!(
            classify(Some("kill kill kill, but with friendship and fun")),
            ContentCategory::FamilyFriendly
        );
    }

    #[test]
    fn test_substring_matches() {
        // "warm" contains "war", "funny" contains "fun"
        assert_eq!(classify(Some("a warm and funny tale")), ContentCategory::Neutral);
        assert_eq!(classify(Some("warriors")), ContentCategory::Intense);
    }

    #[test]
    fn test_custom_keywords() {
        let keywords = KeywordSet {
            negative: &["zombie"],
            positive: &["puppy"],
        };
        assert_eq!(classify_with(&keywords, Some("Zombie outbreak")), ContentCategory::Intense);
        assert_eq!(classify_with(&keywords, Some("war")), ContentCategory::Neutral);
    }

    #[test]
    fn test_deterministic() {
        let d = Some("crime family saga");
        assert_eq!(classify(d), classify(d));
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&ContentCategory::FamilyFriendly).unwrap();
        assert_eq!(json, "\"Family-Friendly\"");
    }
}
