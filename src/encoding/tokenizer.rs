use super::EncodingError;

/// Characters stripped from text before splitting. Matches the filter set
/// the deployed model's vocabulary was built with; the apostrophe is kept.
pub const DEFAULT_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

pub const DEFAULT_SEPARATOR: &str = " ";

/// Splits raw text into normalized word tokens.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    filters: Vec<char>,
    lowercase: bool,
    separator: String,
}

impl Tokenizer {
    pub fn new(filters: &str, lowercase: bool, separator: &str) -> Result<Self, EncodingError> {
        if separator.is_empty() {
            return Err(EncodingError::EmptySeparator);
        }

        let mut filters: Vec<char> = filters.chars().collect();
        filters.sort_unstable();
        filters.dedup();

        Ok(Self {
            filters,
            lowercase,
            separator: separator.to_string(),
        })
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        split_words(text, &self.filters, self.lowercase, &self.separator)
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn lowercase(&self) -> bool {
        self.lowercase
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        let mut filters: Vec<char> = DEFAULT_FILTERS.chars().collect();
        filters.sort_unstable();

        Self {
            filters,
            lowercase: true,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

/// Lowercases (optionally), maps every filter character to `separator`,
/// splits on `separator` and drops empty pieces.
pub fn tokenize(text: &str, filters: &str, lowercase: bool, separator: char) -> Vec<String> {
    let mut filters: Vec<char> = filters.chars().collect();
    filters.sort_unstable();
    let mut buf = [0u8; 4];
    split_words(text, &filters, lowercase, separator.encode_utf8(&mut buf))
}

fn split_words(
    text: &str,
    sorted_filters: &[char],
    lowercase: bool,
    separator: &str,
) -> Vec<String> {
    let lowered;
    let source = if lowercase {
        lowered = text.to_lowercase();
        lowered.as_str()
    } else {
        text
    };

    let mut replaced = String::with_capacity(source.len());
    for ch in source.chars() {
        if sorted_filters.binary_search(&ch).is_ok() {
            replaced.push_str(separator);
        } else {
            replaced.push(ch);
        }
    }

    replaced
        .split(separator)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuation_and_case() {
        let tokens = tokenize("FREE money now!!!", DEFAULT_FILTERS, true, ' ');
        assert_eq!(tokens, vec!["free", "money", "now"]);
    }

    #[test]
    fn test_empty_and_filter_only_input() {
        assert!(tokenize("", DEFAULT_FILTERS, true, ' ').is_empty());
        assert!(tokenize("!!! ... ???\t\n", DEFAULT_FILTERS, true, ' ').is_empty());
        assert!(Tokenizer::default().tokenize("   ").is_empty());
    }

    #[test]
    fn test_no_empty_tokens_or_filter_characters() {
        let samples = [
            "Hello,   world!!  (call) 555-0100 now",
            "URGENT: claim your $1000 prize @ http://example.com/win?id=7",
            "line one\nline two\ttabbed",
            "don't drop apostrophes",
        ];
        let tokenizer = Tokenizer::default();
        for sample in samples {
            for token in tokenizer.tokenize(sample) {
                assert!(!token.is_empty());
                assert!(
                    !token.chars().any(|c| DEFAULT_FILTERS.contains(c)),
                    "token {token:?} kept a filter character"
                );
            }
        }
    }

    #[test]
    fn test_apostrophe_is_not_filtered() {
        let tokens = Tokenizer::default().tokenize("Don't stop");
        assert_eq!(tokens, vec!["don't", "stop"]);
    }

    #[test]
    fn test_lowercase_disabled() {
        let tokens = tokenize("Win BIG", DEFAULT_FILTERS, false, ' ');
        assert_eq!(tokens, vec!["Win", "BIG"]);
    }

    #[test]
    fn test_custom_separator() {
        let tokens = tokenize("a|b,c||d", ",", true, '|');
        assert_eq!(tokens, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_multi_character_separator() {
        let tokenizer = Tokenizer::new(DEFAULT_FILTERS, true, "<>").unwrap();
        // '<' and '>' are filters too; they become separators before splitting
        let tokens = tokenizer.tokenize("cheap!pills<>now");
        assert_eq!(tokens, vec!["cheap", "pills", "now"]);
    }

    #[test]
    fn test_empty_separator_rejected() {
        assert!(matches!(
            Tokenizer::new(DEFAULT_FILTERS, true, ""),
            Err(EncodingError::EmptySeparator)
        ));
    }

    #[test]
    fn test_unicode_text() {
        let tokens = Tokenizer::default().tokenize("Größe ÜBER alles, café!");
        assert_eq!(tokens, vec!["größe", "über", "alles", "café"]);
    }
}
