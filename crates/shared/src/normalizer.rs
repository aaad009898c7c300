use regex::Regex;

/// Strips mentions, links and punctuation from post text before scoring.
pub struct TextNormalizer {
    noise: Regex,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        // Alternation order matters: a link must match before its
        // punctuation is stripped character by character.
        let noise = Regex::new(r"(@[A-Za-z0-9]+)|(\w+://\S+)|([^0-9A-Za-z \t])")
            .expect("noise pattern is a valid regex");
        Self { noise }
    }

    /// Never fails; empty input yields an empty string.
    pub fn normalize(&self, text: &str) -> String {
        let stripped = self.noise.replace_all(text, " ");
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_link_mention_and_punctuation() {
        let normalizer = TextNormalizer::new();
        assert_eq!(
            normalizer.normalize("hello world http://x.co @bob!!"),
            "hello world"
        );
    }

    #[test]
    fn test_strips_https_links_mid_sentence() {
        let normalizer = TextNormalizer::new();
        assert_eq!(
            normalizer.normalize("read https://example.com/a?b=c now"),
            "read now"
        );
    }

    #[test]
    fn test_collapses_whitespace() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize("  a \t\t b\n\nc  "), "a b c");
    }

    #[test]
    fn test_punctuation_splits_words() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize("don't stop, #believing"), "don t stop believing");
    }

    #[test]
    fn test_empty_input() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize(""), "");
        assert_eq!(normalizer.normalize("@only !!! http://a.b"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = TextNormalizer::new();
        let samples = [
            "RT @someone: Great news!!! https://t.co/xyz #win",
            "  café, crème — brûlée ",
            "plain words only",
            "@a@b mail@example.com ftp://files",
            "",
        ];
        for sample in samples {
            let once = normalizer.normalize(sample);
            assert_eq!(normalizer.normalize(&once), once, "input: {:?}", sample);
        }
    }
}
