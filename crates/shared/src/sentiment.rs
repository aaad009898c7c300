use crate::models::SentimentLabel;
use crate::normalizer::TextNormalizer;

/// External lexical polarity function. Scores fall in [-1.0, 1.0].
pub trait PolarityScorer {
    fn polarity(&self, text: &str) -> f64;
}

/// Polarity from the VADER lexicon (`compound` score).
#[derive(Debug, Default, Clone, Copy)]
pub struct VaderScorer;

impl PolarityScorer for VaderScorer {
    fn polarity(&self, text: &str) -> f64 {
        let analyzer = vader_sentiment::SentimentIntensityAnalyzer::new();
        let scores = analyzer.polarity_scores(text);
        scores.get("compound").copied().unwrap_or(0.0)
    }
}

impl<F> PolarityScorer for F
where
    F: Fn(&str) -> f64,
{
    fn polarity(&self, text: &str) -> f64 {
        self(text)
    }
}

pub struct SentimentClassifier<S = VaderScorer> {
    normalizer: TextNormalizer,
    scorer: S,
}

impl Default for SentimentClassifier<VaderScorer> {
    fn default() -> Self {
        Self::new(VaderScorer)
    }
}

impl<S: PolarityScorer> SentimentClassifier<S> {
    pub fn new(scorer: S) -> Self {
        Self {
            normalizer: TextNormalizer::new(),
            scorer,
        }
    }

    /// Sign of the score, with no banding. NaN is treated as neutral.
    pub fn classify_score(score: f64) -> SentimentLabel {
        if score > 0.0 {
            SentimentLabel::Positive
        } else if score < 0.0 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn analyze(&self, text: &str) -> SentimentLabel {
        let normalized = self.normalizer.normalize(text);
        Self::classify_score(self.scorer.polarity(&normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    type Classifier = SentimentClassifier<VaderScorer>;

    #[test]
    fn test_classify_score_sign() {
        assert_eq!(Classifier::classify_score(0.75), SentimentLabel::Positive);
        assert_eq!(Classifier::classify_score(-0.2), SentimentLabel::Negative);
        assert_eq!(Classifier::classify_score(0.0), SentimentLabel::Neutral);
        assert_eq!(Classifier::classify_score(-0.0), SentimentLabel::Neutral);
    }

    #[test]
    fn test_classify_score_has_no_threshold_band() {
        assert_eq!(Classifier::classify_score(1e-9), SentimentLabel::Positive);
        assert_eq!(Classifier::classify_score(-1e-9), SentimentLabel::Negative);
        assert_eq!(Classifier::classify_score(1.0), SentimentLabel::Positive);
        assert_eq!(Classifier::classify_score(-1.0), SentimentLabel::Negative);
    }

    #[test]
    fn test_classify_score_sweep() {
        for step in -100..=100 {
            let score = step as f64 / 100.0;
            let expected = match step.cmp(&0) {
                std::cmp::Ordering::Greater => SentimentLabel::Positive,
                std::cmp::Ordering::Less => SentimentLabel::Negative,
                std::cmp::Ordering::Equal => SentimentLabel::Neutral,
            };
            assert_eq!(Classifier::classify_score(score), expected, "score {}", score);
        }
    }

    #[test]
    fn test_analyze_scores_normalized_text() {
        let seen = RefCell::new(Vec::new());
        let classifier = SentimentClassifier::new(|text: &str| {
            seen.borrow_mut().push(text.to_string());
            0.4
        });

        let label = classifier.analyze("so good!!! https://t.co/abc @friend");

        assert_eq!(label, SentimentLabel::Positive);
        assert_eq!(seen.borrow().as_slice(), ["so good"]);
    }

    #[test]
    fn test_vader_scorer_polarity_direction() {
        let classifier = SentimentClassifier::default();
        assert_eq!(
            classifier.analyze("I love this, it is wonderful and great"),
            SentimentLabel::Positive
        );
        assert_eq!(
            classifier.analyze("This is terrible, awful and I hate it"),
            SentimentLabel::Negative
        );
        assert_eq!(classifier.analyze(""), SentimentLabel::Neutral);
    }
}
