use crate::models::{PolarityVerdict, SentimentLabel};

#[derive(Debug, Clone)]
pub struct ScoredPost {
    pub text: String,
    pub label: SentimentLabel,
}

impl ScoredPost {
    pub fn new(text: impl Into<String>, label: SentimentLabel) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentimentSummary {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub verdict: PolarityVerdict,
}

impl SentimentSummary {
    pub fn from_posts(posts: &[ScoredPost]) -> Self {
        let count = |label: SentimentLabel| posts.iter().filter(|p| p.label == label).count();
        Self {
            positive: count(SentimentLabel::Positive),
            neutral: count(SentimentLabel::Neutral),
            negative: count(SentimentLabel::Negative),
            verdict: PolarityVerdict::from_labels(posts.iter().map(|p| p.label)),
        }
    }
}

/// Renders scored posts as a fixed-width preview table plus a verdict line.
pub struct ReportRenderer {
    preview_rows: usize,
    text_width: usize,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new(20, 60)
    }
}

impl ReportRenderer {
    pub fn new(preview_rows: usize, text_width: usize) -> Self {
        Self {
            preview_rows,
            text_width: text_width.max(4),
        }
    }

    /// First `min(preview_rows, posts.len())` rows, 0-based index.
    pub fn render_table(&self, posts: &[ScoredPost]) -> String {
        let width = self.text_width;
        let mut table = String::new();

        table.push_str(&format!("{:>4}  {:<width$}  {:>9}\n", "", "Posts", "sentiment"));
        for (index, post) in posts.iter().take(self.preview_rows).enumerate() {
            table.push_str(&format!(
                "{:>4}  {:<width$}  {:>9}\n",
                index,
                Self::truncate(&post.text, width),
                post.label.to_string()
            ));
        }

        table
    }

    pub fn render(&self, posts: &[ScoredPost]) -> String {
        let summary = SentimentSummary::from_posts(posts);
        let mut report = self.render_table(posts);

        if posts.len() > self.preview_rows {
            report.push_str(&format!(
                "... {} more not shown\n",
                posts.len() - self.preview_rows
            ));
        }
        report.push('\n');
        report.push_str(&format!(
            "{} posts: {} positive, {} neutral, {} negative\n",
            posts.len(),
            summary.positive,
            summary.neutral,
            summary.negative
        ));
        report.push_str(&format!("Overall polarity: {}\n", summary.verdict));

        report
    }

    fn truncate(text: &str, width: usize) -> String {
        let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.chars().count() <= width {
            return flat;
        }
        let mut cut: String = flat.chars().take(width - 3).collect();
        cut.push_str("...");
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SentimentLabel::*;

    fn posts(labels: &[SentimentLabel]) -> Vec<ScoredPost> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| ScoredPost::new(format!("post {}", i), *label))
            .collect()
    }

    #[test]
    fn test_summary_counts_and_verdict() {
        let summary = SentimentSummary::from_posts(&posts(&[Positive, Positive, Negative, Neutral]));
        assert_eq!(summary.positive, 2);
        assert_eq!(summary.neutral, 1);
        assert_eq!(summary.negative, 1);
        assert_eq!(summary.verdict, PolarityVerdict::Positive(1));
    }

    #[test]
    fn test_table_previews_first_rows_only() {
        let renderer = ReportRenderer::new(2, 20);
        let table = renderer.render_table(&posts(&[Positive, Negative, Neutral]));

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Posts"));
        assert!(lines[1].contains("post 0") && lines[1].ends_with('1'));
        assert!(lines[2].contains("post 1") && lines[2].ends_with("-1"));
        assert!(!table.contains("post 2"));
    }

    #[test]
    fn test_table_with_fewer_posts_than_preview() {
        let renderer = ReportRenderer::new(20, 20);
        assert_eq!(renderer.render_table(&posts(&[Neutral])).lines().count(), 2);
        assert_eq!(renderer.render_table(&[]).lines().count(), 1);
    }

    #[test]
    fn test_long_text_is_truncated_to_width() {
        let renderer = ReportRenderer::new(5, 10);
        let long = ScoredPost::new("abcdefghijklmnopqrstuvwxyz", Neutral);
        let table = renderer.render_table(&[long]);

        assert!(table.contains("abcdefg..."));
        assert!(!table.contains("abcdefgh"));
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(ReportRenderer::truncate("ééééé", 5), "ééééé");
        assert_eq!(ReportRenderer::truncate("éééééé", 5), "éé...");
        assert_eq!(ReportRenderer::truncate("a\nb\tc", 10), "a b c");
    }

    #[test]
    fn test_render_includes_verdict() {
        let renderer = ReportRenderer::new(1, 20);
        let report = renderer.render(&posts(&[Negative, Negative]));

        assert!(report.contains("... 1 more not shown"));
        assert!(report.contains("2 posts: 0 positive, 0 neutral, 2 negative"));
        assert!(report.contains("Overall polarity: Negative(-2)"));
    }

    #[test]
    fn test_render_empty() {
        let report = ReportRenderer::default().render(&[]);
        assert!(report.contains("Overall polarity: Neutral(0)"));
    }
}
