//! Size statistics over a chunked corpus.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSize {
    pub tokens: usize,
    pub file: String,
    /// 1-based chunk number within the file.
    pub index: usize,
}

#[derive(Debug, Default, Clone)]
pub struct ChunkStats {
    sizes: Vec<ChunkSize>,
    per_file: Vec<(String, usize)>,
}

impl ChunkStats {
    pub fn record_file(&mut self, file: &str, token_counts: &[usize]) {
        self.per_file.push((file.to_string(), token_counts.len()));
        self.sizes.extend(token_counts.iter().enumerate().map(|(i, &tokens)| ChunkSize {
            tokens,
            file: file.to_string(),
            index: i + 1,
        }));
    }

    pub fn total_chunks(&self) -> usize { self.sizes.len() }

    pub fn total_tokens(&self) -> usize { self.sizes.iter().map(|s| s.tokens).sum() }

    pub fn average_tokens(&self) -> f64 {
        if self.sizes.is_empty() { 0.0 } else { self.total_tokens() as f64 / self.sizes.len() as f64 }
    }

    pub fn count_where(&self, pred: impl Fn(usize) -> bool) -> usize {
        self.sizes.iter().filter(|s| pred(s.tokens)).count()
    }

    pub fn largest(&self, n: usize) -> Vec<ChunkSize> {
        let mut sorted = self.sizes.clone();
        sorted.sort_by(|a, b| b.tokens.cmp(&a.tokens).then_with(|| a.file.cmp(&b.file)).then(a.index.cmp(&b.index)));
        sorted.truncate(n);
        sorted
    }

    pub fn smallest(&self, n: usize) -> Vec<ChunkSize> {
        let mut sorted = self.sizes.clone();
        sorted.sort_by(|a, b| a.tokens.cmp(&b.tokens).then_with(|| a.file.cmp(&b.file)).then(a.index.cmp(&b.index)));
        sorted.truncate(n);
        sorted
    }

    pub fn busiest_files(&self, n: usize) -> Vec<(String, usize)> {
        let mut sorted = self.per_file.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted.truncate(n);
        sorted
    }
}

impl fmt::Display for ChunkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total number of chunks created: {}", self.total_chunks())?;
        writeln!(f, "Average chunk size: {:.2} tokens", self.average_tokens())?;
        writeln!(f, "Number of chunks under 400 tokens: {}", self.count_where(|t| t < 400))?;
        writeln!(f, "Number of chunks between 400 and 600 tokens: {}", self.count_where(|t| (400..600).contains(&t)))?;
        writeln!(f, "Number of chunks over 600 tokens: {}", self.count_where(|t| t >= 600))?;
        writeln!(f, "Number of chunks with less than 20 tokens: {}", self.count_where(|t| t < 20))?;
        writeln!(f, "\nTop 10 largest chunks:")?;
        for s in self.largest(10) {
            writeln!(f, "{} - Chunk {}: {} tokens", s.file, s.index, s.tokens)?;
        }
        writeln!(f, "\nTop 10 smallest chunks:")?;
        for s in self.smallest(10) {
            writeln!(f, "{} - Chunk {}: {} tokens", s.file, s.index, s.tokens)?;
        }
        writeln!(f, "\nTop 10 files with the most chunks:")?;
        for (file, count) in self.busiest_files(10) {
            writeln!(f, "{file}: {count} chunks")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_and_rankings() {
        let mut stats = ChunkStats::default();
        stats.record_file("a.md", &[250, 450, 700]);
        stats.record_file("b.md", &[15]);
        assert_eq!(stats.total_chunks(), 4);
        assert_eq!(stats.total_tokens(), 1415);
        assert_eq!(stats.count_where(|t| t < 400), 2);
        assert_eq!(stats.count_where(|t| t < 20), 1);
        assert_eq!(stats.largest(1)[0], ChunkSize { tokens: 700, file: "a.md".into(), index: 3 });
        assert_eq!(stats.smallest(1)[0].file, "b.md");
        assert_eq!(stats.busiest_files(1), vec![("a.md".to_string(), 3)]);
        let text = stats.to_string();
        assert!(text.contains("Average chunk size: 353.75 tokens"));
    }

    #[test]
    fn empty_stats_average_is_zero() {
        assert_eq!(ChunkStats::default().average_tokens(), 0.0);
    }
}
