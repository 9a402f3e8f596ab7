use tracing::debug;

use super::document::{DocumentPage, QaPair};
use super::pattern::QuestionPattern;

/// Turns document pages into question/answer pairs.
///
/// Each page is scanned independently. A question line opens a pair; following
/// non-question lines form its answer. Lines before the first question are dropped, and a
/// question whose answer is empty after trimming produces nothing.
#[derive(Debug, Clone, Default)]
pub struct DocumentIngestor {
    pattern: QuestionPattern,
}

impl DocumentIngestor {
    pub fn new(pattern: QuestionPattern) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> &QuestionPattern {
        &self.pattern
    }

    pub fn extract_pairs(&self, pages: &[DocumentPage]) -> Vec<QaPair> {
        let mut pairs = Vec::new();
        for (page_idx, page) in pages.iter().enumerate() {
            let before = pairs.len();
            self.scan(&page.merged_text(), &mut pairs);
            debug!(page = page_idx, pairs = pairs.len() - before, "Page scanned");
        }
        pairs
    }

    /// Scans a single block of text.
    pub fn extract_from_text(&self, text: &str) -> Vec<QaPair> {
        let mut pairs = Vec::new();
        self.scan(text, &mut pairs);
        pairs
    }

    fn scan(&self, text: &str, pairs: &mut Vec<QaPair>) {
        let mut question: Option<&str> = None;
        let mut answer: Vec<&str> = Vec::new();

        for line in text.split('\n').map(str::trim) {
            if self.pattern.is_question(line) {
                if let Some(q) = question.take() {
                    flush(q, &answer, pairs);
                }
                question = Some(line);
                answer.clear();
            } else if question.is_some() {
                answer.push(line);
            }
        }

        if let Some(q) = question {
            flush(q, &answer, pairs);
        }
    }
}

fn flush(question: &str, answer: &[&str], pairs: &mut Vec<QaPair>) {
    let answer = answer.join("\n");
    let answer = answer.trim();
    if !answer.is_empty() {
        pairs.push(QaPair::new(question, answer));
    }
}
