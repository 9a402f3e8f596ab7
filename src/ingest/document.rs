use serde::{Deserialize, Serialize};

use crate::constants::TABLE_SECTION_MARKER;

/// A table as rows of optional cells (extractors report merged/blank cells as `None`).
pub type Table = Vec<Vec<Option<String>>>;

/// One page (or other unit) of extracted document content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPage {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl DocumentPage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tables: Vec::new(),
        }
    }

    pub fn with_tables(mut self, tables: Vec<Table>) -> Self {
        self.tables = tables;
        self
    }

    /// Body text followed by the flattened tables, if any.
    ///
    /// Cells are joined with `" | "`, rows with newlines and tables with blank lines, all
    /// after a `[표 데이터]` marker line.
    pub fn merged_text(&self) -> String {
        if self.tables.is_empty() {
            return self.text.clone();
        }

        let tables: Vec<String> = self
            .tables
            .iter()
            .map(|table| {
                table
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|cell| cell.as_deref().unwrap_or(""))
                            .collect::<Vec<_>>()
                            .join(" | ")
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect();

        format!(
            "{}\n\n{}\n{}",
            self.text,
            TABLE_SECTION_MARKER,
            tables.join("\n\n")
        )
    }
}

/// A question and the answer text that followed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl QaPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}
