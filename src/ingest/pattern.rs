//! Question-line detection.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::error::IngestError;

/// Built-in catalogue of question endings found in Korean customs guidance documents.
///
/// Each entry is a regex fragment that must match at the end of a trimmed line.
pub const KOREAN_QUESTION_ENDINGS: &[&str] = &[
    r"\?",
    r"？",
    r"궁금합니다\.?",
    r"알려주세요\.?",
    r"무엇인가요\.?",
    r"어떻게.*",
    r"대해\s*설명.*",
    r"요약.*",
    r"문의(?:합니다|드립니다)\.?",
    r"설명(?:해\s*주|하여\s*주|바랍니다)\.?",
    r"알고\s*싶.*",
    r"요청(?:합니다|드립니다)\.?",
    r"유의사항",
    r"절차",
    r"방법",
    r"기준",
    r"대상",
    r"요건",
    r"처리",
    r"신고",
    r"수입",
    r"수출",
    r"반입",
    r"검사",
    r"허가",
    r"확인",
    r"통관",
];

static KOREAN_DEFAULT: LazyLock<Regex> = LazyLock::new(|| {
    compile(KOREAN_QUESTION_ENDINGS.iter().copied()).expect("built-in question endings are valid")
});

/// Decides whether a trimmed line opens a new question.
#[derive(Debug, Clone)]
pub struct QuestionPattern {
    regex: Regex,
}

impl Default for QuestionPattern {
    fn default() -> Self {
        Self::korean_default()
    }
}

impl QuestionPattern {
    /// Builds a pattern from ending fragments; a line is a question when any fragment
    /// matches at its end.
    pub fn new<I, S>(fragments: I) -> Result<Self, IngestError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fragments: Vec<S> = fragments.into_iter().collect();
        Ok(Self {
            regex: compile(fragments.iter().map(|f| f.as_ref()))?,
        })
    }

    /// The built-in Korean catalogue.
    pub fn korean_default() -> Self {
        Self {
            regex: KOREAN_DEFAULT.clone(),
        }
    }

    /// Loads fragments from a file, one per line. Blank lines and `#` comments are skipped.
    pub fn from_file(path: &Path) -> Result<Self, IngestError> {
        let contents = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::new(
            contents
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        )
    }

    pub fn is_question(&self, line: &str) -> bool {
        !line.is_empty() && self.regex.is_match(line)
    }

    /// The combined regex source.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

fn compile<'a>(fragments: impl Iterator<Item = &'a str>) -> Result<Regex, IngestError> {
    let mut parts = Vec::new();
    for fragment in fragments {
        Regex::new(fragment).map_err(|e| IngestError::InvalidPattern {
            pattern: fragment.to_string(),
            reason: e.to_string(),
        })?;
        parts.push(format!("(?:{fragment})"));
    }

    if parts.is_empty() {
        return Err(IngestError::EmptyPatternCatalogue);
    }

    let combined = format!("(?:{})$", parts.join("|"));
    Regex::new(&combined).map_err(|e| IngestError::InvalidPattern {
        pattern: combined.clone(),
        reason: e.to_string(),
    })
}
