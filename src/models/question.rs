//! Question definitions embedded in a test.
//!
//! Questions are persisted as a JSON array in the camelCase shape the
//! academy front end writes (`question`, `options`, `correctOption`,
//! `points`, plus the older `correctAnswer`/`answer` keys). The answer key is
//! resolved into a [`QuestionKind`] once, when the JSON is decoded, so the
//! scoring pass never has to look at the raw shape.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const DEFAULT_POINTS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredQuestion", into = "StoredQuestion")]
pub struct Question {
    pub question: String,
    pub points: u32,
    pub kind: QuestionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuestionKind {
    /// The key is the option at `correct_index`. `None` means the stored
    /// `correctOption` was not a usable index, so no answer can match.
    IndexedChoice {
        options: Vec<String>,
        correct_index: Option<usize>,
    },
    /// The key is stored as a literal value. `options` are display-only.
    DirectAnswer {
        options: Vec<String>,
        correct_value: Option<String>,
    },
}

impl Question {
    pub fn indexed(question: impl Into<String>, options: &[&str], correct_index: usize) -> Self {
        Self {
            question: question.into(),
            points: DEFAULT_POINTS,
            kind: QuestionKind::IndexedChoice {
                options: options.iter().map(|o| o.to_string()).collect(),
                correct_index: Some(correct_index),
            },
        }
    }

    pub fn direct(question: impl Into<String>, correct_value: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            points: DEFAULT_POINTS,
            kind: QuestionKind::DirectAnswer {
                options: Vec::new(),
                correct_value: Some(correct_value.into()),
            },
        }
    }

    pub fn with_points(mut self, points: u32) -> Self {
        self.points = normalize_points(Some(i64::from(points)));
        self
    }

    pub fn options(&self) -> &[String] {
        match &self.kind {
            QuestionKind::IndexedChoice { options, .. } => options,
            QuestionKind::DirectAnswer { options, .. } => options,
        }
    }

    /// `None` when the key cannot be resolved; such a question never awards credit.
    pub fn correct_answer(&self) -> Option<&str> {
        match &self.kind {
            QuestionKind::IndexedChoice {
                options,
                correct_index,
            } => correct_index
                .and_then(|i| options.get(i))
                .map(String::as_str),
            QuestionKind::DirectAnswer { correct_value, .. } => correct_value.as_deref(),
        }
    }
}

/// Decodes a stored question list. Older rows hold the list as a JSON-encoded
/// string inside the column rather than as an array.
pub fn decode_questions(value: JsonValue) -> serde_json::Result<Vec<Question>> {
    match value {
        JsonValue::Null => Ok(Vec::new()),
        JsonValue::String(encoded) => {
            if encoded.trim().is_empty() {
                Ok(Vec::new())
            } else {
                serde_json::from_str(&encoded)
            }
        }
        other => serde_json::from_value(other),
    }
}

pub fn encode_questions(questions: &[Question]) -> serde_json::Result<JsonValue> {
    serde_json::to_value(questions)
}

/// Textual form of a scalar JSON value; `null` has none.
pub(crate) fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredQuestion {
    #[serde(default, alias = "text")]
    question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<JsonValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correct_option: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correct_answer: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    answer: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    points: Option<JsonValue>,
}

impl From<StoredQuestion> for Question {
    fn from(raw: StoredQuestion) -> Self {
        let points = normalize_points(raw.points.as_ref().and_then(parse_int_like));
        let options: Option<Vec<String>> = raw
            .options
            .map(|opts| opts.iter().map(|o| scalar_text(o).unwrap_or_default()).collect());

        // `options` plus `correctOption` always means an indexed key, even
        // when the index is unusable; the legacy keys only apply otherwise.
        let kind = match (options, raw.correct_option.as_ref()) {
            (Some(options), Some(correct_option)) => QuestionKind::IndexedChoice {
                options,
                correct_index: parse_index(correct_option),
            },
            (options, _) => QuestionKind::DirectAnswer {
                options: options.unwrap_or_default(),
                correct_value: raw
                    .correct_answer
                    .as_ref()
                    .and_then(scalar_text)
                    .or_else(|| raw.answer.as_ref().and_then(scalar_text)),
            },
        };

        Question {
            question: raw.question,
            points,
            kind,
        }
    }
}

impl From<Question> for StoredQuestion {
    fn from(q: Question) -> Self {
        let points = Some(JsonValue::from(q.points));
        match q.kind {
            QuestionKind::IndexedChoice {
                options,
                correct_index,
            } => StoredQuestion {
                question: q.question,
                options: Some(options.into_iter().map(JsonValue::String).collect()),
                // -1 keeps an unusable index unusable after a round trip.
                correct_option: Some(match correct_index {
                    Some(i) => JsonValue::from(i as u64),
                    None => JsonValue::from(-1),
                }),
                correct_answer: None,
                answer: None,
                points,
            },
            QuestionKind::DirectAnswer {
                options,
                correct_value,
            } => StoredQuestion {
                question: q.question,
                options: if options.is_empty() {
                    None
                } else {
                    Some(options.into_iter().map(JsonValue::String).collect())
                },
                correct_option: None,
                correct_answer: correct_value.map(JsonValue::String),
                answer: None,
                points,
            },
        }
    }
}

fn normalize_points(raw: Option<i64>) -> u32 {
    match raw {
        Some(p) if p > 0 => u32::try_from(p).unwrap_or(u32::MAX),
        _ => DEFAULT_POINTS,
    }
}

/// Integer reading of a number or numeric-prefixed string; floats truncate.
fn parse_int_like(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        JsonValue::String(s) => parse_leading_int(s),
        _ => None,
    }
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Integral numbers (including `1.0`) and numeric strings; anything else has
/// no index.
fn parse_index(value: &JsonValue) -> Option<usize> {
    match value {
        JsonValue::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u32::MAX as f64)
                    .map(|f| f as u64)
            })
            .and_then(|i| usize::try_from(i).ok()),
        JsonValue::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
}
