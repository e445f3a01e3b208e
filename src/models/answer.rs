use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::models::question::scalar_text;

/// A student's answers, positionally aligned with the test's questions.
///
/// Entries are optional: `null`, a missing trailing entry, or a skipped
/// question all mean "no answer". Scalars other than strings are kept in
/// their textual form so they compare against normalised answer keys.
///
/// Accepted encodings: an array, an object keyed by question index
/// (`{"0": "went"}`), or either of those JSON-encoded inside a string.
/// Upper bound on answer positions kept from a submission.
pub const MAX_ANSWERS: usize = 1_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnswerSheet(pub Vec<Option<String>>);

impl AnswerSheet {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|a| a.as_deref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shapes that cannot hold answers decode to an empty sheet, which scores
    /// as "no answer" everywhere. Index keys and list entries at or past
    /// [`MAX_ANSWERS`] are dropped.
    fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Array(items) => items.iter().take(MAX_ANSWERS).map(scalar_text).collect(),
            JsonValue::Object(map) => {
                let indexed: Vec<(usize, Option<String>)> = map
                    .iter()
                    .filter_map(|(key, value)| {
                        let index = key.trim().parse::<usize>().ok()?;
                        (index < MAX_ANSWERS).then(|| (index, scalar_text(value)))
                    })
                    .collect();
                let len = indexed.iter().map(|(i, _)| i + 1).max().unwrap_or(0);
                let mut answers = vec![None; len];
                for (index, answer) in indexed {
                    answers[index] = answer;
                }
                AnswerSheet(answers)
            }
            JsonValue::String(encoded) => match serde_json::from_str::<JsonValue>(&encoded) {
                Ok(inner @ (JsonValue::Array(_) | JsonValue::Object(_))) => Self::from_json(inner),
                _ => AnswerSheet::default(),
            },
            _ => AnswerSheet::default(),
        }
    }
}

impl<S: Into<String>> FromIterator<Option<S>> for AnswerSheet {
    fn from_iter<I: IntoIterator<Item = Option<S>>>(iter: I) -> Self {
        AnswerSheet(iter.into_iter().map(|a| a.map(Into::into)).collect())
    }
}

impl<'de> Deserialize<'de> for AnswerSheet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = JsonValue::deserialize(deserializer)?;
        Ok(AnswerSheet::from_json(raw))
    }
}

/// Decodes a stored answer column.
pub fn decode_answers(value: JsonValue) -> serde_json::Result<AnswerSheet> {
    serde_json::from_value(value)
}
