use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Local, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const QUESTIONS_KEY: &str = "quizQuestions";
pub const HISTORY_KEY: &str = "answerHistory";

pub const QUESTIONS_EXPORT_LABEL: &str = "quiz_questions";
pub const HISTORY_EXPORT_LABEL: &str = "answer_history";

/// Largest integer every JSON reader represents exactly (2^53 - 1).
pub const MAX_SAFE_ID: u64 = (1 << 53) - 1;

/// Creation-time token identifying a question for its whole lifetime.
///
/// Ids are JSON numbers. The ones minted here are integral epoch
/// milliseconds, but files written by other tools may carry fractional
/// ids, and those load and round-trip unchanged. History entries are keyed
/// by the shortest decimal rendering, so `1700000000000` and
/// `1700000000000.123` key as written.
#[derive(Clone, Copy, Debug)]
pub struct QuestionId(f64);

impl QuestionId {
    /// `None` for NaN and infinities.
    pub fn new(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        // -0.0 and 0.0 are one id.
        Some(Self(value + 0.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// The id as a generator counter: integral, non-negative and exactly
    /// representable.
    pub fn as_counter(self) -> Option<u64> {
        if self.0 >= 0.0 && self.0.fract() == 0.0 && self.0 <= MAX_SAFE_ID as f64 {
            Some(self.0 as u64)
        } else {
            None
        }
    }

    /// Within the range where every JSON reader agrees on the value.
    pub fn is_portable(self) -> bool {
        self.0.abs() <= MAX_SAFE_ID as f64
    }

    pub fn history_key(self) -> String {
        self.to_string()
    }
}

impl From<u64> for QuestionId {
    fn from(value: u64) -> Self {
        Self(value as f64)
    }
}

impl PartialEq for QuestionId {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

// Never NaN, see `QuestionId::new`.
impl Eq for QuestionId {}

impl Hash for QuestionId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for QuestionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QuestionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for QuestionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract() == 0.0 && self.is_portable() {
            if self.0 >= 0.0 {
                serializer.serialize_u64(self.0 as u64)
            } else {
                serializer.serialize_i64(self.0 as i64)
            }
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for QuestionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).ok_or_else(|| serde::de::Error::custom("question id is not a finite number"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub question: String,
    pub answer: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub answer: String,
    pub timestamp: String,
}

/// Stringified question id -> records in chronological order. Keys stay in
/// the order they were first recorded or read.
pub type HistoryMap = IndexMap<String, Vec<HistoryRecord>>;

/// Hands out strictly increasing ids seeded from the wall clock in
/// milliseconds, so ids stay unique even when several are minted within
/// the same millisecond (bulk import).
#[derive(Clone, Debug, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    /// Start above every counter-shaped id already in use. Fractional,
    /// negative and oversized ids can never be minted, so they are skipped.
    pub fn above<'a>(existing: impl IntoIterator<Item = &'a QuestionId>) -> Self {
        let last = existing
            .into_iter()
            .filter_map(|id| id.as_counter())
            .max()
            .unwrap_or(0);
        Self { last }
    }

    pub fn next_id(&mut self) -> Option<QuestionId> {
        self.next_at(Local::now())
    }

    /// `None` once the counter has reached [`MAX_SAFE_ID`].
    pub fn next_at(&mut self, now: DateTime<Local>) -> Option<QuestionId> {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let next = self.last.checked_add(1)?.max(millis);
        if next > MAX_SAFE_ID {
            return None;
        }
        self.last = next;
        Some(QuestionId::from(next))
    }

    /// Make sure ids handed out later never collide with `id`.
    pub fn reserve(&mut self, id: QuestionId) {
        if let Some(counter) = id.as_counter() {
            self.last = self.last.max(counter);
        }
    }
}

/// Smallest non-negative integer id not in `taken`. Used once the
/// generator is exhausted.
pub fn lowest_free_id(taken: &[QuestionId]) -> QuestionId {
    let mut candidate = 0u64;
    while taken.contains(&QuestionId::from(candidate)) {
        candidate += 1;
    }
    QuestionId::from(candidate)
}

/// `<label>_<YYYY-MM-DD>.json`
pub fn export_file_name(label: &str, date: NaiveDate) -> String {
    format!("{label}_{}.json", date.format("%Y-%m-%d"))
}
