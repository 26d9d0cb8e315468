use std::rc::Rc;

use serde_json::Value;

use crate::error::{QuizError, QuizResult};
use crate::store::kv::KvStore;
use crate::store::schema::{IdGenerator, QUESTIONS_KEY, Question, QuestionId, lowest_free_id};

/// How imported questions get their ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdPolicy {
    /// Every imported question gets a new id. History recorded under the
    /// ids in the file is not reattached.
    #[default]
    Fresh,
    /// Keep an imported numeric id when it is free and within the exactly
    /// representable range, so a combined questions + history backup
    /// restores its links.
    Preserve,
}

/// An import entry that passed validation: non-empty question and answer
/// text. Any other fields in the file are ignored.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportCandidate {
    id: Option<f64>,
    question: String,
    answer: String,
}

impl ImportCandidate {
    pub fn from_value(value: &Value) -> Option<Self> {
        let question = value.get("question")?.as_str()?;
        let answer = value.get("answer")?.as_str()?;
        if question.trim().is_empty() || answer.trim().is_empty() {
            return None;
        }
        Some(Self {
            id: value.get("id").and_then(Value::as_f64),
            question: question.to_string(),
            answer: answer.to_string(),
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }
}

/// Result of reading a question-set file, before anything is replaced.
#[derive(Clone, Debug, Default)]
pub struct QuestionImport {
    pub candidates: Vec<ImportCandidate>,
    pub skipped: usize,
}

impl QuestionImport {
    /// The top level must be a JSON array; entries that are not valid
    /// questions are counted and dropped.
    pub fn parse(bytes: &[u8]) -> QuizResult<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| QuizError::MalformedImport(e.to_string()))?;
        let Value::Array(entries) = value else {
            return Err(QuizError::MalformedImport(
                "top level is not an array".to_string(),
            ));
        };

        let total = entries.len();
        let candidates: Vec<ImportCandidate> =
            entries.iter().filter_map(ImportCandidate::from_value).collect();
        let skipped = total - candidates.len();
        Ok(Self {
            candidates,
            skipped,
        })
    }
}

pub struct QuestionStore {
    kv: Rc<dyn KvStore>,
    questions: Vec<Question>,
    ids: IdGenerator,
}

impl QuestionStore {
    /// Unreadable or corrupt data loads as an empty collection; a first
    /// run and lost data look the same.
    pub fn load(kv: Rc<dyn KvStore>) -> Self {
        let questions: Vec<Question> = match kv.get(QUESTIONS_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("stored questions are unreadable, starting empty: {e}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("could not read stored questions: {e}");
                Vec::new()
            }
        };
        let ids = IdGenerator::above(questions.iter().map(|q| &q.id));
        tracing::debug!(count = questions.len(), "loaded questions");
        Self { kv, questions, ids }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn add(&mut self, question: &str, answer: &str) -> QuizResult<&Question> {
        let question = question.trim();
        let answer = answer.trim();
        if question.is_empty() || answer.is_empty() {
            return Err(QuizError::Validation(
                "Fill in both the question and the answer.".to_string(),
            ));
        }

        let id = match self.ids.next_id() {
            Some(id) => id,
            None => {
                let taken: Vec<QuestionId> = self.questions.iter().map(|q| q.id).collect();
                lowest_free_id(&taken)
            }
        };
        self.questions.push(Question {
            id,
            question: question.to_string(),
            answer: answer.to_string(),
        });
        if let Err(e) = self.persist() {
            self.questions.pop();
            return Err(e);
        }
        tracing::info!(%id, "question added");
        Ok(&self.questions[self.questions.len() - 1])
    }

    /// Returns `false` when no question has that id.
    pub fn delete(&mut self, id: QuestionId) -> QuizResult<bool> {
        let before = self.questions.len();
        self.questions.retain(|q| q.id != id);
        if self.questions.len() == before {
            tracing::debug!(%id, "delete of unknown question ignored");
            return Ok(false);
        }
        self.persist()?;
        tracing::info!(%id, "question deleted");
        Ok(true)
    }

    /// Replace the whole collection. Returns the number of questions kept.
    pub fn replace_all(
        &mut self,
        candidates: Vec<ImportCandidate>,
        policy: IdPolicy,
    ) -> QuizResult<usize> {
        if candidates.is_empty() {
            return Err(QuizError::NoValidQuestions);
        }

        let mut ids = self.ids.clone();
        let mut taken: Vec<QuestionId> = Vec::with_capacity(candidates.len());
        let mut kept: Vec<Option<QuestionId>> = Vec::with_capacity(candidates.len());
        for c in &candidates {
            let id = match policy {
                IdPolicy::Preserve => c
                    .id
                    .and_then(QuestionId::new)
                    .filter(|id| id.is_portable() && !taken.contains(id)),
                IdPolicy::Fresh => None,
            };
            if let Some(id) = id {
                ids.reserve(id);
                taken.push(id);
            }
            kept.push(id);
        }

        let mut replaced = Vec::with_capacity(candidates.len());
        for (c, kept) in candidates.into_iter().zip(kept) {
            let id = match kept {
                Some(id) => id,
                None => {
                    let id = ids.next_id().unwrap_or_else(|| lowest_free_id(&taken));
                    taken.push(id);
                    id
                }
            };
            replaced.push(Question {
                id,
                question: c.question,
                answer: c.answer,
            });
        }

        let accepted = replaced.len();
        self.questions = replaced;
        self.ids = ids;
        self.persist()?;
        tracing::info!(accepted, ?policy, "questions replaced by import");
        Ok(accepted)
    }

    pub fn clear(&mut self) -> QuizResult<()> {
        if self.questions.is_empty() {
            return Ok(());
        }
        self.questions.clear();
        self.persist()?;
        tracing::info!("all questions cleared");
        Ok(())
    }

    /// Pretty-printed JSON of the full ordered collection.
    pub fn export(&self) -> QuizResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.questions)?)
    }

    fn persist(&self) -> QuizResult<()> {
        let json = serde_json::to_string(&self.questions)?;
        self.kv.set(QUESTIONS_KEY, &json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::kv::MemoryStore;
    use crate::store::schema::MAX_SAFE_ID;
    use serde_json::json;
    use std::io;

    /// Reads like an empty store, refuses every write.
    struct ReadOnlyStore;

    impl KvStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> io::Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    fn empty_store() -> (Rc<MemoryStore>, QuestionStore) {
        let kv = Rc::new(MemoryStore::new());
        let store = QuestionStore::load(kv.clone());
        (kv, store)
    }

    fn candidates(value: Value) -> Vec<ImportCandidate> {
        QuestionImport::parse(value.to_string().as_bytes())
            .unwrap()
            .candidates
    }

    #[test]
    fn test_corrupt_persisted_data_loads_empty() {
        let kv = Rc::new(MemoryStore::with_entry(QUESTIONS_KEY, "{not json"));
        let store = QuestionStore::load(kv);
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_trims_and_persists() {
        let (kv, mut store) = empty_store();
        store.add("  2+2?  ", " 4 ").unwrap();

        let raw = kv.get(QUESTIONS_KEY).unwrap().unwrap();
        let saved: Vec<Question> = serde_json::from_str(&raw).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].question, "2+2?");
        assert_eq!(saved[0].answer, "4");
    }

    #[test]
    fn test_add_rejects_blank_fields_without_mutation() {
        let (kv, mut store) = empty_store();
        assert!(matches!(
            store.add("   ", "4"),
            Err(QuizError::Validation(_))
        ));
        assert!(matches!(store.add("q", ""), Err(QuizError::Validation(_))));
        assert!(store.is_empty());
        assert!(kv.get(QUESTIONS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_add_assigns_unique_ids() {
        let (_kv, mut store) = empty_store();
        let a = store.add("a", "1").unwrap().id;
        let b = store.add("b", "2").unwrap().id;
        assert_ne!(a, b);
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let (_kv, mut store) = empty_store();
        let id = store.add("a", "1").unwrap().id;
        assert!(!store.delete(QuestionId::new(id.value() + 1000.0).unwrap()).unwrap());
        assert_eq!(store.len(), 1);
        assert!(store.delete(id).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_on_empty_does_not_touch_store() {
        let (kv, mut store) = empty_store();
        store.clear().unwrap();
        assert!(kv.get(QUESTIONS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_parse_import_rejects_non_array() {
        let result = QuestionImport::parse(br#"{"question": "a", "answer": "b"}"#);
        assert!(matches!(result, Err(QuizError::MalformedImport(_))));
        let result = QuestionImport::parse(b"not json");
        assert!(matches!(result, Err(QuizError::MalformedImport(_))));
    }

    #[test]
    fn test_parse_import_filters_invalid_entries() {
        let import = QuestionImport::parse(
            json!([
                {"question": "a", "answer": "1", "extra": true},
                {"question": "b"},
                {"question": 3, "answer": "x"},
                null,
                {"question": "", "answer": "y"},
                {"question": "c", "answer": "3"}
            ])
            .to_string()
            .as_bytes(),
        )
        .unwrap();
        assert_eq!(import.candidates.len(), 2);
        assert_eq!(import.skipped, 4);
        assert_eq!(import.candidates[1].question(), "c");
    }

    #[test]
    fn test_replace_all_assigns_fresh_ids() {
        let (_kv, mut store) = empty_store();
        let imported = candidates(json!([
            {"id": 1, "question": "a", "answer": "1"},
            {"id": 1, "question": "b", "answer": "2"}
        ]));
        assert_eq!(store.replace_all(imported, IdPolicy::Fresh).unwrap(), 2);
        let ids: Vec<_> = store.questions().iter().map(|q| q.id).collect();
        assert!(!ids.contains(&QuestionId::from(1)));
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_replace_all_preserve_keeps_free_ids() {
        let (_kv, mut store) = empty_store();
        let imported = candidates(json!([
            {"id": 42, "question": "a", "answer": "1"},
            {"id": 42, "question": "b", "answer": "2"},
            {"question": "c", "answer": "3"}
        ]));
        store.replace_all(imported, IdPolicy::Preserve).unwrap();
        let qs = store.questions();
        assert_eq!(qs[0].id, QuestionId::from(42));
        assert_ne!(qs[1].id, QuestionId::from(42));
        assert_ne!(qs[2].id, qs[1].id);

        // Later additions never reuse an imported id.
        let added = store.add("d", "4").unwrap().id;
        assert!(added > QuestionId::from(42));
        let ids: Vec<_> = store.questions().iter().map(|q| q.id).collect();
        assert_eq!(ids.iter().filter(|&&id| id == added).count(), 1);
    }

    #[test]
    fn test_replace_all_with_nothing_valid_keeps_existing() {
        let (_kv, mut store) = empty_store();
        store.add("keep", "me").unwrap();
        let result = store.replace_all(Vec::new(), IdPolicy::Fresh);
        assert!(matches!(result, Err(QuizError::NoValidQuestions)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_export_round_trip_preserves_text_and_order() {
        let (_kv, mut store) = empty_store();
        store.add("first", "1").unwrap();
        store.add("second", "2").unwrap();
        store.add("third", "3").unwrap();

        let bytes = store.export().unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("\n  "));

        let (_kv2, mut other) = empty_store();
        let import = QuestionImport::parse(&bytes).unwrap();
        other.replace_all(import.candidates, IdPolicy::Fresh).unwrap();

        let pairs = |s: &QuestionStore| {
            s.questions()
                .iter()
                .map(|q| (q.question.clone(), q.answer.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(pairs(&store), pairs(&other));
    }

    #[test]
    fn test_failed_add_leaves_collection_unchanged() {
        let mut store = QuestionStore::load(Rc::new(ReadOnlyStore));
        assert!(matches!(store.add("q", "a"), Err(QuizError::Storage(_))));
        assert!(store.is_empty());
        // Retrying the same input cannot leave two copies behind.
        assert!(store.add("q", "a").is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_fractional_ids_load_instead_of_emptying_the_store() {
        let kv = Rc::new(MemoryStore::with_entry(
            QUESTIONS_KEY,
            r#"[{"id": 1700000000000.123, "question": "q", "answer": "a"},
                {"id": 1700000000001, "question": "r", "answer": "b"}]"#,
        ));
        let mut store = QuestionStore::load(kv);
        assert_eq!(store.len(), 2);
        assert_eq!(store.questions()[0].id.history_key(), "1700000000000.123");

        let added = store.add("s", "c").unwrap().id;
        assert!(added > QuestionId::from(1700000000001));
    }

    #[test]
    fn test_add_after_oversized_persisted_id() {
        let kv = Rc::new(MemoryStore::with_entry(
            QUESTIONS_KEY,
            &json!([{"id": u64::MAX, "question": "q", "answer": "a"}]).to_string(),
        ));
        let mut store = QuestionStore::load(kv);
        assert_eq!(store.len(), 1);
        let added = store.add("r", "b").unwrap().id;
        assert!(added.as_counter().is_some());
        assert_ne!(added, store.questions()[0].id);
    }

    #[test]
    fn test_add_once_ids_are_exhausted_uses_lowest_free_id() {
        let kv = Rc::new(MemoryStore::with_entry(
            QUESTIONS_KEY,
            &json!([
                {"id": MAX_SAFE_ID, "question": "q", "answer": "a"},
                {"id": 0, "question": "r", "answer": "b"}
            ])
            .to_string(),
        ));
        let mut store = QuestionStore::load(kv);
        assert_eq!(store.add("s", "c").unwrap().id, QuestionId::from(1));
        assert_eq!(store.add("t", "d").unwrap().id, QuestionId::from(2));
    }

    #[test]
    fn test_replace_all_preserve_keeps_fractional_ids() {
        let (_kv, mut store) = empty_store();
        let imported = candidates(json!([
            {"id": 1700000000000.123, "question": "a", "answer": "1"},
            {"id": 1700000000000.5, "question": "b", "answer": "2"}
        ]));
        store.replace_all(imported, IdPolicy::Preserve).unwrap();
        let keys: Vec<String> = store.questions().iter().map(|q| q.id.history_key()).collect();
        assert_eq!(keys, vec!["1700000000000.123", "1700000000000.5"]);
    }

    #[test]
    fn test_replace_all_preserve_replaces_unrepresentable_ids() {
        let (_kv, mut store) = empty_store();
        let imported = candidates(json!([
            {"id": u64::MAX, "question": "a", "answer": "1"},
            {"id": MAX_SAFE_ID, "question": "b", "answer": "2"},
            {"question": "c", "answer": "3"}
        ]));
        store.replace_all(imported, IdPolicy::Preserve).unwrap();
        let ids: Vec<QuestionId> = store.questions().iter().map(|q| q.id).collect();
        assert!(ids[0].as_counter().is_some());
        assert_eq!(ids[1], QuestionId::from(MAX_SAFE_ID));
        assert_ne!(ids[0], ids[2]);
        assert!(!ids[2..].contains(&ids[1]));

        // The counter is used up; later additions still get a free id.
        let added = store.add("d", "4").unwrap().id;
        assert!(!ids.contains(&added));
    }
}
