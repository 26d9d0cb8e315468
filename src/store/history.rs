use std::rc::Rc;

use crate::error::{QuizError, QuizResult};
use crate::store::kv::KvStore;
use crate::store::schema::{HISTORY_KEY, HistoryMap, HistoryRecord, QuestionId};

pub struct HistoryStore {
    kv: Rc<dyn KvStore>,
    history: HistoryMap,
}

impl HistoryStore {
    pub fn load(kv: Rc<dyn KvStore>) -> Self {
        let history: HistoryMap = match kv.get(HISTORY_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("stored answer history is unreadable, starting empty: {e}");
                HistoryMap::new()
            }),
            Ok(None) => HistoryMap::new(),
            Err(e) => {
                tracing::warn!("could not read stored answer history: {e}");
                HistoryMap::new()
            }
        };
        tracing::debug!(keys = history.len(), "loaded answer history");
        Self { kv, history }
    }

    pub fn history(&self) -> &HistoryMap {
        &self.history
    }

    /// Number of keys, including keys whose sequence is empty.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn records(&self, id: QuestionId) -> &[HistoryRecord] {
        self.history
            .get(&id.history_key())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn append(&mut self, id: QuestionId, answer: &str, timestamp: &str) -> QuizResult<()> {
        self.history
            .entry(id.history_key())
            .or_default()
            .push(HistoryRecord {
                answer: answer.to_string(),
                timestamp: timestamp.to_string(),
            });
        self.persist()?;
        tracing::debug!(%id, "answer recorded");
        Ok(())
    }

    /// Existing records first, then imported ones, per key. No dedup.
    pub fn merge_from(&mut self, imported: HistoryMap) -> QuizResult<()> {
        let keys = imported.len();
        for (key, records) in imported {
            self.history.entry(key).or_default().extend(records);
        }
        self.persist()?;
        tracing::info!(keys, "answer history merged");
        Ok(())
    }

    pub fn clear(&mut self) -> QuizResult<()> {
        if self.history.is_empty() {
            return Ok(());
        }
        self.history.clear();
        self.persist()?;
        tracing::info!("answer history cleared");
        Ok(())
    }

    pub fn export(&self) -> QuizResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.history)?)
    }

    /// A history file must be a JSON object of record arrays. Anything else
    /// rejects the whole file. Keys keep their order in the file.
    pub fn parse_import(bytes: &[u8]) -> QuizResult<HistoryMap> {
        serde_json::from_slice(bytes).map_err(|e| QuizError::MalformedImport(e.to_string()))
    }

    fn persist(&self) -> QuizResult<()> {
        let json = serde_json::to_string(&self.history)?;
        self.kv.set(HISTORY_KEY, &json)?;
        Ok(())
    }
}
