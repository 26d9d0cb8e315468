use crate::store::history::HistoryStore;
use crate::store::schema::{HistoryRecord, Question, QuestionId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultEntry {
    pub question_id: QuestionId,
    pub question: String,
    pub standard_answer: String,
    /// Latest submitted answer in this attempt, possibly empty.
    pub answer: String,
    /// Every recorded answer for the question, oldest first, including the
    /// one from this attempt.
    pub history: Vec<HistoryRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExamResult {
    pub entries: Vec<ResultEntry>,
}

impl ExamResult {
    pub fn collect(questions: &[Question], answers: &[String], history: &HistoryStore) -> Self {
        let entries = questions
            .iter()
            .zip(answers)
            .map(|(q, answer)| ResultEntry {
                question_id: q.id,
                question: q.question.clone(),
                standard_answer: q.answer.clone(),
                answer: answer.clone(),
                history: history.records(q.id).to_vec(),
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
