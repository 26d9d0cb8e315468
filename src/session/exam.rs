use chrono::{DateTime, Local};

use crate::error::{QuizError, QuizResult};
use crate::session::result::ExamResult;
use crate::store::history::HistoryStore;
use crate::store::schema::{Question, QuestionId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExamState {
    InProgress,
    AllSubmitted,
    Finalized,
}

/// A non-empty answer that was just locked in and belongs in the history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub question_id: QuestionId,
    pub answer: String,
    pub at: DateTime<Local>,
}

/// One quiz attempt over a snapshot of the question list. Drafts live here
/// and are never persisted; only submissions reach the history.
#[derive(Clone, Debug)]
pub struct ExamSession {
    questions: Vec<Question>,
    current: usize,
    answers: Vec<String>,
    submitted: Vec<bool>,
    finalized: bool,
}

impl ExamSession {
    pub fn start(questions: &[Question]) -> QuizResult<Self> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        let n = questions.len();
        Ok(Self {
            questions: questions.to_vec(),
            current: 0,
            answers: vec![String::new(); n],
            submitted: vec![false; n],
            finalized: false,
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    pub fn answer(&self, index: usize) -> &str {
        self.answers.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn current_answer(&self) -> &str {
        self.answer(self.current)
    }

    pub fn is_submitted(&self, index: usize) -> bool {
        self.submitted.get(index).copied().unwrap_or(false)
    }

    pub fn current_submitted(&self) -> bool {
        self.is_submitted(self.current)
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    pub fn all_submitted(&self) -> bool {
        self.submitted.iter().all(|&s| s)
    }

    pub fn unsubmitted_count(&self) -> usize {
        self.submitted.iter().filter(|&&s| !s).count()
    }

    pub fn state(&self) -> ExamState {
        if self.finalized {
            ExamState::Finalized
        } else if self.all_submitted() {
            ExamState::AllSubmitted
        } else {
            ExamState::InProgress
        }
    }

    /// Returns whether the draft was stored; a submitted answer is locked.
    pub fn save_draft(&mut self, text: &str) -> bool {
        if self.current_submitted() {
            return false;
        }
        self.answers[self.current] = text.to_string();
        true
    }

    /// Lock in the trimmed draft for the current question. An empty answer
    /// still counts as submitted but leaves no history record.
    pub fn submit_current(
        &mut self,
        draft: &str,
        at: DateTime<Local>,
    ) -> QuizResult<Option<Submission>> {
        if self.current_submitted() {
            return Err(QuizError::AlreadySubmitted);
        }
        let answer = draft.trim().to_string();
        self.answers[self.current] = answer.clone();
        self.submitted[self.current] = true;

        if answer.is_empty() {
            return Ok(None);
        }
        Ok(Some(Submission {
            question_id: self.current_question().id,
            answer,
            at,
        }))
    }

    /// Moves to `index`, keeping the current draft if it is still editable.
    /// Out-of-range targets are ignored.
    pub fn go_to(&mut self, index: usize, draft: &str) -> bool {
        if index >= self.questions.len() || index == self.current {
            return false;
        }
        self.save_draft(draft);
        self.current = index;
        true
    }

    pub fn next(&mut self, draft: &str) -> bool {
        self.go_to(self.current + 1, draft)
    }

    pub fn previous(&mut self, draft: &str) -> bool {
        match self.current.checked_sub(1) {
            Some(index) => self.go_to(index, draft),
            None => false,
        }
    }

    pub fn finalize(&mut self, history: &HistoryStore) -> QuizResult<ExamResult> {
        let remaining = self.unsubmitted_count();
        if remaining > 0 {
            return Err(QuizError::Unanswered { remaining });
        }
        self.finalized = true;
        Ok(ExamResult::collect(&self.questions, &self.answers, history))
    }
}
