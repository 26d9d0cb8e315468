use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use crossterm::event::KeyEvent;

use crate::command::{Command, Focus, KeyContext, Section, map_key};
use crate::config::Config;
use crate::error::QuizError;
use crate::event::{AppEvent, ImportTarget, spawn_file_read};
use crate::session::exam::{ExamSession, ExamState};
use crate::session::result::ExamResult;
use crate::store::history::HistoryStore;
use crate::store::kv::KvStore;
use crate::store::questions::{IdPolicy, ImportCandidate, QuestionImport, QuestionStore};
use crate::store::schema::{
    HISTORY_EXPORT_LABEL, HistoryMap, QUESTIONS_EXPORT_LABEL, QuestionId, export_file_name,
};
use crate::ui::line_input::{InputResult, LineInput};
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub shown_at: Instant,
}

/// A destructive step waiting for a yes/no answer.
#[derive(Clone, Debug)]
pub enum ConfirmAction {
    DeleteQuestion(QuestionId),
    ClearQuestions,
    ClearHistory,
    RestartExam,
    ReplaceQuestions {
        candidates: Vec<ImportCandidate>,
        skipped: usize,
    },
    MergeHistory(HistoryMap),
}

#[derive(Clone, Debug)]
pub struct PendingConfirmation {
    pub action: ConfirmAction,
    pub prompt: String,
}

pub struct ImportPrompt {
    pub target: ImportTarget,
    pub input: LineInput,
}

pub struct App {
    pub section: Section,
    pub focus: Focus,
    pub questions: QuestionStore,
    pub history: HistoryStore,
    pub session: Option<ExamSession>,
    /// The exam section was opened with nothing to ask.
    pub no_questions: bool,
    pub last_result: Option<ExamResult>,
    pub question_input: LineInput,
    pub answer_input: LineInput,
    pub draft_input: LineInput,
    pub prompt: Option<ImportPrompt>,
    pub pending: Option<PendingConfirmation>,
    pub notice: Option<Notice>,
    pub selected: usize,
    pub result_scroll: u16,
    pub config: Config,
    pub theme: Theme,
    pub should_quit: bool,
    events: Option<mpsc::Sender<AppEvent>>,
}

impl App {
    pub fn new(config: Config, kv: Rc<dyn KvStore>, theme: Theme) -> Self {
        let questions = QuestionStore::load(kv.clone());
        let history = HistoryStore::load(kv);
        tracing::info!(
            questions = questions.len(),
            history_keys = history.len(),
            "application state loaded"
        );

        Self {
            section: Section::Config,
            focus: Focus::QuestionField,
            questions,
            history,
            session: None,
            no_questions: false,
            last_result: None,
            question_input: LineInput::new(""),
            answer_input: LineInput::new(""),
            draft_input: LineInput::new(""),
            prompt: None,
            pending: None,
            notice: None,
            selected: 0,
            result_scroll: 0,
            config,
            theme,
            should_quit: false,
            events: None,
        }
    }

    /// Import reads go through this channel once attached; without it they
    /// run inline.
    pub fn attach_events(&mut self, tx: mpsc::Sender<AppEvent>) {
        self.events = Some(tx);
    }

    pub fn key_context(&self) -> KeyContext {
        KeyContext {
            section: self.section,
            focus: self.focus,
            confirming: self.pending.is_some(),
            prompting: self.prompt.is_some(),
            selected_question: self.selected_question(),
        }
    }

    pub fn selected_question(&self) -> Option<QuestionId> {
        self.questions.questions().get(self.selected).map(|q| q.id)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if let Some(cmd) = map_key(&self.key_context(), key) {
            self.dispatch(cmd);
        }
    }

    pub fn on_tick(&mut self) {
        let ttl = Duration::from_secs(self.config.notice_secs);
        if self
            .notice
            .as_ref()
            .is_some_and(|n| n.shown_at.elapsed() >= ttl)
        {
            self.notice = None;
        }
    }

    pub fn dispatch(&mut self, cmd: Command) {
        tracing::trace!(?cmd, "dispatch");
        match cmd {
            Command::Quit => self.should_quit = true,
            Command::ShowSection(section) => self.show_section(section),
            Command::StartExam => {
                if self.exam_unfinished() {
                    self.ask(
                        ConfirmAction::RestartExam,
                        "An exam is in progress. Start over? Current progress will be discarded."
                            .to_string(),
                    );
                } else {
                    self.start_exam();
                }
            }

            Command::FocusNext => self.focus = self.focus.next(),
            Command::FocusPrev => self.focus = self.focus.prev(),
            Command::Focus(focus) => self.focus = focus,
            Command::Edit(key) => self.edit(key),
            Command::SubmitField => match self.focus {
                Focus::QuestionField => self.focus = Focus::AnswerField,
                Focus::AnswerField => self.add_question(),
                Focus::QuestionList => {}
            },
            Command::SelectNext => {
                if self.selected + 1 < self.questions.len() {
                    self.selected += 1;
                }
            }
            Command::SelectPrev => self.selected = self.selected.saturating_sub(1),

            Command::RequestDeleteQuestion(id) => self.request_delete(id),
            Command::RequestClearQuestions => {
                if self.questions.is_empty() {
                    self.notify(NoticeLevel::Info, "Nothing to clear.");
                } else {
                    self.ask(
                        ConfirmAction::ClearQuestions,
                        format!(
                            "Clear all {} questions? This cannot be undone.",
                            self.questions.len()
                        ),
                    );
                }
            }
            Command::ExportQuestions => self.export_questions(),
            Command::PromptImport(target) => {
                let seed = format!(
                    "{}{}",
                    self.config.export_path().display(),
                    std::path::MAIN_SEPARATOR
                );
                self.prompt = Some(ImportPrompt {
                    target,
                    input: LineInput::path(&seed),
                });
            }
            Command::SubmitPrompt => self.submit_prompt(),
            Command::ExportHistory => self.export_history(),
            Command::RequestClearHistory => {
                if self.history.is_empty() {
                    self.notify(NoticeLevel::Info, "Nothing to clear.");
                } else {
                    self.ask(
                        ConfirmAction::ClearHistory,
                        "Clear all answer history? This cannot be undone.".to_string(),
                    );
                }
            }

            Command::SubmitAnswer => self.submit_answer(),
            Command::PreviousQuestion => self.navigate(|s, draft| s.previous(draft)),
            Command::NextQuestion => self.navigate(|s, draft| s.next(draft)),
            Command::FinishExam => self.finish_exam(),
            Command::RequestRestart => {
                if self.session.is_some() || self.last_result.is_some() {
                    self.ask(
                        ConfirmAction::RestartExam,
                        "Restart the exam? Current progress will be discarded.".to_string(),
                    );
                } else {
                    self.start_exam();
                }
            }

            Command::ScrollUp => self.result_scroll = self.result_scroll.saturating_sub(1),
            Command::ScrollDown => self.result_scroll = self.result_scroll.saturating_add(1),

            Command::Confirm => {
                if let Some(pending) = self.pending.take() {
                    self.run_confirmed(pending.action);
                }
            }
            Command::Cancel => {
                if let Some(pending) = self.pending.take() {
                    tracing::debug!(action = ?pending.action, "confirmation declined");
                } else {
                    self.prompt = None;
                }
            }
        }
    }

    fn show_section(&mut self, section: Section) {
        match section {
            Section::Config => self.section = Section::Config,
            Section::Exam => {
                if self.exam_unfinished() {
                    self.section = Section::Exam;
                } else {
                    self.start_exam();
                }
            }
            Section::Result => {
                if self.last_result.is_some() {
                    self.section = Section::Result;
                } else {
                    self.notify(NoticeLevel::Info, "No results yet. Finish an exam first.");
                }
            }
        }
    }

    fn edit(&mut self, key: KeyEvent) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.input.handle(key);
            return;
        }
        match self.section {
            Section::Config => match self.focus {
                Focus::QuestionField => {
                    self.question_input.handle(key);
                }
                Focus::AnswerField => {
                    self.answer_input.handle(key);
                }
                Focus::QuestionList => {}
            },
            Section::Exam => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                if session.current_submitted() {
                    return;
                }
                if self.draft_input.handle(key) == InputResult::Changed {
                    session.save_draft(self.draft_input.value());
                }
            }
            Section::Result => {}
        }
    }

    // --- authoring ---

    pub fn add_question(&mut self) {
        let result = self
            .questions
            .add(self.question_input.value(), self.answer_input.value())
            .map(|_| ());
        match result {
            Ok(()) => {
                self.question_input.clear();
                self.answer_input.clear();
                self.focus = Focus::QuestionField;
                self.selected = self.questions.len() - 1;
                self.notify(NoticeLevel::Success, "Question added.");
            }
            Err(e) => self.report(e),
        }
    }

    fn request_delete(&mut self, id: QuestionId) {
        let Some(question) = self.questions.get(id) else {
            tracing::debug!(%id, "delete requested for unknown question");
            return;
        };
        let prompt = format!("Delete \"{}\"?", truncate(&question.question, 40));
        self.ask(ConfirmAction::DeleteQuestion(id), prompt);
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.questions.len().saturating_sub(1));
    }

    // --- import / export ---

    pub fn export_questions(&mut self) {
        if self.questions.is_empty() {
            self.notify(NoticeLevel::Info, "Nothing to export.");
            return;
        }
        let count = self.questions.len();
        let written = self
            .questions
            .export()
            .map_err(anyhow::Error::from)
            .and_then(|bytes| self.write_export(QUESTIONS_EXPORT_LABEL, &bytes));
        match written {
            Ok(path) => self.notify(
                NoticeLevel::Success,
                format!("Exported {count} questions to {}.", path.display()),
            ),
            Err(e) => self.export_failed(e),
        }
    }

    pub fn export_history(&mut self) {
        if self.history.is_empty() {
            self.notify(NoticeLevel::Info, "Nothing to export.");
            return;
        }
        let written = self
            .history
            .export()
            .map_err(anyhow::Error::from)
            .and_then(|bytes| self.write_export(HISTORY_EXPORT_LABEL, &bytes));
        match written {
            Ok(path) => self.notify(
                NoticeLevel::Success,
                format!("Exported answer history to {}.", path.display()),
            ),
            Err(e) => self.export_failed(e),
        }
    }

    fn write_export(&self, label: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dir = self.config.export_path();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating {}", dir.display()))?;
        let path = dir.join(export_file_name(label, Local::now().date_naive()));
        fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "export written");
        Ok(path)
    }

    fn export_failed(&mut self, e: anyhow::Error) {
        tracing::error!("export failed: {e:#}");
        self.notify(NoticeLevel::Error, format!("Export failed: {e:#}"));
    }

    fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        let raw = prompt.input.value().trim();
        if prompt.input.is_blank() || raw.ends_with(['/', '\\']) {
            self.report(QuizError::Validation("Choose a file to import.".to_string()));
            self.prompt = Some(prompt);
            return;
        }
        let path = crate::config::expand_home(raw);
        match self.events.clone() {
            Some(tx) => {
                spawn_file_read(tx, prompt.target, path.clone());
                self.notify(NoticeLevel::Info, format!("Reading {}...", path.display()));
            }
            None => {
                let content = fs::read(&path);
                self.on_file_loaded(prompt.target, &path, content);
            }
        }
    }

    /// Second half of an import: the file's content has arrived.
    pub fn on_file_loaded(&mut self, target: ImportTarget, path: &Path, content: io::Result<Vec<u8>>) {
        let bytes = match content {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), "import read failed: {e}");
                self.notify(
                    NoticeLevel::Error,
                    format!("Could not read {}: {e}", path.display()),
                );
                return;
            }
        };
        tracing::info!(path = %path.display(), ?target, bytes = bytes.len(), "import file loaded");

        match target {
            ImportTarget::Questions => self.import_questions(&bytes),
            ImportTarget::History => self.import_history(&bytes),
        }
    }

    pub fn import_questions(&mut self, bytes: &[u8]) {
        let import = match QuestionImport::parse(bytes) {
            Ok(import) => import,
            Err(e) => return self.report(e),
        };
        if import.candidates.is_empty() {
            return self.report(QuizError::NoValidQuestions);
        }

        if self.questions.is_empty() {
            self.apply_question_import(import.candidates, import.skipped);
        } else {
            let prompt = format!(
                "There are {} questions. Importing replaces them with {} from the file. Continue?",
                self.questions.len(),
                import.candidates.len()
            );
            self.ask(
                ConfirmAction::ReplaceQuestions {
                    candidates: import.candidates,
                    skipped: import.skipped,
                },
                prompt,
            );
        }
    }

    fn apply_question_import(&mut self, candidates: Vec<ImportCandidate>, skipped: usize) {
        let policy = if self.config.preserve_import_ids {
            IdPolicy::Preserve
        } else {
            IdPolicy::Fresh
        };
        match self.questions.replace_all(candidates, policy) {
            Ok(accepted) => {
                self.selected = 0;
                let text = if skipped > 0 {
                    format!("Imported {accepted} questions ({skipped} skipped).")
                } else {
                    format!("Imported {accepted} questions.")
                };
                self.notify(NoticeLevel::Success, text);
            }
            Err(e) => self.report(e),
        }
    }

    pub fn import_history(&mut self, bytes: &[u8]) {
        let imported = match HistoryStore::parse_import(bytes) {
            Ok(map) => map,
            Err(e) => return self.report(e),
        };
        if self.history.is_empty() {
            self.apply_history_import(imported);
        } else {
            self.ask(
                ConfirmAction::MergeHistory(imported),
                "Merge the imported answer history into the existing records?".to_string(),
            );
        }
    }

    fn apply_history_import(&mut self, imported: HistoryMap) {
        match self.history.merge_from(imported) {
            Ok(()) => self.notify(NoticeLevel::Success, "Answer history imported."),
            Err(e) => self.report(e),
        }
    }

    // --- exam ---

    pub fn start_exam(&mut self) {
        self.section = Section::Exam;
        self.draft_input.clear();
        match ExamSession::start(self.questions.questions()) {
            Ok(session) => {
                tracing::info!(questions = session.len(), "exam started");
                self.session = Some(session);
                self.no_questions = false;
            }
            Err(e) => {
                tracing::debug!("exam not started: {e}");
                self.session = None;
                self.no_questions = true;
            }
        }
    }

    fn exam_unfinished(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.state() != ExamState::Finalized)
    }

    pub fn submit_answer(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let submitted = session.submit_current(self.draft_input.value(), Local::now());
        self.draft_input.set(session.current_answer());

        match submitted {
            Ok(Some(submission)) => {
                let timestamp = format_timestamp(submission.at, &self.config.timestamp_format);
                if let Err(e) =
                    self.history
                        .append(submission.question_id, &submission.answer, &timestamp)
                {
                    self.report(e);
                }
            }
            Ok(None) => tracing::debug!("empty answer submitted, nothing recorded"),
            Err(e) => self.report(e),
        }
    }

    fn navigate(&mut self, step: impl FnOnce(&mut ExamSession, &str) -> bool) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if step(session, self.draft_input.value()) {
            self.draft_input.set(session.current_answer());
        }
    }

    pub fn finish_exam(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.finalize(&self.history) {
            Ok(result) => {
                tracing::info!(questions = result.len(), "exam finished");
                self.last_result = Some(result);
                self.result_scroll = 0;
                self.section = Section::Result;
            }
            Err(e) => self.report(e),
        }
    }

    // --- confirmation protocol ---

    fn ask(&mut self, action: ConfirmAction, prompt: String) {
        self.pending = Some(PendingConfirmation { action, prompt });
    }

    fn run_confirmed(&mut self, action: ConfirmAction) {
        tracing::debug!(?action, "confirmed");
        match action {
            ConfirmAction::DeleteQuestion(id) => match self.questions.delete(id) {
                Ok(true) => {
                    self.clamp_selection();
                    self.notify(NoticeLevel::Success, "Question deleted.");
                }
                Ok(false) => {}
                Err(e) => self.report(e),
            },
            ConfirmAction::ClearQuestions => match self.questions.clear() {
                Ok(()) => {
                    self.selected = 0;
                    self.notify(NoticeLevel::Success, "All questions cleared.");
                }
                Err(e) => self.report(e),
            },
            ConfirmAction::ClearHistory => match self.history.clear() {
                Ok(()) => self.notify(NoticeLevel::Success, "All answer history cleared."),
                Err(e) => self.report(e),
            },
            ConfirmAction::RestartExam => self.start_exam(),
            ConfirmAction::ReplaceQuestions {
                candidates,
                skipped,
            } => self.apply_question_import(candidates, skipped),
            ConfirmAction::MergeHistory(imported) => self.apply_history_import(imported),
        }
    }

    // --- notices ---

    pub fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notice = Some(Notice {
            level,
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    fn report(&mut self, err: QuizError) {
        match &err {
            QuizError::MalformedImport(detail) => tracing::warn!("rejected import: {detail}"),
            QuizError::Storage(e) => tracing::error!("persisting failed: {e}"),
            QuizError::Encode(e) => tracing::error!("encoding failed: {e}"),
            other => tracing::debug!("{other}"),
        }
        self.notify(NoticeLevel::Error, err.to_string());
    }
}

/// Format with the configured pattern, falling back to the default layout
/// when the pattern has invalid specifiers.
pub fn format_timestamp(at: DateTime<Local>, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", at.format(pattern)).is_ok() {
        return out;
    }
    tracing::warn!(pattern, "invalid timestamp format, using default");
    at.format("%Y/%-m/%-d %H:%M:%S").to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::kv::MemoryStore;
    use crate::store::schema::HISTORY_KEY;
    use chrono::TimeZone;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn make_app() -> App {
        App::new(Config::default(), Rc::new(MemoryStore::new()), Theme::default())
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn add(app: &mut App, q: &str, a: &str) {
        app.question_input.set(q);
        app.answer_input.set(a);
        app.add_question();
    }

    #[test]
    fn test_add_question_through_keys() {
        let mut app = make_app();
        type_text(&mut app, "2+2?");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.focus, Focus::AnswerField);
        type_text(&mut app, "4");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.questions.len(), 1);
        assert_eq!(app.questions.questions()[0].question, "2+2?");
        assert!(app.question_input.value().is_empty());
        assert_eq!(app.notice.as_ref().unwrap().level, NoticeLevel::Success);
    }

    #[test]
    fn test_add_blank_question_reports_validation() {
        let mut app = make_app();
        add(&mut app, "q", "  ");
        assert!(app.questions.is_empty());
        let notice = app.notice.as_ref().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.text.contains("Fill in both"));
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut app = make_app();
        add(&mut app, "a", "1");
        let id = app.questions.questions()[0].id;

        app.dispatch(Command::RequestDeleteQuestion(id));
        assert!(app.pending.is_some());
        app.dispatch(Command::Cancel);
        assert_eq!(app.questions.len(), 1);

        app.dispatch(Command::RequestDeleteQuestion(id));
        app.dispatch(Command::Confirm);
        assert!(app.questions.is_empty());
        assert!(app.pending.is_none());
    }

    #[test]
    fn test_delete_unknown_id_is_silent_noop() {
        let mut app = make_app();
        app.dispatch(Command::RequestDeleteQuestion(QuestionId::from(123)));
        assert!(app.pending.is_none());
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_clear_empty_collections_reports_nothing_to_clear() {
        let mut app = make_app();
        app.dispatch(Command::RequestClearQuestions);
        assert!(app.pending.is_none());
        assert_eq!(app.notice.as_ref().unwrap().text, "Nothing to clear.");
        app.dispatch(Command::RequestClearHistory);
        assert!(app.pending.is_none());
    }

    #[test]
    fn test_start_exam_without_questions_shows_guidance() {
        let mut app = make_app();
        app.dispatch(Command::StartExam);
        assert_eq!(app.section, Section::Exam);
        assert!(app.no_questions);
        assert!(app.session.is_none());
    }

    #[test]
    fn test_submit_records_history_and_locks_draft() {
        let mut app = make_app();
        add(&mut app, "2+2?", "4");
        app.dispatch(Command::StartExam);
        type_text(&mut app, "four");
        app.dispatch(Command::SubmitAnswer);

        let id = app.questions.questions()[0].id;
        assert_eq!(app.history.records(id).len(), 1);
        assert_eq!(app.history.records(id)[0].answer, "four");

        type_text(&mut app, "more");
        assert_eq!(app.session.as_ref().unwrap().current_answer(), "four");
        assert_eq!(app.draft_input.value(), "four");

        // A second submit cannot append another record.
        app.dispatch(Command::SubmitAnswer);
        assert_eq!(app.history.records(id).len(), 1);
    }

    #[test]
    fn test_empty_submit_leaves_no_history() {
        let mut app = make_app();
        add(&mut app, "q", "a");
        app.dispatch(Command::StartExam);
        app.dispatch(Command::SubmitAnswer);
        assert!(app.session.as_ref().unwrap().is_submitted(0));
        assert!(app.history.is_empty());
    }

    #[test]
    fn test_finish_gated_until_all_submitted() {
        let mut app = make_app();
        add(&mut app, "q1", "a1");
        add(&mut app, "q2", "a2");
        app.dispatch(Command::StartExam);
        type_text(&mut app, "x");
        app.dispatch(Command::SubmitAnswer);
        app.dispatch(Command::FinishExam);

        assert!(app.last_result.is_none());
        assert_eq!(app.section, Section::Exam);
        assert!(app.notice.as_ref().unwrap().text.starts_with("1 question"));

        app.dispatch(Command::NextQuestion);
        type_text(&mut app, "y");
        app.dispatch(Command::SubmitAnswer);
        app.dispatch(Command::FinishExam);
        assert_eq!(app.section, Section::Result);
        let result = app.last_result.as_ref().unwrap();
        assert_eq!(result.entries[0].history.len(), 1);
        assert_eq!(result.entries[1].answer, "y");
    }

    #[test]
    fn test_restart_discards_session_after_confirmation() {
        let mut app = make_app();
        add(&mut app, "q1", "a1");
        app.dispatch(Command::StartExam);
        type_text(&mut app, "draft");
        app.dispatch(Command::RequestRestart);
        assert!(app.pending.is_some());
        app.dispatch(Command::Confirm);

        let session = app.session.as_ref().unwrap();
        assert_eq!(session.current_answer(), "");
        assert!(app.draft_input.value().is_empty());
    }

    #[test]
    fn test_exam_tab_resumes_unfinished_exam() {
        let mut app = make_app();
        add(&mut app, "q1", "a1");
        add(&mut app, "q2", "a2");
        app.dispatch(Command::StartExam);
        app.dispatch(Command::NextQuestion);
        type_text(&mut app, "half");
        app.dispatch(Command::ShowSection(Section::Config));

        press(&mut app, KeyCode::F(2));
        assert_eq!(app.section, Section::Exam);
        assert!(app.pending.is_none());
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.current_answer(), "half");
        assert_eq!(app.draft_input.value(), "half");
    }

    #[test]
    fn test_exam_tab_starts_fresh_after_finish() {
        let mut app = make_app();
        add(&mut app, "q1", "a1");
        app.dispatch(Command::StartExam);
        type_text(&mut app, "x");
        app.dispatch(Command::SubmitAnswer);
        app.dispatch(Command::FinishExam);

        app.dispatch(Command::ShowSection(Section::Exam));
        assert_eq!(app.section, Section::Exam);
        assert!(app.pending.is_none());
        assert_eq!(app.session.as_ref().unwrap().state(), ExamState::InProgress);
        assert!(!app.session.as_ref().unwrap().is_submitted(0));
    }

    #[test]
    fn test_exam_tab_picks_up_questions_added_after_empty_start() {
        let mut app = make_app();
        app.dispatch(Command::StartExam);
        assert!(app.no_questions);
        app.dispatch(Command::ShowSection(Section::Config));
        add(&mut app, "q", "a");

        app.dispatch(Command::ShowSection(Section::Exam));
        assert!(!app.no_questions);
        assert_eq!(app.session.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_start_over_unfinished_exam_asks_first() {
        let mut app = make_app();
        add(&mut app, "q1", "a1");
        app.dispatch(Command::StartExam);
        type_text(&mut app, "keep me");
        app.dispatch(Command::ShowSection(Section::Config));

        app.dispatch(Command::StartExam);
        assert!(app.pending.is_some());
        app.dispatch(Command::Cancel);
        assert_eq!(app.session.as_ref().unwrap().current_answer(), "keep me");

        app.dispatch(Command::StartExam);
        app.dispatch(Command::Confirm);
        assert_eq!(app.section, Section::Exam);
        assert_eq!(app.session.as_ref().unwrap().current_answer(), "");
    }

    #[test]
    fn test_result_section_needs_a_finished_exam() {
        let mut app = make_app();
        app.dispatch(Command::ShowSection(Section::Result));
        assert_eq!(app.section, Section::Config);
        assert!(app.notice.is_some());
    }

    #[test]
    fn test_import_into_empty_store_applies_without_confirmation() {
        let mut app = make_app();
        app.import_questions(br#"[{"question": "a", "answer": "1"}, {"question": "b"}]"#);
        assert!(app.pending.is_none());
        assert_eq!(app.questions.len(), 1);
        assert_eq!(app.notice.as_ref().unwrap().text, "Imported 1 questions (1 skipped).");
    }

    #[test]
    fn test_import_over_existing_asks_first() {
        let mut app = make_app();
        add(&mut app, "old", "x");
        app.import_questions(br#"[{"question": "new", "answer": "y"}]"#);
        assert!(app.pending.is_some());
        assert_eq!(app.questions.questions()[0].question, "old");

        app.dispatch(Command::Confirm);
        assert_eq!(app.questions.questions()[0].question, "new");
    }

    #[test]
    fn test_malformed_import_changes_nothing() {
        let mut app = make_app();
        add(&mut app, "keep", "me");
        app.import_questions(b"{\"not\": \"an array\"}");
        app.import_history(b"[1, 2]");
        assert!(app.pending.is_none());
        assert_eq!(app.questions.len(), 1);
        assert!(app.history.is_empty());
        assert!(app.notice.as_ref().unwrap().text.contains("corrupt"));
    }

    #[test]
    fn test_import_history_merges_after_confirmation() {
        let kv = Rc::new(MemoryStore::with_entry(
            HISTORY_KEY,
            r#"{"1": [{"answer": "mine", "timestamp": "t0"}]}"#,
        ));
        let mut app = App::new(Config::default(), kv, Theme::default());
        app.import_history(br#"{"1": [{"answer": "theirs", "timestamp": "t1"}]}"#);
        app.dispatch(Command::Confirm);

        let answers: Vec<_> = app
            .history
            .records(QuestionId::from(1))
            .iter()
            .map(|r| r.answer.as_str())
            .collect();
        assert_eq!(answers, vec!["mine", "theirs"]);
    }

    #[test]
    fn test_blank_import_path_keeps_prompt_open() {
        let mut app = make_app();
        app.dispatch(Command::PromptImport(ImportTarget::Questions));
        app.prompt.as_mut().unwrap().input.set("   ");
        app.dispatch(Command::SubmitPrompt);
        assert!(app.prompt.is_some());
        assert_eq!(app.notice.as_ref().unwrap().level, NoticeLevel::Error);
    }

    #[test]
    fn test_export_writes_dated_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.export_dir = dir.path().to_string_lossy().to_string();
        let mut app = App::new(config, Rc::new(MemoryStore::new()), Theme::default());

        app.export_questions();
        assert_eq!(app.notice.as_ref().unwrap().text, "Nothing to export.");

        add(&mut app, "2+2?", "4");
        app.export_questions();
        let name = export_file_name(QUESTIONS_EXPORT_LABEL, Local::now().date_naive());
        let written = fs::read_to_string(dir.path().join(name)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_notice_expires_on_tick() {
        let mut app = make_app();
        app.notify(NoticeLevel::Info, "hello");
        app.on_tick();
        assert!(app.notice.is_some());
        app.notice.as_mut().unwrap().shown_at = Instant::now() - Duration::from_secs(60);
        app.on_tick();
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_format_timestamp_falls_back_on_bad_pattern() {
        let at = Local.with_ymd_and_hms(2024, 1, 5, 14, 3, 22).unwrap();
        assert_eq!(format_timestamp(at, "%Y/%-m/%-d %H:%M:%S"), "2024/1/5 14:03:22");
        assert_eq!(format_timestamp(at, "%Q"), "2024/1/5 14:03:22");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd\u{2026}");
    }
}
