use crate::app::{App, NoticeLevel};
use crate::command::{Focus, Section};
use crate::event::ImportTarget;
use crate::session::exam::ExamSession;
use crate::session::result::ExamResult;
use crate::store::schema::{HistoryRecord, QuestionId};

pub const NO_ANSWER: &str = "(no answer)";
pub const EMPTY_LIST_MESSAGE: &str = "No questions yet. Write one above and press Enter.";
pub const NO_QUESTIONS_MESSAGE: &str =
    "There are no questions to answer. Press F1 to add some first.";

/// Everything the renderer needs, derived from [`App`] without mutating it.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub section: Section,
    pub tabs: Vec<NavTab>,
    pub body: Body,
    pub hints: Vec<&'static str>,
    pub notice: Option<(NoticeLevel, String)>,
    pub confirm: Option<String>,
    pub prompt: Option<PromptView>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavTab {
    pub key: &'static str,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Config(ConfigView),
    Exam(ExamView),
    Result(ResultView),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputView {
    pub before: String,
    pub cursor: Option<char>,
    pub after: String,
    pub focused: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionRow {
    pub id: QuestionId,
    pub number: usize,
    pub question: String,
    pub answer: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConfigView {
    pub question_input: InputView,
    pub answer_input: InputView,
    pub list_focused: bool,
    pub rows: Vec<QuestionRow>,
    pub count: usize,
    pub empty_message: Option<&'static str>,
    pub history_keys: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExamView {
    NoQuestions,
    Active(ExamPanel),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExamPanel {
    pub position: String,
    pub question: String,
    pub draft: InputView,
    pub draft_editable: bool,
    pub show_submit: bool,
    pub show_previous: bool,
    pub show_next: bool,
    pub show_finish: bool,
    pub unsubmitted: usize,
    pub feedback: Option<Feedback>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feedback {
    pub answer: String,
    pub standard_answer: String,
    /// Empty means the history block is not shown.
    pub history: Vec<HistoryRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultView {
    pub summary: String,
    pub blocks: Vec<ResultBlock>,
    pub scroll: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultBlock {
    pub title: String,
    pub answer: String,
    pub standard_answer: String,
    pub history_title: Option<String>,
    pub history: Vec<HistoryRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptView {
    pub title: &'static str,
    pub input: InputView,
    pub completion_error: bool,
}

impl ViewState {
    pub fn project(app: &App) -> Self {
        let result_available = app.last_result.is_some();
        let body = match app.section {
            Section::Config => Body::Config(project_config(app)),
            Section::Exam => Body::Exam(match &app.session {
                Some(session) if !app.no_questions => {
                    ExamView::Active(project_exam(app, session))
                }
                _ => ExamView::NoQuestions,
            }),
            Section::Result => Body::Result(match &app.last_result {
                Some(result) => project_result(result, app.result_scroll),
                None => ResultView {
                    summary: "No results yet.".to_string(),
                    blocks: Vec::new(),
                    scroll: 0,
                },
            }),
        };

        Self {
            section: app.section,
            tabs: nav_tabs(app.section, result_available),
            hints: hints(app),
            notice: app.notice.as_ref().map(|n| (n.level, n.text.clone())),
            confirm: app.pending.as_ref().map(|p| p.prompt.clone()),
            prompt: app.prompt.as_ref().map(|p| PromptView {
                title: match p.target {
                    ImportTarget::Questions => " Import questions from ",
                    ImportTarget::History => " Import answer history from ",
                },
                input: input_view(p.input.render_parts(), true),
                completion_error: p.input.completion_error,
            }),
            body,
        }
    }
}

fn nav_tabs(section: Section, result_available: bool) -> Vec<NavTab> {
    let mut tabs = vec![
        NavTab {
            key: "F1",
            label: "Questions",
            active: section == Section::Config,
        },
        NavTab {
            key: "F2",
            label: "Exam",
            active: section == Section::Exam,
        },
    ];
    if result_available {
        tabs.push(NavTab {
            key: "F3",
            label: "Results",
            active: section == Section::Result,
        });
    }
    tabs
}

fn input_view(parts: (&str, Option<char>, &str), focused: bool) -> InputView {
    let (before, cursor, after) = parts;
    InputView {
        before: before.to_string(),
        cursor,
        after: after.to_string(),
        focused,
    }
}

fn project_config(app: &App) -> ConfigView {
    let rows: Vec<QuestionRow> = app
        .questions
        .questions()
        .iter()
        .enumerate()
        .map(|(i, q)| QuestionRow {
            id: q.id,
            number: i + 1,
            question: q.question.clone(),
            answer: q.answer.clone(),
            selected: app.focus == Focus::QuestionList && i == app.selected,
        })
        .collect();

    ConfigView {
        question_input: input_view(
            app.question_input.render_parts(),
            app.focus == Focus::QuestionField,
        ),
        answer_input: input_view(
            app.answer_input.render_parts(),
            app.focus == Focus::AnswerField,
        ),
        list_focused: app.focus == Focus::QuestionList,
        count: rows.len(),
        empty_message: rows.is_empty().then_some(EMPTY_LIST_MESSAGE),
        rows,
        history_keys: app.history.len(),
    }
}

fn project_exam(app: &App, session: &ExamSession) -> ExamPanel {
    let submitted = session.current_submitted();
    let question = session.current_question();
    let on_last = session.is_last();

    let feedback = submitted.then(|| {
        let answer = session.current_answer();
        Feedback {
            answer: if answer.is_empty() {
                NO_ANSWER.to_string()
            } else {
                answer.to_string()
            },
            standard_answer: question.answer.clone(),
            history: app.history.records(question.id).to_vec(),
        }
    });

    ExamPanel {
        position: format!("{} / {}", session.current_index() + 1, session.len()),
        question: question.question.clone(),
        draft: input_view(app.draft_input.render_parts(), !submitted),
        draft_editable: !submitted,
        show_submit: !submitted,
        show_previous: !session.is_first(),
        show_next: !on_last,
        show_finish: on_last && session.all_submitted(),
        unsubmitted: session.unsubmitted_count(),
        feedback,
    }
}

fn project_result(result: &ExamResult, scroll: u16) -> ResultView {
    let blocks = result
        .entries
        .iter()
        .enumerate()
        .map(|(i, entry)| ResultBlock {
            title: format!("Question {}: {}", i + 1, entry.question),
            answer: if entry.answer.is_empty() {
                NO_ANSWER.to_string()
            } else {
                entry.answer.clone()
            },
            standard_answer: entry.standard_answer.clone(),
            history_title: (!entry.history.is_empty())
                .then(|| format!("Answer history ({} attempts)", entry.history.len())),
            history: entry.history.clone(),
        })
        .collect();

    ResultView {
        summary: format!("Finished! {} questions, all answered.", result.len()),
        blocks,
        scroll,
    }
}

fn hints(app: &App) -> Vec<&'static str> {
    if app.pending.is_some() {
        return vec!["[y/Enter] Confirm", "[n/Esc] Cancel"];
    }
    if app.prompt.is_some() {
        return vec!["[Enter] Import", "[Tab] Complete path", "[Esc] Cancel"];
    }
    match app.section {
        Section::Config if app.focus.is_field() => vec![
            "[Enter] Next field / Add",
            "[Tab] Switch focus",
            "[Esc] Question list",
            "[F2] Exam",
        ],
        Section::Config => vec![
            "[a] Add",
            "[j/k] Select",
            "[d] Delete",
            "[e/i/c] Export/Import/Clear questions",
            "[E/I/C] Export/Import/Clear history",
            "[s] Start exam",
            "[q] Quit",
        ],
        Section::Exam => match &app.session {
            Some(session) => {
                let mut hints = Vec::new();
                if !session.current_submitted() {
                    hints.push("[Enter] Submit answer");
                }
                if !session.is_first() {
                    hints.push("[PgUp] Previous");
                }
                if !session.is_last() {
                    hints.push("[PgDn] Next");
                }
                if session.is_last() && session.all_submitted() {
                    hints.push("[Ctrl+F] Finish");
                }
                hints.push("[Ctrl+R] Restart");
                hints.push("[Esc] Questions");
                hints
            }
            None => vec!["[F1] Questions", "[Ctrl+C] Quit"],
        },
        Section::Result => vec!["[j/k] Scroll", "[r] Restart", "[c/Esc] Questions", "[q] Quit"],
    }
}
