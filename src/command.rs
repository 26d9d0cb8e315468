use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::event::ImportTarget;
use crate::store::schema::QuestionId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Config,
    Exam,
    Result,
}

/// Keyboard focus inside the authoring section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    QuestionField,
    AnswerField,
    QuestionList,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::QuestionField => Focus::AnswerField,
            Focus::AnswerField => Focus::QuestionList,
            Focus::QuestionList => Focus::QuestionField,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::QuestionField => Focus::QuestionList,
            Focus::AnswerField => Focus::QuestionField,
            Focus::QuestionList => Focus::AnswerField,
        }
    }

    pub fn is_field(self) -> bool {
        !matches!(self, Focus::QuestionList)
    }
}

/// Everything the user can ask for. Commands that act on one question carry
/// its id, so nothing depends on what happens to be rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// The exam tab resumes an unfinished exam and starts one otherwise.
    ShowSection(Section),
    /// Begin a new exam; asks first when one is still unfinished.
    StartExam,

    FocusNext,
    FocusPrev,
    Focus(Focus),
    /// Route the key to whichever text input has focus.
    Edit(KeyEvent),
    /// Enter inside an authoring field.
    SubmitField,
    SelectNext,
    SelectPrev,

    RequestDeleteQuestion(QuestionId),
    RequestClearQuestions,
    ExportQuestions,
    PromptImport(ImportTarget),
    SubmitPrompt,
    ExportHistory,
    RequestClearHistory,

    SubmitAnswer,
    PreviousQuestion,
    NextQuestion,
    FinishExam,
    RequestRestart,

    ScrollUp,
    ScrollDown,

    Confirm,
    Cancel,
}

/// The slice of application state that decides what a key means.
#[derive(Clone, Copy, Debug)]
pub struct KeyContext {
    pub section: Section,
    pub focus: Focus,
    pub confirming: bool,
    pub prompting: bool,
    pub selected_question: Option<QuestionId>,
}

pub fn map_key(ctx: &KeyContext, key: KeyEvent) -> Option<Command> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    if ctx.confirming {
        return match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(Command::Confirm),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Command::Cancel),
            _ => None,
        };
    }

    if ctx.prompting {
        return match key.code {
            KeyCode::Enter => Some(Command::SubmitPrompt),
            KeyCode::Esc => Some(Command::Cancel),
            _ => Some(Command::Edit(key)),
        };
    }

    match key.code {
        KeyCode::F(1) => return Some(Command::ShowSection(Section::Config)),
        KeyCode::F(2) => return Some(Command::ShowSection(Section::Exam)),
        KeyCode::F(3) => return Some(Command::ShowSection(Section::Result)),
        _ => {}
    }

    match ctx.section {
        Section::Config => map_config_key(ctx, key),
        Section::Exam => map_exam_key(key),
        Section::Result => map_result_key(key),
    }
}

fn map_config_key(ctx: &KeyContext, key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Tab => return Some(Command::FocusNext),
        KeyCode::BackTab => return Some(Command::FocusPrev),
        _ => {}
    }

    if ctx.focus.is_field() {
        return match key.code {
            KeyCode::Enter => Some(Command::SubmitField),
            KeyCode::Esc => Some(Command::Focus(Focus::QuestionList)),
            _ => Some(Command::Edit(key)),
        };
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('j') | KeyCode::Down => Some(Command::SelectNext),
        KeyCode::Char('k') | KeyCode::Up => Some(Command::SelectPrev),
        KeyCode::Char('d') | KeyCode::Delete => {
            ctx.selected_question.map(Command::RequestDeleteQuestion)
        }
        KeyCode::Char('a') | KeyCode::Enter => Some(Command::Focus(Focus::QuestionField)),
        KeyCode::Char('e') => Some(Command::ExportQuestions),
        KeyCode::Char('i') => Some(Command::PromptImport(ImportTarget::Questions)),
        KeyCode::Char('c') => Some(Command::RequestClearQuestions),
        KeyCode::Char('E') => Some(Command::ExportHistory),
        KeyCode::Char('I') => Some(Command::PromptImport(ImportTarget::History)),
        KeyCode::Char('C') => Some(Command::RequestClearHistory),
        KeyCode::Char('s') => Some(Command::StartExam),
        _ => None,
    }
}

fn map_exam_key(key: KeyEvent) -> Option<Command> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => Some(Command::SubmitAnswer),
        KeyCode::PageUp => Some(Command::PreviousQuestion),
        KeyCode::PageDown => Some(Command::NextQuestion),
        KeyCode::Char('p') if ctrl => Some(Command::PreviousQuestion),
        KeyCode::Char('n') if ctrl => Some(Command::NextQuestion),
        KeyCode::Char('f') if ctrl => Some(Command::FinishExam),
        KeyCode::Char('r') if ctrl => Some(Command::RequestRestart),
        KeyCode::Esc => Some(Command::ShowSection(Section::Config)),
        _ => Some(Command::Edit(key)),
    }
}

fn map_result_key(key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => Some(Command::ScrollDown),
        KeyCode::Char('k') | KeyCode::Up => Some(Command::ScrollUp),
        KeyCode::Char('r') => Some(Command::RequestRestart),
        KeyCode::Char('c') | KeyCode::Esc => Some(Command::ShowSection(Section::Config)),
        KeyCode::Char('q') => Some(Command::Quit),
        _ => None,
    }
}
