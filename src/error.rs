use thiserror::Error;

/// Failures surfaced to the user as notices. None of them is fatal: the
/// worst outcome is unchanged state plus a message in the footer.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("{0}")]
    Validation(String),

    #[error("There are no questions yet. Add some in the authoring section first.")]
    NoQuestions,

    #[error("No valid questions in the file.")]
    NoValidQuestions,

    #[error("Import failed: the file is corrupt or in the wrong format.")]
    MalformedImport(String),

    #[error("This answer has already been submitted.")]
    AlreadySubmitted,

    #[error("{remaining} question(s) still unanswered. Submit every answer first.")]
    Unanswered { remaining: usize },

    #[error("Could not save: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Could not encode data: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type QuizResult<T> = Result<T, QuizError>;
