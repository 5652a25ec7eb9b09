use thiserror::Error;
use tracing::warn;

/// Why a poll submission was refused. Checked in declaration order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("question is required")]
    MissingQuestion,
    #[error("at least 2 options are required")]
    TooFewOptions,
    #[error("at most 10 options are allowed")]
    TooManyOptions,
    #[error("duplicate options are not allowed")]
    DuplicateOptions,
    #[error("options must be at most 100 characters")]
    OptionTooLong,
    #[error("author not found")]
    UnknownAuthor,
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("poll, option and user ids are required")]
    MissingId,
    #[error("poll not found")]
    PollNotFound,
    #[error("option does not belong to this poll")]
    OptionNotFound,
    #[error("poll is closed for voting")]
    PollClosed,
    #[error("only the poll author may do this")]
    NotAuthor,
    /// Persistence failure. The only variant that is not an ordinary outcome.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type CoreResult<T> = Result<T, PollError>;

/// Turn ordinary refusals into `None` and let store failures through.
pub(crate) fn recoverable<T>(result: CoreResult<T>, operation: &str) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(PollError::Store(e)) => Err(e),
        Err(reason) => {
            warn!("{} refused: {}", operation, reason);
            Ok(None)
        }
    }
}
