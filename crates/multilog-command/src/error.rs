/// Errors that can occur while parsing a configuration command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The input is not usable at all (wrong length, unterminated, not text).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The input has the right shape but malformed content.
    #[error("bad input: {0}")]
    BadInput(String),

    /// The command keyword is not recognised.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The command needs an argument that was not given.
    #[error("command {0} requires an argument")]
    MissingArgument(String),

    /// The framing mode argument is not `raw` or `line`.
    #[error("invalid mode: {0}")]
    InvalidMode(String),
}

pub type Result<T> = std::result::Result<T, CommandError>;
