use crate::playback::ActionId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Playback moved past the positions the action recorded.
    #[error("Too late to undo {name} ({action}): the queue has progressed too far")]
    IllegalUndo { action: ActionId, name: &'static str },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl QueueError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        QueueError::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, QueueError>;
