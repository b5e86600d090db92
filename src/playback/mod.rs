pub mod action;
pub mod error;
pub mod queue;
pub mod registry;
pub mod session;

pub use action::{Action, ActionId, ActionKind, AuthorId};
pub use error::{QueueError, Result};
pub use queue::Queue;
pub use registry::Registry;
pub use session::{FollowUp, Session, SessionId};
