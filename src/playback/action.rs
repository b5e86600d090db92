use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub u64);

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "action {}", self.0)
    }
}

/// Opaque reference to whoever issued an action. Never resolved by the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorId(pub u64);

/// The closed set of queue mutations.
///
/// All indices are relative to the cursor at the time the action is performed:
/// position 0 is the next item to play. Fields marked as recorded are filled in
/// by `Queue::perform` and are what `Queue::undo` reverses from.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    AddSingle {
        /// Held before perform and after undo; owned by the queue in between.
        item: Option<Item>,
        /// Recorded.
        index: usize,
    },
    AddMany {
        items: Vec<Item>,
        /// Recorded.
        start: usize,
        /// Recorded.
        count: usize,
    },
    InsertSingle {
        item: Option<Item>,
        index: usize,
    },
    InsertMany {
        items: Vec<Item>,
        start: usize,
        /// Recorded.
        count: usize,
    },
    RemoveSingle {
        index: usize,
        /// Recorded.
        removed: Option<Item>,
    },
    RemoveRange {
        start: usize,
        /// Inclusive. `None` removes through the end of the pending segment and
        /// is replaced by the resolved bound on perform.
        end: Option<usize>,
        /// Recorded.
        removed: Vec<Item>,
    },
    MoveSingle {
        from: usize,
        to: usize,
    },
    MoveRange {
        start: usize,
        /// Inclusive.
        end: usize,
        /// Target in pre-move coordinates. At or before `start` the range begins
        /// there, after `end` the range ends there.
        at: usize,
        /// Recorded: where the range begins once moved.
        resolved_at: usize,
    },
    Shuffle {
        /// `seeds[i]` is the new position of the item previously at `i`.
        /// Generated on perform when `None`.
        seeds: Option<Vec<usize>>,
    },
    Repeat,
    StopRepeat,
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::AddSingle { .. } => "AddSingle",
            ActionKind::AddMany { .. } => "AddMany",
            ActionKind::InsertSingle { .. } => "InsertSingle",
            ActionKind::InsertMany { .. } => "InsertMany",
            ActionKind::RemoveSingle { .. } => "RemoveSingle",
            ActionKind::RemoveRange { .. } => "RemoveRange",
            ActionKind::MoveSingle { .. } => "MoveSingle",
            ActionKind::MoveRange { .. } => "MoveRange",
            ActionKind::Shuffle { .. } => "Shuffle",
            ActionKind::Repeat => "Repeat",
            ActionKind::StopRepeat => "StopRepeat",
        }
    }

    /// Smallest relative index whose position the undo relies on.
    ///
    /// `None` for actions that can always be undone.
    pub(crate) fn min_touched(&self) -> Option<usize> {
        match self {
            ActionKind::AddSingle { index, .. }
            | ActionKind::InsertSingle { index, .. }
            | ActionKind::RemoveSingle { index, .. } => Some(*index),
            ActionKind::AddMany { start, .. }
            | ActionKind::InsertMany { start, .. }
            | ActionKind::RemoveRange { start, .. } => Some(*start),
            ActionKind::MoveSingle { from, to } => Some((*from).min(*to)),
            ActionKind::MoveRange {
                start, resolved_at, ..
            } => Some((*start).min(*resolved_at)),
            ActionKind::Shuffle { .. } | ActionKind::Repeat | ActionKind::StopRepeat => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub(crate) id: Option<ActionId>,
    pub(crate) author: AuthorId,
    pub(crate) performed_at: Option<DateTime<Utc>>,
    pub(crate) performed_at_cursor: usize,
    pub(crate) linked_to_previous: bool,
    pub(crate) kind: ActionKind,
}

impl Action {
    pub fn new(author: AuthorId, kind: ActionKind) -> Self {
        Action {
            id: None,
            author,
            performed_at: None,
            performed_at_cursor: 0,
            linked_to_previous: false,
            kind,
        }
    }

    pub fn add_single(author: AuthorId, item: Item) -> Self {
        Self::new(
            author,
            ActionKind::AddSingle {
                item: Some(item),
                index: 0,
            },
        )
    }

    pub fn add_many(author: AuthorId, items: Vec<Item>) -> Self {
        Self::new(
            author,
            ActionKind::AddMany {
                items,
                start: 0,
                count: 0,
            },
        )
    }

    pub fn insert_single(author: AuthorId, index: usize, item: Item) -> Self {
        Self::new(
            author,
            ActionKind::InsertSingle {
                item: Some(item),
                index,
            },
        )
    }

    pub fn insert_many(author: AuthorId, start: usize, items: Vec<Item>) -> Self {
        Self::new(
            author,
            ActionKind::InsertMany {
                items,
                start,
                count: 0,
            },
        )
    }

    pub fn remove_single(author: AuthorId, index: usize) -> Self {
        Self::new(
            author,
            ActionKind::RemoveSingle {
                index,
                removed: None,
            },
        )
    }

    pub fn remove_range(author: AuthorId, start: usize, end: usize) -> Self {
        Self::new(
            author,
            ActionKind::RemoveRange {
                start,
                end: Some(end),
                removed: Vec::new(),
            },
        )
    }

    /// Remove everything pending from `start` on.
    pub fn clear_pending(author: AuthorId, start: usize) -> Self {
        Self::new(
            author,
            ActionKind::RemoveRange {
                start,
                end: None,
                removed: Vec::new(),
            },
        )
    }

    pub fn move_single(author: AuthorId, from: usize, to: usize) -> Self {
        Self::new(author, ActionKind::MoveSingle { from, to })
    }

    pub fn move_range(author: AuthorId, start: usize, end: usize, at: usize) -> Self {
        Self::new(
            author,
            ActionKind::MoveRange {
                start,
                end,
                at,
                resolved_at: 0,
            },
        )
    }

    pub fn shuffle(author: AuthorId) -> Self {
        Self::new(author, ActionKind::Shuffle { seeds: None })
    }

    pub fn shuffle_with(author: AuthorId, seeds: Vec<usize>) -> Self {
        Self::new(author, ActionKind::Shuffle { seeds: Some(seeds) })
    }

    pub fn repeat(author: AuthorId) -> Self {
        Self::new(author, ActionKind::Repeat)
    }

    pub fn stop_repeat(author: AuthorId) -> Self {
        Self::new(author, ActionKind::StopRepeat)
    }

    /// Mark this action as a continuation of the one performed right before it.
    pub fn linked(mut self) -> Self {
        self.linked_to_previous = true;
        self
    }

    /// Assigned once the action has been performed.
    pub fn id(&self) -> Option<ActionId> {
        self.id
    }

    pub fn author(&self) -> AuthorId {
        self.author
    }

    pub fn performed_at(&self) -> Option<DateTime<Utc>> {
        self.performed_at
    }

    pub fn performed_at_cursor(&self) -> usize {
        self.performed_at_cursor
    }

    pub fn is_linked_to_previous(&self) -> bool {
        self.linked_to_previous
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// How far the cursor has moved since this action was performed.
    pub fn progress(&self, cursor: usize) -> isize {
        cursor as isize - self.performed_at_cursor as isize
    }
}
