use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::playback::error::{QueueError, Result};
use crate::playback::{Action, ActionId, AuthorId, Queue};
use crate::provider::{Item, ItemId, Resolution, Resolver};

pub type SessionId = u64;

type AdvanceCallback = Box<dyn Fn(&Item) + Send + Sync>;

/// What to do with freshly enqueued items, as part of the same operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    None,
    /// Move the new items to the front of the pending segment.
    MoveToFront,
    /// Shuffle everything pending, new items included.
    Shuffle,
}

/// One playback context: a queue behind a single lock, plus the callbacks
/// fired whenever a new item starts playing.
pub struct Session {
    id: SessionId,
    queue: Mutex<Queue>,
    callbacks: Mutex<Vec<AdvanceCallback>>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Session {
            id,
            queue: Mutex::new(Queue::new()),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn on_advance(&self, callback: impl Fn(&Item) + Send + Sync + 'static) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(callback));
    }

    fn notify(&self, item: &Item) {
        let callbacks = self.callbacks.lock().unwrap_or_else(PoisonError::into_inner);
        for callback in callbacks.iter() {
            callback(item);
        }
    }

    /// Run a closure against the locked queue.
    pub fn read<R>(&self, f: impl FnOnce(&Queue) -> R) -> R {
        f(&self.lock())
    }

    /// Run several queue calls as one critical section.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut Queue) -> Result<R>) -> Result<R> {
        f(&mut self.lock())
    }

    pub fn perform(&self, action: Action) -> Result<ActionId> {
        let name = action.name();
        let result = self.lock().perform(action);
        match &result {
            Ok(id) => debug!(session = self.id, action = name, id = id.0, "performed"),
            Err(e) => debug!(session = self.id, action = name, error = %e, "rejected"),
        }
        result
    }

    /// Add items and apply the follow-up as a linked run.
    pub fn enqueue(
        &self,
        author: AuthorId,
        mut items: Vec<Item>,
        follow_up: FollowUp,
    ) -> Result<Vec<ActionId>> {
        let count = items.len();
        let add = match (items.pop(), items.is_empty()) {
            (Some(item), true) => Action::add_single(author, item),
            (Some(item), false) => {
                items.push(item);
                Action::add_many(author, items)
            }
            (None, _) => return Err(QueueError::invalid("enqueue: no items")),
        };

        let ids = self.transaction(|queue| {
            let mut ids = vec![queue.perform(add)?];
            let end = queue.len() - 1;
            let follow = match follow_up {
                FollowUp::None => None,
                FollowUp::MoveToFront => Some(Action::move_range(author, end + 1 - count, end, 0)),
                FollowUp::Shuffle => Some(Action::shuffle(author)),
            };
            if let Some(action) = follow {
                ids.push(queue.perform(action.linked())?);
            }
            Ok(ids)
        })?;

        debug!(session = self.id, count, ?follow_up, "enqueued");
        Ok(ids)
    }

    /// Undo the last operation. Returns the names of the undone actions, most
    /// recent first.
    pub fn undo_last(&self, undo_linked: bool) -> Result<Vec<&'static str>> {
        let names = self.transaction(|queue| {
            let names: Vec<&'static str> = queue
                .last_operation(undo_linked)
                .iter()
                .rev()
                .map(Action::name)
                .collect();
            queue.undo_last(undo_linked)?;
            Ok(names)
        });
        match &names {
            Ok(names) => debug!(session = self.id, ?names, "undone"),
            Err(e) => debug!(session = self.id, error = %e, "undo refused"),
        }
        names
    }

    /// Track finished: start the next one. With repeat on, the item that just
    /// finished plays again.
    pub fn play_next(&self) -> Result<Option<Item>> {
        let next = {
            let mut queue = self.lock();
            next_locked(&mut queue)?
        };
        self.started(next.as_ref());
        Ok(next)
    }

    /// Force skip `count` items. In repeat mode this replays the current item.
    pub fn skip(&self, count: usize) -> Result<Option<Item>> {
        let next = {
            let mut queue = self.lock();
            if queue.is_repeating() {
                next_locked(&mut queue)?
            } else {
                if count == 0 || count > queue.len() {
                    return Err(QueueError::invalid(format!(
                        "skip: count must be between 1 and {}",
                        queue.len()
                    )));
                }
                for _ in 1..count {
                    queue.advance();
                }
                queue.advance()
            }
        };
        self.started(next.as_ref());
        Ok(next)
    }

    /// Replay the item `count` places before the one playing now.
    pub fn go_back(&self, count: usize) -> Result<Option<Item>> {
        let next = {
            let mut queue = self.lock();
            let earlier = queue.history_len().saturating_sub(1);
            if count == 0 || count > earlier {
                return Err(QueueError::invalid(format!(
                    "go back: {} earlier items available",
                    earlier
                )));
            }
            queue.retreat(count + 1)?;
            queue.advance()
        };
        self.started(next.as_ref());
        Ok(next)
    }

    fn started(&self, item: Option<&Item>) {
        match item {
            Some(item) => {
                info!(session = self.id, item = %item.id, title = %item.title, "now playing");
                self.notify(item);
            }
            None => info!(session = self.id, "queue finished"),
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
        info!(session = self.id, "queue cleared");
    }

    /// Resolve up to `lookahead` upcoming items that still need a playable
    /// source. The resolver runs without holding the queue lock. Returns how
    /// many items were resolved.
    pub async fn resolve_upcoming(&self, resolver: &dyn Resolver, lookahead: usize) -> usize {
        let targets: Vec<Item> = self.read(|queue| {
            queue
                .pending_iter()
                .take(lookahead)
                .filter(|item| item.resolution_pending && !item.broken)
                .cloned()
                .collect()
        });

        let mut resolved = 0;
        for item in targets {
            let outcome = resolver.resolve(&item).await;
            if self.record_resolution(item.id, outcome) {
                resolved += 1;
            }
        }
        resolved
    }

    fn record_resolution(&self, id: ItemId, outcome: anyhow::Result<Resolution>) -> bool {
        let mut queue = self.lock();
        let Some(entry) = queue.item_mut(id) else {
            debug!(session = self.id, item = %id, "item left the queue before it was resolved");
            return false;
        };

        match outcome {
            Ok(resolution) => {
                entry.resolution_pending = false;
                if let Some(title) = resolution.title {
                    entry.title = title;
                }
                if let Some(duration) = resolution.duration_seconds {
                    entry.duration_seconds = duration;
                }
                true
            }
            Err(e) => {
                warn!(session = self.id, item = %id, error = %e, "could not resolve item");
                entry.broken = true;
                false
            }
        }
    }
}

fn next_locked(queue: &mut Queue) -> Result<Option<Item>> {
    if queue.is_repeating() && queue.history_len() > 0 {
        queue.retreat(1)?;
    }
    Ok(queue.advance())
}
