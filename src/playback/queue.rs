use chrono::Utc;
use rand::seq::SliceRandom;

use crate::playback::error::{QueueError, Result};
use crate::playback::{Action, ActionId, ActionKind};
use crate::provider::{Item, ItemId};

/// Play queue with a cursor and an undoable action log.
///
/// `items[..cursor]` is history, `items[cursor..]` is pending. Items only ever
/// change position through [`Queue::perform`] and [`Queue::undo`]; the cursor
/// only moves through [`Queue::advance`], [`Queue::retreat`] and [`Queue::clear`].
#[derive(Debug, Default)]
#[cfg_attr(test, derive(Clone))]
pub struct Queue {
    items: Vec<Item>,
    cursor: usize,
    log: Vec<Action>,
    undone: Vec<Action>,
    next_action_id: u64,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn perform(&mut self, mut action: Action) -> Result<ActionId> {
        self.apply(&mut action.kind)?;

        self.next_action_id += 1;
        let id = ActionId(self.next_action_id);
        action.id = Some(id);
        action.performed_at = Some(Utc::now());
        action.performed_at_cursor = self.cursor;
        self.log.push(action);

        Ok(id)
    }

    fn apply(&mut self, kind: &mut ActionKind) -> Result<()> {
        let base = self.cursor;
        let pending = self.len();

        match kind {
            ActionKind::AddSingle { item, index } => {
                let item = item
                    .take()
                    .ok_or_else(|| QueueError::invalid("add: action carries no item"))?;
                *index = pending;
                self.items.push(item);
            }
            ActionKind::AddMany {
                items,
                start,
                count,
            } => {
                if items.is_empty() {
                    return Err(QueueError::invalid("add: action carries no items"));
                }
                *start = pending;
                *count = items.len();
                self.items.append(items);
            }
            ActionKind::InsertSingle { item, index } => {
                check_at_most(*index, pending, "insert")?;
                let item = item
                    .take()
                    .ok_or_else(|| QueueError::invalid("insert: action carries no item"))?;
                self.items.insert(base + *index, item);
            }
            ActionKind::InsertMany {
                items,
                start,
                count,
            } => {
                check_at_most(*start, pending, "insert")?;
                if items.is_empty() {
                    return Err(QueueError::invalid("insert: action carries no items"));
                }
                *count = items.len();
                insert_all(&mut self.items, base + *start, items.drain(..));
            }
            ActionKind::RemoveSingle { index, removed } => {
                check_below(*index, pending, "remove")?;
                *removed = Some(self.items.remove(base + *index));
            }
            ActionKind::RemoveRange {
                start,
                end,
                removed,
            } => {
                if pending == 0 {
                    return Err(QueueError::invalid("remove: nothing is pending"));
                }
                let last = end.unwrap_or(pending - 1);
                check_below(last, pending, "remove")?;
                if *start > last {
                    return Err(QueueError::invalid(format!(
                        "remove: start {} is after end {}",
                        start, last
                    )));
                }
                *end = Some(last);
                *removed = self.items.drain(base + *start..=base + last).collect();
            }
            ActionKind::MoveSingle { from, to } => {
                check_below(*from, pending, "move")?;
                check_below(*to, pending, "move")?;
                if from == to {
                    return Err(QueueError::invalid("move: source and target are equal"));
                }
                let item = self.items.remove(base + *from);
                self.items.insert(base + *to, item);
            }
            ActionKind::MoveRange {
                start,
                end,
                at,
                resolved_at,
            } => {
                check_below(*end, pending, "move")?;
                check_below(*at, pending, "move")?;
                if *start > *end {
                    return Err(QueueError::invalid(format!(
                        "move: start {} is after end {}",
                        start, end
                    )));
                }
                if *at > *start && *at <= *end {
                    return Err(QueueError::invalid(format!(
                        "move: target {} lies inside the moved range {}..={}",
                        at, start, end
                    )));
                }
                let count = *end - *start + 1;
                *resolved_at = if *at <= *start { *at } else { *at + 1 - count };

                let block: Vec<Item> = self.items.drain(base + *start..=base + *end).collect();
                insert_all(&mut self.items, base + *resolved_at, block);
            }
            ActionKind::Shuffle { seeds } => {
                let seeds = seeds.get_or_insert_with(|| random_permutation(pending));
                check_permutation(seeds, pending)?;

                let old: Vec<Item> = self.items.drain(base..).collect();
                let mut slots: Vec<Option<Item>> = vec![None; pending];
                for (item, &seed) in old.into_iter().zip(seeds.iter()) {
                    slots[seed] = Some(item);
                }
                self.items.extend(slots.into_iter().flatten());
            }
            ActionKind::Repeat | ActionKind::StopRepeat => {}
        }

        Ok(())
    }

    /// Undo a logged action, and with `undo_linked` the run of actions it is
    /// linked to. The action (or its run) must be the tail of the log.
    ///
    /// The whole run is reverted on a scratch copy first, so either every
    /// action in it is undone or the queue is left untouched.
    pub fn undo(&mut self, id: ActionId, undo_linked: bool) -> Result<()> {
        self.undo_run(id, undo_linked).map(|_| ())
    }

    /// Undo the most recent action (and its linked run). Returns the ids that
    /// were undone, most recent first; empty when the log is empty.
    pub fn undo_last(&mut self, undo_linked: bool) -> Result<Vec<ActionId>> {
        match self.log.last().and_then(Action::id) {
            Some(id) => self.undo_run(id, undo_linked),
            None => Ok(Vec::new()),
        }
    }

    fn undo_run(&mut self, id: ActionId, undo_linked: bool) -> Result<Vec<ActionId>> {
        let target = self
            .log
            .iter()
            .position(|a| a.id == Some(id))
            .ok_or_else(|| QueueError::invalid(format!("{} is not in the log", id)))?;
        let (first, last) = if undo_linked {
            (run_start(&self.log, target), run_end(&self.log, target))
        } else {
            (target, target)
        };
        // Later actions were recorded against the layout this one produced.
        if last + 1 != self.log.len() {
            return Err(QueueError::invalid(format!(
                "{} is followed by later actions; undo those first",
                id
            )));
        }

        let mut scratch = self.items.clone();
        let mut staged: Vec<Action> = self.log[first..=last].to_vec();
        for action in staged.iter_mut().rev() {
            revert(&mut scratch, self.cursor, action)?;
        }

        self.items = scratch;
        self.log.drain(first..=last);
        staged.reverse();
        let ids = staged.iter().filter_map(Action::id).collect();
        self.undone.extend(staged);

        Ok(ids)
    }

    /// Pop the next pending item. The item stays in history.
    pub fn advance(&mut self) -> Option<Item> {
        let item = self.items.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(item)
    }

    pub fn retreat(&mut self, by: usize) -> Result<()> {
        if by > self.cursor {
            return Err(QueueError::invalid(format!(
                "retreat: cannot go back {} with {} items of history",
                by, self.cursor
            )));
        }
        self.cursor -= by;
        Ok(())
    }

    /// Drop items, history, log and undone actions in one step.
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = 0;
        self.log.clear();
        self.undone.clear();
    }

    pub fn is_repeating(&self) -> bool {
        self.log
            .iter()
            .rev()
            .find_map(|a| match a.kind {
                ActionKind::Repeat => Some(true),
                ActionKind::StopRepeat => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// The log tail a user would see as "the last operation".
    pub fn last_operation(&self, undo_linked: bool) -> &[Action] {
        let Some(last) = self.log.len().checked_sub(1) else {
            return &[];
        };
        let first = if undo_linked {
            run_start(&self.log, last)
        } else {
            last
        };
        &self.log[first..]
    }

    /// Number of pending items.
    pub fn len(&self) -> usize {
        self.items.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn history_len(&self) -> usize {
        self.cursor
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn pending_iter(&self) -> impl DoubleEndedIterator<Item = &Item> + '_ {
        self.items[self.cursor..].iter()
    }

    /// History, most recently played first.
    pub fn history_iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items[..self.cursor].iter().rev()
    }

    pub fn peek(&self) -> Option<&Item> {
        self.get(0)
    }

    /// Pending item at a relative index.
    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(self.cursor + index)
    }

    pub fn now_playing(&self) -> Option<&Item> {
        self.cursor.checked_sub(1).and_then(|i| self.items.get(i))
    }

    /// Seconds left in the pending segment.
    pub fn total_duration(&self) -> u64 {
        self.pending_iter()
            .map(|item| u64::from(item.duration_seconds))
            .sum()
    }

    pub fn find(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// In-place access for flag updates. Positions stay with the queue.
    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn log(&self) -> &[Action] {
        &self.log
    }

    pub fn undone(&self) -> &[Action] {
        &self.undone
    }
}

/// Reverse one action against `seq`, given the current cursor.
fn revert(seq: &mut Vec<Item>, cursor: usize, action: &mut Action) -> Result<()> {
    let base = action.performed_at_cursor;
    let illegal = QueueError::IllegalUndo {
        action: action.id.unwrap_or(ActionId(0)),
        name: action.kind.name(),
    };

    if let Some(min) = action.kind.min_touched() {
        if action.progress(cursor) > min as isize {
            return Err(illegal);
        }
    }

    match &mut action.kind {
        ActionKind::AddSingle { item, index } | ActionKind::InsertSingle { item, index } => {
            let at = base + *index;
            if at >= seq.len() {
                return Err(illegal);
            }
            *item = Some(seq.remove(at));
        }
        ActionKind::AddMany {
            items,
            start,
            count,
        }
        | ActionKind::InsertMany {
            items,
            start,
            count,
        } => {
            let from = base + *start;
            if from + *count > seq.len() {
                return Err(illegal);
            }
            *items = seq.drain(from..from + *count).collect();
        }
        ActionKind::RemoveSingle { index, removed } => {
            let at = base + *index;
            if at > seq.len() {
                return Err(illegal);
            }
            let item = removed
                .take()
                .ok_or_else(|| QueueError::invalid("remove: no removed item recorded"))?;
            seq.insert(at, item);
        }
        ActionKind::RemoveRange { start, removed, .. } => {
            let at = base + *start;
            if at > seq.len() {
                return Err(illegal);
            }
            insert_all(seq, at, removed.drain(..));
        }
        ActionKind::MoveSingle { from, to } => {
            if base + (*from).max(*to) >= seq.len() {
                return Err(illegal);
            }
            let item = seq.remove(base + *to);
            seq.insert(base + *from, item);
        }
        ActionKind::MoveRange {
            start,
            end,
            resolved_at,
            ..
        } => {
            let count = *end - *start + 1;
            if base + (*start).max(*resolved_at) + count > seq.len() {
                return Err(illegal);
            }
            let from = base + *resolved_at;
            let block: Vec<Item> = seq.drain(from..from + count).collect();
            insert_all(seq, base + *start, block);
        }
        ActionKind::Shuffle { seeds } => {
            let seeds = seeds
                .as_deref()
                .ok_or_else(|| QueueError::invalid("shuffle: no permutation recorded"))?;
            let n = seeds.len();
            if base + n > seq.len() {
                return Err(illegal);
            }

            let mut origin = vec![0; n];
            for (old, &new) in seeds.iter().enumerate() {
                origin[new] = old;
            }

            // Slots already played are skipped; what is left goes back in its
            // pre-shuffle order.
            let skip = cursor.saturating_sub(base).min(n);
            let region = base + skip..base + n;
            let mut remaining: Vec<(usize, Item)> = seq
                .drain(region.clone())
                .enumerate()
                .map(|(offset, item)| (origin[skip + offset], item))
                .collect();
            remaining.sort_by_key(|(old, _)| *old);
            insert_all(seq, region.start, remaining.into_iter().map(|(_, item)| item));
        }
        ActionKind::Repeat | ActionKind::StopRepeat => {}
    }

    Ok(())
}

/// Index of the first action in the linked run ending at `last`.
fn run_start(log: &[Action], last: usize) -> usize {
    let mut first = last;
    while first > 0 && log[first].linked_to_previous {
        first -= 1;
    }
    first
}

/// Index of the last action in the linked run containing `at`.
fn run_end(log: &[Action], at: usize) -> usize {
    let mut last = at;
    while last + 1 < log.len() && log[last + 1].linked_to_previous {
        last += 1;
    }
    last
}

fn insert_all(seq: &mut Vec<Item>, at: usize, items: impl IntoIterator<Item = Item>) {
    let tail = seq.split_off(at);
    seq.extend(items);
    seq.extend(tail);
}

fn random_permutation(len: usize) -> Vec<usize> {
    let mut seeds: Vec<usize> = (0..len).collect();
    seeds.shuffle(&mut rand::thread_rng());
    seeds
}

fn check_permutation(seeds: &[usize], len: usize) -> Result<()> {
    if seeds.len() != len {
        return Err(QueueError::invalid(format!(
            "shuffle: {} seeds for {} pending items",
            seeds.len(),
            len
        )));
    }
    let mut seen = vec![false; len];
    for &seed in seeds {
        if seed >= len || std::mem::replace(&mut seen[seed], true) {
            return Err(QueueError::invalid("shuffle: seeds are not a permutation"));
        }
    }
    Ok(())
}

fn check_below(index: usize, len: usize, op: &str) -> Result<()> {
    if index >= len {
        return Err(QueueError::invalid(format!(
            "{}: index {} out of range for {} pending items",
            op, index, len
        )));
    }
    Ok(())
}

fn check_at_most(index: usize, len: usize, op: &str) -> Result<()> {
    if index > len {
        return Err(QueueError::invalid(format!(
            "{}: index {} out of range for {} pending items",
            op, index, len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::AuthorId;
    use crate::provider::ProviderKind;
    use proptest::prelude::*;

    const ALICE: AuthorId = AuthorId(1);

    fn item(title: &str) -> Item {
        Item::new(title, 180, ProviderKind::Youtube)
    }

    fn queue_of(titles: &[&str]) -> Queue {
        let mut queue = Queue::new();
        for title in titles {
            queue.items.push(item(title));
        }
        queue
    }

    fn titles(queue: &Queue) -> Vec<String> {
        queue.items.iter().map(|i| i.title.clone()).collect()
    }

    fn pending(queue: &Queue) -> Vec<String> {
        queue.pending_iter().map(|i| i.title.clone()).collect()
    }

    #[test]
    fn test_add_then_undo_restores_queue() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.advance();
        let before = queue.items.clone();

        let id = queue.perform(Action::add_single(ALICE, item("x"))).unwrap();
        assert_eq!(pending(&queue), vec!["b", "c", "x"]);
        assert_eq!(
            queue.log()[0].kind(),
            &ActionKind::AddSingle {
                item: None,
                index: 2
            }
        );

        queue.undo(id, true).unwrap();
        assert_eq!(queue.items, before);
        assert_eq!(queue.cursor(), 1);
        assert!(queue.log().is_empty());
        assert_eq!(queue.undone().len(), 1);
    }

    #[test]
    fn test_undo_after_progress_until_index_is_consumed() {
        let mut queue = queue_of(&["a", "b", "c", "d", "e"]);
        let id = queue.perform(Action::add_single(ALICE, item("x"))).unwrap();

        queue.advance();
        assert!(queue.clone().undo(id, true).is_ok());

        for _ in 0..5 {
            queue.advance();
        }
        let before = queue.items.clone();
        let err = queue.undo(id, true).unwrap_err();
        assert!(matches!(err, QueueError::IllegalUndo { .. }));
        assert_eq!(queue.items, before);
        assert_eq!(queue.log().len(), 1);
    }

    #[test]
    fn test_undo_fails_when_structural_edits_consumed_the_index() {
        let mut queue = queue_of(&["a", "b", "c", "d", "e"]);
        let add = queue.perform(Action::add_single(ALICE, item("x"))).unwrap();
        queue.advance();
        queue.perform(Action::remove_range(ALICE, 0, 4)).unwrap();
        assert!(queue.is_empty());

        let err = queue.undo(add, false).unwrap_err();
        assert!(matches!(err, QueueError::IllegalUndo { .. }));
        assert_eq!(titles(&queue), vec!["a"]);
    }

    #[test]
    fn test_insert_scenario() {
        let mut queue = queue_of(&["v1", "v2", "v3"]);
        assert_eq!(queue.advance().unwrap().title, "v1");
        assert_eq!(queue.cursor(), 1);

        let id = queue
            .perform(Action::insert_single(ALICE, 0, item("v4")))
            .unwrap();
        assert_eq!(titles(&queue), vec!["v1", "v4", "v2", "v3"]);

        queue.undo(id, true).unwrap();
        assert_eq!(titles(&queue), vec!["v1", "v2", "v3"]);
        assert_eq!(queue.cursor(), 1);
    }

    #[test]
    fn test_insert_many_and_undo() {
        let mut queue = queue_of(&["a", "b", "c"]);
        let id = queue
            .perform(Action::insert_many(ALICE, 1, vec![item("x"), item("y")]))
            .unwrap();
        assert_eq!(titles(&queue), vec!["a", "x", "y", "b", "c"]);

        queue.advance();
        queue.undo(id, true).unwrap();
        assert_eq!(titles(&queue), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_add_many_records_range() {
        let mut queue = queue_of(&["a"]);
        queue
            .perform(Action::add_many(ALICE, vec![item("p1"), item("p2")]))
            .unwrap();
        assert_eq!(
            queue.log()[0].kind(),
            &ActionKind::AddMany {
                items: vec![],
                start: 1,
                count: 2
            }
        );
        queue.undo_last(true).unwrap();
        assert_eq!(titles(&queue), vec!["a"]);
    }

    #[test]
    fn test_remove_single_and_undo_after_progress() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        let id = queue.perform(Action::remove_single(ALICE, 2)).unwrap();
        assert_eq!(titles(&queue), vec!["a", "b", "d"]);

        queue.advance();
        queue.advance();
        queue.undo(id, true).unwrap();
        assert_eq!(titles(&queue), vec!["a", "b", "c", "d"]);
        assert_eq!(queue.peek().unwrap().title, "c");
    }

    #[test]
    fn test_clear_pending_and_undo() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        queue.advance();
        let id = queue.perform(Action::clear_pending(ALICE, 0)).unwrap();
        assert!(queue.is_empty());
        assert!(matches!(
            queue.log()[0].kind(),
            ActionKind::RemoveRange {
                start: 0,
                end: Some(2),
                ..
            }
        ));

        queue.undo(id, true).unwrap();
        assert_eq!(pending(&queue), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_move_single_round_trip() {
        for (from, to) in [(0, 3), (3, 0), (1, 2), (2, 1)] {
            let mut queue = queue_of(&["a", "b", "c", "d"]);
            let before = titles(&queue);
            let id = queue.perform(Action::move_single(ALICE, from, to)).unwrap();
            assert_eq!(queue.get(to).unwrap().title, before[from]);
            queue.undo(id, true).unwrap();
            assert_eq!(titles(&queue), before);
        }
    }

    #[test]
    fn test_move_single_rejects_same_index() {
        let mut queue = queue_of(&["a", "b"]);
        let err = queue.perform(Action::move_single(ALICE, 1, 1)).unwrap_err();
        assert!(matches!(err, QueueError::InvalidArgument(_)));
        assert!(queue.log().is_empty());
    }

    #[test]
    fn test_move_range_forward_and_back() {
        let mut queue = queue_of(&["a", "b", "c", "d", "e", "f"]);
        let id = queue.perform(Action::move_range(ALICE, 1, 2, 4)).unwrap();
        assert_eq!(titles(&queue), vec!["a", "d", "e", "b", "c", "f"]);
        queue.undo(id, true).unwrap();
        assert_eq!(titles(&queue), vec!["a", "b", "c", "d", "e", "f"]);

        let id = queue.perform(Action::move_range(ALICE, 3, 5, 0)).unwrap();
        assert_eq!(titles(&queue), vec!["d", "e", "f", "a", "b", "c"]);
        queue.undo(id, true).unwrap();
        assert_eq!(titles(&queue), vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_move_range_rejects_target_inside_range() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        let err = queue.perform(Action::move_range(ALICE, 0, 2, 1)).unwrap_err();
        assert!(matches!(err, QueueError::InvalidArgument(_)));
        assert_eq!(titles(&queue), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_shuffle_with_bad_seeds_is_rejected() {
        let mut queue = queue_of(&["a", "b", "c"]);
        for seeds in [vec![0, 1], vec![0, 0, 1], vec![0, 1, 3]] {
            let err = queue.perform(Action::shuffle_with(ALICE, seeds)).unwrap_err();
            assert!(matches!(err, QueueError::InvalidArgument(_)));
        }
        assert_eq!(titles(&queue), vec!["a", "b", "c"]);
        assert!(queue.log().is_empty());
    }

    #[test]
    fn test_shuffle_undo_after_progress_keeps_history() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        queue.perform(Action::shuffle_with(ALICE, vec![3, 2, 1, 0])).unwrap();
        assert_eq!(titles(&queue), vec!["d", "c", "b", "a"]);

        queue.advance();
        queue.undo_last(true).unwrap();
        assert_eq!(titles(&queue), vec!["d", "a", "b", "c"]);
        assert_eq!(queue.now_playing().unwrap().title, "d");
    }

    #[test]
    fn test_random_shuffle_is_a_permutation() {
        let mut queue = queue_of(&["a", "b", "c", "d", "e"]);
        queue.perform(Action::shuffle(ALICE)).unwrap();
        let mut after = titles(&queue);
        after.sort();
        assert_eq!(after, vec!["a", "b", "c", "d", "e"]);
        queue.undo_last(true).unwrap();
        assert_eq!(titles(&queue), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_linked_run_is_undone_together() {
        let mut queue = queue_of(&["a", "b"]);
        queue.perform(Action::add_single(ALICE, item("x"))).unwrap();
        let b = queue
            .perform(Action::move_range(ALICE, 2, 2, 0).linked())
            .unwrap();
        assert_eq!(titles(&queue), vec!["x", "a", "b"]);
        assert_eq!(queue.last_operation(true).len(), 2);

        queue.undo(b, true).unwrap();
        assert_eq!(titles(&queue), vec!["a", "b"]);
        assert!(queue.log().is_empty());
        assert_eq!(queue.undone().len(), 2);
    }

    #[test]
    fn test_linked_run_single_opt_out() {
        let mut queue = queue_of(&["a", "b"]);
        queue.perform(Action::add_single(ALICE, item("x"))).unwrap();
        let b = queue
            .perform(Action::move_range(ALICE, 2, 2, 0).linked())
            .unwrap();

        queue.undo(b, false).unwrap();
        assert_eq!(titles(&queue), vec!["a", "b", "x"]);
        assert_eq!(queue.log().len(), 1);
    }

    #[test]
    fn test_linked_run_is_atomic_when_one_member_is_illegal() {
        let mut queue = queue_of(&["a", "b"]);
        queue.perform(Action::insert_single(ALICE, 0, item("x"))).unwrap();
        queue.perform(Action::add_single(ALICE, item("y")).linked()).unwrap();
        queue.advance();
        let before = titles(&queue);

        let err = queue.undo_last(true).unwrap_err();
        assert!(matches!(err, QueueError::IllegalUndo { name: "InsertSingle", .. }));
        assert_eq!(titles(&queue), before);
        assert_eq!(queue.log().len(), 2);
    }

    #[test]
    fn test_undo_by_id_of_run_head_covers_whole_run() {
        let mut queue = queue_of(&["a", "b"]);
        let add = queue.perform(Action::add_single(ALICE, item("x"))).unwrap();
        queue
            .perform(Action::move_range(ALICE, 2, 2, 0).linked())
            .unwrap();
        assert_eq!(titles(&queue), vec!["x", "a", "b"]);

        let err = queue.undo(add, false).unwrap_err();
        assert!(matches!(err, QueueError::InvalidArgument(_)));
        assert_eq!(titles(&queue), vec!["x", "a", "b"]);
        assert_eq!(queue.log().len(), 2);

        queue.undo(add, true).unwrap();
        assert_eq!(titles(&queue), vec!["a", "b"]);
        assert!(queue.log().is_empty());
    }

    #[test]
    fn test_undo_rejects_action_with_later_actions() {
        let mut queue = queue_of(&["a", "b"]);
        let first = queue.perform(Action::add_single(ALICE, item("x"))).unwrap();
        queue.perform(Action::remove_single(ALICE, 0)).unwrap();
        let before = titles(&queue);

        let err = queue.undo(first, true).unwrap_err();
        assert!(matches!(err, QueueError::InvalidArgument(_)));
        assert_eq!(titles(&queue), before);

        queue.undo_last(true).unwrap();
        queue.undo(first, true).unwrap();
        assert_eq!(titles(&queue), vec!["a", "b"]);
    }

    #[test]
    fn test_undo_unknown_action() {
        let mut queue = queue_of(&["a"]);
        let err = queue.undo(ActionId(99), true).unwrap_err();
        assert!(matches!(err, QueueError::InvalidArgument(_)));
        assert!(queue.undo_last(true).unwrap().is_empty());
    }

    #[test]
    fn test_repeat_is_derived_from_log() {
        let mut queue = queue_of(&["a"]);
        assert!(!queue.is_repeating());
        queue.perform(Action::repeat(ALICE)).unwrap();
        queue.perform(Action::add_single(ALICE, item("b"))).unwrap();
        let stop = queue.perform(Action::stop_repeat(ALICE)).unwrap();
        let add = queue.perform(Action::add_single(ALICE, item("c"))).unwrap();
        assert!(!queue.is_repeating());

        queue.undo(add, false).unwrap();
        queue.undo(stop, false).unwrap();
        assert!(queue.is_repeating());
    }

    #[test]
    fn test_retreat_then_undo_succeeds() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.advance();
        queue.advance();
        let id = queue.perform(Action::remove_single(ALICE, 0)).unwrap();
        assert_eq!(titles(&queue), vec!["a", "b"]);

        queue.retreat(2).unwrap();
        queue.undo(id, true).unwrap();
        assert_eq!(titles(&queue), vec!["a", "b", "c"]);
        assert_eq!(queue.cursor(), 0);
    }

    #[test]
    fn test_advance_and_retreat_bounds() {
        let mut queue = queue_of(&["a"]);
        assert!(queue.retreat(1).is_err());
        assert_eq!(queue.advance().unwrap().title, "a");
        assert!(queue.advance().is_none());
        assert_eq!(queue.cursor(), 1);
        assert_eq!(queue.history_iter().next().unwrap().title, "a");
        queue.retreat(1).unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut queue = queue_of(&["a", "b"]);
        queue.advance();
        queue.perform(Action::repeat(ALICE)).unwrap();
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.cursor(), 0);
        assert!(queue.log().is_empty());
        assert!(!queue.is_repeating());
    }

    #[test]
    fn test_views() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.advance();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.history_len(), 1);
        assert_eq!(queue.total_duration(), 360);
        assert_eq!(queue.now_playing().unwrap().title, "a");

        let id = queue.get(1).unwrap().id;
        queue.item_mut(id).unwrap().broken = true;
        assert!(queue.find(id).unwrap().broken);
    }

    fn permutation(len: usize) -> impl Strategy<Value = Vec<usize>> {
        Just((0..len).collect::<Vec<usize>>()).prop_shuffle()
    }

    proptest! {
        #[test]
        fn prop_shuffle_inverts(seeds in (1usize..12).prop_flat_map(permutation)) {
            let names: Vec<String> = (0..seeds.len()).map(|i| format!("t{}", i)).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let mut queue = queue_of(&refs);
            let before = titles(&queue);

            queue.perform(Action::shuffle_with(ALICE, seeds)).unwrap();
            queue.undo_last(true).unwrap();
            prop_assert_eq!(titles(&queue), before);
        }

        #[test]
        fn prop_move_range_undo_under_progress(
            len in 2usize..10,
            a in 0usize..10,
            b in 0usize..10,
            at in 0usize..10,
            played in 0usize..10,
        ) {
            let start = a.min(b) % len;
            let end = (start + (a.max(b) - a.min(b))).min(len - 1);
            let at = at % len;
            prop_assume!(at <= start || at > end);
            let played = played.min(len);

            let names: Vec<String> = (0..len).map(|i| format!("t{}", i)).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let mut queue = queue_of(&refs);
            let before = titles(&queue);

            queue.perform(Action::move_range(ALICE, start, end, at)).unwrap();
            let after_move = titles(&queue);
            let resolved = match queue.log()[0].kind() {
                ActionKind::MoveRange { resolved_at, .. } => *resolved_at,
                _ => unreachable!(),
            };
            for _ in 0..played {
                queue.advance();
            }

            match queue.undo_last(true) {
                Ok(_) => {
                    prop_assert!(played <= start.min(resolved));
                    prop_assert_eq!(titles(&queue), before);
                }
                Err(QueueError::IllegalUndo { .. }) => {
                    prop_assert!(played > start.min(resolved));
                    prop_assert_eq!(titles(&queue), after_move);
                }
                Err(e) => prop_assert!(false, "unexpected error {}", e),
            }
        }
    }
}
