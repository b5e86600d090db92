use anyhow::{bail, Context, Result};

use crate::cli::args::TrackArgs;
use crate::cli::commands::utils::to_index;
use crate::playback::{Action, AuthorId, FollowUp, Queue, Session};
use crate::provider::{Item, ProviderKind};

pub fn build_item(track: TrackArgs, default_provider: ProviderKind) -> Item {
    let item = Item::new(
        track.title.join(" "),
        track.duration,
        track.provider.unwrap_or(default_provider),
    );
    match track.start {
        Some(start) => item.starting_at(start),
        None => item,
    }
}

pub fn play(session: &Session, author: AuthorId, item: Item) -> Result<String> {
    let title = item.title.clone();
    session.enqueue(author, vec![item], FollowUp::None)?;
    let position = session.read(Queue::len);
    Ok(format!("Queued `{}` at position {}", title, position))
}

pub fn play_top(session: &Session, author: AuthorId, item: Item) -> Result<String> {
    let title = item.title.clone();
    session.enqueue(author, vec![item], FollowUp::MoveToFront)?;
    Ok(format!("Queued `{}` at the top of the queue", title))
}

pub fn play_shuffle(session: &Session, author: AuthorId, item: Item) -> Result<String> {
    let title = item.title.clone();
    session.enqueue(author, vec![item], FollowUp::Shuffle)?;
    Ok(format!("Queued `{}` and shuffled the queue", title))
}

pub fn play_skip(session: &Session, author: AuthorId, item: Item) -> Result<String> {
    session.enqueue(author, vec![item], FollowUp::MoveToFront)?;
    let now = session
        .skip(1)?
        .context("Nothing left to play after queueing")?;
    Ok(format!("Now playing `{}`", now.title))
}

pub fn playlist(
    session: &Session,
    author: AuthorId,
    name: &str,
    count: usize,
    duration: u32,
    provider: ProviderKind,
) -> Result<String> {
    if count == 0 {
        bail!("A playlist needs at least one track");
    }
    let items = (1..=count)
        .map(|n| Item::new(format!("{} #{}", name, n), duration, provider).playlist_member())
        .collect();
    session.enqueue(author, items, FollowUp::None)?;
    Ok(format!("Queued {} tracks from `{}`", count, name))
}

pub fn insert(session: &Session, author: AuthorId, position: usize, item: Item) -> Result<String> {
    let len = session.read(Queue::len);
    if position < 1 || position > len + 1 {
        bail!("`position` must be between 1 and {}", len + 1);
    }
    let title = item.title.clone();
    session.perform(Action::insert_single(author, position - 1, item))?;
    Ok(format!("Inserted `{}` at position {}", title, position))
}

pub fn remove(session: &Session, author: AuthorId, position: usize) -> Result<String> {
    let index = to_index(position, session.read(Queue::len), "position")?;
    let title = session.transaction(|queue| {
        let title = queue.get(index).map(|item| item.title.clone());
        queue.perform(Action::remove_single(author, index))?;
        Ok(title)
    })?;
    Ok(format!(
        "Removed `{}` from position {}",
        title.unwrap_or_default(),
        position
    ))
}

pub fn clear(
    session: &Session,
    author: AuthorId,
    start: Option<usize>,
    end: Option<usize>,
) -> Result<String> {
    let len = session.read(Queue::len);
    if len == 0 {
        bail!("The queue is already empty");
    }
    let start = start.unwrap_or(1);
    if start < 1 {
        bail!("`start` cannot be smaller than 1");
    }
    let last = end.unwrap_or(len);
    if start > last {
        bail!("`start` cannot be bigger than `end`");
    }
    if last > len {
        bail!("`end` cannot be bigger than the queue size ({})", len);
    }

    let action = match end {
        Some(end) => Action::remove_range(author, start - 1, end - 1),
        None => Action::clear_pending(author, start - 1),
    };
    session.perform(action)?;

    Ok(if start == 1 && last == len {
        "Cleared the queue".to_string()
    } else if last == len {
        format!("Cleared the queue from position {}", start)
    } else {
        format!("Cleared the queue from position {} to {}", start, last)
    })
}

pub fn move_item(session: &Session, author: AuthorId, from: usize, to: usize) -> Result<String> {
    let len = session.read(Queue::len);
    let source = to_index(from, len, "from")?;
    let target = to_index(to, len, "to")?;
    if source == target {
        bail!("The track is already at position {}", from);
    }
    session.perform(Action::move_single(author, source, target))?;
    Ok(format!("Moved the track at position {} to position {}", from, to))
}

pub fn move_range(
    session: &Session,
    author: AuthorId,
    start: usize,
    end: usize,
    at: usize,
) -> Result<String> {
    let len = session.read(Queue::len);
    let first = to_index(start, len, "start")?;
    let last = to_index(end, len, "end")?;
    let target = to_index(at, len, "at")?;
    if first > last {
        bail!("`start` cannot be bigger than `end`");
    }
    if target > first && target <= last {
        bail!("`at` cannot lie inside the moved range");
    }
    session.perform(Action::move_range(author, first, last, target))?;
    Ok(format!(
        "Moved positions {} to {} to position {}",
        start, end, at
    ))
}

pub fn shuffle(session: &Session, author: AuthorId) -> Result<String> {
    if session.read(Queue::len) <= 1 {
        bail!("The queue must have more than one item to be shuffled");
    }
    session.perform(Action::shuffle(author))?;
    Ok("Shuffled the queue".to_string())
}

pub fn repeat(session: &Session, author: AuthorId) -> Result<String> {
    let now_repeating = session.transaction(|queue| {
        let repeating = queue.is_repeating();
        let action = if repeating {
            Action::stop_repeat(author)
        } else {
            Action::repeat(author)
        };
        queue.perform(action)?;
        Ok(!repeating)
    })?;

    Ok(if now_repeating {
        "Playback will now repeat".to_string()
    } else {
        "Playback will no longer repeat".to_string()
    })
}

pub fn undo(session: &Session, undo_linked: bool) -> Result<String> {
    let names = session.undo_last(undo_linked)?;
    if names.is_empty() {
        return Ok("Nothing to undo".to_string());
    }
    let names: Vec<String> = names.iter().map(|n| format!("`{}`", n)).collect();
    Ok(format!("Undid {}", names.join(", ")))
}
