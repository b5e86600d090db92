use anyhow::Result;

use crate::playback::Session;
use crate::provider::{Item, Resolver};

fn now_playing(item: Option<Item>) -> String {
    match item {
        Some(item) if item.broken => format!("Now playing `{}` (unavailable)", item.title),
        Some(item) => format!("Now playing `{}`", item.title),
        None => "Reached the end of the queue".to_string(),
    }
}

pub fn next(session: &Session) -> Result<String> {
    Ok(now_playing(session.play_next()?))
}

pub fn skip(session: &Session, count: usize) -> Result<String> {
    Ok(now_playing(session.skip(count)?))
}

pub fn go_back(session: &Session, count: usize) -> Result<String> {
    Ok(now_playing(session.go_back(count)?))
}

pub async fn resolve(session: &Session, resolver: &dyn Resolver, lookahead: usize) -> Result<String> {
    let resolved = session.resolve_upcoming(resolver, lookahead).await;
    Ok(match resolved {
        0 => "Nothing to resolve".to_string(),
        1 => "Resolved 1 upcoming track".to_string(),
        n => format!("Resolved {} upcoming tracks", n),
    })
}
