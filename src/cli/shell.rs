use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::cli::args::{Line, LineCommand};
use crate::cli::commands::{edit, playback, view};
use crate::playback::{AuthorId, Queue, Registry, Session, SessionId};
use crate::provider::{PassthroughResolver, Resolver};
use crate::state::{Config, JournalEntry, Outcome};

/// Executes command lines against a registry of sessions, on behalf of the
/// current user in the current session.
pub struct Shell {
    registry: Registry,
    config: Config,
    journal: Option<PathBuf>,
    resolver: Box<dyn Resolver>,
    session: SessionId,
    author: AuthorId,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        Shell {
            registry: Registry::new(),
            journal: config.journal.clone(),
            config,
            resolver: Box::new(PassthroughResolver),
            session: 1,
            author: AuthorId(1),
        }
    }

    /// Override the journal path from the config.
    pub fn with_journal(mut self, journal: Option<PathBuf>) -> Self {
        if journal.is_some() {
            self.journal = journal;
        }
        self
    }

    pub fn with_resolver(mut self, resolver: Box<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn current(&self) -> Arc<Session> {
        self.registry.get_or_create(self.session)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run one line. Blank lines and `#` comments produce no output.
    pub async fn execute(&mut self, line: &str) -> Result<Option<String>> {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            return Ok(None);
        }

        let result = match Line::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => self.dispatch(parsed.command).await,
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) =>
            {
                Ok(e.render().to_string())
            }
            Err(e) => Err(anyhow::anyhow!(e.render().to_string().trim_end().to_string())),
        };

        self.record(line, &result);
        result.map(Some)
    }

    async fn dispatch(&mut self, command: LineCommand) -> Result<String> {
        debug!(session = self.session, author = self.author.0, ?command, "executing");
        let provider = self.config.default_provider;
        let limit = self.config.display_limit;
        let author = self.author;

        let session = self.current();
        match command {
            LineCommand::User { id } => {
                self.author = AuthorId(id);
                Ok(format!("Acting as user {}", id))
            }
            LineCommand::Session { id } => {
                self.session = id;
                self.registry.get_or_create(id);
                Ok(format!("Switched to session {}", id))
            }
            LineCommand::Play(track) => edit::play(&session, author, edit::build_item(track, provider)),
            LineCommand::Playtop(track) => {
                edit::play_top(&session, author, edit::build_item(track, provider))
            }
            LineCommand::Playshuffle(track) => {
                edit::play_shuffle(&session, author, edit::build_item(track, provider))
            }
            LineCommand::Playskip(track) => {
                edit::play_skip(&session, author, edit::build_item(track, provider))
            }
            LineCommand::Playlist {
                provider: kind,
                duration,
                name,
                count,
            } => edit::playlist(
                &session,
                author,
                &name,
                count,
                duration,
                kind.unwrap_or(provider),
            ),
            LineCommand::Insert { position, track } => {
                edit::insert(&session, author, position, edit::build_item(track, provider))
            }
            LineCommand::Remove { position } => edit::remove(&session, author, position),
            LineCommand::Clear { start, end } => edit::clear(&session, author, start, end),
            LineCommand::Move { from, to } => edit::move_item(&session, author, from, to),
            LineCommand::Moverange { start, end, at } => {
                edit::move_range(&session, author, start, end, at)
            }
            LineCommand::Shuffle => edit::shuffle(&session, author),
            LineCommand::Repeat => edit::repeat(&session, author),
            LineCommand::Undo { single } => edit::undo(&session, self.config.undo_linked && !single),
            LineCommand::Next => playback::next(&session),
            LineCommand::Skip { count } => playback::skip(&session, count),
            LineCommand::Goback { count } => playback::go_back(&session, count),
            LineCommand::Resolve => {
                playback::resolve(&session, self.resolver.as_ref(), self.config.resolve_lookahead)
                    .await
            }
            LineCommand::Queue => Ok(session.read(|q| view::queue(q, limit))),
            LineCommand::History => Ok(session.read(|q| view::history(q, limit))),
            LineCommand::Actions => Ok(session.read(|q| view::actions(q, limit, chrono::Utc::now()))),
            LineCommand::Status => Ok(view::status(&session)),
            LineCommand::Dump { path } => view::dump(&session, path.as_deref()),
        }
    }

    fn record(&self, line: &str, result: &Result<String>) {
        let Some(path) = &self.journal else {
            return;
        };

        let (cursor, pending) = self
            .registry
            .get(self.session)
            .map(|s| s.read(|q| (q.cursor(), q.len())))
            .unwrap_or_default();
        let entry = match result {
            Ok(_) => JournalEntry::new(self.session, line, Outcome::Ok),
            Err(e) => JournalEntry::new(self.session, line, Outcome::Error).with_message(e.to_string()),
        }
        .with_position(cursor, pending);

        if let Err(e) = JournalEntry::append(path, &entry) {
            warn!(error = %e, "could not write journal entry");
        }
    }

    /// Execute every line from `reader`, handing each output or error message
    /// to `emit`. Returns the number of lines that failed.
    pub async fn run_lines<R>(&mut self, reader: R, mut emit: impl FnMut(&str)) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut failures = 0;
        while let Some(line) = lines.next_line().await.context("Failed to read input")? {
            match self.execute(&line).await {
                Ok(Some(output)) => emit(&output),
                Ok(None) => {}
                Err(e) => {
                    failures += 1;
                    emit(&format!("error: {}", e));
                }
            }
        }
        Ok(failures)
    }

    pub fn pending_len(&self) -> usize {
        self.current().read(Queue::len)
    }
}

/// Cut a `#` comment: one that opens the line, or a standalone `#` word.
/// A `#` inside a word such as `#9` belongs to a title.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let cut = line.match_indices('#').map(|(i, _)| i).find(|&i| {
        let opens_word = i == 0 || bytes[i - 1].is_ascii_whitespace();
        let closes_word = bytes.get(i + 1).map_or(true, u8::is_ascii_whitespace);
        line[..i].trim().is_empty() || (opens_word && closes_word)
    });
    match cut {
        Some(i) => &line[..i],
        None => line,
    }
}
