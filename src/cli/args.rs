use std::path::PathBuf;

use crate::cli::commands::utils::parse_duration;
use crate::provider::ProviderKind;
use clap::{Args, Parser, Subcommand};

/// groupq - a shared play queue with undo
///
/// Drives one or more sessions of a collaborative queue from a script or an
/// interactive prompt. Every edit is recorded and can be undone while it is
/// still safe to do so.
#[derive(Parser, Debug)]
#[command(name = "groupq")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to .groupq/config.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Append every executed command to this JSON-lines file
    #[arg(short, long, global = true)]
    pub journal: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute queue commands from a file, one per line
    Run {
        /// Script path
        script: PathBuf,
    },
    /// Read queue commands from standard input
    Repl,
}

/// One queue command line. Positions are 1-based.
#[derive(Parser, Debug)]
#[command(name = "groupq", no_binary_name = true, disable_version_flag = true)]
pub struct Line {
    #[command(subcommand)]
    pub command: LineCommand,
}

#[derive(Args, Debug, Clone)]
pub struct TrackArgs {
    /// Source of the track
    #[arg(short, long)]
    pub provider: Option<ProviderKind>,

    /// Length as m:ss, h:mm:ss or plain seconds
    #[arg(short, long, value_parser = parse_duration, default_value = "0")]
    pub duration: u32,

    /// Start playback at this offset
    #[arg(short, long, value_parser = parse_duration)]
    pub start: Option<u32>,

    /// Track title
    #[arg(required = true, trailing_var_arg = true)]
    pub title: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum LineCommand {
    /// Act as this user for the following commands
    User { id: u64 },
    /// Switch to (or create) a session
    Session { id: u64 },
    /// Add a track to the end of the queue
    #[command(alias = "p")]
    Play(TrackArgs),
    /// Add a playlist of `count` tracks to the end of the queue
    Playlist {
        #[arg(short, long)]
        provider: Option<ProviderKind>,
        /// Length of every track
        #[arg(short, long, value_parser = parse_duration, default_value = "0")]
        duration: u32,
        name: String,
        count: usize,
    },
    /// Add a track to the front of the queue
    #[command(alias = "pt")]
    Playtop(TrackArgs),
    /// Add a track, then shuffle the queue
    #[command(alias = "ps")]
    Playshuffle(TrackArgs),
    /// Add a track to the front of the queue and play it now
    Playskip(TrackArgs),
    /// Insert a track at a position
    Insert {
        position: usize,
        #[command(flatten)]
        track: TrackArgs,
    },
    /// Remove the track at a position
    #[command(alias = "rm")]
    Remove { position: usize },
    /// Remove a range of the queue, through the end by default
    Clear {
        start: Option<usize>,
        end: Option<usize>,
    },
    /// Move a track to another position
    Move { from: usize, to: usize },
    /// Move a block of tracks so it starts (or ends) at a position
    Moverange { start: usize, end: usize, at: usize },
    Shuffle,
    /// Toggle repeating the current track
    #[command(alias = "loop")]
    Repeat,
    /// The current track finished
    Next,
    /// Force skip tracks
    #[command(alias = "fs")]
    Skip {
        #[arg(default_value_t = 1)]
        count: usize,
    },
    /// Replay an earlier track
    #[command(alias = "back")]
    Goback {
        #[arg(default_value_t = 1)]
        count: usize,
    },
    /// Undo the last operation
    Undo {
        /// Only undo the last action, not the run it is linked to
        #[arg(long)]
        single: bool,
    },
    #[command(alias = "q")]
    Queue,
    History,
    /// Show the action audit log
    Actions,
    Status,
    /// Write a YAML snapshot of the session
    Dump { path: Option<PathBuf> },
    /// Look up playable sources for upcoming tracks
    Resolve,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> LineCommand {
        Line::try_parse_from(line.split_whitespace()).unwrap().command
    }

    #[test]
    fn test_parse_play_with_options() {
        match parse("play -p spotify -d 3:05 Never Gonna Give") {
            LineCommand::Play(track) => {
                assert_eq!(track.provider, Some(ProviderKind::Spotify));
                assert_eq!(track.duration, 185);
                assert_eq!(track.title.join(" "), "Never Gonna Give");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_insert_position_before_title() {
        match parse("insert 2 -s 0:30 intro") {
            LineCommand::Insert { position, track } => {
                assert_eq!(position, 2);
                assert_eq!(track.start, Some(30));
                assert_eq!(track.title, vec!["intro"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_defaults_and_aliases() {
        assert!(matches!(parse("skip"), LineCommand::Skip { count: 1 }));
        assert!(matches!(parse("back 2"), LineCommand::Goback { count: 2 }));
        assert!(matches!(
            parse("clear 3"),
            LineCommand::Clear {
                start: Some(3),
                end: None
            }
        ));
        assert!(matches!(parse("undo --single"), LineCommand::Undo { single: true }));
    }

    #[test]
    fn test_parse_rejects_missing_title() {
        assert!(Line::try_parse_from(["play"]).is_err());
        assert!(Line::try_parse_from(["remove", "x"]).is_err());
    }
}
