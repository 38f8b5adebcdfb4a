//! The slice of MPD's database the Subsonic handlers rely on.

pub mod client;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use client::MpdClient;

#[derive(Debug, thiserror::Error)]
pub enum MpdError {
    #[error("MPD connection error: {0}")]
    Io(#[from] std::io::Error),
    #[error("MPD error {code} in {command}: {message}")]
    Ack {
        code: u32,
        command: String,
        message: String,
    },
    #[error("MPD protocol error: {0}")]
    Protocol(String),
}

/// MPD error code for a path that does not exist (`ACK [50@0]`).
pub const ACK_ERROR_NO_EXIST: u32 = 50;

impl MpdError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MpdError::Ack { code, .. } if *code == ACK_ERROR_NO_EXIST)
    }
}

/// Operations the façade needs from MPD. Implementations must tolerate
/// concurrent calls from request handlers and the keepalive task.
#[async_trait]
pub trait Database: Send + Sync {
    /// No-op round trip; keeps an idle connection from being closed by MPD.
    async fn ping(&self) -> Result<(), MpdError>;

    /// Immediate children of `path` ("" is the music root).
    async fn list_info(&self, path: &str) -> Result<Vec<Entry>, MpdError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    /// Path relative to the music directory.
    pub path: String,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Song {
    /// Path relative to the music directory.
    pub path: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track: Option<u32>,
    /// Whole seconds.
    pub duration: Option<u32>,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Directory(Directory),
    Song(Song),
    Playlist(String),
}

impl Entry {
    pub fn path(&self) -> &str {
        match self {
            Entry::Directory(d) => &d.path,
            Entry::Song(s) => &s.path,
            Entry::Playlist(p) => p,
        }
    }
}

/// Last path component, e.g. "Album" for "Artist/Album".
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Everything before the last path component; "" for top-level entries.
pub fn parent_path(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

/// Group `key: value` response pairs into entries. Each `directory`, `file` or
/// `playlist` key starts a new entry; following keys describe it.
pub fn parse_entries(pairs: &[(String, String)]) -> Vec<Entry> {
    let mut entries = Vec::new();
    let mut current: Option<Entry> = None;

    for (key, value) in pairs {
        let started = match key.as_str() {
            "directory" => Some(Entry::Directory(Directory {
                path: value.clone(),
                last_modified: None,
            })),
            "file" => Some(Entry::Song(Song {
                path: value.clone(),
                ..Song::default()
            })),
            "playlist" => Some(Entry::Playlist(value.clone())),
            _ => None,
        };

        if let Some(entry) = started {
            entries.extend(current.replace(entry));
            continue;
        }

        match current.as_mut() {
            Some(Entry::Directory(dir)) => {
                if key == "Last-Modified" {
                    dir.last_modified = parse_timestamp(value);
                }
            }
            Some(Entry::Song(song)) => apply_song_tag(song, key, value),
            // Tags before the first entry (or on playlists) carry nothing we expose.
            Some(Entry::Playlist(_)) | None => {}
        }
    }

    entries.extend(current);
    entries
}

fn apply_song_tag(song: &mut Song, key: &str, value: &str) {
    match key {
        "Title" => song.title = Some(value.to_string()),
        "Artist" => song.artist = Some(value.to_string()),
        "Album" => song.album = Some(value.to_string()),
        // "3/12" means track 3 of 12
        "Track" => song.track = value.split('/').next().and_then(|n| n.trim().parse().ok()),
        "duration" => {
            if let Ok(secs) = value.parse::<f64>() {
                song.duration = Some(secs.round() as u32);
            }
        }
        // Older servers only send the integer `Time`.
        "Time" if song.duration.is_none() => song.duration = value.parse().ok(),
        "Last-Modified" => song.last_modified = parse_timestamp(value),
        _ => {}
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
