use std::collections::BTreeMap;
use std::path::Path;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::http::response::{self, ok_xml, subsonic_ok, xml_escape, SubsonicError};
use crate::http::state::AppState;
use crate::media::mime;
use crate::mpd::{base_name, parent_path, Directory, Entry, MpdError, Song};

/// The only music folder we expose: MPD's music directory.
const MUSIC_FOLDER_ID: u32 = 0;
const MUSIC_FOLDER_NAME: &str = "Music";

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

// ── Simple endpoints ──────────────────────────────────────────────────────────

/// GET /rest/ping.view: an empty ok response proves the credentials work.
pub async fn ping() -> Response {
    ok_xml(subsonic_ok(""))
}

/// GET /rest/getLicense.view: the emulated server is always licensed.
pub async fn get_license() -> Response {
    ok_xml(subsonic_ok(r#"<license valid="true"/>"#))
}

/// GET /rest/getMusicFolders.view
pub async fn get_music_folders() -> Response {
    ok_xml(subsonic_ok(&format!(
        r#"<musicFolders><musicFolder id="{}" name="{}"/></musicFolders>"#,
        MUSIC_FOLDER_ID, MUSIC_FOLDER_NAME
    )))
}

// ── Element helpers ───────────────────────────────────────────────────────────

fn created_attr(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    match ts {
        Some(ts) => format!(
            r#" created="{}""#,
            ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        ),
        None => String::new(),
    }
}

fn parent_attr(path: &str) -> String {
    let parent = parent_path(path);
    if parent.is_empty() {
        String::new()
    } else {
        format!(r#" parent="{}""#, response::encode_id(parent))
    }
}

fn directory_child(dir: &Directory) -> String {
    format!(
        r#"<child id="{id}"{parent} isDir="true" title="{title}"{created}/>"#,
        id = response::encode_id(&dir.path),
        parent = parent_attr(&dir.path),
        title = xml_escape(base_name(&dir.path)),
        created = created_attr(dir.last_modified),
    )
}

/// `<child>` for a song. Title falls back to the file name when untagged.
pub fn song_child(song: &Song) -> String {
    let mut attrs = String::new();
    if let Some(ref album) = song.album {
        attrs.push_str(&format!(r#" album="{}""#, xml_escape(album)));
    }
    if let Some(ref artist) = song.artist {
        attrs.push_str(&format!(r#" artist="{}""#, xml_escape(artist)));
    }
    if let Some(track) = song.track {
        attrs.push_str(&format!(r#" track="{}""#, track));
    }
    if let Some(duration) = song.duration {
        attrs.push_str(&format!(r#" duration="{}""#, duration));
    }

    let path = Path::new(&song.path);
    let content_type = mime::content_type(path);
    if let Some((suffix, _)) = mime::classify(path) {
        attrs.push_str(&format!(r#" suffix="{}""#, suffix));
    }

    let title = song
        .title
        .as_deref()
        .unwrap_or_else(|| base_name(&song.path));

    format!(
        r#"<child id="{id}"{parent} isDir="false" title="{title}"{attrs} contentType="{content_type}" path="{path}" type="music"{created}/>"#,
        id = response::encode_id(&song.path),
        parent = parent_attr(&song.path),
        title = xml_escape(title),
        attrs = attrs,
        content_type = content_type,
        path = xml_escape(&song.path),
        created = created_attr(song.last_modified),
    )
}

/// Index bucket for an artist directory: upper-cased first letter, `#` otherwise.
pub fn index_name(name: &str) -> String {
    match name.chars().next() {
        Some(c) if c.is_alphabetic() => c.to_uppercase().collect(),
        _ => "#".to_string(),
    }
}

fn backend_error(context: &str, err: &MpdError) -> Response {
    if err.is_not_found() {
        tracing::debug!("{}: {}", context, err);
        return SubsonicError::NotFound.into_response();
    }
    tracing::error!("{}: {}", context, err);
    SubsonicError::Generic.into_response()
}

// ── Browsing ──────────────────────────────────────────────────────────────────

/// GET /rest/getIndexes.view: top-level directories of the music folder,
/// bucketed by first letter, followed by any songs stored at the root.
pub async fn get_indexes(State(state): State<AppState>) -> Response {
    let entries = match state.db.list_info("").await {
        Ok(e) => e,
        Err(e) => return backend_error("getIndexes: listing music root", &e),
    };

    let mut buckets: BTreeMap<String, Vec<&Directory>> = BTreeMap::new();
    let mut songs = Vec::new();
    for entry in &entries {
        match entry {
            Entry::Directory(dir) => buckets
                .entry(index_name(base_name(&dir.path)))
                .or_default()
                .push(dir),
            Entry::Song(song) => songs.push(song),
            Entry::Playlist(_) => {}
        }
    }

    let last_modified = entries
        .iter()
        .filter_map(|e| match e {
            Entry::Directory(d) => d.last_modified,
            Entry::Song(s) => s.last_modified,
            Entry::Playlist(_) => None,
        })
        .max()
        .map(|ts| ts.timestamp_millis())
        .unwrap_or(0);

    let mut inner = format!(r#"<indexes lastModified="{}" ignoredArticles="">"#, last_modified);
    for (name, mut dirs) in buckets {
        dirs.sort_by_key(|d| base_name(&d.path).to_lowercase());
        inner.push_str(&format!(r#"<index name="{}">"#, xml_escape(&name)));
        for dir in dirs {
            inner.push_str(&format!(
                r#"<artist id="{}" name="{}"/>"#,
                response::encode_id(&dir.path),
                xml_escape(base_name(&dir.path)),
            ));
        }
        inner.push_str("</index>");
    }
    for song in songs {
        inner.push_str(&song_child(song));
    }
    inner.push_str("</indexes>");

    ok_xml(subsonic_ok(&inner))
}

/// GET /rest/getMusicDirectory.view?id=: children of one directory.
pub async fn get_music_directory(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Response {
    let Some(id) = query.id.filter(|id| !id.is_empty()) else {
        return SubsonicError::MissingParameter.into_response();
    };
    let Some(path) = response::decode_id(&id) else {
        tracing::debug!("getMusicDirectory: undecodable id {:?}", id);
        return SubsonicError::NotFound.into_response();
    };

    let entries = match state.db.list_info(&path).await {
        Ok(e) => e,
        Err(e) => return backend_error(&format!("getMusicDirectory {:?}", path), &e),
    };

    let children: String = entries
        .iter()
        .filter_map(|entry| match entry {
            Entry::Directory(dir) => Some(directory_child(dir)),
            Entry::Song(song) => Some(song_child(song)),
            Entry::Playlist(_) => None,
        })
        .collect();

    let inner = format!(
        r#"<directory id="{id}"{parent} name="{name}">{children}</directory>"#,
        id = xml_escape(&id),
        parent = parent_attr(&path),
        name = xml_escape(base_name(&path)),
        children = children,
    );
    ok_xml(subsonic_ok(&inner))
}
