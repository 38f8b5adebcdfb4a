use std::io;
use std::path::Path;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use http_range_header::parse_range_header;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::http::browse::IdQuery;
use crate::http::response::{self, SubsonicError};
use crate::http::state::AppState;
use crate::media::fs::OpenedFile;
use crate::media::mime;

/// Headers present on every successful stream response.
fn stream_headers(content_type: &'static str, size: u64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers
}

fn unsatisfiable(size: u64) -> Response {
    (
        StatusCode::RANGE_NOT_SATISFIABLE,
        [(header::CONTENT_RANGE, format!("bytes */{}", size))],
    )
        .into_response()
}

/// GET /rest/stream.view?id=: the raw file, whole or per RFC 7233 Range.
///
/// No transcoding: bytes go out exactly as stored in the music directory.
pub async fn stream(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    req_headers: HeaderMap,
) -> Response {
    let Some(id) = query.id.filter(|id| !id.is_empty()) else {
        return SubsonicError::MissingParameter.into_response();
    };
    let Some(song_path) = response::decode_id(&id) else {
        tracing::debug!("stream: undecodable id {:?}", id);
        return SubsonicError::NotFound.into_response();
    };

    let file = match state.fs.open(Path::new(&song_path)).await {
        Ok(f) => f,
        Err(e) if matches!(
            e.kind(),
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied | io::ErrorKind::InvalidInput
        ) => {
            tracing::debug!("stream: cannot open {:?}: {}", song_path, e);
            return SubsonicError::NotFound.into_response();
        }
        Err(e) => {
            tracing::error!("stream: failed to open {:?}: {}", song_path, e);
            return SubsonicError::Generic.into_response();
        }
    };

    let content_type = mime::content_type(Path::new(&song_path));
    let headers = stream_headers(content_type, file.size);

    if let Some(range_val) = req_headers.get(header::RANGE) {
        let Ok(range_str) = range_val.to_str() else {
            return unsatisfiable(file.size);
        };
        return range_response(file, range_str, headers).await;
    }

    let body = Body::from_stream(ReaderStream::new(file.reader));
    (StatusCode::OK, headers, body).into_response()
}

/// 206 with the first satisfiable range, or 416. Multi-range requests are
/// answered with their first range only.
async fn range_response(file: OpenedFile, range_str: &str, mut headers: HeaderMap) -> Response {
    let size = file.size;
    let Ok(parsed) = parse_range_header(range_str) else {
        return unsatisfiable(size);
    };
    let Ok(ranges) = parsed.validate(size) else {
        return unsatisfiable(size);
    };
    let Some(first) = ranges.into_iter().next() else {
        return unsatisfiable(size);
    };

    let start = *first.start();
    let end = *first.end(); // inclusive
    let length = end - start + 1;

    let mut reader = file.reader;
    if let Err(e) = reader.seek(io::SeekFrom::Start(start)).await {
        tracing::error!("stream: seek to {} failed: {}", start, e);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let content_range = format!("bytes {}-{}/{}", start, end, size);
    if let Ok(value) = HeaderValue::from_str(&content_range) {
        headers.insert(header::CONTENT_RANGE, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));

    let body = Body::from_stream(ReaderStream::new(reader.take(length)));
    (StatusCode::PARTIAL_CONTENT, headers, body).into_response()
}
