use std::path::Path;

/// Fallback for files MPD indexed but we have no mapping for.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Map a music file to its lowercased suffix and MIME type.
///
/// Returns `None` when the path has no extension or the extension is not an
/// audio format MPD commonly decodes. Matching is case-insensitive.
pub fn classify(path: &Path) -> Option<(String, &'static str)> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();

    let mime = match ext.as_str() {
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "m4a" | "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "wma" => "audio/x-ms-wma",
        "aiff" | "aif" => "audio/aiff",
        "ape" => "audio/x-ape",
        "wv" => "audio/x-wavpack",
        "mpc" => "audio/x-musepack",
        "dsf" | "dff" => "audio/x-dsd",
        _ => return None,
    };

    Some((ext, mime))
}

/// Content type for a path, falling back to `DEFAULT_CONTENT_TYPE`.
pub fn content_type(path: &Path) -> &'static str {
    classify(path).map(|(_, mime)| mime).unwrap_or(DEFAULT_CONTENT_TYPE)
}
