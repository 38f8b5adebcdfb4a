//! Subsonic API façade for MPD: authenticate Subsonic clients, browse MPD's database, stream from disk.

pub mod auth;
pub mod cli;
pub mod config;
pub mod http;
pub mod media;
pub mod mpd;
pub mod server;
