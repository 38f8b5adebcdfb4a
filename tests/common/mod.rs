//! Fakes shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;

use mpdsonic::config::Config;
use mpdsonic::media::fs::{Filesystem, OpenedFile};
use mpdsonic::mpd::{Database, Entry, MpdError, ACK_ERROR_NO_EXIST};
use mpdsonic::server::Server;

pub const USER: &str = "joe";
pub const PASSWORD: &str = "sesame";

pub fn test_config(keepalive: Duration) -> Config {
    Config {
        subsonic_user: USER.to_string(),
        subsonic_password: PASSWORD.to_string(),
        music_directory: PathBuf::from("/music"),
        mpd_address: "localhost:6600".to_string(),
        mpd_password: None,
        listen: "127.0.0.1:4040".parse().unwrap(),
        verbose: false,
        keepalive,
    }
}

/// In-memory MPD database that counts pings.
#[derive(Default)]
pub struct FakeDb {
    pub pings: AtomicUsize,
    pub fail_pings: bool,
    pub dirs: HashMap<String, Vec<Entry>>,
}

impl FakeDb {
    pub fn with_dir(mut self, path: &str, entries: Vec<Entry>) -> Self {
        self.dirs.insert(path.to_string(), entries);
        self
    }

    pub fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Database for FakeDb {
    async fn ping(&self) -> Result<(), MpdError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.fail_pings {
            return Err(MpdError::Protocol("connection reset".to_string()));
        }
        Ok(())
    }

    async fn list_info(&self, path: &str) -> Result<Vec<Entry>, MpdError> {
        self.dirs.get(path).cloned().ok_or_else(|| MpdError::Ack {
            code: ACK_ERROR_NO_EXIST,
            command: "lsinfo".to_string(),
            message: "No such directory".to_string(),
        })
    }
}

/// In-memory music directory.
#[derive(Default)]
pub struct FakeFs {
    pub files: HashMap<String, Vec<u8>>,
}

impl FakeFs {
    pub fn with_file(mut self, path: &str, bytes: &[u8]) -> Self {
        self.files.insert(path.to_string(), bytes.to_vec());
        self
    }
}

#[async_trait]
impl Filesystem for FakeFs {
    async fn open(&self, path: &Path) -> io::Result<OpenedFile> {
        let key = path.to_str().unwrap_or_default();
        let bytes = self
            .files
            .get(key)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        Ok(OpenedFile {
            size: bytes.len() as u64,
            reader: Box::new(io::Cursor::new(bytes)),
        })
    }
}

pub fn make_server(db: FakeDb, fs: FakeFs) -> Server {
    Server::new(Arc::new(db), Arc::new(fs), test_config(Duration::ZERO))
}

/// Query string carrying valid password credentials.
pub fn auth_query() -> String {
    format!("u={USER}&p={PASSWORD}&c=test&v=1.13.0")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
