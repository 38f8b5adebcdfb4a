use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::mpd::{parse_entries, Database, Entry, MpdError};

const GREETING_PREFIX: &str = "OK MPD ";

/// MPD client holding a single connection shared by all callers.
///
/// Commands are serialized through a mutex. A connection that fails with an
/// I/O or protocol error is discarded and the next command reconnects.
pub struct MpdClient {
    address: String,
    password: Option<String>,
    conn: Mutex<Option<Connection>>,
}

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl MpdClient {
    /// Connect eagerly so that a wrong address or password fails at startup.
    pub async fn connect(address: &str, password: Option<String>) -> Result<Self, MpdError> {
        let conn = Connection::open(address, password.as_deref()).await?;
        Ok(MpdClient {
            address: address.to_string(),
            password,
            conn: Mutex::new(Some(conn)),
        })
    }

    async fn run(&self, command: &str, args: &[&str]) -> Result<Vec<(String, String)>, MpdError> {
        let mut guard = self.conn.lock().await;
        let mut conn = match guard.take() {
            Some(c) => c,
            None => {
                tracing::debug!("Reconnecting to MPD at {}", self.address);
                Connection::open(&self.address, self.password.as_deref()).await?
            }
        };

        let result = conn.command(command, args).await;
        // An ACK leaves the connection usable; anything else may have desynced it.
        if !matches!(result, Err(MpdError::Io(_)) | Err(MpdError::Protocol(_))) {
            *guard = Some(conn);
        }
        result
    }
}

#[async_trait]
impl Database for MpdClient {
    async fn ping(&self) -> Result<(), MpdError> {
        self.run("ping", &[]).await.map(|_| ())
    }

    async fn list_info(&self, path: &str) -> Result<Vec<Entry>, MpdError> {
        let pairs = self.run("lsinfo", &[path]).await?;
        Ok(parse_entries(&pairs))
    }
}

impl Connection {
    async fn open(address: &str, password: Option<&str>) -> Result<Self, MpdError> {
        let stream = TcpStream::connect(address).await?;
        let (read, writer) = stream.into_split();
        let mut conn = Connection {
            reader: BufReader::new(read),
            writer,
        };

        let greeting = conn.read_line().await?;
        let Some(version) = greeting.strip_prefix(GREETING_PREFIX) else {
            return Err(MpdError::Protocol(format!("unexpected greeting: {greeting:?}")));
        };
        tracing::debug!("Connected to MPD {} at {}", version, address);

        if let Some(password) = password {
            conn.command("password", &[password]).await?;
        }
        Ok(conn)
    }

    async fn read_line(&mut self) -> Result<String, MpdError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Err(MpdError::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    async fn command(&mut self, command: &str, args: &[&str]) -> Result<Vec<(String, String)>, MpdError> {
        self.writer.write_all(format_command(command, args).as_bytes()).await?;
        self.writer.flush().await?;

        let mut pairs = Vec::new();
        loop {
            let line = self.read_line().await?;
            if line == "OK" {
                return Ok(pairs);
            }
            if let Some(ack) = line.strip_prefix("ACK ") {
                return Err(parse_ack(ack));
            }
            match line.split_once(": ") {
                Some((key, value)) => pairs.push((key.to_string(), value.to_string())),
                None => return Err(MpdError::Protocol(format!("malformed response line: {line:?}"))),
            }
        }
    }
}

/// Render a command line; every argument is quoted with `"` and `\` escaped.
pub fn format_command(command: &str, args: &[&str]) -> String {
    let mut line = command.to_string();
    for arg in args {
        line.push_str(" \"");
        for ch in arg.chars() {
            if ch == '"' || ch == '\\' {
                line.push('\\');
            }
            line.push(ch);
        }
        line.push('"');
    }
    line.push('\n');
    line
}

/// Parse the part of an error line after `ACK `: `[50@0] {lsinfo} No such directory`.
pub fn parse_ack(ack: &str) -> MpdError {
    let parsed = (|| {
        let rest = ack.strip_prefix('[')?;
        let (code_at, rest) = rest.split_once(']')?;
        let code = code_at.split('@').next()?.parse().ok()?;
        let rest = rest.trim_start().strip_prefix('{')?;
        let (command, message) = rest.split_once('}')?;
        Some(MpdError::Ack {
            code,
            command: command.to_string(),
            message: message.trim().to_string(),
        })
    })();
    parsed.unwrap_or_else(|| MpdError::Protocol(format!("malformed ACK: {ack:?}")))
}
