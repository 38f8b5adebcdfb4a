use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(
    name = "mpdsonic",
    about = "Subsonic API façade for MPD: browse and stream your MPD library from any Subsonic client",
    long_about = None,
    version,
)]
pub struct Args {
    /// Username Subsonic clients must log in with
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password Subsonic clients must log in with
    #[arg(short, long)]
    pub password: Option<String>,

    /// MPD music directory (must match music_directory in mpd.conf)
    #[arg(short, long, value_name = "DIR")]
    pub music_dir: Option<PathBuf>,

    /// MPD server address [default: localhost:6600]
    #[arg(long, value_name = "HOST:PORT")]
    pub mpd: Option<String>,

    /// Password for the MPD server, if it requires one
    #[arg(long)]
    pub mpd_password: Option<String>,

    /// HTTP address to listen on [default: 0.0.0.0:4040]
    #[arg(short, long)]
    pub listen: Option<SocketAddr>,

    /// Seconds between keepalive pings to MPD; 0 disables [default: 0]
    #[arg(long, value_name = "SECS")]
    pub keepalive: Option<u64>,

    /// Log every incoming request
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to TOML config file (overrides default search: ./mpdsonic.toml, ~/.config/mpdsonic/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
