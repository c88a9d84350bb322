use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default period between scheduler cycles and between peer fetches.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Default directory scanned for check scripts.
pub const DEFAULT_SCRIPT_DIR: &str = "/etc/checkmesh";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerConfig {
    pub addr: String, // host:port, the results are fetched over plain HTTP
}

impl PeerConfig {
    /// URL of the peer's results endpoint.
    pub fn results_url(&self) -> String {
        format!("http://{}/api/v1/results", self.addr)
    }
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub listen_addr: SocketAddr,
    pub script_dir: PathBuf,
    pub peers: Vec<PeerConfig>,
    /// Period of the local scheduler.
    pub check_interval: Duration,
    /// Period of every remote poller.
    pub fetch_interval: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            script_dir: PathBuf::from(DEFAULT_SCRIPT_DIR),
            peers: Vec::new(),
            check_interval: DEFAULT_INTERVAL,
            fetch_interval: DEFAULT_INTERVAL,
        }
    }
}

impl NodeConfig {
    pub fn new(listen_addr: SocketAddr, script_dir: impl Into<PathBuf>) -> Self {
        Self {
            listen_addr,
            script_dir: script_dir.into(),
            ..Default::default()
        }
    }

    /// Add a peer. Duplicate addresses are ignored.
    pub fn with_peer(mut self, addr: impl Into<String>) -> Self {
        let addr = addr.into();
        if !self.peers.iter().any(|p| p.addr == addr) {
            self.peers.push(PeerConfig { addr });
        }
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self.fetch_interval = interval;
        self
    }

    pub fn peer_addrs(&self) -> impl Iterator<Item = &str> {
        self.peers.iter().map(|p| p.addr.as_str())
    }
}

/// Parse a listen address. A bare `:PORT` binds all interfaces.
pub fn parse_listen_addr(s: &str) -> Result<SocketAddr, std::net::AddrParseError> {
    let s = s.trim();
    if s.starts_with(':') {
        format!("0.0.0.0{}", s).parse()
    } else {
        s.parse()
    }
}

/// Normalize peer addresses: trim, drop empties, strip an `http://` prefix
/// and trailing slashes, remove duplicates keeping first occurrence.
pub fn parse_peers<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<PeerConfig> {
    let mut peers: Vec<PeerConfig> = Vec::new();
    for addr in raw {
        let addr = addr
            .trim()
            .trim_start_matches("http://")
            .trim_end_matches('/');
        if addr.is_empty() {
            continue;
        }
        if peers.iter().any(|p| p.addr == addr) {
            tracing::warn!(peer = addr, "Duplicate peer address ignored");
            continue;
        }
        peers.push(PeerConfig {
            addr: addr.to_string(),
        });
    }
    peers
}
