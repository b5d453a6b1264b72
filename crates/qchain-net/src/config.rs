/// Configuration for the broadcast/intake seam. The node is single-process
/// in this core (no real transport), so most fields exist to mirror the
/// shape a production P2P layer would take over from here.
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub listen_addr: String,
    pub bootstrap_peers: Vec<String>,
    pub protocol_version: String,
    pub channel_capacity: usize,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:30303".into(),
            bootstrap_peers: Vec::new(),
            protocol_version: "/qchain/1.0.0".into(),
            channel_capacity: 256,
        }
    }
}
