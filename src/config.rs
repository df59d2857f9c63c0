/// Address the server binds to unless `--bind` is given
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9000;

/// Seconds without any packet before a session is dropped
pub const SESSION_TIMEOUT_SECONDS: u64 = 30;
pub const SESSION_CLEANUP_INTERVAL_SECONDS: u64 = 5;

/// Client messages are small; anything larger is truncated and fails to decode
pub const RECV_BUFFER_SIZE: usize = 2048;
/// Largest UDP payload, used by clients receiving full board states
pub const MAX_DATAGRAM_SIZE: usize = 65_507;
