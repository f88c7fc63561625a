use serde::{Deserialize, Serialize};

pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 5001;
pub const DEFAULT_TCP_PORT: u16 = 5000;

/// Bounded default for worker and connection counts. Requests for an
/// unlimited pool (historically `-1`) clamp here instead of allowing
/// thread exhaustion.
pub const DEFAULT_MAX_THREADS: usize = 16;

/// Clamp a client-supplied thread count to a sane bound.
pub fn clamp_threads(requested: i64) -> usize {
    if requested <= 0 {
        DEFAULT_MAX_THREADS
    } else {
        requested as usize
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
    pub max_threads: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_HTTP_PORT,
            max_threads: DEFAULT_MAX_THREADS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TcpConfig {
    pub address: String,
    pub port: u16,
    pub max_threads: usize,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_TCP_PORT,
            max_threads: DEFAULT_MAX_THREADS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configs() {
        let http = HttpConfig::default();
        assert_eq!(http.address, "127.0.0.1");
        assert_eq!(http.port, 5001);
        assert_eq!(http.max_threads, 16);

        let tcp = TcpConfig::default();
        assert_eq!(tcp.port, 5000);
        assert_eq!(tcp.max_threads, 16);
    }

    #[test]
    fn unlimited_thread_counts_are_clamped() {
        assert_eq!(clamp_threads(-1), DEFAULT_MAX_THREADS);
        assert_eq!(clamp_threads(0), DEFAULT_MAX_THREADS);
        assert_eq!(clamp_threads(4), 4);
        assert_eq!(clamp_threads(64), 64);
    }
}
