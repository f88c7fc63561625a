use clap::Parser;

use streamd_server::config::{clamp_threads, DEFAULT_HTTP_PORT, DEFAULT_TCP_PORT};
use streamd_server::{HttpConfig, TcpConfig};

/// Pipeline control daemon.
#[derive(Parser, Debug)]
#[command(name = "streamd", about = "Stream pipeline control daemon", version)]
pub struct Options {
    /// Start the TCP command protocol
    #[arg(long)]
    pub enable_tcp_protocol: bool,

    /// TCP bind address
    #[arg(long, default_value = "127.0.0.1")]
    pub tcp_address: String,

    /// TCP bind port
    #[arg(long, default_value_t = DEFAULT_TCP_PORT)]
    pub tcp_port: u16,

    /// Maximum concurrent TCP connections (-1 selects the bounded default)
    #[arg(long, default_value_t = 16, allow_hyphen_values = true)]
    pub tcp_max_threads: i64,

    /// Start the HTTP/JSON protocol
    #[arg(long)]
    pub enable_http_protocol: bool,

    /// HTTP bind address
    #[arg(long, default_value = "127.0.0.1")]
    pub http_address: String,

    /// HTTP bind port
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT)]
    pub http_port: u16,

    /// HTTP worker pool capacity (-1 selects the bounded default)
    #[arg(long, default_value_t = 16, allow_hyphen_values = true)]
    pub http_max_threads: i64,
}

impl Options {
    pub fn tcp_config(&self) -> TcpConfig {
        TcpConfig {
            address: self.tcp_address.clone(),
            port: self.tcp_port,
            max_threads: clamp_threads(self.tcp_max_threads),
        }
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            address: self.http_address.clone(),
            port: self.http_port,
            max_threads: clamp_threads(self.http_max_threads),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = Options::try_parse_from(["streamd"]).unwrap();
        assert!(!options.enable_tcp_protocol);
        assert!(!options.enable_http_protocol);
        assert_eq!(options.http_address, "127.0.0.1");
        assert_eq!(options.http_port, 5001);
        assert_eq!(options.tcp_port, 5000);
        assert_eq!(options.http_max_threads, 16);
    }

    #[test]
    fn parse_http_options() {
        let options = Options::try_parse_from([
            "streamd",
            "--enable-http-protocol",
            "--http-address",
            "0.0.0.0",
            "--http-port",
            "8080",
            "--http-max-threads",
            "4",
        ])
        .unwrap();
        assert!(options.enable_http_protocol);
        let config = options.http_config();
        assert_eq!(config.address, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_threads, 4);
    }

    #[test]
    fn parse_tcp_options() {
        let options = Options::try_parse_from([
            "streamd",
            "--enable-tcp-protocol",
            "--tcp-port",
            "7000",
        ])
        .unwrap();
        assert!(options.enable_tcp_protocol);
        assert_eq!(options.tcp_config().port, 7000);
    }

    #[test]
    fn unlimited_threads_clamp_to_default() {
        let options = Options::try_parse_from([
            "streamd",
            "--enable-http-protocol",
            "--http-max-threads",
            "-1",
            "--enable-tcp-protocol",
            "--tcp-max-threads",
            "-1",
        ])
        .unwrap();
        assert_eq!(options.http_config().max_threads, 16);
        assert_eq!(options.tcp_config().max_threads, 16);
    }
}
