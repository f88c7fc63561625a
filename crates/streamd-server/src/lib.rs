//! IPC servers for the streamd daemon.
//!
//! Two transports expose the same command surface: a line-oriented TCP
//! protocol ([`TcpServer`]) and an HTTP/JSON REST protocol
//! ([`HttpServer`]). Both normalize requests through the shared parser and
//! answer with the `{code, description, response}` envelope. The HTTP
//! server executes commands on a bounded [`WorkerPool`]; two fast-path
//! endpoints bypass it entirely.

pub mod config;
pub mod envelope;
pub mod http;
pub mod ipc;
pub mod pool;
pub mod tcp;

pub use config::{HttpConfig, TcpConfig};
pub use http::HttpServer;
pub use ipc::Ipc;
pub use pool::WorkerPool;
pub use tcp::TcpServer;
