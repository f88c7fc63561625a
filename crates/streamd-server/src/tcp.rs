use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use streamd_parser::parse_cmd;
use streamd_tree::Session;
use streamd_types::{ControlError, ControlResult};

use crate::config::TcpConfig;
use crate::envelope::envelope_for;
use crate::ipc::Ipc;

/// Commands are read whole, up to this many bytes per read.
pub const MAX_COMMAND_SIZE: usize = 1024 * 1024;

struct Active {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

/// The line-oriented TCP protocol server.
///
/// Each accepted connection runs on its own task, bounded by a semaphore
/// mirroring the HTTP pool cap. Commands on one connection are serialized:
/// read, dispatch, write one envelope (NUL-terminated), then read again.
pub struct TcpServer {
    config: TcpConfig,
    session: Arc<Session>,
    active: Mutex<Option<Active>>,
}

impl TcpServer {
    pub fn new(config: TcpConfig, session: Arc<Session>) -> Self {
        Self {
            config,
            session,
            active: Mutex::new(None),
        }
    }

    /// The bound address while running. With a configured port of 0 this is
    /// the kernel-assigned port.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.active.lock().await.as_ref().map(|a| a.local_addr)
    }

    async fn stop_active(active: Active) {
        let _ = active.shutdown.send(true);
        let _ = active.accept_task.await;
    }
}

#[async_trait]
impl Ipc for TcpServer {
    async fn start(&self) -> ControlResult<()> {
        let mut slot = self.active.lock().await;
        // Close any existing service before rebinding.
        if let Some(active) = slot.take() {
            Self::stop_active(active).await;
        }

        let bind_to = format!("{}:{}", self.config.address, self.config.port);
        let listener = TcpListener::bind(&bind_to).await.map_err(|err| {
            ControlError::NoConnection(format!("TCP bind to {bind_to} failed: {err}"))
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|err| ControlError::NoConnection(err.to_string()))?;

        let (shutdown, shutdown_rx) = watch::channel(false);
        let session = self.session.clone();
        let limit = Arc::new(Semaphore::new(self.config.max_threads));
        let accept_task = tokio::spawn(accept_loop(listener, session, shutdown_rx, limit));

        *slot = Some(Active {
            local_addr,
            shutdown,
            accept_task,
        });
        info!(address = %local_addr, "TCP protocol listening");
        Ok(())
    }

    async fn stop(&self) -> ControlResult<()> {
        // Take the service out of the shared slot first so a concurrent
        // start cannot observe a half-torn-down instance.
        let Some(active) = self.active.lock().await.take() else {
            return Ok(());
        };
        Self::stop_active(active).await;
        info!("TCP protocol stopped");
        Ok(())
    }
}

async fn accept_loop(
    listener: TcpListener,
    session: Arc<Session>,
    mut shutdown: watch::Receiver<bool>,
    limit: Arc<Semaphore>,
) {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        warn!(error = %err, "accept failed");
                        continue;
                    }
                };
                let permit = match limit.clone().try_acquire_owned() {
                    Ok(permit) => permit,
                    Err(_) => {
                        // Dropping the stream closes the connection.
                        warn!(client = %peer, "connection limit reached, rejecting");
                        continue;
                    }
                };
                let session = session.clone();
                let shutdown = shutdown.clone();
                connections.spawn(async move {
                    handle_connection(stream, peer, session, shutdown).await;
                    drop(permit);
                });
            }
        }
    }
    drop(listener);
    while connections.join_next().await.is_some() {}
}

async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    session: Arc<Session>,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(client = %peer, "client connected");
    let mut buffer = vec![0u8; MAX_COMMAND_SIZE];
    let mut commands_served = 0u32;

    loop {
        let read = tokio::select! {
            _ = shutdown.changed() => break,
            read = stream.read(&mut buffer) => read,
        };
        let read = match read {
            Ok(0) => {
                debug!(
                    client = %peer,
                    commands = commands_served,
                    "client closed connection"
                );
                break;
            }
            Ok(read) => read,
            Err(err) => {
                warn!(client = %peer, error = %err, "read error");
                break;
            }
        };

        let command = String::from_utf8_lossy(&buffer[..read]).into_owned();
        commands_served += 1;
        debug!(
            client = %peer,
            command = %command.chars().take(80).collect::<String>(),
            "received command"
        );

        let result = {
            let session = session.clone();
            let command = command.clone();
            tokio::task::spawn_blocking(move || parse_cmd(&session, &command))
                .await
                .unwrap_or_else(|_| {
                    Err(ControlError::BadCommand("command execution failed".into()))
                })
        };
        let (code, body) = envelope_for(&result);
        if result.is_err() {
            warn!(client = %peer, code = code.code(), "command failed");
        }

        // Envelope plus trailing NUL in a single write.
        let mut frame = body.into_bytes();
        frame.push(0);
        if let Err(err) = stream.write_all(&frame).await {
            warn!(client = %peer, error = %err, "write error");
            break;
        }
    }

    // The stream drops here on every exit path, releasing the descriptor.
    debug!(client = %peer, commands = commands_served, "client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use streamd_engine::SimEngine;

    async fn start_server() -> (TcpServer, SocketAddr) {
        let session = Session::standalone("tcp-test", Arc::new(SimEngine::new()));
        let config = TcpConfig {
            port: 0,
            ..TcpConfig::default()
        };
        let server = TcpServer::new(config, session);
        server.start().await.unwrap();
        let addr = server.local_addr().await.unwrap();
        (server, addr)
    }

    /// Send one command and decode the NUL-terminated envelope.
    async fn send_command(stream: &mut TcpStream, command: &str) -> Value {
        stream.write_all(command.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            stream.read_exact(&mut byte).await.unwrap();
            if byte[0] == 0 {
                break;
            }
            response.push(byte[0]);
        }
        serde_json::from_slice(&response).expect("response should be JSON")
    }

    #[tokio::test]
    async fn create_play_delete_roundtrip() {
        let (server, addr) = start_server().await;
        let mut stream = TcpStream::connect(addr).await.unwrap();

        let reply = send_command(&mut stream, "pipeline_create p0 fakesrc ! fakesink").await;
        assert_eq!(reply["code"], 0);

        let reply = send_command(&mut stream, "pipeline_play p0").await;
        assert_eq!(reply["code"], 0);

        let reply = send_command(&mut stream, "read /pipelines/p0/state").await;
        assert_eq!(reply["code"], 0);
        assert_eq!(reply["response"]["value"], "playing");

        let reply = send_command(&mut stream, "pipeline_stop p0").await;
        assert_eq!(reply["code"], 0);
        let reply = send_command(&mut stream, "pipeline_delete p0").await;
        assert_eq!(reply["code"], 0);

        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_command_keeps_connection_usable() {
        let (server, addr) = start_server().await;
        let mut stream = TcpStream::connect(addr).await.unwrap();

        let reply = send_command(&mut stream, "this_is_not_a_valid_command").await;
        assert_eq!(reply["code"], 2);
        assert_eq!(reply["description"], "Unknown command");
        assert_eq!(reply["response"], Value::Null);

        let reply = send_command(&mut stream, "list_pipelines").await;
        assert_eq!(reply["code"], 0);

        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn commands_on_one_connection_are_serialized() {
        let (server, addr) = start_server().await;
        let mut stream = TcpStream::connect(addr).await.unwrap();

        for round in 0..5 {
            let name = format!("p{round}");
            let reply =
                send_command(&mut stream, &format!("pipeline_create {name} fakesrc ! fakesink"))
                    .await;
            assert_eq!(reply["code"], 0);
            let reply = send_command(&mut stream, &format!("pipeline_delete {name}")).await;
            assert_eq!(reply["code"], 0);
        }

        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_connections_are_independent() {
        let (server, addr) = start_server().await;

        let tasks: Vec<_> = (0..4)
            .map(|index: usize| {
                tokio::spawn(async move {
                    let mut stream = TcpStream::connect(addr).await.unwrap();
                    let name = format!("conn{index}");
                    let reply = send_command(
                        &mut stream,
                        &format!("pipeline_create {name} fakesrc ! fakesink"),
                    )
                    .await;
                    assert_eq!(reply["code"], 0);
                    let reply = send_command(&mut stream, &format!("pipeline_delete {name}")).await;
                    assert_eq!(reply["code"], 0);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn restart_after_stop() {
        let (server, addr) = start_server().await;
        {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            let reply = send_command(&mut stream, "list_pipelines").await;
            assert_eq!(reply["code"], 0);
        }

        server.stop().await.unwrap();
        server.start().await.unwrap();
        let addr = server.local_addr().await.unwrap();

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let reply = send_command(&mut stream, "list_pipelines").await;
        assert_eq!(reply["code"], 0);

        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let (server, _addr) = start_server().await;
        server.stop().await.unwrap();
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn bind_failure_is_no_connection() {
        let session = Session::standalone("tcp-bind-test", Arc::new(SimEngine::new()));
        let config = TcpConfig {
            address: "203.0.113.1".to_string(),
            port: 1,
            ..TcpConfig::default()
        };
        let server = TcpServer::new(config, session);
        let err = server.start().await.unwrap_err();
        assert!(matches!(err, ControlError::NoConnection(_)));
        server.stop().await.unwrap();
    }
}
