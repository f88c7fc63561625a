use anyhow::bail;
use clap::Parser;
use tracing::{error, info};

use streamd_server::{HttpServer, Ipc, TcpServer};
use streamd_tree::Session;

mod options;

use options::Options;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let options = Options::parse();

    if !options.enable_tcp_protocol && !options.enable_http_protocol {
        bail!("no IPC enabled; pass --enable-tcp-protocol and/or --enable-http-protocol");
    }

    let session = Session::new("streamd");
    let mut servers: Vec<Box<dyn Ipc>> = Vec::new();

    if options.enable_tcp_protocol {
        let server = TcpServer::new(options.tcp_config(), session.clone());
        match server.start().await {
            Ok(()) => servers.push(Box::new(server)),
            // A bind failure aborts only this IPC; the other keeps going.
            Err(err) => error!(error = %err, "TCP protocol failed to start"),
        }
    }
    if options.enable_http_protocol {
        let server = HttpServer::new(options.http_config(), session.clone());
        match server.start().await {
            Ok(()) => servers.push(Box::new(server)),
            Err(err) => error!(error = %err, "HTTP protocol failed to start"),
        }
    }

    if servers.is_empty() {
        bail!("every enabled IPC failed to start");
    }

    info!("streamd running; press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    for server in &servers {
        if let Err(err) = server.stop().await {
            error!(error = %err, "server shutdown failed");
        }
    }
    Ok(())
}
