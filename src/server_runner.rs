//! Server startup and accept loop
//!
//! This module handles listener setup and the main connection accept
//! loop. One task is spawned per connection; the loop exits as soon as
//! the shutdown coordinator begins draining, after which the runner
//! waits out in-flight requests before marking the service stopped.

use anyhow::Result;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::task::TaskTracker;

use crate::config::ServerConfig;
use crate::handler;
use crate::logger::log;
use crate::server::HashServer;

/// Bind the TCP listener with SO_REUSEADDR for fast restarts.
pub fn bind_listener(config: &ServerConfig) -> Result<TcpListener> {
    let socket_addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let socket = socket2::Socket::new(
        match socket_addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;
    // Allow immediate rebind after restart (skip TIME_WAIT)
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(config.tcp_backlog)?;

    Ok(TcpListener::from_std(socket.into())?)
}

/// Run the accept loop until draining begins, then wait for in-flight
/// requests (bounded by the drain grace period) and mark the service
/// stopped.
pub async fn run_server(
    server: Arc<HashServer>,
    listener: TcpListener,
    config: &ServerConfig,
) -> Result<()> {
    let local_addr = listener.local_addr()?;
    log::info!(
        address = %local_addr,
        hash_delay = ?config.hash_delay,
        drain_grace = ?config.drain_grace,
        "Server started"
    );

    let connections = TaskTracker::new();

    loop {
        let (stream, addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    log::error!(error = %e, "Failed to accept connection");
                    continue;
                }
            },
            _ = server.shutdown.cancelled() => break,
        };

        if config.tcp_nodelay {
            let _ = stream.set_nodelay(true);
        }
        log::debug!(peer = %addr, "Connection accepted");

        let server = Arc::clone(&server);
        connections.spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| {
                let server = Arc::clone(&server);
                async move {
                    Ok::<_, std::convert::Infallible>(handler::route(&server, req).await)
                }
            });
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                log::debug!(peer = %addr, error = %e, "Connection closed with error");
            }
        });
    }

    // New connections stop here; requests admitted before the drain
    // transition keep running on their tracked tasks
    drop(listener);
    log::info!("Listener closed, waiting for in-flight requests");

    if server.shutdown.wait_for_inflight(config.drain_grace).await {
        log::info!("All in-flight requests completed");
    } else {
        log::warn!(
            grace = ?config.drain_grace,
            remaining = server.shutdown.in_flight(),
            "Drain grace period elapsed with requests still in flight"
        );
    }

    // The in-flight barrier releases when a handler produces its
    // response; the connection task still has to write it to the
    // socket. Wait those tasks out (idle keep-alive connections are
    // bounded by the same grace period) before declaring the stop.
    connections.close();
    if tokio::time::timeout(config.drain_grace, connections.wait())
        .await
        .is_err()
    {
        log::warn!(
            remaining = connections.len(),
            "Connections still open after the drain grace period"
        );
    }
    server.shutdown.mark_stopped();
    log::info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config(port: u16) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port,
            hash_delay: Duration::from_millis(10),
            drain_grace: Duration::from_secs(1),
            tcp_backlog: 128,
            tcp_nodelay: true,
        }
    }

    #[tokio::test]
    async fn test_bind_listener_ephemeral_port() {
        let listener = bind_listener(&test_config(0)).unwrap();
        let addr = listener.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_listener_rejects_bad_host() {
        let mut config = test_config(0);
        config.host = "not a host".to_string();
        assert!(bind_listener(&config).is_err());
    }

    #[tokio::test]
    async fn test_run_server_exits_on_drain() {
        let config = test_config(0);
        let server = Arc::new(HashServer::builder().hash_delay(config.hash_delay).build());
        let listener = bind_listener(&config).unwrap();

        let task_server = Arc::clone(&server);
        let handle = tokio::spawn(async move {
            run_server(task_server, listener, &config).await
        });

        server.shutdown.begin_drain();
        handle.await.unwrap().unwrap();
        assert_eq!(
            server.shutdown.state(),
            crate::shutdown::ShutdownState::Stopped
        );
    }

    #[tokio::test]
    async fn test_response_on_the_wire_before_runner_returns() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let config = test_config(0);
        let server = Arc::new(HashServer::builder().hash_delay(config.hash_delay).build());
        let listener = bind_listener(&config).unwrap();
        let addr = listener.local_addr().unwrap();

        let task_server = Arc::clone(&server);
        let handle = tokio::spawn(async move { run_server(task_server, listener, &config).await });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let body = "password=angryMonkey";
        let raw = format!(
            "POST /hash HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
             Content-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(raw.as_bytes()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        server.shutdown.begin_drain();

        // The runner returns only after the connection task finished the
        // exchange, so the full response is already on the wire here
        handle.await.unwrap().unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        let response = String::from_utf8_lossy(&buf);
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("ZEHhWB65"));
    }
}
