// src/proxy/mod.rs

//! Front-facing TCP proxy.
//!
//! Clients talk to the proxy port; connections are spliced through to the
//! application port. While a build is running the proxy holds new
//! connections until the build is done, and it retries connecting to the
//! application while it is starting, so clients see a slow response instead
//! of a refused connection. When the last build failed, HTTP clients get a
//! `500` carrying the compiler output.
//!
//! A connection that read `Succeeded` just before a rebuild started finds the
//! runner disarmed and goes back to waiting for that rebuild's outcome.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, error, info, warn};

use crate::errors::{DevloopError, Result};
use crate::exec::Runner;
use crate::types::BuildStatus;

const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Address the proxy listens on.
    pub listen: SocketAddr,
    /// Address of the application.
    pub upstream: SocketAddr,
    /// How long a connection waits for a build to finish.
    pub build_wait: Duration,
    /// How long a connection waits for the application to accept.
    pub connect_timeout: Duration,
}

impl ProxyConfig {
    /// Listen on all interfaces at `port`, forward to `127.0.0.1:app_port`.
    pub fn new(port: u16, app_port: u16) -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], port)),
            upstream: SocketAddr::from(([127, 0, 0, 1], app_port)),
            build_wait: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

pub struct Proxy {
    listener: TcpListener,
    config: Arc<ProxyConfig>,
    runner: Arc<dyn Runner>,
    status: watch::Receiver<BuildStatus>,
}

impl Proxy {
    /// Bind the listening socket. Failing to bind is fatal for the caller.
    pub async fn bind(
        config: ProxyConfig,
        runner: Arc<dyn Runner>,
        status: watch::Receiver<BuildStatus>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(config.listen)
            .await
            .map_err(|source| DevloopError::ProxyBind {
                port: config.listen.port(),
                source,
            })?;

        Ok(Self {
            listener,
            config: Arc::new(config),
            runner,
            status,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop on a background task and return immediately.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(upstream = %self.config.upstream, "proxy accepting connections");

            loop {
                let (inbound, peer) = match self.listener.accept().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept proxy connection");
                        continue;
                    }
                };

                let config = Arc::clone(&self.config);
                let runner = Arc::clone(&self.runner);
                let status = self.status.clone();
                tokio::spawn(async move {
                    if let Err(e) = serve_connection(inbound, &config, runner, status).await {
                        debug!(%peer, error = %e, "proxy connection ended with error");
                    }
                });
            }
        })
    }
}

async fn serve_connection(
    mut inbound: TcpStream,
    config: &ProxyConfig,
    runner: Arc<dyn Runner>,
    mut status: watch::Receiver<BuildStatus>,
) -> Result<()> {
    let deadline = Instant::now() + config.build_wait;

    loop {
        // Clone out of the watch guard right away; holding it would block the
        // coordinator's next status update.
        let settled = timeout_at(
            deadline,
            status.wait_for(|s| *s != BuildStatus::Building),
        )
        .await
        .map(|res| res.map(|guard| (*guard).clone()));

        let current = match settled {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                // Sender dropped: the rebuild loop is gone.
                return Ok(());
            }
            Err(_) => {
                return reply(&mut inbound, 503, "devloop: still building, try again").await;
            }
        };

        if let BuildStatus::Failed(diagnostics) = current {
            let body = format!("devloop: build failed\n\n{diagnostics}\n");
            return reply(&mut inbound, 500, &body).await;
        }

        match runner.run().await {
            Ok(true) => break,
            Ok(false) => {
                // A rebuild disarmed the runner after the status was read.
                // Wait for that rebuild to publish its result.
                debug!("application start refused; waiting for the running rebuild");
                match timeout_at(deadline, status.changed()).await {
                    Ok(Ok(())) => continue,
                    Ok(Err(_)) => return Ok(()),
                    Err(_) => {
                        return reply(&mut inbound, 503, "devloop: still building, try again")
                            .await;
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "failed to start application for proxied request");
                return reply(&mut inbound, 502, "devloop: application failed to start").await;
            }
        }
    }

    let Some(mut outbound) = connect_with_retry(config.upstream, config.connect_timeout).await
    else {
        warn!(upstream = %config.upstream, "application did not accept connections in time");
        return reply(&mut inbound, 502, "devloop: application is not accepting connections").await;
    };

    let (up, down) = tokio::io::copy_bidirectional(&mut inbound, &mut outbound).await?;
    debug!(bytes_up = up, bytes_down = down, "proxy connection closed");
    Ok(())
}

async fn connect_with_retry(addr: SocketAddr, limit: Duration) -> Option<TcpStream> {
    let deadline = Instant::now() + limit;
    loop {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Some(stream),
            Err(e) if Instant::now() < deadline => {
                debug!(error = %e, "application not ready; retrying");
                sleep(CONNECT_RETRY_DELAY).await;
            }
            Err(_) => return None,
        }
    }
}

async fn reply(stream: &mut TcpStream, code: u16, body: &str) -> Result<()> {
    let reason = match code {
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Error",
    };
    let response = format!(
        "HTTP/1.1 {code} {reason}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}
