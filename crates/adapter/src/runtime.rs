//! Network runtime integration.
//!
//! Bridges the synchronous render loop with the async WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::runtime::{Builder, Runtime};
use tokio::sync::{mpsc, oneshot};

use crate::input::InputQueue;
use crate::server::{run_server, ServerConfig};
use crate::types::DisplayUpdate;

/// Running network side: owns the runtime and the display channel.
pub struct NetworkBridge {
    rt: Runtime,
    display_rx: mpsc::UnboundedReceiver<DisplayUpdate>,
    local_addr: SocketAddr,
}

impl NetworkBridge {
    /// Bind the listener and start accepting peers on a background runtime.
    ///
    /// Must be called from outside any tokio runtime. Returns once the
    /// listener is bound, or with the bind error.
    pub fn start(config: ServerConfig, queue: Arc<InputQueue>) -> Result<Self> {
        let rt = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("display-net")
            .enable_all()
            .build()?;

        let (display_tx, display_rx) = mpsc::unbounded_channel::<DisplayUpdate>();
        let (ready_tx, ready_rx) = oneshot::channel::<SocketAddr>();

        let server = rt.spawn(async move {
            let res = run_server(config, queue, display_tx, Some(ready_tx)).await;
            if let Err(e) = &res {
                log::error!("display server stopped: {:#}", e);
            }
            res
        });

        let local_addr = rt.block_on(async move {
            match ready_rx.await {
                Ok(addr) => Ok(addr),
                Err(_) => match server.await {
                    Ok(Err(e)) => Err(e),
                    Ok(Ok(())) => Err(anyhow!("display server exited before binding")),
                    Err(join) => Err(anyhow!(join)),
                },
            }
        })?;

        Ok(Self {
            rt,
            display_rx,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn try_recv(&mut self) -> Option<DisplayUpdate> {
        self.display_rx.try_recv().ok()
    }

    /// Stop accepting peers and drop every open connection.
    pub fn shutdown(self) {
        self.rt.shutdown_timeout(Duration::from_millis(500));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn start_binds_an_ephemeral_port() {
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        let mut bridge = NetworkBridge::start(config, Arc::new(InputQueue::new())).unwrap();
        assert_ne!(bridge.local_addr().port(), 0);
        assert!(bridge.try_recv().is_none());
        bridge.shutdown();
    }

    #[test]
    fn start_reports_bind_errors() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let config = ServerConfig {
            port: taken.local_addr().unwrap().port(),
            ..ServerConfig::default()
        };
        assert!(NetworkBridge::start(config, Arc::new(InputQueue::new())).is_err());
    }
}
