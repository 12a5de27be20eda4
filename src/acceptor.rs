//! TCP acceptor — one async task per accepted connection, each
//! owning its own [`Framer`](crate::opc::framer::Framer). Connections
//! never share framer state, so a malformed stream on one socket
//! can't desync another.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::net::{TcpListener, TcpStream};

use crate::error::{Error, Result};
use crate::opc::framer::Framer;
use crate::opc::message::CMD_SET_PIXEL_COLORS;
use crate::router::Router;

/// Bind and serve OPC connections until `shutdown` fires.
pub async fn serve(
    addr: SocketAddr,
    router: Arc<Router>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> Result<()> {
    let listener = TcpListener::bind(addr).await.map_err(Error::Bind)?;
    info!("listening for OPC connections on {addr}");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!("accept failed: {e}");
                        continue;
                    }
                };
                let router = router.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(handle_connection(stream, peer, router, shutdown));
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("acceptor shutting down");
                    return Ok(());
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    router: Arc<Router>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    debug!("connection opened: {peer}");
    let mut framer = Framer::new();

    loop {
        let message = tokio::select! {
            result = framer.next_message(&mut stream) => result,
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
                continue;
            }
        };

        match message {
            Ok(Some(message)) => {
                if message.command == CMD_SET_PIXEL_COLORS {
                    router.route(message.channel, &message.payload);
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!("connection {peer} closed: {e}");
                break;
            }
        }
    }
    debug!("connection closed: {peer}");
}
