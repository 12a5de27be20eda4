//! Top-level wiring: owns the router, one slot/stats/worker
//! thread per configured output, the stats ticker, and the TCP
//! acceptor. `Bridge::run` drives everything until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::router::{RouteTarget, Router};
use crate::slot::Slot;
use crate::stats::{OutputStats, StatsTicker};

const STATS_INTERVAL: Duration = Duration::from_secs(5);

pub struct Bridge {
    addr: SocketAddr,
    router: Arc<Router>,
    slots: Vec<Arc<Slot<Vec<u8>>>>,
    worker_handles: Vec<std::thread::JoinHandle<()>>,
    _ticker: StatsTicker,
}

impl Bridge {
    /// Build every output's slot, stats, and worker thread from
    /// `config`, then wire the router on top (everything below the
    /// router exists before it does).
    pub fn new(config: BridgeConfig) -> Self {
        let mut targets = Vec::with_capacity(config.outputs.len());
        let mut slots = Vec::with_capacity(config.outputs.len());
        let mut worker_handles = Vec::with_capacity(config.outputs.len());
        let mut ticker_inputs = Vec::with_capacity(config.outputs.len());

        for output in config.outputs {
            let slot: Arc<Slot<Vec<u8>>> = Arc::new(Slot::new());
            let stats = Arc::new(OutputStats::default());

            worker_handles.push(crate::worker::spawn(output.clone(), slot.clone(), stats.clone()));
            ticker_inputs.push((output.port_name.clone(), stats.clone()));
            slots.push(slot.clone());
            targets.push(RouteTarget { config: output, slot, stats });
        }

        let router = Arc::new(Router::new(targets));
        let ticker = StatsTicker::spawn(ticker_inputs, STATS_INTERVAL);

        Self {
            addr: SocketAddr::new(config.opc_host, config.opc_port),
            router,
            slots,
            worker_handles,
            _ticker: ticker,
        }
    }

    /// Serve OPC connections until `shutdown` fires, then close every
    /// output's slot and join its worker thread.
    pub async fn run(mut self, shutdown: tokio::sync::watch::Receiver<bool>) -> Result<()> {
        let result = crate::acceptor::serve(self.addr, self.router.clone(), shutdown).await;

        info!("bridge shutting down, closing {} output(s)", self.slots.len());
        for slot in &self.slots {
            slot.close();
        }
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }

        result
    }
}
