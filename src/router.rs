//! Router — maps an incoming OPC message to the slots of every
//! output that cares, slicing out each output's subrange without
//! touching pixel format (that stays in the worker so the hot path
//! here is allocation-light: one `to_vec()` per matched output).

use std::sync::Arc;

use crate::config::OutputConfig;
use crate::slot::Slot;
use crate::stats::OutputStats;

/// One configured output's routing target: its channel/offset/extent
/// plus the slot and counters it publishes into.
pub struct RouteTarget {
    pub config: OutputConfig,
    pub slot: Arc<Slot<Vec<u8>>>,
    pub stats: Arc<OutputStats>,
}

/// Fan-out table built once at startup from the parsed config.
pub struct Router {
    targets: Vec<RouteTarget>,
}

impl Router {
    pub fn new(targets: Vec<RouteTarget>) -> Self {
        Self { targets }
    }

    /// Route one `(channel, payload)` pair from a parsed OPC "set
    /// pixel colors" message. Non-zero-command messages are
    /// filtered out by the framer before they reach the router.
    pub fn route(&self, channel: u8, payload: &[u8]) {
        let is_broadcast = channel == 0;
        for target in &self.targets {
            if !is_broadcast && target.config.opc_channel != channel {
                continue;
            }

            let start = target.config.opc_offset * 3;
            let end = start + target.config.rgb_len();
            if end > payload.len() {
                target.stats.short_payload_skipped.increment();
                continue;
            }

            let buf = payload[start..end].to_vec();
            target.stats.received.increment();
            let replaced = target.slot.publish(buf);
            if replaced {
                target.stats.dropped_by_replacement.increment();
            }
        }
    }
}
