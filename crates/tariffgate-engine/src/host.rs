//! Host contract: how the engine hands flows back to the interception layer.
//!
//! The host must resume a released flow exactly once and kill a discarded
//! one. The scheduler guarantees it calls at most one of these per flow.

use async_trait::async_trait;
use tokio::sync::mpsc;

use tariffgate_core::FlowId;

#[async_trait]
pub trait FlowHost: Send + Sync {
    /// Resume delivery of a held response.
    async fn release(&self, flow_id: &FlowId);
    /// Kill a dropped flow.
    async fn discard(&self, flow_id: &FlowId);
}

/// Host that only logs. Used by the standalone binary.
#[derive(Debug, Default)]
pub struct TracingHost;

#[async_trait]
impl FlowHost for TracingHost {
    async fn release(&self, flow_id: &FlowId) {
        tracing::info!(flow_id = %flow_id, "release");
    }

    async fn discard(&self, flow_id: &FlowId) {
        tracing::info!(flow_id = %flow_id, "discard");
    }
}

/// Signal emitted by [`ChannelHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSignal {
    Release(FlowId),
    Discard(FlowId),
}

/// Forwards signals to a receiver owned by the host's own task.
#[derive(Debug, Clone)]
pub struct ChannelHost {
    tx: mpsc::UnboundedSender<HostSignal>,
}

impl ChannelHost {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, sig: HostSignal) {
        if self.tx.send(sig).is_err() {
            tracing::warn!("host signal receiver dropped");
        }
    }
}

#[async_trait]
impl FlowHost for ChannelHost {
    async fn release(&self, flow_id: &FlowId) {
        self.emit(HostSignal::Release(flow_id.clone()));
    }

    async fn discard(&self, flow_id: &FlowId) {
        self.emit(HostSignal::Discard(flow_id.clone()));
    }
}
