use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use tokio::task::JoinHandle;

use tariffgate_core::error::{Result, TariffError};
use tariffgate_core::{Decision, FlowId, FlowMeta, RetainStatus, RetainedFlow};

use crate::host::FlowHost;
use crate::obs::EngineMetrics;

struct Entry {
    flow: RetainedFlow,
    // Registration number; a timer only claims the entry it was armed for.
    seq: u64,
    timer: Option<JoinHandle<()>>,
}

struct Inner {
    flows: DashMap<FlowId, Entry>,
    seq: AtomicU64,
    host: Arc<dyn FlowHost>,
    metrics: Arc<EngineMetrics>,
}

impl Inner {
    /// The single claim step shared by the timer, external completion and clear.
    /// Whoever removes the entry owns the outcome.
    fn claim_held(&self, flow_id: &FlowId, seq: Option<u64>) -> Option<Entry> {
        let (_, entry) = self.flows.remove_if(flow_id, |_, e| {
            e.flow.status == RetainStatus::Held && seq.map_or(true, |s| s == e.seq)
        })?;
        self.metrics.flows_retained.dec();
        Some(entry)
    }
}

/// Tracks held and dropped flows and releases held ones when their timer fires.
///
/// Cheap to clone; clones share the same table. Timers are tokio tasks, so
/// [`register`](Self::register) must run inside a tokio runtime.
#[derive(Clone)]
pub struct RetentionScheduler {
    inner: Arc<Inner>,
}

impl RetentionScheduler {
    pub fn new(host: Arc<dyn FlowHost>, metrics: Arc<EngineMetrics>) -> Self {
        Self {
            inner: Arc::new(Inner {
                flows: DashMap::new(),
                seq: AtomicU64::new(1),
                host,
                metrics,
            }),
        }
    }

    /// Record a Drop or Hold decision for a flow.
    ///
    /// Drop: stores an audit record and tells the host to discard the flow.
    /// Hold: stores a held record and arms its release timer.
    /// Pass: nothing to retain.
    ///
    /// A flow id that is still tracked is rejected with `DuplicateFlow` and
    /// the table is left as it was.
    pub async fn register(&self, meta: FlowMeta, decision: Decision) -> Result<()> {
        let flow = match decision {
            Decision::Pass => return Ok(()),
            Decision::Drop => RetainedFlow::dropped(meta),
            Decision::Hold(d) => RetainedFlow::held(meta, d),
        };
        let flow_id = flow.flow_id().clone();
        let seq = self.inner.seq.fetch_add(1, Ordering::Relaxed);

        match self.inner.flows.entry(flow_id.clone()) {
            MapEntry::Occupied(_) => {
                tracing::warn!(flow_id = %flow_id, "flow registered twice");
                self.inner.metrics.duplicate_flows.inc(&[]);
                return Err(TariffError::DuplicateFlow(flow_id));
            }
            MapEntry::Vacant(v) => {
                // Counted before the entry is visible, so a racing claim never
                // decrements first.
                if flow.is_held() {
                    self.inner.metrics.flows_retained.inc();
                }
                v.insert(Entry {
                    flow,
                    seq,
                    timer: None,
                });
            }
        }

        match decision {
            Decision::Hold(d) => {
                self.inner.metrics.hold_duration.observe(&[], d);
                self.arm(flow_id, seq, d);
            }
            _ => {
                tracing::info!(flow_id = %flow_id, "flow dropped");
                self.inner.host.discard(&flow_id).await;
            }
        }
        Ok(())
    }

    fn arm(&self, flow_id: FlowId, seq: u64, hold: Duration) {
        let inner = Arc::clone(&self.inner);
        let id = flow_id.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            if inner.claim_held(&id, Some(seq)).is_some() {
                inner.metrics.releases.inc(&[("outcome", "released")]);
                tracing::info!(flow_id = %id, hold_ms = hold.as_millis() as u64, "held flow released");
                inner.host.release(&id).await;
            }
        });

        // The entry may already be gone: cancelled, cleared, or claimed by this
        // very task, which may be mid-release. Detach rather than abort; a task
        // that lost its entry fails the seq check and does nothing.
        if let Some(mut e) = self.inner.flows.get_mut(&flow_id) {
            if e.seq == seq {
                e.timer = Some(handle);
            }
        }
    }

    /// The host finished the flow on its own. Cancels the timer without releasing.
    ///
    /// Returns whether a held flow was cancelled; unknown or already released
    /// flows are a no-op. Dropped audit records are left for [`clear`](Self::clear).
    pub fn notify_external_completion(&self, flow_id: &FlowId) -> bool {
        let Some(entry) = self.inner.claim_held(flow_id, None) else {
            return false;
        };
        if let Some(timer) = entry.timer {
            timer.abort();
        }
        self.inner.metrics.releases.inc(&[("outcome", "cancelled")]);
        tracing::debug!(flow_id = %flow_id, "held flow completed externally");
        true
    }

    /// Snapshot of every tracked flow, oldest first.
    pub fn list_retained(&self) -> Vec<RetainedFlow> {
        let mut out: Vec<RetainedFlow> = self.inner.flows.iter().map(|e| e.value().flow.clone()).collect();
        out.sort_by(|a, b| {
            a.meta
                .received_at
                .cmp(&b.meta.received_at)
                .then_with(|| a.meta.flow_id.cmp(&b.meta.flow_id))
        });
        out
    }

    pub fn get(&self, flow_id: &FlowId) -> Option<RetainedFlow> {
        self.inner.flows.get(flow_id).map(|e| e.value().flow.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.flows.is_empty()
    }

    /// Drain the table. Pending timers are aborted and their releases forfeited.
    pub fn clear(&self) -> usize {
        let mut drained = 0usize;
        let mut held = 0i64;
        self.inner.flows.retain(|_, e| {
            if let Some(timer) = e.timer.take() {
                timer.abort();
            }
            if e.flow.is_held() {
                held += 1;
            }
            drained += 1;
            false
        });

        self.inner.metrics.flows_retained.sub(held);
        self.inner.metrics.releases.add(&[("outcome", "cleared")], held as u64);
        tracing::info!(drained, held, "retained flows cleared");
        drained
    }
}
