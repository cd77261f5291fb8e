//! Retention scheduler lifecycle on virtual time.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;

use tariffgate_core::{CountryCode, Decision, FlowId, FlowMeta, RetainStatus};
use tariffgate_engine::obs::EngineMetrics;
use tariffgate_engine::{ChannelHost, FlowHost, HostSignal, RetentionScheduler};

fn scheduler() -> (RetentionScheduler, UnboundedReceiver<HostSignal>, Arc<EngineMetrics>) {
    let (host, rx) = ChannelHost::new();
    let metrics = Arc::new(EngineMetrics::default());
    (RetentionScheduler::new(Arc::new(host), Arc::clone(&metrics)), rx, metrics)
}

fn meta(id: &str) -> FlowMeta {
    FlowMeta {
        flow_id: FlowId::from(id),
        request_url: format!("https://origin.test/{id}"),
        response_size: 1024,
        source_ip: IpAddr::from([203, 0, 113, 5]),
        source_country: Some(CountryCode::parse("XX").unwrap()),
        client_ip: IpAddr::from([10, 0, 0, 9]),
        received_at: Utc::now(),
        round_trip_time: Duration::from_millis(150),
    }
}

/// Host whose release suspends before it finishes, like a real proxy resume.
#[derive(Default)]
struct YieldingHost {
    started: AtomicUsize,
    finished: AtomicUsize,
}

#[async_trait::async_trait]
impl FlowHost for YieldingHost {
    async fn release(&self, _flow_id: &FlowId) {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    async fn discard(&self, _flow_id: &FlowId) {}
}

fn hold(ms: u64) -> Decision {
    Decision::Hold(Duration::from_millis(ms))
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn timer_releases_exactly_once() {
    let (sched, mut rx, metrics) = scheduler();
    sched.register(meta("f1"), hold(300)).await.unwrap();

    let listed = sched.list_retained();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, RetainStatus::Held);
    assert_eq!(listed[0].retain_duration, Some(Duration::from_millis(300)));

    sleep_ms(250).await;
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(sched.len(), 1);

    sleep_ms(100).await;
    assert_eq!(rx.try_recv().unwrap(), HostSignal::Release(FlowId::from("f1")));
    assert!(sched.list_retained().is_empty());

    sleep_ms(1000).await;
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(metrics.flows_retained.get(), 0);
    assert_eq!(metrics.releases.get(&[("outcome", "released")]), 1);
}

#[tokio::test(start_paused = true)]
async fn external_completion_cancels_release() {
    let (sched, mut rx, metrics) = scheduler();
    sched.register(meta("f1"), hold(300)).await.unwrap();

    sleep_ms(100).await;
    assert!(sched.notify_external_completion(&FlowId::from("f1")));
    assert!(sched.list_retained().is_empty());

    // idempotent
    assert!(!sched.notify_external_completion(&FlowId::from("f1")));
    assert!(!sched.notify_external_completion(&FlowId::from("never-seen")));

    sleep_ms(1000).await;
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(metrics.flows_retained.get(), 0);
    assert_eq!(metrics.releases.get(&[("outcome", "cancelled")]), 1);
}

#[tokio::test(start_paused = true)]
async fn completion_after_release_is_noop() {
    let (sched, mut rx, _) = scheduler();
    sched.register(meta("f1"), hold(50)).await.unwrap();

    sleep_ms(60).await;
    assert_eq!(rx.try_recv().unwrap(), HostSignal::Release(FlowId::from("f1")));
    assert!(!sched.notify_external_completion(&FlowId::from("f1")));
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn zero_hold_releases_immediately() {
    let (sched, mut rx, _) = scheduler();
    sched.register(meta("f0"), Decision::Hold(Duration::ZERO)).await.unwrap();

    sleep_ms(1).await;
    assert_eq!(rx.try_recv().unwrap(), HostSignal::Release(FlowId::from("f0")));
    assert!(sched.is_empty());
}

#[tokio::test(start_paused = true)]
async fn drop_discards_and_keeps_audit_record() {
    let (sched, mut rx, metrics) = scheduler();
    sched.register(meta("d1"), Decision::Drop).await.unwrap();

    assert_eq!(rx.try_recv().unwrap(), HostSignal::Discard(FlowId::from("d1")));

    let rec = sched.get(&FlowId::from("d1")).unwrap();
    assert_eq!(rec.status, RetainStatus::Dropped);
    assert_eq!(rec.retain_duration, None);

    // Not a held flow: external completion does not touch it.
    assert!(!sched.notify_external_completion(&FlowId::from("d1")));
    sleep_ms(10_000).await;
    assert_eq!(sched.len(), 1);
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(metrics.flows_retained.get(), 0);
}

#[tokio::test(start_paused = true)]
async fn pass_is_not_retained() {
    let (sched, mut rx, _) = scheduler();
    sched.register(meta("p1"), Decision::Pass).await.unwrap();
    assert!(sched.is_empty());
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn duplicate_registration_is_rejected() {
    let (sched, mut rx, _) = scheduler();
    sched.register(meta("f1"), hold(300)).await.unwrap();

    let mut other = meta("f1");
    other.request_url = "https://other.test/".into();
    let err = sched.register(other, Decision::Drop).await.unwrap_err();
    assert_eq!(err.code().as_str(), "DUPLICATE_FLOW");

    let listed = sched.list_retained();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].meta.request_url, "https://origin.test/f1");
    assert_eq!(listed[0].status, RetainStatus::Held);
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

    sleep_ms(400).await;
    assert_eq!(rx.try_recv().unwrap(), HostSignal::Release(FlowId::from("f1")));
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn clear_forfeits_pending_releases() {
    let (sched, mut rx, metrics) = scheduler();
    sched.register(meta("a"), hold(200)).await.unwrap();
    sched.register(meta("b"), hold(400)).await.unwrap();
    sched.register(meta("c"), Decision::Drop).await.unwrap();
    assert_eq!(rx.try_recv().unwrap(), HostSignal::Discard(FlowId::from("c")));

    assert_eq!(sched.clear(), 3);
    assert!(sched.list_retained().is_empty());

    sleep_ms(1000).await;
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(metrics.flows_retained.get(), 0);
    assert_eq!(metrics.releases.get(&[("outcome", "cleared")]), 2);
}

#[tokio::test(start_paused = true)]
async fn flow_id_can_be_reused_after_release() {
    let (sched, mut rx, _) = scheduler();
    sched.register(meta("f1"), hold(10)).await.unwrap();
    sleep_ms(20).await;
    assert_eq!(rx.try_recv().unwrap(), HostSignal::Release(FlowId::from("f1")));

    sched.register(meta("f1"), hold(10)).await.unwrap();
    sleep_ms(20).await;
    assert_eq!(rx.try_recv().unwrap(), HostSignal::Release(FlowId::from("f1")));
}

#[tokio::test(start_paused = true)]
async fn listing_is_oldest_first() {
    let (sched, _rx, _) = scheduler();
    let mut late = meta("late");
    late.received_at = Utc::now() + chrono::Duration::seconds(5);
    sched.register(late, hold(1000)).await.unwrap();
    sched.register(meta("early"), hold(1000)).await.unwrap();

    let ids: Vec<String> = sched
        .list_retained()
        .iter()
        .map(|f| f.flow_id().to_string())
        .collect();
    assert_eq!(ids, ["early", "late"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_completion_and_timer_release_at_most_once() {
    let (sched, mut rx, metrics) = scheduler();
    let n = 200;
    for i in 0..n {
        sched.register(meta(&format!("r{i}")), hold(5)).await.unwrap();
    }

    let mut tasks = Vec::new();
    for i in 0..n {
        let sched = sched.clone();
        tasks.push(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            sched.notify_external_completion(&FlowId::from(format!("r{i}")))
        }));
    }
    let mut cancelled = 0;
    for t in tasks {
        if t.await.unwrap() {
            cancelled += 1;
        }
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut released = 0;
    while let Ok(sig) = rx.try_recv() {
        assert!(matches!(sig, HostSignal::Release(_)));
        released += 1;
    }

    assert_eq!(cancelled + released, n);
    assert!(sched.is_empty());
    assert_eq!(metrics.flows_retained.get(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn claimed_release_runs_to_completion() {
    let host = Arc::new(YieldingHost::default());
    let metrics = Arc::new(EngineMetrics::default());
    let sched = RetentionScheduler::new(host.clone(), Arc::clone(&metrics));

    let n = 2000;
    for i in 0..n {
        sched.register(meta(&format!("z{i}")), Decision::Hold(Duration::ZERO)).await.unwrap();
    }

    for _ in 0..500 {
        if host.finished.load(Ordering::SeqCst) == n {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(host.started.load(Ordering::SeqCst), n);
    assert_eq!(host.finished.load(Ordering::SeqCst), n);
    assert!(sched.is_empty());
    assert_eq!(metrics.releases.get(&[("outcome", "released")]), n as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn retained_gauge_never_dips_below_zero() {
    let (sched, _rx, metrics) = scheduler();
    let n = 500;

    let canceller = {
        let sched = sched.clone();
        let metrics = Arc::clone(&metrics);
        tokio::spawn(async move {
            let mut lowest = 0;
            let mut cancelled = 0;
            while cancelled < n {
                for i in 0..n {
                    if sched.notify_external_completion(&FlowId::from(format!("g{i}"))) {
                        cancelled += 1;
                    }
                    lowest = lowest.min(metrics.flows_retained.get());
                }
                tokio::task::yield_now().await;
            }
            lowest
        })
    };

    for i in 0..n {
        sched.register(meta(&format!("g{i}")), hold(60_000)).await.unwrap();
    }

    assert_eq!(canceller.await.unwrap(), 0);
    assert_eq!(metrics.flows_retained.get(), 0);
    assert!(sched.is_empty());
}
