//! Integration tests for the parallel orchestrator.
//!
//! These tests drive `UnifiedSearch` with in-process mock sources (no
//! network calls) to check partial-failure tolerance, source selection,
//! per-source limits and call counts.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eagleeye_search::{
    NormalizedResult, SourceClient, SourceError, SourceKind, SourceRegistry, UnifiedSearch,
};

enum Behaviour {
    Return(usize),
    Fail,
    Panic,
    Sleep(Duration, usize),
}

struct MockSource {
    kind: SourceKind,
    behaviour: Behaviour,
    calls: Arc<AtomicUsize>,
}

impl MockSource {
    fn new(kind: SourceKind, behaviour: Behaviour) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Arc::new(Self {
            kind,
            behaviour,
            calls: Arc::clone(&calls),
        });
        (source, calls)
    }

    fn results(&self, n: usize) -> Vec<NormalizedResult> {
        (0..n)
            .map(|i| {
                NormalizedResult::new(
                    self.kind,
                    format!("{} result {i}", self.kind.label()),
                    format!("https://example.com/{}/{i}", self.kind),
                    "snippet",
                )
            })
            .collect()
    }
}

#[async_trait]
impl SourceClient for MockSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn try_search(
        &self,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<NormalizedResult>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Return(n) => Ok(self.results(n)),
            Behaviour::Fail => Err(SourceError::Status {
                status: 401,
                message: "invalid_auth".into(),
            }),
            Behaviour::Panic => panic!("adapter bug"),
            Behaviour::Sleep(delay, n) => {
                tokio::time::sleep(delay).await;
                Ok(self.results(n))
            }
        }
    }
}

fn orchestrator(sources: Vec<Arc<MockSource>>) -> UnifiedSearch {
    let mut registry = SourceRegistry::default();
    for source in sources {
        registry.register(source);
    }
    UnifiedSearch::new(Arc::new(registry), tokio::runtime::Handle::current())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_source_does_not_hide_others() {
    let (slack, _) = MockSource::new(SourceKind::Slack, Behaviour::Fail);
    let (notion, _) = MockSource::new(SourceKind::Notion, Behaviour::Return(2));
    let search = orchestrator(vec![slack, notion]);

    let results = search.unified_search("roadmap", Some(5), None).await;
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.source() == SourceKind::Notion));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_source_contributes_nothing() {
    let (linear, _) = MockSource::new(SourceKind::Linear, Behaviour::Panic);
    let (github, _) = MockSource::new(SourceKind::GitHub, Behaviour::Return(3));
    let search = orchestrator(vec![linear, github]);

    let results = search.unified_search("crash", Some(3), None).await;
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.source() == SourceKind::GitHub));
}

#[tokio::test]
async fn explicit_empty_selection_calls_nothing() {
    let (slack, slack_calls) = MockSource::new(SourceKind::Slack, Behaviour::Return(1));
    let (notion, notion_calls) = MockSource::new(SourceKind::Notion, Behaviour::Return(1));
    let search = orchestrator(vec![slack, notion]);

    let results = search
        .unified_search("anything", None, Some(&BTreeSet::new()))
        .await;
    assert!(results.is_empty());
    assert_eq!(slack_calls.load(Ordering::SeqCst), 0);
    assert_eq!(notion_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn no_selection_calls_every_source_once() {
    let mut sources = Vec::new();
    let mut counters = Vec::new();
    for kind in SourceKind::all() {
        let (source, calls) = MockSource::new(*kind, Behaviour::Return(1));
        sources.push(source);
        counters.push(calls);
    }
    let search = orchestrator(sources);

    let results = search.unified_search("status", None, None).await;
    assert_eq!(results.len(), 4);
    for calls in counters {
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn selection_limits_calls_to_requested_sources() {
    let (slack, slack_calls) = MockSource::new(SourceKind::Slack, Behaviour::Return(1));
    let (linear, linear_calls) = MockSource::new(SourceKind::Linear, Behaviour::Return(1));
    let search = orchestrator(vec![slack, linear]);

    let only_linear = BTreeSet::from([SourceKind::Linear]);
    let results = search
        .unified_search("bug", None, Some(&only_linear))
        .await;
    assert_eq!(results.len(), 1);
    assert_eq!(slack_calls.load(Ordering::SeqCst), 0);
    assert_eq!(linear_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn per_source_limit_is_enforced() {
    let (notion, _) = MockSource::new(SourceKind::Notion, Behaviour::Return(10));
    let (github, _) = MockSource::new(SourceKind::GitHub, Behaviour::Return(10));
    let search = orchestrator(vec![notion, github]);

    let results = search.unified_search("design", Some(2), None).await;
    assert_eq!(results.len(), 4);
    for kind in [SourceKind::Notion, SourceKind::GitHub] {
        assert_eq!(results.iter().filter(|r| r.source() == kind).count(), 2);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn results_arrive_in_completion_order() {
    let (slow, _) = MockSource::new(
        SourceKind::Slack,
        Behaviour::Sleep(Duration::from_millis(200), 1),
    );
    let (fast, _) = MockSource::new(SourceKind::Linear, Behaviour::Return(1));
    let search = orchestrator(vec![slow, fast]);

    let results = search.unified_search("q", None, None).await;
    let order: Vec<SourceKind> = results.iter().map(NormalizedResult::source).collect();
    assert_eq!(order, vec![SourceKind::Linear, SourceKind::Slack]);
}

#[tokio::test]
async fn repeated_calls_are_independent() {
    let (notion, calls) = MockSource::new(SourceKind::Notion, Behaviour::Return(2));
    let search = orchestrator(vec![notion]);

    let first = search.unified_search("q", None, None).await;
    let second = search.unified_search("q", None, None).await;
    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn all_sources_failing_yields_empty_list() {
    let (slack, _) = MockSource::new(SourceKind::Slack, Behaviour::Fail);
    let (github, _) = MockSource::new(SourceKind::GitHub, Behaviour::Fail);
    let search = orchestrator(vec![slack, github]);

    assert!(search.unified_search("q", None, None).await.is_empty());
}
