use async_trait::async_trait;
use presscore::{
    ExecutionEvent, FlowError, LogStatus, Node, NodeContext, NodeError, NodeHandler, NodeId,
    NodeKind, Payload, RunError, RunState, WorkflowError,
};
use pressruntime::{
    FlowRuntime, GraphStore, NodeFactory, NodeRegistry, RunHandle, RuntimeConfig, WorkflowRunner,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Behavior = dyn Fn(&NodeContext) -> Result<Payload, NodeError> + Send + Sync;

/// Handler whose behavior is a closure; records every input it sees.
struct StubHandler {
    kind: NodeKind,
    behavior: Box<Behavior>,
    calls: AtomicUsize,
    inputs: Mutex<Vec<Payload>>,
}

impl StubHandler {
    fn new(
        kind: NodeKind,
        behavior: impl Fn(&NodeContext) -> Result<Payload, NodeError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            kind,
            behavior: Box::new(behavior),
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        })
    }

    fn writes(kind: NodeKind, key: &'static str, value: &'static str) -> Arc<Self> {
        Self::new(kind, move |ctx| Ok(ctx.output().with(key, value)))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn inputs(&self) -> Vec<Payload> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl NodeHandler for StubHandler {
    fn kind(&self) -> NodeKind {
        self.kind.clone()
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(ctx.input.clone());
        (self.behavior)(&ctx)
    }
}

struct StubFactory(Arc<StubHandler>);

impl NodeFactory for StubFactory {
    fn create(&self) -> Arc<dyn NodeHandler> {
        self.0.clone()
    }

    fn kind(&self) -> NodeKind {
        self.0.kind.clone()
    }
}

fn registry_with(handlers: &[Arc<StubHandler>]) -> Arc<NodeRegistry> {
    let mut registry = NodeRegistry::new();
    for handler in handlers {
        registry.register(Arc::new(StubFactory(handler.clone())));
    }
    Arc::new(registry)
}

fn trigger_stub() -> Arc<StubHandler> {
    StubHandler::new(NodeKind::Trigger, |ctx| Ok(ctx.output().with("triggered", true)))
}

fn node(id: &str, kind: NodeKind, connected: &[&str]) -> Node {
    let mut node = Node::new(kind).with_id(id).with_label(id.to_uppercase());
    node.connected = connected.iter().map(|c| NodeId::from(*c)).collect();
    node
}

fn runner(nodes: Vec<Node>, registry: Arc<NodeRegistry>) -> WorkflowRunner {
    WorkflowRunner::new(nodes, registry, &RuntimeConfig::default())
}

#[tokio::test]
async fn test_empty_graph_is_rejected() {
    let trigger = trigger_stub();
    let runner = runner(vec![], registry_with(&[trigger.clone()]));

    let result = runner.run().await;

    assert!(matches!(result, Err(FlowError::Workflow(WorkflowError::EmptyGraph))));
    assert_eq!(trigger.calls(), 0);
    assert_eq!(runner.handle().state(), RunState::Idle);
}

#[tokio::test]
async fn test_graph_without_trigger_is_rejected() {
    let scraper = StubHandler::writes(NodeKind::ContentScraper, "scraped", "yes");
    let nodes = vec![node("a", NodeKind::ContentScraper, &[])];
    let runner = runner(nodes, registry_with(&[scraper.clone()]));

    let result = runner.run().await;

    assert!(matches!(result, Err(FlowError::Workflow(WorkflowError::NoTrigger))));
    assert_eq!(scraper.calls(), 0);
    assert!(runner.trace().is_empty());
}

#[tokio::test]
async fn test_linear_chain_threads_payload_in_order() {
    let a = StubHandler::new(NodeKind::ContentScraper, |ctx| {
        Ok(ctx.output().with("fromA", 1).with("shared", "A"))
    });
    let b = StubHandler::new(NodeKind::AiContentProcessor, |ctx| {
        Ok(ctx.output().with("fromB", 2).with("shared", "B"))
    });
    let c = StubHandler::writes(NodeKind::Publisher, "published", "yes");
    let registry = registry_with(&[trigger_stub(), a, b, c.clone()]);

    let nodes = vec![
        node("t", NodeKind::Trigger, &["a"]),
        node("a", NodeKind::ContentScraper, &["b"]),
        node("b", NodeKind::AiContentProcessor, &["c"]),
        node("c", NodeKind::Publisher, &[]),
    ];
    let report = runner(nodes, registry).run().await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.executed, 4);

    let steps: Vec<(String, LogStatus)> = report
        .trace
        .iter()
        .filter(|e| e.node_id.as_str() != "t")
        .map(|e| (e.node_id.to_string(), e.status))
        .collect();
    assert_eq!(
        steps,
        vec![
            ("a".to_string(), LogStatus::Running),
            ("a".to_string(), LogStatus::Completed),
            ("b".to_string(), LogStatus::Running),
            ("b".to_string(), LogStatus::Completed),
            ("c".to_string(), LogStatus::Running),
            ("c".to_string(), LogStatus::Completed),
        ]
    );

    let c_input = &c.inputs()[0];
    assert_eq!(c_input.get("triggered"), Some(&json!(true)));
    assert_eq!(c_input.get("fromA"), Some(&json!(1)));
    assert_eq!(c_input.get("fromB"), Some(&json!(2)));
    assert_eq!(c_input.get("shared"), Some(&json!("B")));

    let final_payload = report.final_payload().unwrap();
    assert_eq!(final_payload.get_str("published"), Some("yes"));
}

#[tokio::test]
async fn test_branches_get_isolated_copies() {
    let a = StubHandler::writes(NodeKind::ContentScraper, "mutatedByA", "yes");
    let b = StubHandler::writes(NodeKind::Publisher, "fromB", "yes");
    let registry = registry_with(&[trigger_stub(), a.clone(), b.clone()]);

    let nodes = vec![
        node("t", NodeKind::Trigger, &["a", "b"]),
        node("a", NodeKind::ContentScraper, &[]),
        node("b", NodeKind::Publisher, &[]),
    ];
    let report = runner(nodes, registry).run().await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    let trigger_output = Payload::new().with("triggered", true);
    assert_eq!(a.inputs(), vec![trigger_output.clone()]);
    assert_eq!(b.inputs(), vec![trigger_output]);
    assert!(!b.inputs()[0].contains_key("mutatedByA"));
    assert_eq!(report.outputs.len(), 2);
}

#[tokio::test]
async fn test_failure_aborts_only_its_branch() {
    let failing = StubHandler::new(NodeKind::ContentScraper, |_| {
        Err(NodeError::Configuration("No URLs configured".to_string()))
    });
    let after_failure = StubHandler::writes(NodeKind::Translator, "translated", "yes");
    let sibling = StubHandler::writes(NodeKind::Publisher, "published", "yes");
    let registry = registry_with(&[
        trigger_stub(),
        failing,
        after_failure.clone(),
        sibling.clone(),
    ]);

    let nodes = vec![
        node("t", NodeKind::Trigger, &["a", "b"]),
        node("a", NodeKind::ContentScraper, &["x"]),
        node("x", NodeKind::Translator, &[]),
        node("b", NodeKind::Publisher, &[]),
    ];
    let report = runner(nodes, registry).run().await.unwrap();

    assert_eq!(report.state, RunState::Failed);
    assert_eq!(sibling.calls(), 1);
    assert_eq!(after_failure.calls(), 0);

    match &report.error {
        Some(RunError::NodeFailed { node_id, label, message }) => {
            assert_eq!(node_id, "a");
            assert_eq!(label, "A");
            assert!(message.contains("No URLs configured"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let errors: Vec<_> = report
        .trace
        .iter()
        .filter(|e| e.status == LogStatus::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].node_id.as_str(), "a");
    assert!(report.clone().into_result().is_err());
}

#[tokio::test]
async fn test_node_reached_twice_runs_twice() {
    let a = StubHandler::writes(NodeKind::ContentScraper, "via", "a");
    let b = StubHandler::writes(NodeKind::FeedAggregator, "via", "b");
    let c = StubHandler::writes(NodeKind::Publisher, "published", "yes");
    let registry = registry_with(&[trigger_stub(), a, b, c.clone()]);

    let nodes = vec![
        node("t", NodeKind::Trigger, &["a", "b"]),
        node("a", NodeKind::ContentScraper, &["c"]),
        node("b", NodeKind::FeedAggregator, &["c"]),
        node("c", NodeKind::Publisher, &[]),
    ];
    let report = runner(nodes, registry).run().await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(c.calls(), 2);
    let vias: Vec<_> = c
        .inputs()
        .iter()
        .map(|p| p.get_str("via").unwrap().to_string())
        .collect();
    assert_eq!(vias, vec!["a", "b"]);
}

#[tokio::test]
async fn test_cycle_is_not_followed_forever() {
    let a = StubHandler::writes(NodeKind::AiContentProcessor, "a", "1");
    let b = StubHandler::writes(NodeKind::Translator, "b", "1");
    let registry = registry_with(&[trigger_stub(), a.clone(), b.clone()]);

    let nodes = vec![
        node("t", NodeKind::Trigger, &["a"]),
        node("a", NodeKind::AiContentProcessor, &["b"]),
        node("b", NodeKind::Translator, &["a"]),
    ];
    let report = runner(nodes, registry).run().await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 1);
    let skipped: Vec<_> = report
        .trace
        .iter()
        .filter(|e| e.status == LogStatus::Skipped)
        .collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].node_id.as_str(), "a");
}

#[tokio::test]
async fn test_unknown_kind_passes_through() {
    let registry = registry_with(&[trigger_stub()]);
    let nodes = vec![
        node("t", NodeKind::Trigger, &["legacy"]),
        node("legacy", NodeKind::from("legacy-exporter"), &[]),
    ];
    let report = runner(nodes, registry).run().await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    let completed = report
        .trace
        .iter()
        .find(|e| e.node_id.as_str() == "legacy" && e.status == LogStatus::Completed)
        .unwrap();
    assert!(completed.message.contains("no specific behavior"));
    assert_eq!(
        report.final_payload(),
        Some(&Payload::new().with("triggered", true))
    );
}

#[tokio::test]
async fn test_dangling_edge_is_skipped() {
    let registry = registry_with(&[trigger_stub()]);
    let nodes = vec![node("t", NodeKind::Trigger, &["gone"])];

    let report = runner(nodes, registry).run().await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.executed, 1);
}

#[tokio::test]
async fn test_stop_discards_in_flight_result() {
    let slot: Arc<Mutex<Option<RunHandle>>> = Arc::new(Mutex::new(None));
    let stopper_slot = slot.clone();
    let stopping = StubHandler::new(NodeKind::ContentScraper, move |ctx| {
        if let Some(handle) = stopper_slot.lock().unwrap().as_ref() {
            handle.stop();
        }
        Ok(ctx.output().with("late", "result"))
    });
    let downstream = StubHandler::writes(NodeKind::Publisher, "published", "yes");
    let registry = registry_with(&[trigger_stub(), stopping, downstream.clone()]);

    let nodes = vec![
        node("t", NodeKind::Trigger, &["a"]),
        node("a", NodeKind::ContentScraper, &["p"]),
        node("p", NodeKind::Publisher, &[]),
    ];
    let runner = runner(nodes, registry);
    *slot.lock().unwrap() = Some(runner.handle());

    let report = runner.run().await.unwrap();

    assert_eq!(report.state, RunState::Stopped);
    assert_eq!(report.error, Some(RunError::Stopped));
    assert_eq!(downstream.calls(), 0);
    assert!(!report
        .trace
        .iter()
        .any(|e| e.node_id.as_str() == "a" && e.status == LogStatus::Completed));
    assert_eq!(runner.handle().state(), RunState::Stopped);
}

#[tokio::test]
async fn test_stop_before_run_visits_nothing() {
    let trigger = trigger_stub();
    let runner = runner(
        vec![node("t", NodeKind::Trigger, &[])],
        registry_with(&[trigger.clone()]),
    );
    runner.handle().stop();

    let report = runner.run().await.unwrap();

    assert_eq!(report.state, RunState::Stopped);
    assert_eq!(trigger.calls(), 0);
}

struct SlowHandler;

#[async_trait]
impl NodeHandler for SlowHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::DeepResearch
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(ctx.input)
    }
}

struct SlowFactory;

impl NodeFactory for SlowFactory {
    fn create(&self) -> Arc<dyn NodeHandler> {
        Arc::new(SlowHandler)
    }

    fn kind(&self) -> NodeKind {
        NodeKind::DeepResearch
    }
}

#[tokio::test]
async fn test_node_timeout_fails_the_run() {
    let mut registry = NodeRegistry::new();
    registry.register(Arc::new(StubFactory(trigger_stub())));
    registry.register(Arc::new(SlowFactory));
    let config = RuntimeConfig {
        node_timeout: Some(Duration::from_millis(20)),
        ..RuntimeConfig::default()
    };

    let nodes = vec![
        node("t", NodeKind::Trigger, &["r"]),
        node("r", NodeKind::DeepResearch, &[]),
    ];
    let report = WorkflowRunner::new(nodes, Arc::new(registry), &config)
        .run()
        .await
        .unwrap();

    assert_eq!(report.state, RunState::Failed);
    assert!(matches!(
        report.error,
        Some(RunError::NodeFailed { ref node_id, ref message, .. })
            if node_id == "r" && message == "Timeout after 20ms"
    ));
}

#[tokio::test]
async fn test_runner_executes_only_once() {
    let trigger = trigger_stub();
    let runner = runner(
        vec![node("t", NodeKind::Trigger, &[])],
        registry_with(&[trigger.clone()]),
    );

    let report = runner.run().await.unwrap();
    assert_eq!(report.executed, 1);

    let again = runner.run().await;
    assert!(matches!(again, Err(FlowError::Workflow(WorkflowError::AlreadyRun))));
    assert_eq!(trigger.calls(), 1);
    assert_eq!(runner.handle().state(), RunState::Completed);
}

#[tokio::test]
async fn test_runner_uses_snapshot_of_store() {
    let publisher = StubHandler::writes(NodeKind::Publisher, "published", "yes");
    let runtime = FlowRuntime::with_registry(
        registry_with(&[trigger_stub(), publisher.clone()]),
        RuntimeConfig::default(),
    );

    let mut store = GraphStore::new();
    let t = store.add_node(NodeKind::Trigger).id;
    let p = store.add_node(NodeKind::Publisher).id;
    store.connect(&t, &p);

    let runner = runtime.runner(&store);
    store.delete_node(&p);
    store.clear();

    let report = runner.run().await.unwrap();
    assert_eq!(report.state, RunState::Completed);
    assert_eq!(publisher.calls(), 1);
}

#[tokio::test]
async fn test_runtime_broadcasts_run_events() {
    let runtime = FlowRuntime::with_registry(
        registry_with(&[trigger_stub()]),
        RuntimeConfig::default(),
    );
    let mut events = runtime.subscribe_events();

    let mut store = GraphStore::new();
    store.add_node(NodeKind::Trigger);
    let report = runtime.execute(&store).await.unwrap();
    assert_eq!(report.state, RunState::Completed);

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }

    assert!(matches!(received.first(), Some(ExecutionEvent::RunStarted { node_count: 1, .. })));
    assert!(matches!(
        received.last(),
        Some(ExecutionEvent::RunFinished { state: RunState::Completed, .. })
    ));
    let logs = received
        .iter()
        .filter(|e| matches!(e, ExecutionEvent::Log { .. }))
        .count();
    assert_eq!(logs, 2);
}
