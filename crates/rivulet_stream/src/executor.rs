//! Stream execution engine.
//!
//! The [`StreamExecutor`] drives a graph in rounds. Each round ticks every
//! node connected to the sink once; rounds repeat until the sink finishes.
//! Correctness rests on each node's own readiness check, so the order of
//! ticks inside a round does not matter.
//!
//! # Example
//!
//! ```ignore
//! use rivulet_stream::{Callable, Graph, NodeConfig, StreamExecutor, Value};
//!
//! let mut graph = Graph::new();
//! let numbers = graph.add_node(NodeConfig::new("Numbers"), Callable::values(1..=5))?;
//! let double = graph.pipe(
//!     numbers,
//!     NodeConfig::new("Double").inputs(1),
//!     Callable::unary(|v| v.checked_mul(&Value::Int(2))),
//! )?;
//!
//! let result = StreamExecutor::new().run_blocking(&mut graph, double)?;
//! assert_eq!(result.output.len(), 5);
//! ```

use core::time::Duration;
use std::time::Instant;

use futures::future::join_all;
use hashbrown::HashSet;
use tracing::{debug, error, info};

use crate::error::ExecutionError;
use crate::graph::Graph;
use crate::hooks::HooksAPI;
use crate::hooks::events::StreamEvent;
use crate::hooks::schedule::{
    OnNodeBlocked, OnNodeExecuted, OnNodeFinished, OnRoundComplete, OnRunComplete, OnRunFailure,
    OnRunStart, ScheduleId,
};
use crate::node::{Node, NodeId, TickOutcome};
use crate::plugin::{Plugin, PluginId};
use crate::value::Value;

/// How the nodes of a round are ticked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickOrder {
    /// Every node in one concurrent batch.
    #[default]
    Concurrent,
    /// One concurrent batch per level, in level order.
    Layered,
}

/// Counters for one driven run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Rounds driven until the sink finished.
    pub rounds: usize,
    /// Node ticks performed across all rounds.
    pub ticks: usize,
    /// Wall-clock duration.
    pub duration: Duration,
}

/// Result of [`StreamExecutor::run`].
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Every value that reached the output node, in order.
    pub output: Vec<Value>,
    /// Rounds driven until the output finished.
    pub rounds: usize,
    /// Node ticks performed across all rounds.
    pub ticks: usize,
    /// Total execution duration.
    pub duration: Duration,
}

/// Drives stream graphs to completion.
pub struct StreamExecutor {
    order: TickOrder,
    max_rounds: Option<usize>,
    hooks: HooksAPI,
    plugins: Vec<Box<dyn Plugin>>,
    plugin_ids: HashSet<PluginId>,
}

impl Default for StreamExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamExecutor {
    /// Creates an executor with concurrent rounds and no round limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            order: TickOrder::Concurrent,
            max_rounds: None,
            hooks: HooksAPI::new(),
            plugins: Vec::new(),
            plugin_ids: HashSet::new(),
        }
    }

    /// Sets how nodes are ticked within a round.
    #[must_use]
    pub fn with_order(mut self, order: TickOrder) -> Self {
        self.order = order;
        self
    }

    /// Aborts a run that has not finished after `max` rounds.
    ///
    /// Without a limit, a graph whose sink never receives `End` runs forever.
    #[must_use]
    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = Some(max);
        self
    }

    /// The configured tick order.
    #[must_use]
    pub fn order(&self) -> TickOrder {
        self.order
    }

    /// The configured round limit.
    #[must_use]
    pub fn max_rounds(&self) -> Option<usize> {
        self.max_rounds
    }

    /// The hook registry.
    #[must_use]
    pub fn hooks(&self) -> &HooksAPI {
        &self.hooks
    }

    /// Builds and keeps a plugin. A second plugin of the same type is ignored.
    pub fn add_plugins<P: Plugin>(&mut self, plugin: P) -> &mut Self {
        let id = plugin.id();
        if !self.plugin_ids.insert(id) {
            debug!(plugin = id.type_name(), "plugin already added, skipping");
            return self;
        }
        plugin.build(self);
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Returns true if a plugin of type `P` was added.
    #[must_use]
    pub fn has_plugin<P: Plugin>(&self) -> bool {
        self.plugin_ids.contains(&PluginId::of::<P>())
    }

    /// Attaches a collector to `output`, drives the graph until it finishes
    /// and returns everything it received.
    ///
    /// The collector stays in the graph afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if `output` is unknown, the graph is invalid, a
    /// callable fails, or the round limit is exceeded.
    pub async fn run(
        &self,
        graph: &mut Graph,
        output: NodeId,
    ) -> Result<ExecutionResult, ExecutionError> {
        let (sink, collector) = graph.add_collector(output)?;
        let stats = self.drive(graph, sink).await?;
        Ok(ExecutionResult {
            output: collector.take(),
            rounds: stats.rounds,
            ticks: stats.ticks,
            duration: stats.duration,
        })
    }

    /// Synchronous [`run`](Self::run) on a fresh current-thread runtime.
    ///
    /// # Errors
    ///
    /// As [`run`](Self::run), plus [`ExecutionError::Runtime`] if the
    /// runtime cannot be built.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn run_blocking(
        &self,
        graph: &mut Graph,
        output: NodeId,
    ) -> Result<ExecutionResult, ExecutionError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        runtime.block_on(self.run(graph, output))
    }

    /// Ticks every node connected to `sink`, round after round, until
    /// `sink` is finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph is invalid, a callable fails, or the
    /// round limit is exceeded.
    pub async fn drive(&self, graph: &mut Graph, sink: NodeId) -> Result<RunStats, ExecutionError> {
        let start = Instant::now();
        let result = self.drive_rounds(graph, sink, start).await;

        match &result {
            Ok(stats) => {
                info!(
                    rounds = stats.rounds,
                    ticks = stats.ticks,
                    duration = ?stats.duration,
                    "run complete"
                );
                self.notify::<OnRunComplete>(|| StreamEvent::RunComplete {
                    rounds: stats.rounds,
                    ticks: stats.ticks,
                    duration: stats.duration,
                });
            }
            Err(err) => {
                error!(error = %err, "run failed");
                self.notify::<OnRunFailure>(|| StreamEvent::RunFailure {
                    error: err.to_string(),
                });
            }
        }
        result
    }

    async fn drive_rounds(
        &self,
        graph: &mut Graph,
        sink: NodeId,
        start: Instant,
    ) -> Result<RunStats, ExecutionError> {
        graph.validate(sink).map_err(ExecutionError::Invalid)?;

        let batches: Vec<HashSet<NodeId>> = match self.order {
            TickOrder::Concurrent => vec![graph.collect(sink).into_iter().collect()],
            TickOrder::Layered => graph
                .levels(sink)
                .into_iter()
                .map(|level| level.into_iter().collect())
                .collect(),
        };
        let node_count = batches.iter().map(HashSet::len).sum();

        info!(node_count, order = ?self.order, "starting run");
        self.notify::<OnRunStart>(|| StreamEvent::RunStart { node_count });

        let mut rounds = 0;
        let mut ticks = 0;
        while !graph.node(sink).is_some_and(Node::is_finished) {
            if let Some(max) = self.max_rounds
                && rounds >= max
            {
                return Err(ExecutionError::RoundLimitExceeded { max });
            }
            rounds += 1;

            for batch in &batches {
                for (id, outcome) in tick_batch(graph, batch).await {
                    ticks += 1;
                    self.observe(graph, id, outcome?);
                }
            }

            self.notify::<OnRoundComplete>(|| StreamEvent::RoundComplete { round: rounds });
        }

        Ok(RunStats {
            rounds,
            ticks,
            duration: start.elapsed(),
        })
    }

    fn observe(&self, graph: &Graph, id: NodeId, outcome: TickOutcome) {
        let Some(node) = graph.node(id) else {
            return;
        };
        match outcome {
            TickOutcome::Blocked => self.notify::<OnNodeBlocked>(|| StreamEvent::NodeBlocked {
                node_id: id,
                label: node.label().to_owned(),
            }),
            TickOutcome::Executed => self.notify::<OnNodeExecuted>(|| StreamEvent::NodeExecuted {
                node_id: id,
                label: node.label().to_owned(),
                value: node.last_value().clone(),
            }),
            TickOutcome::Ended => self.notify::<OnNodeFinished>(|| StreamEvent::NodeFinished {
                node_id: id,
                label: node.label().to_owned(),
            }),
            TickOutcome::AlreadyFinished | TickOutcome::Waiting | TickOutcome::Restarted => {}
        }
    }

    /// Invokes the hooks of schedule `S`, building the event only if any exist.
    fn notify<S: 'static>(&self, event: impl FnOnce() -> StreamEvent) {
        let schedule = ScheduleId::of::<S>();
        if self.hooks.hook_count(schedule) > 0 {
            self.hooks.invoke(schedule, &event());
        }
    }
}

impl core::fmt::Debug for StreamExecutor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StreamExecutor")
            .field("order", &self.order)
            .field("max_rounds", &self.max_rounds)
            .field("hooks", &self.hooks)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Ticks the nodes of one batch concurrently.
async fn tick_batch(
    graph: &mut Graph,
    batch: &HashSet<NodeId>,
) -> Vec<(NodeId, Result<TickOutcome, ExecutionError>)> {
    let ticks = graph
        .nodes_mut()
        .iter_mut()
        .filter(|node| batch.contains(&node.id()))
        .map(|node| async move { (node.id(), node.tick().await) });
    join_all(ticks).await
}

/// Drives `graph` until `output` finishes and returns what it emitted.
///
/// Blocks the calling thread.
///
/// # Errors
///
/// See [`StreamExecutor::run`].
pub fn run(graph: &mut Graph, output: NodeId) -> Result<Vec<Value>, ExecutionError> {
    StreamExecutor::new()
        .run_blocking(graph, output)
        .map(|result| result.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::Callable;
    use crate::node::NodeConfig;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn doubled(graph: &mut Graph) -> NodeId {
        let src = graph
            .add_node(NodeConfig::new("Numbers"), Callable::values(1..=3))
            .unwrap();
        graph
            .pipe(
                src,
                NodeConfig::new("Double").inputs(1),
                Callable::unary(|v| v.checked_mul(&Value::Int(2))),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn run_collects_output() {
        let mut graph = Graph::new();
        let out = doubled(&mut graph);

        let result = StreamExecutor::new().run(&mut graph, out).await.unwrap();
        assert_eq!(
            result.output,
            vec![Value::Int(2), Value::Int(4), Value::Int(6)]
        );
        assert!(result.rounds >= 4);
        assert!(result.ticks >= result.rounds * 3);
    }

    #[tokio::test]
    async fn layered_order_gives_same_output() {
        let mut graph = Graph::new();
        let out = doubled(&mut graph);

        let result = StreamExecutor::new()
            .with_order(TickOrder::Layered)
            .run(&mut graph, out)
            .await
            .unwrap();
        assert_eq!(
            result.output,
            vec![Value::Int(2), Value::Int(4), Value::Int(6)]
        );
    }

    #[tokio::test]
    async fn round_limit_stops_endless_sources() {
        let mut graph = Graph::new();
        let ones = graph
            .add_node(NodeConfig::new("Ones"), Callable::source(|| Ok(1)))
            .unwrap();

        let err = StreamExecutor::new()
            .with_max_rounds(5)
            .run(&mut graph, ones)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::RoundLimitExceeded { max: 5 }));
    }

    #[tokio::test]
    async fn invalid_graph_is_rejected_before_running() {
        let mut graph = Graph::new();
        let a = graph
            .add_node(NodeConfig::new("A"), Callable::values([1]))
            .unwrap();
        let add = graph
            .add_node(
                NodeConfig::new("Add").inputs(2),
                Callable::binary(|a, b| a.checked_add(b)),
            )
            .unwrap();
        graph.connect(a, add).unwrap();

        let err = StreamExecutor::new().run(&mut graph, add).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Invalid(ref errors) if errors.len() == 1));
        assert_eq!(graph.node(a).unwrap().execution_count(), 0);
    }

    #[test]
    fn free_run_blocks_until_done() {
        let mut graph = Graph::new();
        let out = doubled(&mut graph);
        assert_eq!(
            run(&mut graph, out).unwrap(),
            vec![Value::Int(2), Value::Int(4), Value::Int(6)]
        );
    }

    struct CountingPlugin(Arc<AtomicUsize>);

    impl Plugin for CountingPlugin {
        fn build(&self, executor: &mut StreamExecutor) {
            self.0.fetch_add(1, Ordering::SeqCst);
            let rounds = Arc::clone(&self.0);
            executor
                .hooks()
                .register_observer::<OnRoundComplete, _>("rounds", move |_: &StreamEvent| {
                    rounds.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
    }

    #[tokio::test]
    async fn plugins_are_built_once_and_see_rounds() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut executor = StreamExecutor::new();
        executor
            .add_plugins(CountingPlugin(Arc::clone(&counter)))
            .add_plugins(CountingPlugin(Arc::clone(&counter)));
        assert!(executor.has_plugin::<CountingPlugin>());
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        let mut graph = Graph::new();
        let out = doubled(&mut graph);
        let result = executor.run(&mut graph, out).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1 + result.rounds);
    }
}
