//! Nodes of a stream graph.
//!
//! A [`Node`] wraps one [`Callable`] together with its input slots and its
//! downstream edges, and runs the per-tick state machine: backpressure check,
//! rate limit, execution cap, input synchronization, execution, replay and
//! propagation.

use core::fmt;
use core::time::Duration;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::callable::{Callable, CallableKind, Kwargs, Step};
use crate::edge::Edge;
use crate::error::{CallError, ConfigError, ExecutionError, WiringError};
use crate::signal::Signal;
use crate::slot::{Claim, Delivery, InputSlot};
use crate::value::Value;

/// Unique identifier for a node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Creates a new node ID.
    #[must_use]
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// What a producer does when a consumer is not ready for a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backpressure {
    /// Skip the tick while any downstream slot has a queued value.
    #[default]
    Block,
    /// Discard the new value if the consumer slot is pending or active.
    Drop,
    /// Prefer the newest value, sacrificing older pending ones.
    Replace,
}

impl Backpressure {
    /// Builds a policy from the two boolean flags of the flag-style form.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConflictingBackpressure`] if both are set.
    pub fn from_flags(drop: bool, replace: bool) -> Result<Self, ConfigError> {
        match (drop, replace) {
            (true, true) => Err(ConfigError::ConflictingBackpressure),
            (true, false) => Ok(Backpressure::Drop),
            (false, true) => Ok(Backpressure::Replace),
            (false, false) => Ok(Backpressure::Block),
        }
    }
}

/// Static configuration of a node.
///
/// # Example
///
/// ```ignore
/// let config = NodeConfig::new("Sum")
///     .inputs(3)
///     .replace()
///     .rate_limit(Duration::from_millis(10))
///     .kwarg("offset", 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Human-readable name.
    pub name: String,
    /// Number of input slots.
    pub inputs: usize,
    /// Policy applied to every downstream edge.
    pub backpressure: Backpressure,
    /// Keep the previous result when the callable yields a placeholder.
    pub replay: bool,
    /// Delay observed before each execution attempt.
    pub rate_limit: Option<Duration>,
    /// Maximum number of successful executions.
    pub execution_cap: Option<usize>,
    /// Keyword arguments passed to every execution.
    pub kwargs: Kwargs,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "Node".to_owned(),
            inputs: 0,
            backpressure: Backpressure::Block,
            replay: false,
            rate_limit: None,
            execution_cap: None,
            kwargs: Kwargs::new(),
        }
    }
}

impl NodeConfig {
    /// Creates a zero-input configuration with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the number of input slots.
    #[must_use]
    pub fn inputs(mut self, inputs: usize) -> Self {
        self.inputs = inputs;
        self
    }

    /// Sets the backpressure policy.
    #[must_use]
    pub fn backpressure(mut self, policy: Backpressure) -> Self {
        self.backpressure = policy;
        self
    }

    /// Shorthand for [`Backpressure::Drop`].
    #[must_use]
    pub fn drop(self) -> Self {
        self.backpressure(Backpressure::Drop)
    }

    /// Shorthand for [`Backpressure::Replace`].
    #[must_use]
    pub fn replace(self) -> Self {
        self.backpressure(Backpressure::Replace)
    }

    /// Enables replay of the previous result.
    #[must_use]
    pub fn replay(mut self) -> Self {
        self.replay = true;
        self
    }

    /// Sets the delay observed before each execution attempt.
    #[must_use]
    pub fn rate_limit(mut self, delay: Duration) -> Self {
        self.rate_limit = Some(delay);
        self
    }

    /// Caps the number of successful executions.
    #[must_use]
    pub fn execution_cap(mut self, cap: usize) -> Self {
        self.execution_cap = Some(cap);
        self
    }

    /// Adds a keyword argument.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }
}

/// Lifecycle state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    /// Ticks may execute the callable.
    #[default]
    Running,
    /// Terminal. Ticks only re-emit [`Signal::End`].
    Finished,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The node was already finished and re-emitted `End`.
    AlreadyFinished,
    /// A downstream slot still had queued values; nothing happened.
    Blocked,
    /// At least one input slot had no value yet.
    Waiting,
    /// The callable ran and its result was propagated.
    Executed,
    /// A generator callable discarded its iterator; it is rebuilt next tick.
    Restarted,
    /// The node transitioned to finished during this tick.
    Ended,
}

/// A vertex of the stream graph.
pub struct Node {
    id: NodeId,
    label: String,
    config: NodeConfig,
    callable: Callable,
    slots: Vec<Arc<InputSlot>>,
    upstream: Vec<NodeId>,
    downstream: Vec<Edge>,
    state: NodeState,
    last: Signal,
    execution_count: usize,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        config: NodeConfig,
        callable: Callable,
    ) -> Result<Self, ConfigError> {
        if let Some(arity) = callable.arity()
            && arity != config.inputs
        {
            return Err(ConfigError::ArityMismatch {
                name: config.name,
                expected: config.inputs,
                actual: arity,
            });
        }

        let label = format!("{}#{}", config.name, nanoid::nanoid!(5));
        let slots = (0..config.inputs)
            .map(|_| Arc::new(InputSlot::new()))
            .collect();

        Ok(Self {
            id,
            label,
            config,
            callable,
            slots,
            upstream: Vec::new(),
            downstream: Vec::new(),
            state: NodeState::Running,
            last: Signal::NoValue,
            execution_count: 0,
        })
    }

    /// Returns the node's ID.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the configured name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the diagnostic label, the name plus a short random suffix.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of input slots.
    #[must_use]
    pub fn inputs(&self) -> usize {
        self.slots.len()
    }

    /// Producers wired into this node, in slot order.
    #[must_use]
    pub fn upstream(&self) -> &[NodeId] {
        &self.upstream
    }

    /// Outgoing edges, in wiring order.
    #[must_use]
    pub fn downstream(&self) -> &[Edge] {
        &self.downstream
    }

    /// The most recent result, or [`Signal::NoValue`] before the first one.
    #[must_use]
    pub fn last_value(&self) -> &Signal {
        &self.last
    }

    /// Number of successful executions.
    #[must_use]
    pub fn execution_count(&self) -> usize {
        self.execution_count
    }

    /// Returns true once the node has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == NodeState::Finished
    }

    /// The lifecycle state.
    #[must_use]
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Number of queued signals in an input slot.
    #[must_use]
    pub fn pending(&self, slot: usize) -> Option<usize> {
        self.slots.get(slot).map(|s| s.pending())
    }

    /// The active value of an input slot.
    #[must_use]
    pub fn active(&self, slot: usize) -> Option<Signal> {
        self.slots.get(slot).map(|s| s.active())
    }

    /// The node's configuration.
    #[must_use]
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// How the wrapped callable is driven.
    #[must_use]
    pub fn callable_kind(&self) -> CallableKind {
        self.callable.kind()
    }

    /// Claims the next free input slot for `producer`.
    pub(crate) fn attach_upstream(
        &mut self,
        producer: NodeId,
    ) -> Result<(usize, Arc<InputSlot>), WiringError> {
        let index = self.upstream.len();
        let slot = self
            .slots
            .get(index)
            .cloned()
            .ok_or(WiringError::SlotsExhausted {
                node: self.id,
                inputs: self.slots.len(),
            })?;
        self.upstream.push(producer);
        Ok((index, slot))
    }

    pub(crate) fn attach_downstream(&mut self, edge: Edge) {
        self.downstream.push(edge);
    }

    /// Runs one tick.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Callable`] if the callable fails with an
    /// unrecoverable error.
    pub async fn tick(&mut self) -> Result<TickOutcome, ExecutionError> {
        if self.is_finished() {
            self.emit(&Signal::End);
            return Ok(TickOutcome::AlreadyFinished);
        }

        if self.config.backpressure == Backpressure::Block
            && self.downstream.iter().any(Edge::is_congested)
        {
            trace!(node = %self.label, "downstream congested, skipping tick");
            return Ok(TickOutcome::Blocked);
        }

        if let Some(delay) = self.config.rate_limit {
            tokio::time::sleep(delay).await;
        }

        if let Some(cap) = self.config.execution_cap
            && self.execution_count >= cap
            && self.callable.kind() != CallableKind::Exhausted
        {
            debug!(node = %self.label, cap, "execution cap reached");
            self.callable.exhaust();
        }

        let mut ready = true;
        for slot in &self.slots {
            match slot.claim() {
                Claim::Ready => {}
                Claim::Pending => ready = false,
                Claim::End => {
                    self.finish();
                    return Ok(TickOutcome::Ended);
                }
            }
        }
        if !ready {
            trace!(node = %self.label, "inputs not ready");
            return Ok(TickOutcome::Waiting);
        }

        self.execute().await
    }

    async fn execute(&mut self) -> Result<TickOutcome, ExecutionError> {
        let values: Vec<Value> = self
            .slots
            .iter()
            .filter_map(|slot| slot.active_value())
            .collect();

        let candidate = match self.callable.call(&values, &self.config.kwargs).await {
            Ok(Step::Yield(signal)) => signal,
            Ok(Step::Restart(err)) => {
                debug!(node = %self.label, error = %err, "restarting iterator");
                return Ok(TickOutcome::Restarted);
            }
            Err(CallError::DivisionByZero) => {
                debug!(node = %self.label, "division by zero, substituting infinity");
                Signal::Value(Value::infinity())
            }
            Err(source) => {
                return Err(ExecutionError::Callable {
                    node: self.id,
                    name: self.label.clone(),
                    source,
                });
            }
        };

        if self.callable.kind() != CallableKind::Exhausted {
            self.execution_count += 1;
        }
        if !(self.config.replay && candidate.is_placeholder()) {
            self.last = candidate;
        }

        self.emit(&self.last);
        for slot in &self.slots {
            slot.clear_active();
        }

        if self.last.is_end() {
            self.finish();
            return Ok(TickOutcome::Ended);
        }
        Ok(TickOutcome::Executed)
    }

    fn finish(&mut self) {
        if !self.is_finished() {
            debug!(
                node = %self.label,
                executions = self.execution_count,
                "node finished"
            );
        }
        self.state = NodeState::Finished;
        self.last = Signal::End;
        self.emit(&Signal::End);
    }

    fn emit(&self, signal: &Signal) {
        if signal.is_placeholder() {
            return;
        }
        for edge in &self.downstream {
            if edge.deliver(self.config.backpressure, signal.clone()) == Delivery::Dropped {
                trace!(node = %self.label, edge = %edge, "value dropped");
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("state", &self.state)
            .field("callable", &self.callable)
            .field("upstream", &self.upstream)
            .field("downstream", &self.downstream)
            .field("execution_count", &self.execution_count)
            .finish()
    }
}
