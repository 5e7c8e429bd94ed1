//! Graph arena and topology operations.
//!
//! The [`Graph`] owns every node and hands out [`NodeId`] handles. Edges are
//! recorded on both ends when two nodes are connected: the producer keeps an
//! [`Edge`](crate::edge::Edge) to the consumer's input slot, and the consumer
//! keeps the producer's id as an upstream back-link used for traversal only.

use core::fmt;

use hashbrown::HashSet;

use crate::callable::Callable;
use crate::edge::Edge;
use crate::error::{ConfigError, ExecutionError, WiringError};
use crate::node::{Node, NodeConfig, NodeId, TickOutcome};
use crate::sink::Collector;

/// A directed graph of stream nodes.
///
/// # Example
///
/// ```ignore
/// let mut graph = Graph::new();
/// let numbers = graph.add_node(NodeConfig::new("Numbers"), Callable::values([1, 2, 3]))?;
/// let double = graph.pipe(
///     numbers,
///     NodeConfig::new("Double").inputs(1),
///     Callable::unary(|v| v.checked_mul(&Value::Int(2))),
/// )?;
/// let (sink, output) = graph.add_collector(double)?;
/// ```
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ArityMismatch`] if the callable declares an
    /// arity different from `config.inputs`.
    pub fn add_node(
        &mut self,
        config: NodeConfig,
        callable: Callable,
    ) -> Result<NodeId, ConfigError> {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::new(id, config, callable)?);
        Ok(id)
    }

    /// Connects `producer` to the next free input slot of `consumer` and
    /// returns that slot's index.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::NodeNotFound`] for foreign handles and
    /// [`WiringError::SlotsExhausted`] if every slot is already wired.
    pub fn connect(&mut self, producer: NodeId, consumer: NodeId) -> Result<usize, WiringError> {
        if !self.contains(producer) {
            return Err(WiringError::NodeNotFound(producer));
        }
        let (index, inbox) = self
            .nodes
            .get_mut(consumer.index())
            .ok_or(WiringError::NodeNotFound(consumer))?
            .attach_upstream(producer)?;
        self.nodes[producer.index()].attach_downstream(Edge::new(consumer, index, inbox));
        Ok(index)
    }

    /// Adds a node and connects `producer` to its first input slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the node cannot be built or wired.
    pub fn pipe(
        &mut self,
        producer: NodeId,
        config: NodeConfig,
        callable: Callable,
    ) -> Result<NodeId, ExecutionError> {
        if !self.contains(producer) {
            return Err(WiringError::NodeNotFound(producer).into());
        }
        let id = self.add_node(config, callable)?;
        self.connect(producer, id)?;
        Ok(id)
    }

    /// Attaches a collector node to `upstream`.
    ///
    /// Returns the collector's node id, which is the natural sink to drive,
    /// and a handle to read what it accumulated.
    ///
    /// # Errors
    ///
    /// Returns an error if `upstream` is not part of this graph.
    pub fn add_collector(
        &mut self,
        upstream: NodeId,
    ) -> Result<(NodeId, Collector), ExecutionError> {
        let collector = Collector::new();
        let id = self.pipe(
            upstream,
            NodeConfig::new("Collector").inputs(1),
            collector.callable(),
        )?;
        Ok((id, collector))
    }

    /// Returns the node with the given id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Returns true if `id` belongs to this graph.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// All nodes, in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ticks a single node.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::NodeNotFound`] for foreign handles, or the
    /// node's own execution error.
    pub async fn tick(&mut self, id: NodeId) -> Result<TickOutcome, ExecutionError> {
        self.nodes
            .get_mut(id.index())
            .ok_or(ExecutionError::NodeNotFound(id))?
            .tick()
            .await
    }

    /// Every node connected to `start`, following edges in both directions.
    ///
    /// The result is sorted by id. It is empty if `start` is not in the graph.
    #[must_use]
    pub fn collect(&self, start: NodeId) -> Vec<NodeId> {
        if !self.contains(start) {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let node = &self.nodes[id.index()];
            stack.extend(node.upstream().iter().copied());
            stack.extend(node.downstream().iter().map(Edge::to));
        }

        let mut found: Vec<NodeId> = seen.into_iter().collect();
        found.sort_unstable();
        found
    }

    /// Nodes connected to `start` that have no upstream edges.
    #[must_use]
    pub fn roots(&self, start: NodeId) -> Vec<NodeId> {
        self.collect(start)
            .into_iter()
            .filter(|id| self.nodes[id.index()].upstream().is_empty())
            .collect()
    }

    /// Breadth-first layers by downstream edges, starting from the roots.
    ///
    /// A node is placed in the first layer that reaches it and never moved
    /// later, so diamond shapes do not get longest-path depth. Nodes only
    /// reachable through a cycle are not placed at all.
    #[must_use]
    pub fn levels(&self, start: NodeId) -> Vec<Vec<NodeId>> {
        let mut layer = self.roots(start);
        let mut placed: HashSet<NodeId> = layer.iter().copied().collect();
        let mut levels = Vec::new();

        while !layer.is_empty() {
            let mut next = Vec::new();
            for id in &layer {
                for edge in self.nodes[id.index()].downstream() {
                    if placed.insert(edge.to()) {
                        next.push(edge.to());
                    }
                }
            }
            levels.push(layer);
            layer = next;
        }
        levels
    }

    /// Checks that the graph around `sink` can be executed.
    ///
    /// # Errors
    ///
    /// Returns every problem found: an unknown sink, nodes with unwired
    /// input slots, and directed cycles.
    pub fn validate(&self, sink: NodeId) -> Result<(), Vec<ValidationError>> {
        if !self.contains(sink) {
            return Err(vec![ValidationError::NodeNotFound(sink)]);
        }

        let reachable = self.collect(sink);
        let mut errors = Vec::new();

        for id in &reachable {
            let node = &self.nodes[id.index()];
            if node.upstream().len() < node.inputs() {
                errors.push(ValidationError::UnwiredInput {
                    node: *id,
                    name: node.name().to_owned(),
                    expected: node.inputs(),
                    wired: node.upstream().len(),
                });
            }
        }

        if let Some(id) = self.find_cycle(&reachable) {
            errors.push(ValidationError::Cycle {
                node: id,
                name: self.nodes[id.index()].name().to_owned(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Returns a node on a directed cycle, if any.
    fn find_cycle(&self, reachable: &[NodeId]) -> Option<NodeId> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        // (node, index of the next downstream edge to follow)
        let mut stack: Vec<(NodeId, usize)> = Vec::new();

        for &root in reachable {
            if marks[root.index()] != Mark::Unvisited {
                continue;
            }
            marks[root.index()] = Mark::InProgress;
            stack.push((root, 0));

            while let Some((id, next)) = stack.last_mut() {
                let Some(edge) = self.nodes[id.index()].downstream().get(*next) else {
                    marks[id.index()] = Mark::Done;
                    stack.pop();
                    continue;
                };
                *next += 1;
                let to = edge.to();
                match marks[to.index()] {
                    Mark::InProgress => return Some(to),
                    Mark::Unvisited => {
                        marks[to.index()] = Mark::InProgress;
                        stack.push((to, 0));
                    }
                    Mark::Done => {}
                }
            }
        }
        None
    }
}

/// Errors that make a graph unsuitable for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The sink does not belong to the graph.
    NodeNotFound(NodeId),
    /// A node has fewer upstream wires than input slots.
    UnwiredInput {
        /// The node ID.
        node: NodeId,
        /// The node name.
        name: String,
        /// Declared input slot count.
        expected: usize,
        /// Wired slot count.
        wired: usize,
    },
    /// A directed cycle runs through this node.
    Cycle {
        /// The node ID.
        node: NodeId,
        /// The node name.
        name: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NodeNotFound(id) => write!(f, "node not found: {id}"),
            ValidationError::UnwiredInput {
                node,
                name,
                expected,
                wired,
            } => {
                write!(
                    f,
                    "node '{name}' ({node}) has {wired} of {expected} inputs wired"
                )
            }
            ValidationError::Cycle { node, name } => {
                write!(f, "node '{name}' ({node}) is part of a cycle")
            }
        }
    }
}

impl core::error::Error for ValidationError {}
