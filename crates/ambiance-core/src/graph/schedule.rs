//! Compiled processing order for one topology.
//!
//! A [`Schedule`] is built on the control thread every time a topology is
//! published. It holds one [`ProcessStep`] per node in dependency order, with
//! physical buffer slots already assigned, so the render path only walks a flat
//! list.
//!
//! Ordering uses Kahn's algorithm over the destination-indexed edge table. Ready
//! nodes are taken lowest index first, so a graph wired in creation order
//! renders in creation order.
//!
//! Slot assignment is liveness analysis: a node's output slot is live from its
//! own step to the last step that reads it (or to the end for the output node),
//! then returns to the free list. A linear chain of any length needs two slots.
//!
//! The designated input node's buffer is the caller's input. The node still runs
//! on its own source, but every reader of it (and the final copy, when it is the
//! output node) sees [`Source::External`] instead of its slot.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Where a step reads its input from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Unconnected: the pool's silent buffer.
    Silence,
    /// The caller's input slices, which stand in for the designated input
    /// node's buffer.
    External,
    /// Another node's output slot.
    Slot(usize),
}

/// Processes one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStep {
    /// Node index in the topology.
    pub node: usize,
    /// Input buffer.
    pub input: Source,
    /// Slot the node writes into.
    pub output: usize,
}

/// Flat, dependency-ordered list of steps with slot assignments.
#[derive(Debug, Clone)]
pub struct Schedule {
    steps: Vec<ProcessStep>,
    buffer_count: usize,
    output: Source,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            buffer_count: 0,
            output: Source::Silence,
        }
    }
}

impl Schedule {
    /// Compiles a schedule.
    ///
    /// - `sources[n]` is the node feeding node `n`, if any.
    /// - `io_input` is the node whose buffer is the caller's input.
    /// - `output_node` is the node whose buffer is copied to the caller.
    ///
    /// Returns `None` if the edge table contains a cycle.
    pub fn compile(
        sources: &[Option<usize>],
        io_input: Option<usize>,
        output_node: Option<usize>,
    ) -> Option<Self> {
        let order = topological_order(sources)?;
        let count = order.len();

        let mut position = vec![0usize; count];
        for (step, &node) in order.iter().enumerate() {
            position[node] = step;
        }

        // Last step reading each node's output.
        let mut last_read: Vec<usize> = position.clone();
        for (node, source) in sources.iter().enumerate() {
            if let Some(src) = *source
                && Some(src) != io_input
            {
                last_read[src] = last_read[src].max(position[node]);
            }
        }
        if let Some(out) = output_node
            && Some(out) != io_input
        {
            last_read[out] = count;
        }

        let (slots, buffer_count) = assign_slots(&order, &last_read);

        let read = |node: Option<usize>| match node {
            Some(node) if Some(node) == io_input => Source::External,
            Some(node) => Source::Slot(slots[node]),
            None => Source::Silence,
        };

        let steps = order
            .iter()
            .map(|&node| ProcessStep {
                node,
                input: read(sources[node]),
                output: slots[node],
            })
            .collect();

        Some(Self {
            steps,
            buffer_count,
            output: read(output_node),
        })
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[ProcessStep] {
        &self.steps
    }

    /// Number of physical slots the steps use.
    pub fn buffer_count(&self) -> usize {
        self.buffer_count
    }

    /// Buffer copied to the caller: [`Source::Silence`] for an empty graph.
    pub fn output(&self) -> Source {
        self.output
    }
}

/// Kahn's algorithm with lowest-index-first tie breaking.
fn topological_order(sources: &[Option<usize>]) -> Option<Vec<usize>> {
    let count = sources.len();
    let mut in_degree = vec![0u32; count];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (node, source) in sources.iter().enumerate() {
        if let Some(src) = *source {
            in_degree[node] += 1;
            dependents[src].push(node);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..count)
        .filter(|&n| in_degree[n] == 0)
        .map(Reverse)
        .collect();
    let mut order = Vec::with_capacity(count);

    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &dep in &dependents[node] {
            in_degree[dep] -= 1;
            if in_degree[dep] == 0 {
                ready.push(Reverse(dep));
            }
        }
    }

    (order.len() == count).then_some(order)
}

/// Greedy slot assignment in step order. Returns the slot per node and the
/// number of slots used.
fn assign_slots(order: &[usize], last_read: &[usize]) -> (Vec<usize>, usize) {
    let mut slots = vec![0usize; order.len()];
    let mut slot_count = 0usize;
    // (step at which the slot becomes free, slot)
    let mut free_at: Vec<(usize, usize)> = Vec::new();

    for (step, &node) in order.iter().enumerate() {
        let reusable = free_at.iter().position(|&(free_step, _)| free_step <= step);
        let slot = match reusable {
            Some(i) => free_at.swap_remove(i).1,
            None => {
                slot_count += 1;
                slot_count - 1
            }
        };
        slots[node] = slot;
        free_at.push((last_read[node] + 1, slot));
    }

    (slots, slot_count)
}
