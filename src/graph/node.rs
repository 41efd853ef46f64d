// src/graph/node.rs

//! Per-module runtime state and the execute-and-signal protocol.
//!
//! Each node carries a single atomic counter, `edges_to_go`, counting the
//! neighbor acknowledgements still outstanding for the current round. A
//! node executes, then acknowledges every neighbor in *both* directions:
//! the forward half lets consumers start their round, the backward half
//! lets producers begin their next one once everyone has read their
//! output. Whichever neighbor reaches zero gets a token on its event fd.

use std::collections::HashMap;
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::errors::{DagflowError, ExecuteError, Result};
use crate::event::Event;
use crate::module::Module;

/// Adjacency bookkeeping, mutated by the builder before any work starts
/// and afterwards only by stop surgery.
#[derive(Default)]
struct Links {
    /// Successor index → summed edge weight.
    after: HashMap<usize, i64>,
    /// Predecessor index → summed edge weight.
    before: HashMap<usize, i64>,
    after_edges: i64,
    before_edges: i64,
}

pub(crate) struct DepNode {
    module: Arc<dyn Module>,
    name: String,
    links: Mutex<Links>,
    /// Outstanding neighbor acknowledgements for the current round; zero
    /// means ready. Reset to `before_edges + after_edges` when a round
    /// starts.
    edges_to_go: AtomicI64,
    /// One-shot: the next execution bypasses the module body.
    skip: AtomicBool,
    /// Sticky: the node no longer participates in scheduling.
    deactivated: AtomicBool,
    event: Event,
}

impl DepNode {
    pub(crate) fn new(module: Arc<dyn Module>, name: String) -> Result<Self> {
        Ok(Self {
            module,
            name,
            links: Mutex::new(Links::default()),
            edges_to_go: AtomicI64::new(0),
            skip: AtomicBool::new(false),
            deactivated: AtomicBool::new(false),
            event: Event::new()?,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn event(&self) -> &Event {
        &self.event
    }

    pub(crate) fn module_fd(&self) -> Option<RawFd> {
        self.module.fd()
    }

    pub(crate) fn add_after(&self, successor: usize) {
        let mut links = self.links.lock().unwrap();
        *links.after.entry(successor).or_insert(0) += 1;
        links.after_edges += 1;
    }

    pub(crate) fn add_before(&self, predecessor: usize) {
        let mut links = self.links.lock().unwrap();
        *links.before.entry(predecessor).or_insert(0) += 1;
        links.before_edges += 1;
    }

    /// Arm the counter for the first round: only predecessors gate it.
    pub(crate) fn finish_build(&self) {
        let links = self.links.lock().unwrap();
        self.edges_to_go.store(links.before_edges, Ordering::Release);
    }

    pub(crate) fn ready(&self) -> bool {
        self.edges_to_go.load(Ordering::Acquire) == 0
    }

    /// Flag every direct successor to skip its next round.
    fn mark_successors_skip(&self, nodes: &[DepNode]) {
        let successors: Vec<usize> = {
            let links = self.links.lock().unwrap();
            links.after.keys().copied().collect()
        };
        for idx in successors {
            nodes[idx].skip.store(true, Ordering::Relaxed);
        }
    }

    /// Remove this node from the graph on self-stop.
    ///
    /// Predecessors stop expecting this node's acknowledgement and receive
    /// the outstanding one immediately (they would deadlock otherwise);
    /// successors stop counting this node as a gate from their next reset
    /// on. Locks are taken one node at a time so two adjacent nodes
    /// stopping simultaneously cannot deadlock.
    fn sever(&self, nodes: &[DepNode], me: usize) -> Result<()> {
        let (predecessors, successors) = {
            let mut links = self.links.lock().unwrap();
            let predecessors: Vec<(usize, i64)> = links.before.drain().collect();
            let successors: Vec<(usize, i64)> =
                links.after.iter().map(|(&idx, &weight)| (idx, weight)).collect();
            links.before_edges = 0;
            (predecessors, successors)
        };
        for (idx, weight) in predecessors {
            let predecessor = &nodes[idx];
            {
                let mut links = predecessor.links.lock().unwrap();
                if links.after.remove(&me).is_some() {
                    links.after_edges -= weight;
                }
            }
            signal(predecessor, weight)?;
        }
        for (idx, weight) in successors {
            let mut links = nodes[idx].links.lock().unwrap();
            if links.before.remove(&me).is_some() {
                links.before_edges -= weight;
            }
        }
        Ok(())
    }
}

/// Acknowledge `weight` edges towards `neighbor`; hand it a token when it
/// reaches zero, unless it has deactivated.
fn signal(neighbor: &DepNode, weight: i64) -> Result<()> {
    let previous = neighbor.edges_to_go.fetch_sub(weight, Ordering::AcqRel);
    debug_assert!(previous >= weight, "edge counter underflow");
    if previous == weight && !neighbor.deactivated.load(Ordering::Acquire) {
        neighbor.event.put(1)?;
    }
    Ok(())
}

/// Run one round of the node at `me`: invoke the module unless skipped,
/// then acknowledge every neighbor in both directions and hand back the
/// token that triggered this execution. Failures reach the caller only
/// after signalling, so an error never deadlocks the graph.
pub(crate) fn execute(nodes: &[DepNode], me: usize) -> Result<()> {
    let node = &nodes[me];
    if node.deactivated.load(Ordering::Acquire) {
        debug!(module = %node.name, "deactivated; ignoring wakeup");
        return Ok(());
    }

    // New round: expect one acknowledgement per edge in either direction.
    // No neighbor can decrement between dispatch and this store, because
    // each of them still waits on this node's own acknowledgement.
    {
        let links = node.links.lock().unwrap();
        node.edges_to_go
            .store(links.before_edges + links.after_edges, Ordering::Release);
    }

    let entered_skipped = node.skip.swap(false, Ordering::Relaxed);
    let mut failure = None;
    let mut stop_reason = None;

    if entered_skipped {
        debug!(module = %node.name, "skipping this round after an upstream failure");
        node.mark_successors_skip(nodes);
    } else {
        match node.module.execute() {
            Ok(()) => {}
            Err(ExecuteError::Failure(err)) => {
                warn!(module = %node.name, error = %err, "module failed; successors skip their next round");
                node.mark_successors_skip(nodes);
                failure = Some(err);
            }
            Err(ExecuteError::Stop(reason)) => {
                warn!(module = %node.name, reason = %reason, "module stopped; severing its edges");
                node.deactivated.store(true, Ordering::Release);
                node.sever(nodes, me)?;
                stop_reason = Some(reason);
            }
        }
    }

    let neighbors: Vec<(usize, i64)> = {
        let links = node.links.lock().unwrap();
        links
            .after
            .iter()
            .chain(links.before.iter())
            .map(|(&idx, &weight)| (idx, weight))
            .collect()
    };
    for (idx, weight) in &neighbors {
        signal(&nodes[*idx], *weight)?;
    }

    // Hand back the token that triggered this execution.
    node.event.get()?;

    if stop_reason.is_some() {
        // The signalling pass above was the last duty towards the
        // successors; drop the remaining outbound bookkeeping.
        let mut links = node.links.lock().unwrap();
        links.after.clear();
        links.after_edges = 0;
    } else if neighbors.is_empty() {
        // A node without neighbors drives itself.
        node.event.put(1)?;
    }

    if let Some(reason) = stop_reason {
        return Err(DagflowError::ModuleStopped {
            module: node.name.clone(),
            reason,
        });
    }
    if let Some(source) = failure {
        return Err(DagflowError::ModuleFailed {
            module: node.name.clone(),
            source,
        });
    }
    Ok(())
}
