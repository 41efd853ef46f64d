// src/pipeline.rs

//! The pipeline façade: owns the nodes, registers their descriptors with
//! the poller, and answers the edge query.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::Result;
use crate::graph::builder::{self, Edge};
use crate::graph::node::{self, DepNode};
use crate::module::Module;
use crate::poll::{FdCallback, FdMode, Poller};

/// A wired module graph hooked into a readiness poller.
///
/// Construction resolves relations into edges, validates provides, and
/// registers every node with the poller; from then on execution is driven
/// entirely by whatever threads wait on the poller. Dropping the pipeline
/// unregisters all of its descriptors.
pub struct Pipeline {
    nodes: Arc<Vec<DepNode>>,
    edges: Vec<Edge>,
    poller: Arc<dyn Poller>,
}

impl Pipeline {
    /// Build the graph from `(module, display name)` pairs and arm it.
    ///
    /// Nodes are allocated in input order. Modules with no inbound edges
    /// are handed a token immediately; everything else becomes ready as
    /// its neighbors acknowledge.
    pub fn new(modules: Vec<(Arc<dyn Module>, String)>, poller: Arc<dyn Poller>) -> Result<Self> {
        let built = builder::build(&modules)?;
        let nodes = Arc::new(built.nodes);

        for (idx, dep) in nodes.iter().enumerate() {
            let execute: FdCallback = {
                let nodes = Arc::clone(&nodes);
                Arc::new(move |_fd| node::execute(&nodes, idx))
            };
            match dep.module_fd() {
                None => {
                    poller.add_fd(dep.event().fd(), execute, FdMode::EdgeTriggered, dep.name())?;
                }
                Some(input_fd) => {
                    // The input fd stays disarmed until the edge counter
                    // clears; the event fd then re-arms it for one shot,
                    // yielding "input readable AND edges satisfied".
                    poller.add_fd(input_fd, execute, FdMode::Disarmed, dep.name())?;
                    let rearm: FdCallback = {
                        let poller = Arc::clone(&poller);
                        Arc::new(move |_fd| poller.mod_fd(input_fd, FdMode::OneShot))
                    };
                    let label = format!("{}/edges", dep.name());
                    poller.add_fd(dep.event().fd(), rearm, FdMode::EdgeTriggered, &label)?;
                }
            }
        }

        for dep in nodes.iter() {
            if dep.ready() {
                debug!(module = %dep.name(), "ready at startup");
                dep.event().put(1)?;
            }
        }

        Ok(Self {
            nodes,
            edges: built.edges,
            poller,
        })
    }

    /// Resolved edges, for visualization and diagnostics.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        for dep in self.nodes.iter() {
            if let Err(err) = self.poller.rm_fd(dep.event().fd(), true) {
                warn!(module = %dep.name(), error = %err, "failed to unregister event fd");
            }
            if let Some(input_fd) = dep.module_fd() {
                if let Err(err) = self.poller.rm_fd(input_fd, true) {
                    warn!(module = %dep.name(), error = %err, "failed to unregister input fd");
                }
            }
        }
    }
}
