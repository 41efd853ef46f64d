// src/graph/builder.rs

//! Resolves module relations into the dependency graph.
//!
//! Construction contracts:
//! - provides must be unique per (name, type) across the module set;
//!   violations fail with one aggregated message and nothing half-built;
//! - every view of every module is offered every other module's provides
//!   (never its own); an accepted pairing becomes one weighted edge;
//! - after all edges exist, each node's counter is armed with its inbound
//!   weight so sources start ready.

use std::sync::Arc;

use tracing::{debug, warn};

use super::node::DepNode;
use crate::errors::{DagflowError, Result};
use crate::module::Module;
use crate::relation::{AnyProvide, ProvideView, Relation, ViewKind};

/// One resolved pairing of a view with a provide, for visualization.
///
/// After-views are reported `producer → holder`, before-views
/// `holder → producer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    /// Name of the matched provide.
    pub provide: String,
    /// Pattern of the view that matched it.
    pub view: String,
}

pub(crate) struct BuiltGraph {
    pub nodes: Vec<DepNode>,
    pub edges: Vec<Edge>,
}

fn as_view(relation: &Relation) -> Option<&Arc<dyn ProvideView>> {
    match relation {
        Relation::View(view) => Some(view),
        Relation::Provide(_) => None,
    }
}

fn as_provide(relation: &Relation) -> Option<&Arc<dyn AnyProvide>> {
    match relation {
        Relation::Provide(provide) => Some(provide),
        Relation::View(_) => None,
    }
}

pub(crate) fn build(modules: &[(Arc<dyn Module>, String)]) -> Result<BuiltGraph> {
    let relations: Vec<Vec<Relation>> = modules.iter().map(|(module, _)| module.relations()).collect();

    check_duplicate_provides(modules, &relations)?;

    let nodes = modules
        .iter()
        .map(|(module, name)| DepNode::new(Arc::clone(module), name.clone()))
        .collect::<Result<Vec<_>>>()?;

    let mut edges = Vec::new();
    for (holder, holder_relations) in relations.iter().enumerate() {
        for view in holder_relations.iter().filter_map(as_view) {
            for (producer, producer_relations) in relations.iter().enumerate() {
                if producer == holder {
                    // A module never binds its own provides.
                    continue;
                }
                for provide in producer_relations.iter().filter_map(as_provide) {
                    if !view.accept(provide) {
                        continue;
                    }
                    // Runtime ordering is the same for both view kinds:
                    // the producer signals the holder in-round, and the
                    // holder's completion gates the producer's next round.
                    // The kind decides only the reported direction.
                    nodes[producer].add_after(holder);
                    nodes[holder].add_before(producer);
                    let (from, to) = match view.kind() {
                        ViewKind::After => (producer, holder),
                        ViewKind::Before => (holder, producer),
                    };
                    debug!(
                        from = %modules[from].1,
                        to = %modules[to].1,
                        provide = %provide.name(),
                        view = %view.pattern(),
                        "resolved edge"
                    );
                    edges.push(Edge {
                        from: modules[from].1.clone(),
                        to: modules[to].1.clone(),
                        provide: provide.name().to_string(),
                        view: view.pattern().to_string(),
                    });
                }
            }
        }
    }

    for (idx, module_relations) in relations.iter().enumerate() {
        for view in module_relations.iter().filter_map(as_view) {
            if !view.resolved() {
                warn!(
                    module = %modules[idx].1,
                    view = %view.pattern(),
                    "view matched no provide"
                );
            }
        }
    }

    for node in &nodes {
        node.finish_build();
    }

    Ok(BuiltGraph { nodes, edges })
}

fn check_duplicate_provides(
    modules: &[(Arc<dyn Module>, String)],
    relations: &[Vec<Relation>],
) -> Result<()> {
    let mut offending = Vec::new();
    for a in 0..relations.len() {
        for b in (a + 1)..relations.len() {
            for provide_a in relations[a].iter().filter_map(as_provide) {
                for provide_b in relations[b].iter().filter_map(as_provide) {
                    if provide_a.name() == provide_b.name()
                        && provide_a.value_type() == provide_b.value_type()
                    {
                        offending.push(format!(
                            "{}@{} ⇄ {}@{}",
                            provide_a.name(),
                            modules[a].1,
                            provide_b.name(),
                            modules[b].1,
                        ));
                    }
                }
            }
        }
    }
    if offending.is_empty() {
        Ok(())
    } else {
        Err(DagflowError::DuplicateProvides(offending.join("\n")))
    }
}
