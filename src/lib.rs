// src/lib.rs

//! Readiness-driven dataflow DAG scheduler.
//!
//! `dagflow` wires user [`Module`]s together from declarative relations: a
//! module *provides* named, typed values, and *requires* or *recycles*
//! values of other modules. The resolved graph runs as a rolling pipeline:
//!
//! - a require edge makes the consumer run after its producer each round;
//! - a recycle edge keeps the producer from re-running until the holder
//!   has released its previous output;
//! - a module may additionally gate itself on a file descriptor, running
//!   only when the fd is readable and its edges are satisfied.
//!
//! Each node carries an eventfd-backed token; a single epoll instance
//! multiplexes them, and any number of worker threads drive execution by
//! looping on [`Epoll::wait_and_dispatch`]. Failures propagate one hop per
//! round along the graph instead of tearing it down, and a module can
//! remove itself at runtime by returning [`ExecuteError::Stop`].
//!
//! Cyclic wiring is not detected and will deadlock; keep the relation
//! graph acyclic.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dagflow::{Epoll, Module, Pipeline, Provide, Relation, Require};
//!
//! struct Source {
//!     out: Arc<Provide<u64>>,
//! }
//!
//! impl Module for Source {
//!     fn relations(&self) -> Vec<Relation> {
//!         vec![self.out.clone().into()]
//!     }
//!     fn execute(&self) -> Result<(), dagflow::ExecuteError> {
//!         self.out.set(42);
//!         Ok(())
//!     }
//! }
//!
//! let poller = Arc::new(Epoll::new()?);
//! let source = Arc::new(Source { out: Provide::new("answer", 0) });
//! let pipeline = Pipeline::new(
//!     vec![(source as Arc<dyn Module>, "source".into())],
//!     poller.clone(),
//! )?;
//!
//! // One or more worker threads:
//! loop {
//!     poller.wait_and_dispatch(None)?;
//! }
//! ```

pub mod errors;
pub mod event;
pub mod graph;
pub mod module;
pub mod pipeline;
pub mod poll;
pub mod relation;

pub use errors::{DagflowError, ExecuteError, Result};
pub use event::Event;
pub use graph::Edge;
pub use module::Module;
pub use pipeline::Pipeline;
pub use poll::{Epoll, FdCallback, FdMode, Poller};
pub use relation::{
    AnyProvide, OrderAfter, OrderBefore, Provide, ProvideView, Recycle, Recycles, Relation,
    Require, Requires, ViewKind,
};
