// tests/self_stop.rs

//! Scenario: in the chain A → B → C, B stops itself on its second run.
//! B's edges are severed on both sides: A and C keep cycling on their own,
//! no longer ordered against each other, and B is never re-entered.

mod common;

use std::sync::Arc;

use dagflow::{Epoll, Pipeline, Provide, Require};
use dagflow_test_utils::builders::{count, entry, new_log, ScriptedModuleBuilder};

use crate::common::{drive_until, init_tracing};

#[test]
fn stopped_module_is_removed_and_the_rest_keeps_running() {
    init_tracing();
    let log = new_log();

    let a = ScriptedModuleBuilder::new("A", &log)
        .relation(Provide::new("x", 0i64))
        .build();
    let b = ScriptedModuleBuilder::new("B", &log)
        .relation(Require::<i64>::new("x").unwrap())
        .relation(Provide::new("y", 0i64))
        .stop_on(2)
        .build();
    let c = ScriptedModuleBuilder::new("C", &log)
        .relation(Require::<i64>::new("y").unwrap())
        .build();

    let epoll = Arc::new(Epoll::new().unwrap());
    let pipeline = Pipeline::new(
        vec![entry(a, "A"), entry(b, "B"), entry(c, "C")],
        epoll.clone(),
    )
    .unwrap();

    let report = drive_until(&epoll, 64, || count(&log, "A") >= 4 && count(&log, "C") >= 4);

    // The stop surfaced to the worker exactly once, as non-fatal.
    assert_eq!(report.stops, ["B"]);
    assert!(report.failures.is_empty());

    // B's body ran only in round 1; the stop run does not execute it, and
    // the node is never scheduled again.
    assert_eq!(count(&log, "B"), 1);

    // Once severed, the survivors keep cycling unattended.
    drive_until(&epoll, 64, || count(&log, "A") >= 8 && count(&log, "C") >= 8);
    assert_eq!(count(&log, "B"), 1);

    drop(pipeline);
}
