// tests/scheduler_property.rs

//! Property test: on randomly generated acyclic wirings, every resolved
//! edge obeys the per-round ordering law and the whole graph keeps
//! cycling. Generation keeps the graph acyclic by only letting module N
//! require provides of modules 0..N-1.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;

use dagflow::{Epoll, Pipeline, Provide, Require};
use dagflow_test_utils::builders::{count, entry, new_log, nth_pos, ScriptedModuleBuilder};

use crate::common::drive_until;

/// Dependency lists: `deps[n]` holds indices < n.
fn layered_deps_strategy(max_modules: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (2..=max_modules).prop_flat_map(|module_count| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..module_count),
            module_count,
        )
        .prop_map(move |raw| {
            raw.into_iter()
                .enumerate()
                .map(|(n, candidates)| {
                    let mut deps = HashSet::new();
                    for candidate in candidates {
                        if n > 0 {
                            deps.insert(candidate % n);
                        }
                    }
                    let mut deps: Vec<usize> = deps.into_iter().collect();
                    deps.sort_unstable();
                    deps
                })
                .collect()
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    #[ignore]
    fn every_edge_obeys_the_round_ordering_law(deps in layered_deps_strategy(8)) {
        let log = new_log();
        let mut entries = Vec::new();

        for (n, module_deps) in deps.iter().enumerate() {
            let name = format!("m{n}");
            let mut builder = ScriptedModuleBuilder::new(&name, &log)
                .relation(Provide::new(format!("p{n}"), 0i64));
            for dep in module_deps {
                builder = builder.relation(Require::<i64>::new(&format!("p{dep}")).unwrap());
            }
            entries.push(entry(builder.build(), &name));
        }

        let epoll = Arc::new(Epoll::new().unwrap());
        let pipeline = Pipeline::new(entries, epoll.clone()).unwrap();
        prop_assert_eq!(
            pipeline.edges().len(),
            deps.iter().map(Vec::len).sum::<usize>()
        );

        let labels: Vec<String> = (0..deps.len()).map(|n| format!("m{n}")).collect();
        let report = drive_until(&epoll, 1024, || {
            labels.iter().all(|label| count(&log, label) >= 3)
        });
        prop_assert!(report.failures.is_empty());

        for (consumer, module_deps) in deps.iter().enumerate() {
            for producer in module_deps {
                let producer = &labels[*producer];
                let consumer = &labels[consumer];
                for k in 1..=3 {
                    let producer_pos = nth_pos(&log, producer, k).unwrap();
                    let consumer_pos = nth_pos(&log, consumer, k).unwrap();
                    prop_assert!(
                        producer_pos < consumer_pos,
                        "round {}: {} at {}, {} at {}",
                        k, producer, producer_pos, consumer, consumer_pos
                    );
                }
            }
        }

        drop(pipeline);
    }
}
