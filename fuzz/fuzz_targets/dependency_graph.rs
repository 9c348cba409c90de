#![no_main]

use ferrous_inject::{Binder, DiError};
use libfuzzer_sys::fuzz_target;

// Each byte pair is an alias edge between tagged u64 bindings. Resolution
// must either reach a value, report a cycle, or report a missing binding.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 || data.len() > 128 {
        return;
    }

    let node_count = (data[0] % 16) as usize + 1;
    let mut targets: Vec<Option<usize>> = vec![None; node_count];
    for pair in data[1..].chunks_exact(2) {
        let from = pair[0] as usize % node_count;
        targets[from] = Some(pair[1] as usize % (node_count + 1));
    }

    let mut binder = Binder::new();
    for (node, target) in targets.iter().enumerate() {
        let builder = binder.bind::<u64>().with_tag(&format!("n{}", node));
        match target {
            Some(t) if *t < node_count => builder.to_tagged(&format!("n{}", t)).unwrap(),
            // One past the last node is a dangling alias.
            Some(_) => builder.to_tagged("missing").unwrap(),
            None => builder.to_instance(node as u64).unwrap(),
        };
    }
    let injector = binder.build();

    for node in 0..node_count {
        // Follow the edges to predict the outcome.
        let mut seen = vec![false; node_count];
        let mut current = node;
        let expected = loop {
            if seen[current] {
                break Expected::Cycle;
            }
            seen[current] = true;
            match targets[current] {
                None => break Expected::Value(current as u64),
                Some(t) if t < node_count => current = t,
                Some(_) => break Expected::Missing,
            }
        };

        let result = injector.get_tagged::<u64>(&format!("n{}", node));
        match (expected, result) {
            (Expected::Value(v), Ok(got)) => assert_eq!(*got, v),
            (Expected::Cycle, Err(DiError::Circular(chain))) => {
                assert!(chain.len() >= 2);
                assert_eq!(chain.first(), chain.last());
            }
            (Expected::Missing, Err(DiError::Unresolved(_))) => {}
            (expected, other) => panic!("expected {:?}, got {:?}", expected, other),
        }
    }
});

#[derive(Debug)]
enum Expected {
    Value(u64),
    Cycle,
    Missing,
}
