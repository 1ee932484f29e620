//! Property-based test generators using proptest.
//!
//! Every generated [`LinkFacts`] is reachable: each identifier is placed in
//! the components, taint set and process set of one valid state.

use crate::fixtures::FactsBuilder;
use linksync_core::{Identifier, LinkFacts, Operation, Process, State};
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Strategy for generating identifiers.
pub fn identifier_strategy() -> impl Strategy<Value = Identifier> {
    prop::string::string_regex("[a-z][a-z0-9]{0,7}")
        .expect("Invalid regex")
        .prop_map(Identifier::new)
}

/// Strategy for generating operations.
pub fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop::sample::select(Operation::ALL.to_vec())
}

/// Strategy for generating a reachable `(state, process, is_tainted)` triple.
pub fn entity_shape_strategy() -> impl Strategy<Value = (State, Process, bool)> {
    prop_oneof![
        3 => any::<bool>().prop_map(|t| (State::Unshared, Process::None, t)),
        1 => (prop::sample::select(vec![Process::Pull, Process::Delete]), any::<bool>())
            .prop_map(|(p, t)| (State::Activated, p, t)),
        1 => (prop::sample::select(vec![Process::Pull, Process::Delete]), any::<bool>())
            .prop_map(|(p, t)| (State::Received, p, t)),
        2 => Just((State::Shared, Process::None, false)),
        1 => Just((State::Tainted, Process::None, true)),
        1 => Just((State::Deprecated, Process::None, true)),
    ]
}

/// Strategy for generating reachable link facts with up to `max_entities`
/// identifiers.
pub fn link_facts_strategy(max_entities: usize) -> impl Strategy<Value = LinkFacts> {
    prop::collection::btree_map(identifier_strategy(), entity_shape_strategy(), 1..=max_entities)
        .prop_map(|shapes| {
            shapes
                .into_iter()
                .fold(FactsBuilder::new(), |builder, (id, (state, process, tainted))| {
                    builder.entity(id, state, process, tainted)
                })
                .build()
        })
}

/// Strategy for generating facts together with a non-empty request drawn
/// from the source.
pub fn facts_with_request_strategy(
    max_entities: usize,
) -> impl Strategy<Value = (LinkFacts, BTreeSet<Identifier>)> {
    link_facts_strategy(max_entities).prop_flat_map(|facts| {
        let source: Vec<Identifier> = facts.source.iter().cloned().collect();
        let len = source.len();
        let request = prop::sample::subsequence(source, 1..=len)
            .prop_map(|picked| picked.into_iter().collect::<BTreeSet<_>>());
        (Just(facts), request)
    })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linksync_core::Link;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn generated_facts_load(facts in link_facts_strategy(16)) {
            let link = Link::create(&facts).unwrap();
            prop_assert_eq!(link.len(), facts.source.len());
            prop_assert_eq!(link.to_facts(), facts);
        }

        #[test]
        fn requests_are_drawn_from_source((facts, requested) in facts_with_request_strategy(8)) {
            prop_assert!(!requested.is_empty());
            prop_assert!(requested.is_subset(&facts.source));
        }
    }
}
