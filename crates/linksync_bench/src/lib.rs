//! Benchmark utilities.

use linksync_core::{Identifier, LinkFacts};
use std::collections::BTreeSet;

/// Generates `count` identifiers named `e0`, `e1`, ...
pub fn generate_ids(count: usize) -> BTreeSet<Identifier> {
    (0..count).map(|i| Identifier::from(format!("e{i}"))).collect()
}

/// Facts with `count` identifiers present only in the source.
pub fn unshared_facts(count: usize) -> LinkFacts {
    let mut facts = LinkFacts::new();
    facts.source = generate_ids(count);
    facts
}

/// Facts with `count` identifiers settled in every component.
pub fn shared_facts(count: usize) -> LinkFacts {
    let ids = generate_ids(count);
    let mut facts = LinkFacts::new();
    facts.source = ids.clone();
    facts.outbound = ids.clone();
    facts.local = ids;
    facts
}
