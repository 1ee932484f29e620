//! File store tests driven through the bus.

use linksync_bus::{bootstrap, delete, pull, BusCommand, ServiceConfig, Tally};
use linksync_core::{Identifier, LinkFacts, LinkGateway, State};
use linksync_store::{FileGateway, StoreConfig, StoreDir, StoreError};
use linksync_testkit::prelude::*;
use std::sync::Arc;

fn seeded(temp: &TempStoreDir, facts: &LinkFacts) -> StoreConfig {
    let dir = StoreDir::open(&temp.store_path(), true).unwrap();
    dir.save(facts, true).unwrap();
    StoreConfig::new(temp.store_path())
}

#[test]
fn batch_pull_is_persisted() {
    let temp = TempStoreDir::new();
    let config = seeded(&temp, &scenarios::unshared_source(3).build());

    {
        let gateway = Arc::new(FileGateway::open(config.clone()).unwrap());
        let mut bus = bootstrap(Arc::clone(&gateway), ServiceConfig::default()).unwrap();
        let tally = Tally::new();
        tally.attach(&mut bus);

        bus.handle(BusCommand::PullEntities {
            requested: ids(&["e0", "e2"]),
        })
        .unwrap();
        assert_eq!(tally.counts().settled, 2);
    }

    let gateway = FileGateway::open(config).unwrap();
    let link = gateway.create_link().unwrap();
    assert_eq!(link.identifiers_with_state(State::Shared), ids(&["e0", "e2"]));
    assert_eq!(link.identifiers_with_state(State::Unshared), ids(&["e1"]));
    assert_eq!(gateway.facts().outbound, ids(&["e0", "e2"]));
}

#[test]
fn pull_then_delete_round_trip() {
    let temp = TempStoreDir::new();
    let config = StoreConfig::new(temp.store_path()).with_create_if_missing(true);
    let gateway = FileGateway::open(config).unwrap();
    gateway.add_to_source(ids(&["a", "b"])).unwrap();
    let service = ServiceConfig::default();

    pull(&gateway, &ids(&["a", "b"]), &service).unwrap();
    gateway.taint(ids(&["b"])).unwrap();
    let response = delete(&gateway, &ids(&["a", "b"]), &service).unwrap();

    assert_eq!(response.final_states[&Identifier::from("a")], State::Unshared);
    assert_eq!(response.final_states[&Identifier::from("b")], State::Deprecated);
    let facts = gateway.facts();
    assert!(facts.local.is_empty());
    assert!(facts.pull.is_empty() && facts.delete.is_empty());
}

#[test]
fn second_gateway_is_locked_out() {
    let temp = TempStoreDir::new();
    let config = StoreConfig::new(temp.store_path()).with_create_if_missing(true);
    let _first = FileGateway::open(config.clone()).unwrap();

    let err = FileGateway::open(config).unwrap_err();
    assert!(matches!(err, StoreError::Locked { .. }));
}

#[test]
fn untaint_clears_flag() {
    let temp = TempStoreDir::new();
    let config = seeded(&temp, &FactsBuilder::new().tainted("x").build());
    let gateway = FileGateway::open(config).unwrap();

    assert!(gateway.untaint(ids(&["x"])).unwrap().is_empty());

    let link = gateway.create_link().unwrap();
    assert!(link.tainted_identifiers().is_empty());
    assert_eq!(link.identifiers_with_state(State::Shared), ids(&["x"]));
}

#[test]
fn missing_store_without_create() {
    let temp = TempStoreDir::new();
    let err = FileGateway::open(StoreConfig::new(temp.store_path())).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[test]
fn untaint_keeps_deprecated_store_loadable() {
    let temp = TempStoreDir::new();
    let config = StoreConfig::new(temp.store_path()).with_create_if_missing(true);
    {
        let gateway = FileGateway::open(config.clone()).unwrap();
        gateway.add_to_source(ids(&["1", "2"])).unwrap();
        gateway.taint(ids(&["1", "2"])).unwrap();
        pull(&gateway, &ids(&["1"]), &ServiceConfig::default()).unwrap();

        let kept = gateway.untaint(ids(&["1", "2"])).unwrap();

        assert_eq!(kept, ids(&["1"]));
        assert!(gateway.create_link().is_ok());
    }

    let gateway = FileGateway::open(config).unwrap();
    let link = gateway.create_link().unwrap();
    assert_eq!(link.identifiers_with_state(State::Deprecated), ids(&["1"]));
    assert_eq!(link.identifiers_with_state(State::Unshared), ids(&["2"]));
    assert_eq!(link.tainted_identifiers(), ids(&["1"]));
}
