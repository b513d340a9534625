//! Integration tests for the parcel factory and its admin gate.

use parcel_contracts::{ContractError, ContractEvent, ParcelState, ParcelTemplate, Runtime};
use parcel_protocol::crypto::{HashScheme, SecretHash};
use parcel_protocol::identity::Address;

fn owner() -> Address {
    Address::from_label("owner")
}

fn creator() -> Address {
    Address::from_label("creator")
}

fn hash(secret: &str) -> SecretHash {
    SecretHash::commit(HashScheme::Keccak256, secret.as_bytes())
}

#[test]
fn create_records_and_announces() {
    let rt = Runtime::new();
    let factory = rt.deploy_factory(owner(), ParcelTemplate::default());

    let parcel = rt.create_parcel(&factory, &creator(), hash("s")).unwrap();

    assert!(rt.is_parcel(&parcel));
    assert!(rt.factory(&factory, |f| f.is_factory_parcel(&parcel)).unwrap());
    assert_eq!(rt.factory(&factory, |f| f.parcel_count()).unwrap(), 1);
    assert!(rt.events().iter().any(|r| r.contract == factory
        && r.event
            == ContractEvent::ParcelCreated {
                parcel,
                creator: creator()
            }));
}

#[test]
fn pause_blocks_creation_but_not_existing_parcels() {
    let rt = Runtime::new();
    let factory = rt.deploy_factory(owner(), ParcelTemplate::default());
    let existing = rt.create_parcel(&factory, &creator(), hash("s")).unwrap();
    rt.mint_native(&creator(), 10).unwrap();

    rt.pause_factory(&factory, &owner()).unwrap();
    assert!(rt.factory(&factory, |f| f.paused()).unwrap());
    assert_eq!(
        rt.create_parcel(&factory, &creator(), hash("t")),
        Err(ContractError::FactoryPaused)
    );
    assert_eq!(rt.factory(&factory, |f| f.parcel_count()).unwrap(), 1);

    // The existing parcel runs its full lifecycle while the factory is paused.
    rt.deposit_native(&existing, &creator(), 10).unwrap();
    rt.lock_parcel(&existing, &creator()).unwrap();
    rt.open_parcel(&existing, &owner(), b"s").unwrap();
    assert_eq!(
        rt.parcel(&existing, |p| p.state()).unwrap(),
        ParcelState::Emptied
    );

    rt.unpause_factory(&factory, &owner()).unwrap();
    rt.create_parcel(&factory, &creator(), hash("t")).unwrap();
}

#[test]
fn only_owner_toggles_pause() {
    let rt = Runtime::new();
    let factory = rt.deploy_factory(owner(), ParcelTemplate::default());

    assert_eq!(
        rt.pause_factory(&factory, &creator()),
        Err(ContractError::AccessDenied)
    );
    rt.pause_factory(&factory, &owner()).unwrap();
    assert_eq!(
        rt.pause_factory(&factory, &owner()),
        Err(ContractError::AlreadyPaused)
    );
    assert_eq!(
        rt.unpause_factory(&factory, &creator()),
        Err(ContractError::AccessDenied)
    );
    rt.unpause_factory(&factory, &owner()).unwrap();
    assert_eq!(
        rt.unpause_factory(&factory, &owner()),
        Err(ContractError::NotPaused)
    );

    let names: Vec<&str> = rt
        .events()
        .iter()
        .filter(|r| r.contract == factory)
        .map(|r| r.event.name())
        .collect();
    assert_eq!(names, ["OwnershipTransferred", "Paused", "Unpaused"]);
}

#[test]
fn renounced_factory_can_never_be_paused() {
    let rt = Runtime::new();
    let factory = rt.deploy_factory(owner(), ParcelTemplate::default());
    rt.renounce_factory_ownership(&factory, &owner()).unwrap();

    assert!(rt.factory(&factory, |f| f.owner()).unwrap().is_zero());
    assert_eq!(
        rt.pause_factory(&factory, &owner()),
        Err(ContractError::AccessDenied)
    );
    rt.create_parcel(&factory, &creator(), hash("s")).unwrap();
}

#[test]
fn ownership_transfer_hands_over_the_gate() {
    let rt = Runtime::new();
    let factory = rt.deploy_factory(owner(), ParcelTemplate::default());
    let heir = Address::from_label("heir");

    rt.transfer_factory_ownership(&factory, &owner(), heir).unwrap();
    assert_eq!(rt.factory(&factory, |f| f.owner()).unwrap(), heir);
    assert_eq!(
        rt.pause_factory(&factory, &owner()),
        Err(ContractError::AccessDenied)
    );
    rt.pause_factory(&factory, &heir).unwrap();
}

#[test]
fn factories_keep_separate_registries() {
    let rt = Runtime::new();
    let a = rt.deploy_factory(owner(), ParcelTemplate::default());
    let b = rt.deploy_factory(owner(), ParcelTemplate::default());

    let from_a = rt.create_parcel(&a, &creator(), hash("s")).unwrap();
    let from_b = rt.create_parcel(&b, &creator(), hash("s")).unwrap();

    assert_ne!(from_a, from_b);
    assert!(rt.factory(&a, |f| f.is_factory_parcel(&from_a)).unwrap());
    assert!(!rt.factory(&a, |f| f.is_factory_parcel(&from_b)).unwrap());
}

#[test]
fn blake3_template_end_to_end() {
    let rt = Runtime::new();
    let factory = rt.deploy_factory(owner(), ParcelTemplate::with_scheme(HashScheme::Blake3));
    let parcel = rt
        .create_parcel(
            &factory,
            &creator(),
            SecretHash::commit(HashScheme::Blake3, b"k"),
        )
        .unwrap();
    rt.lock_parcel(&parcel, &creator()).unwrap();

    // A SHA-256 preimage check would not match this commitment.
    rt.open_parcel(&parcel, &owner(), b"k").unwrap();
}
