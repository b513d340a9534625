//! # Runtime
//!
//! The in-process execution environment that hosts parcels, factories and
//! asset ledgers, and supplies caller identity to every entrypoint.
//!
//! ## Concurrency
//!
//! - Every parcel and every factory sits behind its own mutex. Calls on the
//!   same instance are serialized; calls on different instances run in
//!   parallel up to the point where they touch the ledgers.
//! - [`Ledgers`] sit behind a single mutex.
//! - Lock order is always *instance, then ledgers, then event log*. A safe
//!   NFT transfer into a parcel locks the receiving parcel first, so the
//!   receiver hook runs inside that parcel's critical section.
//! - Handles are cloned out of the `DashMap`s before locking; no map guard is
//!   held across a mutex acquisition.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use parcel_protocol::config::{DEFAULT_TOKEN_DECIMALS, RUNTIME_DEPLOYER_LABEL};
use parcel_protocol::crypto::SecretHash;
use parcel_protocol::identity::Address;
use parcel_protocol::vault::{
    FungibleToken, LedgerError, Ledgers, NftCollection, SafeTransferError,
};

use crate::custody::AssetCustody;
use crate::error::ContractError;
use crate::events::{ContractEvent, EventRecord};
use crate::parcel::{Parcel, ParcelState, ParcelSummary};
use crate::parcel_factory::ParcelFactory;
use crate::template::ParcelTemplate;

pub struct Runtime {
    ledgers: Mutex<Ledgers>,
    parcels: DashMap<Address, Arc<Mutex<Parcel>>>,
    factories: DashMap<Address, Arc<Mutex<ParcelFactory>>>,
    events: RwLock<Vec<EventRecord>>,
    deployer: Address,
    nonce: AtomicU64,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            ledgers: Mutex::new(Ledgers::new()),
            parcels: DashMap::new(),
            factories: DashMap::new(),
            events: RwLock::new(Vec::new()),
            deployer: Address::from_label(RUNTIME_DEPLOYER_LABEL),
            nonce: AtomicU64::new(0),
        }
    }

    fn next_address(&self) -> Address {
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed) + 1;
        Address::derive_contract(&self.deployer, nonce)
    }

    // ---------------------------------------------------------------------
    // Assets
    // ---------------------------------------------------------------------

    pub fn deploy_token(&self, name: &str, symbol: &str, decimals: Option<u8>) -> Result<Address, ContractError> {
        let address = self.next_address();
        let token = FungibleToken::new(
            address,
            name,
            symbol,
            decimals.unwrap_or(DEFAULT_TOKEN_DECIMALS),
        );
        self.ledgers.lock().deploy_token(token)?;
        info!(token = %address, symbol, "token deployed");
        Ok(address)
    }

    pub fn deploy_collection(&self, name: &str, symbol: &str) -> Result<Address, ContractError> {
        let address = self.next_address();
        self.ledgers
            .lock()
            .deploy_collection(NftCollection::new(address, name, symbol))?;
        info!(collection = %address, symbol, "collection deployed");
        Ok(address)
    }

    /// Native faucet. Returns the new balance.
    pub fn mint_native(&self, to: &Address, amount: u64) -> Result<u64, ContractError> {
        Ok(self.ledgers.lock().mint_native(to, amount)?)
    }

    pub fn native_balance(&self, holder: &Address) -> u64 {
        self.ledgers.lock().native_balance(holder)
    }

    /// Token faucet. Returns the new balance.
    pub fn mint_tokens(&self, token: &Address, to: &Address, amount: u64) -> Result<u64, ContractError> {
        let mut ledgers = self.ledgers.lock();
        let balance = ledgers
            .token_mut(token)?
            .mint(to, amount)
            .map_err(LedgerError::from)?;
        Ok(balance)
    }

    pub fn approve_tokens(
        &self,
        owner: &Address,
        token: &Address,
        spender: &Address,
        amount: u64,
    ) -> Result<(), ContractError> {
        self.ledgers.lock().token_mut(token)?.approve(owner, spender, amount);
        debug!(token = %token, owner = %owner, spender = %spender, amount, "allowance set");
        Ok(())
    }

    pub fn token_balance(&self, token: &Address, holder: &Address) -> Result<u64, ContractError> {
        Ok(self.ledgers.lock().token(token)?.balance_of(holder))
    }

    pub fn token_allowance(
        &self,
        token: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<u64, ContractError> {
        Ok(self.ledgers.lock().token(token)?.allowance(owner, spender))
    }

    /// Mints the next id of `collection` to `to`.
    pub fn mint_nft(&self, collection: &Address, to: &Address) -> Result<u64, ContractError> {
        let mut ledgers = self.ledgers.lock();
        let id = ledgers
            .collection_mut(collection)?
            .mint(to)
            .map_err(LedgerError::from)?;
        Ok(id)
    }

    pub fn approve_nft(
        &self,
        owner: &Address,
        collection: &Address,
        approved: &Address,
        token_id: u64,
    ) -> Result<(), ContractError> {
        let mut ledgers = self.ledgers.lock();
        ledgers
            .collection_mut(collection)?
            .approve(owner, approved, token_id)
            .map_err(LedgerError::from)?;
        Ok(())
    }

    pub fn nft_owner(&self, collection: &Address, token_id: u64) -> Result<Option<Address>, ContractError> {
        Ok(self.ledgers.lock().collection(collection)?.owner_of(token_id))
    }

    /// Plain NFT transfer. The receiver is not consulted, so an NFT sent this
    /// way to a parcel is not recorded in its custody.
    pub fn transfer_nft(
        &self,
        caller: &Address,
        collection: &Address,
        from: &Address,
        to: &Address,
        token_id: u64,
    ) -> Result<(), ContractError> {
        let mut ledgers = self.ledgers.lock();
        ledgers
            .collection_mut(collection)?
            .transfer_from(caller, from, to, token_id)
            .map_err(LedgerError::from)?;
        Ok(())
    }

    /// NFT transfer that asks the receiver to accept custody when `to` is a
    /// parcel. This is the NFT deposit path.
    pub fn safe_transfer_nft(
        &self,
        caller: &Address,
        collection: &Address,
        from: &Address,
        to: &Address,
        token_id: u64,
    ) -> Result<(), ContractError> {
        let result = match self.parcel_handle(to) {
            Ok(handle) => {
                let mut parcel = handle.lock();
                let mut ledgers = self.ledgers.lock();
                let registry = ledgers.collection_mut(collection)?;
                let moved =
                    registry.safe_transfer_from(caller, from, to, token_id, Some(&mut *parcel));
                moved
            }
            Err(_) => {
                let mut ledgers = self.ledgers.lock();
                let registry = ledgers.collection_mut(collection)?;
                let moved =
                    registry.safe_transfer_from(caller, from, to, token_id, None::<&mut Parcel>);
                moved
            }
        };

        result.map_err(|err| match err {
            SafeTransferError::Registry(e) => ContractError::TransferFailed(e.into()),
            SafeTransferError::Rejected(e) => e,
        })
    }

    /// Read access to the full ledger state.
    pub fn with_ledgers<T>(&self, f: impl FnOnce(&Ledgers) -> T) -> T {
        f(&self.ledgers.lock())
    }

    /// Test and operator hook: runs `f` with mutable ledger access, e.g. to
    /// freeze an asset.
    pub fn with_ledgers_mut<T>(&self, f: impl FnOnce(&mut Ledgers) -> T) -> T {
        f(&mut self.ledgers.lock())
    }

    // ---------------------------------------------------------------------
    // Contract deployment
    // ---------------------------------------------------------------------

    pub fn deploy_factory(&self, owner: Address, template: ParcelTemplate) -> Address {
        let address = self.next_address();
        let mut factory = ParcelFactory::new(address, owner, template);
        let events = factory.take_events();
        self.factories.insert(address, Arc::new(Mutex::new(factory)));
        self.record(&address, events);
        info!(factory = %address, owner = %owner, "factory deployed");
        address
    }

    /// Deploys a parcel directly, without a factory. It stays
    /// `Uninitialized` until someone calls [`initialize_parcel`](Self::initialize_parcel).
    pub fn deploy_parcel(&self, deployer: &Address, template: ParcelTemplate) -> Address {
        let address = self.next_address();
        let parcel = Parcel::new(address, Arc::new(template));
        self.parcels.insert(address, Arc::new(Mutex::new(parcel)));
        info!(parcel = %address, deployer = %deployer, "parcel deployed");
        address
    }

    // ---------------------------------------------------------------------
    // Factory entrypoints
    // ---------------------------------------------------------------------

    pub fn create_parcel(
        &self,
        factory: &Address,
        caller: &Address,
        hashed_secret: SecretHash,
    ) -> Result<Address, ContractError> {
        let handle = self.factory_handle(factory)?;
        let mut factory_guard = handle.lock();
        let mut parcel = factory_guard.create_parcel(caller, hashed_secret)?;

        let address = *parcel.address();
        let parcel_events = parcel.take_events();
        self.parcels.insert(address, Arc::new(Mutex::new(parcel)));

        self.record(&address, parcel_events);
        self.record(factory, factory_guard.take_events());
        Ok(address)
    }

    pub fn pause_factory(&self, factory: &Address, caller: &Address) -> Result<(), ContractError> {
        self.with_factory_mut(factory, |f| f.pause(caller))
    }

    pub fn unpause_factory(&self, factory: &Address, caller: &Address) -> Result<(), ContractError> {
        self.with_factory_mut(factory, |f| f.unpause(caller))
    }

    pub fn transfer_factory_ownership(
        &self,
        factory: &Address,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), ContractError> {
        self.with_factory_mut(factory, |f| f.transfer_ownership(caller, new_owner))
    }

    pub fn renounce_factory_ownership(
        &self,
        factory: &Address,
        caller: &Address,
    ) -> Result<(), ContractError> {
        self.with_factory_mut(factory, |f| f.renounce_ownership(caller))
    }

    /// Read access to a factory.
    pub fn factory<T>(
        &self,
        factory: &Address,
        f: impl FnOnce(&ParcelFactory) -> T,
    ) -> Result<T, ContractError> {
        let handle = self.factory_handle(factory)?;
        let guard = handle.lock();
        Ok(f(&guard))
    }

    // ---------------------------------------------------------------------
    // Parcel entrypoints
    // ---------------------------------------------------------------------

    pub fn initialize_parcel(
        &self,
        parcel: &Address,
        hashed_secret: SecretHash,
        sender: Address,
    ) -> Result<(), ContractError> {
        self.with_parcel_mut(parcel, |p| p.initialize(hashed_secret, sender))
    }

    pub fn deposit_native(
        &self,
        parcel: &Address,
        caller: &Address,
        amount: u64,
    ) -> Result<u64, ContractError> {
        self.with_parcel_and_ledgers(parcel, |p, l| p.deposit_native(caller, amount, l))
    }

    pub fn add_tokens(
        &self,
        parcel: &Address,
        caller: &Address,
        token: &Address,
        amount: u64,
    ) -> Result<u64, ContractError> {
        self.with_parcel_and_ledgers(parcel, |p, l| p.add_tokens(caller, token, amount, l))
    }

    pub fn lock_parcel(&self, parcel: &Address, caller: &Address) -> Result<(), ContractError> {
        self.with_parcel_mut(parcel, |p| p.lock(caller))
    }

    pub fn make_communal(&self, parcel: &Address, caller: &Address) -> Result<(), ContractError> {
        self.with_parcel_mut(parcel, |p| p.make_communal(caller))
    }

    pub fn update_hashed_secret(
        &self,
        parcel: &Address,
        caller: &Address,
        new_hash: SecretHash,
    ) -> Result<(), ContractError> {
        self.with_parcel_mut(parcel, |p| p.update_hashed_secret(caller, new_hash))
    }

    /// Presents `secret`; on success everything in the parcel goes to
    /// `caller` and the paid-out record is returned.
    pub fn open_parcel(
        &self,
        parcel: &Address,
        caller: &Address,
        secret: &[u8],
    ) -> Result<AssetCustody, ContractError> {
        self.with_parcel_and_ledgers(parcel, |p, l| p.open(caller, secret, l))
    }

    /// Read access to a parcel.
    pub fn parcel<T>(&self, parcel: &Address, f: impl FnOnce(&Parcel) -> T) -> Result<T, ContractError> {
        let handle = self.parcel_handle(parcel)?;
        let guard = handle.lock();
        Ok(f(&guard))
    }

    pub fn parcel_summary(&self, parcel: &Address) -> Result<ParcelSummary, ContractError> {
        self.parcel(parcel, Parcel::summary)
    }

    pub fn is_parcel(&self, address: &Address) -> bool {
        self.parcels.contains_key(address)
    }

    pub fn parcel_addresses(&self) -> Vec<Address> {
        let mut out: Vec<Address> = self.parcels.iter().map(|e| *e.key()).collect();
        out.sort();
        out
    }

    /// Number of hosted parcels currently in `state`.
    pub fn count_parcels_in(&self, state: ParcelState) -> usize {
        let handles: Vec<Arc<Mutex<Parcel>>> =
            self.parcels.iter().map(|e| Arc::clone(e.value())).collect();
        handles.iter().filter(|h| h.lock().state() == state).count()
    }

    // ---------------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------------

    pub fn events(&self) -> Vec<EventRecord> {
        self.events.read().clone()
    }

    /// Up to `limit` records starting at sequence number `cursor`.
    pub fn events_since(&self, cursor: u64, limit: usize) -> Vec<EventRecord> {
        let log = self.events.read();
        let start = usize::try_from(cursor).unwrap_or(usize::MAX).min(log.len());
        log[start..].iter().take(limit).cloned().collect()
    }

    pub fn event_count(&self) -> u64 {
        self.events.read().len() as u64
    }

    fn record(&self, contract: &Address, events: Vec<ContractEvent>) {
        if events.is_empty() {
            return;
        }
        let mut log = self.events.write();
        let timestamp = Utc::now();
        for event in events {
            let sequence = log.len() as u64;
            log.push(EventRecord {
                sequence,
                contract: *contract,
                timestamp,
                event,
            });
        }
    }

    // ---------------------------------------------------------------------
    // Plumbing
    // ---------------------------------------------------------------------

    fn parcel_handle(&self, address: &Address) -> Result<Arc<Mutex<Parcel>>, ContractError> {
        self.parcels
            .get(address)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ContractError::UnknownContract(*address))
    }

    fn factory_handle(&self, address: &Address) -> Result<Arc<Mutex<ParcelFactory>>, ContractError> {
        self.factories
            .get(address)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ContractError::UnknownContract(*address))
    }

    fn with_parcel_mut<T>(
        &self,
        parcel: &Address,
        f: impl FnOnce(&mut Parcel) -> Result<T, ContractError>,
    ) -> Result<T, ContractError> {
        let handle = self.parcel_handle(parcel)?;
        let mut guard = handle.lock();
        let out = f(&mut guard);
        self.record(parcel, guard.take_events());
        out
    }

    fn with_parcel_and_ledgers<T>(
        &self,
        parcel: &Address,
        f: impl FnOnce(&mut Parcel, &mut Ledgers) -> Result<T, ContractError>,
    ) -> Result<T, ContractError> {
        let handle = self.parcel_handle(parcel)?;
        let mut guard = handle.lock();
        let out = {
            let mut ledgers = self.ledgers.lock();
            f(&mut guard, &mut ledgers)
        };
        self.record(parcel, guard.take_events());
        out
    }

    fn with_factory_mut<T>(
        &self,
        factory: &Address,
        f: impl FnOnce(&mut ParcelFactory) -> Result<T, ContractError>,
    ) -> Result<T, ContractError> {
        let handle = self.factory_handle(factory)?;
        let mut guard = handle.lock();
        let out = f(&mut guard);
        self.record(factory, guard.take_events());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_protocol::crypto::HashScheme;

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn bob() -> Address {
        Address::from_label("bob")
    }

    fn hash(secret: &str) -> SecretHash {
        SecretHash::commit(HashScheme::Keccak256, secret.as_bytes())
    }

    #[test]
    fn deployments_get_distinct_addresses() {
        let rt = Runtime::new();
        let t = rt.deploy_token("A", "A", None).unwrap();
        let c = rt.deploy_collection("B", "B").unwrap();
        let f = rt.deploy_factory(alice(), ParcelTemplate::default());
        assert_ne!(t, c);
        assert_ne!(c, f);
    }

    #[test]
    fn unknown_contract_reported() {
        let rt = Runtime::new();
        let ghost = Address::from_label("ghost");
        assert_eq!(
            rt.lock_parcel(&ghost, &alice()),
            Err(ContractError::UnknownContract(ghost))
        );
        assert_eq!(
            rt.pause_factory(&ghost, &alice()),
            Err(ContractError::UnknownContract(ghost))
        );
    }

    #[test]
    fn unknown_asset_reported() {
        let rt = Runtime::new();
        let ghost = Address::from_label("ghost");
        assert_eq!(
            rt.mint_tokens(&ghost, &alice(), 1),
            Err(ContractError::UnknownAsset(ghost))
        );
    }

    #[test]
    fn direct_deployment_then_initialize() {
        let rt = Runtime::new();
        let p = rt.deploy_parcel(&alice(), ParcelTemplate::default());
        assert_eq!(rt.parcel(&p, |p| p.state()).unwrap(), ParcelState::Uninitialized);

        rt.initialize_parcel(&p, hash("s"), bob()).unwrap();
        assert_eq!(rt.parcel(&p, |p| p.sender()).unwrap(), Some(bob()));
        assert_eq!(
            rt.initialize_parcel(&p, hash("s"), alice()),
            Err(ContractError::AlreadyInitialized)
        );
    }

    #[test]
    fn events_are_sequenced_and_paged() {
        let rt = Runtime::new();
        let f = rt.deploy_factory(alice(), ParcelTemplate::default());
        let p = rt.create_parcel(&f, &bob(), hash("s")).unwrap();
        rt.pause_factory(&f, &alice()).unwrap();

        let names: Vec<&str> = rt.events().iter().map(|r| r.event.name()).collect();
        assert_eq!(
            names,
            ["OwnershipTransferred", "Initialized", "ParcelCreated", "Paused"]
        );
        assert!(rt.events().iter().enumerate().all(|(i, r)| r.sequence == i as u64));
        assert_eq!(rt.events()[1].contract, p);

        let page = rt.events_since(2, 1);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].event.name(), "ParcelCreated");
        assert!(rt.events_since(100, 10).is_empty());
    }

    #[test]
    fn safe_transfer_to_account_needs_no_receiver() {
        let rt = Runtime::new();
        let c = rt.deploy_collection("Art", "ART").unwrap();
        let id = rt.mint_nft(&c, &alice()).unwrap();
        rt.safe_transfer_nft(&alice(), &c, &alice(), &bob(), id).unwrap();
        assert_eq!(rt.nft_owner(&c, id).unwrap(), Some(bob()));
    }

    #[test]
    fn self_deposit_cannot_strand_a_communal_parcel() {
        let rt = Runtime::new();
        let template = ParcelTemplate {
            communal_by_default: true,
            ..ParcelTemplate::default()
        };
        let f = rt.deploy_factory(alice(), template);
        let c = rt.deploy_collection("Art", "ART").unwrap();
        let id = rt.mint_nft(&c, &bob()).unwrap();
        rt.mint_native(&bob(), 10).unwrap();

        let p = rt.create_parcel(&f, &bob(), hash("s")).unwrap();
        rt.deposit_native(&p, &bob(), 10).unwrap();
        rt.safe_transfer_nft(&bob(), &c, &bob(), &p, id).unwrap();

        assert_eq!(rt.deposit_native(&p, &p, 10), Err(ContractError::AccessDenied));
        assert_eq!(
            rt.safe_transfer_nft(&p, &c, &p, &p, id),
            Err(ContractError::AccessDenied)
        );
        let summary = rt.parcel_summary(&p).unwrap();
        assert_eq!(summary.native_balance, rt.native_balance(&p));
        assert_eq!(summary.nft_count, 1);

        rt.lock_parcel(&p, &bob()).unwrap();
        rt.open_parcel(&p, &alice(), b"s").unwrap();
        assert_eq!(rt.native_balance(&alice()), 10);
        assert_eq!(rt.nft_owner(&c, id).unwrap(), Some(alice()));
    }

    #[test]
    fn open_parcel_gauge_counts_by_state() {
        let rt = Runtime::new();
        let f = rt.deploy_factory(alice(), ParcelTemplate::default());
        let p = rt.create_parcel(&f, &bob(), hash("s")).unwrap();
        rt.create_parcel(&f, &bob(), hash("t")).unwrap();
        rt.lock_parcel(&p, &bob()).unwrap();

        assert_eq!(rt.count_parcels_in(ParcelState::Open), 1);
        assert_eq!(rt.count_parcels_in(ParcelState::Locked), 1);
    }
}
