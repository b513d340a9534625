//! Walkthrough of a parcel's full lifecycle against an in-memory runtime.
//!
//! Alice fills a parcel with native currency, tokens, and an NFT, seals it,
//! and hands Bob the secret out of band. A wrong guess from Mallory is
//! rejected; Bob's correct secret empties the parcel into his account.
//!
//! Run with:
//!   cargo run -p parcel-contracts --example demo

use std::time::Instant;

use parcel_contracts::{ContractError, ParcelTemplate, Runtime};
use parcel_protocol::crypto::{HashScheme, SecretHash};
use parcel_protocol::identity::Address;

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn section(num: u32, title: &str) {
    println!();
    println!("{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]======================================================{RESET}");
    println!("{BOLD}{WHITE}  {title}{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn rejected(text: &str, err: &ContractError) {
    println!("{RED}  [REJECTED] {text}: {err} ({}){RESET}", err.kind());
}

fn info(label: &str, value: impl std::fmt::Display) {
    println!("{WHITE}  {BOLD}{label}:{RESET} {YELLOW}{value}{RESET}");
}

fn main() -> Result<(), ContractError> {
    let started = Instant::now();
    let runtime = Runtime::new();

    let owner = Address::from_label("owner");
    let alice = Address::from_label("alice");
    let bob = Address::from_label("bob");
    let mallory = Address::from_label("mallory");

    section(1, "Deploy assets and the factory");
    let token = runtime.deploy_token("Demo Dollar", "DD", Some(6))?;
    let art = runtime.deploy_collection("Demo Art", "ART")?;
    let factory = runtime.deploy_factory(owner, ParcelTemplate::with_scheme(HashScheme::Keccak256));
    info("token", token);
    info("collection", art);
    info("factory", factory);

    runtime.mint_native(&alice, 1_000)?;
    runtime.mint_tokens(&token, &alice, 5_000)?;
    let nft_id = runtime.mint_nft(&art, &alice)?;
    success("alice funded with native, tokens, and NFT #1");

    section(2, "Alice creates and fills a parcel");
    let secret = b"correct horse battery staple";
    let parcel = runtime.create_parcel(&factory, &alice, SecretHash::commit(HashScheme::Keccak256, secret))?;
    info("parcel", parcel);

    runtime.deposit_native(&parcel, &alice, 250)?;
    runtime.approve_tokens(&alice, &token, &parcel, 1_500)?;
    runtime.add_tokens(&parcel, &alice, &token, 1_500)?;
    runtime.safe_transfer_nft(&alice, &art, &alice, &parcel, nft_id)?;
    let summary = runtime.parcel_summary(&parcel)?;
    info("native held", summary.native_balance);
    info("token kinds held", summary.tokens.len());
    info("nfts held", summary.nft_count);

    section(3, "Seal the parcel");
    if let Err(err) = runtime.lock_parcel(&parcel, &mallory) {
        rejected("mallory tries to lock", &err);
    }
    runtime.lock_parcel(&parcel, &alice)?;
    success("parcel locked; deposits are closed");

    section(4, "Open it");
    if let Err(err) = runtime.open_parcel(&parcel, &mallory, b"guess") {
        rejected("mallory guesses", &err);
    }
    let released = runtime.open_parcel(&parcel, &bob, secret)?;
    success("bob presented the secret");
    info("native released", released.native_balance());
    info("bob native balance", runtime.native_balance(&bob));
    info("bob token balance", runtime.token_balance(&token, &bob)?);
    info(
        "nft owner",
        runtime.nft_owner(&art, nft_id)?.map(|a| a.to_string()).unwrap_or_default(),
    );

    section(5, "Event log");
    for record in runtime.events() {
        println!(
            "  {DIM}#{:<3}{RESET} {:<22} {DIM}{}{RESET}",
            record.sequence,
            record.event.name(),
            record.contract
        );
    }

    println!();
    println!("{DIM}  finished in {:.2} ms{RESET}", started.elapsed().as_secs_f64() * 1000.0);
    Ok(())
}
