// Parcel lifecycle benchmarks.
//
// Measures factory creation, deposits, and the full lock-and-open release
// through the runtime.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use parcel_contracts::{ParcelTemplate, Runtime};
use parcel_protocol::crypto::{HashScheme, SecretHash};
use parcel_protocol::identity::Address;

fn setup() -> (Runtime, Address, Address) {
    let rt = Runtime::new();
    let owner = Address::from_label("owner");
    let sender = Address::from_label("sender");
    let factory = rt.deploy_factory(owner, ParcelTemplate::default());
    rt.mint_native(&sender, u64::MAX / 2).unwrap();
    (rt, factory, sender)
}

fn bench_create(c: &mut Criterion) {
    let (rt, factory, sender) = setup();
    let hash = SecretHash::commit(HashScheme::Keccak256, b"s1");

    c.bench_function("factory/create_parcel", |b| {
        b.iter(|| rt.create_parcel(&factory, &sender, hash).unwrap());
    });
}

fn bench_deposit(c: &mut Criterion) {
    let (rt, factory, sender) = setup();
    let hash = SecretHash::commit(HashScheme::Keccak256, b"s1");
    let parcel = rt.create_parcel(&factory, &sender, hash).unwrap();

    c.bench_function("parcel/deposit_native", |b| {
        b.iter(|| rt.deposit_native(&parcel, &sender, 1).unwrap());
    });
}

fn bench_open(c: &mut Criterion) {
    let (rt, factory, sender) = setup();
    let token = rt.deploy_token("Bench", "BNC", None).unwrap();
    rt.mint_tokens(&token, &sender, u64::MAX / 2).unwrap();
    let recipient = Address::from_label("recipient");
    let hash = SecretHash::commit(HashScheme::Keccak256, b"s1");

    c.bench_function("parcel/lock_and_open", |b| {
        b.iter_batched(
            || {
                let parcel = rt.create_parcel(&factory, &sender, hash).unwrap();
                rt.deposit_native(&parcel, &sender, 10).unwrap();
                rt.approve_tokens(&sender, &token, &parcel, 100).unwrap();
                rt.add_tokens(&parcel, &sender, &token, 100).unwrap();
                rt.lock_parcel(&parcel, &sender).unwrap();
                parcel
            },
            |parcel| rt.open_parcel(&parcel, &recipient, b"s1").unwrap(),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_create, bench_deposit, bench_open);
criterion_main!(benches);
