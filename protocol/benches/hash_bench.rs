// Commitment and ledger benchmarks for the parcel protocol.
//
// Covers secret commitment and verification under both hash schemes, and the
// cost of an atomic ledger checkpoint as the ledger grows.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use parcel_protocol::crypto::{HashScheme, SecretHash};
use parcel_protocol::identity::Address;
use parcel_protocol::vault::{LedgerError, Ledgers};

fn bench_commit(c: &mut Criterion) {
    let secret = b"correct horse battery staple";
    for scheme in [HashScheme::Keccak256, HashScheme::Sha256, HashScheme::Blake3] {
        c.bench_function(&format!("commitment/commit/{scheme}"), |b| {
            b.iter(|| SecretHash::commit(scheme, secret));
        });
    }
}

fn bench_matches(c: &mut Criterion) {
    let secret = b"correct horse battery staple";
    let commitment = SecretHash::commit(HashScheme::Keccak256, secret);

    c.bench_function("commitment/matches/keccak256", |b| {
        b.iter(|| commitment.matches(HashScheme::Keccak256, secret));
    });
}

fn bench_atomic_checkpoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledgers/atomically");

    for holders in [10u64, 100, 1_000] {
        let mut ledgers = Ledgers::new();
        for i in 0..holders {
            ledgers
                .mint_native(&Address::from_label(&format!("holder-{i}")), 1_000)
                .unwrap();
        }
        let from = Address::from_label("holder-0");
        let to = Address::from_label("holder-1");

        group.throughput(Throughput::Elements(holders));
        group.bench_with_input(BenchmarkId::from_parameter(holders), &holders, |b, _| {
            b.iter(|| {
                ledgers
                    .atomically(|l| -> Result<(), LedgerError> {
                        l.transfer_native(&from, &to, 1)?;
                        l.transfer_native(&to, &from, 1)
                    })
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_commit, bench_matches, bench_atomic_checkpoint);
criterion_main!(benches);
