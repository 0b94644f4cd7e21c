//! # Verification Benchmarks
//!
//! | Path | What it measures |
//! |------|------------------|
//! | `unknown_token` | Resolver miss plus one audit append |
//! | `already_verified` | Full pipeline ending in a ledger conflict |
//! | `first_verification` | Full pipeline ending in a ledger commit |
//! | `audit_chain_verify` | Hash-chain check over a populated log |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;
use tokio::runtime::Runtime;
use vg_01_token_verification::domain::audit_chain::verify_audit_chain;
use vg_01_token_verification::{Credential, VerificationApi, VerificationConfig};
use vg_tests::integration::harness::{Harness, HOUR_MS};

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

fn bench_rejections(c: &mut Criterion) {
    let rt = runtime();
    let booth = Harness::with_config(VerificationConfig::default());
    rt.block_on(booth.standard_fixture()).expect("fixture");
    rt.block_on(booth.service.verify("T1", None)).expect("first scan");

    let mut group = c.benchmark_group("vg-01-rejections");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("unknown_token", |b| {
        b.iter(|| {
            rt.block_on(booth.service.verify(black_box("UNKNOWN"), None))
                .expect("scan")
        })
    });

    group.bench_function("already_verified", |b| {
        b.iter(|| {
            rt.block_on(booth.service.verify(black_box("T1"), Some("10.0.0.7")))
                .expect("scan")
        })
    });

    group.finish();
}

fn bench_first_verification(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("vg-01-first-verification");
    group.measurement_time(Duration::from_secs(5));

    for voters in [100usize, 1_000] {
        group.throughput(Throughput::Elements(voters as u64));
        group.bench_with_input(BenchmarkId::from_parameter(voters), &voters, |b, &voters| {
            b.iter_with_setup(
                || {
                    let booth = Harness::with_config(VerificationConfig::default());
                    rt.block_on(async {
                        let election = booth.election("E1", true).await.expect("election");
                        for i in 0..voters {
                            let voter = booth
                                .voter(&format!("V{}", i), "Voter")
                                .await
                                .expect("voter");
                            booth
                                .token(
                                    Credential::qr_token(format!("T{}", i)),
                                    &voter,
                                    &election,
                                    booth.now() + HOUR_MS,
                                )
                                .await
                                .expect("token");
                        }
                    });
                    booth
                },
                |booth| {
                    rt.block_on(async {
                        for i in 0..voters {
                            let response = booth
                                .service
                                .verify(&format!("T{}", i), None)
                                .await
                                .expect("scan");
                            black_box(response);
                        }
                    })
                },
            )
        });
    }

    group.finish();
}

fn bench_audit_chain(c: &mut Criterion) {
    let rt = runtime();
    let booth = Harness::with_config(VerificationConfig::default());
    rt.block_on(async {
        for _ in 0..10_000 {
            booth.service.verify("UNKNOWN", None).await.expect("scan");
        }
    });
    let entries = booth.audit.entries();

    let mut group = c.benchmark_group("vg-01-audit-chain");
    group.throughput(Throughput::Elements(entries.len() as u64));
    group.bench_function("audit_chain_verify", |b| {
        b.iter(|| verify_audit_chain(black_box(&entries)).is_ok())
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_rejections,
    bench_first_verification,
    bench_audit_chain
);
criterion_main!(benches);
