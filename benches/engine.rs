// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Benchmarks for the marketplace ledger engine.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Single-threaded payment processing
//! - Multi-threaded concurrent payment processing
//! - Deposit-cap evaluation
//! - Reporting aggregation over settled history

use criterion::{
    BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main,
};
use gigledger_rs::{
    Contract, ContractId, ContractStatus, Engine, Job, JobId, Profile, ProfileId, ProfileKind,
};
use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// =============================================================================
// Helper Functions
// =============================================================================

/// One wealthy client, one contractor, one in-progress contract carrying
/// `jobs` unpaid jobs priced 10.00.
fn engine_with_unpaid_jobs(jobs: u32) -> Engine {
    let engine = Engine::new();
    engine
        .add_profile(
            Profile::new(ProfileId(1), ProfileKind::Client, "Harry", "Potter", "wizard")
                .with_balance(Decimal::from(jobs) * dec!(10.00)),
        )
        .unwrap();
    engine
        .add_profile(Profile::new(
            ProfileId(2),
            ProfileKind::Contractor,
            "John",
            "Lenon",
            "musician",
        ))
        .unwrap();
    engine
        .add_contract(Contract::new(
            ContractId(1),
            ProfileId(1),
            ProfileId(2),
            ContractStatus::InProgress,
        ))
        .unwrap();
    for job_id in 1..=jobs {
        engine
            .add_job(Job::new(JobId(job_id), ContractId(1), dec!(10.00)))
            .unwrap();
    }
    engine
}

/// Settled history: `jobs` paid jobs spread over `professions` professions
/// and as many terminated contracts.
fn engine_with_settled_history(jobs: u32, professions: u32) -> Engine {
    let engine = Engine::new();
    let paid_at = "2020-08-15T12:00:00Z".parse().unwrap();

    engine
        .add_profile(
            Profile::new(ProfileId(1), ProfileKind::Client, "Harry", "Potter", "wizard")
                .with_balance(dec!(0.00)),
        )
        .unwrap();
    for p in 0..professions {
        engine
            .add_profile(Profile::new(
                ProfileId(p + 2),
                ProfileKind::Contractor,
                "Contractor",
                &format!("{p}"),
                &format!("profession-{p}"),
            ))
            .unwrap();
        engine
            .add_contract(Contract::new(
                ContractId(p + 1),
                ProfileId(1),
                ProfileId(p + 2),
                ContractStatus::Terminated,
            ))
            .unwrap();
    }
    for job_id in 1..=jobs {
        let contract = job_id % professions + 1;
        engine
            .add_job(Job::paid(
                JobId(job_id),
                ContractId(contract),
                dec!(10.00),
                paid_at,
            ))
            .unwrap();
    }
    engine
}

// =============================================================================
// Payment Benchmarks
// =============================================================================

fn bench_single_payment(c: &mut Criterion) {
    c.bench_function("pay_single_job", |b| {
        b.iter_batched(
            || engine_with_unpaid_jobs(1),
            |engine| {
                let client = engine.profile(&ProfileId(1)).unwrap();
                engine.pay_job(&client, JobId(1)).unwrap();
                black_box(engine)
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_payment_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("payment_throughput");

    for jobs in [100u32, 1_000] {
        group.throughput(Throughput::Elements(jobs as u64));
        group.bench_with_input(BenchmarkId::new("sequential", jobs), &jobs, |b, &jobs| {
            b.iter_batched(
                || engine_with_unpaid_jobs(jobs),
                |engine| {
                    let client = engine.profile(&ProfileId(1)).unwrap();
                    for job_id in 1..=jobs {
                        engine.pay_job(&client, JobId(job_id)).unwrap();
                    }
                    black_box(engine)
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("parallel", jobs), &jobs, |b, &jobs| {
            b.iter_batched(
                || engine_with_unpaid_jobs(jobs),
                |engine| {
                    (1..=jobs).into_par_iter().for_each(|job_id| {
                        let client = engine.profile(&ProfileId(1)).unwrap();
                        engine.pay_job(&client, JobId(job_id)).unwrap();
                    });
                    black_box(engine)
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// =============================================================================
// Deposit Benchmarks
// =============================================================================

fn bench_deposit(c: &mut Criterion) {
    // The cap computation walks the job index, so its cost scales with the
    // number of jobs on file.
    let mut group = c.benchmark_group("deposit_cap");

    for jobs in [10u32, 1_000] {
        let engine = engine_with_unpaid_jobs(jobs);
        let client = engine.profile(&ProfileId(1)).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(jobs), &jobs, |b, _| {
            b.iter(|| {
                engine
                    .deposit(&client, ProfileId(1), black_box(dec!(0.01)))
                    .unwrap();
            });
        });
    }

    group.finish();
}

// =============================================================================
// Reporting Benchmarks
// =============================================================================

fn bench_reports(c: &mut Criterion) {
    let engine = engine_with_settled_history(10_000, 10);
    let start = "2020-08-01T00:00:00Z".parse().unwrap();
    let end = "2020-08-31T00:00:00Z".parse().unwrap();

    c.bench_function("best_profession_10k_jobs", |b| {
        b.iter(|| black_box(engine.best_profession(start, end).unwrap()));
    });

    c.bench_function("best_clients_10k_jobs", |b| {
        b.iter(|| black_box(engine.best_clients(start, end, Some(5)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_single_payment,
    bench_payment_throughput,
    bench_deposit,
    bench_reports
);
criterion_main!(benches);
