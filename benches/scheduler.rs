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

//! Benchmarks for reservation scheduling.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Planning a reconciliation pass over growing hold queues
//! - Hold placement on a busy pool
//! - Parallel transitions across independent pools

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use circulation_engine::{
    CirculationConfig, Hold, License, LicenseId, LicensePool, LoanGrant, Loan, PatronId,
    PoolChangeQueue, PoolId, ReservationScheduler,
};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rayon::prelude::*;
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

fn license(concurrent: u32) -> License {
    License {
        id: LicenseId::new("lic"),
        checkout_url: "https://lcp.test/checkout".into(),
        status_url: "https://lcp.test/status".into(),
        expires: None,
        concurrent_checkouts: concurrent,
        remaining_checkouts: None,
    }
}

fn scheduler() -> ReservationScheduler {
    ReservationScheduler::new(&CirculationConfig::default())
}

/// A pool at capacity with `holds` patrons queued behind `copies` loans.
fn snapshot(copies: u32, holds: u64) -> (Vec<License>, Vec<Loan>, Vec<Hold>) {
    let now = start();
    let loans = (0..copies as u64)
        .map(|i| Loan {
            patron: PatronId(i),
            license_id: LicenseId::new("lic"),
            start: now,
            end: Some(now + TimeDelta::hours(i as i64 + 1)),
            external_identifier: None,
        })
        .collect();
    let holds = (0..holds)
        .map(|i| Hold::new(PatronId(1_000_000 + i), now + TimeDelta::seconds(i as i64)))
        .collect();
    (vec![license(copies)], loans, holds)
}

fn grant(n: u64) -> LoanGrant {
    LoanGrant {
        external_identifier: format!("https://lcp.test/loans/{n}"),
        end: Some(start() + TimeDelta::days(21)),
    }
}

// =============================================================================
// Scheduling Benchmarks
// =============================================================================

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");
    let scheduler = scheduler();

    for holds in [10u64, 100, 1_000].iter() {
        let (licenses, loans, queue) = snapshot(20, *holds);
        group.throughput(Throughput::Elements(*holds));
        group.bench_with_input(BenchmarkId::from_parameter(holds), holds, |b, _| {
            b.iter(|| black_box(scheduler.plan(&licenses, &loans, &queue, start())))
        });
    }
    group.finish();
}

fn bench_place_hold(c: &mut Criterion) {
    let mut group = c.benchmark_group("place_hold");

    for holds in [100u64, 1_000].iter() {
        group.throughput(Throughput::Elements(*holds));
        group.bench_with_input(BenchmarkId::from_parameter(holds), holds, |b, &holds| {
            b.iter(|| {
                let scheduler = scheduler();
                let pool = LicensePool::new(
                    PoolId(1),
                    vec![license(1)],
                    &scheduler,
                    Arc::new(PoolChangeQueue::new()),
                    start(),
                );
                if let Ok(ticket) = pool.prepare_checkout(PatronId(0), &scheduler, start()) {
                    let _ = pool.commit_checkout(&ticket, grant(0), &scheduler, start());
                }
                for i in 1..=holds {
                    let now = start() + TimeDelta::seconds(i as i64);
                    let _ = pool.place_hold(PatronId(i), &scheduler, now);
                }
                black_box(pool.counters())
            })
        });
    }
    group.finish();
}

// =============================================================================
// Multi-Threaded Benchmarks
// =============================================================================

fn bench_parallel_pools(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_checkout_checkin");

    for pools in [10u64, 100, 1_000].iter() {
        group.throughput(Throughput::Elements(*pools * 10));
        group.bench_with_input(BenchmarkId::from_parameter(pools), pools, |b, &pools| {
            let scheduler = scheduler();
            let changes = Arc::new(PoolChangeQueue::new());
            let all: Vec<LicensePool> = (0..pools)
                .map(|id| {
                    LicensePool::new(PoolId(id), vec![license(2)], &scheduler, changes.clone(), start())
                })
                .collect();

            b.iter(|| {
                all.par_iter().for_each(|pool| {
                    for patron in 0..10u64 {
                        if let Ok(ticket) = pool.prepare_checkout(PatronId(patron), &scheduler, start()) {
                            let _ = pool.commit_checkout(&ticket, grant(patron), &scheduler, start());
                        }
                        let _ = pool.commit_checkin(PatronId(patron), &scheduler, start());
                    }
                });
                black_box(changes.drain())
            })
        });
    }
    group.finish();
}

criterion_group!(scheduling, bench_plan, bench_place_hold);

criterion_group!(parallel, bench_parallel_pools);

criterion_main!(scheduling, parallel);
