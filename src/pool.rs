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

//! License pool state.
//!
//! A [`LicensePool`] owns one title's licenses, loans and holds behind a
//! single mutex. Every read-decide-write sequence on a pool runs under that
//! lock, and every one ends by reconciling: the scheduler plans, the pool
//! applies. The lock is never held across a remote call; callers split a
//! transition into a `prepare_*` step before the network round trip and a
//! `commit_*` step after it, and the commit re-validates.

use crate::base::{LicenseId, PatronId, PoolId};
use crate::change_queue::PoolChangeQueue;
use crate::error::CirculationError;
use crate::license::{License, LicenseTracker};
use crate::records::{Hold, Loan};
use crate::remote::LoanGrant;
use crate::scheduler::{PoolCounters, PoolMutation, ReservationScheduler};
use chrono::{DateTime, Utc};
use metrics::counter;
use parking_lot::Mutex;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::sync::Arc;
use tracing::{debug, error};

/// What a checkout draws on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The patron's own reservation.
    Reserved,
    /// An unreserved available copy.
    Open,
}

/// Outcome of [`LicensePool::prepare_checkout`]: which license to request a
/// loan against, and on what grounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutTicket {
    pub pool: PoolId,
    pub patron: PatronId,
    pub license_id: LicenseId,
    pub checkout_url: String,
    pub admission: Admission,
}

#[derive(Debug)]
struct PoolData {
    licenses: Vec<License>,
    loans: Vec<Loan>,
    holds: Vec<Hold>,
    counters: PoolCounters,
}

impl PoolData {
    fn assert_invariants(&self) {
        debug_assert!(
            self.counters.is_consistent(),
            "Invariant violated: available + reserved exceeds owned: {:?}",
            self.counters
        );
    }

    fn loan(&self, patron: PatronId) -> Option<&Loan> {
        self.loans.iter().find(|loan| loan.patron == patron)
    }

    fn hold(&self, patron: PatronId) -> Option<&Hold> {
        self.holds.iter().find(|hold| hold.patron == patron)
    }

    fn remove_loan(&mut self, patron: PatronId) -> Option<Loan> {
        let index = self.loans.iter().position(|loan| loan.patron == patron)?;
        let loan = self.loans.swap_remove(index);
        if let Some(license) = self.licenses.iter_mut().find(|l| l.id == loan.license_id) {
            LicenseTracker::release(license);
        }
        Some(loan)
    }

    fn remove_hold(&mut self, patron: PatronId) -> Option<Hold> {
        let index = self.holds.iter().position(|hold| hold.patron == patron)?;
        Some(self.holds.remove(index))
    }

    /// Deletes `patron`'s reservation if it has lapsed. Returns whether one was deleted.
    fn drop_lapsed_hold(&mut self, patron: PatronId, now: DateTime<Utc>) -> bool {
        let before = self.holds.len();
        self.holds
            .retain(|hold| !(hold.patron == patron && hold.is_lapsed(now)));
        before != self.holds.len()
    }

    /// Decides whether `patron` may check out right now.
    fn admit(&self, patron: PatronId, now: DateTime<Utc>) -> Result<Admission, CirculationError> {
        if self.loan(patron).is_some() {
            return Err(CirculationError::AlreadyCheckedOut);
        }
        if self
            .hold(patron)
            .is_some_and(|hold| hold.is_reserved() && !hold.is_lapsed(now))
        {
            return Ok(Admission::Reserved);
        }
        if self.counters.licenses_available > 0 {
            Ok(Admission::Open)
        } else if self.counters.licenses_owned == 0 {
            Err(CirculationError::NoLicenses)
        } else {
            Err(CirculationError::NoAvailableCopies)
        }
    }

    /// Applies the scheduler's mutations. Returns whether anything changed.
    fn apply(&mut self, pool: PoolId, mutations: Vec<PoolMutation>) -> bool {
        let mut changed = false;
        for mutation in mutations {
            match mutation {
                PoolMutation::UpdateHold {
                    patron,
                    position,
                    end,
                } => match self.holds.iter_mut().find(|hold| hold.patron == patron) {
                    Some(hold) => {
                        hold.position = position;
                        hold.end = end;
                        changed = true;
                    }
                    None => {
                        counter!("circulation_reconcile_skipped_total", "kind" => "missing_hold").increment(1);
                        error!(%pool, %patron, "reconciliation planned an update for a missing hold; skipped");
                        debug_assert!(false, "planned update for missing hold of patron {patron}");
                    }
                },
                PoolMutation::SetCounters(counters) => {
                    if !counters.is_consistent() {
                        counter!("circulation_reconcile_skipped_total", "kind" => "inconsistent_counters").increment(1);
                        error!(%pool, ?counters, "reconciliation planned inconsistent counters; skipped");
                        debug_assert!(false, "planned inconsistent counters {counters:?}");
                        continue;
                    }
                    changed |= self.counters != counters;
                    self.counters = counters;
                }
            }
        }
        self.assert_invariants();
        changed
    }
}

/// One title's licensing state within a collection.
#[derive(Debug)]
pub struct LicensePool {
    id: PoolId,
    inner: Mutex<PoolData>,
    changes: Arc<PoolChangeQueue>,
}

impl LicensePool {
    pub fn new(
        id: PoolId,
        licenses: Vec<License>,
        scheduler: &ReservationScheduler,
        changes: Arc<PoolChangeQueue>,
        now: DateTime<Utc>,
    ) -> Self {
        let pool = Self {
            id,
            inner: Mutex::new(PoolData {
                licenses,
                loans: Vec::new(),
                holds: Vec::new(),
                counters: PoolCounters::default(),
            }),
            changes,
        };
        pool.reconcile(scheduler, now);
        pool
    }

    pub fn id(&self) -> PoolId {
        self.id
    }

    pub fn counters(&self) -> PoolCounters {
        self.inner.lock().counters
    }

    pub fn licenses(&self) -> Vec<License> {
        self.inner.lock().licenses.clone()
    }

    pub fn loans(&self) -> Vec<Loan> {
        self.inner.lock().loans.clone()
    }

    /// Holds in arrival order.
    pub fn holds(&self) -> Vec<Hold> {
        let mut holds = self.inner.lock().holds.clone();
        crate::hold_queue::HoldQueue::sort_by_arrival(&mut holds);
        holds
    }

    pub fn has_holds(&self) -> bool {
        !self.inner.lock().holds.is_empty()
    }

    pub fn loan_for(&self, patron: PatronId) -> Option<Loan> {
        self.inner.lock().loan(patron).cloned()
    }

    pub fn hold_for(&self, patron: PatronId) -> Option<Hold> {
        self.inner.lock().hold(patron).cloned()
    }

    pub fn loan_by_external_identifier(&self, external_identifier: &str) -> Option<Loan> {
        self.inner
            .lock()
            .loans
            .iter()
            .find(|loan| loan.external_identifier.as_deref() == Some(external_identifier))
            .cloned()
    }

    /// Runs a full reconciliation pass.
    pub fn reconcile(&self, scheduler: &ReservationScheduler, now: DateTime<Utc>) {
        let mut data = self.inner.lock();
        self.reconcile_locked(&mut data, scheduler, now, false);
    }

    fn reconcile_locked(
        &self,
        data: &mut PoolData,
        scheduler: &ReservationScheduler,
        now: DateTime<Utc>,
        dirty: bool,
    ) {
        let mutations = scheduler.plan(&data.licenses, &data.loans, &data.holds, now);
        let changed = data.apply(self.id, mutations);
        debug!(pool = %self.id, counters = ?data.counters, changed, "reconciled");
        if changed || dirty {
            self.changes.push(self.id);
        }
    }

    /// Validates a checkout and picks the license to request it against.
    ///
    /// # Errors
    ///
    /// - [`CirculationError::AlreadyCheckedOut`] - the patron already has a loan.
    /// - [`CirculationError::NoAvailableCopies`] - every copy is on loan or reserved.
    /// - [`CirculationError::NoLicenses`] - no usable license exists.
    pub fn prepare_checkout(
        &self,
        patron: PatronId,
        scheduler: &ReservationScheduler,
        now: DateTime<Utc>,
    ) -> Result<CheckoutTicket, CirculationError> {
        let mut data = self.inner.lock();
        // Reservations may have lapsed since the last pass.
        let dropped = data.drop_lapsed_hold(patron, now);
        self.reconcile_locked(&mut data, scheduler, now, dropped);

        let admission = data.admit(patron, now)?;
        let license = LicenseTracker::allocate(&data.licenses, &data.loans, now)?;
        Ok(CheckoutTicket {
            pool: self.id,
            patron,
            license_id: license.id.clone(),
            checkout_url: license.checkout_url.clone(),
            admission,
        })
    }

    /// Records a loan the license server granted for `ticket`.
    ///
    /// Re-validates the checkout, since the pool may have changed during the
    /// round trip. Consumes the patron's hold if there is one.
    pub fn commit_checkout(
        &self,
        ticket: &CheckoutTicket,
        grant: LoanGrant,
        scheduler: &ReservationScheduler,
        now: DateTime<Utc>,
    ) -> Result<Loan, CirculationError> {
        let mut guard = self.inner.lock();
        let data = &mut *guard;
        self.reconcile_locked(data, scheduler, now, false);

        data.admit(ticket.patron, now)?;
        let on_loan = data
            .loans
            .iter()
            .filter(|loan| loan.license_id == ticket.license_id)
            .count();
        // The remote loan was issued against this license specifically.
        let license = data
            .licenses
            .iter_mut()
            .find(|license| license.id == ticket.license_id)
            .filter(|license| license.is_usable(now))
            .ok_or(CirculationError::NoLicenses)?;
        if on_loan >= license.concurrent_checkouts as usize {
            return Err(CirculationError::NoAvailableCopies);
        }
        license.consume();

        let loan = Loan {
            patron: ticket.patron,
            license_id: ticket.license_id.clone(),
            start: now,
            end: grant.end,
            external_identifier: Some(grant.external_identifier),
        };
        data.loans.push(loan.clone());
        data.remove_hold(ticket.patron);
        self.reconcile_locked(data, scheduler, now, true);
        Ok(loan)
    }

    /// Removes the patron's loan and gives its license back.
    pub fn commit_checkin(
        &self,
        patron: PatronId,
        scheduler: &ReservationScheduler,
        now: DateTime<Utc>,
    ) -> Result<Loan, CirculationError> {
        let mut data = self.inner.lock();
        let loan = data
            .remove_loan(patron)
            .ok_or(CirculationError::NotCheckedOut)?;
        self.reconcile_locked(&mut data, scheduler, now, true);
        Ok(loan)
    }

    /// Updates a loan's end date, e.g. after a remote renewal.
    pub fn update_loan_end(
        &self,
        patron: PatronId,
        end: Option<DateTime<Utc>>,
        scheduler: &ReservationScheduler,
        now: DateTime<Utc>,
    ) -> Result<Loan, CirculationError> {
        let mut data = self.inner.lock();
        let loan = data
            .loans
            .iter_mut()
            .find(|loan| loan.patron == patron)
            .ok_or(CirculationError::NotCheckedOut)?;
        let dirty = loan.end != end;
        loan.end = end;
        let loan = loan.clone();
        self.reconcile_locked(&mut data, scheduler, now, dirty);
        Ok(loan)
    }

    /// Puts the patron in the queue.
    ///
    /// # Errors
    ///
    /// - [`CirculationError::AlreadyCheckedOut`] - the patron has a loan.
    /// - [`CirculationError::AlreadyOnHold`] - the patron is already queued.
    /// - [`CirculationError::NoLicenses`] - nothing is owned, so no copy will ever come.
    /// - [`CirculationError::CurrentlyAvailable`] - a copy can be checked out now.
    pub fn place_hold(
        &self,
        patron: PatronId,
        scheduler: &ReservationScheduler,
        now: DateTime<Utc>,
    ) -> Result<Hold, CirculationError> {
        let mut data = self.inner.lock();
        let dropped = data.drop_lapsed_hold(patron, now);
        self.reconcile_locked(&mut data, scheduler, now, dropped);

        if data.loan(patron).is_some() {
            return Err(CirculationError::AlreadyCheckedOut);
        }
        if data.hold(patron).is_some() {
            return Err(CirculationError::AlreadyOnHold);
        }
        if data.counters.licenses_owned == 0 && data.loans.is_empty() {
            return Err(CirculationError::NoLicenses);
        }
        if data.counters.licenses_available > 0 {
            return Err(CirculationError::CurrentlyAvailable);
        }

        data.holds.push(Hold::new(patron, now));
        self.reconcile_locked(&mut data, scheduler, now, true);
        data.hold(patron)
            .cloned()
            .ok_or(CirculationError::NotOnHold)
    }

    /// Takes the patron out of the queue, passing any reservation on.
    pub fn release_hold(
        &self,
        patron: PatronId,
        scheduler: &ReservationScheduler,
        now: DateTime<Utc>,
    ) -> Result<Hold, CirculationError> {
        let mut data = self.inner.lock();
        let hold = data
            .remove_hold(patron)
            .ok_or(CirculationError::NotOnHold)?;
        self.reconcile_locked(&mut data, scheduler, now, true);
        Ok(hold)
    }

    /// Deletes lapsed reservations, then reconciles if any were deleted.
    ///
    /// With `patron` set, only that patron's lapsed reservation is considered.
    /// Waiting holds are never deleted: their `end` is only an estimate.
    pub fn reap(
        &self,
        patron: Option<PatronId>,
        scheduler: &ReservationScheduler,
        now: DateTime<Utc>,
    ) -> usize {
        let mut data = self.inner.lock();
        let before = data.holds.len();
        data.holds.retain(|hold| {
            !(hold.is_lapsed(now) && patron.is_none_or(|patron| hold.patron == patron))
        });
        let deleted = before - data.holds.len();
        if deleted > 0 {
            self.reconcile_locked(&mut data, scheduler, now, true);
        }
        deleted
    }

    /// Replaces the license inventory, e.g. after a distributor feed update.
    pub fn replace_licenses(
        &self,
        licenses: Vec<License>,
        scheduler: &ReservationScheduler,
        now: DateTime<Utc>,
    ) {
        let mut data = self.inner.lock();
        data.licenses = licenses;
        self.reconcile_locked(&mut data, scheduler, now, true);
    }
}

impl Serialize for LicensePool {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("LicensePool", 5)?;
        state.serialize_field("pool", &self.id)?;
        state.serialize_field("owned", &data.counters.licenses_owned)?;
        state.serialize_field("available", &data.counters.licenses_available)?;
        state.serialize_field("reserved", &data.counters.licenses_reserved)?;
        state.serialize_field("holds", &data.counters.patrons_in_hold_queue)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hold_queue::HoldQueue;
    use chrono::TimeDelta;

    fn scheduler() -> ReservationScheduler {
        ReservationScheduler::with_queue(HoldQueue::with_periods(
            TimeDelta::days(3),
            TimeDelta::days(21),
        ))
    }

    fn pool(concurrent: u32, remaining: Option<u32>, now: DateTime<Utc>) -> LicensePool {
        let license = License {
            id: LicenseId::new("lic-1"),
            checkout_url: "https://lcp.example.com/checkout".into(),
            status_url: "https://lcp.example.com/status".into(),
            expires: None,
            concurrent_checkouts: concurrent,
            remaining_checkouts: remaining,
        };
        LicensePool::new(
            PoolId(1),
            vec![license],
            &scheduler(),
            Arc::new(PoolChangeQueue::new()),
            now,
        )
    }

    fn grant(n: u32) -> LoanGrant {
        LoanGrant {
            external_identifier: format!("https://lcp.example.com/loans/{n}"),
            end: None,
        }
    }

    fn checkout(pool: &LicensePool, patron: u64, now: DateTime<Utc>) -> Result<Loan, CirculationError> {
        let ticket = pool.prepare_checkout(PatronId(patron), &scheduler(), now)?;
        pool.commit_checkout(&ticket, grant(patron as u32), &scheduler(), now)
    }

    #[test]
    fn checkout_consumes_finite_budget() {
        let now = Utc::now();
        let pool = pool(1, Some(2), now);
        checkout(&pool, 1, now).unwrap();

        assert_eq!(pool.licenses()[0].remaining_checkouts, Some(1));
        assert_eq!(pool.counters().licenses_available, 0);

        pool.commit_checkin(PatronId(1), &scheduler(), now).unwrap();
        assert_eq!(pool.licenses()[0].remaining_checkouts, Some(2));
        assert_eq!(pool.counters().licenses_available, 1);
    }

    #[test]
    fn commit_rechecks_capacity() {
        let now = Utc::now();
        let pool = pool(1, None, now);
        let first = pool.prepare_checkout(PatronId(1), &scheduler(), now).unwrap();
        let second = pool.prepare_checkout(PatronId(2), &scheduler(), now).unwrap();

        pool.commit_checkout(&first, grant(1), &scheduler(), now).unwrap();
        assert_eq!(
            pool.commit_checkout(&second, grant(2), &scheduler(), now),
            Err(CirculationError::NoAvailableCopies)
        );
        assert_eq!(pool.loans().len(), 1);
    }

    #[test]
    fn commit_rejects_second_loan_for_same_patron() {
        let now = Utc::now();
        let pool = pool(2, None, now);
        let ticket = pool.prepare_checkout(PatronId(1), &scheduler(), now).unwrap();
        let again = pool.prepare_checkout(PatronId(1), &scheduler(), now).unwrap();

        pool.commit_checkout(&ticket, grant(1), &scheduler(), now).unwrap();
        assert_eq!(
            pool.commit_checkout(&again, grant(2), &scheduler(), now),
            Err(CirculationError::AlreadyCheckedOut)
        );
    }

    #[test]
    fn exhausting_budget_reports_no_licenses() {
        let now = Utc::now();
        let pool = pool(2, Some(1), now);
        checkout(&pool, 1, now).unwrap();

        assert_eq!(pool.counters().licenses_owned, 0);
        assert_eq!(checkout(&pool, 2, now), Err(CirculationError::NoLicenses));
    }

    #[test]
    fn hold_on_pool_without_capacity_is_refused() {
        let now = Utc::now();
        let pool = pool(1, Some(0), now);
        assert_eq!(
            pool.place_hold(PatronId(1), &scheduler(), now),
            Err(CirculationError::NoLicenses)
        );
    }

    #[test]
    fn reap_for_one_patron_leaves_others() {
        let now = Utc::now();
        let pool = pool(2, None, now);
        checkout(&pool, 1, now).unwrap();
        checkout(&pool, 2, now).unwrap();
        pool.place_hold(PatronId(3), &scheduler(), now).unwrap();
        pool.place_hold(PatronId(4), &scheduler(), now).unwrap();
        pool.commit_checkin(PatronId(1), &scheduler(), now).unwrap();
        pool.commit_checkin(PatronId(2), &scheduler(), now).unwrap();
        assert_eq!(pool.counters().licenses_reserved, 2);

        let later = now + TimeDelta::days(4);
        assert_eq!(pool.reap(Some(PatronId(3)), &scheduler(), later), 1);
        assert!(pool.hold_for(PatronId(4)).is_some());
    }

    #[test]
    fn lapsed_reservation_does_not_block_a_new_hold() {
        let now = Utc::now();
        let pool = pool(1, None, now);
        checkout(&pool, 1, now).unwrap();
        pool.place_hold(PatronId(2), &scheduler(), now).unwrap();
        pool.place_hold(PatronId(3), &scheduler(), now + TimeDelta::minutes(1))
            .unwrap();
        pool.commit_checkin(PatronId(1), &scheduler(), now).unwrap();

        let later = now + TimeDelta::days(4);
        let hold = pool.place_hold(PatronId(2), &scheduler(), later).unwrap();
        assert_eq!(hold.start, later);
        assert_eq!(hold.position, Some(2));
        assert_eq!(pool.hold_for(PatronId(3)).unwrap().position, Some(0));
        assert_eq!(pool.counters().patrons_in_hold_queue, 2);
    }

    mod skipped {
        use super::*;
        use metrics::{
            Counter, CounterFn, Gauge, Histogram, Key, KeyName, Metadata, Recorder,
            SharedString, Unit,
        };
        use std::sync::atomic::{AtomicU64, Ordering};

        struct Tally(Arc<AtomicU64>);

        impl CounterFn for Tally {
            fn increment(&self, value: u64) {
                self.0.fetch_add(value, Ordering::SeqCst);
            }

            fn absolute(&self, value: u64) {
                self.0.store(value, Ordering::SeqCst);
            }
        }

        fn tally(count: &Arc<AtomicU64>) -> Counter {
            Counter::from_arc(Arc::new(Tally(Arc::clone(count))))
        }

        #[derive(Default)]
        struct SkipRecorder {
            missing_hold: Arc<AtomicU64>,
            inconsistent_counters: Arc<AtomicU64>,
        }

        impl Recorder for SkipRecorder {
            fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
            fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
            fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

            fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
                if key.name() != "circulation_reconcile_skipped_total" {
                    return Counter::noop();
                }
                let kind = key
                    .labels()
                    .find(|label| label.key() == "kind")
                    .map(|label| label.value().to_owned());
                match kind.as_deref() {
                    Some("missing_hold") => tally(&self.missing_hold),
                    Some("inconsistent_counters") => tally(&self.inconsistent_counters),
                    _ => Counter::noop(),
                }
            }

            fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
                Gauge::noop()
            }

            fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
                Histogram::noop()
            }
        }

        fn empty() -> PoolData {
            PoolData {
                licenses: Vec::new(),
                loans: Vec::new(),
                holds: Vec::new(),
                counters: PoolCounters::default(),
            }
        }

        // Debug builds also trip a debug_assert after counting.
        fn apply_counted(recorder: &SkipRecorder, mutation: PoolMutation) -> PoolData {
            let mut data = empty();
            metrics::with_local_recorder(recorder, || {
                let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    data.apply(PoolId(1), vec![mutation]);
                }));
            });
            data
        }

        #[test]
        fn update_for_missing_hold_is_counted_and_skipped() {
            let recorder = SkipRecorder::default();
            let data = apply_counted(
                &recorder,
                PoolMutation::UpdateHold {
                    patron: PatronId(9),
                    position: Some(0),
                    end: None,
                },
            );

            assert_eq!(recorder.missing_hold.load(Ordering::SeqCst), 1);
            assert!(data.holds.is_empty());
        }

        #[test]
        fn inconsistent_counters_are_counted_and_skipped() {
            let recorder = SkipRecorder::default();
            let data = apply_counted(
                &recorder,
                PoolMutation::SetCounters(PoolCounters {
                    licenses_owned: 1,
                    licenses_available: 1,
                    licenses_reserved: 1,
                    patrons_in_hold_queue: 1,
                }),
            );

            assert_eq!(recorder.inconsistent_counters.load(Ordering::SeqCst), 1);
            assert_eq!(data.counters, PoolCounters::default());
        }
    }

    #[test]
    fn serializes_counters() {
        let now = Utc::now();
        let pool = pool(3, None, now);
        let json = serde_json::to_value(&pool).unwrap();
        assert_eq!(json["pool"], 1);
        assert_eq!(json["owned"], 3);
        assert_eq!(json["available"], 3);
        assert_eq!(json["reserved"], 0);
        assert_eq!(json["holds"], 0);
    }
}
