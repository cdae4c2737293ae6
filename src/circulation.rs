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

//! Circulation operations.
//!
//! The [`CirculationFacade`] is the entry point the service layer calls. It
//! owns every license pool of a collection and runs each patron-facing
//! operation as a state transition over the patron's relationship with a pool:
//! none, loan, or hold.
//!
//! # Operations
//!
//! | Operation | From | To |
//! |-----------|------|----|
//! | checkout | none (copy available) or reserved hold | loan |
//! | checkin | loan | none |
//! | place_hold | none (no copy available) | hold |
//! | release_hold | hold | none |
//! | fulfill | loan | loan |
//!
//! # Concurrency
//!
//! Pools live in a [`DashMap`] and each guards its own state, so operations on
//! different pools run in parallel. Remote calls happen outside any pool lock:
//! a checkout validates, talks to the license server, then re-validates under
//! the lock before recording the loan. A timed-out or failed remote call
//! leaves local state untouched.

use crate::base::{Clock, PatronId, PoolId};
use crate::change_queue::PoolChangeQueue;
use crate::config::CirculationConfig;
use crate::error::CirculationError;
use crate::license::License;
use crate::pool::LicensePool;
use crate::records::{Hold, Loan};
use crate::remote::{CheckoutRequest, Fulfillment, LicenseStatusDocument, LicenseStatusService};
use crate::scheduler::{PoolCounters, ReservationScheduler};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanInfo {
    pub pool: PoolId,
    #[serde(flatten)]
    pub loan: Loan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoldInfo {
    pub pool: PoolId,
    #[serde(flatten)]
    pub hold: Hold,
}

/// A patron's loans and holds across every pool, ordered by pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatronActivity {
    pub loans: Vec<LoanInfo>,
    pub holds: Vec<HoldInfo>,
}

pub struct CirculationFacade {
    pools: DashMap<PoolId, Arc<LicensePool>>,
    service: Arc<dyn LicenseStatusService>,
    scheduler: ReservationScheduler,
    clock: Arc<dyn Clock>,
    changes: Arc<PoolChangeQueue>,
    loan_duration: TimeDelta,
    notification_url: String,
}

impl CirculationFacade {
    pub fn new(
        config: &CirculationConfig,
        service: Arc<dyn LicenseStatusService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pools: DashMap::new(),
            service,
            scheduler: ReservationScheduler::new(config),
            clock,
            changes: Arc::new(PoolChangeQueue::new()),
            loan_duration: config.loan_duration(),
            notification_url: config.notification_url.clone(),
        }
    }

    pub fn scheduler(&self) -> &ReservationScheduler {
        &self.scheduler
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Adds a pool, or replaces the license inventory of an existing one.
    pub fn register_pool(&self, id: PoolId, licenses: Vec<License>) -> Arc<LicensePool> {
        let now = self.clock.now();
        let pool = self
            .pools
            .entry(id)
            .or_insert_with(|| {
                Arc::new(LicensePool::new(
                    id,
                    Vec::new(),
                    &self.scheduler,
                    Arc::clone(&self.changes),
                    now,
                ))
            })
            .clone();
        pool.replace_licenses(licenses, &self.scheduler, now);
        pool
    }

    /// Replaces the license inventory of a known pool.
    pub fn update_licenses(
        &self,
        id: PoolId,
        licenses: Vec<License>,
    ) -> Result<(), CirculationError> {
        let pool = self.pool(id)?;
        pool.replace_licenses(licenses, &self.scheduler, self.clock.now());
        Ok(())
    }

    pub fn pool(&self, id: PoolId) -> Result<Arc<LicensePool>, CirculationError> {
        self.pools
            .get(&id)
            .map(|pool| Arc::clone(pool.value()))
            .ok_or(CirculationError::UnknownPool(id))
    }

    /// Every pool, ordered by id.
    pub fn pools(&self) -> Vec<Arc<LicensePool>> {
        let mut pools: Vec<_> = self.pools.iter().map(|p| Arc::clone(p.value())).collect();
        pools.sort_by_key(|pool| pool.id());
        pools
    }

    pub fn pool_counters(&self, id: PoolId) -> Result<PoolCounters, CirculationError> {
        Ok(self.pool(id)?.counters())
    }

    /// Pools changed since the last call, oldest change first.
    pub fn changed_pools(&self) -> Vec<PoolId> {
        self.changes.drain()
    }

    /// Lends the patron a copy.
    ///
    /// # Errors
    ///
    /// - [`CirculationError::AlreadyCheckedOut`] - the patron already has a loan.
    /// - [`CirculationError::NoAvailableCopies`] - every copy is on loan or reserved for someone else.
    /// - [`CirculationError::NoLicenses`] - the pool has no usable license.
    /// - [`CirculationError::CannotLoan`] - the license server refused.
    /// - [`CirculationError::RemoteIntegration`] - the license server was unreachable.
    #[instrument(skip(self), err)]
    pub async fn checkout(
        &self,
        patron: PatronId,
        pool_id: PoolId,
    ) -> Result<Loan, CirculationError> {
        let pool = self.pool(pool_id)?;
        let now = self.clock.now();
        let ticket = pool.prepare_checkout(patron, &self.scheduler, now)?;

        let request = CheckoutRequest {
            license_id: ticket.license_id.clone(),
            checkout_url: ticket.checkout_url.clone(),
            expires: now
                .checked_add_signed(self.loan_duration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            notification_url: self.notification_url.clone(),
        };
        let grant = self.service.checkout(&request).await?;
        let external_identifier = grant.external_identifier.clone();

        match pool.commit_checkout(&ticket, grant, &self.scheduler, self.clock.now()) {
            Ok(loan) => {
                info!(%patron, pool = %pool_id, license = %loan.license_id, admission = ?ticket.admission, "checked out");
                Ok(loan)
            }
            Err(error) => {
                warn!(%patron, pool = %pool_id, %error, "pool changed during checkout; returning remote loan");
                if let Err(return_error) = self.service.checkin(&external_identifier).await {
                    warn!(loan = %external_identifier, error = %return_error, "could not return orphaned remote loan");
                }
                Err(error)
            }
        }
    }

    /// Returns the patron's loan; the copy goes to the next hold, if any.
    #[instrument(skip(self), err)]
    pub async fn checkin(
        &self,
        patron: PatronId,
        pool_id: PoolId,
    ) -> Result<Loan, CirculationError> {
        let pool = self.pool(pool_id)?;
        let loan = pool
            .loan_for(patron)
            .ok_or(CirculationError::NotCheckedOut)?;
        if let Some(external_identifier) = loan.external_identifier.as_deref() {
            self.service.checkin(external_identifier).await?;
        }
        let loan = pool.commit_checkin(patron, &self.scheduler, self.clock.now())?;
        info!(%patron, pool = %pool_id, license = %loan.license_id, "checked in");
        Ok(loan)
    }

    /// Queues the patron for the next copy.
    #[instrument(skip(self), err)]
    pub async fn place_hold(
        &self,
        patron: PatronId,
        pool_id: PoolId,
    ) -> Result<Hold, CirculationError> {
        let hold = self
            .pool(pool_id)?
            .place_hold(patron, &self.scheduler, self.clock.now())?;
        info!(%patron, pool = %pool_id, position = ?hold.position, end = ?hold.end, "hold placed");
        Ok(hold)
    }

    /// Takes the patron out of the queue. Holds are local, so no remote call.
    #[instrument(skip(self), err)]
    pub async fn release_hold(
        &self,
        patron: PatronId,
        pool_id: PoolId,
    ) -> Result<Hold, CirculationError> {
        let hold = self
            .pool(pool_id)?
            .release_hold(patron, &self.scheduler, self.clock.now())?;
        info!(%patron, pool = %pool_id, "hold released");
        Ok(hold)
    }

    /// Resolves where the patron can get the loaned content in `content_type`.
    #[instrument(skip(self), err)]
    pub async fn fulfill(
        &self,
        patron: PatronId,
        pool_id: PoolId,
        content_type: &str,
    ) -> Result<Fulfillment, CirculationError> {
        let loan = self
            .pool(pool_id)?
            .loan_for(patron)
            .ok_or(CirculationError::NotCheckedOut)?;
        let external_identifier = loan.external_identifier.as_deref().ok_or_else(|| {
            CirculationError::CannotFulfill("loan has no license status document".into())
        })?;
        self.service.fulfill(external_identifier, content_type).await
    }

    /// The patron's loans and holds. Reservations the patron let lapse are
    /// deleted on the way, passing their copies on.
    #[instrument(skip(self))]
    pub async fn patron_activity(&self, patron: PatronId) -> PatronActivity {
        let now = self.clock.now();
        let mut activity = PatronActivity::default();
        for pool in self.pools() {
            if pool.reap(Some(patron), &self.scheduler, now) > 0 {
                info!(%patron, pool = %pool.id(), "lapsed reservation removed");
            }
            if let Some(loan) = pool.loan_for(patron) {
                activity.loans.push(LoanInfo { pool: pool.id(), loan });
            }
            if let Some(hold) = pool.hold_for(patron) {
                activity.holds.push(HoldInfo { pool: pool.id(), hold });
            }
        }
        activity
    }

    /// Applies a status document the license server pushed or we fetched.
    ///
    /// A returned, cancelled or revoked loan is removed and its copy passed on
    /// (`Ok(None)`); a live one gets its end date refreshed (`Ok(Some(loan))`).
    #[instrument(skip(self, document), fields(status = ?document.status), err)]
    pub fn apply_status_document(
        &self,
        external_identifier: &str,
        document: &LicenseStatusDocument,
    ) -> Result<Option<Loan>, CirculationError> {
        let (pool, loan) = self
            .pools()
            .into_iter()
            .find_map(|pool| {
                pool.loan_by_external_identifier(external_identifier)
                    .map(|loan| (pool, loan))
            })
            .ok_or(CirculationError::NotCheckedOut)?;
        let now = self.clock.now();

        if document.status.is_terminal() {
            pool.commit_checkin(loan.patron, &self.scheduler, now)?;
            info!(patron = %loan.patron, pool = %pool.id(), "loan ended on the license server");
            return Ok(None);
        }
        let end = document.potential_rights.end.or(loan.end);
        pool.update_loan_end(loan.patron, end, &self.scheduler, now)
            .map(Some)
    }

    /// Refreshes a loan from its status document.
    #[instrument(skip(self), err)]
    pub async fn sync_loan(
        &self,
        patron: PatronId,
        pool_id: PoolId,
    ) -> Result<Option<Loan>, CirculationError> {
        let loan = self
            .pool(pool_id)?
            .loan_for(patron)
            .ok_or(CirculationError::NotCheckedOut)?;
        let Some(external_identifier) = loan.external_identifier else {
            return Ok(Some(loan));
        };
        let document = self.service.status(&external_identifier).await?;
        self.apply_status_document(&external_identifier, &document)
    }
}
