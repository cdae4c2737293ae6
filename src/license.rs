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

//! License inventory.
//!
//! A [`License`] is one purchasable unit of concurrent-use access. The
//! [`LicenseTracker`] answers two questions about a pool's licenses: how much
//! capacity exists at all, and which license a new checkout should draw on.

use crate::base::LicenseId;
use crate::error::CirculationError;
use crate::records::Loan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub id: LicenseId,
    /// URI template used to request a new loan.
    pub checkout_url: String,
    pub status_url: String,
    pub expires: Option<DateTime<Utc>>,
    /// Maximum simultaneous loans this license supports.
    pub concurrent_checkouts: u32,
    /// Lifetime checkout budget. `None` is unlimited.
    pub remaining_checkouts: Option<u32>,
}

impl License {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_checkouts == Some(0)
    }

    /// Whether this license can back any loan, now or later.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && !self.is_exhausted()
    }

    pub fn active_loans(&self, loans: &[Loan]) -> u32 {
        let count = loans.iter().filter(|loan| loan.license_id == self.id).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Draws one checkout from the lifetime budget.
    pub(crate) fn consume(&mut self) {
        if let Some(remaining) = self.remaining_checkouts.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
    }
}

/// Allocation policy: among eligible licenses prefer the one that expires
/// soonest, then the one with the smallest finite budget, then the lowest id.
fn allocation_order(a: &License, b: &License) -> Ordering {
    let expiry = match (a.expires, b.expires) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    let budget = match (a.remaining_checkouts, b.remaining_checkouts) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    expiry.then(budget).then_with(|| a.id.cmp(&b.id))
}

pub struct LicenseTracker;

impl LicenseTracker {
    /// Sum of `concurrent_checkouts` over usable licenses.
    pub fn licenses_owned(licenses: &[License], now: DateTime<Utc>) -> u32 {
        licenses
            .iter()
            .filter(|license| license.is_usable(now))
            .map(|license| license.concurrent_checkouts)
            .fold(0, u32::saturating_add)
    }

    /// Copies not currently on loan, whether reserved or not.
    pub fn free_capacity(licenses: &[License], loans: &[Loan], now: DateTime<Utc>) -> u32 {
        licenses
            .iter()
            .filter(|license| license.is_usable(now))
            .map(|license| {
                license
                    .concurrent_checkouts
                    .saturating_sub(license.active_loans(loans))
            })
            .fold(0, u32::saturating_add)
    }

    /// Picks the license a new loan should be drawn from.
    ///
    /// # Errors
    ///
    /// - [`CirculationError::NoLicenses`] - every license is expired or exhausted.
    /// - [`CirculationError::NoAvailableCopies`] - usable licenses are all at capacity.
    pub fn allocate<'a>(
        licenses: &'a [License],
        loans: &[Loan],
        now: DateTime<Utc>,
    ) -> Result<&'a License, CirculationError> {
        let mut usable = licenses
            .iter()
            .filter(|license| license.is_usable(now))
            .peekable();
        if usable.peek().is_none() {
            return Err(CirculationError::NoLicenses);
        }

        usable
            .filter(|license| license.active_loans(loans) < license.concurrent_checkouts)
            .min_by(|a, b| allocation_order(a, b))
            .ok_or(CirculationError::NoAvailableCopies)
    }

    /// Gives a checkout back to the license's lifetime budget.
    pub fn release(license: &mut License) {
        if let Some(remaining) = license.remaining_checkouts.as_mut() {
            *remaining = remaining.saturating_add(1);
        }
    }
}
