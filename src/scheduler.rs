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

//! Reservation scheduling.
//!
//! [`ReservationScheduler::plan`] is the decide half of reconciliation: it reads
//! a snapshot of a pool's licenses, loans and holds and returns the mutations
//! that bring the pool back to a consistent state. It performs no I/O and
//! cannot fail. Applying the mutations is the pool's job.
//!
//! The pass, run to a fixed point in one go:
//!
//! 1. Reservations without a live claimant go back to available. Claimants in
//!    excess of free capacity (a license expired under them) are demoted,
//!    latest arrivals first.
//! 2. While free copies remain and holds are waiting, the earliest waiting
//!    hold is promoted to position 0 with a fresh reservation window.
//! 3. Every remaining waiting hold gets its position and estimated end.
//! 4. Counters are recomputed.

use crate::base::PatronId;
use crate::config::CirculationConfig;
use crate::hold_queue::HoldQueue;
use crate::license::{License, LicenseTracker};
use crate::records::{Hold, Loan};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Denormalized pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCounters {
    pub licenses_owned: u32,
    pub licenses_available: u32,
    pub licenses_reserved: u32,
    pub patrons_in_hold_queue: u32,
}

impl PoolCounters {
    pub fn is_consistent(&self) -> bool {
        self.licenses_available
            .checked_add(self.licenses_reserved)
            .is_some_and(|committed| committed <= self.licenses_owned)
    }
}

/// One change produced by the decide step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolMutation {
    UpdateHold {
        patron: PatronId,
        position: Option<u32>,
        end: Option<DateTime<Utc>>,
    },
    SetCounters(PoolCounters),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationScheduler {
    queue: HoldQueue,
}

impl ReservationScheduler {
    pub fn new(config: &CirculationConfig) -> Self {
        Self {
            queue: HoldQueue::new(config),
        }
    }

    pub fn with_queue(queue: HoldQueue) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &HoldQueue {
        &self.queue
    }

    /// Computes the mutations that reconcile a pool.
    ///
    /// The last mutation is always [`PoolMutation::SetCounters`]; hold updates
    /// are emitted only for holds whose position or end actually changes.
    pub fn plan(
        &self,
        licenses: &[License],
        loans: &[Loan],
        holds: &[Hold],
        now: DateTime<Utc>,
    ) -> Vec<PoolMutation> {
        let licenses_owned = LicenseTracker::licenses_owned(licenses, now);
        let capacity = LicenseTracker::free_capacity(licenses, loans, now);

        let mut live: Vec<Hold> = holds.iter().filter(|h| h.is_active(now)).cloned().collect();
        HoldQueue::sort_by_arrival(&mut live);

        // Keep the earliest claimants a copy can still back.
        let mut reserved = 0u32;
        for hold in live.iter_mut().filter(|h| h.is_reserved()) {
            if reserved < capacity {
                reserved += 1;
            } else {
                hold.position = None;
                hold.end = None;
            }
        }

        for hold in live.iter_mut().filter(|h| !h.is_reserved()) {
            if reserved >= capacity {
                break;
            }
            hold.position = Some(0);
            hold.end = None;
            reserved += 1;
        }

        for hold in live.iter_mut().filter(|h| h.is_reserved()) {
            self.queue.update_end_date(hold, reserved, &[], &[], now);
        }

        HoldQueue::assign_positions(&mut live, now);

        let loan_end_dates: Vec<DateTime<Utc>> = loans.iter().filter_map(|l| l.end).collect();
        let reserved_end_dates: Vec<DateTime<Utc>> = live
            .iter()
            .filter(|h| h.is_reserved())
            .filter_map(|h| h.end)
            .collect();
        for hold in live.iter_mut().filter(|h| !h.is_reserved()) {
            self.queue.update_end_date(
                hold,
                reserved,
                &loan_end_dates,
                &reserved_end_dates,
                now,
            );
        }

        let mut mutations: Vec<PoolMutation> = live
            .iter()
            .filter(|updated| {
                holds
                    .iter()
                    .find(|original| original.patron == updated.patron)
                    .is_none_or(|original| {
                        original.position != updated.position || original.end != updated.end
                    })
            })
            .map(|updated| PoolMutation::UpdateHold {
                patron: updated.patron,
                position: updated.position,
                end: updated.end,
            })
            .collect();

        mutations.push(PoolMutation::SetCounters(PoolCounters {
            licenses_owned,
            licenses_available: capacity - reserved,
            licenses_reserved: reserved,
            patrons_in_hold_queue: u32::try_from(live.len()).unwrap_or(u32::MAX),
        }));
        mutations
    }
}
