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

//! Hold queue arithmetic.
//!
//! Positions follow arrival order (`start`). Reserved holds sit at position 0;
//! a waiting hold's position counts every live hold that arrived before it,
//! reserved or not, plus one.
//!
//! A waiting hold's `end` estimates when a copy reaches it. Every copy is
//! either on loan, freeing up when the loan ends, or reserved, freeing up once
//! the reservation converts to a loan and that loan ends. Sorting those
//! instants gives the next round of availability; later rounds repeat it,
//! shifted by one full reservation-plus-loan cycle each.

use crate::config::CirculationConfig;
use crate::records::Hold;
use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldQueue {
    reservation_period: TimeDelta,
    loan_duration: TimeDelta,
}

impl HoldQueue {
    pub fn new(config: &CirculationConfig) -> Self {
        Self::with_periods(config.reservation_period(), config.loan_duration())
    }

    pub fn with_periods(reservation_period: TimeDelta, loan_duration: TimeDelta) -> Self {
        Self {
            reservation_period,
            loan_duration,
        }
    }

    pub fn reservation_period(&self) -> TimeDelta {
        self.reservation_period
    }

    /// Active holds on the same pool ahead of `hold` in arrival order. Holds
    /// placed at the same instant are ordered by patron id.
    pub fn count_holds_before(holds: &[Hold], hold: &Hold, now: DateTime<Utc>) -> u32 {
        let count = holds
            .iter()
            .filter(|other| other.is_active(now))
            .filter(|other| (other.start, other.patron) < (hold.start, hold.patron))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Sorts holds into arrival order; ties go to the lower patron id.
    pub fn sort_by_arrival(holds: &mut [Hold]) {
        holds.sort_by(|a, b| a.start.cmp(&b.start).then(a.patron.cmp(&b.patron)));
    }

    /// Gives every non-reserved live hold its queue rank.
    pub fn assign_positions(holds: &mut [Hold], now: DateTime<Utc>) {
        let ranks: Vec<Option<u32>> = holds
            .iter()
            .map(|hold| {
                if hold.is_reserved() || !hold.is_active(now) {
                    hold.position
                } else {
                    Some(Self::count_holds_before(holds, hold, now) + 1)
                }
            })
            .collect();
        for (hold, rank) in holds.iter_mut().zip(ranks) {
            hold.position = rank;
        }
    }

    /// Sets a hold's reservation deadline or estimated availability.
    ///
    /// At position 0 an unset or past `end` means the hold was just promoted,
    /// so it gets a fresh reservation window; a future deadline is kept.
    pub fn update_end_date(
        &self,
        hold: &mut Hold,
        reserved_slots: u32,
        loan_end_dates: &[DateTime<Utc>],
        reserved_end_dates: &[DateTime<Utc>],
        now: DateTime<Utc>,
    ) {
        match hold.position {
            Some(0) => {
                if hold.end.is_none_or(|end| end < now) {
                    hold.end = now.checked_add_signed(self.reservation_period);
                }
            }
            Some(position) => {
                let slots_ahead = position.saturating_sub(reserved_slots).max(1);
                hold.end = self.estimate_availability(slots_ahead, loan_end_dates, reserved_end_dates);
            }
            None => {}
        }
    }

    /// When the `slots_ahead`-th copy turns over, or `None` if none ever will
    /// or the date falls outside the representable range.
    pub fn estimate_availability(
        &self,
        slots_ahead: u32,
        loan_end_dates: &[DateTime<Utc>],
        reserved_end_dates: &[DateTime<Utc>],
    ) -> Option<DateTime<Utc>> {
        let mut next_available: Vec<DateTime<Utc>> = loan_end_dates
            .iter()
            .copied()
            .chain(reserved_end_dates.iter().map(|end| {
                end.checked_add_signed(self.loan_duration)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC)
            }))
            .collect();
        if next_available.is_empty() || slots_ahead == 0 {
            return None;
        }
        next_available.sort_unstable();

        let index = (slots_ahead - 1) as usize;
        let round = i32::try_from(index / next_available.len()).ok()?;
        let base = next_available[index % next_available.len()];
        let shift = self
            .reservation_period
            .checked_add(&self.loan_duration)?
            .checked_mul(round)?;
        base.checked_add_signed(shift)
    }
}
