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

//! Loan and hold records.
//!
//! Per (patron, pool) a patron is in exactly one of three states:
//!
//! ```text
//!   none ──place_hold──► hold (position > 0) ──promotion──► hold (position 0)
//!     │                       │                                 │
//!     │                       └──release_hold──► none ◄─────────┤ release / lapse
//!     │                                                         │
//!     └────────────checkout─────────► loan ◄────checkout────────┘
//!                                      │
//!                                      └──checkin / remote return──► none
//! ```

use crate::base::{LicenseId, PatronId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A license checked out by a patron.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub patron: PatronId,
    pub license_id: LicenseId,
    pub start: DateTime<Utc>,
    /// `None` means the loan runs indefinitely.
    pub end: Option<DateTime<Utc>>,
    /// The remote `self` link of the loan's license status document.
    pub external_identifier: Option<String>,
}

/// A patron's place in a pool's waiting list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    pub patron: PatronId,
    pub start: DateTime<Utc>,
    /// Reservation deadline at position 0, estimated availability otherwise.
    pub end: Option<DateTime<Utc>>,
    /// 0 = a copy is reserved for this patron; >0 = rank in the queue.
    pub position: Option<u32>,
}

impl Hold {
    pub fn new(patron: PatronId, start: DateTime<Utc>) -> Self {
        Self {
            patron,
            start,
            end: None,
            position: None,
        }
    }

    pub fn is_reserved(&self) -> bool {
        self.position == Some(0)
    }

    /// A reservation whose deadline passed without the patron checking out.
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.is_reserved() && self.end.is_some_and(|end| end < now)
    }

    /// Lapsed reservations are dead weight awaiting the reaper. A waiting
    /// hold stays active even when its estimated `end` has passed.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_lapsed(now)
    }
}
