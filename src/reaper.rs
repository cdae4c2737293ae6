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

//! Periodic sweep of lapsed reservations.
//!
//! A patron who does not check out a reserved copy before the reservation
//! deadline loses it. Lapsed reservations are already ignored by
//! reconciliation; the reaper deletes them and reconciles each touched pool
//! once so the copy moves to the next hold in line.

use crate::circulation::CirculationFacade;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReapReport {
    pub holds_deleted: usize,
    pub pools_touched: usize,
}

pub struct HoldReaper {
    facade: Arc<CirculationFacade>,
    interval: Duration,
}

impl HoldReaper {
    pub fn new(facade: Arc<CirculationFacade>, interval: Duration) -> Self {
        Self { facade, interval }
    }

    /// One sweep over every pool with holds.
    pub fn run_once(&self) -> ReapReport {
        let now = self.facade.now();
        let mut report = ReapReport::default();
        for pool in self.facade.pools().iter().filter(|pool| pool.has_holds()) {
            let deleted = pool.reap(None, self.facade.scheduler(), now);
            if deleted > 0 {
                debug!(pool = %pool.id(), deleted, "reaped lapsed reservations");
                report.holds_deleted += deleted;
                report.pools_touched += 1;
            }
        }
        if report.holds_deleted > 0 {
            info!(
                holds_deleted = report.holds_deleted,
                pools_touched = report.pools_touched,
                "hold reaper sweep"
            );
        }
        report
    }

    /// Sweeps every `interval` until `shutdown` is cancelled.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("hold reaper shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.run_once();
                    }
                }
            }
        })
    }
}
