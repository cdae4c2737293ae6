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

//! Pool change notifications.
//!
//! Every reconciliation that changes a pool records the pool here so a
//! downstream index or cache can refresh it. Pending entries are deduplicated:
//! a pool changed ten times before anyone drains the queue is reported once.

use crate::base::PoolId;
use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// A thread-safe FIFO of changed pools with duplicate suppression.
///
/// Combines a [`DashMap`] for O(1) pending checks with a [`SegQueue`] to
/// preserve the order in which pools first changed.
#[derive(Debug)]
pub struct PoolChangeQueue {
    pending: DashMap<PoolId, ()>,
    order: SegQueue<PoolId>,
}

impl PoolChangeQueue {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            order: SegQueue::new(),
        }
    }

    /// Records a change. Returns `false` if the pool was already pending.
    pub fn push(&self, pool: PoolId) -> bool {
        // Entry API makes check-and-insert atomic against concurrent pushes.
        match self.pending.entry(pool) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(());
                self.order.push(pool);
                true
            }
        }
    }

    /// Takes every pending pool, oldest change first.
    pub fn drain(&self) -> Vec<PoolId> {
        let mut drained = Vec::with_capacity(self.order.len());
        while let Some(pool) = self.order.pop() {
            self.pending.remove(&pool);
            drained.push(pool);
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for PoolChangeQueue {
    fn default() -> Self {
        Self::new()
    }
}
