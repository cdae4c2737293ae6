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

//! # Circulation Engine
//!
//! This library allocates a digital title's concurrent-use licenses to
//! patrons, keeps a fair first-come-first-served hold queue when no copy is
//! free, and keeps local bookkeeping in step with the distributor's license
//! status service.
//!
//! ## Core Components
//!
//! - [`CirculationFacade`]: checkout, checkin, holds, fulfillment and patron activity
//! - [`LicensePool`]: one title's licenses, loans and holds behind a single lock
//! - [`ReservationScheduler`]: decides promotions, positions and counters
//! - [`HoldQueue`]: hold positions and estimated availability
//! - [`LicenseTracker`]: license capacity and allocation
//! - [`RemoteLicenseClient`]: HTTP client for license status documents
//! - [`HoldReaper`]: periodic removal of lapsed reservations
//! - [`CirculationError`]: everything an operation can fail with
//!
//! ## Example
//!
//! ```no_run
//! use circulation_engine::{
//!     CirculationConfig, CirculationFacade, License, LicenseId, PatronId, PoolId,
//!     RemoteLicenseClient, SystemClock,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), circulation_engine::CirculationError> {
//! let config = CirculationConfig::default();
//! let client = RemoteLicenseClient::new(&config)?;
//! let facade = CirculationFacade::new(&config, Arc::new(client), Arc::new(SystemClock));
//!
//! facade.register_pool(
//!     PoolId(1),
//!     vec![License {
//!         id: LicenseId::new("urn:uuid:8f3e"),
//!         checkout_url: "https://lcp.example.com/checkout{?id,checkout_id,expires,patron_id,notification_url}".into(),
//!         status_url: "https://lcp.example.com/licenses/8f3e/status".into(),
//!         expires: None,
//!         concurrent_checkouts: 1,
//!         remaining_checkouts: None,
//!     }],
//! );
//!
//! let loan = facade.checkout(PatronId(7), PoolId(1)).await?;
//! println!("loan ends {:?}", loan.end);
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! Pools are independent: operations on different pools run in parallel,
//! while each pool serializes its own transitions. No lock is held across a
//! remote call.

pub mod base;
pub mod change_queue;
pub mod circulation;
pub mod config;
pub mod error;
pub mod hold_queue;
pub mod license;
pub mod pool;
pub mod provider;
pub mod reaper;
pub mod records;
pub mod remote;
pub mod scheduler;
mod template;

pub use base::{Clock, LicenseId, PatronId, PoolId, SystemClock};
pub use change_queue::PoolChangeQueue;
pub use circulation::{CirculationFacade, HoldInfo, LoanInfo, PatronActivity};
pub use config::{CirculationConfig, CollectionConfig};
pub use error::CirculationError;
pub use hold_queue::HoldQueue;
pub use license::{License, LicenseTracker};
pub use pool::{Admission, CheckoutTicket, LicensePool};
pub use provider::{CirculationProvider, Protocol, ProviderRegistry};
pub use reaper::{HoldReaper, ReapReport};
pub use records::{Hold, Loan};
pub use remote::{
    CheckoutRequest, Fulfillment, LicenseStatusDocument, LicenseStatusService, Link, LoanGrant,
    LoanStatus, PotentialRights, RemoteLicenseClient,
};
pub use scheduler::{PoolCounters, PoolMutation, ReservationScheduler};
