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

//! Error types for circulation operations.

use crate::base::PoolId;
use thiserror::Error;

/// Circulation errors.
///
/// Local state-machine violations never mutate anything. Only
/// [`CirculationError::RemoteIntegration`] is worth retrying; every other
/// variant is a business outcome the caller should surface as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CirculationError {
    /// No license in the pool can ever satisfy a checkout (all expired or exhausted)
    #[error("no licenses")]
    NoLicenses,

    /// Usable capacity exists but every copy is on loan or reserved
    #[error("no available copies")]
    NoAvailableCopies,

    #[error("already checked out")]
    AlreadyCheckedOut,

    #[error("already on hold")]
    AlreadyOnHold,

    #[error("not checked out")]
    NotCheckedOut,

    #[error("not on hold")]
    NotOnHold,

    /// Holds are refused while a copy can be checked out right away
    #[error("currently available")]
    CurrentlyAvailable,

    /// The license server refused or mangled a checkout
    #[error("cannot loan: {0}")]
    CannotLoan(String),

    #[error("cannot return: {0}")]
    CannotReturn(String),

    #[error("cannot release hold: {0}")]
    CannotReleaseHold(String),

    #[error("cannot fulfill: {0}")]
    CannotFulfill(String),

    /// The loan has no license or manifest link of the requested type
    #[error("format not available")]
    FormatNotAvailable,

    /// The license status document could not be parsed
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Transport failure, timeout or 5xx from the license server
    #[error("remote integration failure: {0}")]
    RemoteIntegration(String),

    #[error("unknown license pool {0}")]
    UnknownPool(PoolId),

    #[error("unknown collection {0:?}")]
    UnknownCollection(String),
}

impl CirculationError {
    /// Whether the operation may succeed if repeated unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteIntegration(_))
    }
}
