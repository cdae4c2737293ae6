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

//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use circulation_engine::{
    CheckoutRequest, CirculationConfig, CirculationError, CirculationFacade, Clock, Fulfillment,
    License, LicenseId, LicenseStatusDocument, LicenseStatusService, Link, LoanGrant, LoanStatus,
    PotentialRights,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const LCP_LICENSE: &str = "application/vnd.readium.lcp.license.v1.0+json";

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap()
}

/// A clock tests move by hand.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// In-memory license server. Loans end at the requested `expires`.
#[derive(Debug, Default)]
pub struct StubLicenseServer {
    documents: Mutex<HashMap<String, LicenseStatusDocument>>,
    issued: AtomicUsize,
    pub checkouts: AtomicUsize,
    pub checkins: AtomicUsize,
    unreachable: AtomicBool,
}

impl StubLicenseServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the network were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn checkouts(&self) -> usize {
        self.checkouts.load(Ordering::SeqCst)
    }

    pub fn checkins(&self) -> usize {
        self.checkins.load(Ordering::SeqCst)
    }

    pub fn document(&self, external_identifier: &str) -> Option<LicenseStatusDocument> {
        self.documents.lock().get(external_identifier).cloned()
    }

    fn reachable(&self) -> Result<(), CirculationError> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(CirculationError::RemoteIntegration(
                "connection refused".into(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LicenseStatusService for StubLicenseServer {
    async fn status(
        &self,
        external_identifier: &str,
    ) -> Result<LicenseStatusDocument, CirculationError> {
        self.reachable()?;
        self.document(external_identifier)
            .ok_or_else(|| CirculationError::MalformedResponse("unknown loan".into()))
    }

    async fn checkout(&self, request: &CheckoutRequest) -> Result<LoanGrant, CirculationError> {
        self.reachable()?;
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.checkouts.fetch_add(1, Ordering::SeqCst);
        let self_link = format!("https://lcp.test/loans/{n}");
        let document = LicenseStatusDocument {
            status: LoanStatus::Active,
            potential_rights: PotentialRights {
                end: Some(request.expires),
            },
            links: vec![
                Link {
                    rel: "self".into(),
                    href: self_link.clone(),
                    media_type: None,
                },
                Link {
                    rel: "license".into(),
                    href: format!("{self_link}/license"),
                    media_type: Some(LCP_LICENSE.into()),
                },
            ],
        };
        let grant = document.loan_grant()?;
        self.documents.lock().insert(self_link, document);
        Ok(grant)
    }

    async fn checkin(&self, external_identifier: &str) -> Result<(), CirculationError> {
        self.reachable()?;
        self.checkins.fetch_add(1, Ordering::SeqCst);
        if let Some(document) = self.documents.lock().get_mut(external_identifier) {
            document.status = LoanStatus::Returned;
        }
        Ok(())
    }

    async fn fulfill(
        &self,
        external_identifier: &str,
        content_type: &str,
    ) -> Result<Fulfillment, CirculationError> {
        let document = self.status(external_identifier).await?;
        let link = document
            .links
            .iter()
            .find(|link| link.rel == "license" && link.media_type.as_deref() == Some(content_type))
            .ok_or(CirculationError::FormatNotAvailable)?;
        Ok(Fulfillment {
            content_link: link.href.clone(),
            content_type: content_type.to_string(),
            content_expires: document.potential_rights.end,
        })
    }
}

pub fn license(id: &str, concurrent: u32) -> License {
    License {
        id: LicenseId::new(id),
        checkout_url: format!("https://lcp.test/licenses/{id}/checkout{{?id,checkout_id,expires,patron_id,notification_url}}"),
        status_url: format!("https://lcp.test/licenses/{id}/status"),
        expires: None,
        concurrent_checkouts: concurrent,
        remaining_checkouts: None,
    }
}

pub struct Harness {
    pub facade: Arc<CirculationFacade>,
    pub server: Arc<StubLicenseServer>,
    pub clock: Arc<ManualClock>,
}

pub fn harness(config: &CirculationConfig) -> Harness {
    let server = Arc::new(StubLicenseServer::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let facade = Arc::new(CirculationFacade::new(
        config,
        Arc::clone(&server) as Arc<dyn LicenseStatusService>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    ));
    Harness {
        facade,
        server,
        clock,
    }
}
