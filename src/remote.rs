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

//! License status service client.
//!
//! The license server is the source of truth for a loan's lifecycle. Each loan
//! has a License Status Document:
//!
//! ```json
//! {
//!   "status": "active",
//!   "potentialRights": { "end": "2026-11-07T00:00:00Z" },
//!   "links": [
//!     { "rel": "self", "href": "https://lcp.example.com/loans/1", "type": "application/vnd.readium.license.status.v1.0+json" },
//!     { "rel": "return", "href": "https://lcp.example.com/loans/1/return{?id,name}" },
//!     { "rel": "license", "href": "https://lcp.example.com/loans/1/license", "type": "application/vnd.readium.lcp.license.v1.0+json" }
//!   ]
//! }
//! ```
//!
//! [`LicenseStatusService`] is the seam the circulation layer talks to;
//! [`RemoteLicenseClient`] implements it over HTTP.

use crate::base::LicenseId;
use crate::config::CirculationConfig;
use crate::error::CirculationError;
use crate::template;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Ready,
    Active,
    Returned,
    Cancelled,
    Revoked,
}

impl LoanStatus {
    /// The loan still grants access.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Ready | Self::Active)
    }

    /// The loan is over on the remote side.
    pub fn is_terminal(self) -> bool {
        !self.is_live()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotentialRights {
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseStatusDocument {
    pub status: LoanStatus,
    #[serde(default)]
    pub potential_rights: PotentialRights,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl LicenseStatusDocument {
    pub fn parse(body: &[u8]) -> Result<Self, CirculationError> {
        serde_json::from_slice(body).map_err(|e| CirculationError::MalformedResponse(e.to_string()))
    }

    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.rel == rel)
    }

    /// Turns a checkout response into a loan grant.
    ///
    /// # Errors
    ///
    /// [`CirculationError::CannotLoan`] unless the loan is ready or active and
    /// the document carries both an end date and a `self` link.
    pub fn loan_grant(&self) -> Result<LoanGrant, CirculationError> {
        if !self.status.is_live() {
            return Err(CirculationError::CannotLoan(format!(
                "license server returned status {:?}",
                self.status
            )));
        }
        let end = self
            .potential_rights
            .end
            .ok_or_else(|| CirculationError::CannotLoan("missing potentialRights.end".into()))?;
        let external_identifier = self
            .link("self")
            .map(|link| link.href.clone())
            .ok_or_else(|| CirculationError::CannotLoan("missing self link".into()))?;
        Ok(LoanGrant {
            external_identifier,
            end: Some(end),
        })
    }
}

/// The remote side of a granted loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanGrant {
    /// The status document's `self` link.
    pub external_identifier: String,
    pub end: Option<DateTime<Utc>>,
}

/// Everything needed to ask the license server for a new loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub license_id: LicenseId,
    /// The license's checkout URI template.
    pub checkout_url: String,
    pub expires: DateTime<Utc>,
    pub notification_url: String,
}

/// Where and until when a patron can get at a loan's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
    pub content_link: String,
    pub content_type: String,
    pub content_expires: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait LicenseStatusService: Send + Sync {
    /// Fetches the status document behind a loan's `self` link.
    async fn status(&self, external_identifier: &str)
    -> Result<LicenseStatusDocument, CirculationError>;

    async fn checkout(&self, request: &CheckoutRequest) -> Result<LoanGrant, CirculationError>;

    /// Returns a loan. Loans the server no longer knows count as returned.
    async fn checkin(&self, external_identifier: &str) -> Result<(), CirculationError>;

    async fn fulfill(
        &self,
        external_identifier: &str,
        content_type: &str,
    ) -> Result<Fulfillment, CirculationError>;
}

/// Which operation a response belongs to, for error mapping.
#[derive(Debug, Clone, Copy)]
enum Operation {
    Status,
    Checkout,
    Checkin,
    Fulfill,
}

impl Operation {
    fn rejected(self, status: StatusCode, url: &str) -> CirculationError {
        let reason = format!("{url} answered {status}");
        match self {
            Self::Status => CirculationError::MalformedResponse(reason),
            Self::Checkout => CirculationError::CannotLoan(reason),
            Self::Checkin => CirculationError::CannotReturn(reason),
            Self::Fulfill => CirculationError::CannotFulfill(reason),
        }
    }
}

fn transport_error(error: reqwest::Error) -> CirculationError {
    if error.is_timeout() {
        CirculationError::RemoteIntegration(format!("timed out: {error}"))
    } else {
        CirculationError::RemoteIntegration(error.to_string())
    }
}

/// HTTP client for the license status service.
#[derive(Debug, Clone)]
pub struct RemoteLicenseClient {
    client: Client,
}

impl RemoteLicenseClient {
    pub fn new(config: &CirculationConfig) -> Result<Self, CirculationError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(transport_error)?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Builds the checkout URL. `checkout_id` and `patron_id` are fresh v4
    /// UUIDs, so the server never learns who the patron is.
    pub fn checkout_url(request: &CheckoutRequest) -> String {
        template::expand(
            &request.checkout_url,
            &[
                ("id", request.license_id.to_string()),
                ("checkout_id", Uuid::new_v4().to_string()),
                (
                    "expires",
                    request.expires.to_rfc3339_opts(SecondsFormat::Secs, true),
                ),
                ("patron_id", Uuid::new_v4().to_string()),
                ("notification_url", request.notification_url.clone()),
            ],
        )
    }

    async fn fetch(
        &self,
        url: &str,
        operation: Operation,
    ) -> Result<Option<LicenseStatusDocument>, CirculationError> {
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND && matches!(operation, Operation::Checkin) {
            return Ok(None);
        }
        if status.is_server_error() {
            return Err(CirculationError::RemoteIntegration(format!(
                "{url} answered {status}"
            )));
        }
        if !status.is_success() {
            return Err(operation.rejected(status, url));
        }
        let body = response.bytes().await.map_err(transport_error)?;
        LicenseStatusDocument::parse(&body).map(Some)
    }

    async fn fetch_document(
        &self,
        url: &str,
        operation: Operation,
    ) -> Result<LicenseStatusDocument, CirculationError> {
        self.fetch(url, operation)
            .await?
            .ok_or_else(|| operation.rejected(StatusCode::NOT_FOUND, url))
    }
}

#[async_trait]
impl LicenseStatusService for RemoteLicenseClient {
    #[instrument(skip(self))]
    async fn status(
        &self,
        external_identifier: &str,
    ) -> Result<LicenseStatusDocument, CirculationError> {
        self.fetch_document(external_identifier, Operation::Status).await
    }

    #[instrument(skip(self, request), fields(license = %request.license_id))]
    async fn checkout(&self, request: &CheckoutRequest) -> Result<LoanGrant, CirculationError> {
        let url = Self::checkout_url(request);
        let document = self.fetch_document(&url, Operation::Checkout).await?;
        let grant = document.loan_grant()?;
        debug!(loan = %grant.external_identifier, "license server granted loan");
        Ok(grant)
    }

    #[instrument(skip(self))]
    async fn checkin(&self, external_identifier: &str) -> Result<(), CirculationError> {
        let Some(document) = self.fetch(external_identifier, Operation::Checkin).await? else {
            debug!("license server no longer knows the loan; treating as returned");
            return Ok(());
        };
        if document.status.is_terminal() {
            debug!(status = ?document.status, "loan already over on the license server");
            return Ok(());
        }
        let Some(return_link) = document.link("return") else {
            warn!("status document has no return link; leaving the loan to expire");
            return Ok(());
        };

        let return_url = template::expand(&return_link.href, &[]);
        let response = self
            .client
            .put(&return_url)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if status.is_server_error() {
            return Err(CirculationError::RemoteIntegration(format!(
                "{return_url} answered {status}"
            )));
        }
        if !status.is_success() {
            return Err(Operation::Checkin.rejected(status, &return_url));
        }

        match self.fetch(external_identifier, Operation::Checkin).await {
            Ok(Some(document)) if document.status != LoanStatus::Returned => {
                warn!(status = ?document.status, "return not yet confirmed by the license server");
            }
            Ok(_) => {}
            Err(error) => warn!(%error, "could not confirm return"),
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fulfill(
        &self,
        external_identifier: &str,
        content_type: &str,
    ) -> Result<Fulfillment, CirculationError> {
        let document = self
            .fetch_document(external_identifier, Operation::Fulfill)
            .await?;
        if !document.status.is_live() {
            return Err(CirculationError::CannotFulfill(format!(
                "loan status is {:?}",
                document.status
            )));
        }
        let link = document
            .links
            .iter()
            .filter(|link| link.rel == "license" || link.rel == "manifest")
            .find(|link| link.media_type.as_deref() == Some(content_type))
            .ok_or(CirculationError::FormatNotAvailable)?;
        Ok(Fulfillment {
            content_link: link.href.clone(),
            content_type: content_type.to_string(),
            content_expires: document.potential_rights.end,
        })
    }
}
