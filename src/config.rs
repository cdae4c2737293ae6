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

//! Engine configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! `CIRCULATION_`-prefixed environment variables (`__` separates nested keys).
//!
//! ```yaml
//! reservation_period_days: 3
//! loan_duration_days: 21
//! request_timeout: 30s
//! reap_interval: 1h
//! notification_url: https://library.example.org/loans/notify
//! collections:
//!   - name: main
//!     protocol: odl2
//! ```

use crate::provider::Protocol;
use chrono::TimeDelta;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// A collection of titles served through one circulation protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    pub protocol: Protocol,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CirculationConfig {
    /// Days a promoted hold stays reserved before it lapses.
    pub reservation_period_days: u32,
    /// Days a new loan runs for.
    pub loan_duration_days: u32,
    /// Upper bound on a single license server round trip.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// How often the hold reaper sweeps.
    #[serde(with = "humantime_serde")]
    pub reap_interval: Duration,
    /// Callback the license server notifies on loan status changes.
    pub notification_url: String,
    pub collections: Vec<CollectionConfig>,
}

impl Default for CirculationConfig {
    fn default() -> Self {
        Self {
            reservation_period_days: 3,
            loan_duration_days: 21,
            request_timeout: Duration::from_secs(30),
            reap_interval: Duration::from_secs(60 * 60),
            notification_url: String::new(),
            collections: Vec::new(),
        }
    }
}

impl CirculationConfig {
    pub fn reservation_period(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.reservation_period_days))
    }

    pub fn loan_duration(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.loan_duration_days))
    }

    /// Loads configuration from the given YAML file (if any) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path).extract().map_err(Box::new)
    }

    pub fn figment(path: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        let figment = match path {
            Some(path) => figment.merge(Yaml::file(path)),
            None => figment,
        };
        figment.merge(Env::prefixed("CIRCULATION_").split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = CirculationConfig::load(None).map_err(|e| *e)?;
            assert_eq!(config, CirculationConfig::default());
            assert_eq!(config.reservation_period(), TimeDelta::days(3));
            assert_eq!(config.loan_duration(), TimeDelta::days(21));
            Ok(())
        });
    }

    #[test]
    fn yaml_file_with_collections() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "circulation.yaml",
                r#"
reservation_period_days: 2
request_timeout: 5s
notification_url: https://library.example.org/notify
collections:
  - name: main
    protocol: odl
  - name: consortium
    protocol: odl2
"#,
            )?;

            let config = CirculationConfig::load(Some(Path::new("circulation.yaml")))
                .map_err(|e| *e)?;

            assert_eq!(config.reservation_period_days, 2);
            assert_eq!(config.loan_duration_days, 21); // default
            assert_eq!(config.request_timeout, Duration::from_secs(5));
            assert_eq!(config.collections.len(), 2);
            assert_eq!(config.collections[1].protocol, Protocol::Odl2);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("circulation.yaml", "loan_duration_days: 14\n")?;
            jail.set_env("CIRCULATION_LOAN_DURATION_DAYS", "7");
            jail.set_env("CIRCULATION_REAP_INTERVAL", "15m");

            let config = CirculationConfig::load(Some(Path::new("circulation.yaml")))
                .map_err(|e| *e)?;

            assert_eq!(config.loan_duration_days, 7);
            assert_eq!(config.reap_interval, Duration::from_secs(15 * 60));
            Ok(())
        });
    }
}
