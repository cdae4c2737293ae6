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

use chrono::{DateTime, Utc};
use circulation_engine::{
    CirculationConfig, CirculationFacade, License, LicenseId, PatronId, PoolId,
    RemoteLicenseClient, SystemClock,
};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Circulation Engine - Replay circulation events against a license server
///
/// Loads license inventory from a CSV file, replays checkout, checkin, hold,
/// release and fulfill events in order, and writes each pool's counters to
/// stdout.
#[derive(Parser, Debug)]
#[command(name = "circulation-engine")]
#[command(about = "Replays circulation event CSVs against a license status service", long_about = None)]
struct Args {
    /// Path to CSV file with events
    ///
    /// Expected format: op,patron,pool,format
    #[arg(value_name = "FILE")]
    events: PathBuf,

    /// Path to CSV file with licenses
    ///
    /// Expected format: pool,license,checkout_url,status_url,concurrent,remaining,expires
    #[arg(long, value_name = "FILE")]
    licenses: PathBuf,

    /// YAML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the CSV report.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = match CirculationConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    let inventory = match File::open(&args.licenses)
        .map_err(csv::Error::from)
        .and_then(|file| read_licenses(BufReader::new(file)))
    {
        Ok(inventory) => inventory,
        Err(e) => {
            eprintln!("Error reading licenses '{}': {}", args.licenses.display(), e);
            process::exit(1);
        }
    };

    let client = match RemoteLicenseClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error creating license server client: {}", e);
            process::exit(1);
        }
    };
    let facade = CirculationFacade::new(&config, Arc::new(client), Arc::new(SystemClock));
    for (pool, licenses) in inventory {
        facade.register_pool(pool, licenses);
    }

    let file = match File::open(&args.events) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.events.display(), e);
            process::exit(1);
        }
    };
    if let Err(e) = replay_events(&facade, BufReader::new(file)).await {
        eprintln!("Error processing events: {}", e);
        process::exit(1);
    }

    if let Err(e) = write_pools(&facade, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw license CSV record.
#[derive(Debug, Deserialize)]
struct LicenseRecord {
    pool: u64,
    license: String,
    checkout_url: String,
    status_url: String,
    concurrent: u32,
    #[serde(deserialize_with = "csv::invalid_option")]
    remaining: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    expires: Option<DateTime<Utc>>,
}

/// Reads license inventory grouped by pool.
///
/// Empty `remaining` means unlimited checkouts; empty `expires` means the
/// license never expires.
fn read_licenses<R: Read>(reader: R) -> Result<BTreeMap<PoolId, Vec<License>>, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let mut inventory: BTreeMap<PoolId, Vec<License>> = BTreeMap::new();
    for record in rdr.deserialize::<LicenseRecord>() {
        let record = record?;
        inventory
            .entry(PoolId(record.pool))
            .or_default()
            .push(License {
                id: LicenseId::new(record.license),
                checkout_url: record.checkout_url,
                status_url: record.status_url,
                expires: record.expires,
                concurrent_checkouts: record.concurrent,
                remaining_checkouts: record.remaining,
            });
    }
    Ok(inventory)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Checkout { patron: PatronId, pool: PoolId },
    Checkin { patron: PatronId, pool: PoolId },
    Hold { patron: PatronId, pool: PoolId },
    Release { patron: PatronId, pool: PoolId },
    Fulfill { patron: PatronId, pool: PoolId, format: String },
}

/// Raw event CSV record.
///
/// Fields: `op, patron, pool, format`
#[derive(Debug, Deserialize)]
struct EventRecord {
    op: String,
    patron: u64,
    pool: u64,
    #[serde(default)]
    format: Option<String>,
}

impl EventRecord {
    /// Returns `None` for unknown operations or a fulfill without a format.
    fn into_event(self) -> Option<Event> {
        let patron = PatronId(self.patron);
        let pool = PoolId(self.pool);
        match self.op.to_lowercase().as_str() {
            "checkout" => Some(Event::Checkout { patron, pool }),
            "checkin" => Some(Event::Checkin { patron, pool }),
            "hold" => Some(Event::Hold { patron, pool }),
            "release" => Some(Event::Release { patron, pool }),
            "fulfill" => {
                let format = self.format.filter(|f| !f.is_empty())?;
                Some(Event::Fulfill {
                    patron,
                    pool,
                    format,
                })
            }
            _ => None,
        }
    }
}

/// Replays events in file order. Malformed rows and rejected operations are
/// logged and skipped.
async fn replay_events<R: Read>(facade: &CirculationFacade, reader: R) -> Result<(), csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<EventRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed row: {}", e);
                continue;
            }
        };
        let Some(event) = record.into_event() else {
            warn!("Skipping invalid event record");
            continue;
        };

        let outcome = match &event {
            Event::Checkout { patron, pool } => facade.checkout(*patron, *pool).await.map(|_| ()),
            Event::Checkin { patron, pool } => facade.checkin(*patron, *pool).await.map(|_| ()),
            Event::Hold { patron, pool } => facade.place_hold(*patron, *pool).await.map(|_| ()),
            Event::Release { patron, pool } => {
                facade.release_hold(*patron, *pool).await.map(|_| ())
            }
            Event::Fulfill {
                patron,
                pool,
                format,
            } => facade
                .fulfill(*patron, *pool, format)
                .await
                .map(|fulfillment| debug!(link = %fulfillment.content_link, "fulfilled")),
        };
        if let Err(e) = outcome {
            warn!(?event, "Skipping event: {}", e);
        }
    }

    Ok(())
}

/// Writes every pool's counters as CSV.
///
/// Columns: `pool, owned, available, reserved, holds`
fn write_pools<W: Write>(facade: &CirculationFacade, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for pool in facade.pools() {
        wtr.serialize(&*pool)?;
    }
    wtr.flush()?;
    Ok(())
}
