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

//! Earnings reports.
//!
//! Both aggregations consider only settled work: jobs paid within the
//! inclusive `[start, end]` window whose contract is terminated. A job
//! under a terminated contract can no longer be paid, so its payment state
//! is frozen and the iteration observes a consistent snapshot without
//! taking transaction locks.

use crate::base::ProfileId;
use crate::contract::{Contract, ContractStatus};
use crate::engine::Engine;
use crate::error::LedgerError;
use crate::job::Job;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Rows returned by [`Engine::best_clients`] when no explicit limit is
/// given. A configuration default, not a hidden literal.
pub const DEFAULT_BEST_CLIENTS_LIMIT: usize = 2;

/// One row of the best-clients report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestClient {
    pub id: ProfileId,
    /// First and last name, space-joined.
    pub full_name: String,
    /// Total price of the client's settled jobs in the window.
    pub paid: Decimal,
}

impl Engine {
    /// The profession that earned the most over the window.
    ///
    /// Ties break to the lexicographically smallest profession name.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NoDataInRange`] - no settled job in the window.
    pub fn best_profession(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<String, LedgerError> {
        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
        self.for_each_settled_job(start, end, |contract, job| {
            let Some(contractor) = self.profile(&contract.contractor_id()) else {
                return;
            };
            *totals
                .entry(contractor.profession().to_owned())
                .or_insert(Decimal::ZERO) += job.price();
        });

        // Ascending-name iteration plus a strictly-greater comparison keeps
        // the lexicographically smallest name on ties.
        let mut best: Option<(&str, Decimal)> = None;
        for (profession, total) in &totals {
            if best.is_none_or(|(_, best_total)| *total > best_total) {
                best = Some((profession.as_str(), *total));
            }
        }
        best.map(|(profession, _)| profession.to_owned())
            .ok_or(LedgerError::NoDataInRange)
    }

    /// The clients that paid the most over the window, descending by total.
    ///
    /// Ties break to the ascending client ID. `limit` defaults to
    /// [`DEFAULT_BEST_CLIENTS_LIMIT`].
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NoDataInRange`] - no settled job in the window.
    pub fn best_clients(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<BestClient>, LedgerError> {
        let mut totals: BTreeMap<ProfileId, Decimal> = BTreeMap::new();
        self.for_each_settled_job(start, end, |contract, job| {
            *totals.entry(contract.client_id()).or_insert(Decimal::ZERO) += job.price();
        });
        if totals.is_empty() {
            return Err(LedgerError::NoDataInRange);
        }

        // BTreeMap yields ascending IDs; the stable sort on descending
        // totals keeps that order among equal sums.
        let mut rows: Vec<BestClient> = totals
            .into_iter()
            .filter_map(|(id, paid)| {
                let client = self.profile(&id)?;
                Some(BestClient {
                    id,
                    full_name: client.full_name(),
                    paid,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.paid.cmp(&a.paid));
        rows.truncate(limit.unwrap_or(DEFAULT_BEST_CLIENTS_LIMIT));
        Ok(rows)
    }

    /// Visits every job paid within `[start, end]` (inclusive) whose
    /// contract is terminated.
    fn for_each_settled_job(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        mut visit: impl FnMut(&Contract, &Job),
    ) {
        for job in self.jobs.iter() {
            let Some(paid_at) = job.payment_date() else {
                continue;
            };
            if paid_at < start || paid_at > end {
                continue;
            }
            let Some(contract) = self.contract(&job.contract_id()) else {
                continue;
            };
            if contract.status() != ContractStatus::Terminated {
                continue;
            }
            visit(&contract, &job);
        }
    }
}
