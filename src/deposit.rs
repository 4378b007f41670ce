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

//! Deposit guard.
//!
//! A client may deposit into its own balance, but never more than
//! [`DEPOSIT_CAP_RATIO`] of its outstanding total: the summed price of its
//! unpaid jobs under in-progress contracts. A client with no outstanding
//! work has a cap of zero, so every positive deposit is rejected; that is
//! the policy, not an edge case to bypass.

use crate::base::ProfileId;
use crate::engine::Engine;
use crate::error::LedgerError;
use crate::profile::{self, Profile, ProfileKind};
use crate::receipts::Receipt;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fraction of the outstanding unpaid-jobs total a client may deposit in
/// one operation.
pub const DEPOSIT_CAP_RATIO: Decimal = dec!(0.25);

impl Engine {
    /// Deposits into the calling client's own balance, subject to the cap.
    ///
    /// The caller's balance lock is held from the outstanding-total
    /// computation through the credit. Every payment that could change the
    /// caller's outstanding total debits the same balance and therefore
    /// needs the same lock, so the cap is checked against the true total at
    /// commit time.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] - the caller is not a registered
    ///   client, or `target` is not the caller's own account.
    /// - [`LedgerError::NegativeAmount`] - `amount` is negative.
    /// - [`LedgerError::DepositCapExceeded`] - `amount` exceeds 25% of the
    ///   outstanding total; the computed cap is carried in the error.
    pub fn deposit(
        &self,
        caller: &Profile,
        target: ProfileId,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if caller.kind() != ProfileKind::Client || target != caller.id() {
            return Err(LedgerError::Unauthorized);
        }
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }
        let client = self
            .profile(&caller.id())
            .ok_or(LedgerError::Unauthorized)?;

        let mut balance = client.lock_balance();
        let outstanding = self.outstanding_total(client.id());
        let cap = outstanding * DEPOSIT_CAP_RATIO;
        if amount > cap {
            tracing::debug!(client = %client.id(), %amount, %cap, "deposit rejected by cap");
            return Err(LedgerError::DepositCapExceeded { cap });
        }

        profile::credit(&mut balance, amount);
        self.receipts.push(Receipt::Deposit {
            client: client.id(),
            amount,
            at: Utc::now(),
        });
        tracing::info!(client = %client.id(), %amount, "deposit committed");
        Ok(())
    }

    /// Summed price of the client's unpaid jobs under in-progress
    /// contracts.
    fn outstanding_total(&self, client_id: ProfileId) -> Decimal {
        self.jobs
            .iter()
            .filter(|job| job.is_unpaid())
            .filter(|job| {
                self.contract(&job.contract_id())
                    .is_some_and(|contract| {
                        contract.client_id() == client_id && contract.is_active()
                    })
            })
            .map(|job| job.price())
            .sum()
    }
}
