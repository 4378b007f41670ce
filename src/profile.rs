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

//! Profile accounts.
//!
//! A profile is a party in the marketplace: a client (pays for jobs) or a
//! contractor (is paid for jobs). Identity fields are immutable; only the
//! balance changes, and only under its row lock via [`credit`]/[`debit`].
//!
//! # Example
//!
//! ```
//! use rust_decimal::Decimal;
//! use gigledger_rs::{Profile, ProfileId, ProfileKind};
//!
//! let profile = Profile::new(ProfileId(1), ProfileKind::Client, "Harry", "Potter", "wizard");
//! assert_eq!(profile.balance(), Decimal::ZERO);
//! ```

use crate::base::ProfileId;
use crate::error::LedgerError;
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

/// The role a profile plays in a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    /// Pays for jobs and deposits into its own balance.
    Client,
    /// Is credited when its jobs are paid.
    Contractor,
}

/// A marketplace account.
///
/// The balance is the only mutable field and is guarded by a row-level
/// mutex; everything else is fixed at registration.
#[derive(Debug)]
pub struct Profile {
    id: ProfileId,
    kind: ProfileKind,
    first_name: String,
    last_name: String,
    profession: String,
    balance: Mutex<Decimal>,
}

impl Profile {
    const BALANCE_PRECISION: u32 = 2;

    pub fn new(
        id: ProfileId,
        kind: ProfileKind,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        profession: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind,
            first_name: first_name.into(),
            last_name: last_name.into(),
            profession: profession.into(),
            balance: Mutex::new(Decimal::ZERO),
        }
    }

    /// Sets an opening balance (account provisioning happens outside the
    /// ledger operations, so this does not go through [`credit`]).
    pub fn with_balance(self, balance: Decimal) -> Self {
        *self.balance.lock() = balance;
        self
    }

    pub fn id(&self) -> ProfileId {
        self.id
    }

    pub fn kind(&self) -> ProfileKind {
        self.kind
    }

    pub fn is_client(&self) -> bool {
        self.kind == ProfileKind::Client
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn profession(&self) -> &str {
        &self.profession
    }

    /// Returns `"first last"`, space-joined.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn balance(&self) -> Decimal {
        *self.balance.lock()
    }

    /// Takes the row lock on the balance. Callers must respect the engine's
    /// lock hierarchy: balances are acquired in ascending profile-id order,
    /// before any contract or job lock.
    pub(crate) fn lock_balance(&self) -> MutexGuard<'_, Decimal> {
        self.balance.lock()
    }
}

/// Increases a locked balance.
pub(crate) fn credit(balance: &mut Decimal, amount: Decimal) {
    *balance += amount;
    assert_non_negative(*balance);
}

/// Decreases a locked balance, refusing to overdraw.
pub(crate) fn debit(balance: &mut Decimal, amount: Decimal) -> Result<(), LedgerError> {
    if *balance < amount {
        return Err(LedgerError::InsufficientFunds);
    }
    *balance -= amount;
    assert_non_negative(*balance);
    Ok(())
}

fn assert_non_negative(balance: Decimal) {
    debug_assert!(
        balance >= Decimal::ZERO,
        "Invariant violated: balance went negative: {}",
        balance
    );
}

impl Serialize for Profile {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Profile", 6)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("first_name", &self.first_name)?;
        state.serialize_field("last_name", &self.last_name)?;
        state.serialize_field("profession", &self.profession)?;
        state.serialize_field(
            "balance",
            &self.balance().round_dp(Profile::BALANCE_PRECISION),
        )?;
        state.end()
    }
}
