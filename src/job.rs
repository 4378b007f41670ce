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

//! Jobs.
//!
//! A job is a unit of billable work under exactly one contract. Payment
//! state is a two-variant machine, [`Unpaid`] → [`Paid`] (with timestamp),
//! transitioned exactly once by the engine. "Paid = false" is not
//! representable.
//!
//! [`Unpaid`]: PaymentState::Unpaid
//! [`Paid`]: PaymentState::Paid

use crate::base::{ContractId, JobId};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

/// Whether a job has been paid, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PaymentState {
    Unpaid,
    Paid { at: DateTime<Utc> },
}

impl PaymentState {
    pub fn is_unpaid(&self) -> bool {
        matches!(self, PaymentState::Unpaid)
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        match self {
            PaymentState::Unpaid => None,
            PaymentState::Paid { at } => Some(*at),
        }
    }
}

/// A billable unit of work, exclusively owned by its contract.
///
/// Contract reference and price are immutable; only the payment state
/// changes, under its row lock.
#[derive(Debug)]
pub struct Job {
    id: JobId,
    contract_id: ContractId,
    price: Decimal,
    state: Mutex<PaymentState>,
}

impl Job {
    pub fn new(id: JobId, contract_id: ContractId, price: Decimal) -> Self {
        Self {
            id,
            contract_id,
            price,
            state: Mutex::new(PaymentState::Unpaid),
        }
    }

    /// A job seeded as already paid (historical backfill for reporting).
    pub fn paid(id: JobId, contract_id: ContractId, price: Decimal, at: DateTime<Utc>) -> Self {
        Self {
            id,
            contract_id,
            price,
            state: Mutex::new(PaymentState::Paid { at }),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn contract_id(&self) -> ContractId {
        self.contract_id
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn state(&self) -> PaymentState {
        *self.state.lock()
    }

    pub fn is_unpaid(&self) -> bool {
        self.state().is_unpaid()
    }

    pub fn payment_date(&self) -> Option<DateTime<Utc>> {
        self.state().paid_at()
    }

    /// Takes the row lock on the payment state. Acquired last in the lock
    /// hierarchy, after profile balances and contract status.
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, PaymentState> {
        self.state.lock()
    }
}

impl Serialize for Job {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Job", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("contract_id", &self.contract_id)?;
        state.serialize_field("price", &self.price)?;
        state.serialize_field("payment", &self.state())?;
        state.end()
    }
}
