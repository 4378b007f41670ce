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

//! Audit log of committed money movements.
//!
//! The engine appends one receipt per committed payment or deposit. The log
//! is lock-free and FIFO, safe to append to while row locks are held.

use crate::base::{JobId, ProfileId};
use chrono::{DateTime, Utc};
use crossbeam::queue::SegQueue;
use rust_decimal::Decimal;
use serde::Serialize;

/// An immutable record of one committed movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Receipt {
    /// A job payment: client debited, contractor credited.
    Payment {
        job: JobId,
        client: ProfileId,
        contractor: ProfileId,
        amount: Decimal,
        at: DateTime<Utc>,
    },
    /// A client deposit into its own balance.
    Deposit {
        client: ProfileId,
        amount: Decimal,
        at: DateTime<Utc>,
    },
}

/// A thread-safe, FIFO receipt log.
#[derive(Debug)]
pub struct ReceiptLog {
    entries: SegQueue<Receipt>,
}

impl ReceiptLog {
    pub fn new() -> Self {
        Self {
            entries: SegQueue::new(),
        }
    }

    pub(crate) fn push(&self, receipt: Receipt) {
        self.entries.push(receipt);
    }

    /// Removes and returns all receipts in commit order.
    pub fn drain(&self) -> Vec<Receipt> {
        let mut out = Vec::with_capacity(self.entries.len());
        while let Some(receipt) = self.entries.pop() {
            out.push(receipt);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ReceiptLog {
    fn default() -> Self {
        Self::new()
    }
}
