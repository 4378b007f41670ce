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

//! Error types for ledger operations.

use rust_decimal::Decimal;
use thiserror::Error;

/// Ledger operation errors.
///
/// Validation errors (`Unauthorized`, `InvalidAmount`, `NegativeAmount`) are
/// detected before any row lock is taken. Business-rule errors (`InvalidJob`,
/// `InsufficientFunds`, `DepositCapExceeded`) are detected inside the lock
/// scope, before any mutation, so a failed operation never leaves a partial
/// write behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Caller lacks the role or ownership required for the operation
    #[error("caller is not authorized for this operation")]
    Unauthorized,

    /// Row is absent or not visible to the caller
    #[error("not found")]
    NotFound,

    /// Job is missing, already paid, or its contract is not payable by the caller
    #[error("job is not payable")]
    InvalidJob,

    /// Payment would exceed the client's balance
    #[error("insufficient available funds")]
    InsufficientFunds,

    /// Amount did not parse as a number, or a job price is not positive
    #[error("invalid amount (must be a positive number)")]
    InvalidAmount,

    /// Deposit amount is negative
    #[error("deposit amount must not be negative")]
    NegativeAmount,

    /// Deposit exceeds 25% of the caller's outstanding unpaid-jobs total
    #[error("deposit exceeds the allowed cap of {cap}")]
    DepositCapExceeded {
        /// The computed cap at transaction time.
        cap: Decimal,
    },

    /// Reporting window matched no paid job
    #[error("no data in the requested range")]
    NoDataInRange,

    /// Row ID is already registered
    #[error("duplicate row ID")]
    DuplicateId,

    /// Contract parties are not one client and one contractor
    #[error("contract parties must be one client and one contractor")]
    PartyMismatch,

    /// Contract status transitions are forward-only
    #[error("contract status can only move forward")]
    InvalidTransition,

    /// Store-level fault (e.g. a dangling row reference); nothing was written
    #[error("transaction failed: {0}")]
    TransactionFailure(String),
}
