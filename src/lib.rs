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

//! # GigLedger
//!
//! This library provides a freelance-marketplace ledger: clients and
//! contractors linked by contracts, contracts containing billable jobs, and
//! a payment engine that moves funds between accounts exactly once per job.
//!
//! ## Core Components
//!
//! - [`Engine`]: Transactional store and payment processor
//! - [`Profile`]: Client or contractor account with a guarded balance
//! - [`Contract`]: Agreement binding one client and one contractor
//! - [`Job`]: Billable unit of work, paid at most once
//! - [`LedgerError`]: Error types for rejected and failed operations
//!
//! ## Example
//!
//! ```
//! use gigledger_rs::{
//!     Contract, ContractId, ContractStatus, Engine, Job, JobId, Profile, ProfileId, ProfileKind,
//! };
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new();
//!
//! engine
//!     .add_profile(
//!         Profile::new(ProfileId(1), ProfileKind::Client, "Harry", "Potter", "wizard")
//!             .with_balance(dec!(150.00)),
//!     )
//!     .unwrap();
//! engine
//!     .add_profile(Profile::new(
//!         ProfileId(2),
//!         ProfileKind::Contractor,
//!         "John",
//!         "Lenon",
//!         "musician",
//!     ))
//!     .unwrap();
//! engine
//!     .add_contract(Contract::new(
//!         ContractId(1),
//!         ProfileId(1),
//!         ProfileId(2),
//!         ContractStatus::InProgress,
//!     ))
//!     .unwrap();
//! engine
//!     .add_job(Job::new(JobId(1), ContractId(1), dec!(42.00)))
//!     .unwrap();
//!
//! // The access layer resolves the caller; the engine moves the money.
//! let caller = engine.profile(&ProfileId(1)).unwrap();
//! engine.pay_job(&caller, JobId(1)).unwrap();
//!
//! assert_eq!(caller.balance(), dec!(108.00));
//! assert_eq!(engine.profile(&ProfileId(2)).unwrap().balance(), dec!(42.00));
//! ```
//!
//! ## Thread Safety
//!
//! Rows are individually locked and transactions acquire locks in a fixed
//! hierarchy, so operations on different jobs and profiles run in parallel
//! while payments of the same job serialize to exactly one commit.

pub mod base;
pub mod contract;
mod deposit;
mod engine;
pub mod error;
pub mod job;
pub mod profile;
mod receipts;
mod reports;

pub use base::{ContractId, JobId, ProfileId};
pub use contract::{Contract, ContractStatus};
pub use deposit::DEPOSIT_CAP_RATIO;
pub use engine::Engine;
pub use error::LedgerError;
pub use job::{Job, PaymentState};
pub use profile::{Profile, ProfileKind};
pub use receipts::{Receipt, ReceiptLog};
pub use reports::{BestClient, DEFAULT_BEST_CLIENTS_LIMIT};
