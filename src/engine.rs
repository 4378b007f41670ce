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

//! The ledger engine.
//!
//! The [`Engine`] is the transactional store for the marketplace: profiles,
//! contracts, and jobs live in concurrent indexes, and every money movement
//! runs as an atomic multi-row transaction against them.
//!
//! # Transactions
//!
//! - **Payment** ([`Engine::pay_job`]): debits the client, credits the
//!   contractor, and marks the job paid, exactly once per job.
//! - **Deposit** ([`Engine::deposit`], in `deposit.rs`): credits a client's
//!   own balance, capped at 25% of its outstanding unpaid-jobs total.
//!
//! # Locking
//!
//! Rows are indexed by [`DashMap`] and individually mutex-guarded. Multi-row
//! transactions acquire locks in a fixed hierarchy:
//!
//! 1. profile balances, in ascending [`ProfileId`] order
//! 2. contract status
//! 3. job payment state
//!
//! Every validation happens under the locks and before any mutation, so a
//! failed transaction leaves no partial write and two concurrent payments of
//! the same job cannot both observe it unpaid.

use crate::base::{ContractId, JobId, ProfileId};
use crate::contract::{Contract, ContractStatus};
use crate::error::LedgerError;
use crate::job::{Job, PaymentState};
use crate::profile::{self, Profile, ProfileKind};
use crate::receipts::{Receipt, ReceiptLog};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Transactional store and payment engine for the marketplace ledger.
///
/// # Invariants
///
/// - Profile, contract, and job IDs are unique within their index.
/// - A contract references one existing client and one existing contractor.
/// - A job references an existing contract.
/// - Balances never go negative; a job is paid at most once.
pub struct Engine {
    /// Profiles indexed by ID.
    pub(crate) profiles: DashMap<ProfileId, Arc<Profile>>,
    /// Contracts indexed by ID.
    pub(crate) contracts: DashMap<ContractId, Arc<Contract>>,
    /// Jobs indexed by ID.
    pub(crate) jobs: DashMap<JobId, Arc<Job>>,
    /// Audit log of committed payments and deposits.
    pub(crate) receipts: ReceiptLog,
}

impl Engine {
    /// Creates a new engine with no rows.
    pub fn new() -> Self {
        Engine {
            profiles: DashMap::new(),
            contracts: DashMap::new(),
            jobs: DashMap::new(),
            receipts: ReceiptLog::new(),
        }
    }

    // === Provisioning ===

    /// Registers a profile.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::DuplicateId`] - the profile ID is already registered.
    pub fn add_profile(&self, profile: Profile) -> Result<Arc<Profile>, LedgerError> {
        // Entry API for atomic check-and-insert.
        match self.profiles.entry(profile.id()) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateId),
            Entry::Vacant(entry) => {
                let profile = Arc::new(profile);
                entry.insert(Arc::clone(&profile));
                Ok(profile)
            }
        }
    }

    /// Registers a contract between an existing client and contractor.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotFound`] - a referenced profile does not exist.
    /// - [`LedgerError::PartyMismatch`] - the referenced profiles are not a
    ///   client and a contractor, in that order.
    /// - [`LedgerError::DuplicateId`] - the contract ID is already registered.
    pub fn add_contract(&self, contract: Contract) -> Result<Arc<Contract>, LedgerError> {
        let client = self
            .profile(&contract.client_id())
            .ok_or(LedgerError::NotFound)?;
        let contractor = self
            .profile(&contract.contractor_id())
            .ok_or(LedgerError::NotFound)?;
        if client.kind() != ProfileKind::Client || contractor.kind() != ProfileKind::Contractor {
            return Err(LedgerError::PartyMismatch);
        }

        match self.contracts.entry(contract.id()) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateId),
            Entry::Vacant(entry) => {
                let contract = Arc::new(contract);
                entry.insert(Arc::clone(&contract));
                Ok(contract)
            }
        }
    }

    /// Registers a job under an existing contract. Jobs seeded via
    /// [`Job::paid`] enter the reporting history directly.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - the price is not positive.
    /// - [`LedgerError::NotFound`] - the contract does not exist.
    /// - [`LedgerError::DuplicateId`] - the job ID is already registered.
    pub fn add_job(&self, job: Job) -> Result<Arc<Job>, LedgerError> {
        if job.price() <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        if !self.contracts.contains_key(&job.contract_id()) {
            return Err(LedgerError::NotFound);
        }

        match self.jobs.entry(job.id()) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateId),
            Entry::Vacant(entry) => {
                let job = Arc::new(job);
                entry.insert(Arc::clone(&job));
                Ok(job)
            }
        }
    }

    /// Moves a contract to a new status, forward-only.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotFound`] - the contract does not exist.
    /// - [`LedgerError::InvalidTransition`] - the transition goes backward
    ///   or stands still.
    pub fn set_contract_status(
        &self,
        contract_id: ContractId,
        status: ContractStatus,
    ) -> Result<(), LedgerError> {
        let contract = self.contract(&contract_id).ok_or(LedgerError::NotFound)?;
        let mut current = contract.lock_status();
        if !current.can_transition_to(status) {
            return Err(LedgerError::InvalidTransition);
        }
        *current = status;
        Ok(())
    }

    // === Row access ===

    /// Resolves a profile by ID. This is the hook the access layer uses to
    /// turn an authenticated identity into a caller profile.
    pub fn profile(&self, id: &ProfileId) -> Option<Arc<Profile>> {
        self.profiles.get(id).map(|row| Arc::clone(row.value()))
    }

    /// All profiles, in ascending ID order.
    pub fn profiles(&self) -> Vec<Arc<Profile>> {
        let mut out: Vec<_> = self
            .profiles
            .iter()
            .map(|row| Arc::clone(row.value()))
            .collect();
        out.sort_by_key(|profile| profile.id());
        out
    }

    pub fn contract(&self, id: &ContractId) -> Option<Arc<Contract>> {
        self.contracts.get(id).map(|row| Arc::clone(row.value()))
    }

    pub fn job(&self, id: &JobId) -> Option<Arc<Job>> {
        self.jobs.get(id).map(|row| Arc::clone(row.value()))
    }

    /// Removes and returns all receipts in commit order.
    pub fn drain_receipts(&self) -> Vec<Receipt> {
        self.receipts.drain()
    }

    // === Caller-scoped lookups ===

    /// Fetches one contract, visible only to its parties.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotFound`] - absent, or the caller is neither party.
    pub fn get_contract(
        &self,
        caller: &Profile,
        contract_id: ContractId,
    ) -> Result<Arc<Contract>, LedgerError> {
        let contract = self.contract(&contract_id).ok_or(LedgerError::NotFound)?;
        if !contract.belongs_to(caller.id()) {
            return Err(LedgerError::NotFound);
        }
        Ok(contract)
    }

    /// The caller's non-terminated contracts, in ascending ID order. An
    /// empty listing is a legitimate result.
    pub fn list_contracts(&self, caller: &Profile) -> Vec<Arc<Contract>> {
        let mut out: Vec<_> = self
            .contracts
            .iter()
            .filter(|row| {
                row.belongs_to(caller.id()) && row.status() != ContractStatus::Terminated
            })
            .map(|row| Arc::clone(row.value()))
            .collect();
        out.sort_by_key(|contract| contract.id());
        out
    }

    /// The caller's unpaid jobs under in-progress contracts, in ascending
    /// ID order.
    pub fn list_unpaid_jobs(&self, caller: &Profile) -> Vec<Arc<Job>> {
        let mut out: Vec<_> = self
            .jobs
            .iter()
            .filter(|row| {
                if !row.is_unpaid() {
                    return false;
                }
                self.contract(&row.contract_id())
                    .is_some_and(|contract| {
                        contract.is_active() && contract.belongs_to(caller.id())
                    })
            })
            .map(|row| Arc::clone(row.value()))
            .collect();
        out.sort_by_key(|job| job.id());
        out
    }

    // === Payment transaction ===

    /// Pays a job on behalf of the calling client, stamping the current
    /// time as the payment date.
    pub fn pay_job(&self, caller: &Profile, job_id: JobId) -> Result<(), LedgerError> {
        self.pay_job_at(caller, job_id, Utc::now())
    }

    /// Pays a job with an explicit payment timestamp.
    ///
    /// The transaction locks the client and contractor balances (ascending
    /// profile-id order), then the contract status, then the job state.
    /// All checks run under those locks before any mutation, so at most one
    /// payment of a given job can ever commit, and a failure leaves every
    /// row untouched.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] - the caller is not a registered client.
    /// - [`LedgerError::InvalidJob`] - the job is missing or already paid,
    ///   its contract is not in progress, or the caller is not its client.
    /// - [`LedgerError::InsufficientFunds`] - the price exceeds the caller's
    ///   balance; no mutation occurs.
    /// - [`LedgerError::TransactionFailure`] - the job references a missing
    ///   contract or contractor row.
    pub fn pay_job_at(
        &self,
        caller: &Profile,
        job_id: JobId,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        if caller.kind() != ProfileKind::Client {
            return Err(LedgerError::Unauthorized);
        }
        let client = self
            .profile(&caller.id())
            .ok_or(LedgerError::Unauthorized)?;

        let job = self.job(&job_id).ok_or(LedgerError::InvalidJob)?;
        let contract = self.contract(&job.contract_id()).ok_or_else(|| {
            LedgerError::TransactionFailure(format!(
                "job {} references missing contract {}",
                job_id,
                job.contract_id()
            ))
        })?;
        if contract.client_id() != client.id() {
            return Err(LedgerError::InvalidJob);
        }
        let contractor = self.profile(&contract.contractor_id()).ok_or_else(|| {
            LedgerError::TransactionFailure(format!(
                "contract {} references missing contractor {}",
                contract.id(),
                contract.contractor_id()
            ))
        })?;

        // Balance locks in ascending profile-id order; the parties are of
        // different kinds, so the IDs are distinct.
        let (mut client_balance, mut contractor_balance) = if client.id() < contractor.id() {
            let client_balance = client.lock_balance();
            let contractor_balance = contractor.lock_balance();
            (client_balance, contractor_balance)
        } else {
            let contractor_balance = contractor.lock_balance();
            let client_balance = client.lock_balance();
            (client_balance, contractor_balance)
        };
        let status = contract.lock_status();
        let mut state = job.lock_state();

        if *status != ContractStatus::InProgress || !state.is_unpaid() {
            tracing::debug!(job = %job_id, client = %client.id(), "payment rejected: job not payable");
            return Err(LedgerError::InvalidJob);
        }

        let price = job.price();
        profile::debit(&mut client_balance, price)?;
        profile::credit(&mut contractor_balance, price);
        *state = PaymentState::Paid { at };

        self.receipts.push(Receipt::Payment {
            job: job_id,
            client: client.id(),
            contractor: contractor.id(),
            amount: price,
            at,
        });
        tracing::info!(
            job = %job_id,
            client = %client.id(),
            contractor = %contractor.id(),
            amount = %price,
            "job paid"
        );
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
