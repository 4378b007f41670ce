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

//! Contracts.
//!
//! A contract binds exactly one client and one contractor. Its status
//! follows a forward-only state machine:
//! - [`New`] → [`InProgress`] (work starts)
//! - [`InProgress`] → [`Terminated`] (work ends)
//!
//! [`New`]: ContractStatus::New
//! [`InProgress`]: ContractStatus::InProgress
//! [`Terminated`]: ContractStatus::Terminated

use crate::base::{ContractId, ProfileId};
use parking_lot::{Mutex, MutexGuard};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    New,
    InProgress,
    Terminated,
}

impl ContractStatus {
    /// Forward-only transitions; skipping `InProgress` is allowed, going
    /// back or standing still is not.
    pub fn can_transition_to(self, next: ContractStatus) -> bool {
        matches!(
            (self, next),
            (ContractStatus::New, ContractStatus::InProgress)
                | (ContractStatus::New, ContractStatus::Terminated)
                | (ContractStatus::InProgress, ContractStatus::Terminated)
        )
    }
}

/// An agreement between one client and one contractor.
///
/// Party references are immutable; only the status changes, under its row
/// lock. A contract references its profiles for lookup but does not own
/// them.
#[derive(Debug)]
pub struct Contract {
    id: ContractId,
    client_id: ProfileId,
    contractor_id: ProfileId,
    status: Mutex<ContractStatus>,
}

impl Contract {
    pub fn new(
        id: ContractId,
        client_id: ProfileId,
        contractor_id: ProfileId,
        status: ContractStatus,
    ) -> Self {
        Self {
            id,
            client_id,
            contractor_id,
            status: Mutex::new(status),
        }
    }

    pub fn id(&self) -> ContractId {
        self.id
    }

    pub fn client_id(&self) -> ProfileId {
        self.client_id
    }

    pub fn contractor_id(&self) -> ProfileId {
        self.contractor_id
    }

    pub fn status(&self) -> ContractStatus {
        *self.status.lock()
    }

    /// True if the profile is either party of this contract.
    pub fn belongs_to(&self, profile_id: ProfileId) -> bool {
        self.client_id == profile_id || self.contractor_id == profile_id
    }

    pub fn is_active(&self) -> bool {
        self.status() == ContractStatus::InProgress
    }

    /// Takes the row lock on the status. Acquired after profile balance
    /// locks and before job state locks.
    pub(crate) fn lock_status(&self) -> MutexGuard<'_, ContractStatus> {
        self.status.lock()
    }
}

impl PartialEq for Contract {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.client_id == other.client_id
            && self.contractor_id == other.contractor_id
            && self.status() == other.status()
    }
}

impl Serialize for Contract {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Contract", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("client_id", &self.client_id)?;
        state.serialize_field("contractor_id", &self.contractor_id)?;
        state.serialize_field("status", &self.status())?;
        state.end()
    }
}
