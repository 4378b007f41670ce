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

//! Property-based tests for the marketplace ledger.
//!
//! These tests verify invariants that should hold for any sequence of
//! valid operations: money conservation, non-negative balances, the
//! deposit cap, and at-most-once payment.

use gigledger_rs::{
    Contract, ContractId, ContractStatus, DEPOSIT_CAP_RATIO, Engine, Job, JobId, LedgerError,
    Profile, ProfileId, ProfileKind,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

/// Generate a positive money amount (0.01 to 100,000.00).
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Generate a short list of job prices.
fn arb_prices() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(arb_amount(), 1..8)
}

// =============================================================================
// Fixtures
// =============================================================================

const CLIENT: ProfileId = ProfileId(1);
const CONTRACTOR: ProfileId = ProfileId(2);

/// Client 1 and contractor 2 joined by one in-progress contract carrying
/// the given unpaid jobs (job IDs start at 1).
fn engine_with_jobs(client_balance: Decimal, prices: &[Decimal]) -> Engine {
    let engine = Engine::new();
    engine
        .add_profile(
            Profile::new(CLIENT, ProfileKind::Client, "Harry", "Potter", "wizard")
                .with_balance(client_balance),
        )
        .unwrap();
    engine
        .add_profile(Profile::new(
            CONTRACTOR,
            ProfileKind::Contractor,
            "John",
            "Lenon",
            "musician",
        ))
        .unwrap();
    engine
        .add_contract(Contract::new(
            ContractId(1),
            CLIENT,
            CONTRACTOR,
            ContractStatus::InProgress,
        ))
        .unwrap();
    for (i, price) in prices.iter().enumerate() {
        engine
            .add_job(Job::new(JobId(i as u32 + 1), ContractId(1), *price))
            .unwrap();
    }
    engine
}

// =============================================================================
// Payment Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// A successful payment conserves money across the two profiles.
    #[test]
    fn payment_conserves_money(
        price in arb_amount(),
        headroom in arb_amount(),
    ) {
        let engine = engine_with_jobs(price + headroom, &[price]);
        let client = engine.profile(&CLIENT).unwrap();
        let contractor = engine.profile(&CONTRACTOR).unwrap();
        let total_before = client.balance() + contractor.balance();

        engine.pay_job(&client, JobId(1)).unwrap();

        prop_assert_eq!(client.balance() + contractor.balance(), total_before);
        prop_assert_eq!(contractor.balance(), price);
    }

    /// A job can be paid at most once; the rejection changes nothing.
    #[test]
    fn payment_is_at_most_once(
        price in arb_amount(),
    ) {
        let engine = engine_with_jobs(price * Decimal::from(3), &[price]);
        let client = engine.profile(&CLIENT).unwrap();

        engine.pay_job(&client, JobId(1)).unwrap();
        let balance_after_first = client.balance();

        let second = engine.pay_job(&client, JobId(1));
        prop_assert_eq!(second, Err(LedgerError::InvalidJob));
        prop_assert_eq!(client.balance(), balance_after_first);
        prop_assert_eq!(engine.profile(&CONTRACTOR).unwrap().balance(), price);
    }

    /// An underfunded payment mutates nothing.
    #[test]
    fn underfunded_payment_mutates_nothing(
        price in arb_amount(),
        shortfall in arb_amount(),
    ) {
        let balance = (price - shortfall).max(Decimal::ZERO);
        prop_assume!(balance < price);

        let engine = engine_with_jobs(balance, &[price]);
        let client = engine.profile(&CLIENT).unwrap();

        let result = engine.pay_job(&client, JobId(1));

        prop_assert_eq!(result, Err(LedgerError::InsufficientFunds));
        prop_assert_eq!(client.balance(), balance);
        prop_assert_eq!(engine.profile(&CONTRACTOR).unwrap().balance(), Decimal::ZERO);
        prop_assert!(engine.job(&JobId(1)).unwrap().is_unpaid());
    }

    /// Balances never go negative, whatever the payment order.
    #[test]
    fn balances_never_negative(
        prices in arb_prices(),
        balance in arb_amount(),
    ) {
        let engine = engine_with_jobs(balance, &prices);
        let client = engine.profile(&CLIENT).unwrap();

        for i in 0..prices.len() {
            let _ = engine.pay_job(&client, JobId(i as u32 + 1));
            prop_assert!(client.balance() >= Decimal::ZERO);
        }
        prop_assert!(engine.profile(&CONTRACTOR).unwrap().balance() >= Decimal::ZERO);
    }
}

// =============================================================================
// Deposit Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// A deposit is accepted exactly when it is within 25% of the
    /// outstanding unpaid-jobs total.
    #[test]
    fn deposit_respects_the_cap(
        prices in arb_prices(),
        amount in arb_amount(),
    ) {
        let engine = engine_with_jobs(Decimal::ZERO, &prices);
        let client = engine.profile(&CLIENT).unwrap();

        let outstanding: Decimal = prices.iter().copied().sum();
        let cap = outstanding * DEPOSIT_CAP_RATIO;

        let result = engine.deposit(&client, CLIENT, amount);

        if amount <= cap {
            prop_assert!(result.is_ok());
            prop_assert_eq!(client.balance(), amount);
        } else {
            prop_assert_eq!(result, Err(LedgerError::DepositCapExceeded { cap }));
            prop_assert_eq!(client.balance(), Decimal::ZERO);
        }
    }

    /// Paying a job shrinks the outstanding total, and with it the cap.
    #[test]
    fn cap_shrinks_as_jobs_are_paid(
        prices in prop::collection::vec(arb_amount(), 2..6),
    ) {
        let outstanding: Decimal = prices.iter().copied().sum();
        let engine = engine_with_jobs(outstanding, &prices);
        let client = engine.profile(&CLIENT).unwrap();

        engine.pay_job(&client, JobId(1)).unwrap();

        let remaining: Decimal = prices.iter().skip(1).copied().sum();
        let cap = remaining * DEPOSIT_CAP_RATIO;
        let over = cap + Decimal::new(1, 2);

        let result = engine.deposit(&client, CLIENT, over);
        prop_assert_eq!(result, Err(LedgerError::DepositCapExceeded { cap }));
    }

    /// System-wide conservation: total balance equals the opening total
    /// plus every accepted deposit, no matter which operations fail.
    #[test]
    fn totals_track_accepted_deposits(
        prices in arb_prices(),
        balance in arb_amount(),
        deposits in prop::collection::vec(arb_amount(), 0..5),
    ) {
        let engine = engine_with_jobs(balance, &prices);
        let client = engine.profile(&CLIENT).unwrap();
        let contractor = engine.profile(&CONTRACTOR).unwrap();

        let mut accepted = Decimal::ZERO;
        for (i, amount) in deposits.iter().enumerate() {
            if engine.deposit(&client, CLIENT, *amount).is_ok() {
                accepted += *amount;
            }
            // Interleave payment attempts, successful or not.
            let _ = engine.pay_job(&client, JobId(i as u32 + 1));
        }

        prop_assert_eq!(
            client.balance() + contractor.balance(),
            balance + accepted
        );
    }
}

// =============================================================================
// Reporting Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Best-clients rows are sorted by descending total and bounded by the
    /// limit.
    #[test]
    fn best_clients_sorted_and_bounded(
        prices in prop::collection::vec(arb_amount(), 1..6),
        limit in 1usize..6,
    ) {
        let engine = Engine::new();
        let paid_at = "2020-08-15T12:00:00Z".parse().unwrap();

        // One client-contractor pair per job, each under its own
        // terminated contract.
        engine
            .add_profile(Profile::new(
                ProfileId(100),
                ProfileKind::Contractor,
                "Contractor",
                "0",
                "programmer",
            ))
            .unwrap();
        for (i, price) in prices.iter().enumerate() {
            let id = i as u32 + 1;
            engine
                .add_profile(Profile::new(
                    ProfileId(id),
                    ProfileKind::Client,
                    "Client",
                    &format!("{id}"),
                    "n/a",
                ))
                .unwrap();
            engine
                .add_contract(Contract::new(
                    ContractId(id),
                    ProfileId(id),
                    ProfileId(100),
                    ContractStatus::Terminated,
                ))
                .unwrap();
            engine
                .add_job(Job::paid(JobId(id), ContractId(id), *price, paid_at))
                .unwrap();
        }

        let rows = engine
            .best_clients(
                "2020-08-01T00:00:00Z".parse().unwrap(),
                "2020-08-31T00:00:00Z".parse().unwrap(),
                Some(limit),
            )
            .unwrap();

        prop_assert!(rows.len() <= limit);
        prop_assert!(rows.windows(2).all(|pair| pair[0].paid >= pair[1].paid));

        // The top row really is the maximum.
        let max = prices.iter().copied().max().unwrap();
        prop_assert_eq!(rows[0].paid, max);
    }
}
