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

use chrono::{DateTime, Utc};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use gigledger_rs::{
    Contract, ContractId, ContractStatus, Engine, Job, JobId, LedgerError, Profile, ProfileId,
    ProfileKind,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

/// GigLedger - Replay marketplace ledger CSV files
///
/// Reads seed rows and operations from a CSV file and outputs final profile
/// balances to stdout. Supports profile/contract/job seeding, job payments,
/// and capped deposits.
#[derive(Parser, Debug)]
#[command(name = "gigledger-rs")]
#[command(about = "A marketplace ledger that replays operation CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with seed rows and operations
    ///
    /// Expected format: type,id,ref,party,amount,first,last,profession,status
    /// Example: cargo run -- ledger.csv > balances.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    // Logs go to stderr; stdout carries the balances CSV.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let engine = match process_ledger(BufReader::new(file)) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error processing ledger: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_profiles(&engine, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `type, id, ref, party, amount, first, last, profession, status`.
/// The meaning of `id`/`ref`/`party` depends on the row type:
///
/// | type | id | ref | party |
/// |------|----|-----|-------|
/// | client / contractor | profile | - | - |
/// | contract | contract | client | contractor |
/// | job | job | contract | - |
/// | pay | job | caller | - |
/// | deposit | caller | target (defaults to caller) | - |
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "type")]
    row_type: String,
    id: u32,
    #[serde(rename = "ref", deserialize_with = "csv::invalid_option")]
    reference: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    party: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
    first: String,
    last: String,
    profession: String,
    status: String,
}

/// One replayable ledger operation.
#[derive(Debug)]
enum LedgerOp {
    AddProfile(Profile),
    AddContract(Contract),
    AddJob {
        id: JobId,
        contract: ContractId,
        price: Option<Decimal>,
        paid_at: Option<DateTime<Utc>>,
    },
    Pay {
        caller: ProfileId,
        job: JobId,
    },
    Deposit {
        caller: ProfileId,
        target: ProfileId,
        amount: Option<Decimal>,
    },
}

impl CsvRecord {
    /// Converts a CSV record to a ledger operation.
    ///
    /// Returns `None` for unknown row types or missing required references.
    /// Amounts stay optional here; the apply step rejects a missing amount
    /// with [`LedgerError::InvalidAmount`] so the rejection is visible in
    /// the logs instead of silently shaping the row.
    fn into_op(self) -> Option<LedgerOp> {
        match self.row_type.to_lowercase().as_str() {
            kind @ ("client" | "contractor") => {
                let kind = if kind == "client" {
                    ProfileKind::Client
                } else {
                    ProfileKind::Contractor
                };
                let mut profile = Profile::new(
                    ProfileId(self.id),
                    kind,
                    self.first,
                    self.last,
                    self.profession,
                );
                if let Some(balance) = self.amount {
                    profile = profile.with_balance(balance);
                }
                Some(LedgerOp::AddProfile(profile))
            }
            "contract" => {
                let client = ProfileId(self.reference?);
                let contractor = ProfileId(self.party?);
                let status = match self.status.as_str() {
                    "new" => ContractStatus::New,
                    "" | "in_progress" => ContractStatus::InProgress,
                    "terminated" => ContractStatus::Terminated,
                    _ => return None,
                };
                Some(LedgerOp::AddContract(Contract::new(
                    ContractId(self.id),
                    client,
                    contractor,
                    status,
                )))
            }
            "job" => {
                let contract = ContractId(self.reference?);
                // A non-empty status column is an RFC 3339 payment date,
                // seeding the job as already-paid history.
                let paid_at = if self.status.is_empty() {
                    None
                } else {
                    Some(
                        DateTime::parse_from_rfc3339(&self.status)
                            .ok()?
                            .with_timezone(&Utc),
                    )
                };
                Some(LedgerOp::AddJob {
                    id: JobId(self.id),
                    contract,
                    price: self.amount,
                    paid_at,
                })
            }
            "pay" => Some(LedgerOp::Pay {
                caller: ProfileId(self.reference?),
                job: JobId(self.id),
            }),
            "deposit" => Some(LedgerOp::Deposit {
                caller: ProfileId(self.id),
                target: self.reference.map(ProfileId).unwrap_or(ProfileId(self.id)),
                amount: self.amount,
            }),
            _ => None,
        }
    }
}

/// Applies one operation against the engine.
fn apply(engine: &Engine, op: LedgerOp) -> Result<(), LedgerError> {
    match op {
        LedgerOp::AddProfile(profile) => engine.add_profile(profile).map(drop),
        LedgerOp::AddContract(contract) => engine.add_contract(contract).map(drop),
        LedgerOp::AddJob {
            id,
            contract,
            price,
            paid_at,
        } => {
            let price = price.ok_or(LedgerError::InvalidAmount)?;
            let job = match paid_at {
                Some(at) => Job::paid(id, contract, price, at),
                None => Job::new(id, contract, price),
            };
            engine.add_job(job).map(drop)
        }
        LedgerOp::Pay { caller, job } => {
            let caller = engine.profile(&caller).ok_or(LedgerError::Unauthorized)?;
            engine.pay_job(&caller, job)
        }
        LedgerOp::Deposit {
            caller,
            target,
            amount,
        } => {
            let amount = amount.ok_or(LedgerError::InvalidAmount)?;
            let caller = engine.profile(&caller).ok_or(LedgerError::Unauthorized)?;
            engine.deposit(&caller, target, amount)
        }
    }
}

/// Processes ledger rows from a CSV reader.
///
/// Streaming parse; malformed rows and rejected operations are skipped and
/// logged at debug level, so one bad row never aborts the replay.
///
/// # CSV Format
///
/// Expected columns: `type, id, ref, party, amount, first, last, profession, status`
///
/// # Example
///
/// ```csv
/// type,id,ref,party,amount,first,last,profession,status
/// client,1,,,1150.00,Harry,Potter,wizard,
/// contractor,5,,,64.00,John,Lenon,musician,
/// contract,1,1,5,,,,,in_progress
/// job,2,1,,201.00,,,,
/// deposit,1,1,,50.00,,,,
/// pay,2,1,,,,,,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn process_ledger<R: Read>(reader: R) -> Result<Engine, csv::Error> {
    let engine = Engine::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All) // Handle whitespace in fields like " client "
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => {
                let Some(op) = record.into_op() else {
                    tracing::debug!("skipping invalid ledger row");
                    continue;
                };

                if let Err(e) = apply(&engine, op) {
                    tracing::debug!(error = %e, "skipping rejected operation");
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed row");
                continue;
            }
        }
    }

    Ok(engine)
}

/// Writes final profile states to a CSV writer.
///
/// Outputs all profiles in ascending ID order with balances rounded to
/// 2 decimal places.
///
/// # CSV Format
///
/// Columns: `id, kind, first_name, last_name, profession, balance`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_profiles<W: Write>(engine: &Engine, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for profile in engine.profiles() {
        wtr.serialize(profile.as_ref())?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    #[test]
    fn replay_seed_and_payment() {
        let csv = "type,id,ref,party,amount,first,last,profession,status\n\
                   client,1,,,1150.00,Harry,Potter,wizard,\n\
                   contractor,5,,,64.00,John,Lenon,musician,\n\
                   contract,1,1,5,,,,,in_progress\n\
                   job,2,1,,201.00,,,,\n\
                   pay,2,1,,,,,,\n";

        let engine = process_ledger(Cursor::new(csv)).unwrap();

        assert_eq!(engine.profile(&ProfileId(1)).unwrap().balance(), dec!(949.00));
        assert_eq!(engine.profile(&ProfileId(5)).unwrap().balance(), dec!(265.00));
        assert!(!engine.job(&JobId(2)).unwrap().is_unpaid());
    }

    #[test]
    fn replay_deposit_within_cap() {
        // Outstanding is 201.00, so the cap is 50.25.
        let csv = "type,id,ref,party,amount,first,last,profession,status\n\
                   client,1,,,100.00,Harry,Potter,wizard,\n\
                   contractor,5,,,0.00,John,Lenon,musician,\n\
                   contract,1,1,5,,,,,in_progress\n\
                   job,2,1,,201.00,,,,\n\
                   deposit,1,1,,50.00,,,,\n";

        let engine = process_ledger(Cursor::new(csv)).unwrap();

        assert_eq!(engine.profile(&ProfileId(1)).unwrap().balance(), dec!(150.00));
    }

    #[test]
    fn replay_skips_deposit_over_cap() {
        let csv = "type,id,ref,party,amount,first,last,profession,status\n\
                   client,1,,,100.00,Harry,Potter,wizard,\n\
                   contractor,5,,,0.00,John,Lenon,musician,\n\
                   contract,1,1,5,,,,,in_progress\n\
                   job,2,1,,201.00,,,,\n\
                   deposit,1,1,,51.00,,,,\n";

        let engine = process_ledger(Cursor::new(csv)).unwrap();

        // Rejected deposit leaves the balance untouched.
        assert_eq!(engine.profile(&ProfileId(1)).unwrap().balance(), dec!(100.00));
    }

    #[test]
    fn replay_seeds_paid_history() {
        let csv = "type,id,ref,party,amount,first,last,profession,status\n\
                   client,1,,,0.00,Harry,Potter,wizard,\n\
                   contractor,5,,,0.00,John,Lenon,musician,\n\
                   contract,1,1,5,,,,,terminated\n\
                   job,2,1,,21.11,,,,2020-08-15T19:11:26Z\n";

        let engine = process_ledger(Cursor::new(csv)).unwrap();

        let job = engine.job(&JobId(2)).unwrap();
        assert!(!job.is_unpaid());
        assert!(job.payment_date().is_some());
    }

    #[test]
    fn replay_with_whitespace() {
        let csv = "type,id,ref,party,amount,first,last,profession,status\n \
                   client , 1 ,,, 100.00 , Harry , Potter , wizard ,\n";

        let engine = process_ledger(Cursor::new(csv)).unwrap();

        let profile = engine.profile(&ProfileId(1)).unwrap();
        assert_eq!(profile.balance(), dec!(100.00));
        assert_eq!(profile.first_name(), "Harry");
    }

    #[test]
    fn skip_malformed_rows() {
        let csv = "type,id,ref,party,amount,first,last,profession,status\n\
                   client,1,,,100.00,Harry,Potter,wizard,\n\
                   bogus,row,data,,,,,,\n\
                   contractor,2,,,50.00,John,Lenon,musician,\n";

        let engine = process_ledger(Cursor::new(csv)).unwrap();

        assert!(engine.profile(&ProfileId(1)).is_some());
        assert!(engine.profile(&ProfileId(2)).is_some());
    }

    #[test]
    fn skip_deposit_with_unparsable_amount() {
        let csv = "type,id,ref,party,amount,first,last,profession,status\n\
                   client,1,,,100.00,Harry,Potter,wizard,\n\
                   deposit,1,1,,not-a-number,,,,\n";

        let engine = process_ledger(Cursor::new(csv)).unwrap();

        assert_eq!(engine.profile(&ProfileId(1)).unwrap().balance(), dec!(100.00));
    }

    #[test]
    fn write_profiles_to_csv() {
        let csv_input = "type,id,ref,party,amount,first,last,profession,status\n\
                         client,1,,,100.50,Harry,Potter,wizard,\n\
                         contractor,2,,,200.25,John,Lenon,musician,\n";
        let engine = process_ledger(Cursor::new(csv_input)).unwrap();

        let mut output = Vec::new();
        write_profiles(&engine, &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("id,kind,first_name,last_name,profession,balance"));
        assert!(output_str.contains("1,client,Harry,Potter,wizard,100.50"));
        assert!(output_str.contains("2,contractor,John,Lenon,musician,200.25"));
    }
}
