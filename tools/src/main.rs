//! ledger-runner: headless front end for the SHG loan ledger.
//!
//! Usage:
//!   ledger-runner --db ledger.db --as-of 2025-07-01
//!   ledger-runner --db ledger.db --ipc-mode < commands.jsonl

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shg_ledger_core::{
    clock::{LedgerClock, SystemClock},
    config::LedgerConfig,
    loan::{LoanCategory, LoanTerms},
    report::{OverdueLoan, PortfolioSummary},
    store::LedgerStore,
    LedgerError, LoanLedger,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    RegisterMember {
        name: String,
        #[serde(default)]
        phone: Option<String>,
        #[serde(default)]
        join_date: Option<NaiveDate>,
    },
    OpenLoan {
        member_id: String,
        category: String,
        principal: Decimal,
        interest_rate: Decimal,
        start_date: NaiveDate,
        due_date: NaiveDate,
    },
    IssueLoan {
        member_id: String,
        category: String,
        principal: Decimal,
        #[serde(default)]
        start_date: Option<NaiveDate>,
    },
    RecordRepayment {
        loan_id: String,
        amount: Decimal,
        #[serde(default)]
        date: Option<NaiveDate>,
    },
    Balance {
        loan_id: String,
        #[serde(default)]
        as_of: Option<NaiveDate>,
    },
    Overdue {
        #[serde(default)]
        as_of: Option<NaiveDate>,
    },
    Summary {
        #[serde(default)]
        as_of: Option<NaiveDate>,
    },
    InterestByYear {
        #[serde(default)]
        as_of: Option<NaiveDate>,
    },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");
    let as_of = parse_arg(&args, "--as-of", SystemClock.today());

    let config = match LedgerConfig::load(data_dir) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("{e}; falling back to built-in loan products");
            LedgerConfig::default_test()
        }
    };

    let store = LedgerStore::open(db)?;
    store.migrate()?;
    let ledger = LoanLedger::new(store, config, SystemClock);

    if ipc_mode {
        run_ipc_loop(&ledger)?;
    } else {
        println!("SHG loan ledger: ledger-runner");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!("  as_of:     {as_of}");
        println!();
        print_summary(&ledger, as_of)?;
    }

    Ok(())
}

fn run_ipc_loop(ledger: &LoanLedger) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        // Ledger errors go back to the caller; they never end the loop.
        let response = match handle_command(ledger, cmd) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Command rejected: {e}");
                serde_json::json!({ "error": e.to_string(), "kind": error_kind(&e) })
            }
        };
        writeln!(stdout, "{}", response)?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(ledger: &LoanLedger, cmd: IpcCommand) -> Result<serde_json::Value, LedgerError> {
    let today = ledger.today();
    let value = match cmd {
        IpcCommand::RegisterMember { name, phone, join_date } => {
            let member = ledger.register_member(&name, phone.as_deref(), join_date.unwrap_or(today))?;
            serde_json::to_value(member)?
        }
        IpcCommand::OpenLoan {
            member_id,
            category,
            principal,
            interest_rate,
            start_date,
            due_date,
        } => {
            let loan = ledger.open_loan(LoanTerms {
                member_id,
                category: category.parse::<LoanCategory>()?,
                principal,
                interest_rate,
                start_date,
                due_date,
            })?;
            serde_json::to_value(loan)?
        }
        IpcCommand::IssueLoan {
            member_id,
            category,
            principal,
            start_date,
        } => {
            let category = category.parse::<LoanCategory>()?;
            let loan = ledger.issue_loan(&member_id, category, principal, start_date.unwrap_or(today))?;
            serde_json::to_value(loan)?
        }
        IpcCommand::RecordRepayment { loan_id, amount, date } => {
            let repayment = ledger.record_repayment(&loan_id, amount, date.unwrap_or(today))?;
            let loan = ledger.get_loan(&loan_id)?;
            let balance = ledger.current_balance(&loan_id, today)?;
            serde_json::json!({
                "repayment": repayment,
                "status": loan.status,
                "balance": balance,
            })
        }
        IpcCommand::Balance { loan_id, as_of } => {
            serde_json::to_value(ledger.balance_breakdown(&loan_id, as_of.unwrap_or(today))?)?
        }
        IpcCommand::Overdue { as_of } => {
            serde_json::to_value(ledger.overdue_loans(as_of.unwrap_or(today))?)?
        }
        IpcCommand::Summary { as_of } => {
            serde_json::to_value(ledger.portfolio_summary(as_of.unwrap_or(today))?)?
        }
        IpcCommand::InterestByYear { as_of } => {
            serde_json::to_value(ledger.interest_by_financial_year(as_of.unwrap_or(today))?)?
        }
        IpcCommand::Quit => serde_json::Value::Null,
    };
    Ok(value)
}

fn error_kind(e: &LedgerError) -> &'static str {
    if e.is_validation() {
        "validation"
    } else if e.is_invalid_state() {
        "invalid_state"
    } else {
        match e {
            LedgerError::LoanNotFound { .. } => "not_found",
            _ => "internal",
        }
    }
}

fn print_summary(ledger: &LoanLedger, as_of: NaiveDate) -> Result<()> {
    let PortfolioSummary {
        active_loans,
        completed_loans,
        overdue_loans,
        principal_issued,
        interest_accrued,
        total_repaid,
        outstanding,
        ..
    } = ledger.portfolio_summary(as_of)?;

    println!("=== PORTFOLIO SUMMARY ===");
    println!("  active loans:     {active_loans}");
    println!("  completed loans:  {completed_loans}");
    println!("  overdue loans:    {overdue_loans}");
    println!("  principal issued: KSh {principal_issued:.2}");
    println!("  interest accrued: KSh {interest_accrued:.2}");
    println!("  total repaid:     KSh {total_repaid:.2}");
    println!("  outstanding:      KSh {outstanding:.2}");

    println!();
    println!("=== OVERDUE LOANS ===");
    let overdue: Vec<OverdueLoan> = ledger.overdue_loans(as_of)?;
    if overdue.is_empty() {
        println!("  (none)");
    } else {
        for o in &overdue {
            println!(
                "  {} | {} | due {} ({} days) | KSh {:.2}",
                o.member_name, o.category, o.due_date, o.days_overdue, o.balance
            );
        }
    }

    println!();
    println!("=== PRINCIPAL BY FINANCIAL YEAR ===");
    for (year, total) in ledger.principal_issued_by_financial_year()? {
        println!("  {year}: KSh {total:.2}");
    }
    Ok(())
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
