use wealthbook::{Ledger, LedgerSnapshot, MonthlyRecord, AllocationTargets, Wallet,
    analysis::{self, DeviationStatus, Severity},
    backend::{self, LedgerStore, JsonStore},
    engine, ingest,
    evolution::EvolutionSeries,
    ledger::UpsertOutcome,
    record::{Amount, CryptoHoldings}};

use std::{fs, path::PathBuf};
use anyhow::Context;
use colored::Colorize;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(version, about, propagate_version = true)]
struct Cli {
   /// Path to ledger file to operate on
   #[clap(value_parser)]
    path: PathBuf,

   /// Log what the ledger does
   #[clap(short, long, global = true)]
   verbose: bool,

   /// Action to perform
   #[clap(subcommand)]
   action: Subcommands,
}

#[derive(Debug, Subcommand)]
enum Subcommands {
    /// Totals, savings and returns for a month (the selected one by default)
    Summary {
        #[clap(short, long, value_parser)]
        month: Option<String>
    },
    /// Wealth per category for a month (the selected one by default)
    Distribution {
        #[clap(short, long, value_parser)]
        month: Option<String>
    },
    /// Show allocation targets
    Targets,
    /// Replace the allocation targets
    SetTargets(SetTargets),
    /// Select the month most views refer to
    Select {
        #[clap(value_parser)]
        month: String
    },
    /// Add a month, or replace the one with the same label
    AddMonth(AddMonth),
    /// Compare the selected month against the targets
    Deviations,
    /// Wealth and income movement between two months
    Compare {
        #[clap(value_parser)]
        from: String,
        #[clap(value_parser)]
        to: String
    },
    /// Total wealth per month, oldest first
    Evolution {
        /// Only the last N months
        #[clap(short, long, value_parser)]
        window: Option<usize>
    },
    /// Write the history as CSV
    Export {
        /// Only the last N months
        #[clap(short, long, value_parser)]
        window: Option<usize>,
        /// Output file, stdout when omitted
        #[clap(short, long, value_parser)]
        output: Option<PathBuf>
    },
    /// Merge months and targets from a JSON document
    Import {
        #[clap(value_parser)]
        document: PathBuf
    },
    /// List month labels that only differ by case
    Collisions
}

fn colored_pct(value: f64) -> colored::ColoredString {
    let text = format!("{:.2}%", value);
    if value > 0.0 {
        text.green()
    } else if value < 0.0 {
        text.bright_red()
    } else {
        text.normal()
    }
}

fn print_summary(snapshot: &LedgerSnapshot, month: &str) {
    let summary = engine::month_summary(snapshot, month);
    println!("{}", summary.month.bold());
    println!("Total: {:.2}", summary.total);
    println!("Income: {:.2}", summary.income);
    println!("Expenses: {:.2}", summary.expenses);
    println!("Savings: {:.2} ({})", summary.net_savings, colored_pct(summary.savings_rate));
    println!("Change: {:.2}", summary.change);
    println!("Return: {}", colored_pct(summary.return_pct));
    println!("Annualized return: {}", colored_pct(engine::annualized_return(snapshot)));
}

fn print_distribution(snapshot: &LedgerSnapshot, month: &str) {
    let distribution = engine::distribution(snapshot, month);
    let percentages = distribution.percentages();
    for (category, amount) in distribution.amounts().iter() {
        println!("{}: {:.2} ({:.1}%)", category, amount, percentages.get(category));
    }
    for (wallet, balance) in distribution.crypto_by_wallet.iter() {
        println!("  {}: {:.2}", wallet, balance);
    }
}

fn print_targets(targets: &AllocationTargets) {
    for (category, target) in targets.iter() {
        println!("{}: {:.1}%", category, target);
    }
    let sum = targets.sum();
    if sum != 100.0 {
        println!("{}", format!("Targets add up to {:.1}%", sum).yellow());
    }
}

fn print_deviations(snapshot: &LedgerSnapshot) {
    let report = analysis::selected_deviations(snapshot);
    for deviation in &report.deviations {
        let color = match deviation.severity {
            Severity::Low => colored::ColoredString::green,
            Severity::Moderate => colored::ColoredString::yellow,
            Severity::High => colored::ColoredString::bright_red,
        };
        let status = match deviation.status {
            DeviationStatus::OnTarget => deviation.status.to_string(),
            _ => format!("{} ({:+.1}%)", deviation.status, deviation.deviation),
        };
        println!("{}: {:.1}% of {:.1}% ({:.1}% reached) {}", deviation.category, deviation.actual,
            deviation.target, deviation.compliance, color(status.normal()));
    }
    println!("{} on target, {} over, {} under",
        report.on_target, report.over_target, report.under_target);
    for recommendation in analysis::recommendations(&report) {
        println!("- {}", recommendation);
    }
}

fn print_comparison(snapshot: &LedgerSnapshot, from: &str, to: &str) -> anyhow::Result<()> {
    let comparison = engine::compare_months(snapshot, from, to)
        .with_context(|| format!("both {} and {} must be in the ledger", from, to))?;
    println!("{} -> {}", comparison.from.bold(), comparison.to.bold());
    println!("Wealth: {:+.2} ({})", comparison.total_difference, colored_pct(comparison.change_pct));
    println!("Income: {:+.2}", comparison.income_difference);
    Ok(())
}

#[derive(Args, Debug)]
struct SetTargets {
    #[clap(long, value_parser)]
    cash: f64,

    #[clap(long, value_parser)]
    interest_bearing: f64,

    #[clap(long, value_parser)]
    crypto: f64,

    #[clap(long, value_parser)]
    index_funds: f64
}

impl SetTargets {
    fn set_targets(&self, ledger: &mut Ledger) {
        ledger.set_targets(AllocationTargets::new(self.cash, self.interest_bearing, self.crypto, self.index_funds));
    }
}

fn parse_wallet_balance(arg: &str) -> Result<(Wallet, Amount), String> {
    let (key, balance) = arg.split_once('=')
        .ok_or_else(|| format!("expected WALLET=BALANCE, got {}", arg))?;
    let wallet = Wallet::from_key(key)
        .ok_or_else(|| format!("unknown wallet {}", key))?;
    let balance = balance.trim().parse::<Amount>()
        .map_err(|err| format!("bad balance {}: {}", balance, err))?;
    Ok((wallet, balance))
}

#[derive(Args, Debug)]
struct AddMonth {
    /// Month label, e.g. 2024-07 or "Jul 2024"
    #[clap(value_parser)]
    month: String,

    #[clap(long, value_parser, default_value_t = 0.0)]
    income: Amount,

    #[clap(long, value_parser, default_value_t = 0.0)]
    expenses: Amount,

    #[clap(long, value_parser, default_value_t = 0.0)]
    cash: Amount,

    #[clap(long, value_parser, default_value_t = 0.0)]
    brokerage_a: Amount,

    #[clap(long, value_parser, default_value_t = 0.0)]
    brokerage_b: Amount,

    #[clap(long, value_parser, default_value_t = 0.0)]
    index_funds: Amount,

    #[clap(long, value_parser, default_value_t = 0.0)]
    other_cash: Amount,

    /// Wallet balance as WALLET=BALANCE, repeatable
    #[clap(long = "crypto", value_parser = parse_wallet_balance)]
    crypto: Vec<(Wallet, Amount)>,

    /// Also select the month
    #[clap(short, long)]
    select: bool
}

impl AddMonth {
    fn record(&self) -> MonthlyRecord {
        let mut crypto_holdings = CryptoHoldings::new();
        for (wallet, balance) in &self.crypto {
            crypto_holdings.set(*wallet, *balance);
        }
        MonthlyRecord {
            income: self.income,
            expenses: self.expenses,
            cash_balance: self.cash,
            brokerage_balance_a: self.brokerage_a,
            brokerage_balance_b: self.brokerage_b,
            index_funds_balance: self.index_funds,
            other_cash_balance: self.other_cash,
            crypto_holdings,
            ..MonthlyRecord::new(&self.month)
        }
    }

    fn add_month(&self, ledger: &mut Ledger) {
        match ledger.upsert_month(self.record()) {
            UpsertOutcome::Inserted => println!("Added {}", self.month),
            UpsertOutcome::Replaced => println!("Replaced {}", self.month),
            UpsertOutcome::Collided { existing } => println!("{}",
                format!("Added {}, but it clashes with {} when case is ignored", self.month, existing).yellow()),
        }
        if self.select {
            ledger.select_month(&self.month);
        }
    }
}

fn import(ledger: &mut Ledger, document: &PathBuf) -> anyhow::Result<()> {
    let text = fs::read_to_string(document)
        .with_context(|| format!("failed to read {}", document.display()))?;
    let imported = ingest::parse_str(&text)
        .with_context(|| format!("failed to import {}", document.display()))?;

    let months = imported.history.len();
    for record in imported.history {
        ledger.upsert_month(record);
    }
    ledger.set_targets(imported.targets);
    println!("Imported {} months", months);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    wealthbook::logging::init(if args.verbose { "debug" } else { "warn" });

    let store = JsonStore::new(&args.path);
    let mut ledger = store.read()
        .with_context(|| format!("failed to load {}", args.path.display()))?;
    let version = ledger.version();

    match &args.action {
        Subcommands::Summary { month } => {
            let snapshot = ledger.snapshot();
            print_summary(snapshot, month.as_deref().unwrap_or(&snapshot.selected_month));
        },
        Subcommands::Distribution { month } => {
            let snapshot = ledger.snapshot();
            print_distribution(snapshot, month.as_deref().unwrap_or(&snapshot.selected_month));
        },
        Subcommands::Targets => {
            print_targets(ledger.get_targets());
        },
        Subcommands::SetTargets(set_targets) => {
            set_targets.set_targets(&mut ledger);
        },
        Subcommands::Select { month } => {
            if !ledger.select_month(month) {
                anyhow::bail!("month label must not be empty");
            }
        },
        Subcommands::AddMonth(add_month) => {
            add_month.add_month(&mut ledger);
        },
        Subcommands::Deviations => {
            print_deviations(ledger.snapshot());
        },
        Subcommands::Compare { from, to } => {
            print_comparison(ledger.snapshot(), from, to)?;
        },
        Subcommands::Evolution { window } => {
            for point in &EvolutionSeries::window(ledger.snapshot(), *window) {
                println!("{}: {:.2}", point.month, point.total);
            }
        },
        Subcommands::Export { window, output } => {
            let series = EvolutionSeries::window(ledger.snapshot(), *window);
            match output {
                Some(path) => {
                    let file = fs::File::create(path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    backend::write_csv(&series, file)?;
                },
                None => backend::write_csv(&series, std::io::stdout().lock())?,
            }
        },
        Subcommands::Import { document } => {
            import(&mut ledger, document)?;
        },
        Subcommands::Collisions => {
            for group in ledger.label_collisions() {
                println!("{}", group.join(", "));
            }
        }
    }

    if ledger.version() != version {
        store.save(&ledger)
            .with_context(|| format!("failed to save {}", args.path.display()))?;
    }
    Ok(())
}
