//! Mortgage System CLI
//!
//! Command-line interface for projecting and comparing house purchase scenarios

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use mortgage_system::comparison::ComparisonReport;
use mortgage_system::report::{write_schedule_csv_file, Resolution};
use mortgage_system::scenario::DEFAULT_SCENARIO_PATH;
use mortgage_system::{compare, compute, ScenarioParameters, ScenarioStore, ScenarioSummary};

/// House purchase financing and rent-vs-buy projections
#[derive(Parser)]
#[command(name = "mortgage", version, about)]
struct Cli {
    /// Scenario file
    #[arg(long, global = true, default_value = DEFAULT_SCENARIO_PATH)]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project one scenario and print its summary
    Project {
        /// Start from a saved scenario instead of the defaults
        #[arg(long)]
        scenario: Option<String>,

        #[command(flatten)]
        overrides: ScenarioArgs,

        /// Write the schedule to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = ScheduleResolution::Monthly)]
        resolution: ScheduleResolution,
    },
    /// Save a scenario under a name (defaults overridden by flags)
    Save {
        name: String,

        #[command(flatten)]
        overrides: ScenarioArgs,
    },
    /// Delete a saved scenario
    Delete { name: String },
    /// List saved scenarios
    List,
    /// Compare saved scenarios side by side
    Compare {
        /// Scenarios to compare, in display order
        names: Vec<String>,

        /// Compare every saved scenario
        #[arg(long, conflicts_with = "names")]
        all: bool,
    },
}

/// CSV row granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScheduleResolution {
    /// One row per month
    Monthly,
    /// One row per loan year
    Yearly,
}

impl From<ScheduleResolution> for Resolution {
    fn from(resolution: ScheduleResolution) -> Self {
        match resolution {
            ScheduleResolution::Monthly => Resolution::Monthly,
            ScheduleResolution::Yearly => Resolution::Yearly,
        }
    }
}

/// Scenario fields that can be overridden from the command line
#[derive(Args, Debug)]
struct ScenarioArgs {
    /// Raw house price
    #[arg(long)]
    house_price: Option<f64>,
    /// Annual mortgage rate (%)
    #[arg(long)]
    rate: Option<f64>,
    /// Yearly extra repayment (% of house price)
    #[arg(long)]
    yearly_repayment: Option<f64>,
    /// Monthly ancillary cost (Nebenkosten)
    #[arg(long)]
    ancillary: Option<f64>,
    /// General inflation (%)
    #[arg(long)]
    inflation: Option<f64>,
    /// House price inflation (%)
    #[arg(long)]
    house_inflation: Option<f64>,
    /// Loan period in years
    #[arg(long)]
    years: Option<u32>,
    #[arg(long)]
    down_payment: Option<f64>,
    /// Broker commission (%)
    #[arg(long)]
    broker: Option<f64>,
    /// Notary fee (%)
    #[arg(long)]
    notary: Option<f64>,
    /// Land registry fee (%)
    #[arg(long)]
    land_registry: Option<f64>,
    /// Land transfer tax (%)
    #[arg(long)]
    land_transfer_tax: Option<f64>,
    /// Monthly rent for the comparison
    #[arg(long)]
    rent: Option<f64>,
}

impl ScenarioArgs {
    fn apply(&self, mut params: ScenarioParameters) -> ScenarioParameters {
        fn set<T: Copy>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        set(&mut params.house_price, self.house_price);
        set(&mut params.mortgage_rate_pct, self.rate);
        set(&mut params.yearly_extra_repayment_pct, self.yearly_repayment);
        set(&mut params.monthly_ancillary_cost, self.ancillary);
        set(&mut params.general_inflation_pct, self.inflation);
        set(&mut params.house_inflation_pct, self.house_inflation);
        set(&mut params.loan_period_years, self.years);
        set(&mut params.down_payment, self.down_payment);
        set(&mut params.fees.broker_pct, self.broker);
        set(&mut params.fees.notary_pct, self.notary);
        set(&mut params.fees.land_registry_pct, self.land_registry);
        set(&mut params.fees.land_transfer_tax_pct, self.land_transfer_tax);
        set(&mut params.monthly_rent, self.rent);
        params
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut store = ScenarioStore::load(&cli.store)
        .with_context(|| format!("Failed to load scenarios from {}", cli.store.display()))?;

    match cli.command {
        Commands::Project { scenario, overrides, csv, resolution } => {
            let base = match scenario {
                Some(name) => match store.get(&name) {
                    Some(record) => record.parameters.clone(),
                    None => bail!("Scenario '{}' not found", name),
                },
                None => ScenarioParameters::default(),
            };
            let params = overrides.apply(base);
            let projection = compute(&params).context("Projection failed")?;

            print_summary(&params, &projection.summary);
            match projection.schedule.break_even_month() {
                Some(month) => println!("  Break-even: month {} (year {})", month, (month + 11) / 12),
                None => println!("  Break-even: n/a"),
            }

            if let Some(path) = csv {
                write_schedule_csv_file(&path, &projection.schedule, resolution.into())
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("\nSchedule written to: {}", path.display());
            }
        }
        Commands::Save { name, overrides } => {
            let params = overrides.apply(ScenarioParameters::default());
            params.validate().context("Refusing to save invalid scenario")?;
            store.insert(&name, params)?;
            store.save(&cli.store)?;
            println!("Scenario '{}' saved", name.trim());
        }
        Commands::Delete { name } => {
            store.remove(&name)?;
            store.save(&cli.store)?;
            println!("Scenario '{}' deleted", name);
        }
        Commands::List => {
            if store.is_empty() {
                println!("No saved scenarios found");
            }
            for name in store.names() {
                let saved = store
                    .get(name)
                    .and_then(|record| record.timestamp)
                    .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!("{:<30} {}", name, saved);
            }
        }
        Commands::Compare { names, all } => {
            let selected: Vec<String> = if all {
                store.names().into_iter().map(String::from).collect()
            } else {
                names
            };
            let report = compare(&store.named_parameters(), &selected).context("Comparison failed")?;
            print_comparison(&report);
        }
    }

    Ok(())
}

fn print_summary(params: &ScenarioParameters, summary: &ScenarioSummary) {
    println!("Scenario Summary");
    println!("================");
    println!("  House Cost:            ${:>14.2}", params.house_price);
    println!("  Down Payment:          ${:>14.2}", params.down_payment);
    println!("  Loan Amount:           ${:>14.2}", summary.loan_amount);
    println!("  Mortgage Rate:          {:>14.2}%", params.mortgage_rate_pct);
    println!("  Loan Period:            {:>14} years", params.loan_period_years);
    println!("  Buying Cost:           ${:>14.2}", summary.misc_costs);
    println!("  Upfront Costs:         ${:>14.2}", summary.upfront_costs);
    println!(
        "  Monthly Repayment:     ${:>14.2} [{:.2} incl. ancillary]",
        summary.monthly_repayment, summary.monthly_outlay
    );
    println!("  Yearly Repayment:      ${:>14.2}", summary.yearly_extra_repayment_amount);
    println!("  Total Interest:        ${:>14.2}", summary.total_interest);
    println!(
        "  Total Extra Cost:      ${:>14.2} ({:.1}% of house value)",
        summary.extra_cost, summary.extra_cost_pct
    );
    println!("  Effective House Cost:  ${:>14.2}", summary.effective_house_cost);
}

fn print_comparison(report: &ComparisonReport) {
    println!(
        "{:<20} {:>12} {:>12} {:>7} {:>6} {:>12} {:>12} {:>14} {:>8}",
        "Scenario", "House", "Loan", "Rate", "Years", "Monthly", "Interest", "Effective", "Extra%"
    );
    println!("{}", "-".repeat(112));

    for entry in report {
        let s = &entry.summary;
        println!(
            "{:<20} {:>12.2} {:>12.2} {:>6.2}% {:>6} {:>12.2} {:>12.2} {:>14.2} {:>7.1}%",
            entry.name,
            entry.house_price,
            s.loan_amount,
            entry.mortgage_rate_pct,
            entry.loan_period_years,
            s.monthly_repayment,
            s.total_interest,
            s.effective_house_cost,
            s.extra_cost_pct,
        );
    }

    if let Some(cheapest) = report.cheapest() {
        println!("\nLowest effective cost: {}", cheapest.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_flag_maps_to_export_resolution() {
        let cli = Cli::try_parse_from(["mortgage", "project", "--csv", "out.csv", "--resolution", "yearly"]).unwrap();
        match cli.command {
            Commands::Project { resolution, .. } => assert_eq!(Resolution::from(resolution), Resolution::Yearly),
            _ => panic!("expected project command"),
        }

        let cli = Cli::try_parse_from(["mortgage", "project"]).unwrap();
        match cli.command {
            Commands::Project { resolution, .. } => assert_eq!(Resolution::from(resolution), Resolution::Monthly),
            _ => panic!("expected project command"),
        }
    }

    #[test]
    fn test_overrides_apply_on_top_of_base() {
        let cli = Cli::try_parse_from(["mortgage", "save", "cheap", "--rate", "2.5", "--years", "20"]).unwrap();
        match cli.command {
            Commands::Save { name, overrides } => {
                let params = overrides.apply(ScenarioParameters::default());
                assert_eq!(name, "cheap");
                assert_eq!(params.mortgage_rate_pct, 2.5);
                assert_eq!(params.loan_period_years, 20);
                assert_eq!(params.house_price, ScenarioParameters::default().house_price);
            }
            _ => panic!("expected save command"),
        }
    }
}
