//! CRE Returns CLI
//!
//! Command-line interface for evaluating tenant, financing and exit-plan outcomes

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cre_returns::assumptions::DEFAULT_ASSUMPTIONS_PATH;
use cre_returns::scenario::write_grid_csv;
use cre_returns::tenant::{builtin_roster, find_profile, load_roster, roster_mismatches};
use cre_returns::{
    Assumptions, EngineConfig, Financing, GridSpec, IrrSolver, Outcome, OutcomeRequest, ReturnMetrics,
    ScenarioRunner, TenantProfile,
};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cre-returns", version, about = "Investor returns for a single-tenant commercial property")]
struct Cli {
    /// Deal assumptions JSON; omitted sections keep the reference deal values
    #[arg(long, global = true)]
    assumptions: Option<PathBuf>,

    /// Tenant roster CSV; the built-in roster is used otherwise
    #[arg(long, global = true)]
    roster: Option<PathBuf>,

    /// IRR root finder
    #[arg(long, global = true, value_enum, default_value_t = IrrSolver::StepHalving)]
    solver: IrrSolver,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List tenants with their published benchmark returns
    Tenants,

    /// Evaluate a single outcome
    Evaluate {
        #[arg(long)]
        tenant: String,

        #[arg(long, value_enum, default_value_t = Financing::Unleveraged)]
        financing: Financing,

        /// Years after acquisition the building is sold
        #[arg(long)]
        sale_year: u32,

        /// Years after acquisition the tenant leaves [default: lease term]
        #[arg(long)]
        renter_exit_year: Option<u32>,

        /// Exit cap rate [default: tenant's exit cap rate]
        #[arg(long)]
        cap_rate: Option<f64>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,

        /// Include cash flows and vacancy scenarios
        #[arg(long)]
        detail: bool,
    },

    /// Evaluate a grid of exit plans and write CSV
    Grid {
        #[arg(long)]
        tenant: String,

        #[arg(long, value_enum, value_delimiter = ',', default_values_t = Financing::ALL)]
        financing: Vec<Financing>,

        /// Renter exit years [default: lease term]
        #[arg(long, value_delimiter = ',')]
        renter_exit_years: Vec<u32>,

        #[arg(long, value_delimiter = ',', required = true)]
        sale_years: Vec<u32>,

        /// Exit cap rates [default: tenant's exit cap rate]
        #[arg(long, value_delimiter = ',')]
        cap_rates: Vec<f64>,

        /// Output CSV path [default: stdout]
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn load_assumptions(path: Option<&Path>) -> Result<Assumptions> {
    match path {
        Some(path) => Assumptions::from_json_path(path)
            .with_context(|| format!("Failed to load assumptions from {}", path.display())),
        None => {
            let default_path = Path::new(DEFAULT_ASSUMPTIONS_PATH);
            if default_path.exists() {
                log::info!("Using assumptions from {}", default_path.display());
                Assumptions::from_json_path(default_path)
                    .with_context(|| format!("Failed to load assumptions from {}", default_path.display()))
            } else {
                Ok(Assumptions::default_deal())
            }
        }
    }
}

fn load_profiles(path: Option<&Path>, assumptions: &Assumptions) -> Result<Vec<TenantProfile>> {
    let profiles = match path {
        Some(path) => load_roster(path).with_context(|| format!("Failed to load roster from {}", path.display()))?,
        None => builtin_roster(),
    };
    let mismatched = roster_mismatches(&profiles, &assumptions.property);
    if !mismatched.is_empty() {
        log::warn!("Roster entries priced off the property area instead: {}", mismatched.join(", "));
    }
    Ok(profiles)
}

fn fmt_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0))
}

fn fmt_multiple(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}x", v))
}

fn print_tenants(profiles: &[TenantProfile]) {
    println!(
        "{:<12} {:>6} {:>6} {:>5} {:>9} {:>6} {:>6} {:>7}   {:>17}   {:>23}",
        "Tenant", "Sqm", "Years", "Guar", "Rent/sqm", "Abate", "TI", "ExitCap", "Benchmark EM", "Benchmark IRR"
    );
    println!("{}", "-".repeat(118));
    for p in profiles {
        let em = p
            .benchmark_equity_multiple
            .map(|b| format!("{:.2}/{:.2}/{:.2}", b.unleveraged, b.lender_a, b.lender_b))
            .unwrap_or_default();
        let irr = p
            .benchmark_irr
            .map(|b| {
                format!(
                    "{:.0}%/{:.0}%/{:.0}%",
                    b.unleveraged * 100.0,
                    b.lender_a * 100.0,
                    b.lender_b * 100.0
                )
            })
            .unwrap_or_default();
        println!(
            "{:<12} {:>6.0} {:>6} {:>5} {:>9.0} {:>6} {:>6.0} {:>7.3}   {:>17}   {:>23}",
            p.name,
            p.total_sqm,
            p.term_years(),
            if p.is_guaranteed { "yes" } else { "no" },
            p.initial_rent_per_sqm,
            p.abatement_months,
            p.ti_per_sqm,
            p.exit_cap_rate,
            em,
            irr
        );
    }
    println!("\nBenchmarks are unleveraged / Lender A / Lender B");
}

fn print_metrics(metrics: &ReturnMetrics) {
    println!("  IRR:                          {:>10}", fmt_pct(metrics.irr));
    println!("  IRR (no sunk cost):           {:>10}", fmt_pct(metrics.irr_no_sunk_cost));
    println!("  Equity multiple:              {:>10}", fmt_multiple(metrics.equity_multiple));
    println!("  Equity multiple (no sunk):    {:>10}", fmt_multiple(metrics.equity_multiple_no_sunk_cost));
}

fn print_outcome(profile: &TenantProfile, outcome: &Outcome, detail: bool) {
    println!("{} / {}", profile.name, outcome.financing);
    println!(
        "  Renter exit year {}, sale year {}, cap rate {:.2}%",
        outcome.renter_exit_year,
        outcome.sale_year,
        outcome.cap_rate * 100.0
    );
    if outcome.is_vacancy_path() {
        println!("  Space re-let after departure: expectation over {} vacancy scenarios", outcome.vacancy.len());
    }
    println!();
    print_metrics(&outcome.metrics);

    if let (Some(em), Some(irr)) = (profile.benchmark_equity_multiple, profile.benchmark_irr) {
        println!();
        println!("  Benchmark IRR:                {:>10}", fmt_pct(Some(irr.for_financing(outcome.financing))));
        println!(
            "  Benchmark equity multiple:    {:>10}",
            fmt_multiple(Some(em.for_financing(outcome.financing)))
        );
    }

    if !outcome.dscr.is_empty() {
        println!();
        println!("  {:>4} {:>8}", "Year", "DSCR");
        for (year, dscr) in outcome.dscr.iter().enumerate() {
            println!("  {:>4} {:>8.3}", year, dscr);
        }
    }

    if !detail {
        return;
    }

    if let Some(cash_flows) = &outcome.cash_flows {
        println!();
        println!("  {:>10} {:>16}", "Date", "Cash flow");
        for flow in cash_flows.flows() {
            println!("  {:>10} {:>16.2}", flow.date, flow.amount);
        }
    }

    if outcome.is_vacancy_path() {
        println!();
        println!(
            "  {:>8} {:>8} {:>10} {:>5} {:>10} {:>10} {:>8} {:>8}",
            "Quarters", "Prob", "Re-let", "Term", "IRR", "IRR-NSC", "EM", "EM-NSC"
        );
        for s in &outcome.vacancy {
            println!(
                "  {:>8} {:>8.4} {:>10} {:>5} {:>10} {:>10} {:>8} {:>8}",
                s.quarters,
                s.probability,
                s.replacement_start,
                s.replacement_term_years,
                fmt_pct(s.metrics.irr),
                fmt_pct(s.metrics.irr_no_sunk_cost),
                fmt_multiple(s.metrics.equity_multiple),
                fmt_multiple(s.metrics.equity_multiple_no_sunk_cost)
            );
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let assumptions = load_assumptions(cli.assumptions.as_deref())?;
    let profiles = load_profiles(cli.roster.as_deref(), &assumptions)?;

    match cli.command {
        Command::Tenants => print_tenants(&profiles),

        Command::Evaluate {
            tenant,
            financing,
            sale_year,
            renter_exit_year,
            cap_rate,
            json,
            detail,
        } => {
            let profile = find_profile(&profiles, &tenant)?;
            let config = EngineConfig {
                solver: cli.solver,
                detailed_output: detail,
            };
            let runner = ScenarioRunner::with_assumptions(assumptions, config)?;

            let request = OutcomeRequest {
                renter_exit_year,
                sale_year,
                cap_rate: cap_rate.unwrap_or(profile.exit_cap_rate),
            };
            let outcome = runner
                .run(&profile.lease_terms(), financing, &request)
                .with_context(|| format!("Failed to evaluate {} with {}", profile.name, financing))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(profile, &outcome, detail);
            }
        }

        Command::Grid {
            tenant,
            financing,
            renter_exit_years,
            sale_years,
            cap_rates,
            output,
        } => {
            let profile = find_profile(&profiles, &tenant)?;
            let config = EngineConfig {
                solver: cli.solver,
                detailed_output: false,
            };
            let runner = ScenarioRunner::with_assumptions(assumptions, config)?;

            let spec = GridSpec {
                renter_exit_years: if renter_exit_years.is_empty() {
                    vec![None]
                } else {
                    renter_exit_years.into_iter().map(Some).collect()
                },
                sale_years,
                cap_rates: if cap_rates.is_empty() {
                    vec![profile.exit_cap_rate]
                } else {
                    cap_rates
                },
                financings: financing,
            };

            let rows = runner.run_grid(&profile.lease_terms(), &spec);
            let failed = rows.iter().filter(|r| r.error.is_some()).count();

            match output {
                Some(path) => {
                    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
                    write_grid_csv(&rows, BufWriter::new(file))?;
                    println!("Wrote {} rows to {}", rows.len(), path.display());
                }
                None => write_grid_csv(&rows, io::stdout().lock())?,
            }
            if failed > 0 {
                log::warn!("{} of {} grid cells could not be evaluated", failed, rows.len());
            }
        }
    }

    Ok(())
}
