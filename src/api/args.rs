use clap::{Args, Parser, Subcommand};

use crate::core::{AfpPlan, FiInputs, FundInputs, SimulationInputs};

#[derive(Parser, Debug)]
#[command(
    name = "fi-projector",
    about = "Financial independence projections and Chilean pension/fund cost comparisons"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capital target, years to financial independence and a Monte Carlo interval
    Fi(FiArgs),
    /// Compare two AFPs with different fees and returns
    Afp(AfpArgs),
    /// Compare a mutual fund against an ETF with reinvested dividends
    Funds(FundsArgs),
    /// Serve the JSON HTTP API
    Serve {
        #[arg(default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug, Clone)]
pub struct FiArgs {
    #[arg(long, default_value_t = 10_000_000.0)]
    pub current_savings: f64,
    #[arg(long, default_value_t = 24_000_000.0)]
    pub annual_expenses: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        help = "Annual withdrawal rate in retirement, in percent"
    )]
    pub withdrawal_rate: f64,
    #[arg(long, default_value_t = 3_000_000.0)]
    pub annual_investment: f64,
    #[arg(
        long,
        default_value_t = 8.0,
        help = "Expected nominal annual return in percent"
    )]
    pub annual_return_rate: f64,
    #[arg(long, default_value_t = 3.0, help = "Expected annual inflation in percent")]
    pub inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Standard deviation of the annual return in percent"
    )]
    pub return_std_dev: f64,
    #[arg(
        long,
        default_value_t = 1.0,
        help = "Standard deviation of annual inflation in percent"
    )]
    pub inflation_std_dev: f64,
    #[arg(long, default_value_t = 1000)]
    pub simulations: u32,
    #[arg(
        long,
        default_value_t = 95.0,
        help = "Confidence level of the interval in percent"
    )]
    pub confidence_level: f64,
    #[arg(long, help = "Seed for reproducible simulations; random when omitted")]
    pub seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct AfpArgs {
    #[arg(long, default_value_t = 30)]
    pub years: u32,
    #[arg(long, default_value_t = 2_000_000.0)]
    pub initial_investment: f64,
    #[arg(long, default_value_t = 700_000.0, help = "Monthly salary")]
    pub salary: f64,
    #[arg(
        long,
        default_value_t = 1.27,
        help = "First AFP monthly fee on salary in percent (Habitat)"
    )]
    pub first_afp_fee: f64,
    #[arg(
        long,
        default_value_t = 0.58,
        help = "Second AFP monthly fee on salary in percent (Modelo)"
    )]
    pub second_afp_fee: f64,
    #[arg(long, default_value_t = 5.38, help = "First AFP annual return in percent")]
    pub first_afp_return_rate: f64,
    #[arg(long, default_value_t = 5.29, help = "Second AFP annual return in percent")]
    pub second_afp_return_rate: f64,
    #[arg(
        long,
        default_value_t = 11.0,
        help = "Mandatory contribution rate on salary in percent"
    )]
    pub afp_contribution_rate: f64,
}

#[derive(Args, Debug, Clone)]
pub struct FundsArgs {
    #[arg(long, default_value_t = 20)]
    pub years: u32,
    #[arg(long, default_value_t = 10_000_000.0)]
    pub initial_investment: f64,
    #[arg(long, default_value_t = 10_000_000.0)]
    pub annual_investment: f64,
    #[arg(long, default_value_t = 10.0, help = "Expected annual return in percent")]
    pub return_rate: f64,
    #[arg(long, default_value_t = 1.19, help = "Mutual fund annual fee in percent")]
    pub mutual_fund_fee: f64,
    #[arg(long, default_value_t = 0.06, help = "ETF annual fee in percent")]
    pub etf_fee: f64,
    #[arg(long, default_value_t = 3.0, help = "ETF dividend yield in percent")]
    pub dividend_yield: f64,
    #[arg(long, default_value_t = 23.0, help = "Chilean marginal tax rate in percent")]
    pub chilean_tax: f64,
    #[arg(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        help = "Settle capital gains tax at the end of the horizon"
    )]
    pub sell_at_end: bool,
}

pub fn default_fi_args() -> FiArgs {
    FiArgs {
        current_savings: 10_000_000.0,
        annual_expenses: 24_000_000.0,
        withdrawal_rate: 4.0,
        annual_investment: 3_000_000.0,
        annual_return_rate: 8.0,
        inflation_rate: 3.0,
        return_std_dev: 2.0,
        inflation_std_dev: 1.0,
        simulations: 1_000,
        confidence_level: 95.0,
        seed: None,
    }
}

pub fn default_afp_args() -> AfpArgs {
    AfpArgs {
        years: 30,
        initial_investment: 2_000_000.0,
        salary: 700_000.0,
        first_afp_fee: 1.27,
        second_afp_fee: 0.58,
        first_afp_return_rate: 5.38,
        second_afp_return_rate: 5.29,
        afp_contribution_rate: 11.0,
    }
}

pub fn default_funds_args() -> FundsArgs {
    FundsArgs {
        years: 20,
        initial_investment: 10_000_000.0,
        annual_investment: 10_000_000.0,
        return_rate: 10.0,
        mutual_fund_fee: 1.19,
        etf_fee: 0.06,
        dividend_yield: 3.0,
        chilean_tax: 23.0,
        sell_at_end: true,
    }
}

pub fn build_fi_inputs(args: &FiArgs) -> Result<(FiInputs, SimulationInputs), String> {
    if args.withdrawal_rate == 0.0 {
        return Err("--withdrawal-rate must not be 0".to_string());
    }

    if args.simulations == 0 {
        return Err("--simulations must be > 0".to_string());
    }

    if !(args.confidence_level > 0.0 && args.confidence_level < 100.0) {
        return Err("--confidence-level must be between 0 and 100 (exclusive)".to_string());
    }

    if args.return_std_dev < 0.0 || args.inflation_std_dev < 0.0 {
        return Err("--return-std-dev and --inflation-std-dev must be >= 0".to_string());
    }

    let inputs = FiInputs {
        current_savings: args.current_savings,
        annual_expenses: args.annual_expenses,
        withdrawal_rate: args.withdrawal_rate / 100.0,
        annual_investment: args.annual_investment,
        annual_return_rate: args.annual_return_rate / 100.0,
        inflation_rate: args.inflation_rate / 100.0,
    };
    let simulation = SimulationInputs {
        return_std_dev: args.return_std_dev / 100.0,
        inflation_std_dev: args.inflation_std_dev / 100.0,
        simulations: args.simulations,
        confidence_level: args.confidence_level / 100.0,
        seed: args.seed,
    };
    Ok((inputs, simulation))
}

/// Shared AFP scenario plus the two plans being compared.
#[derive(Debug, Clone, Copy)]
pub struct AfpScenario {
    pub years: u32,
    pub initial_investment: f64,
    pub salary: f64,
    pub afp_contribution_rate: f64,
    pub first: AfpPlan,
    pub second: AfpPlan,
}

pub fn build_afp_scenario(args: &AfpArgs) -> AfpScenario {
    AfpScenario {
        years: args.years,
        initial_investment: args.initial_investment,
        salary: args.salary,
        afp_contribution_rate: args.afp_contribution_rate / 100.0,
        first: AfpPlan {
            afp_fee: args.first_afp_fee / 100.0,
            return_rate: args.first_afp_return_rate / 100.0,
        },
        second: AfpPlan {
            afp_fee: args.second_afp_fee / 100.0,
            return_rate: args.second_afp_return_rate / 100.0,
        },
    }
}

pub fn build_fund_inputs(args: &FundsArgs) -> FundInputs {
    FundInputs {
        years: args.years,
        initial_investment: args.initial_investment,
        annual_investment: args.annual_investment,
        return_rate: args.return_rate / 100.0,
        mutual_fund_fee: args.mutual_fund_fee / 100.0,
        etf_fee: args.etf_fee / 100.0,
        dividend_yield: args.dividend_yield / 100.0,
        chilean_tax: args.chilean_tax / 100.0,
        sell_at_end: args.sell_at_end,
    }
}
