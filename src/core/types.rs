use serde::Serialize;

pub const DEFAULT_SIMULATIONS: u32 = 1_000;
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Scenario for the deterministic projection. All rates are fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiInputs {
    pub current_savings: f64,
    pub annual_expenses: f64,
    pub withdrawal_rate: f64,
    pub annual_investment: f64,
    pub annual_return_rate: f64,
    pub inflation_rate: f64,
}

/// Sampling parameters for the Monte Carlo projection.
///
/// `seed: None` draws a fresh base seed from OS entropy, so unseeded runs differ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationInputs {
    pub return_std_dev: f64,
    pub inflation_std_dev: f64,
    pub simulations: u32,
    pub confidence_level: f64,
    pub seed: Option<u64>,
}

impl SimulationInputs {
    pub fn new(return_std_dev: f64, inflation_std_dev: f64) -> Self {
        Self {
            return_std_dev,
            inflation_std_dev,
            simulations: DEFAULT_SIMULATIONS,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceInterval {
    pub mean_years: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub confidence_level: f64,
    pub simulations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AfpInputs {
    pub years: u32,
    pub initial_investment: f64,
    /// Monthly salary.
    pub salary: f64,
    /// Monthly fee charged on salary.
    pub afp_fee: f64,
    pub return_rate: f64,
    pub afp_contribution_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AfpOutcome {
    pub future_value: f64,
    pub accumulated_fee_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AfpPlan {
    pub afp_fee: f64,
    pub return_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AfpComparison {
    pub first: AfpOutcome,
    pub second: AfpOutcome,
    pub future_value_difference: f64,
    pub fee_cost_difference: f64,
    pub net_difference: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundInputs {
    pub years: u32,
    pub initial_investment: f64,
    pub annual_investment: f64,
    pub return_rate: f64,
    pub mutual_fund_fee: f64,
    pub etf_fee: f64,
    pub dividend_yield: f64,
    pub chilean_tax: f64,
    pub sell_at_end: bool,
}

impl Default for FundInputs {
    fn default() -> Self {
        Self {
            years: 10,
            initial_investment: 10_000_000.0,
            annual_investment: 1_000_000.0,
            return_rate: 0.10,
            mutual_fund_fee: 0.0119,
            etf_fee: 0.001,
            dividend_yield: 0.03,
            chilean_tax: 0.23,
            sell_at_end: true,
        }
    }
}

/// Capital-gains settlement applied when the position is sold at the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleSettlement {
    pub tax_cost: f64,
    pub future_value_after_tax: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutualFundResult {
    pub future_value: f64,
    pub total_cost: f64,
    pub deposited: f64,
    pub sale: Option<SaleSettlement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EtfResult {
    pub future_value: f64,
    pub total_cost: f64,
    pub dividends_tax_cost: f64,
    pub deposited: f64,
    pub sale: Option<SaleSettlement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundComparison {
    pub initial_investment: f64,
    pub annual_investment: f64,
    pub mutual_fund: MutualFundResult,
    pub etf: EtfResult,
}
