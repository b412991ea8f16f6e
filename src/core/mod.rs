mod afp;
mod engine;
mod error;
mod funds;
mod types;

pub use afp::{afp_comparison, afp_simulation, monthly_afp_cost};
pub use engine::{
    MAX_TRIAL_YEARS, financial_independence, real_return_rate, run_trials, simulate_trial,
    summarize_trials, years_to_fi, years_to_fi_with_confidence, years_to_fi_within,
};
pub use error::ProjectionError;
pub use funds::{
    MUTUAL_FUND_EXEMPT_UTM, UTM, WITHHOLDING_TAX, compare_between_mutual_funds_and_etfs,
    net_dividend_factor,
};
pub use types::{
    AfpComparison, AfpInputs, AfpOutcome, AfpPlan, ConfidenceInterval, DEFAULT_CONFIDENCE_LEVEL,
    DEFAULT_SIMULATIONS, EtfResult, FiInputs, FundComparison, FundInputs, MutualFundResult,
    SaleSettlement, SimulationInputs,
};
