use super::types::{AfpComparison, AfpInputs, AfpOutcome, AfpPlan};

const MONTHS_PER_YEAR: f64 = 12.0;

/// Fee an AFP charges in one month on the given salary.
pub fn monthly_afp_cost(afp_fee: f64, salary: f64) -> f64 {
    afp_fee * salary
}

/// Grows the pension account for `years`, tracking the fees paid on salary.
///
/// Fees are charged on salary, not on the balance, so they never reduce the
/// future value.
pub fn afp_simulation(inputs: &AfpInputs) -> AfpOutcome {
    let mut accumulated_fee_cost = 0.0;
    let mut future_value = inputs.initial_investment;
    let annual_contribution = inputs.salary * inputs.afp_contribution_rate * MONTHS_PER_YEAR;

    for _ in 0..inputs.years {
        accumulated_fee_cost += monthly_afp_cost(inputs.afp_fee, inputs.salary) * MONTHS_PER_YEAR;
        future_value = (future_value + annual_contribution) * (1.0 + inputs.return_rate);
    }

    AfpOutcome {
        future_value,
        accumulated_fee_cost,
    }
}

pub fn afp_comparison(
    years: u32,
    initial_investment: f64,
    salary: f64,
    first: AfpPlan,
    second: AfpPlan,
    afp_contribution_rate: f64,
) -> AfpComparison {
    let run = |plan: AfpPlan| {
        afp_simulation(&AfpInputs {
            years,
            initial_investment,
            salary,
            afp_fee: plan.afp_fee,
            return_rate: plan.return_rate,
            afp_contribution_rate,
        })
    };
    let first = run(first);
    let second = run(second);

    let future_value_difference = first.future_value - second.future_value;
    let fee_cost_difference = first.accumulated_fee_cost - second.accumulated_fee_cost;

    AfpComparison {
        first,
        second,
        future_value_difference,
        fee_cost_difference,
        net_difference: future_value_difference - fee_cost_difference,
    }
}
