use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use tracing::debug;

use super::error::ProjectionError;
use super::types::{ConfidenceInterval, FiInputs, SimulationInputs};

/// Hard stop for a single Monte Carlo trial.
pub const MAX_TRIAL_YEARS: u32 = 100;

/// Capital needed so that `annual_expenses` is covered at `withdrawal_rate`.
///
/// A zero withdrawal rate is rejected instead of producing an infinite target.
pub fn financial_independence(
    annual_expenses: f64,
    withdrawal_rate: f64,
) -> Result<f64, ProjectionError> {
    check_withdrawal_rate(withdrawal_rate)?;
    Ok(target_amount(annual_expenses, withdrawal_rate))
}

/// Fisher relation between nominal return and inflation.
pub fn real_return_rate(nominal_return_rate: f64, inflation_rate: f64) -> f64 {
    (1.0 + nominal_return_rate) / (1.0 + inflation_rate) - 1.0
}

/// Years of contributions and real growth until savings cover the inflating target.
///
/// There is no iteration cap: when the target outgrows savings forever this
/// never returns. Use [`years_to_fi_within`] when the inputs are not trusted.
pub fn years_to_fi(inputs: &FiInputs) -> Result<u32, ProjectionError> {
    check_withdrawal_rate(inputs.withdrawal_rate)?;

    let mut projection = Projection::new(inputs, inputs.annual_return_rate, inputs.inflation_rate);
    while projection.short_of_target() {
        projection.advance_year();
    }
    Ok(projection.years)
}

/// Same recurrence as [`years_to_fi`], giving up after `max_years`.
pub fn years_to_fi_within(
    inputs: &FiInputs,
    max_years: u32,
) -> Result<Option<u32>, ProjectionError> {
    check_withdrawal_rate(inputs.withdrawal_rate)?;

    let mut projection = Projection::new(inputs, inputs.annual_return_rate, inputs.inflation_rate);
    while projection.short_of_target() {
        if projection.years >= max_years {
            return Ok(None);
        }
        projection.advance_year();
    }
    Ok(Some(projection.years))
}

/// Monte Carlo estimate of [`years_to_fi`] with a percentile interval.
///
/// Every trial draws one return rate and one inflation rate from independent
/// normal distributions and keeps them for its whole path. Trials stop at
/// [`MAX_TRIAL_YEARS`].
pub fn years_to_fi_with_confidence(
    inputs: &FiInputs,
    simulation: &SimulationInputs,
) -> Result<ConfidenceInterval, ProjectionError> {
    let base_seed = simulation.seed.unwrap_or_else(rand::random);
    let trial_years = run_trials(inputs, simulation, base_seed)?;

    let interval = summarize_trials(&trial_years, simulation.confidence_level);
    debug!(
        simulations = simulation.simulations,
        base_seed,
        capped_trials = trial_years.iter().filter(|&&y| y >= MAX_TRIAL_YEARS).count(),
        mean_years = interval.mean_years,
        lower_bound = interval.lower_bound,
        upper_bound = interval.upper_bound,
        "monte carlo projection complete"
    );
    Ok(interval)
}

/// Runs every trial and returns the year counts in trial order.
///
/// Trial `i` uses its own generator seeded from `(base_seed, i)`, so the
/// result does not depend on how rayon schedules the work.
pub fn run_trials(
    inputs: &FiInputs,
    simulation: &SimulationInputs,
    base_seed: u64,
) -> Result<Vec<u32>, ProjectionError> {
    check_withdrawal_rate(inputs.withdrawal_rate)?;
    check_simulation(simulation)?;

    let returns = Normal::new(inputs.annual_return_rate, simulation.return_std_dev)
        .map_err(|e| ProjectionError::invalid("return_std_dev", e.to_string()))?;
    let inflation = Normal::new(inputs.inflation_rate, simulation.inflation_std_dev)
        .map_err(|e| ProjectionError::invalid("inflation_std_dev", e.to_string()))?;

    Ok((0..simulation.simulations)
        .into_par_iter()
        .map(|trial_id| {
            let mut rng = StdRng::seed_from_u64(derive_seed(base_seed, trial_id));
            simulate_trial(inputs, &returns, &inflation, &mut rng)
        })
        .collect())
}

/// One capped trial driven by the supplied generator.
pub fn simulate_trial<R: Rng + ?Sized>(
    inputs: &FiInputs,
    returns: &Normal<f64>,
    inflation: &Normal<f64>,
    rng: &mut R,
) -> u32 {
    let simulated_return_rate = returns.sample(&mut *rng);
    let simulated_inflation_rate = inflation.sample(&mut *rng);

    let mut projection = Projection::new(inputs, simulated_return_rate, simulated_inflation_rate);
    while projection.short_of_target() && projection.years < MAX_TRIAL_YEARS {
        projection.advance_year();
    }
    projection.years
}

/// Mean plus the two-sided percentile interval of the trial year counts.
pub fn summarize_trials(trial_years: &[u32], confidence_level: f64) -> ConfidenceInterval {
    let mut values = trial_years.iter().map(|&y| y as f64).collect::<Vec<_>>();
    let mean_years = mean(&values);
    let lower_bound = percentile(&mut values, (1.0 - confidence_level) / 2.0 * 100.0);
    let upper_bound = percentile(&mut values, (1.0 + confidence_level) / 2.0 * 100.0);

    ConfidenceInterval {
        mean_years,
        lower_bound,
        upper_bound,
        confidence_level,
        simulations: trial_years.len() as u32,
    }
}

struct Projection {
    savings: f64,
    annual_expenses: f64,
    target: f64,
    withdrawal_rate: f64,
    annual_investment: f64,
    real_return_rate: f64,
    inflation_rate: f64,
    years: u32,
}

impl Projection {
    fn new(inputs: &FiInputs, return_rate: f64, inflation_rate: f64) -> Self {
        Self {
            savings: inputs.current_savings,
            annual_expenses: inputs.annual_expenses,
            target: target_amount(inputs.annual_expenses, inputs.withdrawal_rate),
            withdrawal_rate: inputs.withdrawal_rate,
            annual_investment: inputs.annual_investment,
            real_return_rate: real_return_rate(return_rate, inflation_rate),
            inflation_rate,
            years: 0,
        }
    }

    // NaN targets compare false here and end the loop.
    fn short_of_target(&self) -> bool {
        self.savings < self.target
    }

    fn advance_year(&mut self) {
        // The year's contribution compounds in the same year.
        self.savings = (self.savings + self.annual_investment) * (1.0 + self.real_return_rate);
        self.annual_expenses *= 1.0 + self.inflation_rate;
        self.target = target_amount(self.annual_expenses, self.withdrawal_rate);
        self.years += 1;
    }
}

fn target_amount(annual_expenses: f64, withdrawal_rate: f64) -> f64 {
    annual_expenses / withdrawal_rate
}

fn check_withdrawal_rate(withdrawal_rate: f64) -> Result<(), ProjectionError> {
    if withdrawal_rate == 0.0 || !withdrawal_rate.is_finite() {
        return Err(ProjectionError::invalid(
            "withdrawal_rate",
            format!("must be a finite non-zero fraction, got {withdrawal_rate}"),
        ));
    }
    Ok(())
}

fn check_simulation(simulation: &SimulationInputs) -> Result<(), ProjectionError> {
    if simulation.simulations == 0 {
        return Err(ProjectionError::invalid("simulations", "must be > 0"));
    }
    if !(simulation.confidence_level > 0.0 && simulation.confidence_level < 1.0) {
        return Err(ProjectionError::invalid(
            "confidence_level",
            format!("must be in (0, 1), got {}", simulation.confidence_level),
        ));
    }
    for (name, std_dev) in [
        ("return_std_dev", simulation.return_std_dev),
        ("inflation_std_dev", simulation.inflation_std_dev),
    ] {
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(ProjectionError::invalid(
                name,
                format!("must be finite and >= 0, got {std_dev}"),
            ));
        }
    }
    Ok(())
}

fn derive_seed(base_seed: u64, trial_id: u32) -> u64 {
    splitmix64(base_seed ^ trial_id as u64)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Linear interpolation between closest ranks, `p` in percent.
fn percentile(values: &mut [f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] * (1.0 - w) + values[upper] * w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn example_inputs() -> FiInputs {
        FiInputs {
            current_savings: 10_000_000.0,
            annual_expenses: 24_000_000.0,
            withdrawal_rate: 0.04,
            annual_investment: 3_000_000.0,
            annual_return_rate: 0.08,
            inflation_rate: 0.03,
        }
    }

    fn fast_inputs() -> FiInputs {
        FiInputs {
            current_savings: 200_000_000.0,
            annual_expenses: 24_000_000.0,
            withdrawal_rate: 0.04,
            annual_investment: 40_000_000.0,
            annual_return_rate: 0.08,
            inflation_rate: 0.03,
        }
    }

    fn seeded(return_std_dev: f64, inflation_std_dev: f64, seed: u64) -> SimulationInputs {
        SimulationInputs {
            seed: Some(seed),
            ..SimulationInputs::new(return_std_dev, inflation_std_dev)
        }
    }

    /// Hand-rolled copy of the recurrence used as an oracle.
    fn oracle_years(inputs: &FiInputs) -> u32 {
        let real = (1.0 + inputs.annual_return_rate) / (1.0 + inputs.inflation_rate) - 1.0;
        let mut savings = inputs.current_savings;
        let mut expenses = inputs.annual_expenses;
        let mut target = expenses / inputs.withdrawal_rate;
        let mut years = 0;
        while savings < target {
            savings += inputs.annual_investment;
            savings *= 1.0 + real;
            expenses *= 1.0 + inputs.inflation_rate;
            target = expenses / inputs.withdrawal_rate;
            years += 1;
        }
        years
    }

    #[test]
    fn target_matches_worked_example() {
        let target = financial_independence(24_000_000.0, 0.04).expect("valid rate");
        assert!((target - 600_000_000.0).abs() / 600_000_000.0 < 1e-12);
    }

    #[test]
    fn zero_withdrawal_rate_is_rejected() {
        let err = financial_independence(24_000_000.0, 0.0).expect_err("zero rate");
        assert!(matches!(
            err,
            ProjectionError::InvalidParameter {
                name: "withdrawal_rate",
                ..
            }
        ));

        let mut inputs = example_inputs();
        inputs.withdrawal_rate = 0.0;
        assert!(years_to_fi(&inputs).is_err());
        assert!(years_to_fi_with_confidence(&inputs, &seeded(0.02, 0.01, 1)).is_err());
    }

    #[test]
    fn real_return_uses_fisher_relation() {
        assert_approx(real_return_rate(0.08, 0.03), 1.08 / 1.03 - 1.0);
        assert_approx(real_return_rate(0.05, 0.05), 0.0);
    }

    #[test]
    fn worked_example_matches_recurrence() {
        let inputs = example_inputs();
        let years = years_to_fi(&inputs).expect("converges");
        assert_eq!(years, oracle_years(&inputs));
        assert_eq!(years, 117);
    }

    #[test]
    fn already_independent_returns_zero() {
        let mut inputs = example_inputs();
        inputs.current_savings = 600_000_000.0;
        assert_eq!(years_to_fi(&inputs).expect("valid"), 0);
        assert_eq!(years_to_fi_within(&inputs, 0).expect("valid"), Some(0));
    }

    #[test]
    fn zero_rates_without_investment_never_converge() {
        let inputs = FiInputs {
            current_savings: 100.0,
            annual_expenses: 10.0,
            withdrawal_rate: 0.04,
            annual_investment: 0.0,
            annual_return_rate: 0.0,
            inflation_rate: 0.0,
        };
        assert_eq!(years_to_fi_within(&inputs, 500).expect("valid"), None);

        let rich = FiInputs {
            current_savings: 250.0,
            ..inputs
        };
        assert_eq!(years_to_fi(&rich).expect("valid"), 0);
    }

    #[test]
    fn zero_rates_with_investment_accumulate_linearly() {
        let inputs = FiInputs {
            current_savings: 0.0,
            annual_expenses: 10.0,
            withdrawal_rate: 0.1,
            annual_investment: 1.0,
            annual_return_rate: 0.0,
            inflation_rate: 0.0,
        };
        assert_eq!(years_to_fi(&inputs).expect("valid"), 100);
        assert_eq!(years_to_fi_within(&inputs, 99).expect("valid"), None);
        assert_eq!(years_to_fi_within(&inputs, 100).expect("valid"), Some(100));
    }

    #[test]
    fn zero_volatility_trials_reproduce_deterministic_projection() {
        let inputs = fast_inputs();
        let expected = years_to_fi(&inputs).expect("converges");
        assert!(expected > 0 && expected < MAX_TRIAL_YEARS);

        let mut simulation = seeded(0.0, 0.0, 9);
        simulation.simulations = 64;
        let trials = run_trials(&inputs, &simulation, 9).expect("valid");
        assert!(trials.iter().all(|&y| y == expected));

        let interval = years_to_fi_with_confidence(&inputs, &simulation).expect("valid");
        assert_eq!(interval.mean_years, expected as f64);
        assert_eq!(interval.lower_bound, expected as f64);
        assert_eq!(interval.upper_bound, expected as f64);
        assert_eq!(interval.simulations, 64);
    }

    #[test]
    fn zero_volatility_trials_stop_at_cap() {
        // The deterministic answer is 117 years.
        let mut simulation = seeded(0.0, 0.0, 3);
        simulation.simulations = 20;
        let interval = years_to_fi_with_confidence(&example_inputs(), &simulation).expect("valid");
        assert_eq!(interval.mean_years, MAX_TRIAL_YEARS as f64);
        assert_eq!(interval.lower_bound, MAX_TRIAL_YEARS as f64);
        assert_eq!(interval.upper_bound, MAX_TRIAL_YEARS as f64);
    }

    #[test]
    fn simulate_trial_accepts_external_generator() {
        let inputs = fast_inputs();
        let returns = Normal::new(inputs.annual_return_rate, 0.0).expect("valid");
        let inflation = Normal::new(inputs.inflation_rate, 0.0).expect("valid");
        let mut rng = StdRng::seed_from_u64(77);
        let years = simulate_trial(&inputs, &returns, &inflation, &mut rng);
        assert_eq!(years, years_to_fi(&inputs).expect("converges"));
    }

    #[test]
    fn fixed_seed_reruns_are_identical() {
        let inputs = fast_inputs();
        let simulation = seeded(0.02, 0.01, 42);
        let a = run_trials(&inputs, &simulation, 42).expect("valid");
        let b = run_trials(&inputs, &simulation, 42).expect("valid");
        assert_eq!(a, b);

        let c = run_trials(&inputs, &simulation, 43).expect("valid");
        assert_ne!(a, c);

        let first = years_to_fi_with_confidence(&inputs, &simulation).expect("valid");
        let second = years_to_fi_with_confidence(&inputs, &simulation).expect("valid");
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_simulation_settings_are_rejected() {
        let inputs = fast_inputs();

        let mut simulation = seeded(0.02, 0.01, 1);
        simulation.simulations = 0;
        assert!(years_to_fi_with_confidence(&inputs, &simulation).is_err());

        for level in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let mut simulation = seeded(0.02, 0.01, 1);
            simulation.confidence_level = level;
            assert!(years_to_fi_with_confidence(&inputs, &simulation).is_err());
        }

        let simulation = seeded(-0.02, 0.01, 1);
        let err = years_to_fi_with_confidence(&inputs, &simulation).expect_err("negative std");
        assert!(err.to_string().contains("return_std_dev"));
    }

    #[test]
    fn percentile_interpolates_between_points() {
        let mut values = vec![1.0, 2.0, 3.0, 4.0];
        assert_approx(percentile(&mut values, 25.0), 1.75);
        assert_approx(percentile(&mut values, 0.0), 1.0);
        assert_approx(percentile(&mut values, 100.0), 4.0);
    }

    #[test]
    fn summarize_trials_reports_mean_and_interval() {
        let interval = summarize_trials(&[10, 20, 30, 40, 50], 0.5);
        assert_approx(interval.mean_years, 30.0);
        assert_approx(interval.lower_bound, 20.0);
        assert_approx(interval.upper_bound, 40.0);
        assert_eq!(interval.simulations, 5);
    }

    #[test]
    fn derive_seed_changes_per_trial() {
        assert_ne!(derive_seed(42, 0), derive_seed(42, 1));
        assert_ne!(derive_seed(42, 0), derive_seed(43, 0));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_target_is_monotonic(
            expenses in 1u32..100_000_000,
            extra in 1u32..1_000_000,
            rate_bp in 10u32..2_000,
            rate_step_bp in 1u32..500
        ) {
            let expenses = expenses as f64;
            let rate = rate_bp as f64 / 10_000.0;
            let base = financial_independence(expenses, rate).expect("valid");
            prop_assert_eq!(base, expenses / rate);

            let more = financial_independence(expenses + extra as f64, rate).expect("valid");
            prop_assert!(more > base);

            let higher_rate = rate + rate_step_bp as f64 / 10_000.0;
            let less = financial_independence(expenses, higher_rate).expect("valid");
            prop_assert!(less < base);
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_deterministic_projection_matches_oracle(
            savings in 0u32..500_000_000,
            expenses in 1_000_000u32..40_000_000,
            rate_bp in 300u32..800,
            investment in 1_000_000u32..50_000_000,
            return_bp in 400u32..1_200,
            inflation_bp in 0u32..300
        ) {
            let inputs = FiInputs {
                current_savings: savings as f64,
                annual_expenses: expenses as f64,
                withdrawal_rate: rate_bp as f64 / 10_000.0,
                annual_investment: investment as f64,
                annual_return_rate: return_bp as f64 / 10_000.0,
                inflation_rate: inflation_bp as f64 / 10_000.0,
            };
            let capped = years_to_fi_within(&inputs, 2_000).expect("valid");
            if let Some(years) = capped {
                prop_assert_eq!(years, oracle_years(&inputs));
                prop_assert_eq!(years_to_fi(&inputs).expect("valid"), years);
            }
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_interval_is_ordered_and_within_trial_range(
            seed in 0u64..10_000,
            level_pct in 1u32..100,
            return_std_bp in 0u32..500,
            inflation_std_bp in 0u32..300
        ) {
            let inputs = fast_inputs();
            let simulation = SimulationInputs {
                return_std_dev: return_std_bp as f64 / 10_000.0,
                inflation_std_dev: inflation_std_bp as f64 / 10_000.0,
                simulations: 200,
                confidence_level: level_pct as f64 / 100.0,
                seed: Some(seed),
            };
            let trials = run_trials(&inputs, &simulation, seed).expect("valid");
            prop_assert!(trials.iter().all(|&y| y <= MAX_TRIAL_YEARS));

            let min = *trials.iter().min().expect("non-empty") as f64;
            let max = *trials.iter().max().expect("non-empty") as f64;
            let interval = years_to_fi_with_confidence(&inputs, &simulation).expect("valid");
            prop_assert!(interval.lower_bound <= interval.upper_bound);
            prop_assert!(min <= interval.lower_bound && interval.upper_bound <= max);
            prop_assert!(min <= interval.mean_years && interval.mean_years <= max);
        }
    }
}
