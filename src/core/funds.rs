use super::types::{EtfResult, FundComparison, FundInputs, MutualFundResult, SaleSettlement};

/// Dividend withholding applied at source to foreign ETF distributions.
pub const WITHHOLDING_TAX: f64 = 0.15;
/// Unidad Tributaria Mensual, in CLP.
pub const UTM: f64 = 70_000.0;
/// Mutual fund gains exempt on sale, in UTM.
pub const MUTUAL_FUND_EXEMPT_UTM: f64 = 30.0;

/// Compares a mutual fund against an accumulating ETF bought from Chile.
///
/// The fund charges its fee as a drag on return. The ETF pays out
/// `dividend_yield` every year, which is taxed at source and then topped up
/// to the local rate before being reinvested.
pub fn compare_between_mutual_funds_and_etfs(inputs: &FundInputs) -> FundComparison {
    let mutual_fund = simulate_mutual_fund(inputs);
    let etf = simulate_etf(inputs);

    FundComparison {
        initial_investment: inputs.initial_investment,
        annual_investment: inputs.annual_investment,
        mutual_fund,
        etf,
    }
}

/// Share of a gross dividend left after withholding and the local top-up.
pub fn net_dividend_factor(chilean_tax: f64) -> f64 {
    (1.0 - WITHHOLDING_TAX) * (1.0 - (chilean_tax - WITHHOLDING_TAX))
}

fn simulate_mutual_fund(inputs: &FundInputs) -> MutualFundResult {
    let net_return_rate = inputs.return_rate - inputs.mutual_fund_fee;
    let mut future_value = inputs.initial_investment;
    let mut total_cost = 0.0;
    let mut deposited = inputs.initial_investment;

    for _ in 0..inputs.years {
        total_cost += future_value * inputs.mutual_fund_fee;
        future_value = future_value * (1.0 + net_return_rate) + inputs.annual_investment;
        deposited += inputs.annual_investment;
    }

    let sale = inputs.sell_at_end.then(|| {
        let tax_cost = (future_value - deposited) * inputs.chilean_tax
            - MUTUAL_FUND_EXEMPT_UTM * UTM;
        SaleSettlement {
            tax_cost,
            future_value_after_tax: future_value - tax_cost,
        }
    });

    MutualFundResult {
        future_value,
        total_cost,
        deposited,
        sale,
    }
}

fn simulate_etf(inputs: &FundInputs) -> EtfResult {
    let net_return_rate = inputs.return_rate - inputs.etf_fee;
    let appreciation = net_return_rate - inputs.dividend_yield;
    let kept = net_dividend_factor(inputs.chilean_tax);

    let mut future_value = inputs.initial_investment;
    let mut total_cost = 0.0;
    let mut dividends_tax_cost = 0.0;
    let mut deposited = inputs.initial_investment;

    for _ in 0..inputs.years {
        total_cost += future_value * inputs.etf_fee;
        dividends_tax_cost += future_value * inputs.dividend_yield * (1.0 - kept);
        future_value = future_value * (1.0 + appreciation)
            + future_value * inputs.dividend_yield * kept
            + inputs.annual_investment;
        // Reinvested dividends join the cost basis, measured on the new balance.
        deposited += inputs.annual_investment + future_value * inputs.dividend_yield * kept;
    }

    let sale = inputs.sell_at_end.then(|| {
        let tax_cost = (future_value - deposited) * inputs.chilean_tax;
        SaleSettlement {
            tax_cost,
            future_value_after_tax: future_value - tax_cost,
        }
    });

    EtfResult {
        future_value,
        total_cost,
        dividends_tax_cost,
        deposited,
        sale,
    }
}
