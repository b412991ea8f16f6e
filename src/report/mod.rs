//! Console reports for the projections, written to any `io::Write`.

use std::io::{self, Write};

use crate::core::{AfpComparison, ConfidenceInterval, FundComparison};

const CURRENCY: &str = "CLP";

/// Rounds to whole pesos and groups digits in thousands, e.g. `CLP 1,234,567`.
pub fn format_clp(value: f64) -> String {
    format!("{CURRENCY} {}", format_thousands(value))
}

pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = format!("{value:.0}");
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}")
}

pub fn write_fi_report<W: Write>(
    out: &mut W,
    target: f64,
    years: u32,
    interval: &ConfidenceInterval,
) -> io::Result<()> {
    writeln!(
        out,
        "Target for financial independence: {}",
        format_clp(target)
    )?;
    writeln!(out, "Years to financial independence: {years}")?;
    writeln!(
        out,
        "Mean years to financial independence: {:.2}",
        interval.mean_years
    )?;
    writeln!(
        out,
        "{:.0}% confidence interval: {:.2} - {:.2} years",
        interval.confidence_level * 100.0,
        interval.lower_bound,
        interval.upper_bound
    )
}

pub fn write_afp_comparison<W: Write>(out: &mut W, cmp: &AfpComparison) -> io::Result<()> {
    writeln!(
        out,
        "First AFP Future Value: {}",
        format_clp(cmp.first.future_value)
    )?;
    writeln!(
        out,
        "First AFP Total Cost: {}",
        format_clp(cmp.first.accumulated_fee_cost)
    )?;
    writeln!(
        out,
        "Second AFP Future Value: {}",
        format_clp(cmp.second.future_value)
    )?;
    writeln!(
        out,
        "Second AFP Total Cost: {}",
        format_clp(cmp.second.accumulated_fee_cost)
    )?;
    writeln!(
        out,
        "Difference in Future Value: {}",
        format_clp(cmp.future_value_difference)
    )?;
    writeln!(
        out,
        "Difference in Total Cost: {}",
        format_clp(cmp.fee_cost_difference)
    )?;
    writeln!(
        out,
        "Difference in Future Value - Difference in Total Cost: {}",
        format_clp(cmp.net_difference)
    )
}

pub fn write_fund_comparison<W: Write>(out: &mut W, cmp: &FundComparison) -> io::Result<()> {
    writeln!(
        out,
        "Initial Investment: {}, Annual Investment: {}",
        format_clp(cmp.initial_investment),
        format_clp(cmp.annual_investment)
    )?;
    writeln!(
        out,
        "Mutual Fund Future Value: {}",
        format_clp(cmp.mutual_fund.future_value)
    )?;
    writeln!(
        out,
        "Mutual Fund Total Cost: {}",
        format_clp(cmp.mutual_fund.total_cost)
    )?;
    writeln!(out, "ETF Future Value: {}", format_clp(cmp.etf.future_value))?;
    writeln!(out, "ETF Total Cost: {}", format_clp(cmp.etf.total_cost))?;
    writeln!(
        out,
        "ETF Dividends Tax Cost: {}",
        format_clp(cmp.etf.dividends_tax_cost)
    )?;

    if let Some(sale) = cmp.etf.sale {
        writeln!(out, "ETF Tax Cost: {}", format_clp(sale.tax_cost))?;
        writeln!(
            out,
            "ETF Future Value after Tax: {}",
            format_clp(sale.future_value_after_tax)
        )?;
    }
    if let Some(sale) = cmp.mutual_fund.sale {
        writeln!(out, "Mutual Fund Tax Cost: {}", format_clp(sale.tax_cost))?;
        writeln!(
            out,
            "Mutual Fund Future Value after Tax: {}",
            format_clp(sale.future_value_after_tax)
        )?;
    }
    Ok(())
}
