use analysis_core::{
    finite, DividendRatios, EfficiencyRatios, FinancialSnapshot, FundamentalMetrics, GrowthRatios,
    LeverageRatios, LiquidityRatios, ProfitabilityRatios, ValuationRatios,
};

/// `numerator / denominator`, missing when either side is absent or the
/// denominator is zero.
fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    finite(n / d)
}

/// Period-over-period change as a fraction of the prior value.
fn growth(current: Option<f64>, prior: Option<f64>) -> Option<f64> {
    ratio(Some(current? - prior?), prior)
}

fn difference(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    finite(a? - b?)
}

fn calculate_valuation(s: &FinancialSnapshot, earnings_growth: Option<f64>) -> ValuationRatios {
    let market_cap = s.market_cap().and_then(finite);
    let book_value_per_share = ratio(s.total_equity, s.shares_outstanding);
    let enterprise_value = match (market_cap, s.total_debt, s.cash) {
        (Some(cap), Some(debt), Some(cash)) => finite(cap + debt - cash),
        _ => None,
    };
    let pe_ratio = ratio(s.share_price, s.eps);

    ValuationRatios {
        pe_ratio,
        forward_pe: ratio(s.share_price, s.forward_eps),
        pb_ratio: ratio(s.share_price, book_value_per_share),
        ps_ratio: ratio(market_cap, s.revenue),
        // Growth expressed in percent
        peg_ratio: ratio(pe_ratio, earnings_growth.map(|g| g * 100.0)),
        ev_ebitda: ratio(enterprise_value, s.ebitda),
        market_cap,
        enterprise_value,
    }
}

fn calculate_profitability(s: &FinancialSnapshot) -> ProfitabilityRatios {
    ProfitabilityRatios {
        roe: ratio(s.net_income, s.total_equity),
        roa: ratio(s.net_income, s.total_assets),
        gross_margin: ratio(difference(s.revenue, s.cogs()), s.revenue),
        operating_margin: ratio(s.operating_income, s.revenue),
        net_margin: ratio(s.net_income, s.revenue),
        ebitda_margin: ratio(s.ebitda, s.revenue),
    }
}

fn calculate_liquidity(s: &FinancialSnapshot) -> LiquidityRatios {
    LiquidityRatios {
        current_ratio: ratio(s.current_assets, s.current_liabilities),
        quick_ratio: ratio(difference(s.current_assets, s.inventory), s.current_liabilities),
        cash_ratio: ratio(s.cash, s.current_liabilities),
    }
}

fn calculate_leverage(s: &FinancialSnapshot) -> LeverageRatios {
    LeverageRatios {
        debt_to_equity: ratio(s.total_liabilities, s.total_equity),
        debt_to_assets: ratio(s.total_liabilities, s.total_assets),
        equity_ratio: ratio(s.total_equity, s.total_assets),
    }
}

fn calculate_efficiency(s: &FinancialSnapshot) -> EfficiencyRatios {
    EfficiencyRatios {
        asset_turnover: ratio(s.revenue, s.total_assets),
        inventory_turnover: ratio(s.cogs(), s.inventory),
        receivables_turnover: ratio(s.revenue, s.receivables),
    }
}

fn calculate_dividend(s: &FinancialSnapshot) -> DividendRatios {
    DividendRatios {
        dividend_rate: s.dividends_per_share.and_then(finite),
        dividend_yield: ratio(s.dividends_per_share, s.share_price),
        payout_ratio: ratio(s.dividends_per_share, s.eps),
        dividend_growth: growth(s.dividends_per_share, s.prior_dividends_per_share),
    }
}

/// Every ratio category for one snapshot. Ratios are fractions, so an ROE of
/// 0.2 means 20%.
pub fn compute_metrics(snapshot: &FinancialSnapshot) -> FundamentalMetrics {
    let growth = GrowthRatios {
        revenue_growth: growth(snapshot.revenue, snapshot.prior_revenue),
        earnings_growth: growth(snapshot.net_income, snapshot.prior_net_income),
    };

    FundamentalMetrics {
        valuation: calculate_valuation(snapshot, growth.earnings_growth),
        profitability: calculate_profitability(snapshot),
        liquidity: calculate_liquidity(snapshot),
        leverage: calculate_leverage(snapshot),
        growth,
        efficiency: calculate_efficiency(snapshot),
        dividend: calculate_dividend(snapshot),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(value: Option<f64>, expected: f64) {
        let value = value.unwrap_or_else(|| panic!("expected {}, got missing", expected));
        assert!((value - expected).abs() < 1e-9, "expected {}, got {}", expected, value);
    }

    fn full_snapshot() -> FinancialSnapshot {
        FinancialSnapshot {
            share_price: Some(50.0),
            shares_outstanding: Some(10.0),
            eps: Some(2.5),
            forward_eps: Some(3.125),
            revenue: Some(400.0),
            prior_revenue: Some(320.0),
            gross_profit: Some(160.0),
            operating_income: Some(80.0),
            net_income: Some(50.0),
            prior_net_income: Some(40.0),
            ebitda: Some(100.0),
            total_assets: Some(500.0),
            total_liabilities: Some(250.0),
            total_equity: Some(250.0),
            total_debt: Some(150.0),
            current_assets: Some(80.0),
            current_liabilities: Some(40.0),
            inventory: Some(20.0),
            receivables: Some(50.0),
            cash: Some(50.0),
            dividends_per_share: Some(1.0),
            prior_dividends_per_share: Some(0.8),
            ..Default::default()
        }
    }

    #[test]
    fn test_roe_from_net_income_and_equity() {
        let metrics = compute_metrics(&full_snapshot());
        approx(metrics.profitability.roe, 0.2);
    }

    #[test]
    fn test_missing_equity_only_affects_dependent_ratios() {
        let snapshot = FinancialSnapshot {
            total_equity: None,
            ..full_snapshot()
        };
        let metrics = compute_metrics(&snapshot);

        assert_eq!(metrics.profitability.roe, None);
        assert_eq!(metrics.valuation.pb_ratio, None);
        assert_eq!(metrics.leverage.debt_to_equity, None);
        approx(metrics.profitability.net_margin, 0.125);
        approx(metrics.profitability.roa, 0.1);
        approx(metrics.profitability.gross_margin, 0.4);
        approx(metrics.profitability.operating_margin, 0.2);
    }

    #[test]
    fn test_current_ratio_guarded_against_zero() {
        approx(compute_metrics(&full_snapshot()).liquidity.current_ratio, 2.0);

        let snapshot = FinancialSnapshot {
            current_liabilities: Some(0.0),
            ..full_snapshot()
        };
        let liquidity = compute_metrics(&snapshot).liquidity;
        assert_eq!(liquidity.current_ratio, None);
        assert_eq!(liquidity.quick_ratio, None);
        assert_eq!(liquidity.cash_ratio, None);
    }

    #[test]
    fn test_valuation_ratios() {
        let valuation = compute_metrics(&full_snapshot()).valuation;

        approx(valuation.pe_ratio, 20.0);
        approx(valuation.forward_pe, 16.0);
        approx(valuation.market_cap, 500.0);
        // book value per share 25
        approx(valuation.pb_ratio, 2.0);
        approx(valuation.ps_ratio, 1.25);
        approx(valuation.enterprise_value, 600.0);
        approx(valuation.ev_ebitda, 6.0);
        // earnings growth 25%
        approx(valuation.peg_ratio, 0.8);
    }

    #[test]
    fn test_remaining_categories() {
        let metrics = compute_metrics(&full_snapshot());

        approx(metrics.liquidity.quick_ratio, 1.5);
        approx(metrics.liquidity.cash_ratio, 1.25);
        approx(metrics.leverage.debt_to_equity, 1.0);
        approx(metrics.leverage.debt_to_assets, 0.5);
        approx(metrics.leverage.equity_ratio, 0.5);
        approx(metrics.growth.revenue_growth, 0.25);
        approx(metrics.growth.earnings_growth, 0.25);
        approx(metrics.efficiency.asset_turnover, 0.8);
        approx(metrics.efficiency.inventory_turnover, 12.0);
        approx(metrics.efficiency.receivables_turnover, 8.0);
        approx(metrics.profitability.ebitda_margin, 0.25);
        approx(metrics.dividend.dividend_rate, 1.0);
        approx(metrics.dividend.dividend_yield, 0.02);
        approx(metrics.dividend.payout_ratio, 0.4);
        approx(metrics.dividend.dividend_growth, 0.25);
    }

    #[test]
    fn test_dividend_rate_needs_no_price() {
        let snapshot = FinancialSnapshot {
            dividends_per_share: Some(2.4),
            ..Default::default()
        };
        let dividend = compute_metrics(&snapshot).dividend;
        approx(dividend.dividend_rate, 2.4);
        assert_eq!(dividend.dividend_yield, None);
        assert_eq!(dividend.payout_ratio, None);
    }

    #[test]
    fn test_empty_snapshot_is_all_missing() {
        let metrics = compute_metrics(&FinancialSnapshot::default());
        assert_eq!(metrics, FundamentalMetrics::default());
    }

    #[test]
    fn test_zero_growth_leaves_peg_missing() {
        let snapshot = FinancialSnapshot {
            prior_net_income: Some(50.0),
            ..full_snapshot()
        };
        let metrics = compute_metrics(&snapshot);
        approx(metrics.growth.earnings_growth, 0.0);
        assert_eq!(metrics.valuation.peg_ratio, None);
    }
}
