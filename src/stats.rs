//! Portfolio and sector aggregates over merged records.

use crate::types::{HoldingShare, MergedRecord, PortfolioStats, SectorSummary};
use crate::utils::percent_of;

pub fn portfolio_stats(records: &[MergedRecord]) -> PortfolioStats {
    let total_investment: f64 = records.iter().map(MergedRecord::investment).sum();
    let total_present_value: f64 = records.iter().map(MergedRecord::present_value).sum();
    let total_gain_loss = total_present_value - total_investment;
    PortfolioStats {
        total_investment,
        total_present_value,
        total_gain_loss,
        gain_loss_percent: percent_of(total_gain_loss, total_investment),
    }
}

/// Per-holding gain/loss, plus each holding's cost as a share of the whole portfolio's cost.
pub fn holding_shares(records: &[MergedRecord]) -> Vec<HoldingShare> {
    let total: f64 = records.iter().map(MergedRecord::investment).sum();
    records
        .iter()
        .map(|r| {
            let investment = r.investment();
            let present_value = r.present_value();
            let gain_loss = present_value - investment;
            HoldingShare {
                id: r.holding.id.clone(),
                symbol: r.holding.symbol.clone(),
                investment,
                present_value,
                gain_loss,
                gain_loss_percent: percent_of(gain_loss, investment),
                portfolio_percent: percent_of(investment, total),
            }
        })
        .collect()
}

/// One summary per sector, in order of first appearance.
pub fn sector_summaries(records: &[MergedRecord]) -> Vec<SectorSummary> {
    let mut out: Vec<SectorSummary> = Vec::new();
    for r in records {
        let idx = match out.iter().position(|s| s.sector == r.holding.sector) {
            Some(i) => i,
            None => {
                out.push(SectorSummary {
                    sector: r.holding.sector.clone(),
                    total_investment: 0.0,
                    total_present_value: 0.0,
                    gain_loss: 0.0,
                    gain_loss_percent: 0.0,
                });
                out.len() - 1
            }
        };
        let s = &mut out[idx];
        s.total_investment += r.investment();
        s.total_present_value += r.present_value();
    }
    for s in &mut out {
        s.gain_loss = s.total_present_value - s.total_investment;
        s.gain_loss_percent = percent_of(s.gain_loss, s.total_investment);
    }
    out
}
