use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info};

use super::coerce::SymbolSet;
use super::record::{EntryDate, RawTradeRow, TradeRecord};
use crate::types::*;
use crate::CalibrationResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Calibration metrics derived from a trade log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub success: bool,
    /// winning / (winning + losing)
    pub historical_win_rate: Rate,
    pub historical_avg_investment_per_op: Money,
    /// Counted trades per distinct calendar month with a dated trade
    pub historical_avg_trades_per_month: Decimal,
    /// Average winning profit as a fraction of average investment
    pub suggested_roi_target_percent: Rate,
    /// Average loss magnitude as a fraction of average investment
    pub suggested_loss_per_failed_op_percent: Rate,
    pub years: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalPerformanceInput {
    pub trades: Vec<RawTradeRow>,
    /// Overrides the default symbol set (€ $ £ ¥)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_symbols: Option<Vec<String>>,
}

#[derive(Debug, Default)]
struct Totals {
    invested: Money,
    trade_count: u64,
    gross_profit: Money,
    gross_loss: Money,
    winning: u64,
    losing: u64,
    years: BTreeSet<i32>,
    months: BTreeSet<(i32, u32)>,
}

impl Totals {
    fn add(&mut self, trade: &TradeRecord) {
        self.invested = self.invested.saturating_add(trade.investment);
        self.trade_count += 1;

        if let Some(d) = trade.date_in.date() {
            self.years.insert(d.year());
            self.months.insert((d.year(), d.month()));
        }

        // A flat trade (result == 0) is a win.
        if trade.result >= Decimal::ZERO {
            self.winning += 1;
            self.gross_profit = self.gross_profit.saturating_add(trade.result);
        } else {
            self.losing += 1;
            self.gross_loss = self.gross_loss.saturating_add(trade.result.abs());
        }
    }

    fn derive(self) -> AggregationResult {
        let counted = self.winning + self.losing;
        let avg_investment = ratio(self.invested, Decimal::from(self.trade_count));
        let avg_trades_per_month =
            ratio(Decimal::from(counted), Decimal::from(self.months.len() as u64));
        let avg_win = ratio(self.gross_profit, Decimal::from(self.winning));
        let avg_loss = ratio(self.gross_loss, Decimal::from(self.losing));
        let win_rate = ratio(Decimal::from(self.winning), Decimal::from(counted));

        let roi_target = if self.winning > 0 && avg_investment > Decimal::ZERO {
            ratio(avg_win, avg_investment)
        } else {
            Decimal::ZERO
        };
        let loss_per_failed_op = if self.losing > 0 && avg_investment > Decimal::ZERO {
            ratio(avg_loss, avg_investment)
        } else {
            Decimal::ZERO
        };

        AggregationResult {
            success: true,
            historical_win_rate: win_rate,
            historical_avg_investment_per_op: avg_investment,
            historical_avg_trades_per_month: avg_trades_per_month,
            suggested_roi_target_percent: roi_target,
            suggested_loss_per_failed_op_percent: loss_per_failed_op,
            years: self.years.into_iter().collect(),
        }
    }
}

/// Zero when the denominator is zero or the quotient is out of range.
fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fold a trade log into calibration metrics in a single pass.
///
/// Trades without an entry date are skipped. Trades whose date cannot be
/// parsed still count toward money totals and win/loss counts but not toward
/// the year and month sets.
pub fn aggregate(trades: &[TradeRecord]) -> AggregationResult {
    let mut totals = Totals::default();
    for trade in trades.iter().filter(|t| t.date_in.is_admitted()) {
        totals.add(trade);
    }
    totals.derive()
}

/// Coerce raw rows into typed records.
pub fn normalize_trades(rows: &[RawTradeRow], symbols: &SymbolSet) -> Vec<TradeRecord> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let record = TradeRecord::from_raw(row, symbols);
            match &record.date_in {
                EntryDate::Missing => debug!(row = idx, "skipping trade without entry date"),
                EntryDate::Unparseable(raw) => {
                    debug!(row = idx, date_in = %raw, "entry date not parseable")
                }
                EntryDate::Date(_) => {}
            }
            record
        })
        .collect()
}

/// Coerce the rows of a trade log using its configured symbol set.
pub fn normalize_trade_log(
    input: &HistoricalPerformanceInput,
) -> CalibrationResult<Vec<TradeRecord>> {
    let symbols = resolve_symbols(input.currency_symbols.as_deref())?;
    Ok(normalize_trades(&input.trades, &symbols))
}

/// Compute historical performance averages for a raw trade log.
pub fn compute_historical_performance(
    input: &HistoricalPerformanceInput,
) -> CalibrationResult<ComputationOutput<AggregationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let symbols = resolve_symbols(input.currency_symbols.as_deref())?;
    let records = normalize_trades(&input.trades, &symbols);

    let skipped = records
        .iter()
        .filter(|r| r.date_in == EntryDate::Missing)
        .count();
    let undated = records
        .iter()
        .filter(|r| matches!(r.date_in, EntryDate::Unparseable(_)))
        .count();
    let counted = records.len() - skipped;

    if skipped > 0 {
        warnings.push(format!(
            "{} row(s) without an entry date were skipped",
            skipped
        ));
    }
    if undated > 0 {
        warnings.push(format!(
            "{} trade(s) have an unparseable entry date and are excluded from monthly frequency",
            undated
        ));
    }
    if counted == 0 {
        warnings.push("No dated trades found; all metrics are zero".into());
    }

    let result = aggregate(&records);

    info!(
        rows = records.len(),
        counted,
        skipped,
        undated,
        win_rate = %result.historical_win_rate,
        "historical performance computed"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Historical Performance Averages — Trade Log Calibration",
        &serde_json::json!({
            "rows": records.len(),
            "counted_trades": counted,
            "currency_symbols": symbols.symbols(),
            "zero_result_classification": "win",
        }),
        warnings,
        elapsed,
        result,
    ))
}

fn resolve_symbols(symbols: Option<&[String]>) -> CalibrationResult<SymbolSet> {
    match symbols {
        Some(list) => SymbolSet::new(list.iter().cloned()),
        None => Ok(SymbolSet::default()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
