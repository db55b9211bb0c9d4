use analysis_core::{RankedList, Rating, StrategyKind, StrategyMetrics, StrategySignal};
use backtest_engine::{BacktestSummary, TrailingWindow};

use crate::DailyReport;

/// Rows shown per strategy table.
pub const REPORT_ROWS: usize = 15;

const CELL: &str = "padding:6px 8px;border:1px solid #e2e8f0;";
const HEAD: &str = "padding:6px 8px;border:1px solid #e2e8f0;background:#f1f5f9;text-align:left;";

pub struct ReportTemplate;

impl ReportTemplate {
    pub fn render(report: &DailyReport) -> String {
        let generated = report.generated_at.format("%Y-%m-%d %H:%M UTC");
        let universe = escape(&report.universe);
        let screened = report.symbols_screened;

        let buy_summary = report
            .lists()
            .iter()
            .map(|list| {
                format!(
                    r#"<p style="margin:4px 0;"><strong>{}:</strong> {} BUY recommendations</p>"#,
                    list.strategy,
                    list.buy_count()
                )
            })
            .collect::<String>();

        let leaders = report
            .lists()
            .iter()
            .filter_map(|list| list.leader().map(|leader| (list.strategy, leader)))
            .map(|(strategy, leader)| {
                format!(
                    r#"<p style="margin:4px 0;"><strong>{} leader:</strong> {} &mdash; &#8377;{:.2} (Score: {:.1}/100)</p>"#,
                    strategy,
                    escape(&leader.symbol),
                    leader.current_price,
                    leader.composite_score
                )
            })
            .collect::<String>();

        let tables = report.lists().iter().map(|list| strategy_table(list)).collect::<String>();
        let backtests = backtest_table(&report.backtests);

        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1">
<style>
  .strong-buy {{ background:#16a34a;color:#fff;font-weight:700; }}
  .buy {{ background:#dcfce7; }}
  .hold {{ background:#fef9c3; }}
  .sell {{ background:#fee2e2; }}
  .no-data {{ background:#f1f5f9;color:#64748b; }}
</style></head>
<body style="margin:0;padding:24px;background:#f8fafc;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;font-size:13px;color:#1e293b;">
<div style="background:#166534;color:#fff;padding:16px 20px;border-radius:8px;">
  <h1 style="margin:0;font-size:22px;">Value &amp; Momentum Screener</h1>
  <p style="margin:4px 0 0;">{universe} &middot; {generated}</p>
</div>
<div style="background:#fff;padding:12px 20px;margin:16px 0;border-left:4px solid #166534;">
  <h3 style="margin:0 0 8px;">Summary</h3>
  <p style="margin:4px 0;"><strong>Universe:</strong> {universe} ({screened} symbols screened)</p>
  {buy_summary}
</div>
<div style="background:#eff6ff;padding:12px 20px;margin:16px 0;border-left:4px solid #2563eb;">
  <h3 style="margin:0 0 8px;">Top picks</h3>
  {leaders}
</div>
{tables}
{backtests}
<div style="margin-top:24px;padding:12px 20px;background:#fff;font-size:11px;color:#64748b;">
  <p style="margin:4px 0;"><strong>Disclaimer:</strong> For educational purposes only. This is not investment advice.</p>
  <p style="margin:4px 0;">All trading involves risk and past performance does not guarantee future results. Verify prices before trading.</p>
  <p style="margin:4px 0;">Data: Yahoo Finance. Generated {generated}.</p>
</div>
</body>
</html>"#
        )
    }
}

fn strategy_table(list: &RankedList) -> String {
    let headers: &[&str] = match list.strategy {
        StrategyKind::TechnicalMomentum => &[
            "Rank", "Stock", "Price", "CMI", "1M Return%", "Tech Score", "Rating", "Target", "Stop Loss",
        ],
        StrategyKind::FundamentalValue => &[
            "Rank", "Stock", "Price", "PE", "ROE%", "Fund Score", "Rating", "Fair Value", "Stop Loss",
        ],
        StrategyKind::Hybrid => &[
            "Rank", "Stock", "Price", "Hybrid Score", "Tech", "Fund", "Rating", "Target", "Stop",
        ],
    };

    let head = headers
        .iter()
        .map(|h| format!(r#"<th style="{HEAD}">{h}</th>"#))
        .collect::<String>();

    let body = if list.is_empty() {
        format!(
            r#"<tr><td style="{CELL}" colspan="{}">No recommendations today</td></tr>"#,
            headers.len()
        )
    } else {
        list.signals
            .iter()
            .take(REPORT_ROWS)
            .enumerate()
            .map(|(i, signal)| signal_row(i + 1, signal))
            .collect::<String>()
    };

    format!(
        r#"<div style="margin:24px 0;">
<h3 style="color:#166534;border-bottom:2px solid #166534;padding-bottom:4px;">{}</h3>
<table style="width:100%;border-collapse:collapse;background:#fff;">
<tr>{head}</tr>
{body}
</table>
</div>"#,
        list.strategy
    )
}

fn signal_row(rank: usize, signal: &StrategySignal) -> String {
    let (a, b, c) = match &signal.metrics {
        StrategyMetrics::Technical { cmi, return_1m, .. } => (
            format!("{:.2}", cmi),
            format!("{:.2}%", return_1m),
            format!("{:.1}", signal.composite_score),
        ),
        StrategyMetrics::Value { pe_ratio, roe_pct, .. } => (
            format!("{:.2}", pe_ratio),
            format!("{:.2}%", roe_pct),
            format!("{:.1}", signal.composite_score),
        ),
        StrategyMetrics::Hybrid { technical_score, fundamental_score, .. } => (
            format!("{:.1}", signal.composite_score),
            format!("{:.1}", technical_score),
            format!("{:.1}", fundamental_score),
        ),
    };

    let cells = [
        rank.to_string(),
        format!("<strong>{}</strong>", escape(&signal.symbol)),
        format!("&#8377;{:.2}", signal.current_price),
        a,
        b,
        c,
        signal.rating.to_string(),
        format!("&#8377;{:.2}", signal.target_price),
        format!("&#8377;{:.2}", signal.stop_loss),
    ]
    .iter()
    .map(|cell| format!(r#"<td style="{CELL}">{cell}</td>"#))
    .collect::<String>();

    format!(r#"<tr class="{}">{}</tr>"#, rating_class(signal.rating), cells)
}

fn backtest_table(backtests: &[BacktestSummary]) -> String {
    if backtests.is_empty() {
        return String::new();
    }

    let head = std::iter::once("Strategy")
        .chain(TrailingWindow::ALL.iter().map(|w| w.label()))
        .map(|h| format!(r#"<th style="{HEAD}">{h}</th>"#))
        .collect::<String>();

    let rows = backtests
        .iter()
        .map(|summary| {
            let cells = TrailingWindow::ALL
                .iter()
                .map(|window| match summary.window(*window) {
                    Some(w) => format!(r#"<td style="{CELL}">{:.2}%</td>"#, w.mean_return),
                    None => format!(r#"<td style="{CELL}">N/A</td>"#),
                })
                .collect::<String>();
            format!(r#"<tr><td style="{CELL}">{}</td>{}</tr>"#, summary.strategy, cells)
        })
        .collect::<String>();

    format!(
        r#"<div style="margin:24px 0;">
<h3 style="color:#166534;border-bottom:2px solid #166534;padding-bottom:4px;">Trailing returns of current top picks</h3>
<table style="width:100%;border-collapse:collapse;background:#fff;">
<tr>{head}</tr>
{rows}
</table>
</div>"#
    )
}

fn rating_class(rating: Rating) -> &'static str {
    match rating {
        Rating::StrongBuy => "strong-buy",
        Rating::Buy => "buy",
        Rating::Hold => "hold",
        Rating::Sell => "sell",
        Rating::NoData => "no-data",
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
