//! CLI command handler for the period report

use crate::error::LedgerResult;
use crate::ledger::Ledger;
use crate::models::DateRange;
use crate::reports::PeriodReport;

use super::date_range;

/// What the report command was asked to show
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportOptions<'a> {
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
    pub top: Option<usize>,
    pub currency: Option<&'a str>,
    pub chart: bool,
    pub averages: bool,
}

/// Handle the report command
///
/// Without dates the report covers the current month.
pub fn handle_report_command(ledger: &Ledger, options: ReportOptions<'_>) -> LedgerResult<()> {
    let range = date_range(options.from, options.to)?;
    let currency = options.currency.unwrap_or(ledger.default_currency());

    let report = PeriodReport::generate(ledger.context().store(), &range, currency, options.top)?
        .with_chart(options.chart);
    print!("{}", report.format_terminal()?);

    if options.averages {
        let analytics = ledger.analytics();
        let year = DateRange::this_year();
        println!();
        println!("Monthly average this year");
        println!(
            "  Income:       {:>16}",
            analytics.average_monthly_income(&year, currency)?.to_string()
        );
        println!(
            "  Expense:      {:>16}",
            analytics.average_monthly_expense(&year, currency)?.to_string()
        );
    }
    Ok(())
}
