//! Period report
//!
//! Income and expense of a date range by category, with the largest
//! categories optionally cut to a top-N list and an optional text chart of
//! where the money went.

use crate::error::LedgerResult;
use crate::models::{DateRange, OperationType};
use crate::services::{AnalyticsService, CategoryTotal, PeriodAnalytics};
use crate::storage::UnitOfWork;

/// Width of a bar standing for the whole expense total
const CHART_WIDTH: usize = 40;

/// Category names are padded or cut to this many characters in the chart
const CHART_LABEL_WIDTH: usize = 15;

/// Analytics of a period, ready for display
#[derive(Debug, Clone)]
pub struct PeriodReport {
    pub analytics: PeriodAnalytics,
    /// Categories shown per type; `None` shows all of them
    pub top: Option<usize>,
    /// Append the expense distribution chart
    pub chart: bool,
}

impl PeriodReport {
    /// Generate the report for `range` in `currency`
    pub fn generate(
        store: &dyn UnitOfWork,
        range: &DateRange,
        currency: &str,
        top: Option<usize>,
    ) -> LedgerResult<Self> {
        let analytics = AnalyticsService::new(store).period_analytics(range, currency)?;
        Ok(Self {
            analytics,
            top,
            chart: false,
        })
    }

    pub fn with_chart(mut self, chart: bool) -> Self {
        self.chart = chart;
        self
    }

    fn rows(&self, operation_type: OperationType) -> Vec<&CategoryTotal> {
        let rows = self.analytics.categories_of(operation_type);
        match self.top {
            Some(limit) => rows.into_iter().take(limit).collect(),
            None => rows,
        }
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self) -> LedgerResult<String> {
        let analytics = &self.analytics;
        let mut output = String::new();

        output.push_str(&format!(
            "Period Report: {} ({})\n",
            analytics.range, analytics.currency
        ));
        output.push_str(&"=".repeat(64));
        output.push('\n');
        output.push_str(&format!(
            "Total Income:   {:>16}  ({} operations)\n",
            analytics.total_income.to_string(),
            analytics.income_count
        ));
        output.push_str(&format!(
            "Total Expense:  {:>16}  ({} operations)\n",
            analytics.total_expense.to_string(),
            analytics.expense_count
        ));
        output.push_str(&format!(
            "Net Income:     {:>16}\n",
            analytics.net_income()?.to_string()
        ));
        output.push_str(&format!(
            "Savings Rate:   {:>15.1}%\n",
            analytics.savings_rate()?
        ));

        if analytics.operation_count() == 0 {
            output.push_str("\nNo income or expenses in this period.\n");
            return Ok(output);
        }

        for (title, operation_type) in [
            ("INCOME", OperationType::Income),
            ("EXPENSES", OperationType::Expense),
        ] {
            let rows = self.rows(operation_type);
            if rows.is_empty() {
                continue;
            }

            output.push('\n');
            output.push_str(&format!(
                "{:<30} {:>16} {:>6} {:>8}\n",
                title, "Amount", "Count", "%"
            ));
            output.push_str(&"-".repeat(64));
            output.push('\n');
            for row in rows {
                output.push_str(&format!(
                    "  {:<28} {:>16} {:>6} {:>7.2}%\n",
                    row.category_name,
                    row.total.to_string(),
                    row.count,
                    row.percentage
                ));
            }
        }

        if self.chart {
            output.push_str(&self.expense_chart());
        }

        Ok(output)
    }

    /// One bar per expense category, as long as its share of all expenses
    pub fn expense_chart(&self) -> String {
        let expenses = self.analytics.categories_of(OperationType::Expense);
        if expenses.is_empty() {
            return String::new();
        }

        let mut output = String::from("\nEXPENSE DISTRIBUTION\n");
        output.push_str(&"-".repeat(64));
        output.push('\n');
        for row in expenses {
            let share = row.percentage.clamp(0.0, 100.0) / 100.0;
            let bar = "█".repeat((share * CHART_WIDTH as f64) as usize);
            let label: String = row.category_name.chars().take(CHART_LABEL_WIDTH).collect();
            output.push_str(&format!(
                "{:<width$} |{} {:.1}%\n",
                label,
                bar,
                row.percentage,
                width = CHART_LABEL_WIDTH
            ));
        }
        output
    }
}
