// Interactive dashboard session.
//
// Flow per round:
// - pick an analysis type (line utilization / demand fulfillment),
// - pick a dataset of that kind from the data source,
// - pick a line, or a set of products (blank selects all),
// - pick the monthly or overall view and render it,
// - then go back to the analysis menu or exit.
//
// Load failures are shown to the operator and the round ends; the session
// itself only fails when the terminal can't be written to.
use crate::config::Config;
use crate::error::Result;
use crate::loader::{DataSource, DatasetKind};
use crate::output::{print_table, render_bars, write_csv, write_json};
use crate::reports::{
    distinct_keys, filter_by_group, filter_by_groups, overall_fulfillment, overall_utilization,
    summarize_fulfillment, summarize_utilization,
};
use crate::types::{
    DashboardSnapshot, DemandRecord, FulfillmentSummary, FulfillmentSummaryRow, Keyed,
    MonthlyDemandRow, MonthlyUtilizationRow, OverallTotals, UtilizationRecord,
    UtilizationSummary, UtilizationSummaryRow,
};
use crate::util::{format_int, format_number, format_pct};
use chrono::Utc;
use log::{debug, error};
use serde::Serialize;
use std::io::{BufRead, Write};

/// Whether the operator is still there.
enum Step {
    Continue,
    Eof,
}

enum Pick {
    Dataset(String),
    Nothing,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Monthly,
    Overall,
}

pub struct Session<'a, R, W, D> {
    input: R,
    out: W,
    source: &'a D,
    config: &'a Config,
}

impl<'a, R, W, D> Session<'a, R, W, D>
where
    R: BufRead,
    W: Write,
    D: DataSource,
{
    pub fn new(input: R, out: W, source: &'a D, config: &'a Config) -> Self {
        Self {
            input,
            out,
            source,
            config,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        writeln!(self.out, "Production Line Dashboard\n")?;
        loop {
            let Some(choice) = self.select(
                "Select Analysis Type:",
                &[DatasetKind::Utilization.label(), DatasetKind::Demand.label()],
            )?
            else {
                break;
            };
            let kind = if choice == 0 {
                DatasetKind::Utilization
            } else {
                DatasetKind::Demand
            };
            debug!("analysis selected: {}", kind.label());

            let step = match kind {
                DatasetKind::Utilization => self.utilization_round()?,
                DatasetKind::Demand => self.demand_round()?,
            };
            if let Step::Eof = step {
                break;
            }
            if !self.prompt_back_to_menu()? {
                break;
            }
        }
        writeln!(self.out, "Exiting the dashboard.")?;
        Ok(())
    }

    /// Read one trimmed line after printing `prompt`; `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(buf.trim().to_string()))
    }

    /// Numbered menu; returns the zero-based index of the chosen option.
    fn select<S: AsRef<str>>(&mut self, title: &str, options: &[S]) -> Result<Option<usize>> {
        writeln!(self.out, "{title}")?;
        for (i, opt) in options.iter().enumerate() {
            writeln!(self.out, "[{}] {}", i + 1, opt.as_ref())?;
        }
        writeln!(self.out)?;
        loop {
            let Some(resp) = self.read_line("Enter choice: ")? else {
                return Ok(None);
            };
            match resp.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => writeln!(
                    self.out,
                    "Invalid choice. Please enter a number between 1 and {}.",
                    options.len()
                )?,
            }
        }
    }

    fn prompt_back_to_menu(&mut self) -> Result<bool> {
        loop {
            let Some(resp) = self.read_line("Back to Analysis Selection (Y/N): ")? else {
                return Ok(false);
            };
            match resp.to_uppercase().as_str() {
                "Y" => {
                    writeln!(self.out)?;
                    return Ok(true);
                }
                "N" => return Ok(false),
                _ => writeln!(self.out, "Invalid choice. Please enter Y or N.")?,
            }
        }
    }

    fn select_view(&mut self, kind: DatasetKind) -> Result<Option<View>> {
        let options = match kind {
            DatasetKind::Utilization => ["Monthly Utilization", "Overall Utilization"],
            DatasetKind::Demand => ["Monthly Fulfillment", "Overall Fulfillment"],
        };
        let view = self.select("Select View:", &options)?.map(|i| {
            if i == 0 {
                View::Monthly
            } else {
                View::Overall
            }
        });
        Ok(view)
    }

    /// Lists datasets of `kind` and lets the operator pick one.
    fn select_dataset(&mut self, kind: DatasetKind) -> Result<Pick> {
        let datasets = match self.source.list_datasets(kind) {
            Ok(d) => d,
            Err(e) => {
                error!("Listing datasets failed: {e}");
                writeln!(self.out, "Failed to list datasets: {e}\n")?;
                return Ok(Pick::Nothing);
            }
        };
        if datasets.is_empty() {
            writeln!(self.out, "No {} datasets available.\n", kind.label())?;
            return Ok(Pick::Nothing);
        }
        match self.select("Select Data File:", &datasets)? {
            Some(i) => Ok(Pick::Dataset(datasets[i].clone())),
            None => Ok(Pick::Eof),
        }
    }

    fn utilization_round(&mut self) -> Result<Step> {
        let name = match self.select_dataset(DatasetKind::Utilization)? {
            Pick::Dataset(name) => name,
            Pick::Nothing => return Ok(Step::Continue),
            Pick::Eof => return Ok(Step::Eof),
        };
        let records = match self.source.load_utilization(&name) {
            Ok(records) => {
                writeln!(
                    self.out,
                    "Loaded {} ({} rows)\n",
                    name,
                    format_int(records.len())
                )?;
                records
            }
            Err(e) => {
                error!("Loading {name} failed: {e}");
                writeln!(self.out, "Failed to load file: {e}\n")?;
                return Ok(Step::Continue);
            }
        };

        let lines = distinct_keys(&records);
        if lines.is_empty() {
            writeln!(self.out, "{name} has no rows.\n")?;
            return Ok(Step::Continue);
        }
        let title = UtilizationRecord::KEY_FIELD.selection_title();
        let Some(idx) = self.select(title, &lines)? else {
            return Ok(Step::Eof);
        };
        let line = &lines[idx];
        debug!("line selected: {line}");

        match self.select_view(DatasetKind::Utilization)? {
            Some(View::Monthly) => self.show_monthly_utilization(&records, line)?,
            Some(View::Overall) => self.show_overall_utilization(&name, &records)?,
            None => return Ok(Step::Eof),
        }
        Ok(Step::Continue)
    }

    fn demand_round(&mut self) -> Result<Step> {
        let name = match self.select_dataset(DatasetKind::Demand)? {
            Pick::Dataset(name) => name,
            Pick::Nothing => return Ok(Step::Continue),
            Pick::Eof => return Ok(Step::Eof),
        };
        let records = match self.source.load_demand(&name) {
            Ok(records) => {
                writeln!(
                    self.out,
                    "Loaded {} ({} rows)\n",
                    name,
                    format_int(records.len())
                )?;
                records
            }
            Err(e) => {
                error!("Loading {name} failed: {e}");
                writeln!(self.out, "Failed to load file: {e}\n")?;
                return Ok(Step::Continue);
            }
        };

        let products = distinct_keys(&records);
        if products.is_empty() {
            writeln!(self.out, "{name} has no rows.\n")?;
            return Ok(Step::Continue);
        }
        let Some(selected) = self.select_products(&products)? else {
            return Ok(Step::Eof);
        };
        debug!("products selected: {selected:?}");

        match self.select_view(DatasetKind::Demand)? {
            Some(View::Monthly) => self.show_monthly_demand(&records, &selected)?,
            Some(View::Overall) => self.show_overall_fulfillment(&name, &records)?,
            None => return Ok(Step::Eof),
        }
        Ok(Step::Continue)
    }

    /// Multi-select over `products`; blank input keeps every product.
    fn select_products(&mut self, products: &[String]) -> Result<Option<Vec<String>>> {
        writeln!(self.out, "{}", DemandRecord::KEY_FIELD.selection_title())?;
        for (i, p) in products.iter().enumerate() {
            writeln!(self.out, "[{}] {}", i + 1, p)?;
        }
        writeln!(self.out)?;
        loop {
            let Some(resp) =
                self.read_line("Enter product numbers (comma-separated, blank for all): ")?
            else {
                return Ok(None);
            };
            match parse_multi_select(&resp, products.len()) {
                Some(indices) => {
                    return Ok(Some(indices.into_iter().map(|i| products[i].clone()).collect()))
                }
                None => writeln!(
                    self.out,
                    "Invalid selection. Use numbers between 1 and {} separated by commas.",
                    products.len()
                )?,
            }
        }
    }

    fn show_monthly_utilization(&mut self, records: &[UtilizationRecord], line: &str) -> Result<()> {
        let filtered = filter_by_group(records, line);
        let decimals = self.config.decimals;
        writeln!(self.out, "Utilization Percentage for {line}\n")?;
        let series: Vec<(String, Option<f64>)> = filtered
            .iter()
            .map(|r| (r.month_label.clone(), r.utilization_pct()))
            .collect();
        writeln!(
            self.out,
            "{}\n",
            render_bars(&series, self.config.chart_width, decimals)
        )?;
        writeln!(self.out, "## Data Table\n")?;
        print_table(&mut self.out, &monthly_utilization_rows(&filtered, decimals))
    }

    fn show_monthly_demand(&mut self, records: &[DemandRecord], products: &[String]) -> Result<()> {
        let filtered = filter_by_groups(records, products);
        let decimals = self.config.decimals;
        writeln!(
            self.out,
            "Monthly Demand Fulfillment ({})\n",
            products.join(", ")
        )?;
        let mut series: Vec<(String, Option<f64>)> = Vec::with_capacity(filtered.len() * 2);
        for r in &filtered {
            series.push((
                format!("{} {} plan", r.month, r.product),
                Some(r.optimized_plan_quantity),
            ));
            series.push((
                format!("{} {} demand", r.month, r.product),
                Some(r.sale_demand),
            ));
        }
        writeln!(
            self.out,
            "{}\n",
            render_bars(&series, self.config.chart_width, decimals)
        )?;
        writeln!(self.out, "## Data Table\n")?;
        print_table(&mut self.out, &monthly_demand_rows(&filtered, decimals))
    }

    fn show_overall_utilization(&mut self, dataset: &str, records: &[UtilizationRecord]) -> Result<()> {
        let summaries = summarize_utilization(records);
        let totals = overall_utilization(&summaries);
        let rows = utilization_summary_rows(&summaries, self.config.decimals);
        writeln!(self.out, "## Overall Utilization\n")?;
        print_table(&mut self.out, &rows)?;
        writeln!(
            self.out,
            "All lines: production {} / capacity {} = {}%\n",
            format_number(totals.numerator, self.config.decimals),
            format_number(totals.denominator, self.config.decimals),
            format_pct(totals.pct, self.config.decimals)
        )?;
        self.export("utilization", dataset, &rows, summaries, totals)
    }

    fn show_overall_fulfillment(&mut self, dataset: &str, records: &[DemandRecord]) -> Result<()> {
        let summaries = summarize_fulfillment(records);
        let totals = overall_fulfillment(&summaries);
        let rows = fulfillment_summary_rows(&summaries, self.config.decimals);
        writeln!(self.out, "## Overall Demand Fulfillment\n")?;
        print_table(&mut self.out, &rows)?;
        writeln!(
            self.out,
            "All products: plan {} / demand {} = {}%\n",
            format_number(totals.numerator, self.config.decimals),
            format_number(totals.denominator, self.config.decimals),
            format_pct(totals.pct, self.config.decimals)
        )?;
        self.export("fulfillment", dataset, &rows, summaries, totals)
    }

    /// Writes `<analysis>_summary.csv` and `<analysis>_summary.json`. Write
    /// failures are reported but don't end the session.
    fn export<Row, S>(
        &mut self,
        analysis: &str,
        dataset: &str,
        rows: &[Row],
        groups: Vec<S>,
        totals: OverallTotals,
    ) -> Result<()>
    where
        Row: Serialize,
        S: Serialize,
    {
        if !self.config.export {
            return Ok(());
        }
        let csv_path = self.config.output_dir.join(format!("{analysis}_summary.csv"));
        let json_path = self.config.output_dir.join(format!("{analysis}_summary.json"));
        let snapshot = DashboardSnapshot {
            analysis: analysis.to_string(),
            dataset: dataset.to_string(),
            generated_at: Utc::now(),
            groups,
            totals,
        };
        let result = write_csv(&csv_path, rows).and_then(|_| write_json(&json_path, &snapshot));
        match result {
            Ok(()) => writeln!(
                self.out,
                "(Full table exported to {} and {})\n",
                csv_path.display(),
                json_path.display()
            )?,
            Err(e) => {
                error!("Export failed: {e}");
                writeln!(self.out, "Write error: {e}\n")?;
            }
        }
        Ok(())
    }
}

/// Parses `"1, 3"` into zero-based indices, keeping input order and dropping
/// repeats. Blank selects everything. `None` on any out-of-range or
/// non-numeric entry.
fn parse_multi_select(input: &str, len: usize) -> Option<Vec<usize>> {
    if input.trim().is_empty() {
        return Some((0..len).collect());
    }
    let mut picked: Vec<usize> = Vec::new();
    for part in input.split(',') {
        let n: usize = part.trim().parse().ok()?;
        if n == 0 || n > len {
            return None;
        }
        if !picked.contains(&(n - 1)) {
            picked.push(n - 1);
        }
    }
    Some(picked)
}

pub fn utilization_summary_rows(
    summaries: &[UtilizationSummary],
    decimals: usize,
) -> Vec<UtilizationSummaryRow> {
    summaries
        .iter()
        .map(|s| UtilizationSummaryRow {
            line: s.line.clone(),
            total_production: format_number(s.total_production, decimals),
            total_capacity: format_number(s.total_capacity, decimals),
            utilization_pct: format_pct(s.utilization_pct, decimals),
        })
        .collect()
}

pub fn fulfillment_summary_rows(
    summaries: &[FulfillmentSummary],
    decimals: usize,
) -> Vec<FulfillmentSummaryRow> {
    summaries
        .iter()
        .map(|s| FulfillmentSummaryRow {
            product: s.product.clone(),
            total_plan: format_number(s.total_plan, decimals),
            total_demand: format_number(s.total_demand, decimals),
            fulfillment_pct: format_pct(s.fulfillment_pct, decimals),
        })
        .collect()
}

fn monthly_utilization_rows(
    records: &[UtilizationRecord],
    decimals: usize,
) -> Vec<MonthlyUtilizationRow> {
    records
        .iter()
        .map(|r| MonthlyUtilizationRow {
            line: r.line.clone(),
            month: r.month.clone(),
            month_label: r.month_label.clone(),
            quantity: format_number(r.quantity, decimals),
            total_working_days: format_number(r.total_working_days, decimals),
            daily_capacity: format_number(r.daily_capacity, decimals),
            utilization_pct: format_pct(r.utilization_pct(), decimals),
        })
        .collect()
}

fn monthly_demand_rows(records: &[DemandRecord], decimals: usize) -> Vec<MonthlyDemandRow> {
    records
        .iter()
        .map(|r| MonthlyDemandRow {
            product: r.product.clone(),
            month: r.month.clone(),
            optimized_plan_quantity: format_number(r.optimized_plan_quantity, decimals),
            sale_demand: format_number(r.sale_demand, decimals),
            fulfillment_pct: format_pct(r.fulfillment_pct(), decimals),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use std::io::Cursor;

    struct StaticSource {
        utilization: Vec<UtilizationRecord>,
    }

    impl DataSource for StaticSource {
        fn list_datasets(&self, kind: DatasetKind) -> Result<Vec<String>> {
            Ok(match kind {
                DatasetKind::Utilization => vec!["line_utilization.csv".to_string()],
                DatasetKind::Demand => vec!["demand_fulfilment.csv".to_string()],
            })
        }

        fn load_utilization(&self, name: &str) -> Result<Vec<UtilizationRecord>> {
            if name != "line_utilization.csv" {
                return Err(DashboardError::DatasetNotFound(name.to_string()));
            }
            Ok(self.utilization.clone())
        }

        fn load_demand(&self, _name: &str) -> Result<Vec<DemandRecord>> {
            Err(DashboardError::MissingColumn {
                file: "demand_fulfilment.csv".to_string(),
                column: "Sale Demand".to_string(),
            })
        }
    }

    fn source() -> StaticSource {
        let rec = |line: &str, label: &str, q: f64, days: f64| UtilizationRecord {
            line: line.to_string(),
            month: label.to_string(),
            month_label: label.to_string(),
            quantity: q,
            total_working_days: days,
            daily_capacity: 5.0,
        };
        StaticSource {
            utilization: vec![
                rec("L1", "Jan", 80.0, 20.0),
                rec("L2", "Jan", 10.0, 0.0),
                rec("L1", "Feb", 40.0, 10.0),
            ],
        }
    }

    fn run_session(input: &str) -> String {
        let src = source();
        let config = Config {
            export: false,
            decimals: 0,
            ..Config::default()
        };
        let mut out = Vec::new();
        Session::new(Cursor::new(input.to_string()), &mut out, &src, &config)
            .run()
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn overall_utilization_view() {
        let out = run_session("1\n1\n1\n2\nN\n");
        assert!(out.contains("## Overall Utilization"));
        let row = |key: &str| {
            out.lines()
                .find(|l| l.starts_with(&format!("| {key} ")))
                .unwrap_or_default()
                .to_string()
        };
        let l1 = row("L1");
        assert!(l1.contains("| 120 ") && l1.contains("| 150 ") && l1.contains("| 80 "));
        let l2 = row("L2");
        assert!(l2.contains("| 0 ") && l2.contains("| n/a "));
        assert!(out.contains("All lines: production 130 / capacity 150 = 87%"));
        assert!(out.ends_with("Exiting the dashboard.\n"));
    }

    #[test]
    fn monthly_utilization_view() {
        let out = run_session("1\n1\n1\n1\nN\n");
        assert!(out.contains("Select Line Number:\n[1] L1\n[2] L2\n"));
        assert!(out.contains("Utilization Percentage for L1"));
        assert!(out.contains("## Data Table"));
        assert!(out.contains("Jan |"));
        assert!(out.contains("Feb |"));
    }

    #[test]
    fn invalid_choices_reprompt() {
        let out = run_session("7\nabc\n1\n1\n2\n1\nmaybe\nN\n");
        assert!(out.contains("Invalid choice. Please enter a number between 1 and 2."));
        assert!(out.contains("Utilization Percentage for L2"));
        assert!(out.contains("Invalid choice. Please enter Y or N."));
    }

    #[test]
    fn load_errors_are_displayed_not_fatal() {
        let out = run_session("2\n1\nY\n1\n1\n1\n2\n");
        assert!(out.contains("Failed to load file: demand_fulfilment.csv: missing required column 'Sale Demand'"));
        assert!(out.contains("## Overall Utilization"));
    }

    #[test]
    fn end_of_input_exits_cleanly() {
        let out = run_session("1\n");
        assert!(out.ends_with("Exiting the dashboard.\n"));
    }

    #[test]
    fn multi_select_parsing() {
        assert_eq!(parse_multi_select("", 3), Some(vec![0, 1, 2]));
        assert_eq!(parse_multi_select("3, 1,3", 3), Some(vec![2, 0]));
        assert_eq!(parse_multi_select("4", 3), None);
        assert_eq!(parse_multi_select("0", 3), None);
        assert_eq!(parse_multi_select("a", 3), None);
    }

    #[test]
    fn summary_rows_round_for_display() {
        let rows = fulfillment_summary_rows(
            &[FulfillmentSummary {
                product: "P1".to_string(),
                total_plan: 100.0,
                total_demand: 150.0,
                fulfillment_pct: Some(200.0 / 3.0),
            }],
            2,
        );
        assert_eq!(rows[0].fulfillment_pct, "66.67");
        assert_eq!(rows[0].total_demand, "150.00");
    }
}
