use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Raw utilization row as read from CSV. Every field stays textual until the
/// loader validates it.
#[derive(Debug, Deserialize)]
pub struct RawUtilizationRow {
    #[serde(rename = "Line")]
    pub line: Option<String>,
    #[serde(rename = "Month")]
    pub month: Option<String>,
    #[serde(rename = "Month_y")]
    pub month_label: Option<String>,
    #[serde(rename = "Quantity")]
    pub quantity: Option<String>,
    #[serde(rename = "total_working_days")]
    pub total_working_days: Option<String>,
    #[serde(rename = "daily_capacity")]
    pub daily_capacity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawDemandRow {
    #[serde(rename = "Product")]
    pub product: Option<String>,
    #[serde(rename = "Month")]
    pub month: Option<String>,
    #[serde(rename = "Optimized Plan quantity")]
    pub optimized_plan_quantity: Option<String>,
    #[serde(rename = "Sale Demand")]
    pub sale_demand: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationRecord {
    #[serde(rename = "Line")]
    pub line: String,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Month_y")]
    pub month_label: String,
    #[serde(rename = "Quantity")]
    pub quantity: f64,
    #[serde(rename = "total_working_days")]
    pub total_working_days: f64,
    #[serde(rename = "daily_capacity")]
    pub daily_capacity: f64,
}

impl UtilizationRecord {
    /// Theoretical output for the record's period.
    pub fn capacity(&self) -> f64 {
        self.total_working_days * self.daily_capacity
    }

    /// Utilization of this single period, `None` when the period has no capacity.
    pub fn utilization_pct(&self) -> Option<f64> {
        ratio_pct(self.quantity, self.capacity())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandRecord {
    #[serde(rename = "Product")]
    pub product: String,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Optimized Plan quantity")]
    pub optimized_plan_quantity: f64,
    #[serde(rename = "Sale Demand")]
    pub sale_demand: f64,
}

impl DemandRecord {
    pub fn fulfillment_pct(&self) -> Option<f64> {
        ratio_pct(self.optimized_plan_quantity, self.sale_demand)
    }
}

/// `100 * numerator / denominator`, or `None` when the denominator is zero.
pub fn ratio_pct(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let pct = numerator / denominator * 100.0;
    pct.is_finite().then_some(pct)
}

/// Column a dataset is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyField {
    Line,
    Product,
}

impl KeyField {
    pub fn column(&self) -> &'static str {
        match self {
            KeyField::Line => "Line",
            KeyField::Product => "Product",
        }
    }

    /// Menu title for picking key values.
    pub fn selection_title(&self) -> &'static str {
        match self {
            KeyField::Line => "Select Line Number:",
            KeyField::Product => "Select Product(s):",
        }
    }
}

/// Records that can be grouped by a key column.
pub trait Keyed {
    const KEY_FIELD: KeyField;

    fn group_key(&self) -> &str;
}

impl Keyed for UtilizationRecord {
    const KEY_FIELD: KeyField = KeyField::Line;

    fn group_key(&self) -> &str {
        &self.line
    }
}

impl Keyed for DemandRecord {
    const KEY_FIELD: KeyField = KeyField::Product;

    fn group_key(&self) -> &str {
        &self.product
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationSummary {
    pub line: String,
    pub total_production: f64,
    pub total_capacity: f64,
    pub utilization_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FulfillmentSummary {
    pub product: String,
    pub total_plan: f64,
    pub total_demand: f64,
    pub fulfillment_pct: Option<f64>,
}

/// Grand totals across every group of an overall view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallTotals {
    pub groups: usize,
    pub numerator: f64,
    pub denominator: f64,
    pub pct: Option<f64>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct UtilizationSummaryRow {
    #[serde(rename = "Line")]
    #[tabled(rename = "Line")]
    pub line: String,
    #[serde(rename = "Total Production")]
    #[tabled(rename = "Total Production")]
    pub total_production: String,
    #[serde(rename = "Total Capacity")]
    #[tabled(rename = "Total Capacity")]
    pub total_capacity: String,
    #[serde(rename = "Overall Utilization Percentage")]
    #[tabled(rename = "Overall Utilization Percentage")]
    pub utilization_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FulfillmentSummaryRow {
    #[serde(rename = "Product")]
    #[tabled(rename = "Product")]
    pub product: String,
    #[serde(rename = "Total Optimized Plan")]
    #[tabled(rename = "Total Optimized Plan")]
    pub total_plan: String,
    #[serde(rename = "Total Demand")]
    #[tabled(rename = "Total Demand")]
    pub total_demand: String,
    #[serde(rename = "Fulfillment Percentage")]
    #[tabled(rename = "Fulfillment Percentage")]
    pub fulfillment_pct: String,
}

#[derive(Debug, Tabled, Clone)]
pub struct MonthlyUtilizationRow {
    #[tabled(rename = "Line")]
    pub line: String,
    #[tabled(rename = "Month")]
    pub month: String,
    #[tabled(rename = "Month_y")]
    pub month_label: String,
    #[tabled(rename = "Quantity")]
    pub quantity: String,
    #[tabled(rename = "total_working_days")]
    pub total_working_days: String,
    #[tabled(rename = "daily_capacity")]
    pub daily_capacity: String,
    #[tabled(rename = "Utilization Percentage")]
    pub utilization_pct: String,
}

#[derive(Debug, Tabled, Clone)]
pub struct MonthlyDemandRow {
    #[tabled(rename = "Product")]
    pub product: String,
    #[tabled(rename = "Month")]
    pub month: String,
    #[tabled(rename = "Optimized Plan quantity")]
    pub optimized_plan_quantity: String,
    #[tabled(rename = "Sale Demand")]
    pub sale_demand: String,
    #[tabled(rename = "Fulfillment Percentage")]
    pub fulfillment_pct: String,
}

/// JSON export of one overall view.
#[derive(Debug, Serialize)]
pub struct DashboardSnapshot<T: Serialize> {
    pub analysis: String,
    pub dataset: String,
    pub generated_at: DateTime<Utc>,
    pub groups: Vec<T>,
    pub totals: OverallTotals,
}
