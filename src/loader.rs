use crate::error::{DashboardError, Result};
use crate::types::{DemandRecord, Keyed, RawDemandRow, RawUtilizationRow, UtilizationRecord};
use crate::util::{parse_f64_safe, parse_text};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use std::fs::File;
use std::path::{Path, PathBuf};

pub const UTILIZATION_COLUMNS: [&str; 6] = [
    "Line",
    "Month",
    "Month_y",
    "Quantity",
    "total_working_days",
    "daily_capacity",
];

pub const DEMAND_COLUMNS: [&str; 4] = ["Product", "Month", "Optimized Plan quantity", "Sale Demand"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Utilization,
    Demand,
}

impl DatasetKind {
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            DatasetKind::Utilization => &UTILIZATION_COLUMNS,
            DatasetKind::Demand => &DEMAND_COLUMNS,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DatasetKind::Utilization => "Line Utilization",
            DatasetKind::Demand => "Demand Fulfillment",
        }
    }
}

/// Supplies datasets by name. The dashboard only talks to this trait, so the
/// engine never sees where records come from.
pub trait DataSource {
    /// Dataset names of the given kind, sorted.
    fn list_datasets(&self, kind: DatasetKind) -> Result<Vec<String>>;

    fn load_utilization(&self, name: &str) -> Result<Vec<UtilizationRecord>>;

    fn load_demand(&self, name: &str) -> Result<Vec<DemandRecord>>;
}

/// CSV files in a single directory.
pub struct CsvDirectory {
    root: PathBuf,
}

impl CsvDirectory {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let path = self.root.join(name);
        if !path.is_file() {
            return Err(DashboardError::DatasetNotFound(path.display().to_string()));
        }
        Ok(path)
    }
}

impl DataSource for CsvDirectory {
    fn list_datasets(&self, kind: DatasetKind) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);
            if !is_csv || !path.is_file() {
                continue;
            }
            match detect_kind(&path) {
                Ok(Some(k)) if k == kind => {
                    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                        names.push(name.to_string());
                    }
                }
                Ok(other) => debug!("{}: classified as {:?}, skipped", path.display(), other),
                Err(e) => debug!("{}: unreadable header, skipped ({})", path.display(), e),
            }
        }
        names.sort();
        Ok(names)
    }

    fn load_utilization(&self, name: &str) -> Result<Vec<UtilizationRecord>> {
        load_utilization(self.resolve(name)?)
    }

    fn load_demand(&self, name: &str) -> Result<Vec<DemandRecord>> {
        load_demand(self.resolve(name)?)
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
    let rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_path(path)?;
    Ok(rdr)
}

fn check_columns(file: &str, headers: &StringRecord, kind: DatasetKind) -> Result<()> {
    for column in kind.required_columns() {
        if !headers.iter().any(|h| h == *column) {
            return Err(DashboardError::MissingColumn {
                file: file.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Classify a CSV file by its header row.
pub fn detect_kind<P: AsRef<Path>>(path: P) -> Result<Option<DatasetKind>> {
    let path = path.as_ref();
    let mut rdr = open_reader(path)?;
    let headers = rdr.headers()?;
    let file = path.display().to_string();
    let kind = [DatasetKind::Utilization, DatasetKind::Demand]
        .into_iter()
        .find(|k| check_columns(&file, headers, *k).is_ok());
    Ok(kind)
}

/// Validates one cell, attributing failures to the row and column.
struct RowCtx<'a> {
    file: &'a str,
    row: usize,
}

impl RowCtx<'_> {
    fn invalid(&self, field: &str, value: Option<&str>) -> DashboardError {
        DashboardError::InvalidValue {
            file: self.file.to_string(),
            row: self.row,
            field: field.to_string(),
            value: value.unwrap_or_default().to_string(),
        }
    }

    fn text(&self, field: &str, value: Option<String>) -> Result<String> {
        parse_text(value.as_deref()).ok_or_else(|| self.invalid(field, value.as_deref()))
    }

    fn quantity(&self, field: &str, value: Option<String>) -> Result<f64> {
        match parse_f64_safe(value.as_deref()) {
            Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
            _ => Err(self.invalid(field, value.as_deref())),
        }
    }
}

/// Load a utilization dataset. Fails on the first missing column or bad cell.
///
/// Row numbers in errors are file line numbers, the header being line 1.
pub fn load_utilization<P: AsRef<Path>>(path: P) -> Result<Vec<UtilizationRecord>> {
    let path = path.as_ref();
    let file = path.display().to_string();
    let mut rdr = open_reader(path)?;
    check_columns(&file, rdr.headers()?, DatasetKind::Utilization)?;

    let mut records = Vec::new();
    for (idx, result) in rdr.deserialize::<RawUtilizationRow>().enumerate() {
        let row = result?;
        let ctx = RowCtx { file: &file, row: idx + 2 };
        records.push(UtilizationRecord {
            line: ctx.text(UtilizationRecord::KEY_FIELD.column(), row.line)?,
            month: ctx.text("Month", row.month)?,
            month_label: ctx.text("Month_y", row.month_label)?,
            quantity: ctx.quantity("Quantity", row.quantity)?,
            total_working_days: ctx.quantity("total_working_days", row.total_working_days)?,
            daily_capacity: ctx.quantity("daily_capacity", row.daily_capacity)?,
        });
    }

    info!("Loaded {} utilization rows from {}", records.len(), file);
    Ok(records)
}

pub fn load_demand<P: AsRef<Path>>(path: P) -> Result<Vec<DemandRecord>> {
    let path = path.as_ref();
    let file = path.display().to_string();
    let mut rdr = open_reader(path)?;
    check_columns(&file, rdr.headers()?, DatasetKind::Demand)?;

    let mut records = Vec::new();
    for (idx, result) in rdr.deserialize::<RawDemandRow>().enumerate() {
        let row = result?;
        let ctx = RowCtx { file: &file, row: idx + 2 };
        records.push(DemandRecord {
            product: ctx.text(DemandRecord::KEY_FIELD.column(), row.product)?,
            month: ctx.text("Month", row.month)?,
            optimized_plan_quantity: ctx
                .quantity("Optimized Plan quantity", row.optimized_plan_quantity)?,
            sale_demand: ctx.quantity("Sale Demand", row.sale_demand)?,
        });
    }

    info!("Loaded {} demand rows from {}", records.len(), file);
    Ok(records)
}
