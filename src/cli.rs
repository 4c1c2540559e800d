use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::advisory::DEFAULT_MODEL;
use crate::ahsp::{DEFAULT_OVERHEAD_PCT, DEFAULT_TAX_PCT, is_numeric_text, normalize_number};

#[derive(Parser, Debug)]
#[command(
    name = "ahsp",
    version,
    about = "AHSP unit-price extraction and RAB cost roll-up"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan an analysis spreadsheet into a work-item catalog.
    Extract(ExtractArgs),
    /// List catalog work items or show one of them.
    Catalog(CatalogArgs),
    /// Price a work item at a volume and add it to the project bill.
    Add(AddArgs),
    /// Show, export or reset the project bill of quantities.
    Boq(BoqArgs),
    /// Report catalog manifest and project store state.
    Status(StatusArgs),
    /// Ask a construction cost expert persona.
    Advise(AdviseArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long, default_value = ".cache/ahsp")]
    pub cache_root: PathBuf,

    /// CSV or spreadsheet (xlsx, xls, ods) holding the analysis tables.
    #[arg(long)]
    pub source: PathBuf,

    #[arg(long, value_enum, default_value_t = Layout::Auto)]
    pub layout: Layout,

    /// Read only these sheets; recap sheets are skipped otherwise.
    #[arg(long = "sheet")]
    pub sheets: Vec<String>,

    #[arg(long)]
    pub catalog_path: Option<PathBuf>,

    /// Also write the catalog as a flat master CSV.
    #[arg(long)]
    pub master_csv: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Layout {
    Auto,
    Analysis,
    Master,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Analysis => "analysis",
            Self::Master => "master",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Preset {
    Sda,
    CiptaKarya,
    BinaMarga,
}

impl Preset {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sda => "sda",
            Self::CiptaKarya => "cipta-karya",
            Self::BinaMarga => "bina-marga",
        }
    }
}

/// Where a command reads its catalog from: the extracted catalog file, or a
/// bundled preset.
#[derive(Args, Debug, Clone)]
pub struct CatalogSourceArgs {
    #[arg(long, default_value = ".cache/ahsp")]
    pub cache_root: PathBuf,

    #[arg(long, conflicts_with = "preset")]
    pub catalog_path: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub preset: Option<Preset>,
}

#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    #[command(flatten)]
    pub source: CatalogSourceArgs,

    /// Show a single work item instead of the list.
    #[arg(long)]
    pub code: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[command(flatten)]
    pub source: CatalogSourceArgs,

    #[arg(long)]
    pub code: String,

    #[arg(long)]
    pub volume: f64,

    /// Price table files (name and price columns), applied in order.
    #[arg(long = "prices")]
    pub price_files: Vec<PathBuf>,

    /// Single price override, e.g. `--price "Pekerja=100.000"`.
    #[arg(long = "price", value_parser = parse_price_override)]
    pub price_overrides: Vec<PriceOverride>,

    #[arg(long, default_value_t = DEFAULT_OVERHEAD_PCT)]
    pub overhead_pct: f64,

    #[arg(long, default_value_t = DEFAULT_TAX_PCT)]
    pub tax_pct: f64,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Price the line without adding it to the project.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PriceOverride {
    pub name: String,
    pub price: f64,
}

pub fn parse_price_override(raw: &str) -> Result<PriceOverride, String> {
    let Some((name, value)) = raw.rsplit_once('=') else {
        return Err(format!("expected NAME=PRICE, got '{raw}'"));
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing resource name in '{raw}'"));
    }
    if !is_numeric_text(value) {
        return Err(format!("'{}' is not a price", value.trim()));
    }

    let price = normalize_number(value);
    if price < 0.0 {
        return Err(format!("price for '{name}' must not be negative"));
    }

    Ok(PriceOverride {
        name: name.to_string(),
        price,
    })
}

#[derive(Args, Debug, Clone)]
pub struct BoqArgs {
    #[arg(long, default_value = ".cache/ahsp")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Remove every line from the project.
    #[arg(long, default_value_t = false, conflicts_with = "export_csv")]
    pub reset: bool,

    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/ahsp")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub catalog_path: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Persona {
    /// Chief quantity surveyor: work items, AHSP codes, cost planning.
    Estimator,
    /// Project finance manager: cash flow, tax, risk.
    Finance,
}

impl Persona {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Estimator => "estimator",
            Self::Finance => "finance",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AdviseArgs {
    #[arg(long, value_enum, default_value_t = Persona::Estimator)]
    pub persona: Persona,

    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    pub question: String,
}
