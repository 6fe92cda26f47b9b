//! These structs provide the CLI interface for the spendview CLI.

use crate::model::{ColumnKey, Columns};
use crate::render::OutputFormat;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// spendview: search, sort and page through your expenditures.
///
/// Rows are read from a JSON or CSV file. Each row has an id, a date (YYYY-MM-DD), a description,
/// a category, a payment method, an amount and optional notes. The `view` command shows one page
/// of the rows at a time together with the total of everything that matched the search and the
/// total of the page being shown.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and write a default configuration file.
    Init(InitArgs),
    /// Show one page of rows, filtered by description and optionally sorted.
    View(ViewArgs),
    /// Write a file of generated sample expenditures.
    Sample(SampleArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the spendview configuration is held. Defaults to ~/spendview
    #[arg(long, env = "SPENDVIEW_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// (Not shown): Args for the `spendview init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The rows file that `view` reads when --rows is not given. Relative paths are resolved
    /// against the home directory.
    #[arg(long)]
    rows: Option<PathBuf>,
}

impl InitArgs {
    pub fn new(rows: Option<PathBuf>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> Option<&Path> {
        self.rows.as_deref()
    }
}

/// Which set of columns to show.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSet {
    /// Date, Description, Category, Method, Amount, Actions
    #[default]
    Default,
    /// Date, Description, Amount ($), Category, Payment Method, Notes
    Expenditure,
}

serde_plain::derive_display_from_serialize!(ColumnSet);
serde_plain::derive_fromstr_from_deserialize!(ColumnSet);

impl ColumnSet {
    pub fn columns(&self) -> Columns {
        match self {
            ColumnSet::Default => Columns::default(),
            ColumnSet::Expenditure => Columns::expenditure(),
        }
    }
}

/// (Not shown): Args for the `spendview view` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ViewArgs {
    /// The JSON or CSV rows file. Defaults to the rows_path in config.json.
    #[arg(long)]
    rows: Option<PathBuf>,

    /// Only show rows whose description contains this text, ignoring case.
    #[arg(long)]
    filter: Option<String>,

    /// The column to sort by: date, description, category, method, amount or notes.
    #[arg(long)]
    sort: Option<ColumnKey>,

    /// Sort descending instead of ascending. Only meaningful with --sort.
    #[arg(long, requires = "sort")]
    desc: bool,

    /// The page to show, starting at 1. Pages past the end show the last page.
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Rows per page. Defaults to the page_size in config.json.
    #[arg(long)]
    page_size: Option<usize>,

    /// Which columns to show.
    #[arg(long, value_enum, default_value_t = ColumnSet::Default)]
    columns: ColumnSet,

    /// The output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl ViewArgs {
    pub fn new(rows: Option<PathBuf>) -> Self {
        Self {
            rows,
            page: 1,
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_sort(mut self, key: ColumnKey, desc: bool) -> Self {
        self.sort = Some(key);
        self.desc = desc;
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_columns(mut self, columns: ColumnSet) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn rows(&self) -> Option<&Path> {
        self.rows.as_deref()
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn sort(&self) -> Option<ColumnKey> {
        self.sort
    }

    pub fn desc(&self) -> bool {
        self.desc
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> Option<usize> {
        self.page_size
    }

    pub fn columns(&self) -> ColumnSet {
        self.columns
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// (Not shown): Args for the `spendview sample` command.
#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// How many rows to generate.
    #[arg(long, default_value_t = 20)]
    count: usize,

    /// Where to write the rows. The extension, .json or .csv, picks the format.
    #[arg(long)]
    out: PathBuf,
}

impl SampleArgs {
    pub fn new(count: usize, out: impl Into<PathBuf>) -> Self {
        Self {
            count,
            out: out.into(),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn out(&self) -> &Path {
        &self.out
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("spendview"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or SPENDVIEW_HOME instead of relying on the default \
                home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("spendview")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
