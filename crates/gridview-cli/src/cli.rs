//! CLI argument definitions for `gridview`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use gridview_cli::logging::LogFormat;
use gridview_model::{LogicalOp, SortDirection};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(
    name = "gridview",
    version,
    about = "Filter, sort and persist tabular resource views",
    long_about = "Filter, sort and persist tabular resource views.\n\n\
                  A screen file declares the resource key, the filterable fields and the\n\
                  default view. View changes are written to the configured preference\n\
                  store and restored on the next run."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the configuration file (default: platform config directory).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Keep view changes in memory only; nothing is read or written.
    #[arg(long = "offline", global = true)]
    pub offline: bool,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Filter and sort a row set with the stored view and print it.
    Show(ShowArgs),

    /// Print the hydrated view state as JSON.
    View(ScreenArgs),

    /// Toggle (or set) the sort column.
    Sort(SortArgs),

    /// Change column visibility and order.
    Columns(ColumnsArgs),

    /// Edit the filter tree.
    Filter(FilterArgs),

    /// Print query parameters for server-side filtering.
    Query(ScreenArgs),
}

#[derive(Args)]
pub struct ScreenArgs {
    /// Screen file (JSON) declaring the resource, fields and defaults.
    #[arg(value_name = "SCREEN")]
    pub screen: PathBuf,
}

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub screen: ScreenArgs,

    /// Rows to display: a JSON array of objects or a CSV file with headers.
    #[arg(value_name = "ROWS")]
    pub rows: PathBuf,

    /// Row file format (default: from the file extension).
    #[arg(long = "format", value_enum)]
    pub format: Option<RowFormatArg>,

    /// Print at most this many rows.
    #[arg(long = "limit", value_name = "N")]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct SortArgs {
    #[command(flatten)]
    pub screen: ScreenArgs,

    /// Column to sort by.
    #[arg(value_name = "COLUMN")]
    pub column: String,

    /// Set the direction instead of toggling it.
    #[arg(long = "dir", value_enum)]
    pub direction: Option<DirectionArg>,
}

#[derive(Args)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub screen: ScreenArgs,

    /// Show a column (repeatable).
    #[arg(long = "show", value_name = "COLUMN")]
    pub show: Vec<String>,

    /// Hide a column (repeatable).
    #[arg(long = "hide", value_name = "COLUMN")]
    pub hide: Vec<String>,

    /// Flip the visibility of a column (repeatable).
    #[arg(long = "toggle", value_name = "COLUMN")]
    pub toggle: Vec<String>,

    /// New display order, comma separated.
    #[arg(long = "order", value_name = "COLUMNS", value_delimiter = ',')]
    pub order: Option<Vec<String>>,
}

#[derive(Args)]
pub struct FilterArgs {
    #[command(flatten)]
    pub screen: ScreenArgs,

    #[command(subcommand)]
    pub action: FilterAction,
}

#[derive(Subcommand)]
pub enum FilterAction {
    /// Add a condition on a field.
    AddLeaf {
        /// Field to filter on.
        #[arg(value_name = "FIELD")]
        field: String,

        /// Group to add to (default: root).
        #[arg(long = "parent", value_name = "ID")]
        parent: Option<String>,
    },

    /// Add a nested group.
    AddGroup {
        #[arg(long = "logical", value_enum, default_value = "and")]
        logical: LogicalArg,

        /// Group to add to (default: root).
        #[arg(long = "parent", value_name = "ID")]
        parent: Option<String>,
    },

    /// Remove a node and everything below it.
    Remove {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Change the field, operator or value of a condition.
    Set {
        #[arg(value_name = "ID")]
        id: String,

        #[arg(long = "field")]
        field: Option<String>,

        #[arg(long = "operator")]
        operator: Option<String>,

        /// Value; parsed as a number or boolean where possible.
        #[arg(long = "value")]
        value: Option<String>,
    },

    /// Set the combinator of a group.
    Logical {
        #[arg(value_enum)]
        logical: LogicalArg,

        /// Group to change (default: root).
        #[arg(long = "group", value_name = "ID")]
        group: Option<String>,
    },

    /// Remove every condition.
    Clear,
}

/// CLI row file formats.
#[derive(Clone, Copy, ValueEnum)]
pub enum RowFormatArg {
    Json,
    Csv,
}

/// CLI sort directions.
#[derive(Clone, Copy, ValueEnum)]
pub enum DirectionArg {
    Asc,
    Desc,
}

impl From<DirectionArg> for SortDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Asc => Self::Asc,
            DirectionArg::Desc => Self::Desc,
        }
    }
}

/// CLI group combinators.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogicalArg {
    And,
    Or,
}

impl From<LogicalArg> for LogicalOp {
    fn from(arg: LogicalArg) -> Self {
        match arg {
            LogicalArg::And => Self::And,
            LogicalArg::Or => Self::Or,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => Self::ERROR,
            LogLevelArg::Warn => Self::WARN,
            LogLevelArg::Info => Self::INFO,
            LogLevelArg::Debug => Self::DEBUG,
            LogLevelArg::Trace => Self::TRACE,
        }
    }
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Json => Self::Json,
        }
    }
}
