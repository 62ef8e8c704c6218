//! These structs provide the CLI interface for the chitieu CLI.

use crate::model::{Category, MonthKey};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// chitieu: a conversational expense tracker backed by a Google Sheet.
///
/// Expenses live in one worksheet per month, named MM/YYYY. You log them in free text
/// the way you would message a friend: `50 xăng` records 50,000 VND for gasoline, and
/// `today`, `week`, `month` and `category` summarize what you have spent.
///
/// You will need a Google Sheets API key and OAuth credentials for this; run `init`
/// first to set up the data directory. The same commands also run against an in-memory
/// sheet when CHITIEU_IN_TEST_MODE is set, which is handy for trying things out.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run. You need a few things ready:
    ///
    /// - Decide what directory you want to store data in and pass this as --home. By
    ///   default, it will be $HOME/chitieu.
    ///
    /// - Get the URL of your expense Google Sheet and pass it as --sheet-url.
    ///
    /// - Set up Google Sheets API access credentials and download them to a file,
    ///   passed as --api-key.
    Init(InitArgs),
    /// Record an expense from a free-text message, e.g. `log 50 xăng`.
    Log(LogArgs),
    /// Delete the first entry of the current month matching `<amount> <note>`.
    Del(DeleteArgs),
    /// Summarize today's expenses.
    Today,
    /// Summarize this week's expenses (Monday through Sunday).
    Week,
    /// Summarize a whole month.
    Month(OffsetArgs),
    /// Summarize one category of a month.
    Category(CategoryArgs),
    /// Sort a month sheet chronologically and write it back.
    Sort(SortArgs),
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

    /// The directory where chitieu data and configuration is held. Defaults to
    /// ~/chitieu
    #[arg(long, env = "CHITIEU_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// Args for the `chitieu init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL to your expense Google sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: String,

    /// The path to your downloaded OAuth API credentials. This file will be copied to
    /// the default secrets location in the main data directory.
    #[arg(long)]
    api_key: PathBuf,
}

impl InitArgs {
    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }

    pub fn api_key(&self) -> &Path {
        &self.api_key
    }
}

/// Args for the `chitieu log` command.
#[derive(Debug, Parser, Clone)]
pub struct LogArgs {
    /// The expense message, e.g. `50 xăng` or `02/09 08:30 15 t`. Amounts are in
    /// thousands of VND.
    #[arg(required = true, num_args = 1..)]
    text: Vec<String>,
}

impl LogArgs {
    pub fn text(&self) -> String {
        self.text.join(" ")
    }
}

/// Args for the `chitieu del` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The entry to delete, as `<amount> <note>`, with the same shorthand as `log`.
    #[arg(required = true, num_args = 1..)]
    text: Vec<String>,
}

impl DeleteArgs {
    pub fn text(&self) -> String {
        self.text.join(" ")
    }
}

/// A month offset relative to the current month: 0 is this month, -1 the previous.
#[derive(Debug, Parser, Clone)]
pub struct OffsetArgs {
    /// How many months back (negative) or forward from the current month.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    offset: i32,
}

impl OffsetArgs {
    pub fn offset(&self) -> i32 {
        self.offset
    }
}

/// Args for the `chitieu category` command.
#[derive(Debug, Parser, Clone)]
pub struct CategoryArgs {
    /// The category to summarize.
    category: Category,

    /// How many months back (negative) or forward from the current month.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    offset: i32,
}

impl CategoryArgs {
    pub fn category(&self) -> Category {
        self.category
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }
}

/// Args for the `chitieu sort` command.
#[derive(Debug, Parser, Clone)]
pub struct SortArgs {
    /// The month sheet to sort, as MM/YYYY. Defaults to the current month.
    month: Option<MonthKey>,
}

impl SortArgs {
    pub fn month(&self) -> Option<MonthKey> {
        self.month
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("chitieu"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or CHITIEU_HOME instead of relying on the default \
                home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("chitieu")
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
