use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dl", about = concat!("daylog v", env!("CARGO_PKG_VERSION"), " - tickets, updates and notes, one line at a time"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize daylog/ in the current directory
    Init(InitArgs),
    /// Record a new log
    Add(AddArgs),
    /// Log progress on a ticket (shortcut for add --type done --task N)
    Update(UpdateArgs),
    /// Show the most recent logs
    Feed(FeedArgs),
    /// Search the archive by text, category and date
    History(HistoryArgs),
    /// Show open tickets with their updates
    Board(BoardArgs),
    /// Show one log in full
    Show(ShowArgs),
    /// Change fields of a log
    Edit(EditArgs),
    /// Close an open ticket
    Close(CloseArgs),
    /// Permanently delete a log
    Delete(DeleteArgs),
    /// Copy the visible logs to the clipboard as an AI brief
    Brief(BriefArgs),
    /// Print the ticket number the next open log will receive
    NextId,
    /// Show or change settings in daylog/config.toml
    Config(ConfigCmd),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Store name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Rewrite config.toml even if daylog/ already exists
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Entry text
    pub entry: String,
    /// Log type: open, done, closed, note (default: open, or done with --task)
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub log_type: Option<String>,
    /// Categories, comma separated: work, home (default: work)
    #[arg(long, short = 'c', value_delimiter = ',')]
    pub category: Vec<String>,
    /// Short title
    #[arg(long, short = 's')]
    pub subject: Option<String>,
    /// Ticket number this update belongs to
    #[arg(long, value_name = "N")]
    pub task: Option<u64>,
    /// Date as YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<String>,
    /// Time as HH:MM (default: now)
    #[arg(long)]
    pub time: Option<String>,
    /// File to attach (repeatable)
    #[arg(long, value_name = "PATH")]
    pub attach: Vec<String>,
    /// Link as TITLE=URL (repeatable)
    #[arg(long, value_name = "TITLE=URL")]
    pub link: Vec<String>,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Ticket number
    pub task: u64,
    /// Entry text
    pub entry: String,
    /// Categories (default: the ticket's categories)
    #[arg(long, short = 'c', value_delimiter = ',')]
    pub category: Vec<String>,
    /// Date as YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<String>,
    /// Time as HH:MM (default: now)
    #[arg(long)]
    pub time: Option<String>,
    /// File to attach (repeatable)
    #[arg(long, value_name = "PATH")]
    pub attach: Vec<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Log id, unique id prefix, or #N
    pub log: String,
    /// New entry text
    #[arg(long)]
    pub entry: Option<String>,
    /// New subject
    #[arg(long, short = 's', conflicts_with = "clear_subject")]
    pub subject: Option<String>,
    /// Remove the subject
    #[arg(long)]
    pub clear_subject: bool,
    /// New type: open, done, closed, note
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub log_type: Option<String>,
    /// Ticket number (kept only on done logs)
    #[arg(long, value_name = "N", conflicts_with = "clear_task")]
    pub task: Option<u64>,
    /// Remove the ticket reference
    #[arg(long)]
    pub clear_task: bool,
    /// New categories, comma separated
    #[arg(long, short = 'c', value_delimiter = ',')]
    pub category: Vec<String>,
    /// New date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
    /// New time (HH:MM)
    #[arg(long)]
    pub time: Option<String>,
}

#[derive(Args)]
pub struct CloseArgs {
    /// Log id, unique id prefix, or #N
    pub log: String,
    /// Closing date (default: today)
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Log id, unique id prefix, or #N
    pub log: String,
    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct FeedArgs {
    /// Number of logs (default: feed.limit from config)
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

/// Filters shared by `history` and `brief`
#[derive(Args, Clone)]
pub struct FilterArgs {
    /// Case-insensitive text in entry or subject
    #[arg(long, short = 'q')]
    pub search: Option<String>,
    /// all, work or home
    #[arg(long, short = 'c', default_value = "all")]
    pub category: String,
    /// Only logs dated YYYY-MM-DD
    #[arg(long, conflicts_with = "today")]
    pub date: Option<String>,
    /// Only logs dated today
    #[arg(long)]
    pub today: bool,
    /// Also show every open ticket and the updates of matching ones
    #[arg(long)]
    pub context: bool,
    /// Match the date filter on the log date only, not the closing date
    #[arg(long)]
    pub exact_date: bool,
}

#[derive(Args)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Ticket order: original, open-then-closed, custom-id (default: from config)
    #[arg(long)]
    pub order: Option<String>,
}

#[derive(Args)]
pub struct BoardArgs {
    /// all, work or home
    #[arg(long, short = 'c', default_value = "all")]
    pub category: String,
    /// List each ticket's updates
    #[arg(long, short = 'e')]
    pub expand: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Log id, unique id prefix, or #N
    pub log: String,
}

#[derive(Args)]
pub struct BriefArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
    /// The two-report daily briefing for --date (default: today)
    #[arg(long)]
    pub daily: bool,
    /// Print instead of copying to the clipboard
    #[arg(long)]
    pub stdout: bool,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (default)
    Show,
    /// Set a value, keeping comments and formatting
    Set(ConfigSetArgs),
    /// Print the path to config.toml
    Path,
}

#[derive(Args)]
pub struct ConfigSetArgs {
    /// Dotted key, e.g. board.ticket_order
    pub key: String,
    pub value: String,
}
