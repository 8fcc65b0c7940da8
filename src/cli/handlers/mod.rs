mod init;
pub use init::cmd_init;

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::blob::BlobStore;
use crate::io::clipboard;
use crate::io::config_io;
use crate::io::file_store::FileStore;
use crate::io::store::{LogStore, Query};
use crate::io::workspace_io;
use crate::model::config::{StoreConfig, TicketOrder};
use crate::model::log::{Category, Link, LogRecord, LogType};
use crate::model::workspace::Workspace;
use crate::ops::filter::{CategoryFilter, DateMatch, FilterCriteria, filter_logs};
use crate::ops::group::{group_tickets, task_board};
use crate::ops::log_ops::{self, LogEdit, LogError, LogInput};
use crate::ops::{brief, ids};

type CmdResult = Result<(), Box<dyn Error>>;

/// What every command after `init` works against
struct Context {
    workspace: Workspace,
    store: FileStore,
    json: bool,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let Some(command) = cli.command else {
        return Err("no command given (try `dl --help`)".into());
    };
    // Init runs before discovery
    if let Commands::Init(args) = command {
        return cmd_init(args, cli.dir.as_deref());
    }

    let ctx = load_context(cli.dir.as_deref(), cli.json)?;
    match command {
        Commands::Init(_) => Ok(()),

        // Write commands
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::Update(args) => cmd_update(&ctx, args),
        Commands::Edit(args) => cmd_edit(&ctx, args),
        Commands::Close(args) => cmd_close(&ctx, args),
        Commands::Delete(args) => cmd_delete(&ctx, args),

        // Read commands
        Commands::Feed(args) => cmd_feed(&ctx, args),
        Commands::History(args) => cmd_history(&ctx, args),
        Commands::Board(args) => cmd_board(&ctx, args),
        Commands::Show(args) => cmd_show(&ctx, args),
        Commands::Brief(args) => cmd_brief(&ctx, args),
        Commands::NextId => cmd_next_id(&ctx),

        Commands::Config(args) => cmd_config(&ctx, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve `-C` (or the working directory) to a workspace root
pub fn start_dir(dir: Option<&str>) -> Result<PathBuf, Box<dyn Error>> {
    match dir {
        Some(d) => Ok(std::fs::canonicalize(d)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", d, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

fn load_context(dir: Option<&str>, json: bool) -> Result<Context, Box<dyn Error>> {
    let root = workspace_io::discover_workspace(&start_dir(dir)?)?;
    let workspace = workspace_io::load_workspace(&root)?;
    let store = FileStore::open(&workspace);
    tracing::debug!(root = %workspace.root.display(), "loaded workspace");
    Ok(Context {
        workspace,
        store,
        json,
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_type(s: &str) -> Result<LogType, String> {
    LogType::parse(s).ok_or_else(|| format!("invalid type '{}' (expected open, done, closed or note)", s))
}

fn parse_categories(values: &[String]) -> Result<Vec<Category>, String> {
    values
        .iter()
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            Category::parse(v).ok_or_else(|| format!("invalid category '{}' (expected work or home)", v))
        })
        .collect()
}

fn parse_category_filter(s: &str) -> Result<CategoryFilter, String> {
    CategoryFilter::parse(s).ok_or_else(|| format!("invalid category '{}' (expected all, work or home)", s))
}

fn parse_link(s: &str) -> Result<Link, String> {
    let (title, url) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid link '{}' (expected TITLE=URL)", s))?;
    if url.trim().is_empty() {
        return Err(format!("invalid link '{}' (empty URL)", s));
    }
    Ok(Link {
        title: title.trim().to_string(),
        url: url.trim().to_string(),
    })
}

fn parse_order(s: &str) -> Result<TicketOrder, String> {
    TicketOrder::parse(s)
        .ok_or_else(|| format!("invalid order '{}' (expected original, open-then-closed or custom-id)", s))
}

pub fn criteria_from_args(args: &FilterArgs, config: &StoreConfig) -> Result<FilterCriteria, Box<dyn Error>> {
    let date = if args.today {
        Some(log_ops::today())
    } else {
        args.date.as_deref().map(log_ops::parse_date).transpose()?
    };
    let date_match = if args.exact_date {
        DateMatch::Exact
    } else {
        DateMatch::from_config(config.archive.match_closed_date)
    };
    Ok(FilterCriteria {
        search: args.search.clone().unwrap_or_default(),
        category: parse_category_filter(&args.category)?,
        date,
        show_context: args.context,
        date_match,
    })
}

fn all_logs(ctx: &Context) -> Result<Vec<LogRecord>, Box<dyn Error>> {
    Ok(ctx.store.query(&Query::all())?)
}

/// Look up the ticket an update is for. A missing ticket is allowed; the
/// update is stored as a loose log.
fn find_ticket(ctx: &Context, number: u64) -> Result<Option<LogRecord>, Box<dyn Error>> {
    match log_ops::resolve_log(&ctx.store, &format!("#{}", number)) {
        Ok(log) => Ok(Some(log)),
        Err(LogError::NotFound(_)) => {
            eprintln!("warning: no ticket #{} (saved as a loose update)", number);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_created(ctx: &Context, log: &LogRecord) -> CmdResult {
    if ctx.json {
        return print_json(&log_to_json(log));
    }
    println!("{}", format_log_line(log));
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> CmdResult {
    let log_type = match (&args.log_type, args.task) {
        (Some(t), _) => parse_type(t)?,
        (None, Some(_)) => LogType::Done,
        (None, None) => LogType::Open,
    };
    let categories = if args.category.is_empty() {
        vec![Category::Work]
    } else {
        parse_categories(&args.category)?
    };
    let links = args
        .link
        .iter()
        .map(|l| parse_link(l))
        .collect::<Result<Vec<_>, _>>()?;

    if log_type == LogType::Done
        && let Some(number) = args.task
    {
        find_ticket(ctx, number)?;
    }

    let now = Local::now();
    let input = LogInput {
        log_type,
        categories,
        subject: args.subject,
        entry: args.entry,
        task_ref: args.task,
        date: args.date.unwrap_or_else(|| now.format("%Y-%m-%d").to_string()),
        time: args.time.unwrap_or_else(|| now.format("%H:%M").to_string()),
        attachments: args.attach.iter().map(PathBuf::from).collect(),
        links,
    };

    let blobs = BlobStore::new(&ctx.workspace.blobs_dir());
    let log = log_ops::create_log(
        &ctx.store,
        &blobs,
        &input,
        ctx.workspace.config.uploads.max_files,
    )?;
    print_created(ctx, &log)
}

fn cmd_update(ctx: &Context, args: UpdateArgs) -> CmdResult {
    let ticket = find_ticket(ctx, args.task)?;
    let categories = if !args.category.is_empty() {
        parse_categories(&args.category)?
    } else {
        ticket
            .as_ref()
            .map(|t| t.categories.clone())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| vec![Category::Work])
    };

    let mut input = LogInput::update_for(args.task, &args.entry, categories);
    if let Some(date) = args.date {
        input.date = date;
    }
    if let Some(time) = args.time {
        input.time = time;
    }
    input.attachments = args.attach.iter().map(PathBuf::from).collect();

    let blobs = BlobStore::new(&ctx.workspace.blobs_dir());
    let log = log_ops::create_log(
        &ctx.store,
        &blobs,
        &input,
        ctx.workspace.config.uploads.max_files,
    )?;
    print_created(ctx, &log)
}

fn cmd_edit(ctx: &Context, args: EditArgs) -> CmdResult {
    let target = log_ops::resolve_log(&ctx.store, &args.log)?;

    let edit = LogEdit {
        log_type: args.log_type.as_deref().map(parse_type).transpose()?,
        categories: if args.category.is_empty() {
            None
        } else {
            Some(parse_categories(&args.category)?)
        },
        subject: if args.clear_subject {
            Some(None)
        } else {
            args.subject.map(Some)
        },
        entry: args.entry,
        task_ref: if args.clear_task {
            Some(None)
        } else {
            args.task.map(Some)
        },
        date: args.date,
        time: args.time,
    };
    if edit == LogEdit::default() {
        return Err("nothing to change (see `dl edit --help`)".into());
    }

    let log = log_ops::edit_log(&ctx.store, &target.id, &edit)?;
    if ctx.json {
        return print_json(&log_to_json(&log));
    }
    println!("{}", format_log_line(&log));
    Ok(())
}

fn cmd_close(ctx: &Context, args: CloseArgs) -> CmdResult {
    let target = log_ops::resolve_log(&ctx.store, &args.log)?;
    let log = log_ops::close_log(&ctx.store, &target.id, args.date.as_deref())?;
    if ctx.json {
        return print_json(&log_to_json(&log));
    }
    println!(
        "closed {} on {}",
        log.id_label(),
        log.closed_date.as_deref().unwrap_or_default()
    );
    Ok(())
}

fn cmd_delete(ctx: &Context, args: DeleteArgs) -> CmdResult {
    let target = log_ops::resolve_log(&ctx.store, &args.log)?;

    if !args.yes {
        eprintln!("{}", format_log_line(&target));
        eprint!("Permanently delete this log? [y/n] ");
        std::io::stderr().flush()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("cancelled");
            return Ok(());
        }
    }

    log_ops::delete_log(&ctx.store, &target.id)?;
    if ctx.json {
        return print_json(&DeletedJson { deleted: target.id });
    }
    println!("deleted {}", target.id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_feed(ctx: &Context, args: FeedArgs) -> CmdResult {
    let limit = args.limit.unwrap_or(ctx.workspace.config.feed.limit);
    let logs = ctx.store.query(&Query::recent(limit))?;
    if ctx.json {
        let out: Vec<LogJson> = logs.iter().map(log_to_json).collect();
        return print_json(&out);
    }
    if logs.is_empty() {
        println!("no logs yet");
    }
    for log in &logs {
        println!("{}", format_log_line(log));
    }
    Ok(())
}

fn cmd_history(ctx: &Context, args: HistoryArgs) -> CmdResult {
    let criteria = criteria_from_args(&args.filter, &ctx.workspace.config)?;
    let order = match args.order.as_deref() {
        Some(o) => parse_order(o)?,
        None => ctx.workspace.config.archive.ticket_order,
    };

    let visible = filter_logs(&all_logs(ctx)?, &criteria);
    let grouped = group_tickets(&visible, order);
    if ctx.json {
        let out: Vec<GroupedLogJson> = grouped.iter().map(grouped_to_json).collect();
        return print_json(&out);
    }
    if grouped.is_empty() {
        println!("no logs match");
    }
    for item in &grouped {
        println!("{}", format_grouped_line(item));
    }
    Ok(())
}

fn cmd_board(ctx: &Context, args: BoardArgs) -> CmdResult {
    let category = parse_category_filter(&args.category)?;
    let board = task_board(
        &all_logs(ctx)?,
        category,
        ctx.workspace.config.board.ticket_order,
    );
    if ctx.json {
        let out: Vec<TicketGroupJson> = board.iter().map(group_to_json).collect();
        return print_json(&out);
    }
    if board.is_empty() {
        println!("no open tickets");
    }
    for group in &board {
        println!("{}", format_board_line(group));
        if args.expand {
            for child in &group.children {
                println!("    ↳ {}", format_log_line(child));
            }
        }
    }
    Ok(())
}

fn cmd_show(ctx: &Context, args: ShowArgs) -> CmdResult {
    let log = log_ops::resolve_log(&ctx.store, &args.log)?;
    if ctx.json {
        return print_json(&log_to_json(&log));
    }
    for line in format_log_detail(&log) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_brief(ctx: &Context, args: BriefArgs) -> CmdResult {
    let config = &ctx.workspace.config;
    let criteria = criteria_from_args(&args.filter, config)?;
    let logs = all_logs(ctx)?;
    let header = config.brief.header.as_deref();

    let (text, count) = if args.daily {
        let date = criteria.date.clone().unwrap_or_else(log_ops::today);
        let count = logs.iter().filter(|l| l.date_string == date).count();
        let text = brief::daily_report(&date, &logs, header)
            .ok_or_else(|| format!("no logs found for {}", date))?;
        (text, count)
    } else {
        let visible = filter_logs(&logs, &criteria);
        let grouped = group_tickets(&visible, config.archive.ticket_order);
        (
            brief::format_brief(&grouped, criteria.date.as_deref(), header),
            grouped.len(),
        )
    };

    if args.stdout {
        print!("{}", text);
        return Ok(());
    }
    clipboard::copy_text(&text).map_err(|e| format!("{} (use --stdout to print instead)", e))?;
    println!("Brief copied to clipboard ({} logs)", count);
    Ok(())
}

fn cmd_next_id(ctx: &Context) -> CmdResult {
    let next_id = ids::query_next_custom_id(&ctx.store)?;
    if ctx.json {
        return print_json(&NextIdJson { next_id });
    }
    println!("#{}", next_id);
    Ok(())
}

fn cmd_config(ctx: &Context, args: ConfigCmd) -> CmdResult {
    match args.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            if ctx.json {
                return print_json(&ctx.workspace.config);
            }
            print!("{}", toml::to_string_pretty(&ctx.workspace.config)?);
        }
        ConfigAction::Set(set) => {
            let (_, mut doc) = config_io::read_config(&ctx.workspace.dir)?;
            config_io::set_value(&mut doc, &set.key, &set.value)?;
            config_io::write_config(&ctx.workspace.dir, &doc)?;
            tracing::info!(key = %set.key, "config updated");
            println!("{} = {}", set.key, set.value);
        }
        ConfigAction::Path => {
            println!("{}", ctx.workspace.dir.join("config.toml").display());
        }
    }
    Ok(())
}
