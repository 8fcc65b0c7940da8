use clap::Parser;
use daylog::cli::commands::Cli;
use daylog::cli::handlers;
use daylog::io::logging;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        // No subcommand → launch TUI (it logs to daylog/daylog.log)
        None => daylog::tui::run(cli.dir.as_deref()),
        Some(_) => {
            logging::init_stderr();
            handlers::dispatch(cli)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
