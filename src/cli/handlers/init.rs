use crate::cli::commands::InitArgs;
use crate::io::workspace_io;

pub fn cmd_init(args: InitArgs, dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let root = super::start_dir(dir)?;

    // Warn when a parent directory already holds a store
    if let Some(parent) = root.parent()
        && let Ok(parent_root) = workspace_io::discover_workspace(parent)
    {
        eprintln!("Note: parent store found at {}/daylog/", parent_root.display());
        eprintln!("Creating new store in ./daylog/");
    }

    let name = args
        .name
        .unwrap_or_else(|| workspace_io::infer_name(&root));
    let workspace = workspace_io::init_workspace(&root, &name, args.force)?;

    println!("Initialized daylog store: {}", workspace.config.store.name);
    println!("  {}", workspace.dir.display());
    Ok(())
}
