use std::fs;
use std::path::Path;

use tracing::info;

use crate::cli::commands::InitArgs;
use crate::io::config_io::{self, CONFIG_FILE, DATA_DIR_NAME};

const CONFIG_TEMPLATE: &str = r##"# tally configuration

[heatmap]
# Most week columns to draw. The oldest weeks are cut first.
max_weeks = 53
# Color the heatmap when writing to a terminal
color = true

[list]
# Cells of task text shown per line before truncating with "…"
width = 60
"##;

/// Create `.tally/` in `root` (the current directory unless `-C` was given).
pub fn cmd_init(args: InitArgs, root: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let root = match root {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };
    let data_dir = root.join(DATA_DIR_NAME);

    if data_dir.is_dir() && !args.force {
        return Err(format!(
            "tally data already exists in {} (use --force to rewrite the config)",
            data_dir.display()
        )
        .into());
    }

    if let Some(parent) = root.parent()
        && let Ok(outer) = config_io::discover_data_dir(parent)
    {
        eprintln!("note: enclosing tally data found at {}", outer.display());
        eprintln!("creating a separate one in {}", data_dir.display());
    }

    fs::create_dir_all(&data_dir)?;
    fs::write(data_dir.join(CONFIG_FILE), CONFIG_TEMPLATE)?;
    info!(path = %data_dir.display(), "initialized");

    println!("Initialized {}", data_dir.display());
    Ok(())
}
