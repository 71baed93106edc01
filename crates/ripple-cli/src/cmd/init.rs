use anyhow::{Context as _, Result};
use clap::Args;
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force re-initialization even if `.ripple/` already exists.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "# Directory holding individual snapshot files.\n\
    data_dir = \"data\"\n\
    \n\
    # Merged-table artifact, fully replaced on every `rpl merge`.\n\
    table_path = \"tweets.json\"\n\
    \n\
    # UTC offset of the local display zone.\n\
    utc_offset = \"-05:00\"\n\
    \n\
    # Posts pulled per source per snapshot.\n\
    post_count = 100\n";

/// Execute `rpl init`. Creates the project skeleton:
///
/// ```text
/// .ripple/
///   config.toml         (default project config template)
/// data/                 (snapshot files land here)
/// ```
///
/// # Errors
///
/// Returns an error if `.ripple/` already exists and `--force` is not set,
/// or if any filesystem operation fails.
pub fn run_init(args: &InitArgs, project_root: &Path) -> Result<()> {
    let ripple_dir = project_root.join(".ripple");

    if ripple_dir.exists() && !args.force {
        anyhow::bail!(".ripple/ already exists. Use `rpl init --force` to reinitialize.");
    }

    std::fs::create_dir_all(&ripple_dir)
        .with_context(|| format!("Failed to create {}", ripple_dir.display()))?;

    let config_path = ripple_dir.join("config.toml");
    std::fs::write(&config_path, CONFIG_TOML)
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    let data_dir = project_root.join("data");
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data dir: {}", data_dir.display()))?;

    println!("✓ Initialized .ripple/ project structure.");
    println!();
    println!("  Config:    .ripple/config.toml");
    println!("  Data dir:  data/");
    println!();
    println!("Next steps:");
    println!("  Store a raw pull:      rpl load <source> <pull.json>");
    println!("  Rebuild the timeline:  rpl merge");
    println!("  Shape today's series:  rpl series");
    Ok(())
}
