use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod context;
mod handlers;

#[derive(Parser)]
#[command(name = "anyl")]
#[command(version)]
#[command(about = "AnyLauncher - register games and launch them only if unchanged", long_about = None)]
#[command(styles = styles())]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

fn styles() -> clap::builder::Styles {
    use clap::builder::styling::{AnsiColor, Effects, Styles};
    Styles::styled()
        .header(AnsiColor::Magenta.on_default() | Effects::BOLD)
        .usage(AnsiColor::Magenta.on_default() | Effects::BOLD)
        .literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Register an executable or HTML game")]
    Add {
        path: PathBuf,
        #[arg(long, short)]
        name: Option<String>,
    },
    #[command(about = "List registered games")]
    List,
    #[command(about = "Rename a game")]
    Rename { id: String, name: String },
    #[command(about = "Point a game at a new file and record its fingerprint")]
    Repath { id: String, path: PathBuf },
    #[command(about = "Remove a game from the list")]
    Remove { id: String },
    #[command(about = "Remember a game as the current selection")]
    Select { id: String },
    #[command(about = "Verify and launch a game (defaults to the selection)")]
    Launch { id: Option<String> },
    #[command(about = "Check a game's file against its fingerprint without launching")]
    Verify { id: Option<String> },
    #[command(about = "Delete the game list (use when it is reported corrupt)")]
    ResetStore {
        #[arg(long)]
        yes: bool,
    },
    #[command(about = "Show configuration and data locations")]
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = context::Context::new()?;

    match cli.command {
        Some(Commands::Add { path, name }) => handlers::handle_add(&ctx, &path, name.as_deref()),
        Some(Commands::List) | None => handlers::handle_list(&ctx),
        Some(Commands::Rename { id, name }) => handlers::handle_rename(&ctx, &id, &name),
        Some(Commands::Repath { id, path }) => handlers::handle_repath(&ctx, &id, &path),
        Some(Commands::Remove { id }) => handlers::handle_remove(&ctx, &id),
        Some(Commands::Select { id }) => handlers::handle_select(&ctx, &id),
        Some(Commands::Launch { id }) => handlers::handle_launch(&ctx, id.as_deref()),
        Some(Commands::Verify { id }) => handlers::handle_verify(&ctx, id.as_deref()),
        Some(Commands::ResetStore { yes }) => handlers::handle_reset_store(&ctx, yes),
        Some(Commands::Config) => handlers::handle_config(&ctx),
    }
}
