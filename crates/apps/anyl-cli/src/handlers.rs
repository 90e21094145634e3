use crate::context::{Context, resolve_id};
use anyhow::{Result, bail};
use anyl_core::AppError;
use anyl_core::launch::Verification;
use anyl_core::models::GameId;
use std::path::Path;

pub fn handle_add(ctx: &Context, path: &Path, name: Option<&str>) -> Result<()> {
    let mut registry = ctx.registry()?;
    let id = registry.add(path, name)?;
    if let Some(entry) = registry.get(&id) {
        println!("Added \"{}\" [{}]", entry.name, short_id(&id));
        println!("  path        {}", entry.path.display());
        println!("  fingerprint {}", entry.fingerprint.short());
    }
    Ok(())
}

pub fn handle_list(ctx: &Context) -> Result<()> {
    let registry = ctx.registry()?;
    if registry.is_empty() {
        println!("No games registered. Add one with `anyl add <PATH>`.");
        return Ok(());
    }
    let selected = registry.last_selected_id();
    for entry in registry.list() {
        let marker = if selected == Some(&entry.id) { "*" } else { " " };
        println!(
            "{} {}  {:<24} {}  {}",
            marker,
            short_id(&entry.id),
            entry.name,
            entry.fingerprint.short(),
            entry.path.display()
        );
    }
    Ok(())
}

pub fn handle_rename(ctx: &Context, id: &str, name: &str) -> Result<()> {
    let mut registry = ctx.registry()?;
    let id = resolve_id(&registry, id)?;
    registry.rename(&id, name)?;
    println!("Renamed [{}] to \"{}\"", short_id(&id), name.trim());
    Ok(())
}

pub fn handle_repath(ctx: &Context, id: &str, path: &Path) -> Result<()> {
    let mut registry = ctx.registry()?;
    let id = resolve_id(&registry, id)?;
    registry.repath(&id, path)?;
    if let Some(entry) = registry.get(&id) {
        println!("Re-pointed \"{}\" to {}", entry.name, entry.path.display());
        println!("  fingerprint {}", entry.fingerprint.short());
    }
    Ok(())
}

pub fn handle_remove(ctx: &Context, id: &str) -> Result<()> {
    let mut registry = ctx.registry()?;
    let id = resolve_id(&registry, id)?;
    let removed = registry.remove(&id)?;
    println!("Removed \"{}\"", removed.name);
    Ok(())
}

pub fn handle_select(ctx: &Context, id: &str) -> Result<()> {
    let mut registry = ctx.registry()?;
    let id = resolve_id(&registry, id)?;
    registry.select(&id)?;
    if let Some(entry) = registry.last_selected() {
        println!("Selected \"{}\"", entry.name);
    }
    Ok(())
}

pub fn handle_launch(ctx: &Context, id: Option<&str>) -> Result<()> {
    let registry = ctx.registry()?;
    let sequencer = ctx.sequencer();
    let result = match id {
        Some(id) => sequencer.launch(&registry, &resolve_id(&registry, id)?),
        None => sequencer.launch_selected(&registry),
    };

    match result {
        Ok(launched) => {
            match launched.pid {
                Some(pid) => println!("Launched {} (pid {})", launched.path.display(), pid),
                None => println!("Launched {}", launched.path.display()),
            }
            Ok(())
        }
        Err(AppError::UnreadableFile { path, .. }) => bail!(
            "game file missing at {}; use `anyl repath` to point it at the new location",
            path.display()
        ),
        Err(e @ AppError::IntegrityMismatch { .. }) => bail!(
            "{}\nLaunch refused. If the change is expected, `anyl repath` the game to accept it.",
            e
        ),
        Err(e) => Err(e.into()),
    }
}

pub fn handle_verify(ctx: &Context, id: Option<&str>) -> Result<()> {
    let registry = ctx.registry()?;
    let id = match id {
        Some(id) => resolve_id(&registry, id)?,
        None => match registry.last_selected_id() {
            Some(id) => id.clone(),
            None => return Err(AppError::NothingSelected.into()),
        },
    };

    match ctx.sequencer().verify(&registry, &id)? {
        Verification::Intact => println!("OK: file matches its recorded fingerprint"),
        Verification::Tampered { expected, actual } => bail!(
            "CHANGED: expected {}, found {}",
            expected.short(),
            actual.short()
        ),
    }
    Ok(())
}

pub fn handle_reset_store(ctx: &Context, yes: bool) -> Result<()> {
    let store = ctx.store();
    if !yes {
        bail!(
            "this deletes {} and every registered game; re-run with --yes to confirm",
            store.document_path().display()
        );
    }
    store.discard()?;
    println!("Deleted {}", store.document_path().display());
    Ok(())
}

pub fn handle_config(ctx: &Context) -> Result<()> {
    let store = ctx.store();
    println!("data dir      {}", ctx.base_dir.display());
    println!("game list     {}", store.document_path().display());
    println!("lock file     {}", store.lock_path().display());
    println!("config        {}", ctx.config_path.display());
    println!("lock wait     {} ms", ctx.config.lock_wait_ms);
    println!(
        "html opener   {}",
        ctx.config.html_opener.as_deref().unwrap_or("(system default)")
    );
    Ok(())
}

fn short_id(id: &GameId) -> &str {
    id.as_str().get(..8).unwrap_or(id.as_str())
}
