//! Resource commands: get, list, save, create, update, delete

use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use declarative::backend::LocalResources;
use serde_json::Value;

use super::Session;
use crate::Context;
use crate::cli::{GetArgs, ListArgs, SaveArgs};
use crate::ui;

// ============================================================================
// Get
// ============================================================================

pub fn get(ctx: &Context, args: &GetArgs) -> Result<()> {
    let session = Session::open(ctx)?;
    let value = session
        .reconciler
        .get_remote_resource(&args.path)
        .with_context(|| format!("Could not get {}", args.path))?;

    if args.save {
        let file = session.repository.save_local_resource(&args.path, &value)?;
        if !ctx.quiet {
            ui::success(&format!("Saved {} to {}", args.path, file.display()));
        }
        return Ok(());
    }
    ui::json(&value)
}

// ============================================================================
// List
// ============================================================================

pub fn list(ctx: &Context, args: &ListArgs) -> Result<()> {
    let session = Session::open(ctx)?;
    let reconciler = &session.reconciler;

    if args.local {
        for path in reconciler.list_remote_resource_paths_from_local()? {
            println!("{path}");
        }
        return Ok(());
    }

    let Some(collection) = args.path.as_deref() else {
        bail!("A collection path is required unless --local is given");
    };

    if args.entries {
        let entries = reconciler.list_remote_resource_entries(collection)?;
        if !ctx.quiet {
            ui::header(&format!("{collection} ({} items)", entries.len()));
        }
        for entry in &entries {
            println!("{}", entry.alias_path.bold());
            ui::kv("remote", &entry.path);
            ui::kv("id", entry.id.as_deref().unwrap_or("-"));
            ui::kv("alias", entry.alias.as_deref().unwrap_or("-"));
        }
        return Ok(());
    }

    for path in reconciler.list_remote_resource_paths(collection)? {
        println!("{path}");
    }
    Ok(())
}

// ============================================================================
// Writes
// ============================================================================

pub fn save(ctx: &Context, args: &SaveArgs) -> Result<()> {
    let session = Session::open(ctx)?;
    let paths = if args.paths.is_empty() {
        session.repository.list_resource_paths()?
    } else {
        args.paths.clone()
    };
    if paths.is_empty() {
        ui::warn("No local resources to save");
        return Ok(());
    }

    let items = paths
        .iter()
        .map(|path| -> Result<(String, Value)> { Ok((path.clone(), local_payload(&session, path)?)) })
        .collect::<Result<Vec<_>>>()?;

    if !ctx.quiet {
        ui::info(&format!("Saving {} resources ({} jobs)", items.len(), args.jobs));
    }
    let summary = session.reconciler.save_many(&items, args.jobs)?;

    for failure in &summary.failed {
        ui::error(&format!("{}: {}", failure.path, failure.error));
    }
    if !ctx.quiet {
        ui::dim(&ui::summary_line(summary.created, summary.updated, summary.failed.len()));
    }
    if !summary.is_success() {
        bail!("{} of {} resources failed to save", summary.failed.len(), summary.total());
    }
    Ok(())
}

pub fn create(ctx: &Context, path: &str) -> Result<()> {
    let session = Session::open(ctx)?;
    let payload = local_payload(&session, path)?;
    let created = session
        .reconciler
        .create_remote_resource(path, &payload)
        .with_context(|| format!("Could not create {path}"))?;
    report(ctx, "Created", path);
    log::debug!("server returned {created}");
    Ok(())
}

pub fn update(ctx: &Context, path: &str) -> Result<()> {
    let session = Session::open(ctx)?;
    let payload = local_payload(&session, path)?;
    session
        .reconciler
        .update_remote_resource(path, &payload)
        .with_context(|| format!("Could not update {path}"))?;
    report(ctx, "Updated", path);
    Ok(())
}

pub fn delete(ctx: &Context, path: &str) -> Result<()> {
    let session = Session::open(ctx)?;
    session
        .reconciler
        .delete_remote_resource(path)
        .with_context(|| format!("Could not delete {path}"))?;
    report(ctx, "Deleted", path);
    Ok(())
}

fn local_payload(session: &Session, path: &str) -> Result<Value> {
    session
        .repository
        .get_local_resource(path)?
        .with_context(|| {
            format!(
                "No local resource at {}",
                session.repository.resource_file(path).display()
            )
        })
}

fn report(ctx: &Context, verb: &str, path: &str) {
    if !ctx.quiet {
        ui::success(&format!("{verb} {path}"));
    }
}
