//! Inspection commands: path, metadata

use anyhow::Result;

use super::Session;
use crate::Context;
use crate::ui;

/// Show where a logical path lives on the server
pub fn path(ctx: &Context, logical_path: &str) -> Result<()> {
    let session = Session::open(ctx)?;
    let reconciler = &session.reconciler;

    let remote = reconciler.get_remote_resource_path(logical_path)?;
    let collection = reconciler.get_remote_collection_path(logical_path)?;

    if ctx.quiet {
        println!("{remote}");
        return Ok(());
    }
    ui::header(logical_path);
    ui::kv("remote", &remote);
    ui::kv("collection", &collection);
    let secrets = reconciler.secret_paths_for(logical_path)?;
    if !secrets.is_empty() {
        ui::kv("secrets", &secrets.join(", "));
    }
    Ok(())
}

/// Print rendered (or raw merged) metadata as JSON
pub fn metadata(ctx: &Context, logical_path: &str, raw: bool) -> Result<()> {
    let session = Session::open(ctx)?;
    if raw {
        return ui::json(&session.reconciler.get_merged_metadata(logical_path)?);
    }
    let record = session.reconciler.get_resource_record(logical_path)?;
    ui::json(record.metadata.as_ref())
}
