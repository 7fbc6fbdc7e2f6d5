//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the audit store.

pub mod changes;
pub mod export;
pub mod requests;

pub use changes::{handle_change_command, ChangeCommands};
pub use export::{handle_export_command, ExportCommands, ExportFormat};
pub use requests::{handle_request_command, RequestCommands};

use crate::config::{AuditPaths, AuditSettings};
use crate::error::AuditResult;
use crate::models::UserId;
use crate::storage::AuditStore;

/// Remove every reference to a user from the audit log
pub fn handle_forget_user(store: &dyn AuditStore, user: &str) -> AuditResult<()> {
    let touched = store.forget_user(&UserId::new(user))?;
    println!("Removed user '{}' from {} records", user, touched);
    Ok(())
}

/// Print effective settings and file locations
pub fn handle_config(paths: &AuditPaths, settings: &AuditSettings) {
    println!("auditlog configuration");
    println!("======================");
    println!("Data directory:  {}", paths.base_dir().display());
    println!("Settings file:   {}", paths.settings_file().display());
    println!("Changes log:     {}", paths.changes_log().display());
    println!("Requests log:    {}", paths.requests_log().display());
    println!();
    println!("Settings:");
    for (key, value) in settings.effective() {
        println!("  {:<16} {}", key, value);
    }
}
