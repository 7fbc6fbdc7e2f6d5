//! Change CLI commands
//!
//! Implements CLI commands for browsing recorded changes.

use clap::Subcommand;

use crate::display::change::{format_change_details, format_change_list};
use crate::error::{AuditError, AuditResult};
use crate::models::Action;
use crate::storage::{AuditStore, ChangeFilter};

/// Change subcommands
#[derive(Subcommand)]
pub enum ChangeCommands {
    /// List recorded changes, newest first
    List {
        /// Only changes to this entity type (e.g. "shop.order")
        #[arg(short = 't', long)]
        entity_type: Option<String>,
        /// Only changes to the entity with this primary key
        #[arg(long)]
        pk: Option<String>,
        /// Only this action (create, update, delete)
        #[arg(short, long)]
        action: Option<String>,
        /// Only changes made by this user
        #[arg(short, long)]
        user: Option<String>,
        /// Only changes made while handling this request
        #[arg(short, long)]
        request: Option<String>,
        /// Maximum number of changes to show
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Show change details
    Show {
        /// Change ID
        id: String,
    },
}

/// Handle a change command
pub fn handle_change_command(store: &dyn AuditStore, cmd: ChangeCommands) -> AuditResult<()> {
    match cmd {
        ChangeCommands::List {
            entity_type,
            pk,
            action,
            user,
            request,
            limit,
        } => {
            let mut filter = ChangeFilter::new();
            if let Some(entity_type) = entity_type {
                filter = filter.entity_type(entity_type);
            }
            if let Some(pk) = pk {
                filter = filter.entity_pk(pk);
            }
            if let Some(action) = action {
                let parsed = Action::parse(&action).ok_or_else(|| {
                    AuditError::Validation(format!(
                        "Invalid action: '{}'. Valid actions: create, update, delete",
                        action
                    ))
                })?;
                filter = filter.action(parsed);
            }
            if let Some(user) = user {
                filter = filter.user(user);
            }
            if let Some(reference) = request {
                filter = filter.request(store.resolve_request(&reference)?.id);
            }

            let mut changes = store.find_changes(&filter)?;
            changes.reverse();
            changes.truncate(limit);

            print!("{}", format_change_list(&changes));
            if changes.is_empty() {
                println!();
            }
        }
        ChangeCommands::Show { id } => {
            let change = store.resolve_change(&id)?;
            print!("{}", format_change_details(&change));
        }
    }

    Ok(())
}
