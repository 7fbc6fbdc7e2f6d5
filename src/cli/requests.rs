//! Request CLI commands

use clap::Subcommand;

use crate::display::request::{format_request_details, format_request_list};
use crate::error::AuditResult;
use crate::storage::AuditStore;

/// Request subcommands
#[derive(Subcommand)]
pub enum RequestCommands {
    /// List logged requests, newest first
    List {
        /// Maximum number of requests to show
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Show a request and the changes made while handling it
    Show {
        /// Request ID
        id: String,
    },
}

/// Handle a request command
pub fn handle_request_command(store: &dyn AuditStore, cmd: RequestCommands) -> AuditResult<()> {
    match cmd {
        RequestCommands::List { limit } => {
            let mut requests = store.requests()?;
            requests.reverse();
            requests.truncate(limit);

            print!("{}", format_request_list(&requests));
            if requests.is_empty() {
                println!();
            }
        }
        RequestCommands::Show { id } => {
            let request = store.resolve_request(&id)?;
            let changes = store.changes_for_request(request.id)?;
            print!("{}", format_request_details(&request, &changes));
        }
    }

    Ok(())
}
