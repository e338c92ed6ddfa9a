//! Users command - Account administration.

use std::sync::Arc;

use crate::cli::args::{UsersAction, UsersArgs};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::{Database, MemoryCache};
use crate::jobs::InlineMailer;
use crate::services::{ServiceContainer, Services};

/// Execute the users command
pub async fn execute(args: UsersArgs, config: Config) -> AppResult<()> {
    let db = Database::connect(&config).await?;
    let services = Services::from_connection(
        db.get_connection(),
        Arc::new(MemoryCache::new()),
        Arc::new(InlineMailer),
        &config,
    );

    match args.action {
        UsersAction::Promote { email } => {
            let user = services.users().promote(&email).await?;
            println!("{} is now a superuser", user.email);
        }
    }

    Ok(())
}
