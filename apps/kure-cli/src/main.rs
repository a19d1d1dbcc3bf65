mod cli;
mod commands;

use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, GroupCommand, MemberCommand, PostCommand};
use commands::*;
use kure_core::{Kure, KureConfig};
use kure_store_sqlite::SqliteStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => KureConfig::load_from(path)?,
        None => KureConfig::from_env()?,
    };
    tracing::debug!(?config, "configuration loaded");

    let store = Arc::new(match &cli.database {
        Some(url) => SqliteStore::open(url).await?,
        None => SqliteStore::open_default().await?,
    });
    let kure = Kure::new(store, config)?;

    let user = cli.user.as_deref();
    let json = cli.json;

    match cli.command {
        Command::Group { group_cmd } => match group_cmd {
            GroupCommand::Create {
                name,
                display,
                private,
            } => {
                cmd_group_create(&kure, user, &name, display, private).await?;
            }
            GroupCommand::Delete { name } => {
                cmd_group_delete(&kure, user, &name).await?;
            }
            GroupCommand::Show { name } => {
                cmd_group_show(&kure, user, &name, json).await?;
            }
            GroupCommand::List { kind, limit, of } => {
                cmd_group_list(&kure, user, of.as_deref(), kind.into(), limit, json).await?;
            }
        },
        Command::Member { member_cmd } => match member_cmd {
            MemberCommand::Request { group } => {
                cmd_member_request(&kure, user, &group).await?;
            }
            MemberCommand::Grant {
                group,
                user_name,
                role,
            } => {
                cmd_member_grant(&kure, user, &group, &user_name, role).await?;
            }
            MemberCommand::Approve { group, user_name } => {
                cmd_member_approve(&kure, user, &group, &user_name).await?;
            }
            MemberCommand::Revoke { group, user_name } => {
                cmd_member_revoke(&kure, user, &group, &user_name).await?;
            }
            MemberCommand::List { group, pending } => {
                cmd_member_list(&kure, &group, pending, json).await?;
            }
        },
        Command::Post { post_cmd } => match post_cmd {
            PostCommand::List { group, limit } => {
                cmd_post_list(&kure, &group, limit, json).await?;
            }
            PostCommand::Add {
                group,
                author,
                permlink,
                title,
            } => {
                cmd_post_add(&kure, user, &group, &author, &permlink, &title).await?;
            }
            PostCommand::Delete {
                group,
                author,
                permlink,
            } => {
                cmd_post_delete(&kure, user, &group, &author, &permlink).await?;
            }
        },
        Command::Overview { groups, posts } => {
            cmd_overview(&kure, user, groups, posts, json).await?;
        }
    }

    Ok(())
}
