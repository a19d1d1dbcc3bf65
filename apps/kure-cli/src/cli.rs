use clap::{Parser, Subcommand, ValueEnum};
use kure_core::UserGroupsKind;
use kure_storage::Role;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kure")]
#[command(about = "Community group access control")]
pub struct Cli {
    /// SQLite database URL (defaults to ~/.kure/kure.db)
    #[arg(long, env = "KURE_DATABASE_URL")]
    pub database: Option<String>,

    /// JSON config file (defaults to KURE_* environment variables)
    #[arg(long, env = "KURE_CONFIG")]
    pub config: Option<PathBuf>,

    /// User performing the command. Views are anonymous without it.
    #[arg(long, short = 'u', env = "KURE_USER", global = true)]
    pub user: Option<String>,

    /// Print views as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Group commands
    Group {
        #[command(subcommand)]
        group_cmd: GroupCommand,
    },
    /// Membership commands
    Member {
        #[command(subcommand)]
        member_cmd: MemberCommand,
    },
    /// Post commands
    Post {
        #[command(subcommand)]
        post_cmd: PostCommand,
    },
    /// Recently active and newly created groups
    Overview {
        /// Groups per digest
        #[arg(long, default_value_t = 20)]
        groups: u32,
        /// Posts per group
        #[arg(long, default_value_t = 5)]
        posts: u32,
    },
}

#[derive(Subcommand)]
pub enum GroupCommand {
    /// Create a group owned by the acting user
    Create {
        /// Group name (4-17 letters, digits, spaces, '_' or '-')
        name: String,
        /// Display name (defaults to the name as given)
        #[arg(long)]
        display: Option<String>,
        /// Hide the group from anonymous listings
        #[arg(long)]
        private: bool,
    },
    /// Delete a group with its memberships and posts (owner only)
    Delete {
        /// Group name
        name: String,
    },
    /// Show a group with its posts, members and pending requests
    Show {
        /// Group name
        name: String,
    },
    /// List groups of a user
    List {
        /// Which groups to list
        #[arg(long, value_enum, default_value_t = GroupKind::Joined)]
        kind: GroupKind,
        /// Page size; also sorts by most recently updated
        #[arg(long)]
        limit: Option<u32>,
        /// User whose groups to list (defaults to the acting user)
        #[arg(long = "of")]
        of: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum MemberCommand {
    /// Ask to join a group as the acting user
    Request {
        /// Group name
        group: String,
    },
    /// Give a user a role in a group
    Grant {
        /// Group name
        group: String,
        /// User name
        user_name: String,
        /// Role (moderator or member)
        role: Role,
    },
    /// Approve a pending request
    Approve {
        /// Group name
        group: String,
        /// User name
        user_name: String,
    },
    /// Remove a membership, reject a request or leave a group
    Revoke {
        /// Group name
        group: String,
        /// User name
        user_name: String,
    },
    /// List members of a group
    List {
        /// Group name
        group: String,
        /// Include pending requests
        #[arg(long)]
        pending: bool,
    },
}

#[derive(Subcommand)]
pub enum PostCommand {
    /// List posts of a group, newest first
    List {
        /// Group name
        group: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Add a post to a group (acting user must be a member)
    Add {
        /// Group name
        group: String,
        /// Post author
        author: String,
        /// Post permlink
        permlink: String,
        #[arg(long, default_value = "")]
        title: String,
    },
    /// Remove a post from a group (author or moderator)
    Delete {
        /// Group name
        group: String,
        /// Post author
        author: String,
        /// Post permlink
        permlink: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum GroupKind {
    Owned,
    Joined,
    All,
}

impl From<GroupKind> for UserGroupsKind {
    fn from(kind: GroupKind) -> Self {
        match kind {
            GroupKind::Owned => UserGroupsKind::Owned,
            GroupKind::Joined => UserGroupsKind::Joined,
            GroupKind::All => UserGroupsKind::All,
        }
    }
}
