pub mod group;
pub mod member;
pub mod post;
pub mod view;

pub use group::{cmd_group_create, cmd_group_delete, cmd_group_list, cmd_group_show};
pub use member::{
    cmd_member_approve, cmd_member_grant, cmd_member_list, cmd_member_request, cmd_member_revoke,
};
pub use post::{cmd_post_add, cmd_post_delete, cmd_post_list};
pub use view::cmd_overview;

use kure_core::Viewer;
use kure_storage::UserName;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// The acting user, required by every mutating command.
pub(crate) fn acting_user(user: Option<&str>) -> Result<UserName, Box<dyn std::error::Error>> {
    user.filter(|u| !u.is_empty())
        .map(UserName::new)
        .ok_or_else(|| "Acting user required (use -u/--user or KURE_USER)".into())
}

pub(crate) fn viewer(user: Option<&str>) -> Viewer {
    match user.filter(|u| !u.is_empty()) {
        Some(u) => Viewer::User(UserName::new(u)),
        None => Viewer::Anonymous,
    }
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acting_user_required() {
        assert!(acting_user(None).is_err());
        assert!(acting_user(Some("")).is_err());
        assert_eq!(acting_user(Some("alice")).unwrap(), UserName::new("alice"));
    }

    #[test]
    fn test_viewer_defaults_to_anonymous() {
        assert_eq!(viewer(None), Viewer::Anonymous);
        assert_eq!(viewer(Some("")), Viewer::Anonymous);
        assert_eq!(viewer(Some("bob")), Viewer::User(UserName::new("bob")));
    }

    #[tokio::test]
    async fn test_commands_against_memory_store() {
        use kure_core::{Kure, KureConfig, UserGroupsKind};
        use kure_storage::Role;
        use kure_store_sqlite::SqliteStore;
        use std::sync::Arc;

        let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
        let kure = Kure::new(store.clone(), KureConfig::default()).unwrap();

        cmd_group_create(&kure, Some("alice"), "GamerZ", None, false)
            .await
            .unwrap();
        cmd_member_request(&kure, Some("bob"), "gamerz").await.unwrap();
        cmd_member_approve(&kure, Some("alice"), "GAMERZ", "bob")
            .await
            .unwrap();
        cmd_member_grant(&kure, Some("alice"), "gamerz", "bob", Role::Moderator)
            .await
            .unwrap();
        cmd_post_add(&kure, Some("bob"), "gamerz", "bob", "hello", "Hi")
            .await
            .unwrap();
        cmd_group_show(&kure, None, "gamerz", true).await.unwrap();
        cmd_group_list(&kure, Some("bob"), None, UserGroupsKind::Joined, None, false)
            .await
            .unwrap();
        cmd_overview(&kure, None, 5, 5, false).await.unwrap();

        // outsiders cannot add posts
        assert!(cmd_post_add(&kure, Some("eve"), "gamerz", "eve", "spam", "")
            .await
            .is_err());
        // mutating commands need an acting user
        assert!(cmd_group_delete(&kure, None, "gamerz").await.is_err());

        cmd_post_delete(&kure, Some("bob"), "gamerz", "bob", "hello")
            .await
            .unwrap();
        cmd_member_revoke(&kure, Some("bob"), "gamerz", "bob")
            .await
            .unwrap();
        cmd_group_delete(&kure, Some("alice"), "gamerz").await.unwrap();
        assert!(kure
            .catalog
            .list_owned(&UserName::new("alice"))
            .await
            .unwrap()
            .is_empty());
    }
}
