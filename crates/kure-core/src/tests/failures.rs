//! Store failures surfacing through the engine.

use std::sync::Arc;

use super::common::*;
use crate::{EngineError, ErrorKind, Kure, KureConfig, UserGroupsKind, Viewer};
use chrono::{TimeZone, Utc};
use kure_storage::{Group, MockStore, Role, StoreError, Visibility};

fn kure_over(mock: MockStore) -> Kure {
    Kure::new(Arc::new(mock), KureConfig::default()).unwrap()
}

fn sample_group(name: &str) -> Group {
    let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
    Group {
        name: group(name),
        display: name.to_string(),
        owner: user("alice"),
        visibility: Visibility::Public,
        created_at: now,
        updated_at: now,
        post_count: 0,
        user_count: 1,
    }
}

fn backend(msg: &str) -> StoreError {
    StoreError::Backend(msg.to_string())
}

#[tokio::test]
async fn group_detail_fails_with_failing_subquery() {
    let mut mock = MockStore::new();
    mock.expect_get_group()
        .returning(|name| Ok(sample_group(name.as_str())));
    mock.expect_get_membership()
        .returning(|_, _| Err(StoreError::NotFound));
    mock.expect_list_posts()
        .returning(|_, _| Err(backend("disk I/O error")));
    mock.expect_list_memberships().returning(|_, _| Ok(vec![]));

    let err = kure_over(mock)
        .views
        .group_detail(&group("gamerz"), &Viewer::User(user("bob")))
        .await
        .unwrap_err();
    match err {
        EngineError::Internal { op, source } => {
            assert_eq!(op, "list_posts");
            assert!(source.to_string().contains("disk I/O error"));
        }
        other => panic!("expected Internal, got {:?}", other),
    }
}

#[tokio::test]
async fn anonymous_detail_skips_access_query() {
    let mut mock = MockStore::new();
    mock.expect_get_group()
        .returning(|name| Ok(sample_group(name.as_str())));
    mock.expect_get_membership().never();
    mock.expect_list_posts().returning(|_, _| Ok(vec![]));
    mock.expect_list_memberships().returning(|_, _| Ok(vec![]));

    let detail = kure_over(mock)
        .views
        .group_detail(&group("gamerz"), &Viewer::Anonymous)
        .await
        .unwrap();
    assert_eq!(detail.access, None);
}

#[tokio::test]
async fn digest_fails_when_one_group_fails() {
    let mut mock = MockStore::new();
    mock.expect_list_active_groups()
        .returning(|_, _| Ok(vec![sample_group("aaaa"), sample_group("bbbb")]));
    mock.expect_list_posts().returning(|g, _| {
        if g.as_str() == "bbbb" {
            Err(backend("timeout"))
        } else {
            Ok(vec![])
        }
    });

    let err = kure_over(mock)
        .views
        .recent_activity(&Viewer::Anonymous, 10, 5)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[tokio::test]
async fn membership_lookup_failure_is_internal_not_denied() {
    let mut mock = MockStore::new();
    mock.expect_get_membership()
        .returning(|_, _| Err(backend("database is locked")));

    let err = kure_over(mock)
        .access
        .grant_access(&group("gamerz"), &user("alice"), &user("bob"), Role::Member)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Internal {
            op: "get_membership",
            ..
        }
    ));
}

#[tokio::test]
async fn unexpected_create_failure_is_internal() {
    let mut mock = MockStore::new();
    mock.expect_create_group()
        .returning(|_| Err(backend("no space left on device")));

    let err = kure_over(mock)
        .catalog
        .create_group("gamerz", &user("alice"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Internal {
            op: "create_group",
            ..
        }
    ));
}

#[tokio::test]
async fn validation_never_reaches_store() {
    // no expectations: any store call panics
    let mock = MockStore::new();
    let kure = kure_over(mock);

    let err = kure
        .catalog
        .create_group("no", &user("alice"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = kure
        .access
        .grant_access(&group("gamerz"), &user("alice"), &user("bob"), Role::Pending)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn lost_race_on_role_change_is_conflict() {
    let mut mock = MockStore::new();
    mock.expect_get_membership().returning(|g, u| {
        let access = if u.as_str() == "alice" {
            Role::Owner
        } else {
            Role::Member
        };
        let now = Utc::now();
        Ok(kure_storage::Membership {
            group: g.clone(),
            user: u.clone(),
            access,
            added_on: now,
            updated_at: now,
        })
    });
    mock.expect_update_membership_role()
        .returning(|_, _, _, _| Err(StoreError::Conflict));

    let err = kure_over(mock)
        .access
        .grant_access(&group("gamerz"), &user("alice"), &user("bob"), Role::Moderator)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn user_groups_join_failure_names_operation() {
    let mut mock = MockStore::new();
    mock.expect_list_user_memberships().returning(|u| {
        let now = Utc::now();
        Ok(vec![kure_storage::Membership {
            group: group("gamerz"),
            user: u.clone(),
            access: Role::Member,
            added_on: now,
            updated_at: now,
        }])
    });
    mock.expect_list_groups_by_names()
        .returning(|_| Err(backend("broken pipe")));

    let err = kure_over(mock)
        .views
        .user_groups(&user("bob"), UserGroupsKind::Joined, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Internal {
            op: "list_groups_by_names",
            ..
        }
    ));
}
