use kure_core::Kure;
use kure_storage::{Role, UserName};

use super::{acting_user, print_json, CmdResult};

pub async fn cmd_member_request(kure: &Kure, user: Option<&str>, group: &str) -> CmdResult {
    let user = acting_user(user)?;
    let group = kure.catalog.canonical_name(group);

    kure.access.request_access(&group, &user).await?;

    println!("Requested access to {}", group);
    Ok(())
}

pub async fn cmd_member_grant(
    kure: &Kure,
    user: Option<&str>,
    group: &str,
    user_name: &str,
    role: Role,
) -> CmdResult {
    let granted_by = acting_user(user)?;
    let group = kure.catalog.canonical_name(group);

    let m = kure
        .access
        .grant_access(&group, &granted_by, &UserName::new(user_name), role)
        .await?;

    println!("{} is now {} of {}", m.user, m.access, group);
    Ok(())
}

pub async fn cmd_member_approve(
    kure: &Kure,
    user: Option<&str>,
    group: &str,
    user_name: &str,
) -> CmdResult {
    let approved_by = acting_user(user)?;
    let group = kure.catalog.canonical_name(group);

    let m = kure
        .access
        .approve_pending(&group, &approved_by, &UserName::new(user_name))
        .await?;

    println!("Approved {} as {} of {}", m.user, m.access, group);
    Ok(())
}

pub async fn cmd_member_revoke(
    kure: &Kure,
    user: Option<&str>,
    group: &str,
    user_name: &str,
) -> CmdResult {
    let revoked_by = acting_user(user)?;
    let group = kure.catalog.canonical_name(group);

    kure.access
        .revoke_access(&group, &revoked_by, &UserName::new(user_name))
        .await?;

    println!("Removed {} from {}", user_name, group);
    Ok(())
}

pub async fn cmd_member_list(kure: &Kure, group: &str, pending: bool, json: bool) -> CmdResult {
    let group = kure.catalog.canonical_name(group);
    let members = kure.access.list_members(&group, pending).await?;
    if json {
        return print_json(&members);
    }

    if members.is_empty() {
        println!("No members found");
        return Ok(());
    }

    println!("Members of {}:", group);
    for m in members {
        println!(
            "  {} ({}, since {})",
            m.user,
            m.access,
            m.added_on.format("%Y-%m-%d")
        );
    }
    Ok(())
}
