use kure_core::{Kure, NewGroup, UserGroupsKind, ViewerAccess};
use kure_storage::Visibility;

use super::{acting_user, print_json, viewer, CmdResult};

pub async fn cmd_group_create(
    kure: &Kure,
    user: Option<&str>,
    name: &str,
    display: Option<String>,
    private: bool,
) -> CmdResult {
    let owner = acting_user(user)?;
    let visibility = if private {
        Visibility::Private
    } else {
        Visibility::Public
    };

    let group = kure
        .catalog
        .create_group_with(NewGroup {
            name: name.to_string(),
            display,
            owner,
            visibility,
        })
        .await?;

    println!("Created group: {}", group.name);
    if group.display != group.name.as_str() {
        println!("  Display: {}", group.display);
    }
    println!("  Visibility: {}", group.visibility.as_str());
    Ok(())
}

pub async fn cmd_group_delete(kure: &Kure, user: Option<&str>, name: &str) -> CmdResult {
    let requested_by = acting_user(user)?;
    let name = kure.catalog.canonical_name(name);

    let deleted = kure.catalog.delete_group(&name, &requested_by).await?;

    println!(
        "Deleted group {} ({} memberships, {} posts)",
        name, deleted.memberships, deleted.posts
    );
    Ok(())
}

pub async fn cmd_group_show(kure: &Kure, user: Option<&str>, name: &str, json: bool) -> CmdResult {
    let name = kure.catalog.canonical_name(name);
    let detail = kure.views.group_detail(&name, &viewer(user)).await?;
    if json {
        return print_json(&detail);
    }

    let g = &detail.group;
    println!("{} ({})", g.display, g.name);
    println!("  Owner: {}", g.owner);
    println!("  Visibility: {}", g.visibility.as_str());
    println!("  Users: {}  Posts: {}", g.user_count, g.post_count);
    match detail.access {
        Some(ViewerAccess::Role(role)) => println!("  Your access: {}", role),
        Some(ViewerAccess::NotAMember) => println!("  Your access: none"),
        None => {}
    }

    println!("Members:");
    for m in &detail.members {
        println!("  {} ({})", m.user, m.access);
    }
    if !detail.pending.is_empty() {
        println!("Pending:");
        for m in &detail.pending {
            println!("  {}", m.user);
        }
    }
    if detail.posts.is_empty() {
        println!("No posts");
    } else {
        println!("Posts:");
        for p in &detail.posts {
            println!("  @{}/{}  {}", p.author, p.permlink, p.title);
        }
    }
    Ok(())
}

pub async fn cmd_group_list(
    kure: &Kure,
    user: Option<&str>,
    of: Option<&str>,
    kind: UserGroupsKind,
    limit: Option<u32>,
    json: bool,
) -> CmdResult {
    let target = acting_user(of.or(user))?;
    let groups = kure.views.user_groups(&target, kind, limit).await?;
    if json {
        return print_json(&groups);
    }

    if groups.is_empty() {
        println!("No groups found");
        return Ok(());
    }

    println!("Groups:");
    for ug in groups {
        println!(
            "  {} - {} ({}, {} users, {} posts)",
            ug.group.name, ug.group.display, ug.role, ug.group.user_count, ug.group.post_count
        );
    }
    Ok(())
}
