use kure_core::Kure;
use kure_storage::UserName;

use super::{acting_user, print_json, CmdResult};

pub async fn cmd_post_list(kure: &Kure, group: &str, limit: Option<u32>, json: bool) -> CmdResult {
    let group = kure.catalog.canonical_name(group);
    let posts = kure.posts.list_by_group(&group, limit).await?;
    if json {
        return print_json(&posts);
    }

    if posts.is_empty() {
        println!("No posts found");
        return Ok(());
    }

    for p in posts {
        println!(
            "#{} @{}/{}  {} (added by {})",
            p.id, p.author, p.permlink, p.title, p.added_by
        );
    }
    Ok(())
}

pub async fn cmd_post_add(
    kure: &Kure,
    user: Option<&str>,
    group: &str,
    author: &str,
    permlink: &str,
    title: &str,
) -> CmdResult {
    let added_by = acting_user(user)?;
    let group = kure.catalog.canonical_name(group);

    let post = kure
        .posts
        .add_post(&group, &UserName::new(author), permlink, title, &added_by)
        .await?;

    println!("Added post #{} @{}/{} to {}", post.id, post.author, post.permlink, group);
    Ok(())
}

pub async fn cmd_post_delete(
    kure: &Kure,
    user: Option<&str>,
    group: &str,
    author: &str,
    permlink: &str,
) -> CmdResult {
    let requested_by = acting_user(user)?;
    let group = kure.catalog.canonical_name(group);

    kure.posts
        .delete_post(&group, &UserName::new(author), permlink, &requested_by)
        .await?;

    println!("Deleted post @{}/{} from {}", author, permlink, group);
    Ok(())
}
