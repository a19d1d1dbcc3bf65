use kure_core::{GroupActivity, Kure};

use super::{print_json, viewer, CmdResult};

pub async fn cmd_overview(
    kure: &Kure,
    user: Option<&str>,
    groups: u32,
    posts: u32,
    json: bool,
) -> CmdResult {
    let overview = kure
        .views
        .community_overview(&viewer(user), groups, posts)
        .await?;
    if json {
        return print_json(&overview);
    }

    print_digest("Recent activity", &overview.recent);
    print_digest("New groups", &overview.created);
    Ok(())
}

fn print_digest(title: &str, digest: &[GroupActivity]) {
    println!("{}:", title);
    if digest.is_empty() {
        println!("  (none)");
    }
    for activity in digest {
        println!(
            "  {} - {} ({} users)",
            activity.group.name, activity.group.display, activity.group.user_count
        );
        for p in &activity.posts {
            println!("    @{}/{}  {}", p.author, p.permlink, p.title);
        }
    }
}
