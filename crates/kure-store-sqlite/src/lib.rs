use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;
use kure_storage::{
    ActivityScope, CreateGroupParams, DeletedGroup, Group, GroupName, Membership,
    MembershipFilter, NewMembership, NewPost, Post, PostId, Role, Store, StoreError, UserName,
    Visibility,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// `~/.kure/kure.db` (creates dir with 0700 perms on unix)
    pub async fn open_default() -> Result<Self, StoreError> {
        let dir = dirs::home_dir()
            .ok_or_else(|| StoreError::Backend("no home dir".into()))?
            .join(".kure");
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Backend(e.to_string()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        let path = dir.join("kure.db");
        let url = format!("sqlite://{}", path.to_string_lossy());
        Self::open(&url).await
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open("sqlite::memory:").await
    }

    /// Open (creating if missing) and migrate the database at `url`.
    ///
    /// The pool holds a single connection: every transaction is serialised, and
    /// an in-memory database lives exactly as long as that connection.
    pub async fn open(url: &str) -> Result<Self, StoreError> {
        tracing::debug!(%url, "opening sqlite store");
        let options = SqliteConnectOptions::from_str(url)
            .map_err(backend)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(backend)?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { pool })
    }
}

// ───────────────────────────── Row mapping ─────────────────────────────

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Maps constraint violations on insert: unique → AlreadyExists, dangling
/// group reference → NotFound.
fn write_err(e: sqlx::Error) -> StoreError {
    if let Some(db) = e.as_database_error() {
        let msg = db.message();
        if db.is_unique_violation() || msg.contains("UNIQUE") {
            return StoreError::AlreadyExists;
        }
        if db.is_foreign_key_violation() || msg.contains("FOREIGN KEY") {
            return StoreError::NotFound;
        }
    }
    backend(e)
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn ts(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Backend(format!("timestamp out of range: {}", ms)))
}

fn role(weight: i64) -> Result<Role, StoreError> {
    Role::from_weight(weight).map_err(|e| StoreError::Backend(e.to_string()))
}

/// `SELECT` over groups with the derived counters, followed by `tail`.
fn group_select(tail: &str) -> String {
    format!(
        "SELECT g.name, g.display, g.owner, g.visibility, g.created_at, g.updated_at,
                (SELECT COUNT(*) FROM posts p WHERE p.group_name = g.name) AS post_count,
                (SELECT COUNT(*) FROM memberships m
                  WHERE m.group_name = g.name AND m.access <> {pending}) AS user_count
           FROM groups g
         {tail}",
        pending = Role::Pending.weight(),
    )
}

const MEMBERSHIP_COLUMNS: &str = "group_name, user_name, access, added_on, updated_at";

const POST_COLUMNS: &str = "id, group_name, author, permlink, title, added_by, created_at";

#[derive(sqlx::FromRow)]
struct GroupRow {
    name: String,
    display: String,
    owner: String,
    visibility: String,
    created_at: i64,
    updated_at: i64,
    post_count: i64,
    user_count: i64,
}

impl TryFrom<GroupRow> for Group {
    type Error = StoreError;

    fn try_from(row: GroupRow) -> Result<Self, Self::Error> {
        Ok(Group {
            name: GroupName(row.name),
            display: row.display,
            owner: UserName(row.owner),
            visibility: Visibility::from_str(&row.visibility).map_err(StoreError::Backend)?,
            created_at: ts(row.created_at)?,
            updated_at: ts(row.updated_at)?,
            post_count: row.post_count as u64,
            user_count: row.user_count as u64,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MembershipRow {
    group_name: String,
    user_name: String,
    access: i64,
    added_on: i64,
    updated_at: i64,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = StoreError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        Ok(Membership {
            group: GroupName(row.group_name),
            user: UserName(row.user_name),
            access: role(row.access)?,
            added_on: ts(row.added_on)?,
            updated_at: ts(row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    group_name: String,
    author: String,
    permlink: String,
    title: String,
    added_by: String,
    created_at: i64,
}

impl TryFrom<PostRow> for Post {
    type Error = StoreError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Post {
            id: PostId(row.id),
            group: GroupName(row.group_name),
            author: UserName(row.author),
            permlink: row.permlink,
            title: row.title,
            added_by: UserName(row.added_by),
            created_at: ts(row.created_at)?,
        })
    }
}

fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    // ───────────────────────────── Groups ─────────────────────────────

    async fn create_group(&self, p: &CreateGroupParams) -> Result<Group, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let (owned,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM groups WHERE owner = ?")
            .bind(&p.owner.0)
            .fetch_one(&mut *tx)
            .await
            .map_err(backend)?;
        if owned >= i64::from(p.max_owned) {
            return Err(StoreError::LimitExceeded);
        }

        let now = now_ms();
        sqlx::query(
            "INSERT INTO groups(name, display, owner, visibility, created_at, updated_at)
             VALUES(?, ?, ?, ?, ?, ?)",
        )
        .bind(&p.name.0)
        .bind(&p.display)
        .bind(&p.owner.0)
        .bind(p.visibility.as_str())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        sqlx::query(
            "INSERT INTO memberships(group_name, user_name, access, added_on, updated_at)
             VALUES(?, ?, ?, ?, ?)",
        )
        .bind(&p.name.0)
        .bind(&p.owner.0)
        .bind(Role::Owner.weight())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        tx.commit().await.map_err(backend)?;

        Ok(Group {
            name: p.name.clone(),
            display: p.display.clone(),
            owner: p.owner.clone(),
            visibility: p.visibility,
            created_at: ts(now)?,
            updated_at: ts(now)?,
            post_count: 0,
            user_count: 1,
        })
    }

    async fn get_group(&self, name: &GroupName) -> Result<Group, StoreError> {
        let sql = group_select("WHERE g.name = ?");
        let row = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(&name.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .ok_or(StoreError::NotFound)?;
        row.try_into()
    }

    async fn list_groups_by_owner(&self, owner: &UserName) -> Result<Vec<Group>, StoreError> {
        let sql = group_select("WHERE g.owner = ? ORDER BY g.seq DESC");
        let rows = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(&owner.0)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        collect(rows)
    }

    async fn list_groups_by_names(&self, names: &[GroupName]) -> Result<Vec<Group>, StoreError> {
        if names.is_empty() {
            return Ok(vec![]);
        }
        let mut qb = QueryBuilder::<Sqlite>::new(group_select("WHERE g.name IN ("));
        let mut list = qb.separated(", ");
        for name in names {
            list.push_bind(name.0.clone());
        }
        list.push_unseparated(")");

        let rows = qb
            .build_query_as::<GroupRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        collect(rows)
    }

    async fn list_recent_groups(&self, limit: u32) -> Result<Vec<Group>, StoreError> {
        let sql = group_select("WHERE g.visibility = 'public' ORDER BY g.seq DESC LIMIT ?");
        let rows = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        collect(rows)
    }

    async fn list_active_groups(
        &self,
        scope: &ActivityScope,
        limit: u32,
    ) -> Result<Vec<Group>, StoreError> {
        const ACTIVE: &str = "EXISTS (SELECT 1 FROM posts p WHERE p.group_name = g.name)
            ORDER BY (SELECT MAX(p.id) FROM posts p WHERE p.group_name = g.name) DESC
            LIMIT ?";

        let rows = match scope {
            ActivityScope::Public => {
                let sql = group_select(&format!("WHERE g.visibility = 'public' AND {ACTIVE}"));
                sqlx::query_as::<_, GroupRow>(&sql)
                    .bind(i64::from(limit))
                    .fetch_all(&self.pool)
                    .await
            }
            ActivityScope::MemberOf(user) => {
                let sql = group_select(&format!(
                    "WHERE g.name IN (SELECT m.group_name FROM memberships m
                                       WHERE m.user_name = ? AND m.access <> ?)
                       AND {ACTIVE}"
                ));
                sqlx::query_as::<_, GroupRow>(&sql)
                    .bind(&user.0)
                    .bind(Role::Pending.weight())
                    .bind(i64::from(limit))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(backend)?;
        collect(rows)
    }

    async fn delete_group(&self, name: &GroupName) -> Result<DeletedGroup, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let exists: Option<(i64,)> = sqlx::query_as("SELECT seq FROM groups WHERE name = ?")
            .bind(&name.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?;
        if exists.is_none() {
            return Err(StoreError::NotFound);
        }

        let posts = sqlx::query("DELETE FROM posts WHERE group_name = ?")
            .bind(&name.0)
            .execute(&mut *tx)
            .await
            .map_err(backend)?
            .rows_affected();
        let memberships = sqlx::query("DELETE FROM memberships WHERE group_name = ?")
            .bind(&name.0)
            .execute(&mut *tx)
            .await
            .map_err(backend)?
            .rows_affected();
        sqlx::query("DELETE FROM groups WHERE name = ?")
            .bind(&name.0)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;

        Ok(DeletedGroup { memberships, posts })
    }

    // ─────────────────────────── Memberships ──────────────────────────

    async fn get_membership(
        &self,
        group: &GroupName,
        user: &UserName,
    ) -> Result<Membership, StoreError> {
        let sql = format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE group_name = ? AND user_name = ?"
        );
        let row = sqlx::query_as::<_, MembershipRow>(&sql)
            .bind(&group.0)
            .bind(&user.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .ok_or(StoreError::NotFound)?;
        row.try_into()
    }

    async fn list_memberships(
        &self,
        group: &GroupName,
        filter: MembershipFilter,
    ) -> Result<Vec<Membership>, StoreError> {
        let access = match filter {
            MembershipFilter::Members => format!("AND access <> {}", Role::Pending.weight()),
            MembershipFilter::Pending => format!("AND access = {}", Role::Pending.weight()),
            MembershipFilter::All => String::new(),
        };
        let sql = format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships
              WHERE group_name = ? {access}
              ORDER BY user_name"
        );
        let rows = sqlx::query_as::<_, MembershipRow>(&sql)
            .bind(&group.0)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        collect(rows)
    }

    async fn list_user_memberships(&self, user: &UserName) -> Result<Vec<Membership>, StoreError> {
        let sql = format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE user_name = ? ORDER BY group_name"
        );
        let rows = sqlx::query_as::<_, MembershipRow>(&sql)
            .bind(&user.0)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        collect(rows)
    }

    async fn insert_membership(&self, p: &NewMembership) -> Result<Membership, StoreError> {
        let now = now_ms();
        sqlx::query(
            "INSERT INTO memberships(group_name, user_name, access, added_on, updated_at)
             VALUES(?, ?, ?, ?, ?)",
        )
        .bind(&p.group.0)
        .bind(&p.user.0)
        .bind(p.access.weight())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        Ok(Membership {
            group: p.group.clone(),
            user: p.user.clone(),
            access: p.access,
            added_on: ts(now)?,
            updated_at: ts(now)?,
        })
    }

    async fn update_membership_role(
        &self,
        group: &GroupName,
        user: &UserName,
        expected: Role,
        new: Role,
    ) -> Result<Membership, StoreError> {
        if expected == Role::Owner || new == Role::Owner {
            return Err(StoreError::Conflict);
        }
        let result = sqlx::query(
            "UPDATE memberships SET access = ?, updated_at = ?
              WHERE group_name = ? AND user_name = ? AND access = ? AND access <> ?",
        )
        .bind(new.weight())
        .bind(now_ms())
        .bind(&group.0)
        .bind(&user.0)
        .bind(expected.weight())
        .bind(Role::Owner.weight())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            // Either gone (NotFound) or changed underneath us
            self.get_membership(group, user).await?;
            return Err(StoreError::Conflict);
        }
        self.get_membership(group, user).await
    }

    async fn delete_membership(
        &self,
        group: &GroupName,
        user: &UserName,
        expected: Role,
    ) -> Result<(), StoreError> {
        if expected == Role::Owner {
            return Err(StoreError::Conflict);
        }
        let result = sqlx::query(
            "DELETE FROM memberships
              WHERE group_name = ? AND user_name = ? AND access = ? AND access <> ?",
        )
        .bind(&group.0)
        .bind(&user.0)
        .bind(expected.weight())
        .bind(Role::Owner.weight())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            self.get_membership(group, user).await?;
            return Err(StoreError::Conflict);
        }
        Ok(())
    }

    // ────────────────────────────── Posts ───────────────────────────────

    async fn insert_post(&self, p: &NewPost) -> Result<Post, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let now = now_ms();

        let id = sqlx::query(
            "INSERT INTO posts(group_name, author, permlink, title, added_by, created_at)
             VALUES(?, ?, ?, ?, ?, ?)",
        )
        .bind(&p.group.0)
        .bind(&p.author.0)
        .bind(&p.permlink)
        .bind(&p.title)
        .bind(&p.added_by.0)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?
        .last_insert_rowid();

        sqlx::query("UPDATE groups SET updated_at = ? WHERE name = ?")
            .bind(now)
            .bind(&p.group.0)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;

        Ok(Post {
            id: PostId(id),
            group: p.group.clone(),
            author: p.author.clone(),
            permlink: p.permlink.clone(),
            title: p.title.clone(),
            added_by: p.added_by.clone(),
            created_at: ts(now)?,
        })
    }

    async fn get_post(
        &self,
        group: &GroupName,
        author: &UserName,
        permlink: &str,
    ) -> Result<Post, StoreError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts
              WHERE group_name = ? AND author = ? AND permlink = ?"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(&group.0)
            .bind(&author.0)
            .bind(permlink)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .ok_or(StoreError::NotFound)?;
        row.try_into()
    }

    async fn list_posts(
        &self,
        group: &GroupName,
        limit: Option<u32>,
    ) -> Result<Vec<Post>, StoreError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE group_name = ? ORDER BY id DESC LIMIT ?"
        );
        // LIMIT -1 is "no limit" in SQLite
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(&group.0)
            .bind(limit.map(i64::from).unwrap_or(-1))
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        collect(rows)
    }

    async fn delete_post(
        &self,
        group: &GroupName,
        author: &UserName,
        permlink: &str,
    ) -> Result<(), StoreError> {
        let result =
            sqlx::query("DELETE FROM posts WHERE group_name = ? AND author = ? AND permlink = ?")
                .bind(&group.0)
                .bind(&author.0)
                .bind(permlink)
                .execute(&self.pool)
                .await
                .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
