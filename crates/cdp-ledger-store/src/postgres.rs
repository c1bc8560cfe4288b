//! PostgreSQL storage implementation.
//!
//! This module provides the `PgStore` implementation of the `Store` trait.
//! Payback writes run in a transaction that first locks the code's deposit
//! rows with `SELECT ... FOR UPDATE`; a second payback for the same code blocks
//! there until the first commits, then sees its row when it sums the totals.

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use cdp_ledger_core::{
    CodeLedger, Deposit, DepositCreate, DepositId, DepositUpdate, NewUser, Payback,
    PaybackCreate, PaybackId, PaybackUpdate, Post, PostDetail, PostId, PostInput, PostQuery,
    PostWithVotes, User, UserId, UserProfile,
};

use crate::error::{Result, StoreError};
use crate::schema::all_tables;
use crate::Store;

/// Default maximum connections for the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const USER_COLUMNS: &str = "id, email, password, phone_number, created_at";

const DEPOSIT_COLUMNS: &str =
    "stt, depositor, depositor_pre, depositor_suf, amount, margin, code, published, created_at";

const PAYBACK_COLUMNS: &str = "stt, depositor, amount, code, published, created_at";

/// Post joined with its owner and vote count. Filter/paging clauses are
/// appended by the caller.
const POST_SELECT: &str = r"
    SELECT p.id, p.title, p.content, p.published, p.created_at, p.user_id,
           u.email AS owner_email, u.created_at AS owner_created_at,
           COUNT(v.post_id) AS votes
    FROM posts p
    JOIN users u ON u.id = p.user_id
    LEFT JOIN votes v ON v.post_id = p.id
";

/// PostgreSQL-backed storage implementation.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to `database_url` with up to `max_connections` pooled connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// Check that every table of the schema exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` naming the first missing table.
    pub async fn verify_schema(&self) -> Result<()> {
        for table in all_tables() {
            let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
                .bind(table)
                .fetch_one(&self.pool)
                .await?;
            if !exists {
                return Err(StoreError::Database(format!("missing table: {table}")));
            }
        }
        Ok(())
    }

    async fn fetch_post(&self, id: PostId) -> Result<Option<PostWithVotes>> {
        let sql = format!("{POST_SELECT} WHERE p.id = $1 GROUP BY p.id, u.id");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(post_from_row).transpose().map_err(Into::into)
    }

    async fn fetch_post_detail(&self, id: PostId) -> Result<PostDetail> {
        self.fetch_post(id)
            .await?
            .map(|p| p.post)
            .ok_or_else(|| StoreError::not_found("post", id))
    }
}

// =============================================================================
// Row mapping
// =============================================================================

fn user_from_row(row: &PgRow) -> sqlx::Result<User> {
    Ok(User {
        id: UserId::new(row.try_get("id")?),
        email: row.try_get("email")?,
        password_hash: row.try_get("password")?,
        phone_number: row.try_get("phone_number")?,
        created_at: row.try_get("created_at")?,
    })
}

fn post_from_row(row: &PgRow) -> sqlx::Result<PostWithVotes> {
    let user_id = UserId::new(row.try_get("user_id")?);
    Ok(PostWithVotes {
        post: PostDetail {
            post: Post {
                id: PostId::new(row.try_get("id")?),
                title: row.try_get("title")?,
                content: row.try_get("content")?,
                published: row.try_get("published")?,
                created_at: row.try_get("created_at")?,
                user_id,
            },
            owner: UserProfile {
                id: user_id,
                email: row.try_get("owner_email")?,
                created_at: row.try_get("owner_created_at")?,
            },
        },
        votes: row.try_get("votes")?,
    })
}

fn deposit_from_row(row: &PgRow) -> sqlx::Result<Deposit> {
    Ok(Deposit {
        stt: DepositId::new(row.try_get("stt")?),
        depositor: row.try_get("depositor")?,
        depositor_pre: row.try_get("depositor_pre")?,
        depositor_suf: row.try_get("depositor_suf")?,
        amount: row.try_get("amount")?,
        margin: row.try_get("margin")?,
        code: row.try_get("code")?,
        published: row.try_get("published")?,
        created_at: row.try_get("created_at")?,
    })
}

fn payback_from_row(row: &PgRow) -> sqlx::Result<Payback> {
    Ok(Payback {
        stt: PaybackId::new(row.try_get("stt")?),
        depositor: row.try_get("depositor")?,
        amount: row.try_get("amount")?,
        code: row.try_get("code")?,
        published: row.try_get("published")?,
        created_at: row.try_get("created_at")?,
    })
}

fn collect<T>(rows: &[PgRow], map: fn(&PgRow) -> sqlx::Result<T>) -> Result<Vec<T>> {
    rows.iter().map(map).collect::<sqlx::Result<_>>().map_err(Into::into)
}

/// Constraint violations the store translates into domain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Violation {
    Unique,
    ForeignKey,
}

fn violation(err: &sqlx::Error) -> Option<Violation> {
    let db = err.as_database_error()?;
    if db.is_unique_violation() {
        Some(Violation::Unique)
    } else if db.is_foreign_key_violation() {
        Some(Violation::ForeignKey)
    } else {
        None
    }
}

#[async_trait]
impl Store for PgStore {
    // =========================================================================
    // User Operations
    // =========================================================================

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (email, password, phone_number) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.phone_number)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match violation(&e) {
                Some(Violation::Unique) => StoreError::Conflict("user already exists".into()),
                _ => e.into(),
            })?;
        Ok(user_from_row(&row)?)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose().map_err(Into::into)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose().map_err(Into::into)
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", id));
        }
        Ok(())
    }

    // =========================================================================
    // Post Operations
    // =========================================================================

    async fn create_post(&self, owner: UserId, input: &PostInput) -> Result<PostDetail> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO posts (title, content, published, user_id) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.published)
        .bind(owner.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violation(&e) {
            Some(Violation::ForeignKey) => StoreError::not_found("user", owner),
            _ => e.into(),
        })?;

        self.fetch_post_detail(PostId::new(id)).await
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<PostWithVotes>> {
        let sql = format!(
            "{POST_SELECT} WHERE strpos(p.title, $1) > 0 GROUP BY p.id, u.id ORDER BY p.id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&sql)
            .bind(&query.search)
            .bind(query.limit())
            .bind(query.skip())
            .fetch_all(&self.pool)
            .await?;
        collect(&rows, post_from_row)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<PostWithVotes>> {
        self.fetch_post(id).await
    }

    async fn update_post(&self, id: PostId, input: &PostInput) -> Result<PostDetail> {
        let result =
            sqlx::query("UPDATE posts SET title = $2, content = $3, published = $4 WHERE id = $1")
                .bind(id.get())
                .bind(&input.title)
                .bind(&input.content)
                .bind(input.published)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("post", id));
        }
        self.fetch_post_detail(id).await
    }

    async fn delete_post(&self, id: PostId) -> Result<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("post", id));
        }
        Ok(())
    }

    // =========================================================================
    // Vote Operations
    // =========================================================================

    async fn add_vote(&self, user: UserId, post: PostId) -> Result<()> {
        sqlx::query("INSERT INTO votes (user_id, post_id) VALUES ($1, $2)")
            .bind(user.get())
            .bind(post.get())
            .execute(&self.pool)
            .await
            .map_err(|e| match violation(&e) {
                Some(Violation::Unique) => StoreError::Conflict(format!(
                    "user {user} has already voted on post {post}"
                )),
                Some(Violation::ForeignKey) => StoreError::not_found("post", post),
                None => e.into(),
            })?;
        Ok(())
    }

    async fn remove_vote(&self, user: UserId, post: PostId) -> Result<()> {
        let result = sqlx::query("DELETE FROM votes WHERE user_id = $1 AND post_id = $2")
            .bind(user.get())
            .bind(post.get())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("vote", format!("{user}/{post}")));
        }
        Ok(())
    }

    // =========================================================================
    // Deposit Operations
    // =========================================================================

    async fn create_deposit(&self, deposit: &DepositCreate) -> Result<Deposit> {
        let sql = format!(
            "INSERT INTO cdp (depositor, depositor_pre, depositor_suf, amount, margin, code, published)
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {DEPOSIT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&deposit.depositor)
            .bind(&deposit.depositor_pre)
            .bind(&deposit.depositor_suf)
            .bind(deposit.amount)
            .bind(deposit.margin)
            .bind(&deposit.code)
            .bind(deposit.published)
            .fetch_one(&self.pool)
            .await?;
        Ok(deposit_from_row(&row)?)
    }

    async fn list_deposits(&self) -> Result<Vec<Deposit>> {
        let sql = format!("SELECT {DEPOSIT_COLUMNS} FROM cdp ORDER BY stt");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        collect(&rows, deposit_from_row)
    }

    async fn get_deposit(&self, stt: DepositId) -> Result<Option<Deposit>> {
        let sql = format!("SELECT {DEPOSIT_COLUMNS} FROM cdp WHERE stt = $1");
        let row = sqlx::query(&sql)
            .bind(stt.get())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(deposit_from_row).transpose().map_err(Into::into)
    }

    async fn list_deposits_by_code(&self, code: &str) -> Result<Vec<Deposit>> {
        let sql = format!("SELECT {DEPOSIT_COLUMNS} FROM cdp WHERE code = $1 ORDER BY stt");
        let rows = sqlx::query(&sql).bind(code).fetch_all(&self.pool).await?;
        collect(&rows, deposit_from_row)
    }

    async fn update_deposit(&self, stt: DepositId, update: &DepositUpdate) -> Result<Deposit> {
        let sql = format!(
            "UPDATE cdp SET published = COALESCE($2, published) WHERE stt = $1 RETURNING {DEPOSIT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(stt.get())
            .bind(update.published)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("deposit", stt))?;
        Ok(deposit_from_row(&row)?)
    }

    // =========================================================================
    // Payback Operations
    // =========================================================================

    async fn list_paybacks(&self) -> Result<Vec<Payback>> {
        let sql = format!("SELECT {PAYBACK_COLUMNS} FROM cdp_payback ORDER BY stt");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        collect(&rows, payback_from_row)
    }

    async fn get_payback(&self, stt: PaybackId) -> Result<Option<Payback>> {
        let sql = format!("SELECT {PAYBACK_COLUMNS} FROM cdp_payback WHERE stt = $1");
        let row = sqlx::query(&sql)
            .bind(stt.get())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(payback_from_row).transpose().map_err(Into::into)
    }

    async fn list_paybacks_by_code(&self, code: &str) -> Result<Vec<Payback>> {
        let sql = format!("SELECT {PAYBACK_COLUMNS} FROM cdp_payback WHERE code = $1 ORDER BY stt");
        let rows = sqlx::query(&sql).bind(code).fetch_all(&self.pool).await?;
        collect(&rows, payback_from_row)
    }

    async fn code_ledger(&self, code: &str) -> Result<Option<CodeLedger>> {
        let deposits: Vec<i64> = sqlx::query_scalar("SELECT amount FROM cdp WHERE code = $1")
            .bind(code)
            .fetch_all(&self.pool)
            .await?;
        if deposits.is_empty() {
            return Ok(None);
        }
        let paybacks: Vec<i64> =
            sqlx::query_scalar("SELECT amount FROM cdp_payback WHERE code = $1")
                .bind(code)
                .fetch_all(&self.pool)
                .await?;
        Ok(Some(CodeLedger::from_amounts(code, deposits, paybacks)))
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    async fn create_payback(&self, payback: &PaybackCreate) -> Result<Payback> {
        let mut tx = self.pool.begin().await?;

        let deposits: Vec<i64> =
            sqlx::query_scalar("SELECT amount FROM cdp WHERE code = $1 FOR UPDATE")
                .bind(&payback.code)
                .fetch_all(&mut *tx)
                .await?;
        if deposits.is_empty() {
            return Err(StoreError::not_found("code", &payback.code));
        }
        let paybacks: Vec<i64> =
            sqlx::query_scalar("SELECT amount FROM cdp_payback WHERE code = $1")
                .bind(&payback.code)
                .fetch_all(&mut *tx)
                .await?;

        CodeLedger::from_amounts(&payback.code, deposits, paybacks)
            .ensure_payback_fits(payback.amount)?;

        let sql = format!(
            "INSERT INTO cdp_payback (depositor, amount, code, published, created_at)
             VALUES ($1, $2, $3, $4, COALESCE($5, NOW())) RETURNING {PAYBACK_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&payback.depositor)
            .bind(payback.amount)
            .bind(&payback.code)
            .bind(payback.published)
            .bind(payback.created_at)
            .fetch_one(&mut *tx)
            .await?;
        let record = payback_from_row(&row)?;

        tx.commit().await?;

        tracing::debug!(stt = %record.stt, code = %record.code, amount = record.amount, "Payback recorded");

        Ok(record)
    }

    async fn update_payback(&self, stt: PaybackId, update: &PaybackUpdate) -> Result<Payback> {
        let mut tx = self.pool.begin().await?;

        let code: String = sqlx::query_scalar("SELECT code FROM cdp_payback WHERE stt = $1")
            .bind(stt.get())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::not_found("payback", stt))?;

        if let Some(amount) = update.amount {
            let deposits: Vec<i64> =
                sqlx::query_scalar("SELECT amount FROM cdp WHERE code = $1 FOR UPDATE")
                    .bind(&code)
                    .fetch_all(&mut *tx)
                    .await?;
            let others: Vec<i64> = sqlx::query_scalar(
                "SELECT amount FROM cdp_payback WHERE code = $1 AND stt <> $2",
            )
            .bind(&code)
            .bind(stt.get())
            .fetch_all(&mut *tx)
            .await?;

            CodeLedger::from_amounts(&code, deposits, others).ensure_payback_fits(amount)?;
        }

        let sql = format!(
            "UPDATE cdp_payback
             SET published = COALESCE($2, published), amount = COALESCE($3, amount)
             WHERE stt = $1 RETURNING {PAYBACK_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(stt.get())
            .bind(update.published)
            .bind(update.amount)
            .fetch_one(&mut *tx)
            .await?;
        let record = payback_from_row(&row)?;

        tx.commit().await?;

        Ok(record)
    }
}
