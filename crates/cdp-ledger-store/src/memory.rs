//! In-memory storage implementation.
//!
//! All tables live behind one `RwLock`, so every compound operation holds the
//! write lock from its first read to its last write.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use cdp_ledger_core::{
    CodeLedger, Deposit, DepositCreate, DepositId, DepositUpdate, NewUser, Payback,
    PaybackCreate, PaybackId, PaybackUpdate, Post, PostDetail, PostId, PostInput, PostQuery,
    PostWithVotes, User, UserId,
};

use crate::error::{Result, StoreError};
use crate::Store;

/// Serial counters, one per table.
#[derive(Debug, Default)]
struct Sequences {
    users: i32,
    posts: i32,
    deposits: i32,
    paybacks: i32,
}

fn next(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    posts: BTreeMap<PostId, Post>,
    votes: BTreeSet<(UserId, PostId)>,
    deposits: BTreeMap<DepositId, Deposit>,
    paybacks: BTreeMap<PaybackId, Payback>,
    seq: Sequences,
}

impl Tables {
    fn detail(&self, post: &Post) -> Result<PostDetail> {
        let owner = self.users.get(&post.user_id).ok_or_else(|| {
            StoreError::Database(format!(
                "post {} references missing user {}",
                post.id, post.user_id
            ))
        })?;
        Ok(PostDetail {
            post: post.clone(),
            owner: owner.profile(),
        })
    }

    fn with_votes(&self, post: &Post) -> Result<PostWithVotes> {
        let votes = self.votes.iter().filter(|(_, p)| *p == post.id).count();
        Ok(PostWithVotes {
            post: self.detail(post)?,
            votes: i64::try_from(votes).unwrap_or(i64::MAX),
        })
    }

    /// Totals for `code`, leaving out the payback `exclude` if given.
    fn ledger(&self, code: &str, exclude: Option<PaybackId>) -> CodeLedger {
        CodeLedger::from_amounts(
            code,
            self.deposits
                .values()
                .filter(|d| d.code == code)
                .map(|d| d.amount),
            self.paybacks
                .values()
                .filter(|p| p.code == code && Some(p.stt) != exclude)
                .map(|p| p.amount),
        )
    }

    fn has_deposits(&self, code: &str) -> bool {
        self.deposits.values().any(|d| d.code == code)
    }
}

/// Storage backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    // =========================================================================
    // User Operations
    // =========================================================================

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email already registered: {}",
                user.email
            )));
        }
        if let Some(phone) = &user.phone_number {
            if tables
                .users
                .values()
                .any(|u| u.phone_number.as_ref() == Some(phone))
            {
                return Err(StoreError::Conflict(format!(
                    "phone number already registered: {phone}"
                )));
            }
        }

        let id = UserId::new(next(&mut tables.seq.users));
        let record = User {
            id,
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            phone_number: user.phone_number.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(id, record.clone());
        Ok(record)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        let mut tables = self.tables.write().await;

        if tables.users.remove(&id).is_none() {
            return Err(StoreError::not_found("user", id));
        }

        let owned: BTreeSet<PostId> = tables
            .posts
            .values()
            .filter(|p| p.user_id == id)
            .map(|p| p.id)
            .collect();
        tables.posts.retain(|post_id, _| !owned.contains(post_id));
        tables
            .votes
            .retain(|(user_id, post_id)| *user_id != id && !owned.contains(post_id));

        Ok(())
    }

    // =========================================================================
    // Post Operations
    // =========================================================================

    async fn create_post(&self, owner: UserId, input: &PostInput) -> Result<PostDetail> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&owner) {
            return Err(StoreError::not_found("user", owner));
        }

        let id = PostId::new(next(&mut tables.seq.posts));
        let post = Post {
            id,
            title: input.title.clone(),
            content: input.content.clone(),
            published: input.published,
            created_at: Utc::now(),
            user_id: owner,
        };
        tables.posts.insert(id, post.clone());
        tables.detail(&post)
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<PostWithVotes>> {
        let tables = self.tables.read().await;
        let skip = usize::try_from(query.skip()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit()).unwrap_or(0);

        tables
            .posts
            .values()
            .filter(|p| p.title.contains(&query.search))
            .skip(skip)
            .take(limit)
            .map(|p| tables.with_votes(p))
            .collect()
    }

    async fn get_post(&self, id: PostId) -> Result<Option<PostWithVotes>> {
        let tables = self.tables.read().await;
        tables
            .posts
            .get(&id)
            .map(|p| tables.with_votes(p))
            .transpose()
    }

    async fn update_post(&self, id: PostId, input: &PostInput) -> Result<PostDetail> {
        let mut tables = self.tables.write().await;

        let post = tables
            .posts
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("post", id))?;
        post.title.clone_from(&input.title);
        post.content.clone_from(&input.content);
        post.published = input.published;

        let post = post.clone();
        tables.detail(&post)
    }

    async fn delete_post(&self, id: PostId) -> Result<()> {
        let mut tables = self.tables.write().await;

        if tables.posts.remove(&id).is_none() {
            return Err(StoreError::not_found("post", id));
        }
        tables.votes.retain(|(_, post_id)| *post_id != id);
        Ok(())
    }

    // =========================================================================
    // Vote Operations
    // =========================================================================

    async fn add_vote(&self, user: UserId, post: PostId) -> Result<()> {
        let mut tables = self.tables.write().await;

        if !tables.posts.contains_key(&post) {
            return Err(StoreError::not_found("post", post));
        }
        if !tables.votes.insert((user, post)) {
            return Err(StoreError::Conflict(format!(
                "user {user} has already voted on post {post}"
            )));
        }
        Ok(())
    }

    async fn remove_vote(&self, user: UserId, post: PostId) -> Result<()> {
        let mut tables = self.tables.write().await;

        if !tables.votes.remove(&(user, post)) {
            return Err(StoreError::not_found("vote", format!("{user}/{post}")));
        }
        Ok(())
    }

    // =========================================================================
    // Deposit Operations
    // =========================================================================

    async fn create_deposit(&self, deposit: &DepositCreate) -> Result<Deposit> {
        let mut tables = self.tables.write().await;

        let stt = DepositId::new(next(&mut tables.seq.deposits));
        let record = Deposit {
            stt,
            depositor: deposit.depositor.clone(),
            depositor_pre: deposit.depositor_pre.clone(),
            depositor_suf: deposit.depositor_suf.clone(),
            amount: deposit.amount,
            margin: deposit.margin,
            code: deposit.code.clone(),
            published: deposit.published,
            created_at: Utc::now(),
        };
        tables.deposits.insert(stt, record.clone());
        Ok(record)
    }

    async fn list_deposits(&self) -> Result<Vec<Deposit>> {
        Ok(self.tables.read().await.deposits.values().cloned().collect())
    }

    async fn get_deposit(&self, stt: DepositId) -> Result<Option<Deposit>> {
        Ok(self.tables.read().await.deposits.get(&stt).cloned())
    }

    async fn list_deposits_by_code(&self, code: &str) -> Result<Vec<Deposit>> {
        let tables = self.tables.read().await;
        Ok(tables
            .deposits
            .values()
            .filter(|d| d.code == code)
            .cloned()
            .collect())
    }

    async fn update_deposit(&self, stt: DepositId, update: &DepositUpdate) -> Result<Deposit> {
        let mut tables = self.tables.write().await;

        let deposit = tables
            .deposits
            .get_mut(&stt)
            .ok_or_else(|| StoreError::not_found("deposit", stt))?;
        if let Some(published) = update.published {
            deposit.published = published;
        }
        Ok(deposit.clone())
    }

    // =========================================================================
    // Payback Operations
    // =========================================================================

    async fn list_paybacks(&self) -> Result<Vec<Payback>> {
        Ok(self.tables.read().await.paybacks.values().cloned().collect())
    }

    async fn get_payback(&self, stt: PaybackId) -> Result<Option<Payback>> {
        Ok(self.tables.read().await.paybacks.get(&stt).cloned())
    }

    async fn list_paybacks_by_code(&self, code: &str) -> Result<Vec<Payback>> {
        let tables = self.tables.read().await;
        Ok(tables
            .paybacks
            .values()
            .filter(|p| p.code == code)
            .cloned()
            .collect())
    }

    async fn code_ledger(&self, code: &str) -> Result<Option<CodeLedger>> {
        let tables = self.tables.read().await;
        if !tables.has_deposits(code) {
            return Ok(None);
        }
        Ok(Some(tables.ledger(code, None)))
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    async fn create_payback(&self, payback: &PaybackCreate) -> Result<Payback> {
        let mut tables = self.tables.write().await;

        if !tables.has_deposits(&payback.code) {
            return Err(StoreError::not_found("code", &payback.code));
        }
        tables
            .ledger(&payback.code, None)
            .ensure_payback_fits(payback.amount)?;

        let stt = PaybackId::new(next(&mut tables.seq.paybacks));
        let record = Payback {
            stt,
            depositor: payback.depositor.clone(),
            amount: payback.amount,
            code: payback.code.clone(),
            published: payback.published,
            created_at: payback.created_at.unwrap_or_else(Utc::now),
        };
        tables.paybacks.insert(stt, record.clone());

        tracing::debug!(stt = %stt, code = %record.code, amount = record.amount, "Payback recorded");

        Ok(record)
    }

    async fn update_payback(&self, stt: PaybackId, update: &PaybackUpdate) -> Result<Payback> {
        let mut tables = self.tables.write().await;

        let code = tables
            .paybacks
            .get(&stt)
            .map(|p| p.code.clone())
            .ok_or_else(|| StoreError::not_found("payback", stt))?;

        if let Some(amount) = update.amount {
            tables
                .ledger(&code, Some(stt))
                .ensure_payback_fits(amount)?;
        }

        let payback = tables
            .paybacks
            .get_mut(&stt)
            .ok_or_else(|| StoreError::not_found("payback", stt))?;
        if let Some(published) = update.published {
            payback.published = published;
        }
        if let Some(amount) = update.amount {
            payback.amount = amount;
        }
        Ok(payback.clone())
    }
}
