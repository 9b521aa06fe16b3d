//! In-memory connector shared by the flow tests
//!
//! All sessions opened by one [`FakeConnector`] share a [`FakeDb`], so tests
//! can inspect which accounts were opened and closed, what was provisioned
//! and which statements ran.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use closetly::config::CredentialSource;
use closetly::engine::{ExecResult, NewIdentity, Query, QueryResult};
use closetly::{ClosetlyError, Connector, ConnectionErrorKind, DbCredential, Result, RoleTag, Session};

/// Stored login identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeIdentity {
    pub name: String,
    pub password: String,
    pub role_tag: Option<String>,
}

#[derive(Debug, Default)]
pub struct FakeDb {
    pub identities: BTreeMap<String, FakeIdentity>,
    /// `open:<account>` / `close:<account>` in order
    pub events: Vec<String>,
    /// Accounts whose sessions fail to open
    pub rejected_accounts: HashSet<String>,
    /// Canned result rows keyed by SQL text
    pub rows: HashMap<&'static str, Vec<Vec<serde_json::Value>>>,
    /// Statements that fail with a query error
    pub failing_sql: HashSet<&'static str>,
    pub fail_provisioning: bool,
    /// Account each identity was provisioned under
    pub provisioned_under: Vec<(String, String)>,
    pub fetched: Vec<Query>,
    pub executed: Vec<Query>,
}

/// Connector whose sessions share one [`FakeDb`]
#[derive(Debug, Clone, Default)]
pub struct FakeConnector {
    db: Arc<Mutex<FakeDb>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn db(&self) -> MutexGuard<'_, FakeDb> {
        self.db.lock().unwrap()
    }

    /// Add an identity with a role row
    pub fn with_identity(self, username: &str, password: &str, role: RoleTag) -> Self {
        self.db().identities.insert(
            username.to_string(),
            FakeIdentity {
                name: username.to_string(),
                password: password.to_string(),
                role_tag: Some(role.as_str().to_string()),
            },
        );
        self
    }

    pub fn with_rows(self, query: &Query, rows: Vec<Vec<serde_json::Value>>) -> Self {
        self.db().rows.insert(query.sql, rows);
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.db().events.clone()
    }
}

impl Connector for FakeConnector {
    type Session = FakeSession;

    async fn open(&self, credential: &DbCredential) -> Result<FakeSession> {
        let mut db = self.db();
        if db.rejected_accounts.contains(&credential.user) {
            return Err(ClosetlyError::connection(
                ConnectionErrorKind::AccessDenied,
                format!("Access denied for user '{}'", credential.user),
            ));
        }
        db.events.push(format!("open:{}", credential.user));
        Ok(FakeSession { db: Arc::clone(&self.db), account: credential.user.clone() })
    }
}

pub struct FakeSession {
    db: Arc<Mutex<FakeDb>>,
    account: String,
}

impl FakeSession {
    fn db(&self) -> MutexGuard<'_, FakeDb> {
        self.db.lock().unwrap()
    }
}

impl Session for FakeSession {
    fn account(&self) -> &str {
        &self.account
    }

    async fn username_exists(&mut self, username: &str) -> Result<bool> {
        Ok(self.db().identities.contains_key(username))
    }

    async fn authenticate(&mut self, username: &str, password: &str) -> Result<bool> {
        Ok(self.db().identities.get(username).is_some_and(|identity| identity.password == password))
    }

    async fn role_tag(&mut self, username: &str) -> Result<Option<String>> {
        Ok(self.db().identities.get(username).and_then(|identity| identity.role_tag.clone()))
    }

    async fn create_identity(&mut self, identity: &NewIdentity) -> Result<()> {
        let account = self.account.clone();
        let mut db = self.db();
        if db.fail_provisioning {
            return Err(ClosetlyError::query_failed("Duplicate entry for user_info"));
        }
        db.identities.insert(
            identity.username.clone(),
            FakeIdentity {
                name: identity.name.clone(),
                password: identity.password.clone(),
                role_tag: Some(identity.role.as_str().to_string()),
            },
        );
        db.provisioned_under.push((identity.username.clone(), account));
        Ok(())
    }

    async fn fetch(&mut self, query: &Query) -> Result<QueryResult> {
        let mut db = self.db();
        db.fetched.push(query.clone());
        if db.failing_sql.contains(query.sql) {
            return Err(ClosetlyError::query_failed("Table 'closetly.clothes' doesn't exist"));
        }
        let rows = db.rows.get(query.sql).cloned().unwrap_or_default();
        QueryResult::labeled(query.columns, rows)
    }

    async fn execute(&mut self, query: &Query) -> Result<ExecResult> {
        let mut db = self.db();
        db.executed.push(query.clone());
        if db.failing_sql.contains(query.sql) {
            return Err(ClosetlyError::query_failed("Cannot add or update a child row"));
        }
        Ok(ExecResult { rows_affected: 1, last_insert_id: Some(7) })
    }

    async fn close(self) -> Result<()> {
        self.db().events.push(format!("close:{}", self.account));
        Ok(())
    }
}

/// Every role maps to its default account with a fixed password
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAccounts;

impl CredentialSource for DefaultAccounts {
    fn credential_for(&self, role: RoleTag) -> Result<DbCredential> {
        Ok(DbCredential::new(role.default_account(), format!("{}-secret", role.as_str())))
    }
}

/// Credential the flows start under
pub fn bootstrap() -> DbCredential {
    DbCredential::new(RoleTag::Admin.default_account(), "admin-secret")
}
