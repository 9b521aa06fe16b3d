//! Database Engine Traits and Core Types
//!
//! This module defines the seams between Closetly's flows and the database.
//! A [`Connector`] opens sessions for a database credential; a [`Session`]
//! answers the login questions and runs catalog queries.
//!
//! # Ownership
//! A session is owned by exactly one holder (the `SessionManager`) and is
//! consumed by [`Session::close`]. Nothing keeps a connection in global state.
//!
//! # Parameter Binding
//! Queries carry SQL text with `?` placeholders plus a list of
//! [`QueryParam`] values. User input is never spliced into SQL text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

use crate::error::{ClosetlyError, Result};
use crate::role::RoleTag;

pub mod mysql;

/// Server location shared by every role credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAddress {
    /// Hostname
    pub host: String,

    /// Port number
    pub port: u16,

    /// Database (schema) name
    pub database: String,
}

impl Default for ServerAddress {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            // MAMP's MySQL port
            port: 8889,
            database: "closetly".to_string(),
        }
    }
}

/// Database account used to open a session
///
/// WARNING: `password` is sensitive. `Debug` redacts it and it must never be
/// logged or included in error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct DbCredential {
    /// Database account name
    pub user: String,

    /// Account secret
    pub password: String,
}

impl DbCredential {
    /// Create a new credential
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self { user: user.into(), password: password.into() }
    }

    /// Whether two credentials name the same database account
    #[must_use]
    pub fn same_account(&self, other: &Self) -> bool {
        self.user == other.user
    }
}

impl fmt::Debug for DbCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbCredential")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A value bound to a `?` placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    /// Text value
    Text(String),
    /// Integer value
    Int(i64),
    /// Floating point value (prices, discounts)
    Float(f64),
}

impl From<&str> for QueryParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for QueryParam {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for QueryParam {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A parameterized statement together with the column labels of its result
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// SQL text with `?` placeholders
    pub sql: &'static str,

    /// Bound parameters, in placeholder order
    pub params: Vec<QueryParam>,

    /// Column labels for the result set (empty for statements without rows)
    pub columns: &'static [&'static str],
}

impl Query {
    /// Create a query without parameters
    #[must_use]
    pub const fn new(sql: &'static str, columns: &'static [&'static str]) -> Self {
        Self { sql, params: Vec::new(), columns }
    }

    /// Bind the next placeholder
    #[must_use]
    pub fn bind(mut self, param: impl Into<QueryParam>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Number of `?` placeholders in the SQL text
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

/// Rows returned by a query, labeled with the query's column schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names in result set
    pub columns: Vec<String>,

    /// Result rows, values ordered like `columns`
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl QueryResult {
    /// Label raw rows with a column schema
    ///
    /// Every row must have exactly one value per column.
    pub fn labeled(columns: &[&str], rows: Vec<Vec<serde_json::Value>>) -> Result<Self> {
        if let Some(bad) = rows.iter().find(|row| row.len() != columns.len()) {
            return Err(ClosetlyError::query_failed(format!(
                "Result has {} values per row but {} columns were expected",
                bad.len(),
                columns.len()
            )));
        }

        Ok(Self { columns: columns.iter().map(|c| (*c).to_string()).collect(), rows })
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of the first column of the first row, if any
    #[must_use]
    pub fn first_value(&self) -> Option<&serde_json::Value> {
        self.rows.first().and_then(|row| row.first())
    }
}

/// Interpret a scalar result from a stored function or procedure as a flag
///
/// Numbers are true when non-zero, strings when they parse to a non-zero
/// number or read `true`; `NULL` is false.
#[must_use]
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s.parse::<f64>().is_ok_and(|f| f != 0.0)
        }
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => false,
    }
}

/// Outcome of a statement that does not return rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    /// Number of rows affected
    pub rows_affected: u64,

    /// Auto-increment id generated by an INSERT
    pub last_insert_id: Option<u64>,
}

/// Data for a new login identity
#[derive(Clone, PartialEq, Eq)]
pub struct NewIdentity {
    /// Display name (first and last)
    pub name: String,

    /// Login name, at most 20 characters
    pub username: String,

    /// Login secret, at most 20 characters
    pub password: String,

    /// Role chosen at creation time
    pub role: RoleTag,
}

impl fmt::Debug for NewIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewIdentity")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Factory for database sessions
pub trait Connector {
    /// Session type produced by this connector
    type Session: Session;

    /// Open a session under `credential`
    ///
    /// Fails with [`ClosetlyError::Connection`] when the account is rejected,
    /// the database is missing or the host cannot be reached.
    fn open(&self, credential: &DbCredential) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// A live database session
pub trait Session: Send {
    /// Database account this session runs under
    fn account(&self) -> &str;

    /// Whether exactly one identity row matches `username`
    fn username_exists(&mut self, username: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Check a username/password pair with the server-side `authenticate` function
    fn authenticate(
        &mut self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Stored role tag for `username`, or `None` when no role row exists
    fn role_tag(&mut self, username: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Create the login, profile and role rows for a new identity in one transaction
    fn create_identity(&mut self, identity: &NewIdentity) -> impl Future<Output = Result<()>> + Send;

    /// Run a query that returns rows
    fn fetch(&mut self, query: &Query) -> impl Future<Output = Result<QueryResult>> + Send;

    /// Run a statement that does not return rows
    fn execute(&mut self, query: &Query) -> impl Future<Output = Result<ExecResult>> + Send;

    /// Close the session
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credential_debug_redacts_password() {
        let cred = DbCredential::new("appadmin", "adminpw");
        let debug = format!("{cred:?}");
        assert!(debug.contains("appadmin"));
        assert!(!debug.contains("adminpw"));
    }

    #[test]
    fn test_new_identity_debug_redacts_password() {
        let identity = NewIdentity {
            name: "Alice Smith".to_string(),
            username: "alice".to_string(),
            password: "hunter2".to_string(),
            role: RoleTag::Personal,
        };
        assert!(!format!("{identity:?}").contains("hunter2"));
    }

    #[test]
    fn test_same_account() {
        let a = DbCredential::new("personal", "one");
        let b = DbCredential::new("personal", "two");
        let c = DbCredential::new("stylist", "one");
        assert!(a.same_account(&b));
        assert!(!a.same_account(&c));
    }

    #[test]
    fn test_query_bind_order() {
        let query = Query::new("SELECT a FROM t WHERE b = ? AND c >= ?", &["a"]).bind("x").bind(3_i64);
        assert_eq!(query.params, vec![QueryParam::Text("x".to_string()), QueryParam::Int(3)]);
        assert_eq!(query.placeholder_count(), 2);
    }

    #[test]
    fn test_labeled_result() {
        let result = QueryResult::labeled(&["id", "name"], vec![vec![json!(1), json!("coat")]]).unwrap();
        assert_eq!(result.columns, vec!["id".to_string(), "name".to_string()]);
        assert_eq!(result.len(), 1);
        assert_eq!(result.first_value(), Some(&json!(1)));
    }

    #[test]
    fn test_labeled_result_width_mismatch() {
        let result = QueryResult::labeled(&["id", "name"], vec![vec![json!(1)]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("1")));
        assert!(is_truthy(&json!(true)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("0")));
        assert!(!is_truthy(&serde_json::Value::Null));
    }

    #[test]
    fn test_default_server_address() {
        let addr = ServerAddress::default();
        assert_eq!(addr.host, "localhost");
        assert_eq!(addr.database, "closetly");
    }
}
