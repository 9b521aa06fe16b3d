//! MySQL Database Engine Implementation
//!
//! This module implements [`Connector`] and [`Session`] for MySQL (including MariaDB).
//!
//! # Features
//! - Client-server connections via TCP, one account per session
//! - Login checks through the `authenticate` stored function
//! - Atomic account provisioning (`sp_add_user`, `add_to_user`, role row)
//! - Prepared statements for every query, parameters always bound
//!
//! # Implementation Notes
//! - Uses `mysql_async` (async driver, requires tokio runtime)
//! - Server error codes are mapped to [`ConnectionErrorKind`]
//! - DECIMAL and string columns arrive as bytes and are decoded as UTF-8
//! - BLOB data is Base64-encoded

use mysql_async::{prelude::*, Conn, OptsBuilder, Params, Row, Transaction, TxOpts, Value};

use crate::engine::{
    is_truthy, Connector, DbCredential, ExecResult, NewIdentity, Query, QueryParam, QueryResult,
    ServerAddress, Session,
};
use crate::error::{ClosetlyError, ConnectionErrorKind, Result};

/// MySQL server error: access denied for user
const ER_ACCESS_DENIED_ERROR: u16 = 1045;
/// MySQL server error: unknown database
const ER_BAD_DB_ERROR: u16 = 1049;

const USERNAME_COUNT_SQL: &str = "SELECT COUNT(*) FROM user_info WHERE username = ?";
const AUTHENTICATE_SQL: &str = "SELECT authenticate(?, ?)";
const ROLE_TAG_SQL: &str = "SELECT role_tag FROM user_permissions WHERE username = ?";
const ADD_LOGIN_SQL: &str = "CALL sp_add_user(?, ?)";
const ADD_PROFILE_SQL: &str = "CALL add_to_user(?, ?)";
const ADD_ROLE_SQL: &str = "INSERT INTO user_permissions (username, role_tag) VALUES (?, ?)";

/// Opens MySQL sessions against one server
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    address: ServerAddress,
}

impl MySqlConnector {
    /// Create a connector for `address`
    #[must_use]
    pub const fn new(address: ServerAddress) -> Self {
        Self { address }
    }

    /// Server this connector targets
    #[must_use]
    pub const fn address(&self) -> &ServerAddress {
        &self.address
    }
}

impl Connector for MySqlConnector {
    type Session = MySqlSession;

    async fn open(&self, credential: &DbCredential) -> Result<MySqlSession> {
        let opts = build_mysql_opts(&self.address, credential);

        tracing::debug!(
            account = %credential.user,
            host = %self.address.host,
            port = self.address.port,
            database = %self.address.database,
            "opening MySQL session"
        );

        let conn = Conn::new(opts).await.map_err(|e| {
            let err = connection_error(&e);
            tracing::warn!(account = %credential.user, error = %err, "MySQL connection failed");
            err
        })?;

        Ok(MySqlSession { conn, account: credential.user.clone() })
    }
}

/// A live MySQL connection under one database account
pub struct MySqlSession {
    conn: Conn,
    account: String,
}

impl Session for MySqlSession {
    fn account(&self) -> &str {
        &self.account
    }

    async fn username_exists(&mut self, username: &str) -> Result<bool> {
        let row: Option<Row> =
            self.conn.exec_first(USERNAME_COUNT_SQL, (username,)).await.map_err(|e| query_error(&e))?;

        // COUNT(*) comes back as an integer; exactly one match means the name is taken
        let count = first_column(row.as_ref())?;
        Ok(count.as_i64() == Some(1) || count.as_u64() == Some(1))
    }

    async fn authenticate(&mut self, username: &str, password: &str) -> Result<bool> {
        let row: Option<Row> = self
            .conn
            .exec_first(AUTHENTICATE_SQL, (username, password))
            .await
            .map_err(|e| query_error(&e))?;

        Ok(is_truthy(&first_column(row.as_ref())?))
    }

    async fn role_tag(&mut self, username: &str) -> Result<Option<String>> {
        let row: Option<Row> =
            self.conn.exec_first(ROLE_TAG_SQL, (username,)).await.map_err(|e| query_error(&e))?;

        match first_column(row.as_ref())? {
            serde_json::Value::String(tag) => Ok(Some(tag)),
            serde_json::Value::Null => Ok(None),
            other => Ok(Some(other.to_string())),
        }
    }

    async fn create_identity(&mut self, identity: &NewIdentity) -> Result<()> {
        let mut tx =
            self.conn.start_transaction(TxOpts::default()).await.map_err(|e| query_error(&e))?;

        match provision_steps(&mut tx, identity).await {
            Ok(()) => tx.commit().await.map_err(|e| query_error(&e)),
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, "rollback of account provisioning failed");
                }
                Err(err)
            }
        }
    }

    async fn fetch(&mut self, query: &Query) -> Result<QueryResult> {
        let rows: Vec<Row> =
            self.conn.exec(query.sql, to_params(&query.params)).await.map_err(|e| query_error(&e))?;

        let values = rows.iter().map(row_values).collect::<Result<Vec<_>>>()?;
        QueryResult::labeled(query.columns, values)
    }

    async fn execute(&mut self, query: &Query) -> Result<ExecResult> {
        self.conn.exec_drop(query.sql, to_params(&query.params)).await.map_err(|e| query_error(&e))?;

        Ok(ExecResult {
            rows_affected: self.conn.affected_rows(),
            last_insert_id: self.conn.last_insert_id(),
        })
    }

    async fn close(self) -> Result<()> {
        tracing::debug!(account = %self.account, "closing MySQL session");
        self.conn.disconnect().await.map_err(|e| {
            ClosetlyError::connection(ConnectionErrorKind::Other, format!("Failed to disconnect: {e}"))
        })
    }
}

/// Login row, profile row and role row, in that order
async fn provision_steps(tx: &mut Transaction<'_>, identity: &NewIdentity) -> Result<()> {
    tx.exec_drop(ADD_LOGIN_SQL, (identity.username.as_str(), identity.password.as_str()))
        .await
        .map_err(|e| query_error(&e))?;

    tx.exec_drop(ADD_PROFILE_SQL, (identity.name.as_str(), identity.username.as_str()))
        .await
        .map_err(|e| query_error(&e))?;

    tx.exec_drop(ADD_ROLE_SQL, (identity.username.as_str(), identity.role.as_str()))
        .await
        .map_err(|e| query_error(&e))?;

    Ok(())
}

/// Build MySQL connection options from the server address and a credential
fn build_mysql_opts(address: &ServerAddress, credential: &DbCredential) -> OptsBuilder {
    OptsBuilder::default()
        .ip_or_hostname(address.host.clone())
        .tcp_port(address.port)
        .user(Some(credential.user.clone()))
        .pass(Some(credential.password.clone()))
        .db_name(Some(address.database.clone()))
}

/// Convert bound parameters to driver parameters
fn to_params(params: &[QueryParam]) -> Params {
    if params.is_empty() {
        return Params::Empty;
    }

    Params::Positional(
        params
            .iter()
            .map(|param| match param {
                QueryParam::Text(s) => Value::from(s.as_str()),
                QueryParam::Int(i) => Value::from(*i),
                QueryParam::Float(f) => Value::from(*f),
            })
            .collect(),
    )
}

/// Map a server error code seen while connecting to a failure kind
const fn classify_server_code(code: u16) -> ConnectionErrorKind {
    match code {
        ER_ACCESS_DENIED_ERROR => ConnectionErrorKind::AccessDenied,
        ER_BAD_DB_ERROR => ConnectionErrorKind::UnknownDatabase,
        _ => ConnectionErrorKind::Other,
    }
}

/// Error raised while opening a connection
fn connection_error(err: &mysql_async::Error) -> ClosetlyError {
    let kind = match err {
        mysql_async::Error::Server(server) => classify_server_code(server.code),
        mysql_async::Error::Io(_) => ConnectionErrorKind::Unreachable,
        _ => ConnectionErrorKind::Other,
    };
    ClosetlyError::connection(kind, err.to_string())
}

/// Error raised while running a statement on an open connection
///
/// Socket failures mean the session is gone and are reported as connection errors.
fn query_error(err: &mysql_async::Error) -> ClosetlyError {
    match err {
        mysql_async::Error::Io(_) => {
            ClosetlyError::connection(ConnectionErrorKind::Unreachable, err.to_string())
        }
        mysql_async::Error::Server(server) => ClosetlyError::query_failed(server.message.clone()),
        _ => ClosetlyError::query_failed(err.to_string()),
    }
}

/// First column of an optional single-row result (`NULL` when there is no row)
fn first_column(row: Option<&Row>) -> Result<serde_json::Value> {
    match row {
        Some(row) if !row.is_empty() => mysql_value_to_json(row, 0),
        _ => Ok(serde_json::Value::Null),
    }
}

/// Convert every column of a row to JSON values
fn row_values(row: &Row) -> Result<Vec<serde_json::Value>> {
    (0..row.len()).map(|idx| mysql_value_to_json(row, idx)).collect()
}

/// Convert a MySQL column value to a JSON value
fn mysql_value_to_json(row: &Row, idx: usize) -> Result<serde_json::Value> {
    let value = row.as_ref(idx).ok_or_else(|| {
        ClosetlyError::query_failed(format!("Failed to get value at index {idx}"))
    })?;

    Ok(value_to_json(value))
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::NULL => serde_json::Value::Null,

        Value::Bytes(bytes) => {
            if let Ok(s) = std::str::from_utf8(bytes) {
                serde_json::Value::String(s.to_string())
            } else {
                // Binary data - encode as Base64
                use base64::Engine;
                serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
        }

        Value::Int(i) => serde_json::Value::Number((*i).into()),

        Value::UInt(u) => serde_json::json!(*u),

        Value::Float(f) => serde_json::Number::from_f64(f64::from(*f))
            .map_or(serde_json::Value::Null, serde_json::Value::Number),

        Value::Double(d) => {
            serde_json::Number::from_f64(*d).map_or(serde_json::Value::Null, serde_json::Value::Number)
        }

        Value::Date(year, month, day, hour, minute, second, micro) => serde_json::Value::String(
            format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}.{micro:06}"),
        ),

        Value::Time(is_negative, days, hours, minutes, seconds, micros) => {
            let sign = if *is_negative { "-" } else { "" };
            let total_hours = days * 24 + u32::from(*hours);
            serde_json::Value::String(format!(
                "{sign}{total_hours}:{minutes:02}:{seconds:02}.{micros:06}"
            ))
        }
    }
}
