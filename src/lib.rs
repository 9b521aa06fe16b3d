//! Closetly - Wardrobe Sharing CLI
//!
//! Closetly is an interactive terminal client for a MySQL-backed wardrobe
//! database: personal closets, a collaborative closet users lend from, store
//! inventories and styled outfits.
//!
//! # Core Principles
//! - One live database session per process, owned by [`SessionManager`]
//! - Each role runs under its own least-privilege database account
//! - Every statement is prepared, user input is always bound
//! - Database secrets come from configuration or the environment
//!
//! # Architecture
//! Flows are generic over [`Connector`] and [`Terminal`]. The binary wires
//! them to [`MySqlConnector`] and [`DialoguerTerminal`]; tests drive the same
//! flows with scripted input and an in-memory connector.
//!
//! # Module Organization
//! - [`error`] - Error types, exit codes and user-facing messages
//! - [`role`] - Role tags and their database accounts
//! - [`engine`] - Connector/session traits and core types
//! - [`config`] - Server address and credential configuration
//! - [`terminal`] - Prompt abstraction
//! - [`session`] - Ownership of the live session and account switching
//! - [`provision`] - Account creation
//! - [`auth`] - Login and role resolution
//! - [`catalog`] - Wardrobe queries
//! - [`display`] - Table rendering
//! - [`menu`] - Menu controller

pub mod auth;
pub mod catalog;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod menu;
pub mod provision;
pub mod role;
pub mod session;
pub mod terminal;

pub use auth::{login, LoggedIn, LoginOutcome};
pub use config::{load_with_precedence, ClientConfig, CredentialSource};
pub use engine::mysql::MySqlConnector;
pub use engine::{Connector, DbCredential, Query, QueryResult, ServerAddress, Session};
pub use error::{ClosetlyError, ConnectionErrorKind, Result};
pub use menu::MenuCommand;
pub use role::RoleTag;
pub use session::SessionManager;
pub use terminal::{DialoguerTerminal, ScriptedTerminal, Terminal};
