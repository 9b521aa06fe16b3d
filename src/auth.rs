//! Login and Role Resolution
//!
//! The login flow runs over the bootstrap session:
//!
//! 1. Ask for a username and check that it exists.
//! 2. Known user: check the password with the server, resolve the user's
//!    role, then reopen the session under that role's database account.
//! 3. Unknown user: offer to create an account. The session is reopened
//!    under the chosen role's account *before* the identity is created, so
//!    creation runs over the new connection.
//!
//! A wrong password ends the flow; there is no retry. Every re-prompt is a
//! loop over a fixed set of answers.

use crate::config::CredentialSource;
use crate::engine::{Connector, NewIdentity, Session};
use crate::error::{ClosetlyError, Result};
use crate::provision::{self, exceeds_field_len, MAX_FIELD_LEN};
use crate::role::RoleTag;
use crate::session::SessionManager;
use crate::terminal::Terminal;

pub const INCORRECT_LOGIN: &str = "Incorrect login";
pub const FAREWELL_DECLINED: &str = "Have a nice day!";
pub const INVALID_RESPONSE: &str = "Sorry, this is not a valid response :( Please try again.";

/// A user who completed the login flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedIn {
    pub username: String,
    pub role: RoleTag,
    /// Whether the account was created during this login
    pub created: bool,
}

/// How the login flow ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Session now runs under the user's role account
    LoggedIn(LoggedIn),
    /// Wrong password
    Rejected,
    /// Unknown user declined to create an account
    Declined,
}

/// Answer to the account creation offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Consent {
    Yes,
    No,
}

impl Consent {
    fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "Y" | "y" => Some(Self::Yes),
            "N" | "n" => Some(Self::No),
            _ => None,
        }
    }
}

/// Role of `username` as stored on the server
///
/// Unrecognized tags map to [`RoleTag::AppClient`]; a user without any role
/// row cannot be mapped and is an authentication error.
pub async fn resolve_role<S: Session>(session: &mut S, username: &str) -> Result<RoleTag> {
    match session.role_tag(username).await? {
        Some(tag) => Ok(RoleTag::from_tag(&tag)),
        None => Err(ClosetlyError::authentication(format!("No role is assigned to {username}"))),
    }
}

/// Run the login flow
pub async fn login<C, K, T>(
    manager: &mut SessionManager<C>,
    credentials: &K,
    term: &mut T,
) -> Result<LoginOutcome>
where
    C: Connector,
    K: CredentialSource,
    T: Terminal,
{
    let username = term.read_line("Enter username")?;

    if manager.session()?.username_exists(&username).await? {
        return sign_in(manager, credentials, term, username).await;
    }

    tracing::debug!(username = %username, "unknown username, offering account creation");
    loop {
        let answer = term.read_line("Would you like to create an account? [Y/N]")?;
        match Consent::parse(&answer) {
            Some(Consent::Yes) => break,
            Some(Consent::No) => {
                term.say(FAREWELL_DECLINED);
                return Ok(LoginOutcome::Declined);
            }
            None => term.say(INVALID_RESPONSE),
        }
    }

    create_account(manager, credentials, term, username).await
}

/// Password check, role resolution and account switch for a known user
async fn sign_in<C, K, T>(
    manager: &mut SessionManager<C>,
    credentials: &K,
    term: &mut T,
    username: String,
) -> Result<LoginOutcome>
where
    C: Connector,
    K: CredentialSource,
    T: Terminal,
{
    let password = term.read_secret("Enter password")?;

    let session = manager.session()?;
    if !session.authenticate(&username, &password).await? {
        tracing::warn!(username = %username, "login rejected");
        term.say(INCORRECT_LOGIN);
        return Ok(LoginOutcome::Rejected);
    }

    let role = resolve_role(session, &username).await?;
    manager.switch_to(credentials.credential_for(role)?).await?;

    tracing::info!(username = %username, role = %role, "logged in");
    Ok(LoginOutcome::LoggedIn(LoggedIn { username, role, created: false }))
}

/// Collect the new account's details, switch accounts, then provision it
async fn create_account<C, K, T>(
    manager: &mut SessionManager<C>,
    credentials: &K,
    term: &mut T,
    username: String,
) -> Result<LoginOutcome>
where
    C: Connector,
    K: CredentialSource,
    T: Terminal,
{
    let name = term.read_line("What is your name (first and last)?")?;
    let username = choose_username(manager, term, username).await?;
    let role = choose_role(term)?;
    let password = choose_password(term)?;

    // Creation runs over the role's connection, not the bootstrap one
    manager.switch_to(credentials.credential_for(role)?).await?;

    let identity = NewIdentity { name, username, password, role };
    let username = provision::create_identity(manager.session()?, &identity).await?;

    Ok(LoginOutcome::LoggedIn(LoggedIn { username, role, created: true }))
}

/// Re-prompt until the username fits and is not taken
///
/// The name typed at the login prompt is already known to be free; any
/// replacement is checked again.
async fn choose_username<C, T>(
    manager: &mut SessionManager<C>,
    term: &mut T,
    initial: String,
) -> Result<String>
where
    C: Connector,
    T: Terminal,
{
    let mut username = initial;
    let mut needs_check = false;

    loop {
        if exceeds_field_len(&username) {
            username = term.read_line(&format!(
                "Username is too long. Must be {MAX_FIELD_LEN} characters or less"
            ))?;
            needs_check = true;
            continue;
        }

        if needs_check && manager.session()?.username_exists(&username).await? {
            username = term.read_line("That username is taken. Please choose another")?;
            continue;
        }

        return Ok(username);
    }
}

fn choose_role<T: Terminal>(term: &mut T) -> Result<RoleTag> {
    let options: Vec<String> = RoleTag::SELF_SERVICE
        .iter()
        .filter_map(|role| role.choice_key().map(|key| format!("({key}) {}", role.label())))
        .collect();
    let prompt = format!("What kind of account would you like? {}", options.join(" "));

    loop {
        if let Some(role) = RoleTag::from_choice(&term.read_line(&prompt)?) {
            return Ok(role);
        }
        term.say(INVALID_RESPONSE);
    }
}

fn choose_password<T: Terminal>(term: &mut T) -> Result<String> {
    let mut password = term.read_secret("What would you like your password to be?")?;
    while exceeds_field_len(&password) {
        password = term.read_secret(&format!(
            "Password is too long. Must be {MAX_FIELD_LEN} characters or less"
        ))?;
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::ScriptedTerminal;

    #[test]
    fn test_consent_parse() {
        assert_eq!(Consent::parse("Y"), Some(Consent::Yes));
        assert_eq!(Consent::parse(" n "), Some(Consent::No));
        assert_eq!(Consent::parse("yes"), None);
        assert_eq!(Consent::parse(""), None);
    }

    #[test]
    fn test_choose_role_reprompts() {
        let mut term = ScriptedTerminal::new(["z", "", "c"]);
        assert_eq!(choose_role(&mut term).unwrap(), RoleTag::Personal);
        assert_eq!(term.messages().len(), 2);
        assert!(term.prompts()[0].contains("(a) store owner (b) stylist (c) personal"));
    }

    #[test]
    fn test_choose_password_rejects_over_length() {
        let long = "p".repeat(21);
        let mut term = ScriptedTerminal::new([long.as_str(), long.as_str(), "short"]);
        assert_eq!(choose_password(&mut term).unwrap(), "short");
        assert_eq!(term.prompts().len(), 3);
    }
}
