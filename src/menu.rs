//! Menu Controller
//!
//! Reads one line, takes its first character, lowercases it and dispatches
//! to a catalog query. The alphabet is fixed by [`MenuCommand`]; anything
//! else re-prompts. Query failures are reported and the loop continues,
//! while connection failures end it.

use crate::auth::LoggedIn;
use crate::catalog::{self, Bounds};
use crate::display;
use crate::engine::{is_truthy, Connector, Query, Session};
use crate::error::{ClosetlyError, Result};
use crate::session::SessionManager;
use crate::terminal::Terminal;

pub const NOT_AN_OPTION: &str = "Sorry, that's not an option.";
pub const GOODBYE: &str = "Good bye!";

/// One menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    AllClothes,
    PersonalCloset,
    CollabCloset,
    UserCollabItems,
    Borrow,
    StoreInventory,
    StoreByPrice,
    StoreByType,
    StoreByDiscount,
    CreateOutfit,
    Quit,
}

impl MenuCommand {
    /// All commands, in display order
    pub const ALL: [Self; 11] = [
        Self::AllClothes,
        Self::PersonalCloset,
        Self::CollabCloset,
        Self::UserCollabItems,
        Self::Borrow,
        Self::StoreInventory,
        Self::StoreByPrice,
        Self::StoreByType,
        Self::StoreByDiscount,
        Self::CreateOutfit,
        Self::Quit,
    ];

    #[must_use]
    pub const fn key(&self) -> char {
        match self {
            Self::AllClothes => 'a',
            Self::PersonalCloset => 'p',
            Self::CollabCloset => 'c',
            Self::UserCollabItems => 'u',
            Self::Borrow => 'b',
            Self::StoreInventory => 's',
            Self::StoreByPrice => 'r',
            Self::StoreByType => 't',
            Self::StoreByDiscount => 'd',
            Self::CreateOutfit => 'o',
            Self::Quit => 'q',
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AllClothes => "show all clothes",
            Self::PersonalCloset => "show my personal closet",
            Self::CollabCloset => "show the collaborative closet",
            Self::UserCollabItems => "show a user's collaborative items",
            Self::Borrow => "borrow from the collaborative closet",
            Self::StoreInventory => "show a store's inventory",
            Self::StoreByPrice => "filter a store by price",
            Self::StoreByType => "filter a store by clothing type",
            Self::StoreByDiscount => "filter a store by discount",
            Self::CreateOutfit => "create a styled outfit",
            Self::Quit => "quit",
        }
    }

    /// Command for the first character of `input`, case-insensitive
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let key = input.trim_start().chars().next()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|command| command.key() == key)
    }
}

/// Options listing shown above the prompt
#[must_use]
pub fn options_text(user: &LoggedIn) -> String {
    let mut text = format!("Options for {} ({}):", user.username, user.role.label());
    for command in MenuCommand::ALL {
        text.push_str(&format!("\n    ({}) {}", command.key(), command.label()));
    }
    text
}

/// Per-login state the menu needs between commands
struct MenuContext<'a> {
    user: &'a LoggedIn,
    user_id: Option<i64>,
}

impl MenuContext<'_> {
    /// Numeric id of the logged-in user, looked up once
    async fn user_id<S: Session>(&mut self, session: &mut S) -> Result<i64> {
        if let Some(id) = self.user_id {
            return Ok(id);
        }

        let result = session.fetch(&catalog::user_id_for(&self.user.username)).await?;
        let id = result
            .first_value()
            .and_then(|value| value.as_i64().or_else(|| value.as_str().and_then(|s| s.parse().ok())))
            .ok_or_else(|| {
                ClosetlyError::query_failed(format!("No user id found for {}", self.user.username))
            })?;

        self.user_id = Some(id);
        Ok(id)
    }
}

/// Run the menu until the user quits
///
/// `debug` controls how much detail failures show.
pub async fn run<C, T>(
    manager: &mut SessionManager<C>,
    term: &mut T,
    user: &LoggedIn,
    debug: bool,
) -> Result<()>
where
    C: Connector,
    T: Terminal,
{
    let mut ctx = MenuContext { user, user_id: None };
    term.say(&options_text(user));

    loop {
        let input = term.read_line("Enter an option")?;
        let Some(command) = MenuCommand::parse(&input) else {
            term.say(NOT_AN_OPTION);
            term.say(&options_text(user));
            continue;
        };

        if command == MenuCommand::Quit {
            return Ok(());
        }

        tracing::debug!(?command, "menu command");
        match dispatch(command, manager.session()?, term, &mut ctx).await {
            Ok(()) => {}
            Err(err) if err.is_recoverable() => {
                tracing::warn!(error = %err, ?command, "menu command failed");
                term.say(&err.user_message(debug));
            }
            Err(err) => return Err(err),
        }
    }
}

async fn show<S: Session, T: Terminal>(session: &mut S, term: &mut T, header: &str, query: Query) -> Result<()> {
    let result = session.fetch(&query).await?;
    term.say(header);
    term.say(&display::render(&result));
    Ok(())
}

fn ask_bounds<T: Terminal>(term: &mut T, what: &str) -> Result<Bounds> {
    let min = term.read_line(&format!("Minimum {what}"))?;
    let max = term.read_line(&format!("Maximum {what}"))?;
    Bounds::parse(&min, &max)
}

async fn dispatch<S, T>(command: MenuCommand, session: &mut S, term: &mut T, ctx: &mut MenuContext<'_>) -> Result<()>
where
    S: Session,
    T: Terminal,
{
    match command {
        MenuCommand::AllClothes => {
            show(
                session,
                term,
                "This is all the clothing items in the personal, collaborative, and store closets:",
                catalog::all_clothes(),
            )
            .await
        }
        MenuCommand::PersonalCloset => {
            let user_id = ctx.user_id(session).await?;
            show(
                session,
                term,
                "This is all the clothing items in your personal closet:",
                catalog::personal_closet(user_id),
            )
            .await
        }
        MenuCommand::CollabCloset => {
            show(
                session,
                term,
                "This is all the clothing items you can borrow from the collaborative closet:",
                catalog::collaborative_closet(),
            )
            .await
        }
        MenuCommand::UserCollabItems => {
            let user_id = catalog::parse_id("user id", &term.read_line("Enter the user id")?)?;
            let header = format!("This is all the clothing items {user_id} has in the collaborative closet:");
            show(session, term, &header, catalog::user_collab_items(user_id)).await
        }
        MenuCommand::Borrow => {
            let user_id = ctx.user_id(session).await?;
            let clothing_id = catalog::parse_id(
                "clothing id",
                &term.read_line("What is the clothing ID of the item you would like to borrow?")?,
            )?;

            let result = session.fetch(&catalog::borrow_item(user_id, clothing_id)).await?;
            if result.first_value().is_some_and(is_truthy) {
                term.say("Item successfully borrowed!");
            } else {
                term.say("Sorry, you cannot borrow this item :(");
            }
            Ok(())
        }
        MenuCommand::StoreInventory => {
            let store = term.read_line("Which store?")?;
            let header = format!("This is all the clothing items currently being sold at {store}:");
            show(session, term, &header, catalog::store_inventory(&store)).await
        }
        MenuCommand::StoreByPrice => {
            let store = term.read_line("Which store?")?;
            let bounds = ask_bounds(term, "price")?;
            let header = format!(
                "This is all the clothing items at {store} priced between ${} and ${}:",
                bounds.min, bounds.max
            );
            show(session, term, &header, catalog::store_by_price(&store, bounds)).await
        }
        MenuCommand::StoreByType => {
            let store = term.read_line("Which store?")?;
            let clothing_type = term.read_line("Which clothing type (sweatshirt, dress, ...)?")?;
            let header = format!(
                "This is all the clothing items of the type ({clothing_type}) currently being sold at {store}:"
            );
            show(session, term, &header, catalog::store_by_type(&store, &clothing_type)).await
        }
        MenuCommand::StoreByDiscount => {
            let store = term.read_line("Which store?")?;
            let bounds = ask_bounds(term, "discount")?;
            let header = format!(
                "This is all the clothing items at {store} discounted between {}% and {}%:",
                bounds.min, bounds.max
            );
            show(session, term, &header, catalog::store_by_discount(&store, bounds)).await
        }
        MenuCommand::CreateOutfit => {
            let user_id = ctx.user_id(session).await?;
            let ids = catalog::parse_id_list(
                &term.read_line("Which clothing IDs are in the outfit? (comma separated)")?,
            )?;
            let vibe = term.read_line("What is the vibe?")?;
            let description = term.read_line("Describe the outfit")?;

            let outcome = session.execute(&catalog::create_outfit(user_id, &ids, &vibe, &description)?).await?;
            match outcome.last_insert_id {
                Some(id) => term.say(&format!("Outfit {id} saved!")),
                None => term.say("Outfit saved!"),
            }
            Ok(())
        }
        MenuCommand::Quit => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::RoleTag;

    #[test]
    fn test_parse_first_character_case_folded() {
        assert_eq!(MenuCommand::parse("a"), Some(MenuCommand::AllClothes));
        assert_eq!(MenuCommand::parse("All of it"), Some(MenuCommand::AllClothes));
        assert_eq!(MenuCommand::parse("Q"), Some(MenuCommand::Quit));
        assert_eq!(MenuCommand::parse("  s"), Some(MenuCommand::StoreInventory));
    }

    #[test]
    fn test_parse_rejects_unknown_and_empty() {
        assert_eq!(MenuCommand::parse("z"), None);
        assert_eq!(MenuCommand::parse(""), None);
        assert_eq!(MenuCommand::parse("   "), None);
    }

    #[test]
    fn test_keys_are_unique() {
        for (i, a) in MenuCommand::ALL.iter().enumerate() {
            for b in MenuCommand::ALL.iter().skip(i + 1) {
                assert_ne!(a.key(), b.key());
            }
        }
    }

    #[test]
    fn test_options_text_lists_every_command() {
        let user = LoggedIn { username: "alice".to_string(), role: RoleTag::Personal, created: false };
        let text = options_text(&user);
        assert!(text.starts_with("Options for alice (personal):"));
        for command in MenuCommand::ALL {
            assert!(text.contains(&format!("({}) {}", command.key(), command.label())));
        }
    }
}
