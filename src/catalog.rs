//! Closet Catalog Queries
//!
//! Each function builds a [`Query`]: parameterized SQL plus the column labels
//! of its result. The queries are independent; nothing else in the crate
//! depends on how the SQL text is written, only on the column schemas.
//!
//! # Column Schemas
//! - Clothing listings: [`CLOTHES_COLUMNS`]
//! - Personal closet: [`PERSONAL_COLUMNS`]
//! - Collaborative closet: [`COLLAB_COLUMNS`], [`USER_COLLAB_COLUMNS`]
//! - Store listings: [`STORE_COLUMNS`]

use crate::engine::Query;
use crate::error::{ClosetlyError, Result};

pub const CLOTHES_COLUMNS: &[&str] = &[
    "clothing_id",
    "clothing_type",
    "size",
    "gender",
    "color",
    "brand",
    "description",
    "image_url",
    "aesthetic",
    "store_name",
];

pub const PERSONAL_COLUMNS: &[&str] = &[
    "clothing_id",
    "clothing_type",
    "size",
    "gender",
    "color",
    "brand",
    "description",
    "image_url",
    "aesthetic",
    "clean",
    "shared",
    "num_wears",
];

pub const COLLAB_COLUMNS: &[&str] = &[
    "user_id",
    "clothing_id",
    "clothing_type",
    "size",
    "gender",
    "color",
    "brand",
    "description",
    "image_url",
    "aesthetic",
    "curr_condition",
    "is_available",
    "curr_borrower",
];

pub const USER_COLLAB_COLUMNS: &[&str] = &[
    "clothing_id",
    "clothing_type",
    "size",
    "gender",
    "color",
    "brand",
    "description",
    "image_url",
    "aesthetic",
    "curr_condition",
    "is_available",
    "curr_borrower",
];

pub const STORE_COLUMNS: &[&str] = &[
    "clothing_id",
    "price",
    "discount",
    "clothing_type",
    "size",
    "color",
    "brand",
    "description",
    "image_url",
    "aesthetic",
];

pub const BORROW_COLUMNS: &[&str] = &["borrowed"];
pub const USER_ID_COLUMNS: &[&str] = &["user_id"];

const ALL_CLOTHES_SQL: &str = "SELECT clothing_id, clothing_type, size, gender, color, brand, \
     description, image_url, aesthetic, store_name \
     FROM clothes";

const PERSONAL_CLOSET_SQL: &str = "SELECT clothing_id, clothing_type, size, gender, color, brand, \
     description, image_url, aesthetic, clean, shared, num_wears \
     FROM clothes NATURAL JOIN personal_closet \
     WHERE user_id = ?";

const COLLAB_CLOSET_SQL: &str = "SELECT user_id, clothing_id, clothing_type, size, gender, color, brand, \
     description, image_url, aesthetic, curr_condition, is_available, curr_borrower \
     FROM collab_closet NATURAL JOIN clothes";

const USER_COLLAB_SQL: &str = "SELECT clothing_id, clothing_type, size, gender, color, brand, \
     description, image_url, aesthetic, curr_condition, is_available, curr_borrower \
     FROM collab_closet NATURAL JOIN clothes \
     WHERE user_id = ?";

const BORROW_SQL: &str = "CALL borrow_item(?, ?)";

/// Shared SELECT list for store listings
macro_rules! store_select {
    () => {
        "SELECT clothing_id, price, discount, clothing_type, size, color, brand, \
         description, image_url, aesthetic \
         FROM store_closet NATURAL JOIN clothes"
    };
}

const STORE_INVENTORY_SQL: &str = concat!(store_select!(), " WHERE store_name = ?");

const STORE_BY_PRICE_SQL: &str = concat!(
    store_select!(),
    " WHERE store_name = ? AND price >= ? AND price <= ?",
    " ORDER BY price"
);

const STORE_BY_TYPE_SQL: &str =
    concat!(store_select!(), " WHERE store_name = ? AND clothing_type = ?");

const STORE_BY_DISCOUNT_SQL: &str = concat!(
    store_select!(),
    " WHERE store_name = ? AND discount >= ? AND discount <= ?",
    " ORDER BY discount"
);

const CREATE_OUTFIT_SQL: &str =
    "INSERT INTO styled_outfits (user_id, clothing_ids, vibe, description) VALUES (?, ?, ?, ?)";

const USER_ID_SQL: &str = "SELECT user_id FROM user_info WHERE username = ?";

/// Inclusive numeric bounds for price and discount filters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    /// Parse bounds from two prompt answers
    pub fn parse(min: &str, max: &str) -> Result<Self> {
        Ok(Self { min: parse_number("minimum", min)?, max: parse_number("maximum", max)? })
    }
}

fn parse_number(field: &str, input: &str) -> Result<f64> {
    let trimmed = input.trim().trim_start_matches('$').trim_end_matches('%');
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ClosetlyError::invalid_input(format!("The {field} must be a number")))
}

/// Parse a numeric id typed at a prompt
pub fn parse_id(field: &str, input: &str) -> Result<i64> {
    input
        .trim()
        .parse::<i64>()
        .map_err(|_| ClosetlyError::invalid_input(format!("The {field} must be a whole number")))
}

/// Parse a comma or space separated list of clothing ids
pub fn parse_id_list(input: &str) -> Result<Vec<i64>> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| parse_id("clothing id", part))
        .collect()
}

/// Every clothing item in personal, collaborative and store closets
#[must_use]
pub const fn all_clothes() -> Query {
    Query::new(ALL_CLOTHES_SQL, CLOTHES_COLUMNS)
}

/// Items in one user's personal closet
#[must_use]
pub fn personal_closet(user_id: i64) -> Query {
    Query::new(PERSONAL_CLOSET_SQL, PERSONAL_COLUMNS).bind(user_id)
}

/// Everything lendable in the collaborative closet
#[must_use]
pub const fn collaborative_closet() -> Query {
    Query::new(COLLAB_CLOSET_SQL, COLLAB_COLUMNS)
}

/// Items one user is lending through the collaborative closet
#[must_use]
pub fn user_collab_items(user_id: i64) -> Query {
    Query::new(USER_COLLAB_SQL, USER_COLLAB_COLUMNS).bind(user_id)
}

/// Borrow an item from the collaborative closet
///
/// The procedure refuses owners and items already on loan; its single
/// result value is truthy when the loan was recorded.
#[must_use]
pub fn borrow_item(user_id: i64, clothing_id: i64) -> Query {
    Query::new(BORROW_SQL, BORROW_COLUMNS).bind(user_id).bind(clothing_id)
}

/// A store's full inventory
#[must_use]
pub fn store_inventory(store_name: &str) -> Query {
    Query::new(STORE_INVENTORY_SQL, STORE_COLUMNS).bind(store_name)
}

/// A store's items priced within `bounds`, cheapest first
#[must_use]
pub fn store_by_price(store_name: &str, bounds: Bounds) -> Query {
    Query::new(STORE_BY_PRICE_SQL, STORE_COLUMNS).bind(store_name).bind(bounds.min).bind(bounds.max)
}

/// A store's items of one clothing type (sweatshirt, dress, ...)
#[must_use]
pub fn store_by_type(store_name: &str, clothing_type: &str) -> Query {
    Query::new(STORE_BY_TYPE_SQL, STORE_COLUMNS).bind(store_name).bind(clothing_type)
}

/// A store's items discounted within `bounds`, smallest discount first
#[must_use]
pub fn store_by_discount(store_name: &str, bounds: Bounds) -> Query {
    Query::new(STORE_BY_DISCOUNT_SQL, STORE_COLUMNS)
        .bind(store_name)
        .bind(bounds.min)
        .bind(bounds.max)
}

/// Save a styled outfit made of `clothing_ids`
///
/// The ids are stored as a JSON array.
pub fn create_outfit(user_id: i64, clothing_ids: &[i64], vibe: &str, description: &str) -> Result<Query> {
    if clothing_ids.is_empty() {
        return Err(ClosetlyError::invalid_input("An outfit needs at least one clothing id"));
    }

    let ids = serde_json::to_string(clothing_ids)
        .map_err(|e| ClosetlyError::invalid_input(format!("Could not encode clothing ids: {e}")))?;

    Ok(Query::new(CREATE_OUTFIT_SQL, &[]).bind(user_id).bind(ids).bind(vibe).bind(description))
}

/// Numeric user id for a username
#[must_use]
pub fn user_id_for(username: &str) -> Query {
    Query::new(USER_ID_SQL, USER_ID_COLUMNS).bind(username)
}
