//! Sort direction.

use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::fmt;
use std::str::FromStr;

/// Sort direction of one sort key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub enum Order {
    /// Ascending order.
    #[serde(rename = "ASC", alias = "asc", alias = "Asc")]
    Asc,
    /// Descending order.
    #[serde(rename = "DESC", alias = "desc", alias = "Desc")]
    Desc,
}

impl Order {
    /// Return the opposite direction.
    pub fn flip(self) -> Self {
        match self {
            Order::Asc => Order::Desc,
            Order::Desc => Order::Asc,
        }
    }

    /// SQL keyword for this direction.
    pub fn as_sql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Order {
    type Err = Error;

    /// Parse `ASC` or `DESC`, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("asc") {
            Ok(Order::Asc)
        } else if trimmed.eq_ignore_ascii_case("desc") {
            Ok(Order::Desc)
        } else {
            Err(Error::InvalidOrder(s.to_string()))
        }
    }
}
