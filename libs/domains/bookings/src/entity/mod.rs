//! Sea-ORM entities for the rental tables

pub mod blocked_date;
pub mod booking;
pub mod price_rule;
pub mod property;
