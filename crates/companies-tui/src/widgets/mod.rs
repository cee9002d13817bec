//! Reusable widgets.

pub mod card;
