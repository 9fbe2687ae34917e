//! Application services layer.

pub mod admin_menu;
pub mod error;
pub mod menu_query;
pub mod repos;
