pub mod catalog;
pub mod electives;
pub mod health;
pub mod recommendations;
