pub mod catalog;
pub mod migrations;
pub mod universities;
