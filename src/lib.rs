pub mod api_connection;
pub mod catalog;
pub mod cli;
pub mod generation;
pub mod images;
pub mod logging;
pub mod recipe;
pub mod scaling;
pub mod search;
pub mod server;
pub mod store;
