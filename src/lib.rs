pub mod category_walker;
pub mod config;
pub mod error;
pub mod logging;
pub mod menu;
pub mod roll_engine;
pub mod roll_log;
pub mod roll_session;
pub mod table_loader;
pub mod table_view;
pub mod user_interaction;

pub use error::{Result, RollerError};
