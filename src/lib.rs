#[macro_use]
mod macros;

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod debounce;
pub mod display;
pub mod error;
pub mod fixtures;
pub mod list;
pub mod model;
pub mod query;
pub mod remote;
pub mod repository;
pub mod session;
pub mod utils;

pub use config::Config;
pub use error::{MailboardError, Result};
pub use list::{ListController, ListView, ViewState};
pub use model::{Campaign, Contact, Email, Record, User};
pub use query::{PageResult, Pagination, QueryDescriptor};
