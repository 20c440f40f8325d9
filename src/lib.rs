pub mod cli;
pub mod command;
pub mod config;
pub mod db;
pub mod inject;
pub mod manager;
pub mod professor;

pub use command::Command;
pub use config::Config;
pub use db::Store;
pub use manager::Manager;
