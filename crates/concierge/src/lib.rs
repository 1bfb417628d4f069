pub mod chat;
pub mod errors;
pub mod invoker;
pub mod memory;
pub mod models;
pub mod prompt_template;
pub mod providers;
pub mod registry;
pub mod store;
pub mod tools;
pub mod weather;
