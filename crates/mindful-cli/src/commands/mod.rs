pub mod config;
pub mod quote;
pub mod render;
pub mod settings;
pub mod timer;
pub mod worker;
