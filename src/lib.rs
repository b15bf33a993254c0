pub mod config;
pub mod corpus;
pub mod error;
pub mod geometry;
pub mod hive;
pub mod layouts;
pub mod node;
pub mod optimizer;
pub mod protocol;
pub mod scorer;
// cmd and reports are modules of the binary crate (main.rs).
