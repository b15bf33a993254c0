pub mod compare;
pub mod hive;
pub mod node;
pub mod search;
pub mod triads;
