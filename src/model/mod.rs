pub mod data_core;
pub mod edit;
pub mod path;
pub mod performance;
pub mod tree;
