pub mod action;
pub mod audit;
pub mod catalog;
pub mod filter;
pub mod policy;
pub mod prompt;
pub mod result;
pub mod retrieval;
pub mod session;
