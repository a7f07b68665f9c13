pub mod catalog;
pub mod signing;
pub mod storage;
