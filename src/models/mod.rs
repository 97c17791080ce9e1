pub mod catalog;
pub mod complaint;
pub mod menu;
pub mod session;
pub mod vote;
