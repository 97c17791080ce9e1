pub mod catalog;
pub mod complaints;
pub mod health;
pub mod live;
pub mod menu;
pub mod metrics;
pub mod votes;
