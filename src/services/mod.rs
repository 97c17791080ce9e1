pub mod catalog;
pub mod changefeed;
pub mod complaints;
pub mod menu_window;
pub mod metrics;
pub mod rollover_scheduler;
pub mod roster;
pub mod sweep_scheduler;
pub mod votes;
