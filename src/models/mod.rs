pub mod history;
pub mod item;
pub mod ranking;
