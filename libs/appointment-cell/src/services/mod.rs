pub mod assignment;
pub mod availability;
pub mod booking;
pub mod catalog;
pub mod conflict;
pub mod mobility;
pub mod store;
