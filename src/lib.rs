pub mod booking;
pub mod capacity;
pub mod config;
pub mod db;
pub mod engine;
pub mod gateway;
pub mod notify;
pub mod payout;
pub mod reconciliation;
pub mod reservation;

pub mod error;
pub mod logger;
pub mod time;
