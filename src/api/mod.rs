// API module - HTTP endpoints

pub mod banners;
pub mod contact;
pub mod content;
pub mod cron;
pub mod health;
pub mod middleware;
pub mod reviews;
