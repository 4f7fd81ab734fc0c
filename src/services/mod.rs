// Services module - Business logic

pub mod banners;
pub mod mailer;
pub mod rating;
pub mod reviews;
