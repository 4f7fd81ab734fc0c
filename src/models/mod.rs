// Models module - Database entity representations

pub mod account;
pub mod banner;
pub mod contact;
pub mod content;
pub mod review;
pub mod vendor;

pub use account::Account;
pub use banner::AdBanner;
pub use contact::ContactMessage;
pub use content::ContentEntry;
pub use review::Review;
pub use vendor::Vendor;
