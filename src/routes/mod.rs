pub mod accounts;
pub mod admin_auth;
pub mod articles;
pub mod categories;
pub mod contact;
pub mod favorites;
pub mod health;
pub mod notifications;
pub mod products;
