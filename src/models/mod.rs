pub mod account;
pub mod article;
pub mod category;
pub mod common;
pub mod contact;
pub mod favorite;
pub mod notification;
pub mod product;
