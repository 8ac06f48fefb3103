//! Admin business logic. Handlers resolve the caller, services decide.

mod account_service;
mod article_service;

#[cfg(test)]
pub(crate) mod fakes;

pub use account_service::AccountService;
pub use article_service::ArticleService;
