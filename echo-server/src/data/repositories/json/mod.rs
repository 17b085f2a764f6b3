pub(crate) mod persistence;
pub(crate) mod post_repository;
pub(crate) mod store;
pub(crate) mod user_repository;
