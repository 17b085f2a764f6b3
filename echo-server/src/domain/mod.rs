pub(crate) mod error;
pub(crate) mod interaction;
pub(crate) mod post;
pub(crate) mod user;
