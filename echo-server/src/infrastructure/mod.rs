pub(crate) mod jwt;
pub(crate) mod logging;
pub(crate) mod presence;
pub(crate) mod settings;
