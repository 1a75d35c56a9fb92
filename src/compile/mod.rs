pub(crate) mod builder;
pub(crate) mod fingerprint;
pub(crate) mod manifest;
pub(crate) mod placeholder;
