#[cfg(feature = "client")]
pub(crate) mod encode;
pub(crate) mod serde_ext;
#[cfg(feature = "client")]
pub(crate) mod signing;
pub(crate) mod text;
#[cfg(feature = "client")]
pub(crate) mod url;
#[cfg(feature = "client")]
pub(crate) mod xml;
