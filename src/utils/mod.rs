//! Request extraction and token helpers shared by the HTTP layer.

pub mod jwt;
pub mod validate;
