//! Session secrets and the token records built around them.

pub mod secret;
pub mod session;
