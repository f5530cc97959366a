//! Auth-domain types: the owner identity tokens are keyed by, and the session secrets themselves.

pub mod owner;
pub mod token;

pub use owner::*;
pub use token::{secret::*, session::*};
