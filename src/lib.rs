pub mod assignment;
pub mod auth;
pub mod broadcast;
pub mod error;
pub mod integration;
pub mod model;
pub mod result;
mod schema;
pub mod state;
pub mod thread;
pub mod user;

pub use error::{Error, ErrorKind};
pub use result::Result;

pub trait Redact {
    fn redact(&self) -> String {
        "********".to_string()
    }
}

pub trait Raw {
    fn raw(&self) -> &str;
}
