pub mod config;
pub mod error;
pub mod message;
pub mod paths;
pub mod types;

pub use config::{Config, StepPolicy};
pub use error::{Error, ErrorKind, Result};
pub use message::{actions, Request, Response};
pub use paths::Paths;
pub use types::{CartContents, CartLine, CartSnapshot, RemoteCartLine, SavedCart};
