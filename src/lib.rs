pub mod classifier;
pub mod config;
pub mod encoding;
pub mod error;
pub mod maintenance;
pub mod message;
pub mod responder;
pub mod services;

pub use classifier::{Classifier, Label, Verdict};
pub use config::Config;
pub use encoding::{FeatureEncoder, HashStrategy};
pub use error::{Error, Result};
pub use message::ParsedEmail;
pub use responder::{Responder, StorageEvent};
