pub mod client;
pub mod error;
pub mod handlers;
pub mod init;
pub mod models;
pub mod request;
pub mod settings;
pub mod stream;
pub mod tools;
pub mod transport;

pub use crate::client::PerplexityClient;
pub use crate::init::{AppState, Config};
pub use crate::stream::{DecodedAnswer, StreamDecoder, decode};
pub use crate::tools::{ToolHost, ToolOutput};
