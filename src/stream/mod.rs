// Decoding of the upstream answer event stream
pub mod decoder;
pub mod events;
pub mod patch;

pub use decoder::{DecodedAnswer, LineOutcome, StreamDecoder, decode};
pub use events::StreamEvent;
pub use patch::PatchKind;
