mod event_stream;
mod file_sources;
mod perplexity_client;
mod smtp_sender;

pub use event_stream::*;
pub use file_sources::*;
pub use perplexity_client::*;
pub use smtp_sender::*;
