mod chat;
mod prompt;
mod report;

pub use chat::*;
pub use prompt::*;
pub use report::*;
