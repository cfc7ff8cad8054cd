mod chat_service;
mod report_sender;

pub use chat_service::*;
pub use report_sender::*;
