// Response data stream
//
// Wire codec for the line-oriented stream the chat UI consumes, plus the
// writer used to append frames while a turn is being processed.

mod part;
mod writer;

pub use part::{DataStreamPart, FinishReason, StreamError, Usage};
pub use writer::DataStreamWriter;

/// Header advertising the stream format to the client
pub const DATA_STREAM_HEADER: &str = "x-vercel-ai-data-stream";
pub const DATA_STREAM_VERSION: &str = "v1";
