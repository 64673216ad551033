//! Sample window and history bookkeeping

pub mod sample_buffer;
pub mod history;

pub use sample_buffer::SampleBuffer;
pub use history::HistoryStore;
