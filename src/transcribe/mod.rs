pub mod azure_openai;
pub mod backend;
pub mod manual;
pub mod runner;
#[cfg(feature = "whisper")]
pub mod whisper_local;

pub use backend::{Transcript, TranscriptSegment, TranscriptionBackend};
pub use runner::Transcriber;
