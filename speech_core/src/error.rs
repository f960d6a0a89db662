use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The provider returned no audio payload for a chunk. One failed
    /// chunk aborts the whole synthesis; no partial audio is produced.
    #[error("no audio content returned from synthesis")]
    EmptyAudio,

    #[error("speech synthesis request failed: {0}")]
    Upstream(String),
}
