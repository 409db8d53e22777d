use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The receiving side (dispatcher task or host writer) is gone.
    #[error("dispatch channel closed")]
    Closed,

    #[error("failed to spawn notifier `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("notifier `{program}` failed: {detail}")]
    CommandFailed { program: String, detail: String },
}
