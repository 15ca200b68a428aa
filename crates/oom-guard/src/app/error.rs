use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server I/O error ({operation}): {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[cfg(unix)]
    #[error(transparent)]
    Signals(#[from] crate::infra::SignalSetupError),
}

impl ServerError {
    pub(crate) fn io(operation: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| ServerError::Io { operation, source }
    }
}
