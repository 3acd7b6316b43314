use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("no task pool is installed on this thread")]
    NoTaskPool,
    #[error("failed to spawn task: {0}")]
    Spawn(#[from] futures::task::SpawnError),
}
