use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context was read with no provider on the stack and no default.
    #[error("context '{context}' was read outside of its provider")]
    MissingProvider { context: &'static str },
}
