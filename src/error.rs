use thiserror::Error;

/// Startup checkpoints that end the program before or instead of the render
/// loop.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Error: No valid HMD present!")]
    NoHmd,

    #[error("Error: Failed to initialize the HMD session")]
    SessionInit(#[source] anyhow::Error),

    #[error("Error, GraphicsWindow has not been created successfully")]
    ContextCreation(#[source] anyhow::Error),
}

impl StartupError {
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// How a run that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The render loop ran and the session was shut down.
    Completed,
    /// Nothing could be loaded, so no device was touched.
    NothingToDisplay,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        0
    }
}

/// Process exit code for a finished run.
pub fn exit_code(result: &Result<Outcome, StartupError>) -> i32 {
    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => err.exit_code(),
    }
}
