//! Engine errors and their process exit codes.

use thiserror::Error;

use dnsvakt_broker::BrokerError;
use dnsvakt_capture::CaptureError;
use dnsvakt_storage::StoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const HELP: i32 = 2;
    pub const ARGUMENT_CHECK: i32 = 3;
    pub const CAPTURE_INIT: i32 = 4;
    pub const BROKER_INIT: i32 = 5;
    pub const BROKER_PUBLISH_TIMEOUT: i32 = 6;
}

/// Fatal failures surfaced by the supervisor.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("failed to install signal handler: {0}")]
    Signal(String),

    #[error("failed to spawn {stage} thread: {source}")]
    Spawn {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::Capture(_) => exit_code::CAPTURE_INIT,
            EngineError::Broker(BrokerError::Connect(_) | BrokerError::Declare(_)) => {
                exit_code::BROKER_INIT
            }
            EngineError::Broker(BrokerError::Publish(_)) => exit_code::BROKER_PUBLISH_TIMEOUT,
            EngineError::Store(_) | EngineError::Signal(_) | EngineError::Spawn { .. } => {
                exit_code::FAILURE
            }
        }
    }
}
