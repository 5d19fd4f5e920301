//! pipe-adapters: frontera con el backend (RPC opacas), formas de
//! respuesta, payload de pasos y reintentos.
pub mod backend;
pub mod dto;
pub mod errors;
pub mod payload;
pub mod remote;
pub mod retry;

pub use backend::{InMemoryBackend, PipelineBackend};
pub use dto::{CommandBundle, CommandLinesResponse, HelpResponse, ProcessBundle};
pub use errors::BackendError;
pub use payload::{steps_payload, StepPayload, StepValue, StepsPayload};
pub use remote::RemoteSession;
pub use retry::{with_retry, RetryPolicy};
