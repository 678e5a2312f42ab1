pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod http;
pub mod matcher;
pub mod nats;
pub mod session;
pub mod wake_lock;

pub use config::Config;
pub use dispatch::{CommandDispatcher, GreetingDispatcher};
pub use engine::{EngineErrorCode, EngineEvent, RecognitionEngine, RecognitionResult};
pub use error::SessionError;
pub use http::{create_router, AppState};
pub use matcher::{EndPhraseMatcher, WakeMatch, WakePhraseMatcher};
pub use nats::{NatsClient, NatsCommandDispatcher, NatsGreetingDispatcher, NatsRecognitionEngine};
pub use session::{SessionBackends, SessionConfig, SessionSnapshot, SessionState, VoiceSession};
pub use wake_lock::{InhibitWakeLock, NoWakeLock, WakeLock};
