//! Governance Escape Room engine
//!
//! Grades control selections against scenario rubrics, drives the session
//! state machine, arbitrates hint providers and serves the HTTP API.

pub mod api;
pub mod config;
pub mod content;
pub mod error;
pub mod game_state;
pub mod grading;
pub mod hints;
pub mod persistence;
pub mod session;

pub use api::{create_router, AppState, ErrorResponse, GradeRequest};
pub use config::{Config, HintConfig, HintProviderKind, SessionMode, DEFAULT_HINT_ENDPOINT};
pub use content::{
    AdminRole, ContentStore, Control, ControlCategory, Difficulty, Scenario, ScenarioDefinition,
    ScenarioRubric,
};
pub use error::{EscapeRoomError, ProviderErrorKind, Result, HINT_UNAVAILABLE_MESSAGE};
pub use game_state::{GameAction, GameState, GameStatus, ScenarioSessionResult};
pub use grading::{
    grade_submission, AdminRoleMapping, ControlFeedback, Grade, GradingResult, ScoreBreakdown,
    ADMIN_ROLE_DISCLAIMER,
};
pub use hints::{
    HintArbiter, HintContext, HintInfo, HintProvider, HintResult, HintSource, LocalHintProvider,
    RemoteHintProvider,
};
pub use persistence::{FileStorage, MemoryStorage, Storage, STORAGE_KEY};
pub use session::GameSession;
