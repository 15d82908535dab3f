//! # vitalens-core
//!
//! Client core for VitaLens - shared by every front end.
//!
//! This crate provides:
//! - Credential storage (`store` module)
//! - Session state and auth flows (`session` module)
//! - Backend gateways for auth, meals and nutrition (`gateway` module)
//! - Session change notifications (`events` module)
//! - Form validation (`forms` module)
//! - Wire models (`models` module)
//! - Unified error handling (`error` module)

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod forms;
pub mod gateway;
pub mod models;
pub mod session;
pub mod store;

// Re-exports for convenience
pub use app::AppServices;
pub use config::{ClientConfig, StoreBackend};
pub use error::{Error, ErrorKind, Result};
pub use events::{EventBus, SessionEvent};
pub use forms::{LoginForm, RegisterForm};
pub use session::{Session, SessionState};

pub use gateway::{
    ApiClient, AuthGateway, MealGateway, MealUpload, NutritionGateway, ProgressReporter,
    ReqwestTransport, Transport, DEFAULT_PERIOD_DAYS,
};

pub use models::{
    DailyNutrition, FoodItem, HealthInsights, MealRecord, MealType, NutrientData,
    NutritionSummary, TodayNutritionSummary, TokenResponse, UserProfile,
};

pub use store::{Credential, CredentialStore, FileStore, KeyringStore, MemoryStore, StoreError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the library version
pub fn version() -> &'static str {
    VERSION
}
