//! Backend gateways
//!
//! ```text
//! AuthGateway ──┐
//! MealGateway ──┼──► ApiClient ──► dyn Transport ──► backend
//! Nutrition   ──┘        │
//!                        └──► dyn CredentialStore (access token)
//! ```

pub mod auth;
pub mod client;
pub mod meals;
pub mod multipart;
pub mod nutrition;
pub mod progress;
pub mod transport;

pub use auth::AuthGateway;
pub use client::ApiClient;
pub use meals::{MealGateway, MealUpload, ALLOWED_EXTENSIONS};
pub use nutrition::{NutritionGateway, DEFAULT_PERIOD_DAYS};
pub use progress::{ProgressReporter, ProgressSink};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
