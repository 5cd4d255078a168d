pub mod bootstrap;
pub use bootstrap::{BootstrapError, BootstrapInitializer, BootstrapOutcome, SystemState};

pub mod settings;
pub use settings::{RuntimeSettings, SettingsError, SettingsStore};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{PasswordReset, UserError, UserService};
pub use user_service_impl::SeaOrmUserService;
