use configs::AuthConfig;
use tracing::{info, instrument, warn};

use super::domain::{LoginInput, SessionStatus};
use super::errors::AuthError;

/// Cookie value that marks a signed-in session.
pub const SESSION_VALUE: &str = "authenticated";

/// Checks the demo credential pair and interprets the session cookie.
#[derive(Clone, Debug)]
pub struct DemoAuthService {
    cfg: AuthConfig,
}

impl DemoAuthService {
    pub fn new(cfg: AuthConfig) -> Self { Self { cfg } }

    pub fn cookie_name(&self) -> &str {
        &self.cfg.session_cookie
    }

    pub fn session_max_age_secs(&self) -> i64 {
        self.cfg.session_max_age_secs
    }

    /// Succeeds only for the exact configured email/password pair.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{DemoAuthService, domain::LoginInput};
    /// let svc = DemoAuthService::new(configs::AuthConfig::default());
    /// let ok = LoginInput { email: "demo@insureco.com".into(), password: "Demo1234!".into() };
    /// assert!(svc.login(&ok).is_ok());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub fn login(&self, input: &LoginInput) -> Result<(), AuthError> {
        if input.email == self.cfg.demo_email && input.password == self.cfg.demo_password {
            info!("demo_login_succeeded");
            Ok(())
        } else {
            warn!("demo_login_rejected");
            Err(AuthError::Unauthorized)
        }
    }

    /// Signed in iff the cookie carries the session marker.
    pub fn session(&self, cookie_value: Option<&str>) -> SessionStatus {
        SessionStatus { authenticated: cookie_value == Some(SESSION_VALUE) }
    }
}
