//! Who is calling, and whether they may touch the data.
//!
//! Signing in happens outside of this program. The outer layer hands us an email address, and we
//! only check it against the allow list in the config before any command reads or writes data.

use crate::error::{Error, ErrorType};
use crate::{Config, Result};
use anyhow::anyhow;
use tracing::{debug, warn};

/// The environment variable that carries the signed-in user's email address.
pub const USER_EMAIL_ENV: &str = "FINBOARD_USER_EMAIL";

/// Supplies the email address of the signed-in user, if there is one.
pub trait IdentityProvider {
    fn current_user_email(&self) -> Option<String>;
}

/// Reads the identity from `FINBOARD_USER_EMAIL`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvIdentity;

impl IdentityProvider for EnvIdentity {
    fn current_user_email(&self) -> Option<String> {
        std::env::var(USER_EMAIL_ENV).ok()
    }
}

/// A fixed identity, for callers that already know who is signed in.
#[derive(Debug, Default, Clone)]
pub struct StaticIdentity(pub Option<String>);

impl IdentityProvider for StaticIdentity {
    fn current_user_email(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Returns the caller's email if it is on the config's allow list. Addresses are compared after
/// trimming and without regard to case.
pub fn authorize(config: &Config, identity: &dyn IdentityProvider) -> Result<String> {
    check(config.allowed_emails(), identity.current_user_email())
}

fn check(allowed: &[String], email: Option<String>) -> Result<String> {
    let email = match email.map(|e| e.trim().to_string()) {
        Some(e) if !e.is_empty() => e,
        _ => {
            return Err(Error::new(
                ErrorType::Unauthorized,
                anyhow!("No signed-in user; set {USER_EMAIL_ENV}"),
            ))
        }
    };
    if allowed
        .iter()
        .any(|a| a.trim().eq_ignore_ascii_case(&email))
    {
        debug!("Authorized {email}");
        Ok(email)
    } else {
        warn!("Rejected {email}, not on the allow list");
        Err(Error::new(
            ErrorType::Unauthorized,
            anyhow!("The user '{email}' is not allowed to use this data"),
        ))
    }
}
