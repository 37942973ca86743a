//! Admin authorization gate for mutations of historical data.
//!
//! Every edit or delete of a log entry and every subject deletion carries an
//! `adminId`/`adminPw` pair in its JSON body. The gate checks the pair before
//! the handler touches the store, and a failure never says which half was
//! wrong.

use argon2::{Argon2, PasswordHash, PasswordVerifier, password_hash};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::ApiError;

/// Credentials embedded in a privileged request body.
///
/// Missing fields deserialise as empty strings, which then fail
/// verification with 401 rather than a body-shape error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCredentials {
  #[serde(default)]
  pub admin_id: String,
  #[serde(default)]
  pub admin_pw: String,
}

/// The configured admin credential pair.
pub struct AdminGate {
  /// SHA-256 of the admin id, so comparison runs over equal-length inputs.
  id_digest:     [u8; 32],
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  password_hash: String,
}

impl AdminGate {
  /// Fails if `password_hash` is not a valid PHC string.
  pub fn new(
    admin_id: &str,
    password_hash: impl Into<String>,
  ) -> Result<Self, password_hash::Error> {
    let password_hash = password_hash.into();
    PasswordHash::new(&password_hash)?;
    Ok(Self {
      id_digest: Sha256::digest(admin_id.as_bytes()).into(),
      password_hash,
    })
  }

  /// Check `creds` against the configured pair.
  pub fn verify(&self, creds: &AdminCredentials) -> Result<(), ApiError> {
    let presented = Sha256::digest(creds.admin_id.as_bytes());
    let id_ok = bool::from(presented.as_slice().ct_eq(&self.id_digest));

    // Always run the password check, even after an id mismatch.
    let pw_ok = PasswordHash::new(&self.password_hash).is_ok_and(|hash| {
      Argon2::default()
        .verify_password(creds.admin_pw.as_bytes(), &hash)
        .is_ok()
    });

    if id_ok & pw_ok {
      Ok(())
    } else {
      tracing::warn!("rejected admin credentials");
      Err(ApiError::Unauthorized)
    }
  }
}
