//! Credential verification and role resolution.
//!
//! Passwords are stored as salted Argon2 PHC strings. Every login failure is
//! reported as the same [`Error::InvalidCredentials`] so callers cannot tell an
//! unknown user from a wrong password or a wrong role.

use crate::{
    entities::{Role, Student, Teacher},
    errors::{Error, Result},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// The reserved teacher username that grants the admin role.
pub const ADMIN_USERNAME: &str = "admin";

/// Who is logged in and in which role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub role: Role,
    /// Teacher username or student id
    pub identity: String,
}

/// Hashes a plaintext password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash {
            message: e.to_string(),
        })
}

/// Checks a plaintext password against a stored hash.
///
/// A malformed stored hash never verifies.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Well-formed Argon2 hash that no password matches. Verified in place of a
/// missing account so unknown usernames take as long as wrong passwords.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$Y0ea1poJCyWCd+yPum+ZQQ$0EuY9I6Pi8wVxq5awFCAHNbc/UKPtfnmXE4W54BzQPo";

fn verify_account(password: &str, stored_hash: Option<&str>) -> bool {
    let verified = verify_password(password, stored_hash.unwrap_or(DUMMY_HASH));
    stored_hash.is_some() && verified
}

pub async fn verify_teacher(db: &DatabaseConnection, username: &str, password: &str) -> Result<bool> {
    let teacher = Teacher::find_by_id(username.to_string()).one(db).await?;
    Ok(verify_account(
        password,
        teacher.as_ref().map(|t| t.password_hash.as_str()),
    ))
}

pub async fn verify_student(db: &DatabaseConnection, student_id: &str, password: &str) -> Result<bool> {
    let student = Student::find_by_id(student_id.to_string()).one(db).await?;
    Ok(verify_account(
        password,
        student.as_ref().map(|s| s.password_hash.as_str()),
    ))
}

/// Resolves a login attempt to an [`Identity`].
///
/// The admin role needs both a verified teacher password and the username
/// `admin`; any other verified teacher only ever gets the teacher role.
#[instrument(skip(db, password))]
pub async fn authenticate(
    db: &DatabaseConnection,
    user_type: &str,
    username: &str,
    password: &str,
) -> Result<Identity> {
    let Some(role) = Role::parse(user_type) else {
        warn!("Login rejected: unknown user type");
        return Err(Error::InvalidCredentials);
    };

    let verified = match role {
        Role::Admin => verify_teacher(db, username, password).await? && username == ADMIN_USERNAME,
        Role::Teacher => verify_teacher(db, username, password).await?,
        Role::Student => verify_student(db, username, password).await?,
    };

    if !verified {
        warn!("Login rejected");
        return Err(Error::InvalidCredentials);
    }

    info!("Login accepted");
    Ok(Identity {
        role,
        identity: username.to_string(),
    })
}
