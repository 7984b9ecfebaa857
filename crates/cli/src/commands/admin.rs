//! Admin account commands.
//!
//! Admin records are never exposed over HTTP; these commands are the only
//! way to create them or rotate their passwords.

use agentbridge_auth::services::UserService;
use agentbridge_auth::store::CredentialStore;

use super::CommandError;

/// Set an admin's password, creating the admin if it does not exist.
///
/// # Errors
///
/// Returns `CommandError` if the email or password is invalid or the admin
/// table cannot be written.
pub async fn set_password(
    store: &CredentialStore,
    email: &str,
    password: &str,
) -> Result<(), CommandError> {
    let email = UserService::new(store)
        .set_admin_password(email, password)
        .await?;
    tracing::info!("Admin password set for {}", email);
    Ok(())
}

/// Create a new admin.
///
/// # Errors
///
/// Returns `CommandError` if the admin already exists, the input is invalid,
/// or the admin table cannot be written.
pub async fn create(
    store: &CredentialStore,
    email: &str,
    password: &str,
) -> Result<(), CommandError> {
    let email = UserService::new(store).add_admin(email, password).await?;
    tracing::info!("Admin created: {}", email);
    Ok(())
}
