//! User account commands.

use agentbridge_auth::services::UserService;
use agentbridge_auth::store::CredentialStore;

use super::CommandError;

/// Create a user.
///
/// # Errors
///
/// Returns `CommandError` if the user exists, the input is invalid, or the
/// users table cannot be written.
pub async fn add(store: &CredentialStore, email: &str, password: &str) -> Result<(), CommandError> {
    let email = UserService::new(store).add_user(email, password).await?;
    tracing::info!("User created: {}", email);
    Ok(())
}

/// Print every user email, one per line.
///
/// # Errors
///
/// Returns `CommandError` if the users table cannot be read.
#[allow(clippy::print_stdout)]
pub async fn list(store: &CredentialStore) -> Result<(), CommandError> {
    let users = UserService::new(store).list_users().await?;
    for user in &users {
        println!("{}", user.email);
    }
    tracing::info!("{} user(s)", users.len());
    Ok(())
}

/// Change an existing user's password.
///
/// # Errors
///
/// Returns `CommandError` if the user does not exist, the input is invalid,
/// or the users table cannot be written.
pub async fn set_password(
    store: &CredentialStore,
    email: &str,
    password: &str,
) -> Result<(), CommandError> {
    let email = UserService::new(store)
        .update_user_password(email, password)
        .await?;
    tracing::info!("Password updated for {}", email);
    Ok(())
}

/// Delete a user.
///
/// # Errors
///
/// Returns `CommandError` if the user does not exist or the users table
/// cannot be written.
pub async fn delete(store: &CredentialStore, email: &str) -> Result<(), CommandError> {
    let email = UserService::new(store).delete_user(email).await?;
    tracing::info!("User deleted: {}", email);
    Ok(())
}
