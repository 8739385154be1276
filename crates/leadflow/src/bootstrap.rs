// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leadflow bootstrap-admin` command implementation.

use leadflow_auth::{BootstrapOutcome, MIN_PASSWORD_LEN};
use leadflow_config::{BootstrapConfig, LeadflowConfig};
use leadflow_core::LeadflowError;

use crate::serve::{Services, log_bootstrap};

/// Applies command-line overrides on top of the `[bootstrap]` section.
fn merge_overrides(
    mut bootstrap: BootstrapConfig,
    email: Option<String>,
    name: Option<String>,
) -> BootstrapConfig {
    if email.is_some() {
        bootstrap.admin_email = email;
    }
    if name.is_some() {
        bootstrap.admin_name = name;
    }
    bootstrap
}

/// Reads the admin password from the terminal, twice.
fn prompt_password() -> Result<String, LeadflowError> {
    let read = |prompt: &str| {
        rpassword::prompt_password(prompt)
            .map_err(|e| LeadflowError::Internal(format!("failed to read password: {e}")))
    };
    let password = read("Super Admin password: ")?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(LeadflowError::invalid(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if read("Confirm password: ")? != password {
        return Err(LeadflowError::invalid("password", "Passwords do not match"));
    }
    Ok(password)
}

/// Runs the `leadflow bootstrap-admin` command.
pub async fn run_bootstrap_admin(
    config: LeadflowConfig,
    email: Option<String>,
    name: Option<String>,
) -> Result<(), LeadflowError> {
    let mut bootstrap = merge_overrides(config.bootstrap.clone(), email, name);
    if bootstrap.admin_email.is_none() {
        return Err(LeadflowError::Config(
            "no admin email: pass --email or set bootstrap.admin_email".into(),
        ));
    }

    let services = Services::open(&config).await?;
    let mut outcome = services.accounts.bootstrap_super_admin(&bootstrap).await;
    // Creating a new account needs a password; ask for one if config had none.
    if matches!(outcome, Err(LeadflowError::Config(_))) && bootstrap.admin_password.is_none() {
        bootstrap.admin_password = Some(prompt_password()?);
        outcome = services.accounts.bootstrap_super_admin(&bootstrap).await;
    }
    let closed = services.close().await;

    let outcome = outcome?;
    log_bootstrap(&outcome);
    match outcome {
        BootstrapOutcome::AlreadyPresent => println!("A Super Admin already exists."),
        BootstrapOutcome::Promoted(id) => println!("Promoted {id} to Super Admin."),
        BootstrapOutcome::Created(id) => println!("Created Super Admin {id}."),
    }
    closed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_config_values() {
        let base = BootstrapConfig {
            admin_email: Some("old@acme.io".into()),
            admin_name: Some("Old".into()),
            admin_password: Some("secret-pass".into()),
        };
        let merged = merge_overrides(base.clone(), Some("new@acme.io".into()), None);
        assert_eq!(merged.admin_email.as_deref(), Some("new@acme.io"));
        assert_eq!(merged.admin_name.as_deref(), Some("Old"));
        assert_eq!(merged.admin_password.as_deref(), Some("secret-pass"));

        let untouched = merge_overrides(base, None, None);
        assert_eq!(untouched.admin_email.as_deref(), Some("old@acme.io"));
    }

    #[tokio::test]
    async fn creates_then_reports_existing_admin() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LeadflowConfig::default();
        config.storage.database_path =
            dir.path().join("bootstrap.db").to_string_lossy().into_owned();
        config.bootstrap = BootstrapConfig {
            admin_email: Some("root@acme.io".into()),
            admin_name: None,
            admin_password: Some("root-pass".into()),
        };

        run_bootstrap_admin(config.clone(), None, None).await.unwrap();
        run_bootstrap_admin(config, None, None).await.unwrap();
    }

    #[tokio::test]
    async fn missing_email_is_a_config_error() {
        let config = LeadflowConfig::default();
        let err = run_bootstrap_admin(config, None, None).await.unwrap_err();
        assert!(matches!(err, LeadflowError::Config(_)));
    }
}
