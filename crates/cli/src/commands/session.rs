//! Session commands.

use marketplace_client::Marketplace;
use marketplace_client::guard::RecordingNavigator;
use marketplace_client::nav::{MenuAction, menu_for};
use marketplace_client::roles::{Capabilities, landing_path, post_login_destination};
use marketplace_client::session::{Credentials, Registration};
use marketplace_core::Role;
use secrecy::SecretString;

use super::CliError;

/// Print the session, the role's capabilities and its menu.
#[allow(clippy::print_stdout)]
pub fn status(app: &Marketplace) {
    let snapshot = app.session().snapshot();
    let role = snapshot.role();

    println!("status: {:?}", snapshot.status);
    if let Some(user) = &snapshot.user {
        println!("user: {} <{}> ({})", user.name, user.email, user.id);
    }
    println!("role: {role}");
    println!("landing: {}", landing_path(role));

    let caps = Capabilities::of(role);
    let granted: Vec<&str> = [
        (caps.can_shop, "shop"),
        (caps.can_sell, "sell"),
        (caps.can_moderate, "moderate"),
    ]
    .into_iter()
    .filter_map(|(granted, name)| granted.then_some(name))
    .collect();
    println!(
        "capabilities: {}",
        if granted.is_empty() { "none".to_string() } else { granted.join(", ") }
    );

    let menu: Vec<String> = menu_for(&snapshot)
        .into_iter()
        .map(|item| match item.action {
            MenuAction::Link(path) => format!("{} ({path})", item.label),
            MenuAction::SignOut => item.label.to_string(),
        })
        .collect();
    println!("menu: {}", menu.join(" | "));
}

/// Sign in and print where the user should go next.
#[allow(clippy::print_stdout)]
pub async fn login(
    app: &mut Marketplace,
    email: &str,
    password: &str,
    from: Option<&str>,
) -> Result<(), CliError> {
    let user = app
        .session_mut()
        .login(&Credentials::new(email, password))
        .await?;

    println!("Signed in as {} ({})", user.name, user.role);
    println!(
        "next: {}",
        post_login_destination(user.role, from, app.guard().routes())
    );
    Ok(())
}

/// Register and print the landing page of the new account.
#[allow(clippy::print_stdout)]
pub async fn register(
    app: &mut Marketplace,
    name: String,
    email: String,
    password: String,
    phone: Option<String>,
    role: Option<&str>,
) -> Result<(), CliError> {
    let role = role.map(|raw| {
        let resolved = Role::resolve(Some(raw));
        if resolved == Role::Guest {
            tracing::warn!(role = raw, "Unrecognized role, letting the server decide");
        }
        resolved
    });

    let registration = Registration {
        name,
        email,
        password: SecretString::from(password),
        phone,
        role: role.filter(|r| *r != Role::Guest),
    };

    let user = app.session_mut().register(&registration).await?;
    println!("Registered {} ({})", user.name, user.role);
    println!("next: {}", landing_path(user.role));
    Ok(())
}

/// Sign out and print the redirect.
#[allow(clippy::print_stdout)]
pub fn logout(app: &mut Marketplace) {
    let mut navigator = RecordingNavigator::default();
    app.stop_notification_poller();
    app.session_mut().logout(&mut navigator);
    println!("Signed out");
    if let Some(path) = navigator.last_path() {
        println!("next: {path}");
    }
}
