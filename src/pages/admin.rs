use leptos::prelude::*;
use log::{info, warn};

use crate::config::AppConfig;
use crate::session::use_session;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const ADMIN_DISABLED: &str = "Admin login is not configured";

/// Checks a login attempt against the configured admin account.
pub fn check_login(config: &AppConfig, username: &str, password: &str) -> Result<(), &'static str> {
	match config.admin_credentials() {
		None => Err(ADMIN_DISABLED),
		Some((user, pass)) if user == username.trim() && pass == password => Ok(()),
		Some(_) => Err(INVALID_CREDENTIALS),
	}
}

#[component]
pub fn Admin() -> impl IntoView {
	let session = use_session();

	move || {
		if session.admin.get() {
			view! { <AdminDashboard /> }.into_any()
		} else {
			view! { <AdminLogin /> }.into_any()
		}
	}
}

#[component]
fn AdminLogin() -> impl IntoView {
	let session = use_session();
	let config = use_context::<AppConfig>().unwrap_or_default();
	let username = RwSignal::new(String::new());
	let password = RwSignal::new(String::new());
	let error = RwSignal::new(None::<&'static str>);

	let on_submit = move |ev: leptos::ev::SubmitEvent| {
		ev.prevent_default();
		match check_login(&config, &username.get_untracked(), &password.get_untracked()) {
			Ok(()) => {
				info!("admin: signed in");
				password.set(String::new());
				session.admin.set(true);
			}
			Err(reason) => {
				warn!("admin: login refused");
				error.set(Some(reason));
			}
		}
	};

	view! {
		<section class="panel narrow">
			<h2>"Admin Login"</h2>
			{move || error.get().map(|e| view! { <p class="alert error">{e}</p> })}
			<form on:submit=on_submit>
				<label>
					"Username"
					<input
						class="text-field"
						required
						autofocus
						prop:value=move || username.get()
						on:input=move |ev| username.set(event_target_value(&ev))
					/>
				</label>
				<label>
					"Password"
					<input
						class="text-field"
						type="password"
						required
						prop:value=move || password.get()
						on:input=move |ev| password.set(event_target_value(&ev))
					/>
				</label>
				<button class="button primary wide" type="submit">
					"Sign In"
				</button>
			</form>
		</section>
	}
}

#[component]
fn AdminDashboard() -> impl IntoView {
	let session = use_session();

	view! {
		<section class="panel">
			<h2>"Admin Dashboard"</h2>
			<p>
				"Welcome to the admin dashboard. Knowledge base entries can now be deleted "
				"and running builds cancelled."
			</p>
			<button
				class="button outlined"
				on:click=move |_| {
					info!("admin: signed out");
					session.admin.set(false);
				}
			>
				"Logout"
			</button>
		</section>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn configured() -> AppConfig {
		AppConfig {
			admin_username: Some("ops".into()),
			admin_password: Some("s3cret".into()),
			..AppConfig::default()
		}
	}

	#[test]
	fn login_matches_configured_account() {
		assert_eq!(check_login(&configured(), " ops ", "s3cret"), Ok(()));
		assert_eq!(check_login(&configured(), "ops", "wrong"), Err(INVALID_CREDENTIALS));
	}

	#[test]
	fn login_refused_without_account() {
		let config = AppConfig {
			admin_username: None,
			admin_password: None,
			..AppConfig::default()
		};
		assert_eq!(check_login(&config, "admin", "admin123"), Err(ADMIN_DISABLED));
	}
}
