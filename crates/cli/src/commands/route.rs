//! Route guard queries.

use marketplace_client::Marketplace;
use marketplace_client::guard::{GuardDecision, RecordingNavigator};

/// Print what the guard does with a navigation to `path`.
#[allow(clippy::print_stdout)]
pub fn check(app: &Marketplace, path: &str) {
    let mut navigator = RecordingNavigator::default();
    match app.navigate(path, &mut navigator) {
        GuardDecision::Loading => println!("{path}: loading"),
        GuardDecision::Render => println!("{path}: render"),
        GuardDecision::Redirect { to, state } => match state {
            Some(state) => println!("{path}: redirect -> {to} (from {})", state.from),
            None => println!("{path}: redirect -> {to}"),
        },
    }
}
