//! Routes and the navigation guard

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::session::Session;

/// A navigable view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Login,
    Register,
    Verify,
    Dashboard,
    Send,
    Withdraw,
    Deposit,
    History,
}

impl Route {
    pub const ALL: [Route; 8] = [
        Route::Login,
        Route::Register,
        Route::Verify,
        Route::Dashboard,
        Route::Send,
        Route::Withdraw,
        Route::Deposit,
        Route::History,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Verify => "/verify",
            Route::Dashboard => "/dashboard",
            Route::Send => "/send",
            Route::Withdraw => "/withdraw",
            Route::Deposit => "/deposit",
            Route::History => "/history",
        }
    }

    /// Resolve a path; anything unknown falls back to `/login`
    pub fn from_path(path: &str) -> Route {
        path.parse().unwrap_or(Route::Login)
    }

    /// Reachable without a session
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('/');
        let normalized = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };
        Route::ALL
            .iter()
            .copied()
            .find(|r| r.path() == normalized.to_lowercase())
            .ok_or_else(|| format!("Unknown route: {}", s))
    }
}

/// Which routes require the identity-verified flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationGating {
    /// Send, withdraw, deposit and history
    #[default]
    All,
    /// Send and withdraw only
    Transfers,
}

impl VerificationGating {
    pub fn gates(&self, route: Route) -> bool {
        match self {
            VerificationGating::All => matches!(
                route,
                Route::Send | Route::Withdraw | Route::Deposit | Route::History
            ),
            VerificationGating::Transfers => matches!(route, Route::Send | Route::Withdraw),
        }
    }
}

impl FromStr for VerificationGating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(VerificationGating::All),
            "transfers" => Ok(VerificationGating::Transfers),
            other => Err(format!(
                "Unknown verification gating '{}'. Expected 'all' or 'transfers'",
                other
            )),
        }
    }
}

/// Outcome of a guard check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

/// Upper bound on chained redirects in [`RouteGuard::resolve`]
const MAX_REDIRECTS: usize = 4;

/// Navigation-time access control
///
/// Stateless: both gates are evaluated from the session on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard {
    gating: VerificationGating,
}

impl RouteGuard {
    pub fn new(gating: VerificationGating) -> Self {
        Self { gating }
    }

    pub fn gating(&self) -> VerificationGating {
        self.gating
    }

    /// Check a single navigation
    pub fn check(&self, route: Route, session: &Session) -> Navigation {
        if !session.authenticated {
            return if route.is_public() {
                Navigation::Render(route)
            } else {
                Navigation::Redirect(Route::Login)
            };
        }

        if route == Route::Login {
            return Navigation::Redirect(Route::Dashboard);
        }

        if !session.verified && self.gating.gates(route) {
            return Navigation::Redirect(Route::Verify);
        }

        Navigation::Render(route)
    }

    /// Follow redirects until a route renders
    pub fn resolve(&self, route: Route, session: &Session) -> Route {
        let mut current = route;
        for _ in 0..MAX_REDIRECTS {
            match self.check(current, session) {
                Navigation::Render(r) => return r,
                Navigation::Redirect(next) => current = next,
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anonymous() -> Session {
        Session::default()
    }

    fn unverified() -> Session {
        Session::logged_in("alice", "tok", "alice@example.com")
    }

    #[test]
    fn test_route_parsing() {
        assert_eq!("/send".parse::<Route>().unwrap(), Route::Send);
        assert_eq!("history".parse::<Route>().unwrap(), Route::History);
        assert_eq!("/Withdraw/".parse::<Route>().unwrap(), Route::Withdraw);
        assert!("/admin".parse::<Route>().is_err());
        assert_eq!(Route::from_path("/nowhere"), Route::Login);
    }

    #[test]
    fn test_anonymous_is_sent_to_login() {
        let guard = RouteGuard::default();
        for route in Route::ALL {
            let nav = guard.check(route, &anonymous());
            if route.is_public() {
                assert_eq!(nav, Navigation::Render(route));
            } else {
                assert_eq!(nav, Navigation::Redirect(Route::Login), "{}", route);
            }
        }
    }

    #[test]
    fn test_authenticated_login_goes_to_dashboard() {
        let guard = RouteGuard::default();
        assert_eq!(
            guard.check(Route::Login, &unverified()),
            Navigation::Redirect(Route::Dashboard)
        );
        assert_eq!(
            guard.check(Route::Dashboard, &unverified()),
            Navigation::Render(Route::Dashboard)
        );
    }

    #[test]
    fn test_gating_all_covers_money_pages() {
        let guard = RouteGuard::new(VerificationGating::All);
        for route in [Route::Send, Route::Withdraw, Route::Deposit, Route::History] {
            assert_eq!(
                guard.check(route, &unverified()),
                Navigation::Redirect(Route::Verify)
            );
            assert_eq!(
                guard.check(route, &unverified().verified()),
                Navigation::Render(route)
            );
        }
    }

    #[test]
    fn test_gating_transfers_leaves_deposit_open() {
        let guard = RouteGuard::new(VerificationGating::Transfers);
        assert_eq!(
            guard.check(Route::Deposit, &unverified()),
            Navigation::Render(Route::Deposit)
        );
        assert_eq!(
            guard.check(Route::History, &unverified()),
            Navigation::Render(Route::History)
        );
        assert_eq!(
            guard.check(Route::Send, &unverified()),
            Navigation::Redirect(Route::Verify)
        );
    }

    #[test]
    fn test_resolve_follows_redirects() {
        let guard = RouteGuard::default();
        assert_eq!(guard.resolve(Route::Send, &anonymous()), Route::Login);
        assert_eq!(guard.resolve(Route::Login, &unverified()), Route::Dashboard);
        assert_eq!(guard.resolve(Route::Withdraw, &unverified()), Route::Verify);
    }

    #[test]
    fn test_gating_parse() {
        assert_eq!("ALL".parse::<VerificationGating>().unwrap(), VerificationGating::All);
        assert_eq!(
            "transfers".parse::<VerificationGating>().unwrap(),
            VerificationGating::Transfers
        );
        assert!("some".parse::<VerificationGating>().is_err());
    }
}
