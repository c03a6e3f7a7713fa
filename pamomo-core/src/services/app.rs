//! Application controller
//!
//! `WalletApp` is the single owner of the [`AppState`] for a running
//! session. Front ends drive it with discrete user events (navigate,
//! log in, withdraw, ...) and render whatever route it settles on.

use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{Action, AppState, Navigation, Route, RouteGuard, Session, Transaction};
use crate::ports::{LoginRequest, RegisterRequest, TransferReceipt, WithdrawalReceipt};

use super::{AuthService, OperationOutcome, OperationService, SessionStore, WalletService};

pub struct WalletApp {
    state: AppState,
    route: Route,
    /// A balance has been fetched since the session began
    balance_known: bool,
    warning: Option<String>,
    guard: RouteGuard,
    sessions: SessionStore,
    auth: AuthService,
    wallet: WalletService,
    operations: OperationService,
}

impl WalletApp {
    pub fn new(
        guard: RouteGuard,
        sessions: SessionStore,
        auth: AuthService,
        wallet: WalletService,
        operations: OperationService,
    ) -> Self {
        Self {
            state: AppState::default(),
            route: Route::Login,
            balance_known: false,
            warning: None,
            guard,
            sessions,
            auth,
            wallet,
            operations,
        }
    }

    /// Restore the stored session and land on the first route
    ///
    /// A restored session gets its balance fetched right away; a failed
    /// fetch becomes a warning rather than an error.
    pub async fn start(&mut self) -> Result<Route> {
        self.state = self.sessions.restore()?;
        self.balance_known = false;
        if self.state.session.authenticated {
            self.refresh_quietly().await;
        }
        Ok(self.land(Route::Dashboard))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn session(&self) -> &Session {
        &self.state.session
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn balance_known(&self) -> bool {
        self.balance_known
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.state.wallet.transactions
    }

    /// Pending non-fatal message from the last event, if any
    pub fn take_warning(&mut self) -> Option<String> {
        self.warning.take()
    }

    /// Navigate through the guard
    ///
    /// `Render` means the requested route is shown; `Redirect` carries the
    /// route shown instead.
    pub fn navigate(&mut self, requested: Route) -> Navigation {
        let landed = self.land(requested);
        if landed == requested {
            Navigation::Render(landed)
        } else {
            tracing::debug!(from = %requested, to = %landed, "navigation redirected");
            Navigation::Redirect(landed)
        }
    }

    fn land(&mut self, requested: Route) -> Route {
        self.route = self.guard.resolve(requested, &self.state.session);
        self.route
    }

    async fn refresh_quietly(&mut self) {
        if let Err(e) = self.refresh_balance().await {
            tracing::warn!(error = %e, "balance refresh failed");
            self.warning = Some(e.to_string());
        }
    }

    pub async fn refresh_balance(&mut self) -> Result<Decimal> {
        self.state = self.wallet.refresh_balance(&self.state).await?;
        self.balance_known = true;
        Ok(self.state.wallet.balance)
    }

    pub async fn login(&mut self, request: &LoginRequest) -> Result<Route> {
        self.state = self.auth.login(&self.state, request).await?;
        self.balance_known = false;
        self.refresh_quietly().await;
        Ok(self.land(Route::Dashboard))
    }

    pub async fn register(&mut self, request: &RegisterRequest) -> Result<Route> {
        self.state = self.auth.register(&self.state, request).await?;
        self.balance_known = false;
        self.refresh_quietly().await;
        Ok(self.land(Route::Dashboard))
    }

    /// Reset everything and return to the login route
    ///
    /// The in-memory session is dropped even if clearing storage fails;
    /// that failure is still reported.
    pub fn logout(&mut self) -> Result<Route> {
        let cleared = self.sessions.logout();
        self.state = self.state.reduce(Action::LoggedOut);
        self.balance_known = false;
        self.route = Route::Login;
        cleared.map(|_| Route::Login)
    }

    /// Mark the identity verified and continue to the dashboard
    pub fn verify(&mut self) -> Result<Route> {
        if !self.state.session.authenticated {
            return Err(Error::NotLoggedIn);
        }
        self.state = self.sessions.verify(&self.state);
        Ok(self.land(Route::Dashboard))
    }

    fn settle<R>(&mut self, outcome: &OperationOutcome<R>) {
        self.state = outcome.state.clone();
        if outcome.balance.is_some() {
            self.balance_known = true;
        }
        self.warning = outcome.warning.clone();
        self.land(Route::Dashboard);
    }

    pub async fn send(
        &mut self,
        receiver: &str,
        amount: &str,
    ) -> Result<OperationOutcome<TransferReceipt>> {
        let outcome = self.operations.send(&self.state, receiver, amount).await?;
        self.settle(&outcome);
        Ok(outcome)
    }

    pub async fn withdraw(
        &mut self,
        amount: &str,
        confirmation_code: &str,
    ) -> Result<OperationOutcome<WithdrawalReceipt>> {
        let outcome = self
            .operations
            .withdraw(&self.state, amount, confirmation_code)
            .await?;
        self.settle(&outcome);
        Ok(outcome)
    }

    pub async fn deposit(&mut self, amount: &str) -> Result<OperationOutcome<TransferReceipt>> {
        let outcome = self.operations.deposit(&self.state, amount).await?;
        self.settle(&outcome);
        Ok(outcome)
    }
}
