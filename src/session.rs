use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::auth::UserId;
use crate::error::{ServiceError, ServiceResult};
use crate::history::IndicatorQuery;
use crate::service::IndicatorService;

/// The logged-in user of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated(CurrentUser),
}

/// One user's walk through register → login → query/history → logout.
///
/// Held by the caller; nothing here is shared between sessions.
pub struct Session {
    service: IndicatorService,
    state: SessionState,
}

impl Session {
    pub fn new(service: IndicatorService) -> Self {
        Self {
            service,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_user(&self) -> Option<&CurrentUser> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            SessionState::Unauthenticated => None,
        }
    }

    /// Creates the account. The session stays logged out; call [`login`](Self::login) next.
    pub async fn register(&mut self, id: UserId, username: &str, password: &str) -> ServiceResult<()> {
        self.service.register(id, username, password).await
    }

    /// Returns the user id and switches to the authenticated state on success.
    /// Any attempt ends the current login first, so bad credentials leave the
    /// session unauthenticated.
    pub async fn login(&mut self, username: &str, password: &str) -> ServiceResult<Option<UserId>> {
        self.logout();
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "username and password are required".into(),
            ));
        }

        let user_id = self.service.login(username, password).await?;
        if let Some(user_id) = user_id {
            self.state = SessionState::Authenticated(CurrentUser {
                user_id,
                username: username.to_string(),
            });
            info!(user_id, "session authenticated");
        }
        Ok(user_id)
    }

    pub fn logout(&mut self) {
        if let SessionState::Authenticated(user) = &self.state {
            debug!(user_id = user.user_id, "session closed");
        }
        self.state = SessionState::Unauthenticated;
    }

    /// Looks up `indicator` for the logged-in user and records it in their history.
    pub async fn query_indicator(
        &self,
        indicator: &str,
        date_text: &str,
    ) -> ServiceResult<Option<Decimal>> {
        let user = self.require_user()?;
        self.service
            .query_and_record(user.user_id, indicator, date_text)
            .await
    }

    pub async fn view_history(&self) -> ServiceResult<Vec<IndicatorQuery>> {
        let user = self.require_user()?;
        self.service.get_history(user.user_id).await
    }

    fn require_user(&self) -> ServiceResult<&CurrentUser> {
        self.current_user().ok_or(ServiceError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::Indicator;
    use crate::service::testing::{service_with, TODAY};
    use std::str::FromStr;
    use time::macros::date;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn end_to_end_scenario() {
        let (service, source, _) = service_with(Ok(Some(dec("972.36"))));
        let mut session = Session::new(service);

        session.register(1, "ana", "x").await.unwrap();
        assert_eq!(session.state(), &SessionState::Unauthenticated);

        assert_eq!(session.login("ana", "x").await.unwrap(), Some(1));
        assert_eq!(
            session.current_user(),
            Some(&CurrentUser {
                user_id: 1,
                username: "ana".into()
            })
        );

        let value = session.query_indicator("dolar", "01-03-2024").await.unwrap();
        assert_eq!(value, Some(dec("972.36")));
        assert_eq!(source.calls(), vec![(Indicator::Dolar, Some(date!(2024 - 03 - 01)))]);

        let history = session.view_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].value_date.to_string(), "2024-03-01");
        assert_eq!(history[0].source, "mindicador.cl");
        assert_eq!(history[0].retrieved_by, 1);
    }

    #[tokio::test]
    async fn each_query_appends_exactly_one_row() {
        let (service, _, _) = service_with(Ok(Some(dec("37000.1"))));
        let mut session = Session::new(service);
        session.register(7, "bea", "pw").await.unwrap();
        session.login("bea", "pw").await.unwrap();

        assert!(session.view_history().await.unwrap().is_empty());
        session.query_indicator("uf", "").await.unwrap();
        let rows = session.view_history().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value_date, TODAY);

        session.query_indicator("uf", "02-01-2024").await.unwrap();
        assert_eq!(session.view_history().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn logged_out_sessions_are_gated() {
        let (service, source, _) = service_with(Ok(Some(dec("1"))));
        let mut session = Session::new(service);

        assert!(matches!(
            session.query_indicator("dolar", "").await,
            Err(ServiceError::NotAuthenticated)
        ));
        assert!(matches!(
            session.view_history().await,
            Err(ServiceError::NotAuthenticated)
        ));

        session.register(1, "ana", "x").await.unwrap();
        session.login("ana", "x").await.unwrap();
        session.logout();
        assert_eq!(session.state(), &SessionState::Unauthenticated);
        assert!(matches!(
            session.view_history().await,
            Err(ServiceError::NotAuthenticated)
        ));
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_login_keeps_state() {
        let (service, _, _) = service_with(Ok(None));
        let mut session = Session::new(service);
        session.register(1, "ana", "x").await.unwrap();

        assert_eq!(session.login("ana", "wrong").await.unwrap(), None);
        assert_eq!(session.login("nobody", "x").await.unwrap(), None);
        assert_eq!(session.state(), &SessionState::Unauthenticated);

        assert!(matches!(
            session.login("", "x").await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn failed_login_drops_the_previous_user() {
        let (service, _, _) = service_with(Ok(Some(dec("1"))));
        let mut session = Session::new(service);
        session.register(1, "ana", "x").await.unwrap();
        session.register(2, "bea", "y").await.unwrap();
        session.login("ana", "x").await.unwrap();

        assert_eq!(session.login("bea", "wrong").await.unwrap(), None);
        assert_eq!(session.state(), &SessionState::Unauthenticated);
        assert!(matches!(
            session.query_indicator("uf", "").await,
            Err(ServiceError::NotAuthenticated)
        ));

        session.login("ana", "x").await.unwrap();
        assert!(session.login(" ", "x").await.is_err());
        assert!(session.current_user().is_none());

        assert_eq!(session.login("bea", "y").await.unwrap(), Some(2));
        assert_eq!(session.current_user().map(|u| u.user_id), Some(2));
    }
}
