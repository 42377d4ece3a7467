use std::sync::Arc;

use crate::config::{Config, CLEAR_PATH};
use crate::http::HttpClient;

/// Element ids of the reset controls, each one is also the request path.
pub const RESET_CONTROLS: [(&str, &str); 4] = [
    ("reset", "Reset position"),
    ("resetX", "Reset X"),
    ("resetY", "Reset Y"),
    ("resetZ", "Reset Z"),
];

pub const CLEAR_PROMPT: &str = "Are you sure you want to permanently delete all recorded data?";
pub const CLEAR_SUCCESS: &str = "Data cleared successfully!";
pub const CLEAR_FAILURE: &str = "An error occurred while clearing the data.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Success,
    Failure,
}

impl ActionOutcome {
    fn from_status(status: u16) -> Self {
        if status == 200 {
            Self::Success
        } else {
            Self::Failure
        }
    }

    /// Acknowledgment shown to the user after a clear request.
    pub fn clear_message(self) -> &'static str {
        match self {
            Self::Success => CLEAR_SUCCESS,
            Self::Failure => CLEAR_FAILURE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Accepted,
    Declined,
}

/// Side-effect endpoints of the sensor server.
#[derive(Clone)]
pub struct Actions {
    client: Arc<dyn HttpClient>,
    config: Config,
}

impl Actions {
    pub fn new(client: Arc<dyn HttpClient>, config: Config) -> Self {
        Self { client, config }
    }

    /// Asks the server to reset the reference tied to `element_id`.
    pub async fn reset(&self, element_id: &str) -> ActionOutcome {
        let url = match self.config.reset_url(element_id) {
            Ok(url) => url,
            Err(e) => {
                log::debug!("reset '{element_id}' not sent: {e}");
                return ActionOutcome::Failure;
            }
        };

        self.send(url.as_str()).await
    }

    /// Erases recorded data. Returns `None` when the user declined and
    /// nothing was sent.
    pub async fn clear(&self, confirmation: Confirmation) -> Option<ActionOutcome> {
        if confirmation == Confirmation::Declined {
            log::debug!("clear declined");
            return None;
        }

        let outcome = match self.config.endpoint(CLEAR_PATH) {
            Ok(url) => self.send(url.as_str()).await,
            Err(e) => {
                log::warn!("clear not sent: {e}");
                ActionOutcome::Failure
            }
        };
        Some(outcome)
    }

    async fn send(&self, url: &str) -> ActionOutcome {
        match self.client.get(url).await {
            Ok(response) => ActionOutcome::from_status(response.status),
            Err(e) => {
                log::debug!("{e}");
                ActionOutcome::Failure
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use crate::http::{HttpResponse, MockHttpClient};
    use clap::Parser;

    fn actions(mock: MockHttpClient) -> Actions {
        let config = Config::parse_from(["imu_telemetry_gui", "--server", "http://sensor.local"]);
        Actions::new(Arc::new(mock), config)
    }

    fn respond_with(mock: &mut MockHttpClient, url: &'static str, status: u16) {
        mock.expect_get()
            .withf(move |u| u == url)
            .times(1)
            .returning(move |_| Box::pin(async move { Ok(HttpResponse { status }) }));
    }

    #[tokio::test]
    async fn declined_clear_sends_nothing() {
        let mut mock = MockHttpClient::new();
        mock.expect_get().never();

        assert_eq!(actions(mock).clear(Confirmation::Declined).await, None);
    }

    #[tokio::test]
    async fn clear_ok_reports_success() {
        let mut mock = MockHttpClient::new();
        respond_with(&mut mock, "http://sensor.local/clear", 200);

        let outcome = actions(mock).clear(Confirmation::Accepted).await;
        assert_eq!(outcome, Some(ActionOutcome::Success));
        assert_eq!(outcome.unwrap().clear_message(), CLEAR_SUCCESS);
    }

    #[tokio::test]
    async fn clear_server_error_reports_failure() {
        let mut mock = MockHttpClient::new();
        respond_with(&mut mock, "http://sensor.local/clear", 500);

        let outcome = actions(mock).clear(Confirmation::Accepted).await;
        assert_eq!(outcome, Some(ActionOutcome::Failure));
        assert_eq!(outcome.unwrap().clear_message(), CLEAR_FAILURE);
    }

    #[tokio::test]
    async fn clear_transport_error_reports_failure() {
        let mut mock = MockHttpClient::new();
        mock.expect_get()
            .returning(|_| Box::pin(async { Err(Error::Http("connection refused".into())) }));

        assert_eq!(
            actions(mock).clear(Confirmation::Accepted).await,
            Some(ActionOutcome::Failure)
        );
    }

    #[tokio::test]
    async fn reset_uses_element_id_as_path() {
        let mut mock = MockHttpClient::new();
        respond_with(&mut mock, "http://sensor.local/resetY", 200);

        assert_eq!(actions(mock).reset("resetY").await, ActionOutcome::Success);
    }

    #[tokio::test]
    async fn reset_failure_is_reported_not_raised() {
        let mut mock = MockHttpClient::new();
        respond_with(&mut mock, "http://sensor.local/reset", 404);

        assert_eq!(actions(mock).reset("reset").await, ActionOutcome::Failure);
    }
}
