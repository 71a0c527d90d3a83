//! Dashboard events.

use reqwest::Method;
use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::client::Client;
use crate::error::Result;
use crate::types::Event;

/// Event endpoints.
pub struct EventsService<'a> {
    client: &'a Client,
}

impl<'a> EventsService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Lists dashboard events.
    pub async fn list(&self) -> Result<Vec<Event>> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            events: Vec<Event>,
        }

        let req = self.client.new_request(Method::GET, "/v2/events/list")?;
        let resp: Resp = self.client.send_json(req).await?;
        Ok(resp.events)
    }

    /// Clears all dashboard events.
    pub async fn delete(&self) -> Result<()> {
        let req = self.client.new_request(Method::POST, "/v2/events/delete")?;
        let _: IgnoredAny = self.client.send_json(req).await?;
        Ok(())
    }
}
