//! Account information and settings.

use reqwest::Method;
use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::client::Client;
use crate::error::Result;
use crate::types::{AccountInfo, Settings, SettingsUpdate};

/// Account endpoints.
pub struct AccountService<'a> {
    client: &'a Client,
}

impl<'a> AccountService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Retrieves user account information.
    pub async fn info(&self) -> Result<AccountInfo> {
        #[derive(Deserialize)]
        struct Resp {
            info: AccountInfo,
        }

        let req = self.client.new_request(Method::GET, "/v2/account/info")?;
        let resp: Resp = self.client.send_json(req).await?;
        Ok(resp.info)
    }

    /// Retrieves user preferences.
    pub async fn settings(&self) -> Result<Settings> {
        #[derive(Deserialize)]
        struct Resp {
            settings: Settings,
        }

        let req = self.client.new_request(Method::GET, "/v2/account/settings")?;
        let resp: Resp = self.client.send_json(req).await?;
        Ok(resp.settings)
    }

    /// Updates the fields set in `update`.
    pub async fn update_settings(&self, update: &SettingsUpdate) -> Result<()> {
        let req = self
            .client
            .new_request(Method::POST, "/v2/account/settings")?
            .form(update);
        let _: IgnoredAny = self.client.send_json(req).await?;
        Ok(())
    }
}
