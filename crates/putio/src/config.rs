//! Per-user key/value store kept by the API for client applications.
//!
//! Values are arbitrary JSON; callers pick the Rust type to decode into.

use reqwest::Method;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::client::Client;
use crate::error::{InvalidArgument, Result};
use crate::params::segment;

/// Config endpoints.
pub struct ConfigService<'a> {
    client: &'a Client,
}

impl<'a> ConfigService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Fetches the whole config object.
    pub async fn get_all<T: DeserializeOwned>(&self) -> Result<T> {
        #[derive(Deserialize)]
        struct Resp {
            config: Box<RawValue>,
        }

        let req = self.client.new_request(Method::GET, "/v2/config")?;
        let resp: Resp = self.client.send_json(req).await?;
        Ok(serde_json::from_str(resp.config.get())?)
    }

    /// Fetches one key. Returns `None` when the key is unset.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            value: Option<Box<RawValue>>,
        }

        let path = key_path(key)?;
        let req = self.client.new_request(Method::GET, &path)?;
        let resp: Resp = self.client.send_json(req).await?;
        match resp.value {
            Some(raw) if raw.get() != "null" => Ok(Some(serde_json::from_str(raw.get())?)),
            _ => Ok(None),
        }
    }

    /// Replaces the whole config object.
    pub async fn set_all<T: Serialize + ?Sized>(&self, config: &T) -> Result<()> {
        #[derive(Serialize)]
        struct Body<'b, T: ?Sized> {
            config: &'b T,
        }

        let req = self
            .client
            .new_request(Method::PUT, "/v2/config")?
            .json(&Body { config });
        let _: IgnoredAny = self.client.send_json(req).await?;
        Ok(())
    }

    /// Sets one key.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        #[derive(Serialize)]
        struct Body<'b, T: ?Sized> {
            value: &'b T,
        }

        let path = key_path(key)?;
        let req = self
            .client
            .new_request(Method::PUT, &path)?
            .json(&Body { value });
        let _: IgnoredAny = self.client.send_json(req).await?;
        Ok(())
    }

    /// Removes one key.
    pub async fn del(&self, key: &str) -> Result<()> {
        let path = key_path(key)?;
        let req = self.client.new_request(Method::DELETE, &path)?;
        let _: IgnoredAny = self.client.send_json(req).await?;
        Ok(())
    }
}

fn key_path(key: &str) -> Result<String> {
    if key.is_empty() {
        return Err(InvalidArgument::EmptyConfigKey.into());
    }
    Ok(format!("/v2/config/{}", segment(key)))
}
