//! Torrent and URL transfers.

use reqwest::Method;
use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::client::Client;
use crate::error::{InvalidArgument, Result};
use crate::params::{check_id, join_ids};
use crate::types::Transfer;

/// Transfer endpoints.
pub struct TransfersService<'a> {
    client: &'a Client,
}

#[derive(Deserialize)]
struct TransferResp {
    transfer: Transfer,
}

impl<'a> TransfersService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Lists active transfers. Completed ones disappear once cleaned.
    pub async fn list(&self) -> Result<Vec<Transfer>> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            transfers: Vec<Transfer>,
        }

        let req = self.client.new_request(Method::GET, "/v2/transfers/list")?;
        let resp: Resp = self.client.send_json(req).await?;
        Ok(resp.transfers)
    }

    pub async fn get(&self, id: i64) -> Result<Transfer> {
        let id = check_id(id)?;
        let req = self
            .client
            .new_request(Method::GET, &format!("/v2/transfers/{id}"))?;
        let resp: TransferResp = self.client.send_json(req).await?;
        Ok(resp.transfer)
    }

    /// Adds a torrent, magnet or HTTP URL for download into `parent`.
    ///
    /// `callback_url` is notified when the transfer completes; it is not
    /// sent when empty.
    pub async fn add(
        &self,
        url: &str,
        parent: i64,
        extract: bool,
        callback_url: &str,
    ) -> Result<Transfer> {
        let parent = check_id(parent)?;
        if url.is_empty() {
            return Err(InvalidArgument::EmptyUrl.into());
        }

        let mut form = vec![
            ("url", url.to_string()),
            ("save_parent_id", parent.to_string()),
            ("extract", extract.to_string()),
        ];
        if !callback_url.is_empty() {
            form.push(("callback_url", callback_url.to_string()));
        }

        let req = self
            .client
            .new_request(Method::POST, "/v2/transfers/add")?
            .form(&form);
        let resp: TransferResp = self.client.send_json(req).await?;
        Ok(resp.transfer)
    }

    /// Retries a failed transfer.
    pub async fn retry(&self, id: i64) -> Result<Transfer> {
        let id = check_id(id)?;
        let req = self
            .client
            .new_request(Method::POST, "/v2/transfers/retry")?
            .form(&[("id", id.to_string())]);
        let resp: TransferResp = self.client.send_json(req).await?;
        Ok(resp.transfer)
    }

    /// Cancels transfers, removing seeding ones as well.
    pub async fn cancel(&self, ids: &[i64]) -> Result<()> {
        let ids = join_ids(ids, InvalidArgument::NoFileId)?;
        let req = self
            .client
            .new_request(Method::POST, "/v2/transfers/cancel")?
            .form(&[("transfer_ids", ids)]);
        let _: IgnoredAny = self.client.send_json(req).await?;
        Ok(())
    }

    /// Removes completed transfers from the list.
    pub async fn clean(&self) -> Result<()> {
        let req = self.client.new_request(Method::POST, "/v2/transfers/clean")?;
        let _: IgnoredAny = self.client.send_json(req).await?;
        Ok(())
    }
}
