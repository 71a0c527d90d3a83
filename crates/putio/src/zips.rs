//! Zip archives of files and folders.

use reqwest::Method;
use serde::Deserialize;

use crate::client::Client;
use crate::error::{InvalidArgument, Result};
use crate::params::{check_id, join_ids};
use crate::types::Zip;

/// Zip endpoints.
pub struct ZipsService<'a> {
    client: &'a Client,
}

impl<'a> ZipsService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Returns the state of a zip job. `url` is set once it is ready.
    pub async fn get(&self, id: i64) -> Result<Zip> {
        let id = check_id(id)?;
        let req = self
            .client
            .new_request(Method::GET, &format!("/v2/zips/{id}"))?;
        let mut zip: Zip = self.client.send_json(req).await?;
        if zip.id == 0 {
            zip.id = id;
        }
        Ok(zip)
    }

    /// Lists active zip jobs.
    pub async fn list(&self) -> Result<Vec<Zip>> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            zips: Vec<Zip>,
        }

        let req = self.client.new_request(Method::GET, "/v2/zips/list")?;
        let resp: Resp = self.client.send_json(req).await?;
        Ok(resp.zips)
    }

    /// Starts zipping the given files, returning the zip job id.
    pub async fn create(&self, ids: &[i64]) -> Result<i64> {
        #[derive(Deserialize)]
        struct Resp {
            zip_id: i64,
        }

        let ids = join_ids(ids, InvalidArgument::NoFileId)?;
        let req = self
            .client
            .new_request(Method::POST, "/v2/zips/create")?
            .form(&[("file_ids", ids)]);
        let resp: Resp = self.client.send_json(req).await?;
        Ok(resp.zip_id)
    }
}
