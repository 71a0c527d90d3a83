//! Friend list and friend requests.

use reqwest::Method;
use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::client::Client;
use crate::error::{InvalidArgument, Result};
use crate::params::segment;
use crate::types::Friend;

/// Friend endpoints.
pub struct FriendsService<'a> {
    client: &'a Client,
}

#[derive(Deserialize)]
struct FriendsResp {
    #[serde(default)]
    friends: Vec<Friend>,
}

impl<'a> FriendsService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Friend>> {
        self.fetch("/v2/friends/list").await
    }

    /// Incoming friend requests.
    pub async fn waiting_requests(&self) -> Result<Vec<Friend>> {
        self.fetch("/v2/friends/waiting-requests").await
    }

    /// Sends a friend request.
    pub async fn request(&self, username: &str) -> Result<()> {
        self.act(username, "request").await
    }

    pub async fn approve(&self, username: &str) -> Result<()> {
        self.act(username, "approve").await
    }

    pub async fn deny(&self, username: &str) -> Result<()> {
        self.act(username, "deny").await
    }

    pub async fn unfriend(&self, username: &str) -> Result<()> {
        self.act(username, "unfriend").await
    }

    async fn fetch(&self, path: &str) -> Result<Vec<Friend>> {
        let req = self.client.new_request(Method::GET, path)?;
        let resp: FriendsResp = self.client.send_json(req).await?;
        Ok(resp.friends)
    }

    async fn act(&self, username: &str, action: &str) -> Result<()> {
        if username.is_empty() {
            return Err(InvalidArgument::EmptyUsername.into());
        }
        let path = format!("/v2/friends/{}/{action}", segment(username));
        let req = self.client.new_request(Method::POST, &path)?;
        let _: IgnoredAny = self.client.send_json(req).await?;
        Ok(())
    }
}
