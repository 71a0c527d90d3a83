//! File listing, search, CRUD, downloads, subtitles and video helpers.

use reqwest::header::{HeaderMap, LOCATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, Response};
use serde::Deserialize;
use serde::de::IgnoredAny;
use tracing::debug;

use crate::client::Client;
use crate::error::{Error, InvalidArgument, Result};
use crate::params::{check_id, join_ids, segment};
use crate::types::{File, Search, Share, SharedWith, Subtitle, Upload};

/// File endpoints.
pub struct FilesService<'a> {
    client: &'a Client,
}

/// Subtitles available for a video, plus the key the server would pick.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Subtitles {
    #[serde(default)]
    pub subtitles: Vec<Subtitle>,
    #[serde(default)]
    pub default: Option<String>,
}

impl<'a> FilesService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Fetches file metadata.
    pub async fn get(&self, id: i64) -> Result<File> {
        #[derive(Deserialize)]
        struct Resp {
            file: File,
        }

        let id = check_id(id)?;
        let req = self
            .client
            .new_request(Method::GET, &format!("/v2/files/{id}"))?;
        let resp: Resp = self.client.send_json(req).await?;
        Ok(resp.file)
    }

    /// Lists the children of a folder. Returns the children and the folder itself.
    pub async fn list(&self, id: i64) -> Result<(Vec<File>, File)> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            files: Vec<File>,
            parent: File,
        }

        let id = check_id(id)?;
        let req = self
            .client
            .new_request(Method::GET, "/v2/files/list")?
            .query(&[("parent_id", id)]);
        let resp: Resp = self.client.send_json(req).await?;
        Ok((resp.files, resp.parent))
    }

    /// Starts downloading a file.
    ///
    /// The API answers with a redirect to a storage server; it is followed
    /// exactly once, carrying `headers` along (storage servers accept
    /// `Range`). The client timeout bounds each hop up to the response
    /// head; the returned body is not read and has no deadline.
    pub async fn download(
        &self,
        id: i64,
        use_tunnel: bool,
        headers: HeaderMap,
    ) -> Result<Response> {
        let id = check_id(id)?;
        let notunnel = if use_tunnel { "0" } else { "1" };
        let url = self.client.resolve(&format!("/v2/files/{id}/download"))?;
        let req = self
            .client
            .untimed_request(Method::GET, url)
            .query(&[("notunnel", notunnel)])
            .headers(headers.clone());
        let resp = self.client.send_streaming(req).await?;

        if !resp.status().is_redirection() {
            return Ok(resp);
        }

        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(Error::MissingHeader("location"))?;
        let target = resp
            .url()
            .join(location)
            .map_err(|e| Error::InvalidUrl(format!("{location}: {e}")))?;
        debug!(id, %target, "following download redirect");

        let req = self
            .client
            .untimed_request(Method::GET, target)
            .headers(headers);
        self.client.send_streaming(req).await
    }

    /// Creates a folder under `parent`.
    pub async fn create_folder(&self, name: &str, parent: i64) -> Result<File> {
        #[derive(Deserialize)]
        struct Resp {
            file: File,
        }

        if name.is_empty() {
            return Err(InvalidArgument::EmptyFolderName.into());
        }
        let parent = check_id(parent)?;

        let req = self
            .client
            .new_request(Method::POST, "/v2/files/create-folder")?
            .form(&[("name", name.to_string()), ("parent_id", parent.to_string())]);
        let resp: Resp = self.client.send_json(req).await?;
        Ok(resp.file)
    }

    /// Deletes files.
    pub async fn delete(&self, ids: &[i64]) -> Result<()> {
        let ids = join_ids(ids, InvalidArgument::NoFileId)?;
        let req = self
            .client
            .new_request(Method::POST, "/v2/files/delete")?
            .form(&[("file_ids", ids)]);
        let _: IgnoredAny = self.client.send_json(req).await?;
        Ok(())
    }

    /// Renames a file.
    pub async fn rename(&self, id: i64, new_name: &str) -> Result<()> {
        let id = check_id(id)?;
        if new_name.is_empty() {
            return Err(InvalidArgument::EmptyNewFilename.into());
        }

        let req = self
            .client
            .new_request(Method::POST, "/v2/files/rename")?
            .form(&[("file_id", id.to_string()), ("name", new_name.to_string())]);
        let _: IgnoredAny = self.client.send_json(req).await?;
        Ok(())
    }

    /// Moves files into `parent`.
    pub async fn move_files(&self, parent: i64, ids: &[i64]) -> Result<()> {
        let parent = check_id(parent)?;
        let ids = join_ids(ids, InvalidArgument::NoFiles)?;

        let req = self
            .client
            .new_request(Method::POST, "/v2/files/move")?
            .form(&[("file_ids", ids), ("parent_id", parent.to_string())]);
        let _: IgnoredAny = self.client.send_json(req).await?;
        Ok(())
    }

    /// Uploads a file in one multipart request.
    ///
    /// With `parent` unset the server uses the user's preferred folder.
    /// Torrent files become transfers and are reported in
    /// [`Upload::transfer`]. The whole content is held in memory; use the
    /// resumable [`crate::upload`] client for large files.
    pub async fn upload(
        &self,
        content: impl Into<Vec<u8>>,
        filename: &str,
        parent: Option<i64>,
    ) -> Result<Upload> {
        if filename.is_empty() {
            return Err(InvalidArgument::EmptyFilename.into());
        }

        let mut form = Form::new();
        if let Some(parent) = parent {
            form = form.text("parent_id", check_id(parent)?.to_string());
        }
        let part = Part::bytes(content.into()).file_name(filename.to_string());
        form = form.part("file", part);

        let url = self.client.upload_endpoint("/v2/files/upload")?;
        let req = self.client.request_to(Method::POST, url).multipart(form);
        self.client.send_json(req).await
    }

    /// Searches files. Each page holds 50 results; `page == -1` returns
    /// everything.
    pub async fn search(&self, query: &str, page: i64) -> Result<Search> {
        if page == 0 || page < -1 {
            return Err(InvalidArgument::InvalidPage.into());
        }
        if query.is_empty() {
            return Err(InvalidArgument::NoQuery.into());
        }

        let path = format!("/v2/files/search/{}/page/{page}", segment(query));
        let req = self.client.new_request(Method::GET, &path)?;
        self.client.send_json(req).await
    }

    /// Starts converting a video file to MP4.
    pub async fn convert_to_mp4(&self, id: i64) -> Result<()> {
        let id = check_id(id)?;
        let req = self
            .client
            .new_request(Method::POST, &format!("/v2/files/{id}/mp4"))?;
        let _: IgnoredAny = self.client.send_json(req).await?;
        Ok(())
    }

    /// Shares files with friends (by username); an empty list shares with
    /// everyone.
    pub async fn share(&self, ids: &[i64], friends: &[&str]) -> Result<()> {
        let ids = join_ids(ids, InvalidArgument::NoFiles)?;
        let friends = if friends.is_empty() {
            "everyone".to_string()
        } else {
            friends.join(",")
        };

        let req = self
            .client
            .new_request(Method::POST, "/v2/files/share")?
            .form(&[("file_ids", ids), ("friends", friends)]);
        let _: IgnoredAny = self.client.send_json(req).await?;
        Ok(())
    }

    /// Lists files shared by the user.
    pub async fn shared(&self) -> Result<Vec<Share>> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            shared: Vec<Share>,
        }

        let req = self.client.new_request(Method::GET, "/v2/files/shared")?;
        let resp: Resp = self.client.send_json(req).await?;
        Ok(resp.shared)
    }

    /// Lists the users a file is shared with.
    pub async fn shared_with(&self, id: i64) -> Result<Vec<SharedWith>> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default, rename = "shared-with")]
            shared_with: Vec<SharedWith>,
        }

        let id = check_id(id)?;
        let req = self
            .client
            .new_request(Method::GET, &format!("/v2/files/{id}/shared-with"))?;
        let resp: Resp = self.client.send_json(req).await?;
        Ok(resp.shared_with)
    }

    /// Lists subtitles for a video in the user's preferred language.
    pub async fn subtitles(&self, id: i64) -> Result<Subtitles> {
        let id = check_id(id)?;
        let req = self
            .client
            .new_request(Method::GET, &format!("/v2/files/{id}/subtitles"))?;
        self.client.send_json(req).await
    }

    /// Downloads a subtitle file. An empty `key` selects `default`: a
    /// subtitle next to the video with the same name, then one extracted
    /// from an MKV, then the first OpenSubtitles match.
    pub async fn download_subtitle(&self, id: i64, key: &str, format: &str) -> Result<Response> {
        let id = check_id(id)?;
        let key = if key.is_empty() { "default" } else { key };

        let mut req = self.client.new_request(
            Method::GET,
            &format!("/v2/files/{id}/subtitles/{}", segment(key)),
        )?;
        if !format.is_empty() {
            req = req.query(&[("format", format)]);
        }
        self.client.send(req).await
    }

    /// Fetches the HLS playlist of a video. `"all"` as `subtitle_key`
    /// includes every subtitle in the user's languages.
    pub async fn hls_playlist(&self, id: i64, subtitle_key: &str) -> Result<Response> {
        let id = check_id(id)?;
        if subtitle_key.is_empty() {
            return Err(InvalidArgument::EmptySubtitleKey.into());
        }

        let req = self
            .client
            .new_request(Method::GET, &format!("/v2/files/{id}/hls/media.m3u8"))?
            .query(&[("subtitle_key", subtitle_key)]);
        self.client.send(req).await
    }

    /// Stores the playback position of a video, in seconds.
    pub async fn set_video_position(&self, id: i64, seconds: i64) -> Result<()> {
        let id = check_id(id)?;
        if seconds < 0 {
            return Err(InvalidArgument::NegativeTime.into());
        }

        let req = self
            .client
            .new_request(Method::POST, &format!("/v2/files/{id}/start-from"))?
            .form(&[("time", seconds.to_string())]);
        let _: IgnoredAny = self.client.send_json(req).await?;
        Ok(())
    }

    /// Clears the stored playback position of a video.
    pub async fn delete_video_position(&self, id: i64) -> Result<()> {
        let id = check_id(id)?;
        let req = self
            .client
            .new_request(Method::POST, &format!("/v2/files/{id}/start-from/delete"))?;
        let _: IgnoredAny = self.client.send_json(req).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::header::{HeaderMap, HeaderValue, RANGE};

    use crate::error::{Error, InvalidArgument};
    use crate::testutil::{MockResponse, MockServer};
    use crate::Client;

    const FILE_JSON: &str = r#"{
        "file": {
            "content_type": "text/plain",
            "crc32": "66a1512f",
            "created_at": "2013-09-07T21:32:03",
            "first_accessed_at": null,
            "icon": "https://put.io/images/file_types/text.png",
            "id": 6546533,
            "is_mp4_available": false,
            "is_shared": false,
            "name": "MyFile.txt",
            "opensubtitles_hash": null,
            "parent_id": 123,
            "screenshot": null,
            "size": 92
        },
        "status": "OK"
    }"#;

    const OK: &str = r#"{"status":"OK"}"#;

    fn client(url: &str) -> Client {
        Client::builder()
            .token("t")
            .base_url(url)
            .upload_url(url)
            .build()
            .unwrap()
    }

    fn offline() -> Client {
        client("http://127.0.0.1:9")
    }

    fn assert_invalid(err: Error, expected: InvalidArgument) {
        match err {
            Error::InvalidArgument(got) => assert_eq!(got, expected),
            other => panic!("expected {expected:?}, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_returns_file() {
        let server = MockServer::start(vec![MockResponse::json(FILE_JSON)]).await;
        let file = client(&server.url).files().get(1).await.unwrap();

        assert_eq!(file.size, 92);
        assert_eq!(file.name, "MyFile.txt");
        let req = server.request(0);
        assert_eq!(req.method, "GET");
        assert_eq!(req.path(), "/v2/files/1");
    }

    #[tokio::test]
    async fn negative_ids_are_rejected_locally() {
        let client = offline();
        let files = client.files();
        assert_invalid(files.get(-1).await.unwrap_err(), InvalidArgument::NegativeId);
        assert_invalid(files.list(-1).await.unwrap_err(), InvalidArgument::NegativeId);
        assert_invalid(
            files.rename(-1, "x").await.unwrap_err(),
            InvalidArgument::NegativeId,
        );
        assert_invalid(
            files.move_files(-1, &[1]).await.unwrap_err(),
            InvalidArgument::NegativeId,
        );
        assert_invalid(
            files.create_folder("x", -1).await.unwrap_err(),
            InvalidArgument::NegativeId,
        );
    }

    #[tokio::test]
    async fn list_returns_children_and_parent() {
        let json = r#"{
            "files": [
                {"id": 6546533, "name": "MyFile.txt", "parent_id": 123, "size": 92},
                {"id": 7645645, "name": "MyVideo.mkv", "parent_id": 123, "size": 1155197659}
            ],
            "parent": {"id": 123, "name": "MyFolder", "content_type": "application/x-directory", "crc32": null},
            "status": "OK"
        }"#;
        let server = MockServer::start(vec![MockResponse::json(json)]).await;

        let (files, parent) = client(&server.url).files().list(123).await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(parent.id, 123);
        assert!(parent.is_dir());

        let req = server.request(0);
        assert_eq!(req.path(), "/v2/files/list");
        assert_eq!(req.query()["parent_id"], "123");
    }

    #[tokio::test]
    async fn create_folder_posts_form() {
        let server = MockServer::start(vec![MockResponse::json(FILE_JSON)]).await;
        let file = client(&server.url)
            .files()
            .create_folder("new folder", 0)
            .await
            .unwrap();
        assert_eq!(file.id, 6546533);

        let req = server.request(0);
        assert_eq!(req.method, "POST");
        assert_eq!(req.path(), "/v2/files/create-folder");
        assert_eq!(
            req.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        let form = req.form();
        assert_eq!(form["name"], "new folder");
        assert_eq!(form["parent_id"], "0");
    }

    #[tokio::test]
    async fn create_folder_requires_name() {
        let err = offline().files().create_folder("", 0).await.unwrap_err();
        assert_invalid(err, InvalidArgument::EmptyFolderName);
    }

    #[tokio::test]
    async fn delete_joins_ids() {
        let server = MockServer::start(vec![MockResponse::json(OK)]).await;
        client(&server.url).files().delete(&[1, 2, 3]).await.unwrap();

        let req = server.request(0);
        assert_eq!(req.path(), "/v2/files/delete");
        assert_eq!(req.form()["file_ids"], "1,2,3");
    }

    #[tokio::test]
    async fn delete_requires_ids() {
        let err = offline().files().delete(&[]).await.unwrap_err();
        assert_invalid(err, InvalidArgument::NoFileId);
    }

    #[tokio::test]
    async fn delete_reports_error_envelope() {
        let body = r#"{"status":"ERROR","error_type":"FILE_NOT_FOUND","error_message":"gone"}"#;
        let server = MockServer::start(vec![MockResponse::json(body)]).await;

        let err = client(&server.url).files().delete(&[9]).await.unwrap_err();
        let Error::Api(resp) = err else {
            panic!("expected API error");
        };
        assert_eq!(resp.kind, "FILE_NOT_FOUND");
        assert_eq!(resp.method, "POST");
    }

    #[tokio::test]
    async fn rename_posts_form() {
        let server = MockServer::start(vec![MockResponse::json(OK)]).await;
        client(&server.url)
            .files()
            .rename(5, "renamed.txt")
            .await
            .unwrap();

        let form = server.request(0).form();
        assert_eq!(form["file_id"], "5");
        assert_eq!(form["name"], "renamed.txt");
    }

    #[tokio::test]
    async fn rename_requires_new_name() {
        let err = offline().files().rename(5, "").await.unwrap_err();
        assert_invalid(err, InvalidArgument::EmptyNewFilename);
    }

    #[tokio::test]
    async fn move_files_posts_parent_and_ids() {
        let server = MockServer::start(vec![MockResponse::json(OK)]).await;
        client(&server.url)
            .files()
            .move_files(10, &[1, 2])
            .await
            .unwrap();

        let req = server.request(0);
        assert_eq!(req.path(), "/v2/files/move");
        let form = req.form();
        assert_eq!(form["file_ids"], "1,2");
        assert_eq!(form["parent_id"], "10");
    }

    #[tokio::test]
    async fn move_files_requires_ids() {
        let err = offline().files().move_files(0, &[]).await.unwrap_err();
        assert_invalid(err, InvalidArgument::NoFiles);
    }

    #[tokio::test]
    async fn upload_sends_multipart_to_upload_server() {
        let server = MockServer::start(vec![MockResponse::json(FILE_JSON)]).await;
        let upload = client(&server.url)
            .files()
            .upload(b"hello world".to_vec(), "hello.txt", Some(7))
            .await
            .unwrap();
        assert_eq!(upload.file.unwrap().id, 6546533);
        assert!(upload.transfer.is_none());

        let req = server.request(0);
        assert_eq!(req.method, "POST");
        assert_eq!(req.path(), "/v2/files/upload");
        assert!(
            req.header("content-type")
                .unwrap()
                .starts_with("multipart/form-data")
        );
        let body = req.body_text();
        assert!(body.contains("name=\"parent_id\""));
        assert!(body.contains("filename=\"hello.txt\""));
        assert!(body.contains("hello world"));
    }

    #[tokio::test]
    async fn upload_without_parent_omits_field() {
        let json = r#"{"status":"OK","transfer":{"id":3,"name":"linux.torrent"}}"#;
        let server = MockServer::start(vec![MockResponse::json(json)]).await;
        let upload = client(&server.url)
            .files()
            .upload(b"d8:announce".to_vec(), "linux.torrent", None)
            .await
            .unwrap();
        assert_eq!(upload.transfer.unwrap().id, 3);
        assert!(!server.request(0).body_text().contains("parent_id"));
    }

    #[tokio::test]
    async fn upload_requires_filename() {
        let err = offline().files().upload(vec![1], "", None).await.unwrap_err();
        assert_invalid(err, InvalidArgument::EmptyFilename);
    }

    #[tokio::test]
    async fn search_encodes_query() {
        let json = r#"{"status":"OK","files":[{"id":1,"name":"ubuntu.iso"}],"next":"https://api.put.io/v2/files/search/ubuntu/page/2"}"#;
        let server = MockServer::start(vec![MockResponse::json(json)]).await;

        let result = client(&server.url)
            .files()
            .search("ubuntu iso", 1)
            .await
            .unwrap();
        assert_eq!(result.files.len(), 1);
        assert!(result.next.ends_with("/page/2"));
        assert_eq!(
            server.request(0).path(),
            "/v2/files/search/ubuntu%20iso/page/1"
        );
    }

    #[tokio::test]
    async fn search_validates_arguments() {
        let client = offline();
        let files = client.files();
        assert_invalid(
            files.search("x", 0).await.unwrap_err(),
            InvalidArgument::InvalidPage,
        );
        assert_invalid(
            files.search("x", -2).await.unwrap_err(),
            InvalidArgument::InvalidPage,
        );
        assert_invalid(files.search("", 1).await.unwrap_err(), InvalidArgument::NoQuery);
    }

    #[tokio::test]
    async fn download_follows_redirect_once_with_headers() {
        let storage = MockServer::start(vec![
            MockResponse::status(206).with_header("Content-Type", "application/octet-stream"),
        ])
        .await;
        let target = format!("{}/blob/1?token=abc", storage.url);
        let api = MockServer::start(vec![
            MockResponse::status(302).with_header("Location", &target),
        ])
        .await;

        let mut headers = HeaderMap::new();
        headers.insert(RANGE, HeaderValue::from_static("bytes=0-9"));
        let resp = client(&api.url)
            .files()
            .download(1, false, headers)
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 206);

        let first = api.request(0);
        assert_eq!(first.path(), "/v2/files/1/download");
        assert_eq!(first.query()["notunnel"], "1");
        assert_eq!(first.header("range"), Some("bytes=0-9"));

        let second = storage.request(0);
        assert_eq!(second.path(), "/blob/1");
        assert_eq!(second.header("range"), Some("bytes=0-9"));
    }

    #[tokio::test]
    async fn slow_download_body_outlives_client_timeout() {
        let storage = MockServer::start(vec![
            MockResponse::status(200)
                .with_body("0123456789abcdefghij")
                .trickle(5, Duration::from_millis(150)),
        ])
        .await;
        let target = format!("{}/blob/1", storage.url);
        let api = MockServer::start(vec![
            MockResponse::status(302).with_header("Location", &target),
        ])
        .await;
        let client = Client::builder()
            .token("test-token")
            .base_url(&api.url)
            .timeout(Duration::from_millis(300))
            .build()
            .unwrap();

        let resp = client
            .files()
            .download(1, false, HeaderMap::new())
            .await
            .unwrap();
        let body = resp.bytes().await.unwrap();
        assert_eq!(&body[..], b"0123456789abcdefghij");
    }

    #[tokio::test]
    async fn download_redirect_without_location_fails() {
        let server = MockServer::start(vec![MockResponse::status(302)]).await;
        let err = client(&server.url)
            .files()
            .download(1, true, HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingHeader("location")), "{err:?}");
        assert_eq!(server.request(0).query()["notunnel"], "0");
    }

    #[tokio::test]
    async fn download_missing_file_is_api_error() {
        let body = r#"{"status":"ERROR","error_type":"NotFound","error_message":"no such file"}"#;
        let server = MockServer::start(vec![MockResponse::json(body).with_status(404)]).await;
        let err = client(&server.url)
            .files()
            .download(1, false, HeaderMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn share_defaults_to_everyone() {
        let server = MockServer::start(vec![
            MockResponse::json(OK),
            MockResponse::json(OK),
        ])
        .await;
        let client = client(&server.url);
        client.files().share(&[1, 2], &[]).await.unwrap();
        client.files().share(&[3], &["alice", "bob"]).await.unwrap();

        assert_eq!(server.request(0).form()["friends"], "everyone");
        assert_eq!(server.request(0).form()["file_ids"], "1,2");
        assert_eq!(server.request(1).form()["friends"], "alice,bob");
    }

    #[tokio::test]
    async fn shared_and_shared_with() {
        let server = MockServer::start(vec![
            MockResponse::json(
                r#"{"status":"OK","shared":[{"file_id":1,"file_name":"a.mkv","shared_with":2}]}"#,
            ),
            MockResponse::json(
                r#"{"status":"OK","shared-with":[{"share_id":9,"user_name":"alice","user_avatar_url":""}]}"#,
            ),
        ])
        .await;
        let client = client(&server.url);

        let shared = client.files().shared().await.unwrap();
        assert_eq!(shared[0].filename, "a.mkv");
        assert_eq!(shared[0].shared_with, 2);

        let with = client.files().shared_with(1).await.unwrap();
        assert_eq!(with[0].username, "alice");
        assert_eq!(server.request(1).path(), "/v2/files/1/shared-with");
    }

    #[tokio::test]
    async fn subtitles_and_default_key() {
        let json = r#"{"status":"OK","default":"key1","subtitles":[{"key":"key1","language":"English","name":"movie.srt","source":"folder"}]}"#;
        let server = MockServer::start(vec![
            MockResponse::json(json),
            MockResponse::status(200).with_header("Content-Type", "text/plain"),
        ])
        .await;
        let client = client(&server.url);

        let subs = client.files().subtitles(4).await.unwrap();
        assert_eq!(subs.default.as_deref(), Some("key1"));
        assert_eq!(subs.subtitles[0].language, "English");

        client.files().download_subtitle(4, "", "webvtt").await.unwrap();
        let req = server.request(1);
        assert_eq!(req.path(), "/v2/files/4/subtitles/default");
        assert_eq!(req.query()["format"], "webvtt");
    }

    #[tokio::test]
    async fn hls_playlist_sends_subtitle_key() {
        let server = MockServer::start(vec![MockResponse::status(200)]).await;
        client(&server.url)
            .files()
            .hls_playlist(4, "all")
            .await
            .unwrap();

        let req = server.request(0);
        assert_eq!(req.path(), "/v2/files/4/hls/media.m3u8");
        assert_eq!(req.query()["subtitle_key"], "all");
    }

    #[tokio::test]
    async fn hls_playlist_requires_key() {
        let err = offline().files().hls_playlist(4, "").await.unwrap_err();
        assert_invalid(err, InvalidArgument::EmptySubtitleKey);
    }

    #[tokio::test]
    async fn video_position() {
        let server = MockServer::start(vec![
            MockResponse::json(OK),
            MockResponse::json(OK),
            MockResponse::json(OK),
        ])
        .await;
        let client = client(&server.url);

        client.files().set_video_position(8, 95).await.unwrap();
        client.files().delete_video_position(8).await.unwrap();
        client.files().convert_to_mp4(8).await.unwrap();

        assert_eq!(server.request(0).path(), "/v2/files/8/start-from");
        assert_eq!(server.request(0).form()["time"], "95");
        assert_eq!(server.request(1).path(), "/v2/files/8/start-from/delete");
        assert_eq!(server.request(2).path(), "/v2/files/8/mp4");
    }

    #[tokio::test]
    async fn negative_video_position_rejected() {
        let err = offline()
            .files()
            .set_video_position(8, -1)
            .await
            .unwrap_err();
        assert_invalid(err, InvalidArgument::NegativeTime);
    }
}
