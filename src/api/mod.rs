use crate::dnd::{ContainerRef, OrderBackend};
use crate::models::{Folder, Note, NoteFile};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Network,
    Http,
    Parse,
    NotFound,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The request never reached the server.
    pub(crate) fn offline(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    fn network(e: reqwest::Error) -> Self {
        Self::offline(e.to_string())
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self::new(ApiErrorKind::Parse, e.to_string())
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        let kind = if status == reqwest::StatusCode::NOT_FOUND {
            ApiErrorKind::NotFound
        } else {
            ApiErrorKind::Http
        };
        Self::new(kind, format!("{ctx} ({status}): {}", error_body_message(&body)))
    }
}

/// The backend answers errors with `{"error": "..."}`; fall back to the raw body.
fn error_body_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let default_api_url = "http://localhost:5000/api".to_string();

        // Both `window.ENV.API_URL` and the lowercase `window.ENV.api_url` are honored.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    for key in ["API_URL", "api_url"] {
                        if let Ok(api_url) = js_sys::Reflect::get(&env, &key.into()) {
                            if let Some(url_str) = api_url.as_string() {
                                return Self {
                                    api_url: url_str.trim_end_matches('/').to_string(),
                                };
                            }
                        }
                    }
                }
            }
        }

        Self {
            api_url: default_api_url,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct ReorderFilesRequest {
    #[serde(rename = "fileIds")]
    pub file_ids: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct ReorderNotesRequest {
    #[serde(rename = "noteIds")]
    pub note_ids: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct MoveFileRequest {
    /// `null` moves the file to the root.
    pub folder_id: Option<String>,
}

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }

    pub fn from_env() -> Self {
        Self::new(EnvConfig::new().api_url)
    }

    async fn request_api<T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&impl serde::Serialize>,
    ) -> ApiResult<T> {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        let mut req = client.request(method, url);

        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, "Request failed"))
        }
    }

    pub(crate) fn parse_file_list_response(data: serde_json::Value) -> ApiResult<Vec<NoteFile>> {
        parse_list(data, "files")
    }

    pub(crate) fn parse_folder_list_response(data: serde_json::Value) -> ApiResult<Vec<Folder>> {
        parse_list(data, "folders")
    }

    pub(crate) fn parse_note_list_response(data: serde_json::Value) -> ApiResult<Vec<Note>> {
        parse_list(data, "notes")
    }

    pub async fn get_files(&self) -> ApiResult<Vec<NoteFile>> {
        let data: serde_json::Value = self
            .request_api(reqwest::Method::GET, "/files", None::<&()>)
            .await?;
        Self::parse_file_list_response(data)
    }

    pub async fn get_folders(&self) -> ApiResult<Vec<Folder>> {
        let data: serde_json::Value = self
            .request_api(reqwest::Method::GET, "/folders", None::<&()>)
            .await?;
        Self::parse_folder_list_response(data)
    }

    pub async fn get_notes(&self, file_id: &str) -> ApiResult<Vec<Note>> {
        let data: serde_json::Value = self
            .request_api(reqwest::Method::GET, &format!("/files/{file_id}/notes"), None::<&()>)
            .await?;
        Self::parse_note_list_response(data)
    }

    pub async fn reorder_files(&self, file_ids: &[String]) -> ApiResult<()> {
        self.request_api::<serde_json::Value>(
            reqwest::Method::PUT,
            "/files/reorder",
            Some(&ReorderFilesRequest {
                file_ids: file_ids.to_vec(),
            }),
        )
        .await
        .map(|_| ())
    }

    pub async fn move_file(&self, file_id: &str, folder_id: Option<&str>) -> ApiResult<()> {
        self.request_api::<serde_json::Value>(
            reqwest::Method::PUT,
            &format!("/files/{file_id}"),
            Some(&MoveFileRequest {
                folder_id: folder_id.map(str::to_string),
            }),
        )
        .await
        .map(|_| ())
    }

    pub async fn reorder_notes(&self, note_ids: &[String]) -> ApiResult<()> {
        self.request_api::<serde_json::Value>(
            reqwest::Method::PUT,
            "/notes/reorder",
            Some(&ReorderNotesRequest {
                note_ids: note_ids.to_vec(),
            }),
        )
        .await
        .map(|_| ())
    }

    /// Ids of the files in `container`, in backend order.
    async fn file_order(&self, container: &ContainerRef) -> ApiResult<Vec<String>> {
        let files = self.get_files().await?;
        Ok(order_in(&files, container))
    }
}

/// Accepts a bare array or an object wrapping it under `key`.
fn parse_list<T: serde::de::DeserializeOwned>(data: serde_json::Value, key: &str) -> ApiResult<Vec<T>> {
    let list = match data {
        serde_json::Value::Array(_) => data,
        serde_json::Value::Object(mut map) => map
            .remove(key)
            .ok_or_else(|| ApiError::parse(format!("response has no `{key}` list")))?,
        other => return Err(ApiError::parse(format!("unexpected {key} response: {other}"))),
    };
    serde_json::from_value(list).map_err(ApiError::parse)
}

fn order_in(files: &[NoteFile], container: &ContainerRef) -> Vec<String> {
    let mut in_container = files
        .iter()
        .filter(|f| ContainerRef::from_folder_id(f.folder_id.as_deref()) == *container)
        .collect::<Vec<_>>();
    in_container.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
    in_container.into_iter().map(|f| f.id.clone()).collect()
}

impl OrderBackend for ApiClient {
    fn fetch_order<'a>(&'a self, container: &'a ContainerRef) -> LocalBoxFuture<'a, ApiResult<Vec<String>>> {
        Box::pin(self.file_order(container))
    }

    fn persist_reorder<'a>(
        &'a self,
        _container: &'a ContainerRef,
        ordered_item_ids: &'a [String],
    ) -> LocalBoxFuture<'a, ApiResult<()>> {
        // The backend reindexes whatever ids it is given; the container is implied.
        Box::pin(self.reorder_files(ordered_item_ids))
    }

    fn persist_reparent<'a>(
        &'a self,
        item_id: &'a str,
        new_container: &'a ContainerRef,
    ) -> LocalBoxFuture<'a, ApiResult<()>> {
        Box::pin(self.move_file(item_id, new_container.folder_id()))
    }
}

/// Order backend for the notes of one file. Notes live in a single flat
/// list, so the root is the only container and nothing is ever reparented.
#[derive(Clone)]
pub(crate) struct NoteOrder {
    client: ApiClient,
    file_id: Option<String>,
}

impl NoteOrder {
    pub fn new(client: ApiClient, file_id: Option<String>) -> Self {
        Self { client, file_id }
    }

    async fn note_order(&self, container: &ContainerRef) -> ApiResult<Vec<String>> {
        let Some(file_id) = self.file_id.as_deref().filter(|_| container.is_root()) else {
            return Err(ApiError::new(ApiErrorKind::NotFound, format!("no note list for {container}")));
        };
        let notes = self.client.get_notes(file_id).await?;
        Ok(note_order_of(&notes))
    }
}

fn note_order_of(notes: &[Note]) -> Vec<String> {
    let mut sorted = notes.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
    sorted.into_iter().map(|n| n.id.clone()).collect()
}

impl OrderBackend for NoteOrder {
    fn fetch_order<'a>(&'a self, container: &'a ContainerRef) -> LocalBoxFuture<'a, ApiResult<Vec<String>>> {
        Box::pin(self.note_order(container))
    }

    fn persist_reorder<'a>(
        &'a self,
        _container: &'a ContainerRef,
        ordered_item_ids: &'a [String],
    ) -> LocalBoxFuture<'a, ApiResult<()>> {
        Box::pin(self.client.reorder_notes(ordered_item_ids))
    }

    fn persist_reparent<'a>(
        &'a self,
        item_id: &'a str,
        new_container: &'a ContainerRef,
    ) -> LocalBoxFuture<'a, ApiResult<()>> {
        let err = ApiError::new(
            ApiErrorKind::Http,
            format!("note {item_id} cannot move to {new_container}"),
        );
        Box::pin(async move { Err(err) })
    }
}
