use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::context::AppContext;
use crate::error::ClientError;

/// What goes on the wire with a request. Multipart is for binary form
/// payloads (media uploads); reqwest sets the form boundary content type for
/// it, never `application/json`.
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(reqwest::multipart::Form),
}

/// Authenticated REST access. Injects the bearer token when a session is
/// present, normalizes errors, performs no retries — retry policy belongs to
/// the caller.
#[derive(Clone)]
pub struct Http {
    client: reqwest::Client,
    base_url: String,
    ctx: AppContext,
}

impl Http {
    pub fn new(base_url: impl Into<String>, ctx: AppContext) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            ctx,
        }
    }

    /// Assemble the request. Without a session the request goes out with no
    /// `Authorization` header at all; the server's rejection (not a fabricated
    /// client error) is what the caller sees.
    fn build(&self, method: Method, path: &str, body: RequestBody) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let mut req = self.client.request(method, url);
        if let Some(token) = self.ctx.token() {
            req = req.bearer_auth(token);
        }
        match body {
            RequestBody::Empty => req,
            RequestBody::Json(value) => req.json(&value),
            RequestBody::Multipart(form) => req.multipart(form),
        }
    }

    /// Query pairs ride on a bodiless request; reqwest percent-encodes them.
    fn build_query(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> reqwest::RequestBuilder {
        self.build(method, path, RequestBody::Empty).query(query)
    }

    /// Core request path: send, normalize failure, decode JSON.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<T, ClientError> {
        self.execute(self.build(method, path, body)).await
    }

    /// Like `request`, for endpoints whose response body carries nothing.
    pub async fn request_unit(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<(), ClientError> {
        let response = self.send(self.build(method, path, body)).await?;
        self.check_status(response).await?;
        Ok(())
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(req).await?;
        let response = self.check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Network(format!("invalid response body: {e}")))
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        req.send().await.map_err(|e| {
            debug!("transport failure: {}", e);
            ClientError::Network("request could not complete".into())
        })
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &body),
            });
        }
        Ok(response)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(Method::GET, path, RequestBody::Empty).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        self.execute(self.build_query(Method::GET, path, query)).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let value = serde_json::to_value(body)?;
        self.request(Method::POST, path, RequestBody::Json(value))
            .await
    }

    pub async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ClientError> {
        let value = serde_json::to_value(body)?;
        self.request_unit(Method::POST, path, RequestBody::Json(value))
            .await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let value = serde_json::to_value(body)?;
        self.request(Method::PUT, path, RequestBody::Json(value))
            .await
    }

    pub async fn delete_unit(&self, path: &str) -> Result<(), ClientError> {
        self.request_unit(Method::DELETE, path, RequestBody::Empty)
            .await
    }
}

/// Pull the server's own error string out of a failure body. The server
/// reports either `message` or `error`; anything else gets a generic line.
fn error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["message", "error"] {
            if let Some(msg) = value.get(field).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    format!("request failed with status {status}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reqwest::header;
    use uuid::Uuid;
    use vesselx_types::models::{Session, User};

    use crate::bus::EventBus;
    use crate::storage::MemoryStore;

    fn http_with_session(token: Option<&str>) -> Http {
        let ctx = AppContext::new(Box::new(MemoryStore::new()), EventBus::new());
        if let Some(token) = token {
            ctx.set_session(Session {
                token: token.into(),
                user: User {
                    id: Uuid::new_v4(),
                    username: "ada".into(),
                    display_name: None,
                    avatar_url: None,
                    created_at: Utc::now(),
                },
            });
        }
        Http::new("http://localhost:3000", ctx)
    }

    #[test]
    fn no_session_means_no_authorization_header() {
        let http = http_with_session(None);
        let req = http
            .build(Method::GET, "/conversations", RequestBody::Empty)
            .build()
            .unwrap();
        assert!(req.headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn session_token_becomes_bearer_header() {
        let http = http_with_session(Some("tok-9"));
        let req = http
            .build(Method::GET, "/conversations", RequestBody::Empty)
            .build()
            .unwrap();
        let auth = req.headers().get(header::AUTHORIZATION).unwrap();
        assert_eq!(auth.to_str().unwrap(), "Bearer tok-9");
    }

    #[test]
    fn json_body_sets_json_content_type() {
        let http = http_with_session(None);
        let req = http
            .build(
                Method::POST,
                "/posts",
                RequestBody::Json(serde_json::json!({"text": "hi"})),
            )
            .build()
            .unwrap();
        let ct = req.headers().get(header::CONTENT_TYPE).unwrap();
        assert_eq!(ct.to_str().unwrap(), "application/json");
    }

    #[test]
    fn multipart_body_is_not_json() {
        let http = http_with_session(None);
        let form = reqwest::multipart::Form::new().text("text", "hi");
        let req = http
            .build(Method::POST, "/posts", RequestBody::Multipart(form))
            .build()
            .unwrap();
        let ct = req.headers().get(header::CONTENT_TYPE).unwrap();
        assert!(ct.to_str().unwrap().starts_with("multipart/form-data"));
    }

    #[test]
    fn error_message_prefers_server_fields() {
        assert_eq!(
            error_message(422, r#"{"message":"Username taken"}"#),
            "Username taken"
        );
        assert_eq!(error_message(401, r#"{"error":"Invalid token"}"#), "Invalid token");
        assert_eq!(
            error_message(500, "<html>oops</html>"),
            "request failed with status 500"
        );
    }

    #[test]
    fn query_pairs_are_percent_encoded() {
        let http = http_with_session(None);
        let req = http
            .build_query(Method::GET, "/users/search", &[("q", "ada lovelace&x=1")])
            .build()
            .unwrap();
        assert_eq!(
            req.url().as_str(),
            "http://localhost:3000/users/search?q=ada+lovelace%26x%3D1"
        );
    }

    #[test]
    fn paths_join_without_double_slashes() {
        let ctx = AppContext::new(Box::new(MemoryStore::new()), EventBus::new());
        let http = Http::new("http://localhost:3000/", ctx);
        let req = http
            .build(Method::GET, "/feed", RequestBody::Empty)
            .build()
            .unwrap();
        assert_eq!(req.url().as_str(), "http://localhost:3000/feed");
    }
}
