//! Response format selection and the shared HTML/JSON reply flow
//!
//! Handlers produce an [`Outcome`] (or an [`ApiError`]) and hand it to
//! [`Negotiation::reply`], which renders it in the format the client asked
//! for: JSON bodies and status codes, or HTML pages and redirects carrying a
//! flash message.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Query},
    http::{
        header::{ACCEPT, CONTENT_TYPE, LOCATION, SET_COOKIE},
        request::Parts,
        HeaderName, HeaderValue, StatusCode,
    },
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::flash::Flash;
use super::html;
use super::types::error::ApiError;

/// The two representations every endpoint can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Html,
    Json,
}

impl OutputFormat {
    /// An explicit `format` query parameter wins over the `Accept` header
    pub fn resolve(format: Option<&str>, accept: Option<&str>) -> Self {
        let requested = format.map(|format| format.trim().to_ascii_lowercase());

        match requested.as_deref() {
            Some("json") => return Self::Json,
            Some("html") => return Self::Html,
            _ => {}
        }

        match accept {
            Some(accept) if accept.to_ascii_lowercase().contains("application/json") => Self::Json,
            _ => Self::Html,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FormatQuery {
    #[serde(default)]
    format: Option<String>,
}

/// Per-request format, pending flash message and request path
#[derive(Debug, Clone)]
pub struct Negotiation {
    pub format: OutputFormat,
    pub flash: Option<Flash>,
    pub path: String,
}

impl<S> FromRequestParts<S> for Negotiation
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let accept = parts.headers.get(ACCEPT).and_then(|value| value.to_str().ok());
        let query = Query::<FormatQuery>::try_from_uri(&parts.uri)
            .map(|Query(query)| query)
            .unwrap_or_default();

        Ok(Self {
            format: OutputFormat::resolve(query.format.as_deref(), accept),
            flash: Flash::from_headers(&parts.headers),
            path: parts.uri.path().to_string(),
        })
    }
}

/// A serialized entity (or list) plus what the HTML page needs around it
#[derive(Debug, Clone)]
pub struct Representation {
    pub title: String,
    pub value: Value,
    pub base: Option<String>,
    pub links: Vec<(String, String)>,
}

impl Representation {
    pub fn new<T: Serialize>(title: impl Into<String>, view: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(view)
            .map_err(|e| ApiError::internal(format!("Failed to serialize response: {}", e)))?;

        Ok(Self {
            title: title.into(),
            value,
            base: None,
            links: Vec::new(),
        })
    }

    /// Collection path that row ids link into
    pub fn linked(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn link(mut self, label: impl Into<String>, href: impl Into<String>) -> Self {
        self.links.push((label.into(), href.into()));
        self
    }

    fn render(&self) -> String {
        let mut body = html::render_value(&self.value, self.base.as_deref());
        body.push_str(&html::links(&self.links));
        body
    }
}

/// Paging metadata for list responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
}

impl PageMeta {
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.per_page.max(1))
    }
}

impl<T> From<&crate::domain::Page<T>> for PageMeta {
    fn from(page: &crate::domain::Page<T>) -> Self {
        Self {
            page: page.page,
            per_page: page.per_page,
            total: page.total,
        }
    }
}

/// What a successful handler did
#[derive(Debug)]
pub enum Outcome {
    Show(Representation),
    Page(Representation, PageMeta),
    Created {
        message: String,
        /// Key the created entity is nested under in the JSON body
        key: &'static str,
        location: String,
        body: Value,
    },
    Updated {
        message: String,
        location: String,
        body: Value,
    },
    Deleted {
        message: String,
        location: String,
    },
}

impl Outcome {
    pub fn created<T: Serialize>(
        message: impl Into<String>,
        key: &'static str,
        location: impl Into<String>,
        view: &T,
    ) -> Result<Self, ApiError> {
        Ok(Self::Created {
            message: message.into(),
            key,
            location: location.into(),
            body: to_value(view)?,
        })
    }

    pub fn updated<T: Serialize>(
        message: impl Into<String>,
        location: impl Into<String>,
        view: &T,
    ) -> Result<Self, ApiError> {
        Ok(Self::Updated {
            message: message.into(),
            location: location.into(),
            body: to_value(view)?,
        })
    }

    pub fn deleted(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self::Deleted {
            message: message.into(),
            location: location.into(),
        }
    }
}

fn to_value<T: Serialize>(view: &T) -> Result<Value, ApiError> {
    serde_json::to_value(view)
        .map_err(|e| ApiError::internal(format!("Failed to serialize response: {}", e)))
}

impl Negotiation {
    /// Render a handler result; failed HTML requests go back to `fallback`
    pub fn reply(self, result: Result<Outcome, ApiError>, fallback: &str) -> Response {
        match self.format {
            OutputFormat::Json => match result {
                Ok(outcome) => json_reply(outcome),
                Err(err) => err.into_response(),
            },
            OutputFormat::Html => match result {
                Ok(outcome) => self.html_reply(outcome),
                Err(err) => self.html_error(err, fallback),
            },
        }
    }

    fn html_reply(self, outcome: Outcome) -> Response {
        match outcome {
            Outcome::Show(repr) => self.page(StatusCode::OK, &repr.title, repr.render()),
            Outcome::Page(repr, meta) => {
                let mut body = repr.render();
                body.push_str(&html::pager(meta.page, meta.total_pages(), &self.path));
                self.page(StatusCode::OK, &repr.title, body)
            }
            Outcome::Created { message, location, .. }
            | Outcome::Updated { message, location, .. }
            | Outcome::Deleted { message, location } => redirect(&location, &Flash::notice(message)),
        }
    }

    fn html_error(self, err: ApiError, fallback: &str) -> Response {
        if let Some(fields) = &err.fields {
            let body = html::error_list(&fields.full_messages());
            return self.page(err.status, "Invalid submission", body);
        }

        if fallback == self.path {
            let body = format!("<p>{}</p>", html::escape(err.message()));
            return self.page(err.status, "Error", body);
        }

        redirect(fallback, &Flash::alert(err.message()))
    }

    /// Render a page, consuming any pending flash message
    fn page(self, status: StatusCode, title: &str, body: String) -> Response {
        let document = html::document(title, self.flash.as_ref(), &body);
        let mut response = (status, Html(document)).into_response();

        if self.flash.is_some() {
            if let Ok(value) = HeaderValue::from_str(&Flash::clear_cookie()) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }

        response
    }
}

fn json_reply(outcome: Outcome) -> Response {
    match outcome {
        Outcome::Show(repr) => Json(repr.value).into_response(),
        Outcome::Page(repr, meta) => {
            let mut response = Json(repr.value).into_response();
            let headers = response.headers_mut();

            for (name, value) in [
                ("x-total-count", meta.total),
                ("x-page", meta.page),
                ("x-per-page", meta.per_page),
            ] {
                headers.insert(HeaderName::from_static(name), HeaderValue::from(value));
            }

            response
        }
        Outcome::Created {
            message,
            key,
            location,
            body,
        } => {
            let mut payload = Map::new();
            payload.insert("message".to_string(), Value::String(message));
            payload.insert(key.to_string(), body);

            let mut response = (StatusCode::CREATED, Json(Value::Object(payload))).into_response();
            if let Ok(value) = HeaderValue::from_str(&location) {
                response.headers_mut().insert(LOCATION, value);
            }
            response
        }
        Outcome::Updated { body, .. } => Json(body).into_response(),
        Outcome::Deleted { .. } => StatusCode::NO_CONTENT.into_response(),
    }
}

/// 303 to `location`, storing the message for the next page
fn redirect(location: &str, flash: &Flash) -> Response {
    let mut response = StatusCode::SEE_OTHER.into_response();
    let headers = response.headers_mut();

    if let Ok(value) = HeaderValue::from_str(location) {
        headers.insert(LOCATION, value);
    }
    if let Ok(value) = HeaderValue::from_str(&flash.set_cookie()) {
        headers.append(SET_COOKIE, value);
    }
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationErrors;
    use axum::body::to_bytes;
    use serde_json::json;

    fn negotiation(format: OutputFormat, path: &str) -> Negotiation {
        Negotiation {
            format,
            flash: None,
            path: path.to_string(),
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
        response.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_resolve_format() {
        assert_eq!(OutputFormat::resolve(None, None), OutputFormat::Html);
        assert_eq!(
            OutputFormat::resolve(None, Some("application/json")),
            OutputFormat::Json
        );
        assert_eq!(
            OutputFormat::resolve(Some("JSON"), Some("text/html")),
            OutputFormat::Json
        );
        assert_eq!(
            OutputFormat::resolve(Some("html"), Some("application/json")),
            OutputFormat::Html
        );
        assert_eq!(
            OutputFormat::resolve(None, Some("text/html,application/xhtml+xml")),
            OutputFormat::Html
        );
    }

    async fn extract(uri: &str, accept: Option<&str>) -> Negotiation {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(accept) = accept {
            builder = builder.header(ACCEPT, accept);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();

        match Negotiation::from_request_parts(&mut parts, &()).await {
            Ok(negotiation) => negotiation,
            Err(never) => match never {},
        }
    }

    #[tokio::test]
    async fn test_extractor_decodes_format_parameter() {
        let negotiation = extract("/teams?page=2&format=%6Ason", Some("text/html")).await;
        assert_eq!(negotiation.format, OutputFormat::Json);
        assert_eq!(negotiation.path, "/teams");

        let negotiation = extract("/teams?format=%20html", Some("application/json")).await;
        assert_eq!(negotiation.format, OutputFormat::Html);

        let negotiation = extract("/teams?format=xml", Some("application/json")).await;
        assert_eq!(negotiation.format, OutputFormat::Json);
    }

    #[tokio::test]
    async fn test_json_created() {
        let outcome =
            Outcome::created("Team was successfully created.", "team", "/teams/1", &json!({"id": 1}))
                .unwrap();
        let response = negotiation(OutputFormat::Json, "/teams").reply(Ok(outcome), "/teams");

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(header(&response, "location"), Some("/teams/1"));
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["message"], "Team was successfully created.");
        assert_eq!(body["team"]["id"], 1);
    }

    #[tokio::test]
    async fn test_json_page_headers() {
        let repr = Representation::new("Teams", &json!([])).unwrap();
        let meta = PageMeta {
            page: 2,
            per_page: 8,
            total: 10,
        };
        let response =
            negotiation(OutputFormat::Json, "/teams").reply(Ok(Outcome::Page(repr, meta)), "/");

        assert_eq!(header(&response, "x-total-count"), Some("10"));
        assert_eq!(header(&response, "x-page"), Some("2"));
        assert_eq!(header(&response, "x-per-page"), Some("8"));
    }

    #[tokio::test]
    async fn test_json_deleted_is_no_content() {
        let response = negotiation(OutputFormat::Json, "/teams/1")
            .reply(Ok(Outcome::deleted("gone", "/teams")), "/teams");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_html_write_redirects_with_notice() {
        let outcome = Outcome::updated("Team was successfully updated.", "/teams/1", &json!({}))
            .unwrap();
        let response = negotiation(OutputFormat::Html, "/teams/1").reply(Ok(outcome), "/teams");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(header(&response, "location"), Some("/teams/1"));

        let cookie = header(&response, "set-cookie").unwrap();
        let value = cookie.split(';').next().unwrap().trim_start_matches("flash=");
        assert_eq!(
            Flash::decode(value),
            Some(Flash::notice("Team was successfully updated."))
        );
    }

    #[tokio::test]
    async fn test_html_validation_renders_messages() {
        let err = ApiError::validation(ValidationErrors::single("name", "can't be blank"));
        let response = negotiation(OutputFormat::Html, "/teams").reply(Err(err), "/teams");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(response).await.contains("name can&#39;t be blank"));
    }

    #[tokio::test]
    async fn test_html_error_redirects_to_fallback() {
        let response = negotiation(OutputFormat::Html, "/teams/9/edit")
            .reply(Err(ApiError::not_found("Team '9' not found")), "/teams");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(header(&response, "location"), Some("/teams"));
    }

    #[tokio::test]
    async fn test_html_error_on_fallback_renders_page() {
        let response = negotiation(OutputFormat::Html, "/teams")
            .reply(Err(ApiError::not_found("missing")), "/teams");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("<p>missing</p>"));
    }

    #[tokio::test]
    async fn test_page_consumes_flash() {
        let mut negotiation = negotiation(OutputFormat::Html, "/teams");
        negotiation.flash = Some(Flash::notice("Team was successfully destroyed."));
        let repr = Representation::new("Teams", &json!([])).unwrap();

        let response = negotiation.reply(Ok(Outcome::Show(repr)), "/");

        assert!(header(&response, "set-cookie").unwrap().contains("Max-Age=0"));
        assert!(body_text(response).await.contains("Team was successfully destroyed."));
    }
}
