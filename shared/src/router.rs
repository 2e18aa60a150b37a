use intern_atoms::interns::{
    self, build_queries, CreateInternPayload, InternError, ListParams, UpdateInternPayload,
};
use intern_atoms::store::{DocumentStore, StoreError};
use intern_atoms::tasks::{self, ValidationError};
use lambda_http::http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::envelope::Envelope;

/// Transport-independent view of one HTTP request
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub method: Method,
    /// Path split on `/` with empty segments dropped
    pub segments: Vec<String>,
    pub params: ListParams,
    /// Always a JSON object; anything unreadable arrives as `{}`
    pub body: Value,
}

impl RouteRequest {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            segments: split_path(path),
            params: ListParams::default(),
            body: Value::Object(Default::default()),
        }
    }

    pub fn with_params(mut self, params: ListParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse {
    pub status: StatusCode,
    pub envelope: Envelope,
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Route not found")]
    RouteNotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error(transparent)]
    Intern(#[from] InternError),

    #[error("Failed to encode response: {0}")]
    Encode(String),
}

impl RouteError {
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::RouteNotFound => StatusCode::NOT_FOUND,
            RouteError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RouteError::Intern(InternError::Validation(_)) => StatusCode::BAD_REQUEST,
            RouteError::Intern(InternError::NotFound { .. }) => StatusCode::NOT_FOUND,
            RouteError::Intern(InternError::Store(error)) => match error {
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                StoreError::Conflict { .. } => StatusCode::CONFLICT,
                StoreError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                StoreError::InvalidQuery(_) | StoreError::Backend(_) => StatusCode::BAD_REQUEST,
            },
            RouteError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint<'a> {
    Collection,
    Count,
    Summary,
    Item(&'a str),
}

/// Literal paths are matched before the `{id}` wildcard, but only for GET:
/// `/interns/count` is still an id for PATCH and DELETE
fn resolve<'a>(method: &Method, segments: &'a [String]) -> Option<Endpoint<'a>> {
    let parts: Vec<&str> = segments.iter().map(String::as_str).collect();
    match parts.as_slice() {
        [] | ["interns"] => Some(Endpoint::Collection),
        ["interns", "count"] if *method == Method::GET => Some(Endpoint::Count),
        ["interns", "tasks", "summary"] => Some(Endpoint::Summary),
        ["interns", id] => Some(Endpoint::Item(*id)),
        _ => None,
    }
}

fn to_data<T: Serialize>(value: &T) -> Result<Value, RouteError> {
    serde_json::to_value(value).map_err(|e| RouteError::Encode(e.to_string()))
}

fn from_body<T: DeserializeOwned>(body: &Value) -> Result<T, RouteError> {
    serde_json::from_value(body.clone())
        .map_err(|e| InternError::from(ValidationError::Malformed(e.to_string())).into())
}

async fn dispatch(
    store: &dyn DocumentStore,
    request: &RouteRequest,
) -> Result<(StatusCode, Envelope), RouteError> {
    let endpoint =
        resolve(&request.method, &request.segments).ok_or(RouteError::RouteNotFound)?;

    match (endpoint, &request.method) {
        (Endpoint::Collection, &Method::GET) => {
            let queries = build_queries(&request.params);
            let page = interns::service::list_interns(store, &queries).await?;
            Ok((
                StatusCode::OK,
                Envelope::ok()
                    .with_data(to_data(&page.interns)?)
                    .with_total(page.total),
            ))
        }
        (Endpoint::Collection, &Method::POST) => {
            let payload: CreateInternPayload = from_body(&request.body)?;
            let intern = interns::service::create_intern(store, payload, None).await?;
            Ok((
                StatusCode::CREATED,
                Envelope::ok()
                    .with_data(to_data(&intern)?)
                    .with_message("Intern created successfully"),
            ))
        }
        (Endpoint::Count, &Method::GET) => {
            let count = interns::service::count_interns(store).await?;
            Ok((StatusCode::OK, Envelope::ok().with_count(count)))
        }
        (Endpoint::Summary, &Method::GET) => {
            let summary = tasks::summarize(store).await.map_err(InternError::from)?;
            Ok((StatusCode::OK, Envelope::ok().with_summary(summary)))
        }
        (Endpoint::Item(id), &Method::GET) => {
            let intern = interns::service::get_intern(store, id).await?;
            Ok((StatusCode::OK, Envelope::ok().with_data(to_data(&intern)?)))
        }
        (Endpoint::Item(id), &Method::PATCH) => {
            let patch: UpdateInternPayload = from_body(&request.body)?;
            let intern = interns::service::update_intern(store, id, patch).await?;
            Ok((
                StatusCode::OK,
                Envelope::ok()
                    .with_data(to_data(&intern)?)
                    .with_message("Intern updated successfully"),
            ))
        }
        (Endpoint::Item(id), &Method::DELETE) => {
            interns::service::delete_intern(store, id).await?;
            Ok((
                StatusCode::OK,
                Envelope::ok().with_message("Intern deleted successfully"),
            ))
        }
        _ => Err(RouteError::MethodNotAllowed),
    }
}

/// Map one request to exactly one operation and wrap the outcome
pub async fn route(store: &dyn DocumentStore, request: RouteRequest) -> RouteResponse {
    match dispatch(store, &request).await {
        Ok((status, envelope)) => RouteResponse { status, envelope },
        Err(error) => {
            let status = error.status();
            let path = request.segments.join("/");
            if status.is_server_error() {
                tracing::error!("{} /{} failed: {}", request.method, path, error);
            } else {
                tracing::warn!("{} /{} rejected: {}", request.method, path, error);
            }
            RouteResponse {
                status,
                envelope: Envelope::failure(error.to_string()),
            }
        }
    }
}
