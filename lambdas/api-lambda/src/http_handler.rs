use futures::FutureExt;
use intern_atoms::interns::ListParams;
use intern_shared::{route, AppState, Envelope, RouteRequest};
use lambda_http::{
    http::{header::HeaderValue, Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

fn with_cors_headers(mut resp: Response<Body>) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, PATCH, DELETE, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    resp
}

fn json_response(status: StatusCode, envelope: &Envelope) -> Result<Response<Body>, Error> {
    let resp = Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(envelope)?.into())
        .map_err(Box::new)?;
    Ok(with_cors_headers(resp))
}

/// Anything that is not a JSON object reads as `{}`
fn parse_body(body: &Body) -> Value {
    let parsed = match body {
        Body::Text(text) => serde_json::from_str::<Value>(text).ok(),
        Body::Binary(bytes) => serde_json::from_slice::<Value>(bytes).ok(),
        Body::Empty => None,
    };

    match parsed {
        Some(object @ Value::Object(_)) => object,
        _ => Value::Object(Default::default()),
    }
}

fn list_params(event: &Request) -> ListParams {
    let query = event.query_string_parameters_ref();
    let get = |key: &str| query.and_then(|params| params.first(key)).map(str::to_string);

    ListParams {
        batch: get("batch"),
        search: get("search"),
        limit: get("limit"),
        offset: get("offset"),
        sort: get("sort"),
        order: get("order"),
    }
}

/// Main Lambda handler - every path goes through the intern router
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method().clone();
    let path = event.uri().path().to_string();
    tracing::info!("{} {}", method, path);

    // CORS preflight
    if method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp));
    }

    let request = RouteRequest::new(method, &path)
        .with_params(list_params(&event))
        .with_body(parse_body(event.body()));

    match AssertUnwindSafe(route(state.store.as_ref(), request))
        .catch_unwind()
        .await
    {
        Ok(routed) => json_response(routed.status, &routed.envelope),
        Err(_) => {
            tracing::error!("Unhandled panic while serving {} {}", event.method(), path);
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &Envelope::failure("Internal server error"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use intern_atoms::store::{
        Document, DocumentList, DocumentStore, Fields, MemoryDocumentStore, Query, StoreError,
    };
    use rstest::rstest;
    use serde_json::json;
    use std::collections::HashMap;

    fn state_with(store: Arc<dyn DocumentStore>) -> Arc<AppState> {
        Arc::new(AppState::with_store(store))
    }

    fn request(method: Method, path: &str, body: Body) -> Request {
        lambda_http::http::Request::builder()
            .method(method)
            .uri(path)
            .body(body)
            .unwrap()
    }

    fn json_body(resp: &Response<Body>) -> Value {
        match resp.body() {
            Body::Text(text) => serde_json::from_str(text).unwrap(),
            Body::Binary(bytes) => serde_json::from_slice(bytes).unwrap(),
            Body::Empty => Value::Null,
        }
    }

    fn assert_cors(resp: &Response<Body>) {
        let headers = resp.headers();
        assert_eq!(headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(
            headers["Access-Control-Allow-Methods"],
            "GET, POST, PATCH, DELETE, OPTIONS"
        );
        assert_eq!(
            headers["Access-Control-Allow-Headers"],
            "Content-Type, Authorization"
        );
    }

    struct PanickingStore;

    #[async_trait]
    impl DocumentStore for PanickingStore {
        async fn list_documents(&self, _queries: &[Query]) -> Result<DocumentList, StoreError> {
            panic!("store exploded")
        }

        async fn get_document(&self, _id: &str) -> Result<Document, StoreError> {
            panic!("store exploded")
        }

        async fn create_document(
            &self,
            _id: &str,
            _fields: Fields,
        ) -> Result<Document, StoreError> {
            panic!("store exploded")
        }

        async fn update_document(
            &self,
            _id: &str,
            _fields: Fields,
        ) -> Result<Document, StoreError> {
            panic!("store exploded")
        }

        async fn delete_document(&self, _id: &str) -> Result<(), StoreError> {
            panic!("store exploded")
        }
    }

    #[rstest]
    #[case("/interns")]
    #[case("/interns/abc")]
    #[case("/anything/at/all")]
    #[tokio::test]
    async fn preflight_is_answered_without_the_store(#[case] path: &str) {
        let store = MemoryDocumentStore::new();
        let state = state_with(Arc::new(store.clone()));

        let resp = function_handler(request(Method::OPTIONS, path, Body::Empty), state)
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(matches!(resp.body(), Body::Empty));
        assert_cors(&resp);
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn create_and_list_through_lambda_events() {
        let state = state_with(Arc::new(MemoryDocumentStore::new()));

        let body = json!({"documentId": "X", "internName": "Asha", "batch": "2025-Summer"});
        let created = function_handler(
            request(Method::POST, "/interns", Body::from(body.to_string())),
            state.clone(),
        )
        .await
        .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        assert_eq!(created.headers()["Content-Type"], "application/json");
        assert_cors(&created);

        let mut params = HashMap::new();
        params.insert("batch".to_string(), "2025-Summer".to_string());
        params.insert("limit".to_string(), "5".to_string());
        let listed = function_handler(
            request(Method::GET, "/interns", Body::Empty).with_query_string_parameters(params),
            state,
        )
        .await
        .unwrap();

        let listed = json_body(&listed);
        assert_eq!(listed["success"], true);
        assert_eq!(listed["total"], 1);
        assert_eq!(listed["data"][0]["$id"], "X");
    }

    #[rstest]
    #[case(Body::Empty)]
    #[case(Body::from("{not json"))]
    #[case(Body::from("[1, 2, 3]"))]
    #[case(Body::Binary(vec![0xff, 0xfe, 0x00]))]
    #[tokio::test]
    async fn unreadable_bodies_become_empty_objects(#[case] body: Body) {
        let state = state_with(Arc::new(MemoryDocumentStore::new()));

        let resp = function_handler(request(Method::POST, "/interns", body), state)
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(&resp),
            json!({"success": false, "error": "Intern name is required"})
        );
    }

    #[tokio::test]
    async fn unknown_route_is_404_with_cors() {
        let store = MemoryDocumentStore::new();
        let state = state_with(Arc::new(store.clone()));

        let resp = function_handler(request(Method::GET, "/unknown", Body::Empty), state)
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_cors(&resp);
        assert_eq!(
            json_body(&resp),
            json!({"success": false, "error": "Route not found"})
        );
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn panics_become_a_generic_500() {
        let state = state_with(Arc::new(PanickingStore));

        let resp = function_handler(request(Method::GET, "/interns/count", Body::Empty), state)
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&resp);
        assert_eq!(
            json_body(&resp),
            json!({"success": false, "error": "Internal server error"})
        );
    }

    #[test]
    fn only_objects_survive_body_parsing() {
        assert_eq!(parse_body(&Body::from(r#"{"a": 1}"#)), json!({"a": 1}));
        assert_eq!(parse_body(&Body::from("\"text\"")), json!({}));
        assert_eq!(parse_body(&Body::from("")), json!({}));
    }
}
