//! End-to-end tests for the standard pipeline.

use bytes::Bytes;
use http::header::{ACCEPT_LANGUAGE, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use pylon_bind::{FieldSpec, PrimitiveKind, RequestView, Rule, Shape};
use pylon_core::{
    Empty, ErrorKind, Handler, Params, Payload, PylonError, PylonResult, RequestContext, Response,
};
use pylon_middleware::{Endpoint, HandlerEndpoint, NotFoundEndpoint, Pipeline, PipelineConfig};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct CreateArtistBody {
    name: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct CreateArtist {
    body: CreateArtistBody,
}

impl RequestView for CreateArtist {
    fn shape() -> Shape {
        Shape::new("CreateArtist").with_body().field(
            FieldSpec::body("body.name")
                .rule(Rule::Required)
                .rule(Rule::MaxLength(255)),
        )
    }
}

#[derive(Debug, Serialize)]
struct Created {
    id: u32,
}

struct CreateHandler;

impl Handler<CreateArtist, Payload<Created>> for CreateHandler {
    async fn handle(&self, request: &CreateArtist) -> PylonResult<Payload<Created>> {
        match request.body.name.as_str() {
            "boom" => Err(PylonError::from(anyhow::anyhow!("pool exhausted"))),
            "taken" => Err(PylonError::new(ErrorKind::UserAlreadyExists)),
            _ => Ok(Payload::new(Created { id: 1 }).with_status(StatusCode::CREATED)),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ArtistId {
    id: u32,
}

impl RequestView for ArtistId {
    fn shape() -> Shape {
        Shape::new("ArtistId").field(FieldSpec::path("id", PrimitiveKind::U32).rule(Rule::Required))
    }
}

struct GetHandler;

impl Handler<ArtistId, Payload<Value>> for GetHandler {
    async fn handle(&self, request: &ArtistId) -> PylonResult<Payload<Value>> {
        if request.id == 1 {
            Ok(Payload::new(json!({"id": 1, "name": "Nina Simone"})))
        } else {
            Err(PylonError::new(ErrorKind::NotFound))
        }
    }
}

struct DeleteHandler;

impl Handler<ArtistId, Empty> for DeleteHandler {
    async fn handle(&self, _request: &ArtistId) -> PylonResult<Empty> {
        Ok(Empty::default())
    }
}

fn pipeline() -> Pipeline {
    Pipeline::standard(&PipelineConfig::default())
}

fn request(method: Method, uri: &str, body: &str, lang: Option<&'static str>) -> RequestContext {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(lang) = lang {
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(lang));
    }
    RequestContext::new(method, uri.parse().unwrap())
        .with_headers(headers)
        .with_body(Bytes::from(body.to_string()))
}

fn with_id(ctx: RequestContext, id: &str) -> RequestContext {
    let params: Params = [("id", id)].into_iter().collect();
    ctx.with_path_params(params)
}

async fn send(ctx: &mut RequestContext, endpoint: &dyn Endpoint) -> (StatusCode, HeaderMap, Bytes) {
    let response: Response = pipeline().process(ctx, endpoint).await;
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    (parts.status, parts.headers, bytes)
}

fn as_json(bytes: &Bytes) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn test_create_success() {
    let endpoint = HandlerEndpoint::new(CreateHandler);
    let mut ctx = request(Method::POST, "/artists", r#"{"name":"Nina Simone"}"#, None);
    let (status, headers, body) = send(&mut ctx, &endpoint).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(headers[CONTENT_TYPE], "application/json");
    assert_eq!(as_json(&body), json!({"id": 1}));
    assert!(ctx.error().is_none());
}

#[tokio::test]
async fn test_validation_error_has_context() {
    let endpoint = HandlerEndpoint::new(CreateHandler);
    let mut ctx = request(Method::POST, "/artists", r#"{"name":""}"#, None);
    let (status, _, body) = send(&mut ctx, &endpoint).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        as_json(&body),
        json!({
            "message": "invalid parameters",
            "context": {"name": "name is a required field"}
        })
    );
}

#[tokio::test]
async fn test_validation_error_in_french() {
    let endpoint = HandlerEndpoint::new(CreateHandler);
    let mut ctx = request(Method::POST, "/artists", "{}", Some("fr-FR,fr;q=0.9,en;q=0.5"));
    let (status, _, body) = send(&mut ctx, &endpoint).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        as_json(&body),
        json!({
            "message": "paramètres invalides",
            "context": {"name": "name est un champ obligatoire"}
        })
    );
}

#[tokio::test]
async fn test_malformed_body_has_no_context() {
    let endpoint = HandlerEndpoint::new(CreateHandler);
    let mut ctx = request(Method::POST, "/artists", "{not json", None);
    let (status, _, body) = send(&mut ctx, &endpoint).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_json(&body), json!({"message": "invalid parameters"}));
}

#[tokio::test]
async fn test_classified_handler_error() {
    let endpoint = HandlerEndpoint::new(CreateHandler);
    let mut ctx = request(Method::POST, "/artists", r#"{"name":"taken"}"#, Some("fr"));
    let (status, _, body) = send(&mut ctx, &endpoint).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_json(&body), json!({"message": "l'utilisateur existe déjà"}));
}

#[tokio::test]
async fn test_unclassified_error_is_opaque() {
    let endpoint = HandlerEndpoint::new(CreateHandler);
    let mut ctx = request(Method::POST, "/artists", r#"{"name":"boom"}"#, None);
    let (status, _, body) = send(&mut ctx, &endpoint).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(as_json(&body), json!({"message": "internal error"}));
    assert!(!String::from_utf8_lossy(&body).contains("pool exhausted"));
}

#[tokio::test]
async fn test_not_found_kind_answers_400() {
    let endpoint = HandlerEndpoint::new(GetHandler);
    let mut ctx = with_id(request(Method::GET, "/artists/2", "", None), "2");
    let (status, _, body) = send(&mut ctx, &endpoint).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_json(&body), json!({"message": "not found"}));
}

#[tokio::test]
async fn test_path_parameter_bound() {
    let endpoint = HandlerEndpoint::new(GetHandler);
    let mut ctx = with_id(request(Method::GET, "/artists/1", "", None), "1");
    let (status, _, body) = send(&mut ctx, &endpoint).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({"id": 1, "name": "Nina Simone"}));
}

#[tokio::test]
async fn test_bare_view_has_empty_body() {
    let endpoint = HandlerEndpoint::new(DeleteHandler);
    let mut ctx = with_id(request(Method::DELETE, "/artists/1", "", None), "1");
    let (status, headers, body) = send(&mut ctx, &endpoint).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert!(headers.get(CONTENT_TYPE).is_none());
}

#[tokio::test]
async fn test_preflight_skips_handler() {
    let endpoint = HandlerEndpoint::new(CreateHandler);
    let mut ctx = request(Method::OPTIONS, "/artists", "", None);
    let (status, headers, body) = send(&mut ctx, &endpoint).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(!ctx.has_request_view());
}

#[tokio::test]
async fn test_route_fallback() {
    let mut ctx = request(Method::GET, "/nowhere", "", Some("fr"));
    let (status, headers, body) = send(&mut ctx, &NotFoundEndpoint).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(as_json(&body), json!({"message": "route introuvable"}));
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_cors_on_error_responses() {
    let endpoint = HandlerEndpoint::new(CreateHandler);
    let mut ctx = request(Method::POST, "/artists", r#"{"name":"boom"}"#, None);
    let (_, headers, _) = send(&mut ctx, &endpoint).await;
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_aborted_request_answers_bare_400() {
    let endpoint = HandlerEndpoint::new(CreateHandler);
    let mut ctx = request(Method::POST, "/artists", r#"{"name":"Nina Simone"}"#, None);
    ctx.abort_handle().abort();
    let (status, _, body) = send(&mut ctx, &endpoint).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.is_empty());
}
