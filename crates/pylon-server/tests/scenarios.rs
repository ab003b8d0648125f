//! End-to-end scenarios through the server, routing and the standard
//! pipeline.

use bytes::Bytes;
use http::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use pylon_bind::{FieldSpec, PrimitiveKind, RequestView, Rule, Shape};
use pylon_core::{Handler, Payload, PylonResult, Response};
use pylon_middleware::HandlerEndpoint;
use pylon_server::{Server, ServerConfig, ShutdownSignal};
use pylon_telemetry::CapturedLogs;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct NameBody {
    name: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct CreateArtist {
    body: NameBody,
}

impl RequestView for CreateArtist {
    fn shape() -> Shape {
        Shape::new("CreateArtist")
            .with_body()
            .field(FieldSpec::body("body.name").rule(Rule::Required))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct GetArtist {
    id: u32,
}

impl RequestView for GetArtist {
    fn shape() -> Shape {
        Shape::new("GetArtist").field(FieldSpec::path("id", PrimitiveKind::U32).rule(Rule::Required))
    }
}

#[derive(Debug, Serialize)]
struct ArtistId {
    id: u32,
}

#[derive(Default, Clone)]
struct Calls(Arc<AtomicUsize>);

impl Calls {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

struct Create(Calls);

impl Handler<CreateArtist, Payload<ArtistId>> for Create {
    async fn handle(&self, request: &CreateArtist) -> PylonResult<Payload<ArtistId>> {
        self.0 .0.fetch_add(1, Ordering::SeqCst);
        if request.body.name == "explode" {
            return Err(anyhow::anyhow!("replica lag exceeded on shard 3").into());
        }
        Ok(Payload::new(ArtistId { id: 7 }))
    }
}

struct Get(Calls);

impl Handler<GetArtist, Payload<ArtistId>> for Get {
    async fn handle(&self, request: &GetArtist) -> PylonResult<Payload<ArtistId>> {
        self.0 .0.fetch_add(1, Ordering::SeqCst);
        Ok(Payload::new(ArtistId { id: request.id }))
    }
}

fn server(calls: &Calls) -> Server {
    Server::builder()
        .config(ServerConfig::builder().http_addr("127.0.0.1:0").build())
        .route(Method::POST, "/artists", HandlerEndpoint::new(Create(calls.clone())))
        .route(Method::GET, "/artists/{id}", HandlerEndpoint::new(Get(calls.clone())))
        .build()
}

fn request(method: Method, uri: &str, body: &str) -> Request<Bytes> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Bytes::from(body.to_string()))
        .unwrap()
}

async fn read(response: Response) -> (StatusCode, http::HeaderMap, Bytes) {
    let (parts, body) = response.into_parts();
    (parts.status, parts.headers, body.collect().await.unwrap().to_bytes())
}

fn json_body(bytes: &Bytes) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn scenario_a_empty_required_field() {
    let calls = Calls::default();
    let response = server(&calls)
        .handle(request(Method::POST, "/artists", r#"{"name":""}"#), None)
        .await;
    let (status, _, body) = read(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(&body),
        json!({
            "message": "invalid parameters",
            "context": {"name": "name is a required field"}
        })
    );
    assert_eq!(calls.count(), 0);
}

#[tokio::test]
async fn scenario_b_non_numeric_path_parameter() {
    let calls = Calls::default();
    let response = server(&calls)
        .handle(request(Method::GET, "/artists/abc", ""), None)
        .await;
    let (status, _, body) = read(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["message"], "invalid parameters");
    assert_eq!(calls.count(), 0);
}

#[tokio::test]
async fn scenario_c_success_payload() {
    let calls = Calls::default();
    let response = server(&calls)
        .handle(request(Method::GET, "/artists/7", ""), None)
        .await;
    let (status, headers, body) = read(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], br#"{"id":7}"#);
    assert_eq!(headers[CONTENT_TYPE], "application/json");
    assert_eq!(calls.count(), 1);
}

#[tokio::test]
async fn scenario_d_unclassified_error_is_logged_not_leaked() {
    let logs = CapturedLogs::new();
    let _guard = tracing::subscriber::set_default(logs.json_subscriber());

    let calls = Calls::default();
    let response = server(&calls)
        .handle(
            request(Method::POST, "/artists", r#"{"name":"explode"}"#),
            Some("10.0.0.9:5123".parse().unwrap()),
        )
        .await;
    let (status, _, body) = read(response).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&body[..], br#"{"message":"internal error"}"#);

    let captured = logs.contents();
    assert!(captured.contains("replica lag exceeded on shard 3"));
    assert!(captured.contains("10.0.0.9:5123"));
    assert!(captured.contains("explode"));
    assert!(captured.contains("ERROR"));
    assert_eq!(calls.count(), 1);
}

#[tokio::test]
async fn scenario_e_preflight() {
    let calls = Calls::default();
    let response = server(&calls)
        .handle(request(Method::OPTIONS, "/artists/7", ""), None)
        .await;
    let (status, headers, body) = read(response).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(headers.contains_key(ACCESS_CONTROL_ALLOW_HEADERS));
    assert_eq!(calls.count(), 0);
}

#[tokio::test]
async fn test_french_validation_messages() {
    let calls = Calls::default();
    let mut req = request(Method::POST, "/artists", "{}");
    req.headers_mut()
        .insert(http::header::ACCEPT_LANGUAGE, "fr".parse().unwrap());
    let (status, _, body) = read(server(&calls).handle(req, None).await).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(&body),
        json!({
            "message": "paramètres invalides",
            "context": {"name": "name est un champ obligatoire"}
        })
    );
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let calls = Calls::default();
    let server = Server::builder()
        .config(ServerConfig::builder().max_body_bytes(16).build())
        .route(Method::POST, "/artists", HandlerEndpoint::new(Create(calls.clone())))
        .build();
    let body = format!(r#"{{"name":"{}"}}"#, "x".repeat(64));
    let (status, _, body) = read(server.handle(request(Method::POST, "/artists", &body), None).await).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body), json!({"message": "invalid parameters"}));
    assert_eq!(calls.count(), 0);
}

#[tokio::test]
async fn test_over_the_wire() {
    let calls = Calls::default();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let serving = tokio::spawn(server(&calls).serve(listener, shutdown.clone()));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let payload = r#"{"name":"Nina Simone"}"#;
    let raw = format!(
        "POST /artists HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.to_ascii_lowercase().contains("access-control-allow-origin: *"));
    assert!(response.ends_with(r#"{"id":7}"#));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .expect("server should stop")
        .expect("server task should not panic")
        .expect("server should exit cleanly");
}
