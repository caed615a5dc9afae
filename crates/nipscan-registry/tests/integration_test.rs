use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use nipscan_core::{Nip, RegistryConfig};
use nipscan_registry::{
    load_endpoints, LookupError, ProxyEndpoint, ProxyPool, RegistryClient, RegistryLookup,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const FOUND_BODY: &str = r#"{
    "result": {
        "subject": {
            "name": "ACME SP. Z O.O.",
            "nip": "5260001246",
            "statusVat": "Czynny",
            "regon": "012345678",
            "workingAddress": "UL. PROSTA 1, 00-001 WARSZAWA",
            "accountNumbers": ["11111111111111111111111111"]
        },
        "requestId": "req-1"
    }
}"#;

const MISSING_BODY: &str = r#"{"result":{"subject":null,"requestId":"req-2"}}"#;

/// Serve `app` on an ephemeral local port and return its base URL.
async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock");
    });
    format!("http://{addr}")
}

/// Mock registry: 5260001246 is registered, 1234563218 answers 503 and
/// every other identifier has no subject.
fn registry_app(hits: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route(
            "/api/search/nip/:nip",
            get(
                |State(hits): State<Arc<AtomicUsize>>,
                 Path(nip): Path<String>,
                 Query(params): Query<HashMap<String, String>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    if !params.contains_key("date") {
                        return (StatusCode::BAD_REQUEST, "missing date".to_string());
                    }
                    match nip.as_str() {
                        "5260001246" => (StatusCode::OK, FOUND_BODY.to_string()),
                        "1234563218" => (StatusCode::SERVICE_UNAVAILABLE, "busy".to_string()),
                        _ => (StatusCode::OK, MISSING_BODY.to_string()),
                    }
                },
            ),
        )
        .with_state(hits)
}

fn client_for(base_url: &str, timeout_secs: u64) -> RegistryClient {
    RegistryClient::new(&RegistryConfig {
        base_url: base_url.to_string(),
        timeout_secs,
        ..RegistryConfig::default()
    })
    .expect("create registry client")
}

fn nip(s: &str) -> Nip {
    Nip::parse(s).expect("valid NIP")
}

#[tokio::test]
async fn test_lookup_maps_registered_entity() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = spawn_server(registry_app(hits.clone())).await;
    let client = client_for(&base, 5);

    let result = client
        .lookup(&nip("5260001246"), None)
        .await
        .expect("entity found");

    assert_eq!(result.nip, "5260001246");
    assert_eq!(result.name, "ACME SP. Z O.O.");
    assert_eq!(result.regon.as_deref(), Some("012345678"));
    assert_eq!(result.accounts.len(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1, "exactly one request per lookup");
}

#[tokio::test]
async fn test_lookup_without_subject_is_not_found() {
    let base = spawn_server(registry_app(Arc::new(AtomicUsize::new(0)))).await;
    let client = client_for(&base, 5);

    let err = client
        .lookup(&nip("0000000000"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, LookupError::NotFound { .. }));
    assert!(err.is_expected());
}

#[tokio::test]
async fn test_non_success_status_is_transport_error() {
    let base = spawn_server(registry_app(Arc::new(AtomicUsize::new(0)))).await;
    let client = client_for(&base, 5);

    let err = client
        .lookup(&nip("1234563218"), None)
        .await
        .unwrap_err();

    assert!(
        matches!(err, LookupError::Transport { status: Some(503), .. }),
        "unexpected {err:?}"
    );
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let app = Router::new().route(
        "/api/search/nip/:nip",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            MISSING_BODY
        }),
    );
    let base = spawn_server(app).await;
    let client = client_for(&base, 1);

    let err = client
        .lookup(&nip("5260001246"), None)
        .await
        .unwrap_err();

    assert!(
        matches!(err, LookupError::Transport { status: None, .. }),
        "unexpected {err:?}"
    );
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let client = client_for(&format!("http://{addr}"), 2);
    let err = client
        .lookup(&nip("5260001246"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, LookupError::Transport { .. }));
}

#[tokio::test]
async fn test_lookup_through_egress_handle() {
    // The mock registry doubles as an HTTP proxy: proxied requests arrive in
    // absolute form and are routed on their path.
    let hits = Arc::new(AtomicUsize::new(0));
    let proxy_base = spawn_server(registry_app(hits.clone())).await;
    let proxy_addr = proxy_base.trim_start_matches("http://");

    let pool = ProxyPool::new(
        vec![ProxyEndpoint::parse(proxy_addr).expect("endpoint")],
        Duration::from_secs(5),
        "nipscan-test",
    );
    let handle = pool.select_for_attempt(0).expect("egress handle");

    let client = client_for("http://registry.invalid", 5);
    let result = client
        .lookup(&nip("5260001246"), Some(&handle))
        .await
        .expect("found through proxy");

    assert_eq!(result.name, "ACME SP. Z O.O.");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_check_validates_then_looks_up() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = spawn_server(registry_app(hits.clone())).await;
    let client = client_for(&base, 5);

    let result = client.check("526-000-12-46").await.expect("found");
    assert_eq!(result.nip, "5260001246");

    let err = client.check("526-000-12-47").await.unwrap_err();
    assert!(matches!(err, LookupError::InvalidCandidate(_)));
    assert_eq!(hits.load(Ordering::SeqCst), 1, "invalid input never hits the network");
}

#[tokio::test]
async fn test_load_endpoints_from_source() {
    let app = Router::new().route(
        "/http.txt",
        get(|| async { "# list\n10.0.0.1:8080\n\ngarbage\nproxy.example.com:3128\n" }),
    );
    let base = spawn_server(app).await;

    let endpoints = load_endpoints(&format!("{base}/http.txt"), Duration::from_secs(5)).await;
    let rendered: Vec<String> = endpoints.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["10.0.0.1:8080", "proxy.example.com:3128"]);
}

#[tokio::test]
async fn test_proxy_list_non_success_yields_empty_pool() {
    let app = Router::new().route(
        "/http.txt",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "10.0.0.1:8080\n") }),
    );
    let base = spawn_server(app).await;

    let pool = ProxyPool::from_source(
        &format!("{base}/http.txt"),
        Duration::from_secs(5),
        Duration::from_secs(5),
        "nipscan-test",
    )
    .await;

    assert!(pool.is_empty());
    assert!(pool.select_for_attempt(0).is_none());
}

#[tokio::test]
async fn test_proxy_list_unreachable_yields_empty_list() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let endpoints = load_endpoints(&format!("http://{addr}/http.txt"), Duration::from_secs(2)).await;
    assert!(endpoints.is_empty());
}
