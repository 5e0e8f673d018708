use super::*;
use crate::server::{app, config::ServerConfig, telemetry::ServiceMetrics};
use core::time::Duration;
use hashpool::{DigestAlg, PoolConfig};
use hashpool_tonic_core::{
    client::HashClient,
    proto::{HashRequest, hasher_service_server::HasherService},
    types::{REQUEST_ID_HEADER, RequestId},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tonic::{Code, Request, transport::Endpoint};
use tonic_health::pb::{
    HealthCheckRequest, health_check_response::ServingStatus, health_client::HealthClient,
};

fn config() -> ServerConfig {
    ServerConfig {
        pool: PoolConfig::default().with_workers(4),
        digest: DigestAlg::Sha3_256,
        max_allowed_strings: 1_000,
        request_timeout: None,
        shutdown_timeout: Duration::from_secs(3),
        server_addr: "127.0.0.1:0".to_string(),
    }
}

fn service(config: ServerConfig) -> HashService {
    HashService::new(config, ServiceMetrics::default())
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn expected(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|s| DigestAlg::Sha3_256.digest_hex(s))
        .collect()
}

fn request(values: Vec<String>) -> Request<HashRequest> {
    Request::new(HashRequest { strings: values })
}

async fn wait_until_idle(svc: &HashService) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while svc.inflight() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("requests did not drain");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn hashes_in_input_order() {
    let svc = service(config());
    let input = strings(&["a", "b", "a", "world"]);

    let response = svc.calculate_hashes(request(input.clone())).await.unwrap();
    let hashes = response.into_inner().hashes;

    assert_eq!(hashes, expected(&input));
    assert_eq!(hashes[0], hashes[2]);
    assert_eq!(svc.inflight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn empty_request_yields_empty_response() {
    let svc = service(config());
    let response = svc.calculate_hashes(request(Vec::new())).await.unwrap();
    assert!(response.into_inner().hashes.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn honours_configured_digest() {
    let svc = service(ServerConfig {
        digest: DigestAlg::Sha256,
        ..config()
    });
    let response = svc
        .calculate_hashes(request(strings(&["abc"])))
        .await
        .unwrap();
    assert_eq!(
        response.into_inner().hashes,
        vec!["ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad".to_string()]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rejects_oversized_requests() {
    let svc = service(ServerConfig {
        max_allowed_strings: 2,
        ..config()
    });

    let ok = svc.calculate_hashes(request(strings(&["a", "b"]))).await;
    assert!(ok.is_ok());

    let status = svc
        .calculate_hashes(request(strings(&["a", "b", "c"])))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(status.message().contains("maximum allowed (2)"));
    assert_eq!(svc.inflight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn echoes_request_id() {
    let svc = service(config());

    let mut req = request(strings(&["x"]));
    req.extensions_mut().insert(RequestId::parse("req-123").unwrap());
    let response = svc.calculate_hashes(req).await.unwrap();
    let echoed = response.metadata().get(REQUEST_ID_HEADER).unwrap();
    assert_eq!(echoed.to_str().unwrap(), "req-123");

    let mut req = request(strings(&["a", "b", "c"]));
    req.extensions_mut().insert(RequestId::parse("req-456").unwrap());
    let svc = service(ServerConfig {
        max_allowed_strings: 1,
        ..config()
    });
    let status = svc.calculate_hashes(req).await.unwrap_err();
    let echoed = status.metadata().get(REQUEST_ID_HEADER).unwrap();
    assert_eq!(echoed.to_str().unwrap(), "req-456");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn refuses_requests_after_shutdown() {
    let svc = service(config());
    svc.shutdown().await;

    assert!(svc.is_shutting_down());
    let status = svc
        .calculate_hashes(request(strings(&["a"])))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unavailable);
    assert_eq!(svc.inflight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shutdown_lets_short_requests_finish() {
    let svc = service(config());
    let input: Vec<String> = (0..1_000).map(|i| i.to_string()).collect();

    let worker = svc.clone();
    let call = tokio::spawn({
        let input = input.clone();
        async move { worker.calculate_hashes(request(input)).await }
    });

    while svc.inflight() == 0 && !call.is_finished() {
        tokio::task::yield_now().await;
    }
    svc.shutdown().await;

    let hashes = call.await.unwrap().unwrap().into_inner().hashes;
    assert_eq!(hashes, expected(&input));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shutdown_cancels_requests_that_do_not_drain() {
    let svc = service(ServerConfig {
        pool: PoolConfig::default()
            .with_workers(1)
            .with_work_queue_capacity(1)
            .with_result_queue_capacity(1),
        max_allowed_strings: 2_000_000,
        shutdown_timeout: Duration::ZERO,
        ..config()
    });
    let input = vec!["x".to_string(); 2_000_000];

    let worker = svc.clone();
    let call = tokio::spawn(async move { worker.calculate_hashes(request(input)).await });

    while svc.inflight() == 0 {
        tokio::task::yield_now().await;
    }
    svc.shutdown().await;

    let status = call.await.unwrap().unwrap_err();
    assert_eq!(status.code(), Code::Unavailable);
    wait_until_idle(&svc).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn request_timeout_cancels_hashing() {
    let svc = service(ServerConfig {
        pool: PoolConfig::default().with_workers(1),
        max_allowed_strings: 2_000_000,
        request_timeout: Some(Duration::from_millis(1)),
        ..config()
    });
    let input = vec!["y".to_string(); 2_000_000];

    let status = svc.calculate_hashes(request(input)).await.unwrap_err();
    assert_eq!(status.code(), Code::Cancelled);
    assert!(!svc.is_shutting_down());
    assert_eq!(svc.inflight(), 0);

    // The service itself is unaffected.
    let ok = svc.calculate_hashes(request(strings(&["a"]))).await;
    assert!(ok.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn dropped_call_releases_inflight_slot() {
    let svc = service(ServerConfig {
        pool: PoolConfig::default().with_workers(1),
        max_allowed_strings: 2_000_000,
        ..config()
    });
    let input = vec!["z".to_string(); 2_000_000];

    let worker = svc.clone();
    let call = tokio::spawn(async move { worker.calculate_hashes(request(input)).await });
    while svc.inflight() == 0 {
        tokio::task::yield_now().await;
    }
    call.abort();

    wait_until_idle(&svc).await;
}

/// Serves `svc` on a loopback port until the returned token is cancelled.
async fn spawn_server(
    svc: HashService,
) -> (String, CancellationToken, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stop = CancellationToken::new();

    let handle = tokio::spawn({
        let stop = stop.clone();
        async move {
            app::serve(listener, svc, async move { stop.cancelled().await })
                .await
                .unwrap();
        }
    });

    (format!("http://{addr}"), stop, handle)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn serve_reports_health_and_shuts_down_on_trigger() {
    let svc = service(config());
    let (uri, stop, handle) = spawn_server(svc.clone()).await;

    let channel = Endpoint::from_shared(uri.clone())
        .unwrap()
        .connect()
        .await
        .unwrap();
    let mut health = HealthClient::new(channel);
    let status = health
        .check(HealthCheckRequest {
            service: "hasher.HasherService".to_string(),
        })
        .await
        .unwrap()
        .into_inner()
        .status;
    assert_eq!(status, ServingStatus::Serving as i32);

    let mut client = HashClient::connect(uri.clone()).await.unwrap();
    let reply = client.calculate(strings(&["a"]), None, None).await.unwrap();
    assert_eq!(reply.hashes, expected(&strings(&["a"])));
    drop((client, health));

    stop.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();

    // The trigger ran the service's own drain before the listener closed.
    assert!(svc.is_shutting_down());
    assert_eq!(svc.inflight(), 0);
    assert!(HashClient::connect(uri).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn end_to_end_over_loopback() {
    let svc = service(config());
    let (uri, stop, handle) = spawn_server(svc.clone()).await;

    let mut client = HashClient::connect(uri.clone()).await.unwrap();

    let input = strings(&["hello", "世界", "", "hello"]);
    let reply = client
        .calculate(
            input.clone(),
            RequestId::parse("e2e-1"),
            Some(Duration::from_secs(5)),
        )
        .await
        .unwrap();
    assert_eq!(reply.hashes, expected(&input));
    assert_eq!(reply.request_id, RequestId::parse("e2e-1"));

    // Without an explicit ID the client generates one and the server echoes it.
    let reply = client.calculate(strings(&["a"]), None, None).await.unwrap();
    assert!(reply.request_id.is_some());

    let too_many: Vec<String> = (0..1_001).map(|i| i.to_string()).collect();
    let status = client.calculate(too_many, None, None).await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    let mut zstd = HashClient::connect(uri)
        .await
        .unwrap()
        .with_compression(tonic::codec::CompressionEncoding::Zstd);
    let input: Vec<String> = (0..1_000).map(|i| format!("item-{i}")).collect();
    let reply = zstd.calculate(input.clone(), None, None).await.unwrap();
    assert_eq!(reply.hashes, expected(&input));

    stop.cancel();
    handle.await.unwrap();
    assert_eq!(svc.inflight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn client_deadline_cancels_server_work() {
    let svc = service(ServerConfig {
        pool: PoolConfig::default().with_workers(1),
        max_allowed_strings: 200_000,
        ..config()
    });
    let (uri, stop, handle) = spawn_server(svc.clone()).await;

    let mut client = HashClient::connect(uri).await.unwrap();
    let input: Vec<String> = (0..200_000).map(|i| format!("s{i}")).collect();
    let status = client
        .calculate(input, None, Some(Duration::from_millis(1)))
        .await
        .unwrap_err();
    assert!(
        matches!(status.code(), Code::Cancelled | Code::DeadlineExceeded),
        "unexpected status: {status:?}"
    );

    wait_until_idle(&svc).await;

    stop.cancel();
    handle.await.unwrap();
}
