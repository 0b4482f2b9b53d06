/// End-to-end tests for the trigger flow
///
/// These exercise the whole orchestrator against a real (temporary) libsql
/// database and a local TCP stand-in for the regional execution tier.
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use libsql::params;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::config::Checker as CheckerConfig;
use crate::database::{Database, DatabaseImpl};
use crate::models::{Limits, Plan, Workspace};
use crate::pool::{LibsqlManager, LibsqlPool};
use crate::trigger::{CheckerClient, TriggerError, TriggerService};

/// Helper to create a migrated test database pool
async fn create_test_database() -> Result<LibsqlPool> {
    let temp_dir = tempfile::tempdir()?;
    let db_path = temp_dir.path().join("test.db");

    let db = libsql::Builder::new_local(db_path.to_str().unwrap()).build().await?;
    let manager = LibsqlManager::new(db);
    let pool: LibsqlPool = deadpool::managed::Pool::builder(manager)
        .config(deadpool::managed::PoolConfig::default())
        .build()?;

    let conn = pool.get().await?;
    crate::database::initialize_database(&conn).await?;

    // Keep the directory for the test process lifetime; the pool opens
    // connections lazily from the path.
    std::mem::forget(temp_dir);

    Ok(pool)
}

async fn seed_workspace(pool: &LibsqlPool, slug: &str) -> Workspace {
    let conn = pool.get().await.unwrap();
    conn.execute(
        "INSERT INTO workspaces (slug, api_key, plan, created_at) VALUES (?, ?, 'free', 0)",
        params![slug, format!("key-{slug}")],
    )
    .await
    .unwrap();

    Workspace { id: conn.last_insert_rowid(), slug: slug.to_string(), plan: Plan::Free }
}

async fn seed_monitor(
    pool: &LibsqlPool,
    workspace_id: i64,
    job_type: &str,
    url: &str,
    regions: &str,
) -> i64 {
    let conn = pool.get().await.unwrap();
    conn.execute(
        "INSERT INTO monitors (workspace_id, name, job_type, url, regions, timeout, created_at, updated_at) VALUES (?, 'seeded', ?, ?, ?, 30000, 0, 0)",
        params![workspace_id, job_type, url, regions],
    )
    .await
    .unwrap();
    conn.last_insert_rowid()
}

async fn soft_delete_monitor(pool: &LibsqlPool, monitor_id: i64) {
    let conn = pool.get().await.unwrap();
    conn.execute("UPDATE monitors SET deleted_at = 1 WHERE id = ?", params![monitor_id])
        .await
        .unwrap();
}

async fn seed_status(pool: &LibsqlPool, monitor_id: i64, region: &str, status: &str) {
    let conn = pool.get().await.unwrap();
    conn.execute(
        "INSERT INTO monitor_status (monitor_id, region, status, updated_at) VALUES (?, ?, ?, 0)",
        params![monitor_id, region, status],
    )
    .await
    .unwrap();
}

async fn seed_run_at(pool: &LibsqlPool, workspace_id: i64, monitor_id: i64, at: DateTime<Utc>) {
    let conn = pool.get().await.unwrap();
    conn.execute(
        "INSERT INTO monitor_runs (monitor_id, workspace_id, runned_at, created_at) VALUES (?, ?, ?, ?)",
        params![monitor_id, workspace_id, at.timestamp(), at.timestamp()],
    )
    .await
    .unwrap();
}

async fn run_count(database: &DatabaseImpl, workspace_id: i64) -> i64 {
    database.count_runs_since(workspace_id, DateTime::<Utc>::MIN_UTC).await.unwrap()
}

/// Read one full HTTP request off the socket and answer with `status`.
async fn handle_conn(mut socket: TcpStream, requests: Arc<Mutex<Vec<String>>>, status: u16) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers arrived");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|window| window == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let body_len = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + body_len {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before body arrived");
        buf.extend_from_slice(&chunk[..n]);
    }

    requests.lock().await.push(String::from_utf8_lossy(&buf).to_string());

    let response = format!("HTTP/1.1 {status} X\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
    socket.write_all(response.as_bytes()).await.unwrap();
    socket.shutdown().await.ok();
}

/// Checker stand-in answering request N with `statuses[N]` (the last entry
/// repeats) and recording every request it saw.
async fn spawn_checker(statuses: Vec<u16>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let requests = Arc::new(Mutex::new(Vec::new()));

    let seen = requests.clone();
    tokio::spawn(async move {
        let served = AtomicUsize::new(0);
        loop {
            let Ok((socket, _)) = listener.accept().await else { break };
            let index = served.fetch_add(1, Ordering::SeqCst).min(statuses.len() - 1);
            tokio::spawn(handle_conn(socket, seen.clone(), statuses[index]));
        }
    });

    (base_url, requests)
}

fn test_service(pool: LibsqlPool, base_url: String) -> (TriggerService, Arc<DatabaseImpl>) {
    let database = Arc::new(DatabaseImpl::new_from_pool(pool));
    let config = CheckerConfig {
        base_url,
        dispatch_timeout_seconds: 5,
        max_retries: 0,
        retry_delay_ms: 10,
    };
    let checker = CheckerClient::new(config, "secret".to_string()).unwrap();
    let service = TriggerService::new(database.clone() as Arc<dyn Database>, checker);
    (service, database)
}

fn free_limits() -> Limits {
    Plan::Free.limits()
}

fn request_body(request: &str) -> serde_json::Value {
    let body = request.split_once("\r\n\r\n").map(|(_, body)| body).unwrap_or_default();
    serde_json::from_str(body).unwrap()
}

fn region_header(request: &str) -> Option<String> {
    request
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("fly-prefer-region"))
        .map(|(_, value)| value.trim().to_string())
}

#[tokio::test]
async fn trigger_records_one_run_and_fans_out_to_every_region() -> Result<()> {
    let pool = create_test_database().await?;
    let workspace = seed_workspace(&pool, "acme").await;
    let monitor_id =
        seed_monitor(&pool, workspace.id, "http", "https://acme.example.com", "ams,iad").await;
    let (base_url, requests) = spawn_checker(vec![200]).await;
    let (service, database) = test_service(pool, base_url);

    let run_id = service.trigger_monitor(&workspace, &free_limits(), monitor_id).await?;

    assert_eq!(run_count(&database, workspace.id).await, 1);

    // The returned id is the run row's id
    let last = database.insert_run(monitor_id, workspace.id, Utc::now()).await?.unwrap();
    assert_eq!(last, run_id + 1);

    let requests = requests.lock().await;
    assert_eq!(requests.len(), 2);

    // Same fixed endpoint for both, differing only in the region header
    for request in requests.iter() {
        assert!(request.starts_with(&format!(
            "POST /checker/http?monitor_id={monitor_id}&trigger=api&data=true"
        )));
    }
    let mut regions: Vec<String> =
        requests.iter().map(|request| region_header(request).unwrap()).collect();
    regions.sort();
    assert_eq!(regions, vec!["ams", "iad"]);

    Ok(())
}

#[tokio::test]
async fn exhausted_quota_denies_with_zero_side_effects() -> Result<()> {
    let pool = create_test_database().await?;
    let workspace = seed_workspace(&pool, "acme").await;
    let monitor_id =
        seed_monitor(&pool, workspace.id, "http", "https://acme.example.com", "ams").await;

    let limits = Limits { synthetic_checks: 10 };
    for _ in 0..10 {
        seed_run_at(&pool, workspace.id, monitor_id, Utc::now() - Duration::days(2)).await;
    }

    let (base_url, requests) = spawn_checker(vec![200]).await;
    let (service, database) = test_service(pool, base_url);

    let err = service.trigger_monitor(&workspace, &limits, monitor_id).await.unwrap_err();

    assert!(matches!(err, TriggerError::QuotaExceeded));
    assert_eq!(run_count(&database, workspace.id).await, 10);
    assert!(requests.lock().await.is_empty());

    Ok(())
}

#[tokio::test]
async fn runs_older_than_one_month_do_not_count_against_the_quota() -> Result<()> {
    let pool = create_test_database().await?;
    let workspace = seed_workspace(&pool, "acme").await;
    let monitor_id =
        seed_monitor(&pool, workspace.id, "http", "https://acme.example.com", "ams").await;

    let limits = Limits { synthetic_checks: 10 };
    for _ in 0..10 {
        seed_run_at(&pool, workspace.id, monitor_id, Utc::now() - Duration::days(40)).await;
    }

    let (base_url, _requests) = spawn_checker(vec![200]).await;
    let (service, _database) = test_service(pool, base_url);

    assert!(service.trigger_monitor(&workspace, &limits, monitor_id).await.is_ok());

    Ok(())
}

#[tokio::test]
async fn soft_deleted_and_foreign_monitors_are_not_found() -> Result<()> {
    let pool = create_test_database().await?;
    let workspace = seed_workspace(&pool, "acme").await;
    let stranger = seed_workspace(&pool, "stranger").await;
    let monitor_id =
        seed_monitor(&pool, workspace.id, "http", "https://acme.example.com", "ams").await;
    let deleted_id =
        seed_monitor(&pool, workspace.id, "http", "https://acme.example.com", "ams").await;
    soft_delete_monitor(&pool, deleted_id).await;

    let (base_url, requests) = spawn_checker(vec![200]).await;
    let (service, database) = test_service(pool, base_url);

    let err = service.trigger_monitor(&workspace, &free_limits(), deleted_id).await.unwrap_err();
    assert!(matches!(err, TriggerError::MonitorNotFound));

    let err = service.trigger_monitor(&stranger, &free_limits(), monitor_id).await.unwrap_err();
    assert!(matches!(err, TriggerError::MonitorNotFound));

    assert_eq!(run_count(&database, workspace.id).await, 0);
    assert_eq!(run_count(&database, stranger.id).await, 0);
    assert!(requests.lock().await.is_empty());

    Ok(())
}

#[tokio::test]
async fn drifted_job_type_surfaces_as_schema_invalid() -> Result<()> {
    let pool = create_test_database().await?;
    let workspace = seed_workspace(&pool, "acme").await;
    let monitor_id =
        seed_monitor(&pool, workspace.id, "icmp", "https://acme.example.com", "ams").await;

    let (base_url, _requests) = spawn_checker(vec![200]).await;
    let (service, database) = test_service(pool, base_url);

    let err = service.trigger_monitor(&workspace, &free_limits(), monitor_id).await.unwrap_err();

    assert!(matches!(err, TriggerError::SchemaInvalid(_)));
    assert_eq!(run_count(&database, workspace.id).await, 0);

    Ok(())
}

#[tokio::test]
async fn failed_regional_dispatch_still_returns_the_run_id() -> Result<()> {
    let pool = create_test_database().await?;
    let workspace = seed_workspace(&pool, "acme").await;
    let monitor_id =
        seed_monitor(&pool, workspace.id, "http", "https://acme.example.com", "ams,iad").await;

    // One of the two regional requests is rejected by the tier
    let (base_url, requests) = spawn_checker(vec![500, 200]).await;
    let (service, database) = test_service(pool, base_url);

    let run_id = service.trigger_monitor(&workspace, &free_limits(), monitor_id).await?;

    assert!(run_id > 0);
    assert_eq!(run_count(&database, workspace.id).await, 1);
    assert_eq!(requests.lock().await.len(), 2);

    Ok(())
}

#[tokio::test]
async fn last_known_region_status_is_injected_into_each_payload() -> Result<()> {
    let pool = create_test_database().await?;
    let workspace = seed_workspace(&pool, "acme").await;
    let monitor_id =
        seed_monitor(&pool, workspace.id, "http", "https://acme.example.com", "ams,iad").await;
    seed_status(&pool, monitor_id, "ams", "degraded").await;

    let (base_url, requests) = spawn_checker(vec![200]).await;
    let (service, _database) = test_service(pool, base_url);

    service.trigger_monitor(&workspace, &free_limits(), monitor_id).await?;

    let requests = requests.lock().await;
    assert_eq!(requests.len(), 2);

    for request in requests.iter() {
        let body = request_body(request);
        let expected = match region_header(request).unwrap().as_str() {
            "ams" => "degraded",
            // No status row for iad, so the default applies
            "iad" => "active",
            other => panic!("unexpected region {other}"),
        };
        assert_eq!(body["status"], expected);
        assert_eq!(body["trigger"], "api");
        assert_eq!(body["monitorId"], monitor_id.to_string());
    }

    Ok(())
}

#[tokio::test]
async fn tcp_monitors_dispatch_to_the_tcp_endpoint() -> Result<()> {
    let pool = create_test_database().await?;
    let workspace = seed_workspace(&pool, "acme").await;
    let monitor_id = seed_monitor(&pool, workspace.id, "tcp", "db.example.com:5432", "ams").await;

    let (base_url, requests) = spawn_checker(vec![200]).await;
    let (service, _database) = test_service(pool, base_url);

    service.trigger_monitor(&workspace, &free_limits(), monitor_id).await?;

    let requests = requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with(&format!(
        "POST /checker/tcp?monitor_id={monitor_id}&trigger=api&data=true"
    )));

    let body = request_body(&requests[0]);
    assert_eq!(body["uri"], "db.example.com:5432");
    assert_eq!(body["status"], "active");

    Ok(())
}
