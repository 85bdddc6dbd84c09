use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Notify};

use devloop::engine::{RebuildCoordinator, RunPolicy};
use devloop::errors::{DevloopError, Result as RunnerResult};
use devloop::exec::{OutputSink, Runner};
use devloop::proxy::{Proxy, ProxyConfig};
use devloop::types::{BoxFuture, BuildStatus};
use devloop_test_utils::fakes::{CallLog, FakeBuilder, FakeRunner, RecordingNotifier};
use devloop_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

/// Upstream that echoes every connection back to the client.
async fn echo_upstream() -> Result<SocketAddr, Box<dyn Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut rd, mut wr) = stream.split();
                let _ = tokio::io::copy(&mut rd, &mut wr).await;
            });
        }
    });
    Ok(addr)
}

fn config(upstream: SocketAddr) -> ProxyConfig {
    ProxyConfig {
        listen: SocketAddr::from(([127, 0, 0, 1], 0)),
        upstream,
        build_wait: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(2),
    }
}

async fn start_proxy(
    config: ProxyConfig,
    runner: Arc<dyn Runner>,
    status: watch::Receiver<BuildStatus>,
) -> Result<SocketAddr, Box<dyn Error>> {
    let proxy = Proxy::bind(config, runner, status).await?;
    let addr = proxy.local_addr()?;
    proxy.spawn();
    Ok(addr)
}

async fn read_response(mut stream: TcpStream) -> Result<String, Box<dyn Error>> {
    let mut buf = String::new();
    with_timeout(stream.read_to_string(&mut buf)).await?;
    Ok(buf)
}

#[tokio::test]
async fn successful_build_forwards_bytes_and_starts_app() -> TestResult {
    init_tracing();
    let log = CallLog::new();
    let runner = Arc::new(FakeRunner::new(log.clone()));
    runner.arm().await;
    let (_status_tx, status_rx) = watch::channel(BuildStatus::Succeeded);
    let proxy = start_proxy(config(echo_upstream().await?), runner.clone(), status_rx).await?;

    let mut client = TcpStream::connect(proxy).await?;
    client.write_all(b"ping").await?;
    let mut echoed = [0u8; 4];
    with_timeout(client.read_exact(&mut echoed)).await?;

    assert_eq!(&echoed, b"ping");
    assert_eq!(log.calls(), vec!["run"]);
    assert!(runner.running());
    Ok(())
}

#[tokio::test]
async fn failed_build_answers_500_with_diagnostics() -> TestResult {
    init_tracing();
    let log = CallLog::new();
    let runner = Arc::new(FakeRunner::new(log.clone()));
    let (_status_tx, status_rx) =
        watch::channel(BuildStatus::Failed("./main.go:4:2: syntax error".into()));
    let proxy = start_proxy(config(echo_upstream().await?), runner, status_rx).await?;

    let client = TcpStream::connect(proxy).await?;
    let response = read_response(client).await?;

    assert!(response.starts_with("HTTP/1.1 500"), "got {response:?}");
    assert!(response.contains("./main.go:4:2: syntax error"));
    assert_eq!(log.count("run"), 0);
    Ok(())
}

#[tokio::test]
async fn connections_wait_for_running_build() -> TestResult {
    init_tracing();
    let log = CallLog::new();
    let runner = Arc::new(FakeRunner::new(log.clone()));
    let (status_tx, status_rx) = watch::channel(BuildStatus::Building);
    let proxy = start_proxy(config(echo_upstream().await?), runner.clone(), status_rx).await?;

    let mut client = TcpStream::connect(proxy).await?;
    client.write_all(b"hello").await?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(log.count("run"), 0);

    runner.arm().await;
    status_tx.send_replace(BuildStatus::Succeeded);

    let mut echoed = [0u8; 5];
    with_timeout(client.read_exact(&mut echoed)).await?;
    assert_eq!(&echoed, b"hello");
    assert_eq!(log.count("run"), 1);
    Ok(())
}

#[tokio::test]
async fn build_that_never_finishes_answers_503() -> TestResult {
    init_tracing();
    let runner = Arc::new(FakeRunner::new(CallLog::new()));
    let (_status_tx, status_rx) = watch::channel(BuildStatus::Building);
    let mut cfg = config(echo_upstream().await?);
    cfg.build_wait = Duration::from_millis(50);
    let proxy = start_proxy(cfg, runner, status_rx).await?;

    let response = read_response(TcpStream::connect(proxy).await?).await?;
    assert!(response.starts_with("HTTP/1.1 503"), "got {response:?}");
    Ok(())
}

#[tokio::test]
async fn unreachable_app_answers_502() -> TestResult {
    init_tracing();
    // Grab a free port, then close it so nothing listens there.
    let closed = TcpListener::bind("127.0.0.1:0").await?.local_addr()?;
    let runner = Arc::new(FakeRunner::new(CallLog::new()));
    runner.arm().await;
    let (_status_tx, status_rx) = watch::channel(BuildStatus::Succeeded);
    let mut cfg = config(closed);
    cfg.connect_timeout = Duration::from_millis(200);
    let proxy = start_proxy(cfg, runner, status_rx).await?;

    let response = read_response(TcpStream::connect(proxy).await?).await?;
    assert!(response.starts_with("HTTP/1.1 502"), "got {response:?}");
    Ok(())
}

#[tokio::test]
async fn port_in_use_is_a_bind_error() -> TestResult {
    init_tracing();
    let taken = TcpListener::bind("127.0.0.1:0").await?;
    let mut cfg = config(echo_upstream().await?);
    cfg.listen = taken.local_addr()?;
    let (_status_tx, status_rx) = watch::channel(BuildStatus::Succeeded);

    let result = Proxy::bind(cfg, Arc::new(FakeRunner::new(CallLog::new())), status_rx).await;

    match result {
        Err(DevloopError::ProxyBind { port, .. }) => assert_eq!(port, taken.local_addr()?.port()),
        Err(other) => panic!("expected a bind error, got {other}"),
        Ok(_) => panic!("binding an occupied port succeeded"),
    }
    Ok(())
}

/// Runner whose start requests arrive late, after a rebuild may already have
/// stopped the application.
struct DelayedStart {
    inner: Arc<FakeRunner>,
    delay: Duration,
    entered: Notify,
}

impl DelayedStart {
    fn new(inner: Arc<FakeRunner>) -> Self {
        Self {
            inner,
            delay: Duration::from_millis(50),
            entered: Notify::new(),
        }
    }
}

impl Runner for DelayedStart {
    fn run(&self) -> BoxFuture<'_, RunnerResult<bool>> {
        Box::pin(async move {
            self.entered.notify_one();
            tokio::time::sleep(self.delay).await;
            self.inner.run().await
        })
    }

    fn kill(&self) -> BoxFuture<'_, RunnerResult<()>> {
        self.inner.kill()
    }

    fn arm(&self) -> BoxFuture<'_, ()> {
        self.inner.arm()
    }

    fn is_running(&self) -> BoxFuture<'_, bool> {
        self.inner.is_running()
    }

    fn set_output_sink(&self, sink: OutputSink) {
        self.inner.set_output_sink(sink);
    }
}

/// Good startup build, then a client connects and its start request is
/// still in flight when the next rebuild begins.
async fn connect_during_rebuild(
    builder: FakeBuilder,
    log: &CallLog,
) -> Result<(TcpStream, RebuildCoordinator, Arc<FakeRunner>), Box<dyn Error>> {
    let fake = Arc::new(FakeRunner::new(log.clone()));
    let runner = Arc::new(DelayedStart::new(fake.clone()));
    let mut coordinator = RebuildCoordinator::new(
        Box::new(builder),
        runner.clone(),
        Arc::new(RecordingNotifier::new()),
        RunPolicy::OnDemand,
        "api",
    )
    .with_settle(Duration::ZERO);
    coordinator.rebuild(None).await;

    let proxy = start_proxy(
        config(echo_upstream().await?),
        runner.clone(),
        coordinator.subscribe(),
    )
    .await?;
    let mut client = TcpStream::connect(proxy).await?;
    client.write_all(b"ping").await?;
    with_timeout(runner.entered.notified()).await;

    coordinator.rebuild(Some(std::path::Path::new("main.go"))).await;
    Ok((client, coordinator, fake))
}

#[tokio::test]
async fn late_start_after_failed_rebuild_starts_nothing() -> TestResult {
    init_tracing();
    let log = CallLog::new();
    let builder = FakeBuilder::new(log.clone())
        .then_succeed()
        .then_fail("syntax error line 4");

    let (client, _coordinator, fake) = connect_during_rebuild(builder, &log).await?;
    let response = read_response(client).await?;

    assert!(response.starts_with("HTTP/1.1 500"), "got {response:?}");
    assert!(response.contains("syntax error line 4"));
    assert!(!fake.running());
    assert_eq!(log.calls(), vec!["kill", "build", "kill", "build"]);
    Ok(())
}

#[tokio::test]
async fn late_start_after_good_rebuild_starts_the_new_build() -> TestResult {
    init_tracing();
    let log = CallLog::new();
    let builder = FakeBuilder::new(log.clone()).then_succeed().then_succeed();

    let (mut client, _coordinator, fake) = connect_during_rebuild(builder, &log).await?;
    let mut echoed = [0u8; 4];
    with_timeout(client.read_exact(&mut echoed)).await?;

    assert_eq!(&echoed, b"ping");
    assert!(fake.running());
    assert_eq!(log.calls(), vec!["kill", "build", "kill", "build", "run"]);
    Ok(())
}
