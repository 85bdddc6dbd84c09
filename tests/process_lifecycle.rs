use std::error::Error;
use std::sync::Arc;

use tokio::sync::oneshot;

use devloop::engine::{ShutdownHandler, SHUTDOWN_EXIT_CODE};
use devloop::exec::{OutputSink, Runner};
use devloop_test_utils::fakes::{CallLog, FakeRunner};
use devloop_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn shutdown_stops_application_then_exits_with_code_one() -> TestResult {
    init_tracing();
    let log = CallLog::new();
    let runner = Arc::new(FakeRunner::new(log.clone()));
    runner.arm().await;
    assert!(runner.run().await?);

    let (signal_tx, signal_rx) = oneshot::channel::<()>();
    let (exit_tx, exit_rx) = oneshot::channel::<i32>();

    let handler = ShutdownHandler::arm_with(
        async move {
            let _ = signal_rx.await;
            Ok::<_, std::io::Error>("SIGTERM")
        },
        runner.clone(),
        move |code| {
            let _ = exit_tx.send(code);
        },
    );
    assert!(!handler.is_finished());

    signal_tx.send(()).map_err(|_| "handler dropped the signal receiver")?;
    let code = with_timeout(exit_rx).await?;
    with_timeout(handler.join()).await;

    assert_eq!(code, SHUTDOWN_EXIT_CODE);
    assert_eq!(log.calls(), vec!["run", "kill"]);
    assert!(!runner.running());
    assert!(!runner.armed());
    Ok(())
}

#[tokio::test]
async fn shutdown_exits_even_when_stopping_fails() -> TestResult {
    init_tracing();
    let log = CallLog::new();
    let runner = Arc::new(FakeRunner::new(log.clone()).failing_kill());
    let (exit_tx, exit_rx) = oneshot::channel::<i32>();

    let _handler = ShutdownHandler::arm_with(
        async { Ok::<_, std::io::Error>("SIGINT") },
        runner,
        move |code| {
            let _ = exit_tx.send(code);
        },
    );

    assert_eq!(with_timeout(exit_rx).await?, SHUTDOWN_EXIT_CODE);
    assert_eq!(log.count("kill"), 1);
    Ok(())
}

#[tokio::test]
async fn signal_listener_failure_never_exits() -> TestResult {
    init_tracing();
    let log = CallLog::new();
    let runner = Arc::new(FakeRunner::new(log.clone()));
    let (exit_tx, exit_rx) = oneshot::channel::<i32>();

    let handler = ShutdownHandler::arm_with(
        async { Err::<&'static str, _>(std::io::Error::other("no signal support")) },
        runner,
        move |code| {
            let _ = exit_tx.send(code);
        },
    );
    with_timeout(handler.join()).await;

    // The closure was dropped without being called.
    assert!(exit_rx.await.is_err());
    assert_eq!(log.count("kill"), 0);
    Ok(())
}

#[tokio::test]
async fn concurrent_stops_on_fake_runner_are_harmless() -> TestResult {
    init_tracing();
    let log = CallLog::new();
    let runner = FakeRunner::new(log.clone());
    runner.arm().await;
    runner.run().await?;

    let (a, b) = tokio::join!(runner.kill(), runner.kill());
    a?;
    b?;

    assert!(!runner.is_running().await);
    assert_eq!(log.count("kill"), 2);
    Ok(())
}

#[tokio::test]
async fn output_sink_is_recorded_by_runner() -> TestResult {
    let runner = FakeRunner::new(CallLog::new());
    assert_eq!(runner.sink(), None);
    runner.set_output_sink(OutputSink::Null);
    assert_eq!(runner.sink(), Some(OutputSink::Null));
    Ok(())
}

#[cfg(unix)]
mod real_process {
    use super::*;
    use devloop::exec::ProcessRunner;

    fn sleeper() -> ProcessRunner {
        let runner = ProcessRunner::new("sleep", vec!["30".into()], Vec::new());
        runner.set_output_sink(OutputSink::Null);
        runner
    }

    #[tokio::test]
    async fn nothing_starts_until_armed() -> TestResult {
        init_tracing();
        let runner = sleeper();

        assert!(!runner.run().await?);
        assert!(!runner.is_running().await);

        runner.arm().await;
        assert!(runner.run().await?);
        assert!(runner.is_running().await);

        runner.kill().await?;
        assert!(!runner.run().await?, "stopping must disarm the runner");
        assert!(!runner.is_running().await);
        Ok(())
    }

    #[tokio::test]
    async fn run_is_a_no_op_while_running() -> TestResult {
        init_tracing();
        let runner = sleeper();
        runner.arm().await;

        assert!(runner.run().await?);
        assert!(runner.is_running().await);
        assert!(runner.run().await?);
        assert!(runner.is_running().await);

        runner.kill().await?;
        assert!(!runner.is_running().await);
        Ok(())
    }

    #[tokio::test]
    async fn stopping_twice_is_ok() -> TestResult {
        init_tracing();
        let runner = sleeper();

        runner.kill().await?;
        runner.arm().await;
        runner.run().await?;
        runner.kill().await?;
        runner.kill().await?;
        assert!(!runner.is_running().await);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_stops_leave_nothing_running() -> TestResult {
        init_tracing();
        let runner = sleeper();
        runner.arm().await;
        runner.run().await?;

        let (a, b) = with_timeout(async { tokio::join!(runner.kill(), runner.kill()) }).await;
        a?;
        b?;

        assert!(!runner.is_running().await);
        Ok(())
    }

    #[tokio::test]
    async fn exited_application_is_started_again() -> TestResult {
        init_tracing();
        let runner = ProcessRunner::new("true", Vec::new(), Vec::new());
        runner.set_output_sink(OutputSink::Null);
        runner.arm().await;

        runner.run().await?;
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert!(!runner.is_running().await);

        // Starting again replaces the exited process; stopping it is still fine.
        runner.run().await?;
        runner.kill().await?;
        Ok(())
    }

    #[tokio::test]
    async fn missing_binary_is_a_process_error() -> TestResult {
        init_tracing();
        let runner = ProcessRunner::new("/nonexistent/devloop-app", Vec::new(), Vec::new());
        runner.arm().await;

        let err = runner.run().await.err().ok_or("expected run to fail")?;
        assert!(err.to_string().contains("devloop-app"), "got {err}");
        assert!(!runner.is_running().await);
        Ok(())
    }
}
