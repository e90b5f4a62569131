//! Orchestrator tests against `sh` scripts.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ffwrap::config::{ErrorMode, FfmpegConfig};
use ffwrap::events::{Event, EventKind};
use ffwrap::process::{ExecuteError, ExecuteOptions, ExecutionState, Ffmpeg};
use ffwrap::ErrorKind;

fn sh(script: &str) -> Ffmpeg {
    Ffmpeg::with_executable("sh").option("c", script)
}

fn record(ffmpeg: &Ffmpeg, kinds: &[EventKind]) -> Arc<Mutex<Vec<Event>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    for kind in kinds {
        let sink = Arc::clone(&seen);
        ffmpeg.on(*kind, move |event| {
            sink.lock().unwrap().push(event.clone());
            Ok(())
        });
    }
    seen
}

async fn wait_until_running(ffmpeg: &Ffmpeg) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while ffmpeg.state() != ExecutionState::Running {
        assert!(Instant::now() < deadline, "process never reached Running");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn kind_of(result: Result<Vec<u8>, ExecuteError>) -> Option<ErrorKind> {
    result.unwrap_err().kind()
}

#[tokio::test]
async fn completed_run_returns_stdout() {
    let ffmpeg = sh("printf hello");
    let events = record(&ffmpeg, &[EventKind::Completed, EventKind::Terminated]);

    let stdout = ffmpeg.execute().await.unwrap();

    assert_eq!(stdout, b"hello");
    assert_eq!(ffmpeg.state(), ExecutionState::Completed);
    assert!(ffmpeg.pid().is_none());
    assert_eq!(*events.lock().unwrap(), vec![Event::Completed]);
}

#[tokio::test]
async fn events_follow_lifecycle_order() {
    let script = r"printf 'Input #0, lavfi\nframe=1 fps=0.0 size=0kB time=00:00:00.04 bitrate=N/A speed=1x\rframe=2 fps=25 size=1kB time=00:00:00.08 bitrate=100.0kbits/s speed=2x\r' >&2";
    let ffmpeg = sh(script);
    let events = record(
        &ffmpeg,
        &[
            EventKind::Start,
            EventKind::Stderr,
            EventKind::Progress,
            EventKind::Completed,
        ],
    );

    ffmpeg.execute().await.unwrap();

    let events = events.lock().unwrap();
    let kinds: Vec<EventKind> = events.iter().map(Event::kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Start,
            EventKind::Stderr,
            EventKind::Stderr,
            EventKind::Progress,
            EventKind::Stderr,
            EventKind::Progress,
            EventKind::Completed,
        ]
    );
    assert_eq!(events[0], Event::Start(ffmpeg.arguments()));
    assert_eq!(events[1].line(), Some("Input #0, lavfi"));

    let frames: Vec<u64> = events
        .iter()
        .filter_map(Event::statistics)
        .map(|s| s.frame)
        .collect();
    assert_eq!(frames, vec![1, 2]);
}

#[tokio::test]
async fn missing_file_is_classified() {
    let ffmpeg = sh("echo 'missing.mp4: No such file or directory' >&2; exit 1");
    let err = ffmpeg.execute().await.unwrap_err();

    let ExecuteError::Ffmpeg(error) = &err else {
        panic!("expected a classified error, got {err:?}");
    };
    assert_eq!(error.kind(), ErrorKind::FileNotFound);
    assert_eq!(error.message(), "missing.mp4: No such file or directory");
    assert_eq!(error.arguments(), ffmpeg.arguments().as_slice());
    assert_eq!(ffmpeg.state(), ExecutionState::Failed);
}

#[tokio::test]
async fn unknown_codec_is_classified() {
    let ffmpeg = sh("echo \"Unknown encoder 'nope'\" >&2; exit 1");
    assert_eq!(kind_of(ffmpeg.execute().await), Some(ErrorKind::UnsupportedCodec));
}

#[tokio::test]
async fn malformed_flag_is_classified() {
    let ffmpeg = sh("echo \"Unrecognized option 'bogus'.\" >&2; exit 8");
    assert_eq!(kind_of(ffmpeg.execute().await), Some(ErrorKind::InvalidCommand));
}

#[tokio::test]
async fn unmatched_failure_is_generic() {
    let ffmpeg = sh("echo 'something odd happened' >&2; exit 3");
    assert_eq!(kind_of(ffmpeg.execute().await), Some(ErrorKind::Generic));
}

#[tokio::test]
async fn timeout_kills_the_process() {
    let ffmpeg = sh("exec sleep 10");
    let events = record(&ffmpeg, &[EventKind::Completed, EventKind::Terminated]);
    let started = Instant::now();

    let err = ffmpeg
        .execute_with(ExecuteOptions::new().timeout(Duration::from_millis(200)))
        .await
        .unwrap_err();

    assert!(matches!(err, ExecuteError::Timeout(_)));
    assert_eq!(err.kind(), Some(ErrorKind::Timeout));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(ffmpeg.state(), ExecutionState::Failed);
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn dropped_execute_settles_as_failed() {
    let ffmpeg = sh("exec sleep 10");
    let events = record(&ffmpeg, &[EventKind::Completed, EventKind::Terminated]);

    let outer = tokio::time::timeout(Duration::from_millis(200), ffmpeg.execute()).await;

    assert!(outer.is_err(), "execute should still be running when dropped");
    assert_eq!(ffmpeg.state(), ExecutionState::Failed);
    assert!(ffmpeg.pid().is_none());
    assert_eq!(ffmpeg.terminate().unwrap_err().kind(), Some(ErrorKind::NotRunning));
    assert_eq!(ffmpeg.state(), ExecutionState::Failed);
    assert!(events.lock().unwrap().is_empty());

    let err = ffmpeg.execute().await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::AlreadyExecuted));
}

#[tokio::test]
async fn aborted_task_settles_as_failed() {
    let ffmpeg = Arc::new(sh("exec sleep 10"));

    let runner = Arc::clone(&ffmpeg);
    let task = tokio::spawn(async move { runner.execute().await });
    wait_until_running(&ffmpeg).await;

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert_eq!(ffmpeg.state(), ExecutionState::Failed);
    assert!(ffmpeg.pid().is_none());
    assert_eq!(ffmpeg.terminate().unwrap_err().kind(), Some(ErrorKind::NotRunning));
}

#[tokio::test]
async fn timeout_clears_pid_before_returning() {
    let ffmpeg = sh("exec sleep 10");
    let _ = ffmpeg
        .execute_with(ExecuteOptions::new().timeout(Duration::from_millis(100)))
        .await;
    assert!(ffmpeg.pid().is_none());
    assert_eq!(ffmpeg.terminate().unwrap_err().kind(), Some(ErrorKind::NotRunning));
}

#[tokio::test]
async fn terminate_after_reap_does_not_signal() {
    // The background writer keeps stderr open after the shell itself exits.
    let ffmpeg = Arc::new(sh("(sleep 1; echo late >&2) & exit 3"));
    let events = record(&ffmpeg, &[EventKind::Completed, EventKind::Terminated]);

    let runner = Arc::clone(&ffmpeg);
    let task = tokio::spawn(async move { runner.execute().await });

    let deadline = Instant::now() + Duration::from_secs(5);
    while !(ffmpeg.state() == ExecutionState::Running && ffmpeg.pid().is_none()) {
        assert!(Instant::now() < deadline, "shell was never reaped while running");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    ffmpeg.terminate().unwrap();

    assert!(task.await.unwrap().is_ok());
    assert_eq!(ffmpeg.state(), ExecutionState::Terminated);
    assert_eq!(*events.lock().unwrap(), vec![Event::Terminated]);
}

#[tokio::test]
async fn terminate_yields_terminated_event() {
    let ffmpeg = Arc::new(sh("exec sleep 10"));
    let events = record(&ffmpeg, &[EventKind::Completed, EventKind::Terminated]);

    let runner = Arc::clone(&ffmpeg);
    let task = tokio::spawn(async move { runner.execute().await });

    wait_until_running(&ffmpeg).await;
    assert!(ffmpeg.pid().is_some());
    ffmpeg.terminate().unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("process did not stop after terminate")
        .unwrap();

    assert!(result.is_ok());
    assert!(ffmpeg.is_terminated());
    assert_eq!(ffmpeg.state(), ExecutionState::Terminated);
    assert_eq!(*events.lock().unwrap(), vec![Event::Terminated]);
}

#[tokio::test]
async fn clean_exit_after_terminate_is_completed() {
    let ffmpeg = Arc::new(sh("trap 'exit 0' TERM; while :; do sleep 0.05; done"));
    let events = record(&ffmpeg, &[EventKind::Completed, EventKind::Terminated]);

    let runner = Arc::clone(&ffmpeg);
    let task = tokio::spawn(async move { runner.execute().await });

    wait_until_running(&ffmpeg).await;
    // Give the shell time to install its trap.
    tokio::time::sleep(Duration::from_millis(100)).await;
    ffmpeg.terminate().unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("process did not stop after terminate")
        .unwrap();

    assert!(result.is_ok());
    assert_eq!(ffmpeg.state(), ExecutionState::Completed);
    assert_eq!(*events.lock().unwrap(), vec![Event::Completed]);
}

#[tokio::test]
async fn terminate_before_execute_is_not_running() {
    let ffmpeg = sh("true");
    let err = ffmpeg.terminate().unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotRunning));
    assert_eq!(ffmpeg.state(), ExecutionState::Idle);
}

#[tokio::test]
async fn terminate_after_completion_is_not_running() {
    let ffmpeg = sh("true");
    ffmpeg.execute().await.unwrap();
    assert_eq!(ffmpeg.terminate().unwrap_err().kind(), Some(ErrorKind::NotRunning));
}

#[tokio::test]
async fn second_execute_is_rejected() {
    let ffmpeg = sh("true");
    ffmpeg.execute().await.unwrap();

    let err = ffmpeg.execute().await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::AlreadyExecuted));
    assert_eq!(ffmpeg.state(), ExecutionState::Completed);
}

#[tokio::test]
async fn execute_while_in_flight_is_rejected() {
    let ffmpeg = Arc::new(sh("exec sleep 10"));

    let runner = Arc::clone(&ffmpeg);
    let task = tokio::spawn(async move {
        runner
            .execute_with(ExecuteOptions::new().timeout(Duration::from_secs(5)))
            .await
    });
    wait_until_running(&ffmpeg).await;

    let err = ffmpeg.execute().await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::AlreadyExecuted));

    ffmpeg.terminate().unwrap();
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test]
async fn stdin_bytes_round_trip() {
    let input: Vec<u8> = (0..1_000_000u32).map(|i| (i % 251) as u8).collect();
    let ffmpeg = Ffmpeg::with_config(
        FfmpegConfig::default()
            .with_executable("sh")
            .with_stdin_chunk_size(4096),
    )
    .option("c", "exec cat");

    let stdout = ffmpeg
        .execute_with(ExecuteOptions::new().input(input.clone()))
        .await
        .unwrap();

    assert_eq!(stdout.len(), input.len());
    assert_eq!(stdout, input);
}

#[tokio::test]
async fn stdin_reader_round_trip() {
    let input = b"streamed through an async reader".to_vec();
    let ffmpeg = sh("exec cat");

    let stdout = ffmpeg
        .execute_with(ExecuteOptions::new().input_reader(std::io::Cursor::new(input.clone())))
        .await
        .unwrap();

    assert_eq!(stdout, input);
}

#[tokio::test]
async fn early_stdin_close_is_not_an_error() {
    let input = vec![0u8; 4 * 1024 * 1024];
    let ffmpeg = sh("exec true");

    let stdout = ffmpeg
        .execute_with(ExecuteOptions::new().input(input))
        .await
        .unwrap();

    assert!(stdout.is_empty());
    assert_eq!(ffmpeg.state(), ExecutionState::Completed);
}

#[tokio::test]
async fn start_listener_error_prevents_launch() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("spawned");
    let ffmpeg = sh(&format!("touch '{}'", marker.display()));
    ffmpeg.on(EventKind::Start, |_| Err("launch refused".into()));

    let err = ffmpeg.execute().await.unwrap_err();

    let ExecuteError::Listener(emit) = &err else {
        panic!("expected a listener error, got {err:?}");
    };
    assert_eq!(emit.event, EventKind::Start);
    assert_eq!(emit.source.to_string(), "launch refused");
    assert!(!marker.exists());
    assert_eq!(ffmpeg.state(), ExecutionState::Failed);
}

#[tokio::test]
async fn stderr_listener_error_aborts_run() {
    let ffmpeg = sh("echo ready >&2; exec sleep 10");
    ffmpeg.on(EventKind::Stderr, |_| Err("stop".into()));
    let started = Instant::now();

    let err = ffmpeg.execute().await.unwrap_err();

    assert!(matches!(err, ExecuteError::Listener(_)));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(ffmpeg.state(), ExecutionState::Failed);
}

#[tokio::test]
async fn emit_mode_routes_failure_to_listeners() {
    let ffmpeg = sh("printf partial; echo 'out.mp4 already exists' >&2; exit 1")
        .error_mode(ErrorMode::Emit);
    let events = record(&ffmpeg, &[EventKind::Error, EventKind::Completed]);

    let stdout = ffmpeg.execute().await.unwrap();

    assert_eq!(stdout, b"partial");
    assert_eq!(ffmpeg.state(), ExecutionState::Failed);
    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    let Event::Error(error) = &events[0] else {
        panic!("expected an error event");
    };
    assert_eq!(error.kind(), ErrorKind::FileExists);
}

#[tokio::test]
async fn missing_executable_is_spawn_error() {
    let ffmpeg = Ffmpeg::with_executable("/definitely/not/ffmpeg");
    let err = ffmpeg.execute().await.unwrap_err();
    assert!(matches!(err, ExecuteError::Spawn(_)));
    assert_eq!(err.kind(), None);
}
