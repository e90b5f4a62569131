//! Listener registry behavior seen through `Ffmpeg`.

use std::sync::{Arc, Mutex};

use ffwrap::events::{Event, EventKind};
use ffwrap::Ffmpeg;

#[test]
fn on_and_emit_share_one_registry() {
    let ffmpeg = Ffmpeg::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    ffmpeg.on(EventKind::Stderr, move |event| {
        sink.lock().unwrap().push(event.line().unwrap_or_default().to_string());
        Ok(())
    });

    let events = ffmpeg.events().clone();
    events.emit(&Event::Stderr("first".into())).unwrap();
    ffmpeg.emit(&Event::Stderr("second".into())).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    assert_eq!(events.listener_count(EventKind::Stderr), 1);
}

#[test]
fn listener_error_reaches_emit_caller_unchanged() {
    #[derive(Debug, thiserror::Error)]
    #[error("refused")]
    struct Refused;

    let ffmpeg = Ffmpeg::new();
    ffmpeg.on(EventKind::Start, |_| Err(Refused.into()));

    let err = ffmpeg.emit(&Event::Start(vec!["ffmpeg".into()])).unwrap_err();
    assert_eq!(err.event, EventKind::Start);
    assert!(err.into_source().downcast::<Refused>().is_ok());
}

#[test]
fn events_without_listeners_are_ignored() {
    let ffmpeg = Ffmpeg::new();
    assert!(ffmpeg.emit(&Event::Completed).is_ok());
}
