//! Live preview and completion behavior against an in-process engine.

mod common;

use common::{FakeEngine, pipeline, pump_live};
use std::rc::Rc;
use std::time::Duration;
use tokio::task::LocalSet;
use unitcalc::engine::ErrorKind;

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_preview_of_complete_input() {
    LocalSet::new()
        .run_until(async {
            let engine = Rc::new(FakeEngine::new());
            let (mut live, mut rx) = pipeline(&engine);

            live.on_change("5 m * 2", 7);
            pump_live(&mut live, &mut rx, Duration::from_millis(10)).await;

            let preview = live.preview().expect("preview shown");
            assert_eq!(preview.output, "10 m");
            assert!(!live.is_error());
            // Previews never keep bindings.
            assert_eq!(engine.calls(), vec![("5 m * 2".to_string(), false)]);
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_incomplete_input_shown_after_quiet_period() {
    LocalSet::new()
        .run_until(async {
            let engine = Rc::new(FakeEngine::new());
            let (mut live, mut rx) = pipeline(&engine);

            live.on_change("5 m *", 5);
            pump_live(&mut live, &mut rx, Duration::from_millis(250)).await;
            assert!(live.preview().is_none());
            assert!(live.has_pending_error());

            pump_live(&mut live, &mut rx, Duration::from_millis(100)).await;
            let preview = live.preview().expect("deferred error shown");
            assert!(preview.is_error);
            assert_eq!(preview.error_kind, Some(ErrorKind::ParseIncomplete));
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_incomplete_error_suppressed_by_next_keystroke() {
    LocalSet::new()
        .run_until(async {
            let engine = Rc::new(FakeEngine::new());
            let (mut live, mut rx) = pipeline(&engine);

            live.on_change("5 m *", 5);
            pump_live(&mut live, &mut rx, Duration::from_millis(100)).await;
            assert!(live.preview().is_none());

            live.on_change("5 m * 2", 7);
            assert!(!live.has_pending_error());

            // Well past the original quiet period.
            pump_live(&mut live, &mut rx, Duration::from_millis(1000)).await;
            let preview = live.preview().expect("preview shown");
            assert!(!preview.is_error);
            assert_eq!(preview.output, "10 m");
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_other_errors_shown_immediately() {
    LocalSet::new()
        .run_until(async {
            let engine = Rc::new(FakeEngine::new());
            let (mut live, mut rx) = pipeline(&engine);

            live.on_change("nope * 2", 8);
            pump_live(&mut live, &mut rx, Duration::from_millis(1)).await;

            let preview = live.preview().expect("error shown");
            assert!(preview.is_error);
            assert_eq!(preview.error_kind, Some(ErrorKind::Runtime));
            assert!(preview.output.contains("nope"));
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_stale_preview_dropped() {
    LocalSet::new()
        .run_until(async {
            let engine = Rc::new(FakeEngine::new());
            engine.delay("5 m", Duration::from_millis(200));
            let (mut live, mut rx) = pipeline(&engine);

            live.on_change("5 m", 3);
            live.on_change("6 m", 3);
            pump_live(&mut live, &mut rx, Duration::from_millis(500)).await;

            // The slow result for "5 m" arrived last but belongs to an older
            // buffer state.
            assert_eq!(live.preview().map(|p| p.output.as_str()), Some("6 m"));
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_completions_exclude_token_itself() {
    LocalSet::new()
        .run_until(async {
            let engine = Rc::new(FakeEngine::new());
            let (mut live, mut rx) = pipeline(&engine);

            live.on_change("3 k", 3);
            pump_live(&mut live, &mut rx, Duration::from_millis(1)).await;
            assert_eq!(live.completions().word(), "k");
            assert_eq!(live.completions().candidates(), ["kelvin", "kg", "km", "kmh"]);

            live.on_change("3 km", 4);
            pump_live(&mut live, &mut rx, Duration::from_millis(1)).await;
            assert_eq!(live.completions().word(), "km");
            assert_eq!(live.completions().candidates(), ["kmh"]);
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_symbol_offered_first() {
    LocalSet::new()
        .run_until(async {
            let engine = Rc::new(FakeEngine::new());
            let (mut live, mut rx) = pipeline(&engine);

            live.on_change("5 ohm", 5);
            pump_live(&mut live, &mut rx, Duration::from_millis(1)).await;

            let chips: Vec<&str> = live.completions().items().collect();
            assert_eq!(chips, ["Ω"]);
            assert_eq!(live.completions().selected(), Some("Ω"));
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_blank_buffer_clears_chips() {
    LocalSet::new()
        .run_until(async {
            let engine = Rc::new(FakeEngine::new());
            let (mut live, mut rx) = pipeline(&engine);

            live.on_change("3 k", 3);
            pump_live(&mut live, &mut rx, Duration::from_millis(1)).await;
            assert!(!live.completions().is_empty());

            live.on_change("   ", 3);
            assert!(live.completions().is_empty());
            pump_live(&mut live, &mut rx, Duration::from_millis(1)).await;
            assert!(live.completions().is_empty());
        })
        .await;
}
