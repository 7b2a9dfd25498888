//! Example showing the gesture flows and their tracing output, using the
//! platform doubles.
//!
//! Run with: cargo run -p capgate-core --example gesture_trace

use std::rc::Rc;
use std::time::Duration;

use capgate_core::mock::{
    ManualScheduler, MemoryCredentialStore, MockAuthenticator, MockAuthenticatorOutcome,
    MockCamera, RecordingUi,
};
use capgate_core::{BrowserFamily, DemoConfig, GestureOutcome, Host, Orchestrator, PlatformError};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = DemoConfig::default();
    fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Capgate Gesture Demo ===\n");

    let authenticator = Rc::new(MockAuthenticator::new(42));
    let scheduler = Rc::new(ManualScheduler::new());
    let ui = Rc::new(RecordingUi::new());
    let user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
                      (KHTML, like Gecko) Version/17.4 Safari/605.1.15";

    let orchestrator = Orchestrator::new(
        &config,
        Host {
            camera: Rc::new(MockCamera::new()),
            credentials: authenticator.clone(),
            store: Rc::new(MemoryCredentialStore::new()),
            scheduler: scheduler.clone(),
            ui: ui.clone(),
            hostname: "localhost".into(),
            browser: BrowserFamily::detect(user_agent),
        },
    );

    for step in ["register", "authenticate"] {
        println!("\n--- Tap ({step}) ---");
        if let GestureOutcome::Started(flow) = orchestrator.trigger_biometric() {
            println!("Outcome: {:?}", flow.await);
        }
        println!("State:   {:?}", orchestrator.state());
    }

    println!("\n--- Preview timer fires ---");
    scheduler.advance(config.preview_duration());
    println!("State:   {:?}", orchestrator.state());

    println!("\n--- User cancels the prompt ---");
    authenticator.push_outcome(MockAuthenticatorOutcome::Fail(PlatformError::new(
        "NotAllowedError",
        "The operation either timed out or was not allowed.",
    )));
    if let GestureOutcome::Started(flow) = orchestrator.trigger_biometric() {
        println!("Outcome: {:?}", flow.await);
    }
    if let Some(notice) = ui.current_error() {
        println!("Error:   {} ({})", notice.message, notice.code);
        if let Some(remediation) = notice.remediation {
            println!("Fix it in {}:", remediation.browser);
            for (i, step) in remediation.steps.iter().enumerate() {
                println!("  {}. {}", i + 1, step);
            }
        }
    }

    scheduler.advance(Duration::from_secs(10));
    orchestrator.dispose();
}
