use core::time::Duration;

use hints_dom::{HeadlessDom, Viewport};
use hints_renderer::{
    FromRenderer, PageEvent, RendererConfig, RendererProgram, RendererState, ToBackground,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn dom() -> HeadlessDom {
    HeadlessDom::new(Viewport::new(1024.0, 768.0))
}

const RENDER_ONE: &str = r#"{"type":"ToRenderer","message":{"type":"Render","elements":[
    {"hint":"A","hintMeasurements":{"x":10,"y":10,"align":"left","maxX":500,"weight":1}}
]}}"#;

async fn next_report(outbox: &mut UnboundedReceiver<ToBackground>) -> FromRenderer {
    match outbox.recv().await {
        Some(ToBackground::FromRenderer { message }) => message,
        None => panic!("renderer dropped its port"),
    }
}

/// A failed announcement leaves the renderer idle instead of erroring.
#[test]
fn handshake_failure_stays_idle() {
    init();
    let (port, outbox) = mpsc::unbounded_channel::<ToBackground>();
    drop(outbox);
    let mut program = RendererProgram::new(dom(), port, RendererConfig::default());
    assert!(!program.start());
    assert_eq!(program.session().state(), RendererState::Idle);
}

/// Render requests are answered once the deferred fitting pass has seen a
/// paint, and closing the inbox tears the overlay down.
#[tokio::test(start_paused = true)]
async fn render_reports_after_a_paint() {
    init();
    let (port, mut outbox) = mpsc::unbounded_channel::<ToBackground>();
    let (inbox_tx, inbox_rx) = mpsc::unbounded_channel::<String>();
    let (_events_tx, events_rx) = mpsc::unbounded_channel::<PageEvent>();
    let mut program = RendererProgram::new(dom(), port, RendererConfig::default());
    assert!(program.start());

    let script = async move {
        assert_eq!(next_report(&mut outbox).await, FromRenderer::RendererScriptAdded);
        inbox_tx.send(RENDER_ONE.to_owned()).unwrap();
        let FromRenderer::Rendered { timestamps } = next_report(&mut outbox).await else {
            panic!("expected a render report");
        };
        assert!(timestamps.paint1 - timestamps.move_inside1 >= 16.0);
        assert!(timestamps.paint2 >= timestamps.move_inside2);

        inbox_tx.send(r#"{"type":"FirefoxWorkaround"}"#.to_owned()).unwrap();
        assert_eq!(next_report(&mut outbox).await, FromRenderer::RendererScriptAdded);
        drop(inbox_tx);
    };

    let (program, ()) = tokio::join!(program.run(inbox_rx, events_rx), script);
    let program = program.unwrap();
    assert_eq!(program.session().state(), RendererState::Idle);
}

/// An empty render answers without waiting for a paint.
#[tokio::test(start_paused = true)]
async fn empty_render_reports_immediately() {
    init();
    let (port, mut outbox) = mpsc::unbounded_channel::<ToBackground>();
    let (inbox_tx, inbox_rx) = mpsc::unbounded_channel::<String>();
    let (_events_tx, events_rx) = mpsc::unbounded_channel::<PageEvent>();
    let program = RendererProgram::new(dom(), port, RendererConfig::default());

    let script = async move {
        let started = tokio::time::Instant::now();
        inbox_tx
            .send(r#"{"type":"ToRenderer","message":{"type":"Render","elements":[]}}"#.to_owned())
            .unwrap();
        assert!(matches!(next_report(&mut outbox).await, FromRenderer::Rendered { .. }));
        assert_eq!(tokio::time::Instant::now(), started);
        drop(inbox_tx);
    };
    let (program, ()) = tokio::join!(program.run(inbox_rx, events_rx), script);
    program.unwrap();
}

/// Requests for other scripts are ignored; an unknown renderer request
/// stops the loop with an error.
#[tokio::test(start_paused = true)]
async fn unknown_requests_are_fatal() {
    init();
    let (port, _outbox) = mpsc::unbounded_channel::<ToBackground>();
    let (inbox_tx, inbox_rx) = mpsc::unbounded_channel::<String>();
    let (_events_tx, events_rx) = mpsc::unbounded_channel::<PageEvent>();
    let program = RendererProgram::new(dom(), port, RendererConfig::default());

    inbox_tx
        .send(r#"{"type":"ToWorker","message":{"type":"Whatever"}}"#.to_owned())
        .unwrap();
    inbox_tx.send(RENDER_ONE.to_owned()).unwrap();
    inbox_tx
        .send(r#"{"type":"ToRenderer","message":{"type":"Explode"}}"#.to_owned())
        .unwrap();

    let error = program.run(inbox_rx, events_rx).await.err().unwrap();
    assert!(format!("{error:#}").contains("Explode"));
}

/// Timers and page events are serviced while the loop waits for messages.
#[tokio::test(start_paused = true)]
async fn title_unrender_is_dismissed_by_a_key_press() {
    init();
    let (port, mut outbox) = mpsc::unbounded_channel::<ToBackground>();
    let (inbox_tx, inbox_rx) = mpsc::unbounded_channel::<String>();
    let (events_tx, events_rx) = mpsc::unbounded_channel::<PageEvent>();
    let program = RendererProgram::new(dom(), port, RendererConfig::default());

    let script = async move {
        inbox_tx.send(RENDER_ONE.to_owned()).unwrap();
        assert!(matches!(next_report(&mut outbox).await, FromRenderer::Rendered { .. }));
        inbox_tx
            .send(
                r#"{"type":"ToRenderer","message":{"type":"Unrender","mode":{"type":"title","title":"Copied"}}}"#
                    .to_owned(),
            )
            .unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        events_tx.send(PageEvent::Resize).unwrap();
        events_tx.send(PageEvent::KeyDown).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(events_tx);
        inbox_tx
            .send(r#"{"type":"ToRenderer","message":{"type":"StateSync","logLevel":"debug"}}"#.to_owned())
            .unwrap();
        drop(inbox_tx);
    };
    let (program, ()) = tokio::join!(program.run(inbox_rx, events_rx), script);
    let program = program.unwrap();
    assert_eq!(program.session().state(), RendererState::Idle);
    assert_eq!(log::max_level(), log::LevelFilter::Debug);
}
