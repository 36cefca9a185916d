//! Message-driven renderer program.
//!
//! [`RendererProgram`] owns an [`OverlaySession`] and a [`BackgroundPort`],
//! translates inbound requests into session operations and reports finished
//! renders. [`RendererProgram::run`] is the event loop: it multiplexes
//! background messages, page events, simulated paints and the unrender timer.

use anyhow::Result;
use hints_dom::OverlayDom;
use log::{debug, error, info};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, sleep_until};

use crate::config::RendererConfig;
use crate::messages::{
    FromBackground, FromRenderer, ToBackground, ToRenderer, UnrenderMode, decode_from_background,
};
use crate::port::BackgroundPort;
use crate::session::{OverlaySession, RenderProgress};
use crate::telemetry::{RenderDurations, maybe_emit, render_durations_json};

/// Page events the host forwards to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageEvent {
    Resize,
    Click,
    KeyDown,
}

pub struct RendererProgram<D: OverlayDom, P: BackgroundPort> {
    session: OverlaySession<D>,
    port: P,
    config: RendererConfig,
}

impl<D: OverlayDom, P: BackgroundPort> RendererProgram<D, P> {
    pub fn new(dom: D, port: P, config: RendererConfig) -> Self {
        Self {
            session: OverlaySession::new(dom, config.clone()),
            port,
            config,
        }
    }

    #[inline]
    pub const fn session(&self) -> &OverlaySession<D> {
        &self.session
    }

    #[inline]
    pub const fn session_mut(&mut self) -> &mut OverlaySession<D> {
        &mut self.session
    }

    #[inline]
    pub const fn port(&self) -> &P {
        &self.port
    }

    /// Announce the renderer to the background.
    ///
    /// Returns `false` if the background was not ready; the renderer then
    /// stays idle until a retry-handshake request arrives.
    pub fn start(&mut self) -> bool {
        match self.port.send(FromRenderer::RendererScriptAdded.into()) {
            Ok(()) => {
                debug!("RendererProgram::start: announced");
                true
            }
            Err(error) => {
                debug!("RendererProgram::start: background not ready: {error}");
                false
            }
        }
    }

    /// Tear the overlay down before going away.
    pub fn stop(&mut self) {
        self.session.unrender();
    }

    fn send(&mut self, message: FromRenderer) {
        debug!("RendererProgram::send: {}", message.tag());
        let envelope = ToBackground::from(message);
        if let Err(error) = self.port.send(envelope) {
            error!("RendererProgram::send: {error}");
        }
    }

    fn report(&mut self, progress: RenderProgress) {
        if let RenderProgress::Finished(timestamps) = progress {
            maybe_emit(
                self.config.telemetry_enabled,
                &render_durations_json(&RenderDurations::from(&timestamps)),
            );
            self.send(FromRenderer::Rendered { timestamps });
        }
    }

    /// Handle one decoded inbound message.
    pub fn handle_message(&mut self, message: FromBackground) {
        match message {
            FromBackground::ToRenderer { message } => self.dispatch(message),
            FromBackground::RetryHandshake => {
                debug!("RendererProgram::handle_message: retrying handshake");
                self.send(FromRenderer::RendererScriptAdded);
            }
            FromBackground::Other => {
                debug!("RendererProgram::handle_message: ignoring message for another script");
            }
        }
    }

    /// Decode and handle one inbound JSON message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be decoded.
    pub fn handle_json(&mut self, json: &str) -> Result<()> {
        let message = decode_from_background(json)?;
        self.handle_message(message);
        Ok(())
    }

    fn dispatch(&mut self, message: ToRenderer) {
        debug!("RendererProgram::dispatch: {}", message.tag());
        match message {
            ToRenderer::StateSync { log_level } => log::set_max_level(log_level.filter()),
            ToRenderer::Render { elements } => {
                let progress = self.session.render(&elements);
                self.report(progress);
            }
            ToRenderer::UpdateHints {
                updates,
                mark_matched,
            } => self.session.update_hints(&updates, mark_matched),
            ToRenderer::RotateHints { forward } => self.session.rotate_hints(forward),
            ToRenderer::Unrender { mode } => match mode {
                UnrenderMode::Immediate => self.session.unrender(),
                UnrenderMode::Delayed => self.session.unrender_delayed(),
                UnrenderMode::Title { title } => self.session.unrender_to_title(&title),
            },
        }
    }

    /// Continue a render once the page has painted.
    pub fn on_paint(&mut self) {
        let progress = self.session.on_paint();
        self.report(progress);
    }

    pub fn handle_page_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::Resize => self.session.on_resize(),
            PageEvent::Click | PageEvent::KeyDown => self.session.on_user_input(),
        }
    }

    /// Run until the background channel closes.
    ///
    /// Paints are simulated one frame budget after a render starts waiting
    /// for one. When the inbox closes the overlay is removed and the program
    /// is handed back.
    ///
    /// # Errors
    ///
    /// Returns an error, after tearing the overlay down, when an inbound
    /// message cannot be decoded.
    pub async fn run(
        mut self,
        mut inbox: UnboundedReceiver<String>,
        mut events: UnboundedReceiver<PageEvent>,
    ) -> Result<Self> {
        let budget = self.config.frame_budget();
        let mut events_open = true;
        let mut next_paint: Option<Instant> = None;

        loop {
            if self.session.awaiting_paint() {
                if next_paint.is_none() {
                    next_paint = Some(Instant::now() + budget);
                }
            } else {
                next_paint = None;
            }
            let timer = self.session.timer_deadline();

            tokio::select! {
                biased;
                message = inbox.recv() => match message {
                    Some(json) => {
                        if let Err(error) = self.handle_json(&json) {
                            self.stop();
                            return Err(error);
                        }
                    }
                    None => {
                        info!("RendererProgram::run: background disconnected, stopping");
                        self.stop();
                        return Ok(self);
                    }
                },
                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_page_event(event),
                    None => events_open = false,
                },
                () = sleep_until(next_paint.unwrap_or_else(Instant::now)), if next_paint.is_some() => {
                    next_paint = None;
                    self.on_paint();
                }
                () = sleep_until(timer.unwrap_or_else(Instant::now)), if timer.is_some() => {
                    self.session.fire_timer();
                }
            }
        }
    }
}
