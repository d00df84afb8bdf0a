//! Wiring the panel, renderer, and simulation together.

use std::rc::Rc;

use ricebar_core::cx::Cx;
use ricebar_core::event_loop::EventLoop;
use ricebar_services::testing::FakeServices;
use ricebar_services::{CommandRunner, SystemRunner};
use ricebar_widgets::{Panel, Services};
use tracing::info;
use web_time::Duration;

use crate::config::PanelConfig;
use crate::error::Result;
use crate::renderer::HeadlessRenderer;
use crate::simulation::Simulation;

/// A running panel and everything driving it.
pub struct App {
    panel: Rc<Panel>,
    renderer: HeadlessRenderer,
    simulation: Option<Simulation>,
}

impl App {
    /// Build the panel over `fakes`, with `runner` answering commands.
    pub fn build(
        ev: &EventLoop,
        config: &PanelConfig,
        fakes: FakeServices,
        runner: Rc<dyn CommandRunner>,
    ) -> Result<Self> {
        let settings = config.settings()?;
        let mut services = Services::from(&fakes);
        services.runner = runner;
        let panel = Rc::new(Panel::build(ev, &services, &settings)?);

        let renderer = HeadlessRenderer::new(Rc::clone(&panel));
        renderer.start(ev, config.frame_interval()?)?;

        let simulation = if config.simulation.enabled {
            let simulation = Simulation::new(fakes);
            simulation.start(ev, config.simulation_interval()?)?;
            Some(simulation)
        } else {
            None
        };
        Ok(Self {
            panel,
            renderer,
            simulation,
        })
    }

    #[must_use]
    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    #[must_use]
    pub fn renderer(&self) -> &HeadlessRenderer {
        &self.renderer
    }

    #[must_use]
    pub fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }

    /// Draw what is pending, then stop everything.
    pub fn shutdown(&self) {
        if let Some(simulation) = &self.simulation {
            simulation.stop();
        }
        self.renderer.render();
        self.renderer.stop();
        self.panel.teardown();
    }
}

/// Run the panel on the real clock, for `duration` or until killed.
pub fn run_panel(config: &PanelConfig, duration: Option<Duration>) -> Result<()> {
    let ev = EventLoop::new();
    let (cx, controller) = Cx::background();
    // Commands stop with the panel, or on their own once the loop exits.
    let (commands, commands_controller) = cx.child();
    let runner: Rc<dyn CommandRunner> = Rc::new(SystemRunner::new(commands));
    let app = App::build(&ev, config, FakeServices::new(), runner)?;
    info!(
        widgets = app.panel().widgets().len(),
        duration_secs = duration.map(|d| d.as_secs()),
        "ricebar started"
    );

    let _deadline = duration.map(|d| ev.timeout(d, move || controller.cancel()));
    let outcome = ev.run(&cx);
    commands_controller.cancel();
    app.shutdown();
    info!(frames = app.renderer().frames(), "ricebar stopped");
    outcome?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricebar_core::clock::LabClock;
    use ricebar_services::testing::FakeRunner;

    fn app(ev: &EventLoop, config: &PanelConfig) -> (FakeServices, Rc<FakeRunner>, App) {
        let fakes = FakeServices::new();
        let runner = FakeRunner::new();
        runner.respond("free", "h\nMem: 100 40 60\n");
        let app = App::build(ev, config, fakes.clone(), runner.clone()).unwrap();
        (fakes, runner, app)
    }

    #[test]
    fn builds_and_renders_on_the_lab_clock() {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let (_fakes, runner, app) = app(&ev, &PanelConfig::default());
        ev.advance(Duration::from_secs(4)).unwrap();
        assert!(app.renderer().frames() >= 1);
        assert_eq!(app.simulation().map(Simulation::steps), Some(2));
        assert_eq!(app.panel().memory().view().label, "0.0 GB");
        assert_eq!(runner.calls()[0], vec!["free".to_string()]);
    }

    #[test]
    fn simulation_can_be_disabled() {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let mut config = PanelConfig::default();
        config.simulation.enabled = false;
        let (_fakes, _runner, app) = app(&ev, &config);
        ev.advance(Duration::from_secs(10)).unwrap();
        assert!(app.simulation().is_none());
        assert_eq!(app.panel().battery().label(), "Stored: 80%");
    }

    #[test]
    fn shutdown_clears_every_timer() {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let (fakes, _runner, app) = app(&ev, &PanelConfig::default());
        app.panel().inhibitor().toggle();
        ev.run_until_stalled();
        app.shutdown();
        assert_eq!(ev.pending_timers(), 0);
        assert_eq!(fakes.inhibit.released(), vec![1]);
    }

    #[test]
    fn invalid_interval_fails_the_build() {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let mut config = PanelConfig::default();
        config.renderer.frame_ms = 0;
        let runner = FakeRunner::new();
        assert!(App::build(&ev, &config, FakeServices::new(), runner).is_err());
    }
}
