//! Application wiring
//!
//! Builds the map, subscribes it to the position source, binds the display
//! surface and drives the scheduler.

use crate::presentation::{DisplaySurface, IconLoad, IconSource, LoadedIcons, MapPresentation};
use crate::source::{Clock, PositionSource, Scheduler, SubscriptionHandle, TaskHandle};
use crate::utils::config::AppConfig;
use crate::validation::{AppError, AppResult, MapError};
use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

pub struct Application<C: Clock> {
    config: AppConfig,
    map: Rc<RefCell<MapPresentation>>,
    source: PositionSource,
    scheduler: Scheduler<C>,
    subscription: SubscriptionHandle,
    emission: Option<TaskHandle>,
    icons: Option<LoadedIcons>,
    rejected: Rc<Cell<u64>>,
    surface_failures: Rc<Cell<u64>>,
}

impl<C: Clock> Application<C> {
    pub fn new(config: AppConfig, clock: C) -> AppResult<Self> {
        let map = Rc::new(RefCell::new(MapPresentation::new(&config)?));
        let source = PositionSource::new(&config.source);
        let rejected = Rc::new(Cell::new(0u64));
        let surface_failures = Rc::new(Cell::new(0u64));

        let subscriber_map = Rc::clone(&map);
        let subscriber_rejected = Rc::clone(&rejected);
        let subscriber_failures = Rc::clone(&surface_failures);
        let subscription = source.subscribe(Box::new(move |fix| {
            match subscriber_map.borrow_mut().apply_fix(fix) {
                Ok(()) => {}
                // The marker has moved; only the frame was lost
                Err(MapError::Surface(e)) => {
                    subscriber_failures.set(subscriber_failures.get() + 1);
                    log::warn!("Frame for fix {} not presented: {}", fix.sequence, e);
                }
                Err(e) => {
                    subscriber_rejected.set(subscriber_rejected.get() + 1);
                    log::warn!("Fix {} not applied: {}", fix.sequence, e);
                }
            }
        }));

        Ok(Self {
            config,
            map,
            source,
            scheduler: Scheduler::new(clock),
            subscription,
            emission: None,
            icons: None,
            rejected,
            surface_failures,
        })
    }

    /// Bind the map to the display surface; allowed once
    pub fn attach(&mut self, surface: Option<Box<dyn DisplaySurface>>) -> AppResult<()> {
        self.map.borrow_mut().attach(surface)?;
        Ok(())
    }

    /// Read both icons' metrics on a worker thread and wait for them
    pub fn load_icons<S: IconSource + 'static>(&mut self, icon_source: S) -> AppResult<LoadedIcons> {
        let marker = &self.config.marker;
        let load = IconLoad::begin(
            icon_source,
            marker.vehicle_icon.clone(),
            marker.north_indicator_icon.clone(),
        );
        let icons = load.wait()?;
        self.map.borrow_mut().set_icon_metrics(icons);
        self.icons = Some(icons);
        log::info!("Icon metrics loaded");
        Ok(icons)
    }

    /// Start fix emission; icons must be loaded first
    pub fn start(&mut self) -> AppResult<()> {
        if self.icons.is_none() {
            return Err(AppError::IconsNotLoaded);
        }
        if self.emission.is_some() {
            return Err(AppError::AlreadyStarted);
        }
        self.emission = Some(self.source.start(&mut self.scheduler)?);
        Ok(())
    }

    /// Cancel fix emission
    pub fn stop(&mut self) -> AppResult<()> {
        if let Some(task) = self.emission.take() {
            self.scheduler.cancel(&task)?;
            log::info!("Position source stopped");
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.emission.as_ref().map_or(false, |task| !task.is_cancelled())
    }

    /// Drive the scheduler up to `deadline_ms` on its clock
    pub fn run_until(&mut self, deadline_ms: u64) -> usize {
        self.scheduler.run_until(deadline_ms)
    }

    /// Drive the scheduler for at most `max_firings` task firings
    pub fn run(&mut self, max_firings: Option<u64>) -> u64 {
        self.scheduler.run(max_firings)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn map(&self) -> Ref<'_, MapPresentation> {
        self.map.borrow()
    }

    pub fn source(&self) -> &PositionSource {
        &self.source
    }

    pub fn subscription(&self) -> SubscriptionHandle {
        self.subscription
    }

    pub fn clock(&self) -> &C {
        self.scheduler.clock()
    }

    /// Fixes the map refused so far
    pub fn rejected_fixes(&self) -> u64 {
        self.rejected.get()
    }

    /// Applied fixes whose frame the surface failed to present
    pub fn surface_failures(&self) -> u64 {
        self.surface_failures.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{MemorySurface, RenderFrame, StaticIconSource};
    use crate::source::VirtualClock;
    use crate::utils::config::SourceConfig;
    use crate::validation::{IconError, SurfaceError};
    use approx::assert_relative_eq;

    fn icons() -> StaticIconSource {
        StaticIconSource::new().with_icon("assets/ownship.png", 50, 100)
    }

    /// Accepts the attachment frame, then fails every present
    struct BrokenPipeSurface {
        presented: u32,
    }

    impl DisplaySurface for BrokenPipeSurface {
        fn id(&self) -> &str {
            "pipe"
        }

        fn size_px(&self) -> (u32, u32) {
            (800, 600)
        }

        fn present(&mut self, _frame: &RenderFrame) -> Result<(), SurfaceError> {
            self.presented += 1;
            if self.presented > 1 {
                return Err(SurfaceError::Io {
                    surface_id: "pipe".to_string(),
                    message: "broken pipe".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_start_requires_icons() {
        let mut app = Application::new(AppConfig::default(), VirtualClock::new()).unwrap();
        assert_eq!(app.start(), Err(AppError::IconsNotLoaded));

        app.load_icons(icons()).unwrap();
        app.start().unwrap();
        assert_eq!(app.start(), Err(AppError::AlreadyStarted));
    }

    #[test]
    fn test_missing_icon_surfaces_error() {
        let mut app = Application::new(AppConfig::default(), VirtualClock::new()).unwrap();
        let err = app.load_icons(StaticIconSource::new()).unwrap_err();
        assert!(matches!(err, AppError::Icon(IconError::NotFound { .. })));
        assert!(app.start().is_err());
    }

    #[test]
    fn test_attach_missing_surface() {
        let mut app = Application::new(AppConfig::default(), VirtualClock::new()).unwrap();
        assert_eq!(app.attach(None), Err(AppError::Map(MapError::SurfaceMissing)));
    }

    #[test]
    fn test_end_to_end_with_virtual_clock() {
        let clock = VirtualClock::new();
        let mut app = Application::new(AppConfig::default(), clock.clone()).unwrap();
        let surface = MemorySurface::new("map", (1024, 768));
        let recorder = surface.recorder();

        app.attach(Some(Box::new(surface))).unwrap();
        app.load_icons(icons()).unwrap();
        app.start().unwrap();
        assert!(app.is_running());

        assert_eq!(app.run_until(3500), 3);
        assert_eq!(clock.now_ms(), 3500);
        // one frame on attachment, one per fix
        assert_eq!(recorder.len(), 4);

        let marker = recorder.last().unwrap().marker.unwrap();
        assert_eq!(marker.sequence, Some(2));
        assert_relative_eq!(marker.heading_rad, 0.2f64.to_radians(), epsilon = 1e-12);
        assert_relative_eq!(marker.styles[1].scale, 0.08, epsilon = 1e-12);

        app.stop().unwrap();
        assert!(!app.is_running());
        app.run_until(10_000);
        assert_eq!(recorder.len(), 4);
        assert_eq!(app.rejected_fixes(), 0);
    }

    #[test]
    fn test_rejected_fixes_do_not_stop_emission() {
        let config = AppConfig {
            source: SourceConfig {
                step_deg: 30.0,
                ..SourceConfig::default()
            },
            ..AppConfig::default()
        };
        let mut app = Application::new(config, VirtualClock::new()).unwrap();
        app.load_icons(icons()).unwrap();
        app.start().unwrap();

        // lat 43, 73, then 103 and beyond are out of range
        app.run_until(5000);
        assert_eq!(app.rejected_fixes(), 3);
        assert!(app.is_running());
        assert_eq!(app.map().validation_stats().accepted, 2);
        assert!(app.map().marker().position.is_some());
        assert_eq!(app.surface_failures(), 0);
    }

    #[test]
    fn test_surface_failures_counted_apart_from_rejections() {
        let mut app = Application::new(AppConfig::default(), VirtualClock::new()).unwrap();
        app.attach(Some(Box::new(BrokenPipeSurface { presented: 0 }))).unwrap();
        app.load_icons(icons()).unwrap();
        app.start().unwrap();

        app.run_until(3000);
        assert_eq!(app.rejected_fixes(), 0);
        assert_eq!(app.surface_failures(), 3);
        assert_eq!(app.map().validation_stats().accepted, 3);
        assert_eq!(app.map().last_frame().unwrap().marker.as_ref().unwrap().sequence, Some(2));
        assert!(app.is_running());
    }
}
