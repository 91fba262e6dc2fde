//! Icon metrics loading
//!
//! The styler needs each icon's natural pixel size before it can compute a
//! true-size scale. Metrics are read on a worker thread and the result is
//! collected by the event loop through a channel.

use crate::utils::config::IconConfig;
use crate::validation::IconError;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

/// Natural pixel size of an icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IconMetrics {
    pub width: u32,
    pub height: u32,
}

impl IconMetrics {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Something that can report an icon's natural size
pub trait IconSource: Send {
    /// Read the natural size of the asset at `src`
    fn read_metrics(&self, src: &str) -> Result<IconMetrics, IconError>;
}

/// Resolve an icon's metrics, preferring a size declared in configuration
pub fn icon_metrics(source: &dyn IconSource, icon: &IconConfig) -> Result<IconMetrics, IconError> {
    let metrics = match icon.natural_size_px {
        Some((width, height)) => IconMetrics::new(width, height),
        None => source.read_metrics(&icon.src)?,
    };
    if metrics.is_degenerate() {
        return Err(IconError::Degenerate {
            src: icon.src.clone(),
            width: metrics.width,
            height: metrics.height,
        });
    }
    Ok(metrics)
}

/// Reads raster icon headers from disk
#[derive(Debug, Clone)]
pub struct FileIconSource {
    root: PathBuf,
}

impl FileIconSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl IconSource for FileIconSource {
    fn read_metrics(&self, src: &str) -> Result<IconMetrics, IconError> {
        let path = self.root.join(src);
        if !path.is_file() {
            return Err(IconError::NotFound { src: src.to_string() });
        }

        let is_vector = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("svg"));
        if is_vector {
            return Err(IconError::Unsupported { src: src.to_string() });
        }

        let (width, height) = image::image_dimensions(&path).map_err(|e| IconError::Decode {
            src: src.to_string(),
            message: e.to_string(),
        })?;
        log::debug!("Icon {} is {}x{} px", path.display(), width, height);
        Ok(IconMetrics::new(width, height))
    }
}

/// Fixed icon sizes, for tests and embedded assets
#[derive(Debug, Clone, Default)]
pub struct StaticIconSource {
    metrics: HashMap<String, IconMetrics>,
}

impl StaticIconSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_icon(mut self, src: &str, width: u32, height: u32) -> Self {
        self.metrics.insert(src.to_string(), IconMetrics::new(width, height));
        self
    }
}

impl IconSource for StaticIconSource {
    fn read_metrics(&self, src: &str) -> Result<IconMetrics, IconError> {
        self.metrics
            .get(src)
            .copied()
            .ok_or_else(|| IconError::NotFound { src: src.to_string() })
    }
}

/// Metrics for both marker icons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadedIcons {
    pub vehicle: IconMetrics,
    pub north_indicator: IconMetrics,
}

/// Icon metrics being read on a worker thread
pub struct IconLoad {
    receiver: mpsc::Receiver<Result<LoadedIcons, IconError>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl IconLoad {
    /// Start reading both icons' metrics in the background
    pub fn begin<S: IconSource + 'static>(source: S, vehicle: IconConfig, north_indicator: IconConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let result = icon_metrics(&source, &vehicle).and_then(|vehicle| {
                icon_metrics(&source, &north_indicator).map(|north_indicator| LoadedIcons {
                    vehicle,
                    north_indicator,
                })
            });
            // The receiver may have been dropped; nothing to report to then
            let _ = tx.send(result);
        });

        Self {
            receiver: rx,
            handle: Some(handle),
        }
    }

    /// Result if the worker has finished, without blocking
    pub fn try_take(&mut self) -> Option<Result<LoadedIcons, IconError>> {
        match self.receiver.try_recv() {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(IconError::LoaderDisconnected)),
        }
    }

    /// Block until the worker reports
    pub fn wait(mut self) -> Result<LoadedIcons, IconError> {
        let result = self.receiver.recv().map_err(|_| IconError::LoaderDisconnected)?;
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
