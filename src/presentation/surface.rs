//! Display surfaces the map presents frames to

use crate::presentation::frame::RenderFrame;
use crate::validation::SurfaceError;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Destination for rendered frames
pub trait DisplaySurface {
    /// Identifier used in logs and errors
    fn id(&self) -> &str;

    /// Pixel size of the drawable area
    fn size_px(&self) -> (u32, u32);

    /// Show a frame
    fn present(&mut self, frame: &RenderFrame) -> Result<(), SurfaceError>;
}

/// Shared view onto the frames a `MemorySurface` received
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    frames: Rc<RefCell<Vec<RenderFrame>>>,
}

impl FrameRecorder {
    pub fn len(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.borrow().is_empty()
    }

    pub fn last(&self) -> Option<RenderFrame> {
        self.frames.borrow().last().cloned()
    }

    pub fn frames(&self) -> Vec<RenderFrame> {
        self.frames.borrow().clone()
    }
}

/// In-memory surface that records every frame
#[derive(Debug)]
pub struct MemorySurface {
    id: String,
    size_px: (u32, u32),
    recorder: FrameRecorder,
    closed: bool,
}

impl MemorySurface {
    pub fn new(id: &str, size_px: (u32, u32)) -> Self {
        Self {
            id: id.to_string(),
            size_px,
            recorder: FrameRecorder::default(),
            closed: false,
        }
    }

    /// Handle that stays valid after the surface is boxed and attached
    pub fn recorder(&self) -> FrameRecorder {
        self.recorder.clone()
    }

    /// Refuse further frames
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl DisplaySurface for MemorySurface {
    fn id(&self) -> &str {
        &self.id
    }

    fn size_px(&self) -> (u32, u32) {
        self.size_px
    }

    fn present(&mut self, frame: &RenderFrame) -> Result<(), SurfaceError> {
        if self.closed {
            return Err(SurfaceError::Closed {
                surface_id: self.id.clone(),
            });
        }
        self.recorder.frames.borrow_mut().push(frame.clone());
        Ok(())
    }
}

/// Writes each frame as one line of JSON
pub struct JsonLinesSurface<W: Write> {
    id: String,
    size_px: (u32, u32),
    writer: W,
}

impl<W: Write> JsonLinesSurface<W> {
    pub fn new(id: &str, size_px: (u32, u32), writer: W) -> Self {
        Self {
            id: id.to_string(),
            size_px,
            writer,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn io_error(&self, e: std::io::Error) -> SurfaceError {
        SurfaceError::Io {
            surface_id: self.id.clone(),
            message: e.to_string(),
        }
    }
}

impl<W: Write> DisplaySurface for JsonLinesSurface<W> {
    fn id(&self) -> &str {
        &self.id
    }

    fn size_px(&self) -> (u32, u32) {
        self.size_px
    }

    fn present(&mut self, frame: &RenderFrame) -> Result<(), SurfaceError> {
        let line = serde_json::to_string(frame).map_err(|e| SurfaceError::Serialization {
            message: e.to_string(),
        })?;
        writeln!(self.writer, "{}", line).map_err(|e| self.io_error(e))?;
        self.writer.flush().map_err(|e| self.io_error(e))
    }
}
