//! # Scroll-Trigger Sensor
//!
//! Watches a sentinel placed right after the last loaded row of a pane and
//! signals "near end" when it scrolls into view.
//!
//! ```text
//!  row 0      ┐
//!  ...        │ loaded items
//!  row n-1    ┘
//!  sentinel     <- fires when at least `threshold` of it is inside the viewport
//! ```
//!
//! The sensor is edge-triggered: it fires on a hidden-to-visible transition
//! and re-arms as soon as the sentinel leaves the viewport. It also re-arms
//! when the list grows while the sentinel stays on screen, otherwise a page
//! too short to push the sentinel out would stall pagination. Each fire is
//! meant to map to exactly one `request_next_page()`; duplicate suppression
//! is the pane's job, not the sensor's.

/// Default fraction of the sentinel that must be visible
pub const DEFAULT_THRESHOLD: f32 = 0.1;

/// The visible window over a pane's rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Index of the first visible row
    pub offset: usize,
    /// Number of rows that fit on screen
    pub height: usize,
    /// Number of loaded rows (the sentinel starts here)
    pub content_len: usize,
}

#[derive(Debug, Clone)]
pub struct ScrollSensor {
    threshold: f32,
    sentinel_rows: usize,
    was_visible: bool,
    fired_at_len: Option<usize>,
}

impl Default for ScrollSensor {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl ScrollSensor {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(f32::EPSILON, 1.0),
            sentinel_rows: 1,
            was_visible: false,
            fired_at_len: None,
        }
    }

    /// Sentinel taller than one row (e.g. a multi-line "loading" footer)
    pub fn with_sentinel_rows(mut self, rows: usize) -> Self {
        self.sentinel_rows = rows.max(1);
        self
    }

    /// Fraction of the sentinel inside the viewport, `0.0..=1.0`
    pub fn visibility(&self, viewport: Viewport) -> f32 {
        let sentinel_start = viewport.content_len;
        let sentinel_end = sentinel_start + self.sentinel_rows;
        let view_start = viewport.offset;
        let view_end = viewport.offset + viewport.height;

        let overlap = sentinel_end
            .min(view_end)
            .saturating_sub(sentinel_start.max(view_start));
        overlap as f32 / self.sentinel_rows as f32
    }

    /// Feed the latest viewport; returns `true` when a near-end signal fires.
    pub fn observe(&mut self, viewport: Viewport) -> bool {
        let visible = viewport.height > 0 && self.visibility(viewport) >= self.threshold;
        let grew = self.fired_at_len != Some(viewport.content_len);
        let fire = visible && (!self.was_visible || grew);

        self.was_visible = visible;
        if fire {
            self.fired_at_len = Some(viewport.content_len);
        }
        fire
    }

    /// Forget history, e.g. after the pane was reset by a filter change.
    pub fn reset(&mut self) {
        self.was_visible = false;
        self.fired_at_len = None;
    }
}
