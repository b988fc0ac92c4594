//! Engine-wide defaults. Keeping the magic numbers in one place makes them
//! easier to tune.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Delay before a low-priority render fires.
pub const LOW_PRIORITY_RENDER_DELAY_MS: u64 = 80;

/// Maximum number of image fetches in flight at once.
pub const MAX_FETCH_CONCURRENCY: usize = 20;

/// Cached images unused for this long become eligible for eviction.
pub const IMAGE_RETENTION_MS: u64 = 10_000;

/// Minimum interval between two eviction sweeps.
pub const CACHE_SWEEP_INTERVAL_MS: u64 = 1_000;

/// Images used within this window before the previous render are never evicted.
pub const RENDER_GRACE_MS: u64 = 1_000;

/// A failed source is not requested again until this much time has passed.
pub const FETCH_FAILURE_BACKOFF_MS: u64 = 5_000;

/// Fallback hit-test box for markers whose icon size is unknown.
pub const DEFAULT_MARKER_HIT_SIZE: f64 = 32.0;

/// Allowed epsilon when snapping zoom levels.
pub const ZOOM_SNAP_EPSILON: f64 = 1e-9;

/// Pointer travel in CSS pixels before a press turns into a pan.
pub const DRAG_THRESHOLD: f64 = 4.0;

/// Inertia samples older than this are discarded (10 frames at 60fps).
pub const INERTIA_WINDOW_MS: u64 = 160;
pub const INERTIA_MAX_SPEED: f64 = 1400.0;
pub const INERTIA_LINEARITY: f64 = 0.3;
pub const INERTIA_CENTER_DECELERATION: f64 = 4000.0;
pub const INERTIA_ZOOM_DECELERATION: f64 = 20.0;

/// Browsers report physical wheel notches as multiples of this value.
pub const WHEEL_DELTA_STEP: f64 = 4.000_244_140_625;

/// Pixel multiplier for wheel events reported in lines.
pub const WHEEL_LINE_HEIGHT: f64 = 40.0;

pub const WHEEL_ZOOM_RATE: f64 = 1.0 / 450.0;
pub const TRACKPAD_ZOOM_RATE: f64 = 1.0 / 100.0;
pub const WHEEL_EASE_MS: u64 = 200;
pub const TRACKPAD_EASE_MS: u64 = 100;

/// Ambiguous first scroll events are held back this long before classification.
pub const SCROLL_CLASSIFY_DELAY_MS: u64 = 40;

/// Scroll sequences separated by more than this are classified from scratch.
pub const SCROLL_IDLE_MS: u64 = 400;

pub const CLICK_ZOOM_DURATION_MS: u64 = 500;
pub const DEFAULT_EASE_DURATION_MS: u64 = 300;
