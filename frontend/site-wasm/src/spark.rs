use crate::easing::Easing;
use std::f32::consts::PI;

const DEFAULT_COLOR: u32 = 0xFFFF_FFFF;
const DEFAULT_SIZE: f32 = 10.0;
const DEFAULT_RADIUS: f32 = 15.0;
const DEFAULT_COUNT: u32 = 8;
const DEFAULT_DURATION_MS: f64 = 400.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline(always)]
    fn offset(self, distance: f32, cos: f32, sin: f32) -> Self {
        Self {
            x: self.x + distance * cos,
            y: self.y + distance * sin,
        }
    }
}

/// One line particle of a burst. Position is never stored, it is derived
/// from the time elapsed since `start_time`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spark {
    origin: Point,
    angle: f32,
    start_time: f64,
}

impl Spark {
    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    #[inline(always)]
    fn elapsed(&self, now: f64) -> f64 {
        now - self.start_time
    }

    #[inline(always)]
    fn is_expired(&self, now: f64, duration_ms: f64) -> bool {
        self.elapsed(now) >= duration_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparkConfig {
    /// 0xRRGGBBAA
    pub color: u32,
    pub size: f32,
    pub radius: f32,
    pub count: u32,
    pub duration_ms: f64,
    pub easing: Easing,
}

impl Default for SparkConfig {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR,
            size: DEFAULT_SIZE,
            radius: DEFAULT_RADIUS,
            count: DEFAULT_COUNT,
            duration_ms: DEFAULT_DURATION_MS,
            easing: Easing::default(),
        }
    }
}

/// Geometry of one spark for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub alpha: f32,
}

/// Where a frame is drawn. The whole surface is cleared before every frame.
pub trait RenderSurface {
    fn clear(&mut self);
    fn draw_segment(&mut self, segment: &Segment, color: u32);
}

/// Next-display-frame scheduling, `requestAnimationFrame` in the browser.
pub trait FrameScheduler {
    fn request_frame(&mut self);
    fn cancel_frame(&mut self);
}

pub struct SparkEngine {
    config: SparkConfig,
    sparks: Vec<Spark>,
    segments: Vec<Segment>,
    // at most one frame chain per engine
    running: bool,
}

impl Default for SparkEngine {
    fn default() -> Self {
        Self::new(SparkConfig::default())
    }
}

impl SparkEngine {
    pub fn new(config: SparkConfig) -> Self {
        Self {
            config,
            sparks: Vec::new(),
            segments: Vec::new(),
            running: false,
        }
    }

    pub fn set_config(&mut self, config: SparkConfig) {
        self.config = config;
    }

    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn active_count(&self) -> usize {
        self.sparks.len()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Appends a burst at `origin` and makes sure a frame chain is running.
    /// Bursts are never rejected and the active set has no upper bound.
    pub fn trigger<S: FrameScheduler>(&mut self, origin: Point, now: f64, scheduler: &mut S) {
        let count = self.config.count;
        if count == 0 {
            return;
        }
        self.sparks.extend((0..count).map(|i| Spark {
            origin,
            angle: 2.0 * PI * i as f32 / count as f32,
            start_time: now,
        }));

        if !self.running {
            self.running = true;
            scheduler.request_frame();
        }
    }

    /// Advances every spark to `now`: retires expired ones and rebuilds the
    /// segment list for the survivors. Returns whether more frames are needed.
    pub fn tick(&mut self, now: f64) -> bool {
        let SparkConfig {
            size,
            radius,
            duration_ms,
            easing,
            ..
        } = self.config;

        self.segments.clear();
        let segments = &mut self.segments;
        self.sparks.retain(|spark| {
            if spark.is_expired(now, duration_ms) {
                return false;
            }
            segments.push(segment_at(spark, spark.elapsed(now), size, radius, duration_ms, easing));
            true
        });

        !self.sparks.is_empty()
    }

    /// Frame callback. An unavailable surface skips the drawing only; the
    /// chain keeps going and the next frame retries.
    pub fn frame<R, S>(&mut self, now: f64, surface: Option<&mut R>, scheduler: &mut S) -> bool
    where
        R: RenderSurface,
        S: FrameScheduler,
    {
        if !self.running {
            return false;
        }

        let more = self.tick(now);
        if let Some(surface) = surface {
            surface.clear();
            for segment in &self.segments {
                surface.draw_segment(segment, self.config.color);
            }
        }

        if more {
            scheduler.request_frame();
        } else {
            self.running = false;
        }
        more
    }

    /// Owner view is going away: drop the pending frame and all sparks.
    pub fn unmount<S: FrameScheduler>(&mut self, scheduler: &mut S) {
        if self.running {
            scheduler.cancel_frame();
            self.running = false;
        }
        self.sparks.clear();
        self.segments.clear();
    }
}

fn segment_at(
    spark: &Spark,
    elapsed: f64,
    size: f32,
    radius: f32,
    duration_ms: f64,
    easing: Easing,
) -> Segment {
    let progress = if duration_ms > 0.0 {
        (elapsed / duration_ms).clamp(0.0, 1.0) as f32
    } else {
        1.0
    };
    let eased = easing.apply(progress);
    let distance = eased * radius;
    let length = size * (1.0 - eased);
    let (sin, cos) = spark.angle.sin_cos();

    Segment {
        from: spark.origin.offset(distance, cos, sin),
        to: spark.origin.offset(distance + length, cos, sin),
        alpha: 1.0 - eased,
    }
}
