use std::cell::RefCell;
use std::thread_local;

pub mod easing;
pub mod resize;
pub mod sections;
pub mod spark;

use easing::Easing;
use resize::{ResizeDebouncer, Size};
use sections::{ActiveSection, SectionTracker};
use spark::{FrameScheduler, Point, RenderSurface, Segment, SparkConfig, SparkEngine};

/// x1, y1, x2, y2, alpha
pub const SEGMENT_STRIDE: usize = 5;

thread_local! {
    static SITE: RefCell<Option<SiteEffects>> = RefCell::new(None);
}

/// Records what the host page has to do with `requestAnimationFrame`.
#[derive(Default)]
struct HostFrames {
    requested: bool,
    cancelled: bool,
}

impl FrameScheduler for HostFrames {
    fn request_frame(&mut self) {
        self.requested = true;
        self.cancelled = false;
    }

    fn cancel_frame(&mut self) {
        self.requested = false;
        self.cancelled = true;
    }
}

impl HostFrames {
    fn take_requested(&mut self) -> u32 {
        std::mem::take(&mut self.requested) as u32
    }

    fn take_cancelled(&mut self) -> u32 {
        std::mem::take(&mut self.cancelled) as u32
    }
}

/// Flat segment list the host strokes onto its 2D context.
#[derive(Default)]
struct SegmentBuffer {
    data: Vec<f32>,
    color: u32,
}

impl RenderSurface for SegmentBuffer {
    fn clear(&mut self) {
        self.data.clear();
    }

    fn draw_segment(&mut self, segment: &Segment, color: u32) {
        self.color = color;
        self.data.extend_from_slice(&[
            segment.from.x,
            segment.from.y,
            segment.to.x,
            segment.to.y,
            segment.alpha,
        ]);
    }
}

struct SiteEffects {
    engine: SparkEngine,
    frames: HostFrames,
    render: SegmentBuffer,
    resize: ResizeDebouncer,
    tracker: SectionTracker,
}

impl SiteEffects {
    fn new(width: f32, height: f32) -> Self {
        let mut resize = ResizeDebouncer::default();
        resize.mount(Size::new(width, height));
        Self {
            engine: SparkEngine::default(),
            frames: HostFrames::default(),
            render: SegmentBuffer::default(),
            resize,
            tracker: SectionTracker::default(),
        }
    }

    fn surface_size(&self) -> Size {
        self.resize.current().unwrap_or(Size::new(0.0, 0.0))
    }

    fn active_index(&self) -> i32 {
        match self.tracker.active() {
            ActiveSection::None => -1,
            ActiveSection::Section(id) => self
                .tracker
                .index_of(id)
                .map(|index| index as i32)
                .unwrap_or(-1),
        }
    }
}

fn with_site<F, R>(default: R, mut f: F) -> R
where
    F: FnMut(&mut SiteEffects) -> R,
{
    SITE.with(|cell| {
        let mut borrow = cell.borrow_mut();
        if let Some(site) = borrow.as_mut() {
            f(site)
        } else {
            default
        }
    })
}

#[no_mangle]
pub extern "C" fn site_init(width: f32, height: f32) {
    SITE.with(|cell| {
        *cell.borrow_mut() = Some(SiteEffects::new(width.max(0.0), height.max(0.0)));
    });
}

/// Returns 1 when the host must cancel its pending animation frame.
#[no_mangle]
pub extern "C" fn site_unmount() -> u32 {
    SITE.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let Some(site) = borrow.as_mut() else {
            return 0;
        };
        site.engine.unmount(&mut site.frames);
        site.resize.unmount();
        let cancelled = site.frames.take_cancelled();
        *borrow = None;
        cancelled
    })
}

#[no_mangle]
pub extern "C" fn spark_configure(
    color: u32,
    size: f32,
    radius: f32,
    count: u32,
    duration_ms: f64,
    easing: u32,
) {
    with_site((), |site| {
        site.engine.set_config(SparkConfig {
            color,
            size,
            radius,
            count,
            duration_ms,
            easing: Easing::from_code(easing),
        })
    });
}

/// Click inside the wrapped region. Returns 1 when the host must request a
/// frame.
#[no_mangle]
pub extern "C" fn spark_click(x: f32, y: f32, now: f64) -> u32 {
    with_site(0, |site| {
        site.engine.trigger(Point::new(x, y), now, &mut site.frames);
        site.frames.take_requested()
    })
}

/// Frame callback. `surface_ready` is 0 when the canvas or its 2D context
/// is unavailable. Returns 1 when another frame must be requested.
#[no_mangle]
pub extern "C" fn spark_frame(now: f64, surface_ready: u32) -> u32 {
    with_site(0, |site| {
        let surface = (surface_ready != 0).then_some(&mut site.render);
        site.engine.frame(now, surface, &mut site.frames);
        site.frames.take_requested()
    })
}

#[no_mangle]
pub extern "C" fn spark_segments_ptr() -> *const f32 {
    with_site(std::ptr::null(), |site| site.render.data.as_ptr())
}

/// Number of floats in the segment buffer, a multiple of `SEGMENT_STRIDE`.
#[no_mangle]
pub extern "C" fn spark_segments_len() -> u32 {
    with_site(0, |site| site.render.data.len() as u32)
}

#[no_mangle]
pub extern "C" fn spark_color() -> u32 {
    with_site(0, |site| site.render.color)
}

#[no_mangle]
pub extern "C" fn spark_active_count() -> u32 {
    with_site(0, |site| site.engine.active_count() as u32)
}

/// ResizeObserver notification. Returns the time at which the host should
/// call `resize_poll`.
#[no_mangle]
pub extern "C" fn resize_observe(width: f32, height: f32, now: f64) -> f64 {
    with_site(0.0, |site| site.resize.observe(Size::new(width, height), now))
}

/// Returns 1 when a new canvas size was committed.
#[no_mangle]
pub extern "C" fn resize_poll(now: f64) -> u32 {
    with_site(0, |site| site.resize.poll(now).is_some() as u32)
}

#[no_mangle]
pub extern "C" fn surface_width() -> f32 {
    with_site(0.0, |site| site.surface_size().width)
}

#[no_mangle]
pub extern "C" fn surface_height() -> f32 {
    with_site(0.0, |site| site.surface_size().height)
}

/// Measured bounds of the section at `index` in `sections::SITE_SECTIONS`.
#[no_mangle]
pub extern "C" fn section_bounds(index: u32, top: f32, height: f32) -> u32 {
    with_site(0, |site| {
        site.tracker.set_bounds(index as usize, top, height) as u32
    })
}

/// Returns 1 when the host must request a frame for the section check.
#[no_mangle]
pub extern "C" fn section_scroll() -> u32 {
    with_site(0, |site| site.tracker.on_scroll() as u32)
}

/// Returns 1 when the active section changed.
#[no_mangle]
pub extern "C" fn section_frame(scroll_y: f32) -> u32 {
    with_site(0, |site| site.tracker.on_frame(scroll_y).is_some() as u32)
}

#[no_mangle]
pub extern "C" fn section_refresh(scroll_y: f32) -> u32 {
    with_site(0, |site| site.tracker.refresh(scroll_y).is_some() as u32)
}

/// Index of the highlighted section, -1 for none.
#[no_mangle]
pub extern "C" fn section_active() -> i32 {
    with_site(-1, |site| site.active_index())
}

#[no_mangle]
pub extern "C" fn section_anchor_target(index: u32) -> f32 {
    with_site(0.0, |site| {
        site.tracker
            .anchor_target(index as usize)
            .unwrap_or(0.0)
            .max(0.0)
    })
}

#[no_mangle]
pub extern "C" fn scroll_progress(
    scroll_y: f32,
    document_height: f32,
    viewport_height: f32,
) -> f32 {
    sections::scroll_progress(scroll_y, document_height, viewport_height)
}
