//! Frame statistics
//!
//! A read-only snapshot refreshed at the end of every `render_all`. GPU times
//! and primitive counts come from the device's timer queries and lag by as
//! many frames as the device buffers its results.

use std::fmt;
use std::time::Duration;

use crate::render::api::TimerRegion;

/// Primitives generated per timed region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassPrimitives {
    counts: [u64; TimerRegion::ALL.len()],
}

impl PassPrimitives {
    /// Primitives generated inside one region
    pub const fn get(&self, region: TimerRegion) -> u64 {
        self.counts[region.index()]
    }

    /// Primitives generated over the whole frame
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub(crate) fn set(&mut self, region: TimerRegion, count: u64) {
        self.counts[region.index()] = count;
    }
}

/// Live and drawn entity counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    /// Live meshes
    pub meshes: usize,
    /// Live textures
    pub textures: usize,
    /// Live objects
    pub objects: usize,
    /// Live cameras, including the starting camera
    pub cameras: usize,
    /// Live cone lights
    pub cone_lights: usize,
    /// Live point lights
    pub point_lights: usize,
    /// Live texts
    pub texts: usize,
    /// Live flat meshes
    pub flat_meshes: usize,
    /// Live UI elements
    pub ui_elements: usize,
    /// Objects drawn in the last frame
    pub objects_rendered: usize,
    /// Texts drawn in the last frame
    pub texts_rendered: usize,
    /// UI elements drawn in the last frame
    pub ui_elements_rendered: usize,
}

/// Statistics of the last rendered frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Frames rendered since initialization
    pub frames: u64,
    /// CPU time of the whole frame
    pub frame_time: Duration,
    /// CPU time of garbage collection since the previous frame
    pub gc_time: Duration,
    /// Entities removed by garbage collection since the previous frame
    pub collected: usize,
    /// Shader program switches
    pub program_switches: usize,
    /// Primitive counts per region
    pub primitives: PassPrimitives,
    /// Entity counts
    pub counts: EntityCounts,
    region_times: [Duration; TimerRegion::ALL.len()],
    frame_closed: bool,
}

impl Statistics {
    /// GPU time of one region
    pub const fn region_time(&self, region: TimerRegion) -> Duration {
        self.region_times[region.index()]
    }

    /// Add one collection pass; the first pass after a finished frame
    /// starts a fresh tally
    pub(crate) fn record_collection(&mut self, collected: usize, elapsed: Duration) {
        if self.frame_closed {
            self.collected = 0;
            self.gc_time = Duration::ZERO;
            self.frame_closed = false;
        }
        self.collected += collected;
        self.gc_time += elapsed;
    }

    pub(crate) fn close_frame(&mut self, frame_time: Duration) {
        self.frames += 1;
        self.frame_time = frame_time;
        self.frame_closed = true;
    }

    pub(crate) fn set_region_time(&mut self, region: TimerRegion, elapsed: Duration) {
        self.region_times[region.index()] = elapsed;
    }

    /// Sum of every region's GPU time
    pub fn gpu_time(&self) -> Duration {
        self.region_times.iter().sum()
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "frame {}: {:.3} ms cpu, {:.3} ms gpu, gc {:.3} ms ({} collected)",
            self.frames,
            self.frame_time.as_secs_f64() * 1000.0,
            self.gpu_time().as_secs_f64() * 1000.0,
            self.gc_time.as_secs_f64() * 1000.0,
            self.collected,
        )?;
        for region in TimerRegion::ALL {
            writeln!(
                f,
                "  {:<12} {:>8.3} ms {:>8} prims",
                region.name(),
                self.region_time(region).as_secs_f64() * 1000.0,
                self.primitives.get(region),
            )?;
        }
        write!(
            f,
            "  objects {}/{}, texts {}/{}, ui {}/{}, program switches {}",
            self.counts.objects_rendered,
            self.counts.objects,
            self.counts.texts_rendered,
            self.counts.texts,
            self.counts.ui_elements_rendered,
            self.counts.ui_elements,
            self.program_switches,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_tables() {
        let mut stats = Statistics::default();
        stats.set_region_time(TimerRegion::Lighting, Duration::from_millis(2));
        stats.set_region_time(TimerRegion::Overlay, Duration::from_millis(1));
        stats.primitives.set(TimerRegion::Geometry, 12);
        stats.primitives.set(TimerRegion::Overlay, 2);

        assert_eq!(stats.region_time(TimerRegion::Lighting), Duration::from_millis(2));
        assert_eq!(stats.gpu_time(), Duration::from_millis(3));
        assert_eq!(stats.primitives.total(), 14);
        assert!(stats.to_string().contains("text/ui"));
    }

    #[test]
    fn test_collections_add_up_until_frame_closes() {
        let mut stats = Statistics::default();
        stats.record_collection(2, Duration::from_millis(1));
        stats.record_collection(1, Duration::from_millis(1));
        assert_eq!(stats.collected, 3);
        assert_eq!(stats.gc_time, Duration::from_millis(2));

        stats.close_frame(Duration::from_millis(5));
        assert_eq!(stats.collected, 3);

        stats.record_collection(0, Duration::ZERO);
        assert_eq!(stats.collected, 0);
        assert_eq!(stats.gc_time, Duration::ZERO);
        assert_eq!(stats.frames, 1);
    }
}
