use std::collections::VecDeque;
use std::time::Duration;

use crate::event::{Key, ViewerEvent};
use crate::hmd::HmdSession;

/// Receives every event the viewer processes, in order, followed by one
/// `Frame` event per frame. Returning `true` hides the event from the
/// handlers registered after this one.
pub trait EventHandler<S> {
    fn handle(&mut self, event: &ViewerEvent, session: &mut S) -> bool;
}

const FRAME_HISTORY_SIZE: usize = 120; // 2 seconds at 60fps

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingStats {
    pub average_frame_time_ms: f32,
    pub fps: f32,
    pub max_frame_time_ms: f32,
    pub min_frame_time_ms: f32,
    pub slow_frames: u32,
}

/// Rolling frame statistics, toggled with `s`.
pub struct StatsHandler {
    frame_times: VecDeque<f64>,
    last_frame_time: Option<f64>,
    last_report: f64,
    report_interval: f64,
    target_frame_time: f64,
    reporting: bool,
}

impl StatsHandler {
    pub fn new(target_fps: u32) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(FRAME_HISTORY_SIZE),
            last_frame_time: None,
            last_report: 0.0,
            report_interval: Duration::from_secs(1).as_secs_f64(),
            target_frame_time: 1.0 / target_fps.max(1) as f64,
            reporting: false,
        }
    }

    pub fn is_reporting(&self) -> bool {
        self.reporting
    }

    pub fn record_frame(&mut self, time: f64) {
        if let Some(last) = self.last_frame_time {
            if self.frame_times.len() >= FRAME_HISTORY_SIZE {
                self.frame_times.pop_front();
            }
            self.frame_times.push_back((time - last).max(0.0));
        }
        self.last_frame_time = Some(time);
    }

    pub fn stats(&self) -> Option<TimingStats> {
        if self.frame_times.is_empty() {
            return None;
        }
        let count = self.frame_times.len() as f64;
        let total: f64 = self.frame_times.iter().sum();
        let average = total / count;
        let max = self.frame_times.iter().copied().fold(0.0, f64::max);
        let min = self.frame_times.iter().copied().fold(f64::MAX, f64::min);
        let slow_frames = self
            .frame_times
            .iter()
            .filter(|&&t| t > self.target_frame_time)
            .count() as u32;

        Some(TimingStats {
            average_frame_time_ms: (average * 1000.0) as f32,
            fps: if average > 0.0 { (1.0 / average) as f32 } else { 0.0 },
            max_frame_time_ms: (max * 1000.0) as f32,
            min_frame_time_ms: (min * 1000.0) as f32,
            slow_frames,
        })
    }
}

impl<S> EventHandler<S> for StatsHandler {
    fn handle(&mut self, event: &ViewerEvent, _session: &mut S) -> bool {
        match event {
            ViewerEvent::KeyDown(Key::Char('s')) => {
                self.reporting = !self.reporting;
                log::info!("Frame statistics {}", if self.reporting { "on" } else { "off" });
                true
            }
            ViewerEvent::Frame { time, .. } => {
                self.record_frame(*time);
                if self.reporting && time - self.last_report >= self.report_interval {
                    self.last_report = *time;
                    if let Some(stats) = self.stats() {
                        log::info!(
                            "{:.1} fps, {:.2} ms avg ({:.2}-{:.2}), {} slow",
                            stats.fps,
                            stats.average_frame_time_ms,
                            stats.min_frame_time_ms,
                            stats.max_frame_time_ms,
                            stats.slow_frames
                        );
                    }
                }
                false
            }
            _ => false,
        }
    }
}

/// HMD key bindings: `r` recenters the tracking origin.
#[derive(Debug, Default)]
pub struct HmdEventHandler;

impl<S: HmdSession> EventHandler<S> for HmdEventHandler {
    fn handle(&mut self, event: &ViewerEvent, session: &mut S) -> bool {
        match event {
            ViewerEvent::KeyDown(Key::Char('r')) => {
                session.reset_sensor_orientation();
                true
            }
            _ => false,
        }
    }
}
