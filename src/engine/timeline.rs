//! Scene-owned clock for timers and property tweens.
//!
//! A scene steps its timeline once per frame and receives every event that
//! fell due inside that frame, in time order:
//!
//! ```ignore
//! let until = self.timeline.now() + delta;
//! while let Some(event) = self.timeline.next_event(until, &mut self.stage) {
//!     self.on_event(event);
//! }
//! ```
//!
//! The clock sits at the firing instant while an event is handled, so a
//! follow-up scheduled from the handler is timed from that instant and not
//! from the frame boundary.

use super::stage::{NodeId, Property, Stage};
use std::cmp::Ordering;

/// Cancellation handle for a timer or a tween
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Handle(u64);

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// decelerating quadratic, 1 - (1 - t)^2
    #[default]
    QuadOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

/// Builder for a tween of one node towards target property values
#[derive(Debug, Clone)]
pub struct TweenSpec<E> {
    target: NodeId,
    to: Vec<(Property, f64)>,
    duration: f64,
    easing: Easing,
    on_complete: Option<E>,
}

impl<E> TweenSpec<E> {
    pub fn to(target: NodeId) -> Self {
        TweenSpec {
            target,
            to: Vec::new(),
            duration: 0.0,
            easing: Easing::default(),
            on_complete: None,
        }
    }

    pub fn x(self, value: f64) -> Self {
        self.property(Property::X, value)
    }

    pub fn y(self, value: f64) -> Self {
        self.property(Property::Y, value)
    }

    pub fn alpha(self, value: f64) -> Self {
        self.property(Property::Alpha, value)
    }

    pub fn scale(self, value: f64) -> Self {
        self.property(Property::Scale, value)
    }

    pub fn property(mut self, property: Property, value: f64) -> Self {
        self.to.push((property, value));
        self
    }

    /// milliseconds
    pub fn duration(mut self, duration: f64) -> Self {
        self.duration = duration.max(0.0);
        self
    }

    pub fn ease(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn on_complete(mut self, event: E) -> Self {
        self.on_complete = Some(event);
        self
    }
}

#[derive(Debug)]
struct Timer<E> {
    handle: Handle,
    seq: u64,
    deadline: f64,
    repeat: Option<f64>,
    event: E,
}

#[derive(Debug)]
struct Channel {
    property: Property,
    from: f64,
    to: f64,
}

#[derive(Debug)]
struct Tween<E> {
    handle: Handle,
    seq: u64,
    target: NodeId,
    channels: Vec<Channel>,
    start: f64,
    duration: f64,
    easing: Easing,
    on_complete: Option<E>,
}

impl<E> Tween<E> {
    fn end(&self) -> f64 {
        self.start + self.duration
    }

    fn progress(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            1.0
        } else {
            ((now - self.start) / self.duration).clamp(0.0, 1.0)
        }
    }
}

enum Due {
    Timer(Handle),
    Tween(Handle),
}

// shortest interval a recurring timer may use
const MIN_INTERVAL: f64 = 1.0;

#[derive(Debug)]
pub struct Timeline<E> {
    now: f64,
    next_id: u64,
    timers: Vec<Timer<E>>,
    tweens: Vec<Tween<E>>,
}

impl<E> Default for Timeline<E> {
    fn default() -> Self {
        Timeline {
            now: 0.0,
            next_id: 0,
            timers: Vec::new(),
            tweens: Vec::new(),
        }
    }
}

impl<E: Clone> Timeline<E> {
    pub fn new() -> Self {
        Timeline::default()
    }

    /// milliseconds since the timeline was created
    pub fn now(&self) -> f64 {
        self.now
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// One-shot `event` after `delay` milliseconds
    pub fn after(&mut self, delay: f64, event: E) -> Handle {
        self.schedule(delay.max(0.0), None, event)
    }

    /// Recurring `event` every `interval` milliseconds, first firing one
    /// interval from now
    pub fn every(&mut self, interval: f64, event: E) -> Handle {
        let interval = interval.max(MIN_INTERVAL);
        self.schedule(interval, Some(interval), event)
    }

    fn schedule(&mut self, delay: f64, repeat: Option<f64>, event: E) -> Handle {
        let id = self.next_id();
        let handle = Handle(id);
        self.timers.push(Timer {
            handle,
            seq: id,
            deadline: self.now + delay,
            repeat,
            event,
        });
        handle
    }

    /// Start a tween, `from` values are read from `stage` right now
    pub fn tween(&mut self, stage: &Stage, spec: TweenSpec<E>) -> Handle {
        let id = self.next_id();
        let handle = Handle(id);
        let node = stage.get(spec.target);
        let channels = spec
            .to
            .into_iter()
            .map(|(property, to)| Channel {
                property,
                from: node.map(|node| node.property(property)).unwrap_or(to),
                to,
            })
            .collect();
        self.tweens.push(Tween {
            handle,
            seq: id,
            target: spec.target,
            channels,
            start: self.now,
            duration: spec.duration,
            easing: spec.easing,
            on_complete: spec.on_complete,
        });
        handle
    }

    /// Cancel a timer or tween; a cancelled tween leaves its node where it is
    pub fn cancel(&mut self, handle: Handle) -> bool {
        let before = self.timers.len() + self.tweens.len();
        self.timers.retain(|timer| timer.handle != handle);
        self.tweens.retain(|tween| tween.handle != handle);
        before != self.timers.len() + self.tweens.len()
    }

    pub fn kill_tweens_of(&mut self, target: NodeId) {
        self.tweens.retain(|tween| tween.target != target);
    }

    /// Cancel every timer and tween
    pub fn clear(&mut self) {
        self.timers.clear();
        self.tweens.clear();
    }

    pub fn is_pending(&self, handle: Handle) -> bool {
        self.timers.iter().any(|timer| timer.handle == handle)
            || self.tweens.iter().any(|tween| tween.handle == handle)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn active_tweens(&self) -> usize {
        self.tweens.len()
    }

    /// Pop the earliest event due at or before `until`, moving the clock to
    /// its instant and applying tweens to `stage`. With nothing due the
    /// clock moves to `until` and `None` is returned.
    pub fn next_event(&mut self, until: f64, stage: &mut Stage) -> Option<E> {
        let Some((at, due)) = self.earliest_due(until) else {
            self.now = self.now.max(until);
            self.apply(stage);
            return None;
        };

        self.now = self.now.max(at);
        self.apply(stage);

        match due {
            Due::Timer(handle) => {
                let index = self.timers.iter().position(|timer| timer.handle == handle)?;
                match self.timers[index].repeat {
                    Some(interval) => {
                        let next_seq = self.next_id();
                        let timer = &mut self.timers[index];
                        timer.deadline += interval;
                        timer.seq = next_seq;
                        Some(timer.event.clone())
                    }
                    None => Some(self.timers.remove(index).event),
                }
            }
            Due::Tween(handle) => {
                let index = self.tweens.iter().position(|tween| tween.handle == handle)?;
                self.tweens.remove(index).on_complete
            }
        }
    }

    fn earliest_due(&self, until: f64) -> Option<(f64, Due)> {
        let by_time = |a: &(f64, u64), b: &(f64, u64)| -> Ordering {
            a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
        };

        let timer = self
            .timers
            .iter()
            .filter(|timer| timer.deadline <= until)
            .map(|timer| ((timer.deadline, timer.seq), Due::Timer(timer.handle)))
            .min_by(|a, b| by_time(&a.0, &b.0));

        let tween = self
            .tweens
            .iter()
            .filter(|tween| tween.on_complete.is_some() && tween.end() <= until)
            .map(|tween| ((tween.end(), tween.seq), Due::Tween(tween.handle)))
            .min_by(|a, b| by_time(&a.0, &b.0));

        match (timer, tween) {
            (Some(timer), Some(tween)) => {
                if by_time(&timer.0, &tween.0) == Ordering::Greater {
                    Some((tween.0 .0, tween.1))
                } else {
                    Some((timer.0 .0, timer.1))
                }
            }
            (Some((key, due)), None) | (None, Some((key, due))) => Some((key.0, due)),
            (None, None) => None,
        }
    }

    /// Write every tween's value at `now`; finished tweens without a
    /// completion event are dropped, the others wait for `next_event`
    fn apply(&mut self, stage: &mut Stage) {
        let now = self.now;
        for tween in &self.tweens {
            let eased = tween.easing.apply(tween.progress(now));
            if let Some(node) = stage.get_mut(tween.target) {
                for channel in &tween.channels {
                    let value = channel.from + (channel.to - channel.from) * eased;
                    node.set_property(channel.property, value);
                }
            }
        }
        self.tweens
            .retain(|tween| tween.on_complete.is_some() || tween.end() > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stage::Node;
    use crate::engine::Point;
    use approx::assert_relative_eq;

    #[derive(Debug, Clone, PartialEq)]
    enum Tick {
        Once(&'static str),
        Every,
        Done,
    }

    fn drain(timeline: &mut Timeline<Tick>, stage: &mut Stage, until: f64) -> Vec<(f64, Tick)> {
        let mut fired = Vec::new();
        while let Some(event) = timeline.next_event(until, stage) {
            fired.push((timeline.now(), event));
        }
        fired
    }

    #[test]
    fn events_fire_in_time_order_at_their_instant() {
        let mut stage = Stage::new();
        let mut timeline = Timeline::new();
        timeline.after(300.0, Tick::Once("late"));
        timeline.after(100.0, Tick::Once("early"));
        timeline.every(150.0, Tick::Every);

        let fired = drain(&mut timeline, &mut stage, 320.0);

        assert_eq!(
            fired,
            vec![
                (100.0, Tick::Once("early")),
                (150.0, Tick::Every),
                // rescheduled at 150, after "late" was scheduled
                (300.0, Tick::Once("late")),
                (300.0, Tick::Every),
            ]
        );
        assert_eq!(timeline.now(), 320.0);
        assert_eq!(timeline.pending_timers(), 1);
    }

    #[test]
    fn equal_deadlines_fire_in_scheduling_order() {
        let mut stage = Stage::new();
        let mut timeline = Timeline::new();
        timeline.after(50.0, Tick::Once("first"));
        timeline.after(50.0, Tick::Once("second"));

        let fired = drain(&mut timeline, &mut stage, 50.0);

        assert_eq!(
            fired,
            vec![(50.0, Tick::Once("first")), (50.0, Tick::Once("second"))]
        );
    }

    #[test]
    fn follow_up_is_timed_from_the_firing_instant() {
        let mut stage = Stage::new();
        let mut timeline = Timeline::new();
        timeline.after(10.0, Tick::Once("a"));

        // one coarse frame
        assert_eq!(timeline.next_event(1000.0, &mut stage), Some(Tick::Once("a")));
        timeline.after(500.0, Tick::Once("b"));

        assert_eq!(timeline.next_event(1000.0, &mut stage), Some(Tick::Once("b")));
        assert_eq!(timeline.now(), 510.0);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut stage = Stage::new();
        let mut timeline = Timeline::new();
        let handle = timeline.every(100.0, Tick::Every);
        assert!(timeline.is_pending(handle));

        assert!(timeline.cancel(handle));
        assert!(!timeline.cancel(handle));

        assert!(drain(&mut timeline, &mut stage, 1000.0).is_empty());
    }

    #[test]
    fn tween_interpolates_and_reports_completion() {
        let mut stage = Stage::new();
        let node = stage.add(Node::sprite("card").at(Point::new(0.0, 0.0)));
        let mut timeline = Timeline::new();
        timeline.tween(
            &stage,
            TweenSpec::to(node)
                .x(100.0)
                .alpha(0.0)
                .duration(1000.0)
                .ease(Easing::Linear)
                .on_complete(Tick::Done),
        );

        assert_eq!(timeline.next_event(500.0, &mut stage), None);
        let halfway = stage.get(node).map(|node| node.position.x).unwrap_or_default();
        assert_relative_eq!(halfway, 50.0);

        assert_eq!(timeline.next_event(2000.0, &mut stage), Some(Tick::Done));
        assert_eq!(timeline.now(), 1000.0);
        let node = stage.get(node).cloned().unwrap_or_else(|| Node::sprite(""));
        assert_relative_eq!(node.position.x, 100.0);
        assert_relative_eq!(node.alpha, 0.0);
        assert_eq!(timeline.active_tweens(), 0);
    }

    #[test]
    fn finished_tween_without_event_is_dropped() {
        let mut stage = Stage::new();
        let node = stage.add(Node::sprite("avatar").transparent());
        let mut timeline: Timeline<Tick> = Timeline::new();
        timeline.tween(&stage, TweenSpec::to(node).alpha(1.0).duration(300.0));

        assert_eq!(timeline.next_event(400.0, &mut stage), None);

        assert_eq!(timeline.active_tweens(), 0);
        assert_eq!(stage.get(node).map(|node| node.alpha), Some(1.0));
    }

    #[test]
    fn killed_tween_freezes_node() {
        let mut stage = Stage::new();
        let node = stage.add(Node::sprite("card"));
        let mut timeline = Timeline::new();
        timeline.tween(
            &stage,
            TweenSpec::to(node)
                .x(100.0)
                .duration(100.0)
                .ease(Easing::Linear)
                .on_complete(Tick::Done),
        );
        timeline.next_event(50.0, &mut stage);

        timeline.kill_tweens_of(node);

        assert!(drain(&mut timeline, &mut stage, 500.0).is_empty());
        assert_eq!(stage.get(node).map(|node| node.position.x), Some(50.0));
    }

    #[test]
    fn quad_out_decelerates() {
        assert_relative_eq!(Easing::QuadOut.apply(0.0), 0.0);
        assert_relative_eq!(Easing::QuadOut.apply(0.5), 0.75);
        assert_relative_eq!(Easing::QuadOut.apply(1.0), 1.0);
        assert_relative_eq!(Easing::Linear.apply(2.0), 1.0);
    }
}
