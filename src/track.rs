// src/track.rs
//
// Per-boundary temporal state. One LineTrack per lane boundary lives for
// the whole video: it records whether the latest frame was trusted, keeps
// the most recent fit, and smooths over a bounded history of accepted fits.

use std::collections::VecDeque;

use crate::curve::Curve2;

#[derive(Debug)]
pub struct LineTrack {
    detected: bool,
    current: Option<Curve2>,
    history: VecDeque<Curve2>,
    capacity: usize,
}

impl LineTrack {
    /// Create an undetected track with an empty history of the given
    /// capacity. Capacity is clamped to at least one entry.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            detected: false,
            current: None,
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Whether the most recent frame's fit was accepted.
    pub fn detected(&self) -> bool {
        self.detected
    }

    /// Latest accepted curve, or the first-ever candidate when nothing has
    /// been accepted yet.
    pub fn current(&self) -> Option<&Curve2> {
        self.current.as_ref()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Record a sanity-accepted candidate.
    ///
    /// A fitted curve becomes the current fit and joins the history,
    /// evicting the oldest entry when full. An unfit curve leaves the track
    /// undetected; it is kept as `current` only when no curve exists at all,
    /// so rendering always has something to fall back on.
    pub fn accept(&mut self, candidate: Curve2) {
        self.detected = candidate.is_fitted();
        if !self.detected {
            if self.current.is_none() {
                self.current = Some(candidate);
            }
            return;
        }

        self.current = Some(candidate);
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(candidate);
    }

    /// Record a sanity-rejected candidate: the track goes undetected and
    /// the history is left untouched. Until a first fit has been accepted,
    /// the rejected candidate still becomes the fallback `current` so a
    /// curve is always available for rendering.
    pub fn reject(&mut self, candidate: Curve2) {
        self.detected = false;
        if self.history.is_empty() {
            self.current = Some(candidate);
        }
    }

    /// Coefficient-wise mean of the history; falls back to the current fit
    /// (or `Unfit`) when the history is empty.
    pub fn smoothed(&self) -> Curve2 {
        if self.history.is_empty() {
            return self.current.unwrap_or(Curve2::Unfit);
        }

        let mut sum = (0.0, 0.0, 0.0);
        for curve in &self.history {
            // Only fitted curves are ever pushed
            if let Some((a, b, c)) = curve.coefficients() {
                sum.0 += a;
                sum.1 += b;
                sum.2 += c;
            }
        }
        let n = self.history.len() as f64;
        Curve2::Fitted {
            a: sum.0 / n,
            b: sum.1 / n,
            c: sum.2 / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted(a: f64, b: f64, c: f64) -> Curve2 {
        Curve2::Fitted { a, b, c }
    }

    #[test]
    fn test_history_is_bounded_fifo() {
        let mut track = LineTrack::new(3);
        for i in 0..5 {
            track.accept(fitted(0.0, 0.0, i as f64));
        }
        assert_eq!(track.history_len(), 3);

        // Oldest entries (c = 0, 1) were evicted: the mean is (2+3+4)/3
        let (_, _, c) = track.smoothed().coefficients().unwrap();
        assert!((c - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_smoothing_identical_curves_is_exact() {
        let mut track = LineTrack::new(5);
        let curve = fitted(2e-4, -0.3, 412.0);
        for _ in 0..5 {
            track.accept(curve);
        }
        assert_eq!(track.smoothed(), curve);
    }

    #[test]
    fn test_reject_keeps_history_and_clears_detected() {
        let mut track = LineTrack::new(5);
        track.accept(fitted(0.0, 0.0, 100.0));
        assert!(track.detected());

        track.reject(fitted(0.0, 0.0, 900.0));
        assert!(!track.detected());
        assert_eq!(track.history_len(), 1);

        // The bad fit did not pollute smoothing
        let (_, _, c) = track.smoothed().coefficients().unwrap();
        assert!((c - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejected_candidate_seeds_rendering_before_first_acceptance() {
        let mut track = LineTrack::new(5);
        assert_eq!(track.smoothed(), Curve2::Unfit);

        track.reject(fitted(0.0, 0.0, 55.0));
        assert!(!track.detected());
        // Nothing accepted yet, so the freshest candidate is what renders
        let (_, _, c) = track.smoothed().coefficients().unwrap();
        assert!((c - 55.0).abs() < 1e-12);
    }

    #[test]
    fn test_unfit_acceptance_is_recorded_but_not_pushed() {
        let mut track = LineTrack::new(5);
        track.accept(Curve2::Unfit);
        assert!(!track.detected());
        assert_eq!(track.history_len(), 0);
        assert_eq!(track.smoothed(), Curve2::Unfit);
    }
}
