//! Presentation and telemetry sinks.
//!
//! The core decides *what* to show and *when* to report; sinks decide how.
//! Every call is fire-and-forget.

use crosswatch_core::Rect;
use log::{info, trace, warn};
use serde::Serialize;

use crate::detection::DetectionOutcome;
use crate::learning::LearningOutcome;
use crate::report::MatchReport;
use crate::session::CycleReport;

/// Height above a region at which its label is drawn.
const LABEL_LIFT: i32 = 15;
const CROSS_SIZE: i32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    /// Learning region.
    Yellow,
    /// Marker cross and unevaluated detection regions.
    Black,
    /// Matched region.
    Green,
    /// Region that did not match.
    Red,
}

pub trait PresentationSink {
    fn draw_rect(&mut self, rect: Rect, color: Color);
    fn draw_cross(&mut self, x: i32, y: i32, size: i32, color: Color);
    fn draw_label(&mut self, x: i32, y: i32, text: &str, color: Color);
    fn status(&mut self, message: &str);
    /// Operator-facing warning about a skipped cycle.
    fn advisory(&mut self, message: &str);
    fn report(&mut self, report: &MatchReport);
}

/// Sink that forwards everything to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl PresentationSink for LogSink {
    fn draw_rect(&mut self, rect: Rect, color: Color) {
        trace!("rect {rect:?} {color:?}");
    }

    fn draw_cross(&mut self, x: i32, y: i32, size: i32, color: Color) {
        trace!("cross ({x}, {y}) size {size} {color:?}");
    }

    fn draw_label(&mut self, x: i32, y: i32, text: &str, color: Color) {
        trace!("label {text:?} at ({x}, {y}) {color:?}");
    }

    fn status(&mut self, message: &str) {
        info!("{message}");
    }

    fn advisory(&mut self, message: &str) {
        warn!("{message}");
    }

    fn report(&mut self, report: &MatchReport) {
        info!(
            "target digit {} found in {} region (confidence {:.2})",
            report.label, report.region, report.confidence
        );
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SinkEvent {
    Rect { rect: Rect, color: Color },
    Cross { x: i32, y: i32, size: i32, color: Color },
    Label { x: i32, y: i32, text: String, color: Color },
    Status { message: String },
    Advisory { message: String },
    Report { report: MatchReport },
}

/// Sink that keeps every event in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn reports(&self) -> impl Iterator<Item = &MatchReport> {
        self.events.iter().filter_map(|e| match e {
            SinkEvent::Report { report } => Some(report),
            _ => None,
        })
    }

    pub fn advisories(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            SinkEvent::Advisory { message } => Some(message.as_str()),
            _ => None,
        })
    }
}

impl PresentationSink for RecordingSink {
    fn draw_rect(&mut self, rect: Rect, color: Color) {
        self.events.push(SinkEvent::Rect { rect, color });
    }

    fn draw_cross(&mut self, x: i32, y: i32, size: i32, color: Color) {
        self.events.push(SinkEvent::Cross { x, y, size, color });
    }

    fn draw_label(&mut self, x: i32, y: i32, text: &str, color: Color) {
        self.events.push(SinkEvent::Label {
            x,
            y,
            text: text.to_owned(),
            color,
        });
    }

    fn status(&mut self, message: &str) {
        self.events.push(SinkEvent::Status {
            message: message.to_owned(),
        });
    }

    fn advisory(&mut self, message: &str) {
        self.events.push(SinkEvent::Advisory {
            message: message.to_owned(),
        });
    }

    fn report(&mut self, report: &MatchReport) {
        self.events.push(SinkEvent::Report { report: *report });
    }
}

pub const LEARNING_PROMPT: &str = "place the digit to learn in the center of the view";
pub const EDGE_ADVISORY: &str = "red cross too close to the frame edge; skipping digit recognition";
pub const SMALL_FRAME_ADVISORY: &str = "frame too small for the learning region";

/// Translate one cycle into overlay, status and report calls.
pub fn present<P: PresentationSink + ?Sized>(cycle: &CycleReport, sink: &mut P) {
    match cycle {
        CycleReport::Learning { roi, outcome } => {
            sink.draw_rect(*roi, Color::Yellow);
            if let LearningOutcome::Confirmed(digit) = outcome {
                sink.status(&format!(
                    "learned digit {digit}; now looking for the red cross"
                ));
            }
        }
        CycleReport::LearningRegionInvalid { .. } => sink.advisory(SMALL_FRAME_ADVISORY),
        CycleReport::Detecting {
            outcome, reports, ..
        } => {
            if let Some(m) = outcome.marker() {
                sink.draw_cross(m.centroid_x, m.centroid_y, CROSS_SIZE, Color::Black);
            }
            match outcome {
                DetectionOutcome::NoMarker => {}
                DetectionOutcome::OutOfBounds { .. } => sink.advisory(EDGE_ADVISORY),
                DetectionOutcome::Classified {
                    regions, verdicts, ..
                } => {
                    for (_, rect) in regions.iter() {
                        sink.draw_rect(rect, Color::Black);
                    }
                    for v in verdicts {
                        if v.matched {
                            sink.draw_rect(v.rect, Color::Green);
                            sink.draw_label(
                                v.rect.x,
                                v.rect.y - LABEL_LIFT,
                                &v.label.to_string(),
                                Color::Green,
                            );
                        } else {
                            sink.draw_rect(v.rect, Color::Red);
                        }
                    }
                }
            }
            for r in reports {
                sink.report(r);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{Marker, RegionVerdict};
    use crate::roi::{DetectionRegions, RegionName};

    fn marker() -> Marker {
        Marker {
            centroid_x: 160,
            centroid_y: 100,
            area: 900,
        }
    }

    fn regions() -> DetectionRegions {
        DetectionRegions {
            left: Rect::new(85, 110, 70, 70),
            right: Rect::new(165, 110, 70, 70),
        }
    }

    #[test]
    fn out_of_bounds_emits_cross_and_advisory_only() {
        let mut sink = RecordingSink::default();
        let cycle = CycleReport::Detecting {
            target: 3,
            outcome: DetectionOutcome::OutOfBounds {
                marker: marker(),
                regions: regions(),
            },
            reports: Vec::new(),
        };
        present(&cycle, &mut sink);
        assert_eq!(sink.events.len(), 2);
        assert_eq!(sink.advisories().collect::<Vec<_>>(), vec![EDGE_ADVISORY]);
    }

    #[test]
    fn matched_region_is_drawn_green_with_label() {
        let mut sink = RecordingSink::default();
        let regions = regions();
        let verdicts = vec![
            RegionVerdict {
                region: RegionName::Left,
                rect: regions.left,
                matched: true,
                label: 3,
                confidence: 0.9,
            },
            RegionVerdict {
                region: RegionName::Right,
                rect: regions.right,
                matched: false,
                label: 5,
                confidence: 0.9,
            },
        ];
        let report = MatchReport {
            region: RegionName::Left,
            label: 3,
            confidence: 0.9,
            at_ms: 1200,
        };
        let cycle = CycleReport::Detecting {
            target: 3,
            outcome: DetectionOutcome::Classified {
                marker: marker(),
                regions,
                verdicts,
            },
            reports: vec![report],
        };
        present(&cycle, &mut sink);

        assert!(sink.events.contains(&SinkEvent::Rect {
            rect: regions.left,
            color: Color::Green
        }));
        assert!(sink.events.contains(&SinkEvent::Label {
            x: 85,
            y: 95,
            text: "3".into(),
            color: Color::Green
        }));
        assert!(sink.events.contains(&SinkEvent::Rect {
            rect: regions.right,
            color: Color::Red
        }));
        assert_eq!(sink.reports().count(), 1);
    }

    #[test]
    fn confirmation_emits_status() {
        let mut sink = RecordingSink::default();
        let cycle = CycleReport::Learning {
            roi: Rect::new(110, 90, 100, 100),
            outcome: LearningOutcome::Confirmed(7),
        };
        present(&cycle, &mut sink);
        assert!(matches!(
            &sink.events[1],
            SinkEvent::Status { message } if message.contains('7')
        ));
    }
}
