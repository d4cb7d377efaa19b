use crate::Point;

/// Ordered receiver (sensor) locations of a survey.
#[derive(Debug, Clone, Default)]
pub struct ReceiverSet {
    points: Vec<Point>,
}

impl ReceiverSet {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
