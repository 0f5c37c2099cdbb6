//! Rising/falling edge detection over a stable boolean.
//!
//! Each edge is exactly one `update` call wide. The first call primes the
//! tracker and reports no edges.

#[derive(Debug, Clone, Copy, Default)]
pub struct Edges {
    pub just_activated: bool,
    pub just_deactivated: bool,
}

#[derive(Debug)]
pub struct EdgeTracker {
    previous: bool,
    has_previous: bool,
    edges: Edges,
}

impl EdgeTracker {
    pub fn new() -> Self {
        Self {
            previous: false,
            has_previous: false,
            edges: Edges::default(),
        }
    }

    pub fn update(&mut self, current: bool) -> Edges {
        if !self.has_previous {
            self.has_previous = true;
            self.previous = current;
            self.edges = Edges::default();
            return self.edges;
        }

        self.edges = Edges {
            just_activated: !self.previous && current,
            just_deactivated: self.previous && !current,
        };
        self.previous = current;
        self.edges
    }

    /// Edges from the most recent `update`.
    pub fn edges(&self) -> Edges {
        self.edges
    }
}

impl Default for EdgeTracker {
    fn default() -> Self {
        Self::new()
    }
}
