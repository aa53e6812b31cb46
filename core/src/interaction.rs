//! Click-outside detection.
//!
//! Components register the regions they occupy while mounted and unregister
//! on teardown. The host routes every pointer press through
//! [`OutsideClickListeners::dispatch`], which reports the listeners the press
//! landed outside of.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open on the right and bottom edges.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Default)]
pub struct OutsideClickListeners {
    next_id: u64,
    listeners: Vec<(ListenerId, Vec<Region>)>,
}

impl OutsideClickListeners {
    pub fn register(&mut self, regions: Vec<Region>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, regions));
        tracing::trace!(?id, "registered outside-click listener");
        id
    }

    /// Replace the regions of a registered listener, e.g. after the popup
    /// moved. Returns `false` for unknown ids.
    pub fn set_regions(&mut self, id: ListenerId, regions: Vec<Region>) -> bool {
        match self.listeners.iter_mut().find(|(lid, _)| *lid == id) {
            Some((_, current)) => {
                *current = regions;
                true
            }
            None => false,
        }
    }

    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        let removed = self.listeners.len() != before;
        if removed {
            tracing::trace!(?id, "unregistered outside-click listener");
        }
        removed
    }

    pub fn is_registered(&self, id: ListenerId) -> bool {
        self.listeners.iter().any(|(lid, _)| *lid == id)
    }

    /// Listeners none of whose regions contain `point`.
    pub fn dispatch(&self, point: Point) -> Vec<ListenerId> {
        self.listeners
            .iter()
            .filter(|(_, regions)| !regions.iter().any(|r| r.contains(point)))
            .map(|(id, _)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn point(x: f32, y: f32) -> Point {
        Point { x, y }
    }

    #[test]
    fn region_contains_is_half_open() {
        let region = Region::new(2.0, 3.0, 4.0, 2.0);
        assert!(region.contains(point(2.0, 3.0)));
        assert!(region.contains(point(5.9, 4.9)));
        assert!(!region.contains(point(6.0, 3.0)));
        assert!(!region.contains(point(2.0, 5.0)));
        assert!(!region.contains(point(1.9, 3.0)));
    }

    #[test]
    fn dispatch_reports_only_listeners_clicked_outside() {
        let mut listeners = OutsideClickListeners::default();
        let input = Region::new(0.0, 0.0, 10.0, 3.0);
        let popup = Region::new(2.0, 3.0, 8.0, 4.0);
        let composer = listeners.register(vec![input, popup]);
        let other = listeners.register(vec![Region::new(20.0, 0.0, 5.0, 5.0)]);

        assert_eq!(listeners.dispatch(point(1.0, 1.0)), vec![other]);
        assert_eq!(listeners.dispatch(point(3.0, 4.0)), vec![other]);
        assert_eq!(listeners.dispatch(point(21.0, 1.0)), vec![composer]);
        assert_eq!(listeners.dispatch(point(15.0, 15.0)), vec![composer, other]);
    }

    #[test]
    fn unregistered_listeners_are_not_notified() {
        let mut listeners = OutsideClickListeners::default();
        let id = listeners.register(vec![]);
        assert!(listeners.is_registered(id));
        assert!(listeners.unregister(id));
        assert!(!listeners.unregister(id));
        assert!(listeners.dispatch(point(0.0, 0.0)).is_empty());
        assert!(!listeners.set_regions(id, vec![]));
    }

    #[test]
    fn regions_can_be_updated() {
        let mut listeners = OutsideClickListeners::default();
        let id = listeners.register(vec![Region::new(0.0, 0.0, 1.0, 1.0)]);
        assert_eq!(listeners.dispatch(point(5.0, 5.0)), vec![id]);

        assert!(listeners.set_regions(id, vec![Region::new(4.0, 4.0, 2.0, 2.0)]));
        assert!(listeners.dispatch(point(5.0, 5.0)).is_empty());
    }
}
