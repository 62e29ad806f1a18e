//! Exposure compression
//!
//! Folds a run of damage rectangles into at most two. Each new rectangle is
//! merged wherever it grows the covered area the least: into the first
//! rectangle, into the second, or by collapsing all three into one.

use crate::events::Rectangle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposeCompressor {
    first: Rectangle,
    second: Option<Rectangle>,
    merged: usize,
}

/// Result of a compression run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compressed {
    One(Rectangle),
    Two(Rectangle, Rectangle),
}

impl ExposeCompressor {
    pub fn new(area: Rectangle) -> Self {
        Self {
            first: area,
            second: None,
            merged: 0,
        }
    }

    /// Number of rectangles added after the initial one
    pub fn merged(&self) -> usize {
        self.merged
    }

    pub fn add(&mut self, rect: Rectangle) {
        self.merged += 1;
        let Some(second) = self.second else {
            self.second = Some(rect);
            return;
        };
        let first = self.first;

        let grow_first = first.union(&rect);
        let grow_second = second.union(&rect);
        let all = grow_first.union(&second);

        let cost_first = grow_first.area() + second.area();
        let cost_second = first.area() + grow_second.area();
        let cost_all = all.area();

        if cost_first < cost_second {
            if cost_first < cost_all {
                self.first = grow_first;
            } else {
                self.collapse(all);
            }
        } else if cost_second < cost_all {
            self.second = Some(grow_second);
        } else {
            self.collapse(all);
        }
    }

    fn collapse(&mut self, rect: Rectangle) {
        self.first = rect;
        self.second = None;
    }

    /// Final rectangles. Two rectangles whose bounding box is less than
    /// twice their combined area are reported as that bounding box.
    pub fn finish(self) -> Compressed {
        match self.second {
            None => Compressed::One(self.first),
            Some(second) => {
                let union = self.first.union(&second);
                if union.area() < 2 * (self.first.area() + second.area()) {
                    Compressed::One(union)
                } else {
                    Compressed::Two(self.first, second)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_to_merge() {
        let area = Rectangle::new(5, 5, 20, 10);
        let compressor = ExposeCompressor::new(area);
        assert_eq!(compressor.merged(), 0);
        assert_eq!(compressor.finish(), Compressed::One(area));
    }

    #[test]
    fn test_adjacent_rectangles_collapse() {
        let mut compressor = ExposeCompressor::new(Rectangle::new(0, 0, 10, 10));
        compressor.add(Rectangle::new(10, 0, 10, 10));
        assert_eq!(compressor.finish(), Compressed::One(Rectangle::new(0, 0, 20, 10)));
    }

    #[test]
    fn test_distant_rectangles_stay_apart() {
        let a = Rectangle::new(0, 0, 10, 10);
        let b = Rectangle::new(500, 500, 10, 10);
        let mut compressor = ExposeCompressor::new(a);
        compressor.add(b);
        assert_eq!(compressor.finish(), Compressed::Two(a, b));
    }

    #[test]
    fn test_third_rectangle_joins_cheapest_neighbour() {
        let a = Rectangle::new(0, 0, 10, 10);
        let b = Rectangle::new(500, 500, 10, 10);
        let mut compressor = ExposeCompressor::new(a);
        compressor.add(b);
        compressor.add(Rectangle::new(505, 510, 10, 10));
        assert_eq!(compressor.merged(), 2);
        assert_eq!(
            compressor.finish(),
            Compressed::Two(a, Rectangle::new(500, 500, 15, 20))
        );
    }

    #[test]
    fn test_overlapping_run_becomes_one() {
        let mut compressor = ExposeCompressor::new(Rectangle::new(0, 0, 50, 50));
        for i in 1..5 {
            compressor.add(Rectangle::new(i * 10, i * 10, 50, 50));
        }
        assert_eq!(compressor.finish(), Compressed::One(Rectangle::new(0, 0, 90, 90)));
    }
}
