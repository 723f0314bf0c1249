//! Non-repeating audio track rotation
//!
//! Each category walks its track list in order and wraps around, so two
//! consecutive picks in a category with more than one track never repeat.

use crate::domain::types::{TrackCatalog, TrackCategory, TrackId};

/// Rotation cursor over one category's tracks
#[derive(Debug, Clone)]
struct Rotation {
    tracks: Vec<TrackId>,
    last_index: Option<usize>,
}

impl Rotation {
    fn advance(&mut self) -> TrackId {
        let next = match self.last_index {
            None => 0,
            Some(last) => (last + 1) % self.tracks.len(),
        };
        self.last_index = Some(next);
        self.tracks[next]
    }
}

pub struct AudioTrackSelector {
    rotations: [Rotation; TrackCategory::COUNT],
}

impl AudioTrackSelector {
    /// The catalog guarantees every category is non-empty
    pub fn new(catalog: &TrackCatalog) -> Self {
        let rotations = TrackCategory::ALL.map(|category| Rotation {
            tracks: catalog.tracks(category).to_vec(),
            last_index: None,
        });
        Self { rotations }
    }

    /// Pick the next track in `category`
    pub fn pick(&mut self, category: TrackCategory) -> TrackId {
        self.rotations[category.index()].advance()
    }

    /// Index of the most recent pick, `None` before the first one
    pub fn last_index(&self, category: TrackCategory) -> Option<usize> {
        self.rotations[category.index()].last_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(greeting: &[i64], non_sequitur: &[i64]) -> TrackCatalog {
        let congratulation: Vec<i64> = (22..=39).collect();
        TrackCatalog::new(greeting, non_sequitur, &[11, 12], &congratulation).unwrap()
    }

    fn ids(tracks: &[TrackId]) -> Vec<u8> {
        tracks.iter().map(|t| t.get()).collect()
    }

    #[test]
    fn test_first_pick_is_first_track() {
        let mut selector = AudioTrackSelector::new(&catalog(&[1], &[2, 3]));
        assert_eq!(selector.last_index(TrackCategory::Congratulation), None);
        assert_eq!(selector.pick(TrackCategory::Congratulation).get(), 22);
        assert_eq!(selector.last_index(TrackCategory::Congratulation), Some(0));
        assert_eq!(selector.pick(TrackCategory::Congratulation).get(), 23);
    }

    #[test]
    fn test_full_pass_equals_list_order() {
        let list: Vec<i64> = (2..=10).collect();
        let cat = catalog(&[1], &list);
        let mut selector = AudioTrackSelector::new(&cat);

        let picks: Vec<TrackId> =
            (0..list.len()).map(|_| selector.pick(TrackCategory::NonSequitur)).collect();
        assert_eq!(ids(&picks), ids(cat.tracks(TrackCategory::NonSequitur)));
    }

    #[test]
    fn test_five_non_sequiturs() {
        let list: Vec<i64> = (2..=10).collect();
        let mut selector = AudioTrackSelector::new(&catalog(&[1], &list));
        let picks: Vec<TrackId> =
            (0..5).map(|_| selector.pick(TrackCategory::NonSequitur)).collect();
        assert_eq!(ids(&picks), vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_wraps_around_without_adjacent_repeats() {
        let mut selector = AudioTrackSelector::new(&catalog(&[1], &[4, 5, 6]));
        let picks: Vec<TrackId> =
            (0..10).map(|_| selector.pick(TrackCategory::NonSequitur)).collect();

        assert_eq!(ids(&picks), vec![4, 5, 6, 4, 5, 6, 4, 5, 6, 4]);
        assert!(picks.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn test_two_track_category_alternates() {
        let mut selector = AudioTrackSelector::new(&catalog(&[1], &[7, 8]));
        let picks: Vec<TrackId> =
            (0..4).map(|_| selector.pick(TrackCategory::NonSequitur)).collect();
        assert_eq!(ids(&picks), vec![7, 8, 7, 8]);
    }

    #[test]
    fn test_single_track_category_repeats() {
        let mut selector = AudioTrackSelector::new(&catalog(&[1], &[2, 3]));
        for _ in 0..5 {
            assert_eq!(selector.pick(TrackCategory::Greeting).get(), 1);
        }
        assert_eq!(selector.last_index(TrackCategory::Greeting), Some(0));
    }

    #[test]
    fn test_categories_rotate_independently() {
        let mut selector = AudioTrackSelector::new(&catalog(&[1], &[2, 3, 4]));
        assert_eq!(selector.pick(TrackCategory::NonSequitur).get(), 2);
        assert_eq!(selector.pick(TrackCategory::Taunt).get(), 11);
        assert_eq!(selector.pick(TrackCategory::NonSequitur).get(), 3);
        assert_eq!(selector.pick(TrackCategory::Taunt).get(), 12);
        assert_eq!(selector.pick(TrackCategory::Taunt).get(), 11);
    }
}
