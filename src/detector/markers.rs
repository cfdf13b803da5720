use serde::Serialize;

/// Per-row frame start marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "x", rename_all = "camelCase")]
pub enum Marker {
    /// No frame starts on this row.
    #[default]
    None,
    /// A frame starts here and its content begins at this x offset.
    Registered(usize),
    /// A frame starts here but the perforation edge could not be located.
    Unregistered,
}

impl Marker {
    #[inline]
    pub fn is_frame_start(&self) -> bool {
        !matches!(self, Marker::None)
    }

    #[inline]
    pub fn x_offset(&self) -> Option<usize> {
        match self {
            Marker::Registered(x) => Some(*x),
            _ => None,
        }
    }
}

/// One [`Marker`] per strip row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkerArray {
    rows: Vec<Marker>,
}

impl MarkerArray {
    pub fn new(height: usize) -> Self {
        Self {
            rows: vec![Marker::None; height],
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Reset every row to [`Marker::None`].
    pub fn clear(&mut self) {
        self.rows.fill(Marker::None);
    }

    #[inline]
    pub fn get(&self, row: usize) -> Marker {
        self.rows.get(row).copied().unwrap_or_default()
    }

    /// Rows past the end are ignored.
    #[inline]
    pub fn set(&mut self, row: usize, marker: Marker) {
        if let Some(slot) = self.rows.get_mut(row) {
            *slot = marker;
        }
    }

    /// First frame start at or after `from`.
    pub fn next_frame_start(&self, from: usize) -> Option<(usize, Marker)> {
        self.rows
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, m)| m.is_frame_start())
            .map(|(row, m)| (row, *m))
    }

    pub fn frame_starts(&self) -> impl Iterator<Item = (usize, Marker)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_frame_start())
            .map(|(row, m)| (row, *m))
    }

    pub fn count(&self) -> usize {
        self.frame_starts().count()
    }

    /// Largest registered x offset, `0` when nothing was registered.
    pub fn max_x_offset(&self) -> usize {
        self.rows
            .iter()
            .filter_map(Marker::x_offset)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_zero_is_distinct_from_unset() {
        let mut markers = MarkerArray::new(10);
        markers.set(3, Marker::Registered(0));
        assert_eq!(markers.next_frame_start(0), Some((3, Marker::Registered(0))));
        assert_eq!(markers.get(2), Marker::None);
    }

    #[test]
    fn walk_and_max_offset() {
        let mut markers = MarkerArray::new(10);
        markers.set(2, Marker::Registered(40));
        markers.set(5, Marker::Unregistered);
        markers.set(8, Marker::Registered(45));
        markers.set(99, Marker::Registered(500));
        assert_eq!(markers.count(), 3);
        assert_eq!(markers.next_frame_start(3), Some((5, Marker::Unregistered)));
        assert_eq!(markers.next_frame_start(9), None);
        assert_eq!(markers.max_x_offset(), 45);
        markers.clear();
        assert_eq!(markers.count(), 0);
    }
}
