use anyhow::{Result, ensure};
use serde::Deserialize;

/// Viewport width breakpoints and the column count used at each.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ColumnBreakpoints {
    /// Widths at or above this use `medium` columns.
    pub medium_min_width: f32,
    /// Widths at or above this use `wide` columns.
    pub wide_min_width: f32,
    /// Widths at or above this use `extra_wide` columns.
    pub extra_wide_min_width: f32,
    pub narrow: usize,
    pub medium: usize,
    pub wide: usize,
    pub extra_wide: usize,
}

impl Default for ColumnBreakpoints {
    fn default() -> Self {
        Self {
            medium_min_width: 640.0,
            wide_min_width: 1024.0,
            extra_wide_min_width: 1536.0,
            narrow: 2,
            medium: 4,
            wide: 5,
            extra_wide: 7,
        }
    }
}

impl ColumnBreakpoints {
    /// Column count for a viewport width; `None` means the width is not
    /// known yet and a single column is used.
    pub fn column_count(&self, width: Option<f32>) -> usize {
        let Some(width) = width.filter(|w| w.is_finite()) else {
            return 1;
        };
        let count = if width >= self.extra_wide_min_width {
            self.extra_wide
        } else if width >= self.wide_min_width {
            self.wide
        } else if width >= self.medium_min_width {
            self.medium
        } else {
            self.narrow
        };
        count.max(1)
    }

    /// Responsive `sizes` hint handed to the image element.
    pub fn sizes_hint(&self) -> String {
        let vw = |columns: usize| 100 / columns.max(1);
        format!(
            "(max-width: {}px) {}vw, (max-width: {}px) {}vw, (max-width: {}px) {}vw, {}vw",
            self.medium_min_width - 1.0,
            vw(self.narrow),
            self.wide_min_width - 1.0,
            vw(self.medium),
            self.extra_wide_min_width - 1.0,
            vw(self.wide),
            vw(self.extra_wide),
        )
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(
            self.medium_min_width > 0.0
                && self.medium_min_width < self.wide_min_width
                && self.wide_min_width < self.extra_wide_min_width,
            "columns breakpoints must be positive and strictly increasing"
        );
        ensure!(
            [self.narrow, self.medium, self.wide, self.extra_wide]
                .iter()
                .all(|&c| c >= 1),
            "columns counts must be at least 1"
        );
        Ok(())
    }
}

/// Deals `items` round-robin into `columns` columns: item `j` lands in
/// column `j % columns`, relative order preserved.
pub fn partition<T: Clone>(items: &[T], columns: usize) -> Vec<Vec<T>> {
    let columns = columns.max(1);
    let mut out: Vec<Vec<T>> = (0..columns)
        .map(|_| Vec::with_capacity(items.len() / columns + 1))
        .collect();
    for (j, item) in items.iter().enumerate() {
        out[j % columns].push(item.clone());
    }
    out
}

/// Scroll position of the document, in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_top: f32,
    pub viewport_height: f32,
    pub document_height: f32,
}

impl ScrollMetrics {
    /// True when the bottom of the viewport is within `threshold` of the end
    /// of the document.
    pub fn near_bottom(&self, threshold: f32) -> bool {
        self.scroll_top + self.viewport_height >= self.document_height - threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interleave<T: Clone>(columns: &[Vec<T>]) -> Vec<T> {
        let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
        let mut out = Vec::new();
        for r in 0..rows {
            for col in columns {
                if let Some(item) = col.get(r) {
                    out.push(item.clone());
                }
            }
        }
        out
    }

    #[test]
    fn breakpoints_pick_column_counts() {
        let bp = ColumnBreakpoints::default();
        assert_eq!(bp.column_count(None), 1);
        assert_eq!(bp.column_count(Some(f32::NAN)), 1);
        assert_eq!(bp.column_count(Some(375.0)), 2);
        assert_eq!(bp.column_count(Some(640.0)), 4);
        assert_eq!(bp.column_count(Some(1023.9)), 4);
        assert_eq!(bp.column_count(Some(1280.0)), 5);
        assert_eq!(bp.column_count(Some(1920.0)), 7);
    }

    #[test]
    fn round_robin_assignment() {
        let items: Vec<u32> = (0..10).collect();
        let cols = partition(&items, 4);
        assert_eq!(cols[0], vec![0, 4, 8]);
        assert_eq!(cols[1], vec![1, 5, 9]);
        assert_eq!(cols[2], vec![2, 6]);
        assert_eq!(cols[3], vec![3, 7]);
    }

    #[test]
    fn partition_round_trips_for_any_column_count() {
        for len in [0usize, 1, 6, 14, 20, 33] {
            let items: Vec<usize> = (0..len).collect();
            for columns in 1..=9 {
                let cols = partition(&items, columns);
                assert_eq!(cols.len(), columns);
                assert_eq!(interleave(&cols), items, "len={len} columns={columns}");
            }
        }
    }

    #[test]
    fn zero_columns_behaves_like_one() {
        let cols = partition(&[1, 2, 3], 0);
        assert_eq!(cols, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn near_bottom_uses_threshold() {
        let m = ScrollMetrics {
            scroll_top: 1000.0,
            viewport_height: 800.0,
            document_height: 2000.0,
        };
        assert!(m.near_bottom(200.0));
        assert!(!m.near_bottom(199.0));
    }

    #[test]
    fn sizes_hint_tracks_breakpoints() {
        let hint = ColumnBreakpoints::default().sizes_hint();
        assert_eq!(
            hint,
            "(max-width: 639px) 50vw, (max-width: 1023px) 25vw, (max-width: 1535px) 20vw, 14vw"
        );
    }

    #[test]
    fn rejects_unordered_breakpoints() {
        let bp = ColumnBreakpoints {
            wide_min_width: 500.0,
            ..ColumnBreakpoints::default()
        };
        assert!(bp.validate().is_err());
        assert!(ColumnBreakpoints::default().validate().is_ok());
    }
}
