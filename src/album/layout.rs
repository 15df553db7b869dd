//! Grid placement for the album page, independent of rasterization.

pub const PAGE_WIDTH: u32 = 2480;
pub const PAGE_HEIGHT: u32 = 3508;
/// Vertical band reserved for the title and subtitle.
pub const HEADER_MARGIN: f64 = 350.0;
pub const PADDING: f64 = 80.0;
pub const COLUMNS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellPlacement {
    pub index: usize,
    pub row: usize,
    pub column: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlbumLayout {
    pub cell_width: f64,
    pub rows: usize,
    pub cells: Vec<CellPlacement>,
}

impl AlbumLayout {
    pub fn cell_width() -> f64 {
        (f64::from(PAGE_WIDTH) - (COLUMNS as f64 + 1.0) * PADDING) / COLUMNS as f64
    }

    /// Places images given as `(width, height)` pairs, in order.
    ///
    /// Every image fills the cell width and keeps its aspect ratio. A row is
    /// as tall as its left-column image; the right image may run taller.
    pub fn compute(sizes: &[(u32, u32)]) -> Self {
        let cell_width = Self::cell_width();
        let mut cells = Vec::with_capacity(sizes.len());
        let mut row_y = HEADER_MARGIN + PADDING;
        let mut row_height = 0.0;

        for (index, &(width, height)) in sizes.iter().enumerate() {
            let row = index / COLUMNS;
            let column = index % COLUMNS;
            let scaled_height = scaled_height(width, height, cell_width);

            if column == 0 {
                if index > 0 {
                    row_y += row_height + PADDING;
                }
                row_height = scaled_height;
            }

            cells.push(CellPlacement {
                index,
                row,
                column,
                x: PADDING + column as f64 * (cell_width + PADDING),
                y: row_y,
                width: cell_width,
                height: scaled_height,
            });
        }

        Self {
            cell_width,
            rows: sizes.len().div_ceil(COLUMNS),
            cells,
        }
    }

    /// Bottom edge of the lowest cell; content past `PAGE_HEIGHT` is clipped.
    pub fn content_bottom(&self) -> f64 {
        self.cells
            .iter()
            .map(|cell| cell.y + cell.height)
            .fold(HEADER_MARGIN, f64::max)
    }
}

fn scaled_height(width: u32, height: u32, cell_width: f64) -> f64 {
    if width == 0 {
        return 0.0;
    }
    cell_width * f64::from(height) / f64::from(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_width_splits_page_into_two_padded_columns() {
        assert_eq!(AlbumLayout::cell_width(), 1120.0);
    }

    #[test]
    fn three_equal_images_take_two_rows() {
        let layout = AlbumLayout::compute(&[(800, 1200), (800, 1200), (800, 1200)]);
        assert_eq!(layout.rows, 2);
        assert_eq!(layout.cells.len(), 3);

        let row1_height = 1120.0 * 1200.0 / 800.0;
        assert_eq!(layout.cells[0].y, HEADER_MARGIN + PADDING);
        assert_eq!(layout.cells[1].y, HEADER_MARGIN + PADDING);
        assert_eq!(
            layout.cells[2].y,
            HEADER_MARGIN + PADDING + row1_height + PADDING
        );
        assert_eq!(layout.cells[2].row, 1);
        assert_eq!(layout.cells[2].column, 0);
    }

    #[test]
    fn columns_are_offset_by_cell_width_and_padding() {
        let layout = AlbumLayout::compute(&[(100, 100), (100, 100)]);
        assert_eq!(layout.cells[0].x, 80.0);
        assert_eq!(layout.cells[1].x, 80.0 + 1120.0 + 80.0);
    }

    #[test]
    fn row_height_comes_from_left_image_only() {
        // Left image is short, right image tall: next row follows the left one.
        let layout = AlbumLayout::compute(&[(1120, 560), (1120, 2240), (1120, 1120)]);
        assert_eq!(layout.cells[0].height, 560.0);
        assert_eq!(layout.cells[1].height, 2240.0);
        assert_eq!(layout.cells[2].y, 430.0 + 560.0 + 80.0);
    }

    #[test]
    fn empty_input_has_no_rows() {
        let layout = AlbumLayout::compute(&[]);
        assert_eq!(layout.rows, 0);
        assert!(layout.cells.is_empty());
        assert_eq!(layout.content_bottom(), HEADER_MARGIN);
    }
}
