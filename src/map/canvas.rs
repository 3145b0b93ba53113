/// Braille-dot canvas: each character cell carries a 2x4 dot grid
/// (U+2800..U+28FF), giving double-width / quadruple-height resolution.
pub struct DotCanvas {
    cols: usize,
    rows: usize,
    cells: Vec<u8>,
}

/// Dot bit per (x % 2, y % 4) position inside a cell.
const DOT_BITS: [[u8; 2]; 4] = [
    [0x01, 0x08],
    [0x02, 0x10],
    [0x04, 0x20],
    [0x40, 0x80],
];

impl DotCanvas {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![0; cols * rows],
        }
    }

    pub fn set_dot(&mut self, x: i32, y: i32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.cols || cy >= self.rows {
            return;
        }
        self.cells[cy * self.cols + cx] |= DOT_BITS[y % 4][x % 2];
    }

    /// Render one character row.
    pub fn row_to_string(&self, row: usize) -> String {
        if row >= self.rows {
            return String::new();
        }
        self.cells[row * self.cols..(row + 1) * self.cols]
            .iter()
            .map(|&bits| char::from_u32(0x2800 + u32::from(bits)).unwrap_or(' '))
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.rows).map(|i| self.row_to_string(i))
    }
}

/// Bresenham line. With `dash` set, dots are emitted in an on/off pattern of
/// that period so selection highlights read differently from base geometry.
pub fn draw_line(canvas: &mut DotCanvas, from: (i32, i32), to: (i32, i32), dash: Option<u32>) {
    let (x0, y0) = from;
    let (x1, y1) = to;

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;
    let mut step: u32 = 0;

    loop {
        let draw = match dash {
            Some(period) => (step / period) % 2 == 0,
            None => true,
        };
        if draw {
            canvas.set_dot(x, y);
        }
        step += 1;

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Axis-aligned rectangle from two corner pixels.
pub fn draw_rect(
    canvas: &mut DotCanvas,
    a: (i32, i32),
    b: (i32, i32),
    dash: Option<u32>,
    fill: bool,
) {
    let (min_x, max_x) = (a.0.min(b.0), a.0.max(b.0));
    let (min_y, max_y) = (a.1.min(b.1), a.1.max(b.1));

    draw_line(canvas, (min_x, min_y), (max_x, min_y), dash);
    draw_line(canvas, (max_x, min_y), (max_x, max_y), dash);
    draw_line(canvas, (max_x, max_y), (min_x, max_y), dash);
    draw_line(canvas, (min_x, max_y), (min_x, min_y), dash);

    if fill {
        // Sparse checker fill so the base map stays legible underneath.
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if (x + y) % 4 == 0 {
                    canvas.set_dot(x, y);
                }
            }
        }
    }
}

/// Cross-shaped marker centered on a pixel.
pub fn draw_marker(canvas: &mut DotCanvas, center: (i32, i32), size: i32) {
    for i in -size..=size {
        canvas.set_dot(center.0 + i, center.1);
        canvas.set_dot(center.0, center.1 + i);
    }
}
