use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// How PUT combines a stored block with the pixels already on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutAction {
    Pset,
    Preset,
    And,
    Or,
    Xor,
}

/// ## Pixel buffer
///
/// One byte per pixel holding a palette index. The host owns the buffer
/// and lends it to graphics statements on demand.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> PixelBuffer {
        PixelBuffer {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn clear(&mut self, color: u8) {
        for p in self.pixels.iter_mut() {
            *p = color;
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            None
        } else {
            Some(y as usize * self.width + x as usize)
        }
    }

    /// Off-screen points are clipped.
    pub fn pset(&mut self, x: i32, y: i32, color: u8) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// None when off-screen, as POINT reports -1.
    pub fn point(&self, x: i32, y: i32) -> Option<u8> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Bresenham line, both endpoints included.
    pub fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: u8) {
        let dx = (x2 - x1).abs();
        let dy = -(y2 - y1).abs();
        let sx = if x1 < x2 { 1 } else { -1 };
        let sy = if y1 < y2 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x1, y1);
        loop {
            self.pset(x, y, color);
            if x == x2 && y == y2 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    pub fn rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: u8) {
        self.line(x1, y1, x2, y1, color);
        self.line(x1, y2, x2, y2, color);
        self.line(x1, y1, x1, y2, color);
        self.line(x2, y1, x2, y2, color);
    }

    pub fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: u8) {
        let (left, right) = (x1.min(x2), x1.max(x2));
        let (top, bottom) = (y1.min(y2), y1.max(y2));
        for y in top..=bottom {
            for x in left..=right {
                self.pset(x, y, color);
            }
        }
    }

    /// Midpoint circle.
    pub fn circle(&mut self, cx: i32, cy: i32, r: i32, color: u8) {
        let mut x = r;
        let mut y = 0;
        let mut p = 1 - r;
        self.octants(cx, cy, x, y, color);
        while x > y {
            y += 1;
            if p <= 0 {
                p += 2 * y + 1;
            } else {
                x -= 1;
                p += 2 * y - 2 * x + 1;
            }
            self.octants(cx, cy, x, y, color);
        }
    }

    fn octants(&mut self, cx: i32, cy: i32, x: i32, y: i32, color: u8) {
        self.pset(cx + x, cy + y, color);
        self.pset(cx - x, cy + y, color);
        self.pset(cx + x, cy - y, color);
        self.pset(cx - x, cy - y, color);
        self.pset(cx + y, cy + x, color);
        self.pset(cx - y, cy + x, color);
        self.pset(cx + y, cy - x, color);
        self.pset(cx - y, cy - x, color);
    }

    /// Ellipse or arc traced by angle. Angles are radians counter-clockwise
    /// from three o'clock; a negative angle also draws its radius.
    #[allow(clippy::too_many_arguments)]
    pub fn arc(
        &mut self,
        cx: i32,
        cy: i32,
        rx: f64,
        ry: f64,
        start: f64,
        end: f64,
        color: u8,
    ) {
        let (a0, a1) = (start.abs(), end.abs());
        let stop = if a1 < a0 {
            a1 + std::f64::consts::PI * 2.0
        } else {
            a1
        };
        let steps = ((rx.max(ry) * (stop - a0)).ceil() as usize).max(8) * 2;
        let at = |a: f64| {
            (
                cx + (rx * a.cos()).round() as i32,
                cy - (ry * a.sin()).round() as i32,
            )
        };
        let (mut px, mut py) = at(a0);
        for i in 1..=steps {
            let (x, y) = at(a0 + (stop - a0) * i as f64 / steps as f64);
            self.line(px, py, x, y, color);
            px = x;
            py = y;
        }
        if start < 0.0 {
            let (x, y) = at(a0);
            self.line(cx, cy, x, y, color);
        }
        if end < 0.0 {
            let (x, y) = at(a1);
            self.line(cx, cy, x, y, color);
        }
    }

    /// Scanline flood fill from (x, y) outwards until `border` pixels.
    pub fn paint(&mut self, x: i32, y: i32, fill: u8, border: u8) {
        match self.point(x, y) {
            None => return,
            Some(c) if c == border || c == fill => return,
            Some(_) => {}
        }
        let open = |buf: &PixelBuffer, x: i32, y: i32| match buf.point(x, y) {
            Some(c) => c != border && c != fill,
            None => false,
        };
        let mut stack = vec![(x, y)];
        while let Some((x, y)) = stack.pop() {
            if !open(self, x, y) {
                continue;
            }
            let mut left = x;
            while open(self, left - 1, y) {
                left -= 1;
            }
            let mut right = x;
            while open(self, right + 1, y) {
                right += 1;
            }
            for sx in left..=right {
                self.pset(sx, y, fill);
            }
            for sx in left..=right {
                if open(self, sx, y - 1) {
                    stack.push((sx, y - 1));
                }
                if open(self, sx, y + 1) {
                    stack.push((sx, y + 1));
                }
            }
        }
    }

    /// A block for graphics GET: width and height as LE words, then the
    /// rows of pixels.
    pub fn get(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Vec<u8>> {
        let (left, right) = (x1.min(x2), x1.max(x2));
        let (top, bottom) = (y1.min(y2), y1.max(y2));
        if self.index(left, top).is_none() || self.index(right, bottom).is_none() {
            return Err(error!(IllegalFunctionCall));
        }
        let w = (right - left + 1) as u16;
        let h = (bottom - top + 1) as u16;
        let mut out = Vec::with_capacity(4 + w as usize * h as usize);
        out.extend_from_slice(&w.to_le_bytes());
        out.extend_from_slice(&h.to_le_bytes());
        for y in top..=bottom {
            for x in left..=right {
                out.push(self.pixels[y as usize * self.width + x as usize]);
            }
        }
        Ok(out)
    }

    pub fn put(&mut self, x: i32, y: i32, block: &[u8], action: PutAction) -> Result<()> {
        if block.len() < 4 {
            return Err(error!(IllegalFunctionCall));
        }
        let w = u16::from_le_bytes([block[0], block[1]]) as i32;
        let h = u16::from_le_bytes([block[2], block[3]]) as i32;
        let data = &block[4..];
        if data.len() < (w * h) as usize
            || self.index(x, y).is_none()
            || self.index(x + w - 1, y + h - 1).is_none()
        {
            return Err(error!(IllegalFunctionCall));
        }
        for row in 0..h {
            for col in 0..w {
                let src = data[(row * w + col) as usize];
                let i = (y + row) as usize * self.width + (x + col) as usize;
                let dst = self.pixels[i];
                self.pixels[i] = match action {
                    PutAction::Pset => src,
                    PutAction::Preset => !src & 0x0F,
                    PutAction::And => dst & src,
                    PutAction::Or => dst | src,
                    PutAction::Xor => dst ^ src,
                };
            }
        }
        Ok(())
    }
}
