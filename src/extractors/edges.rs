//! Canny edge detection on the raw 3x3 Sobel gradient.
//!
//! No smoothing is applied before differentiation: thresholds act on the
//! L1 gradient magnitude `|gx| + |gy|` of the image as given. Directions are
//! quantized to four bins with a fixed-point tan(22.5°) test, non-maxima are
//! suppressed, and weak pixels are kept when 8-connected to a strong one.

use image::{GrayImage, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// tan(22.5°) in Q15.
const TG22: i64 = 13573;
const SHIFT: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    None,
    Weak,
    Strong,
}

/// L1 gradient magnitude and signed components, row-major.
struct Gradient {
    width: usize,
    height: usize,
    gx: Vec<i64>,
    gy: Vec<i64>,
    mag: Vec<i64>,
}

impl Gradient {
    fn new(image: &GrayImage) -> Self {
        let gx: Vec<i64> = horizontal_sobel(image).as_raw().iter().map(|&v| v as i64).collect();
        let gy: Vec<i64> = vertical_sobel(image).as_raw().iter().map(|&v| v as i64).collect();
        let mag = gx.iter().zip(&gy).map(|(x, y)| x.abs() + y.abs()).collect();
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            gx,
            gy,
            mag,
        }
    }

    /// Magnitude at `(x, y)`; zero outside the image.
    fn at(&self, x: isize, y: isize) -> i64 {
        if x < 0 || y < 0 || x >= self.width as isize || y >= self.height as isize {
            return 0;
        }
        self.mag[y as usize * self.width + x as usize]
    }

    /// Whether `(x, y)` is a local maximum across its gradient direction.
    fn is_local_max(&self, x: usize, y: usize) -> bool {
        let i = y * self.width + x;
        let (m, dx, dy) = (self.mag[i], self.gx[i], self.gy[i]);
        let (x, y) = (x as isize, y as isize);

        let xs = dx.abs();
        let ys = dy.abs() << SHIFT;
        let tg22x = xs * TG22;

        if ys < tg22x {
            m > self.at(x - 1, y) && m >= self.at(x + 1, y)
        } else if ys > tg22x + (xs << (SHIFT + 1)) {
            m > self.at(x, y - 1) && m >= self.at(x, y + 1)
        } else {
            let s = if (dx ^ dy) < 0 { -1 } else { 1 };
            m > self.at(x - s, y - 1) && m > self.at(x + s, y + 1)
        }
    }
}

/// Edge map (255 on edges, 0 elsewhere) with hysteresis thresholds applied
/// to the floored `low`/`high` values. The thresholds may be given in
/// either order.
pub fn canny(image: &GrayImage, low: f32, high: f32) -> GrayImage {
    let (low, high) = if low > high { (high, low) } else { (low, high) };
    let (low, high) = (low.floor() as i64, high.floor() as i64);

    let grad = Gradient::new(image);
    let (w, h) = (grad.width, grad.height);
    let mut marks = vec![Mark::None; w * h];
    let mut stack = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            if grad.mag[i] <= low || !grad.is_local_max(x, y) {
                continue;
            }
            if grad.mag[i] > high {
                marks[i] = Mark::Strong;
                stack.push((x, y));
            } else {
                marks[i] = Mark::Weak;
            }
        }
    }

    while let Some((x, y)) = stack.pop() {
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                let j = ny * w + nx;
                if marks[j] == Mark::Weak {
                    marks[j] = Mark::Strong;
                    stack.push((nx, ny));
                }
            }
        }
    }

    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        if marks[y as usize * w + x as usize] == Mark::Strong {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_edges(edges: &GrayImage) -> usize {
        edges.as_raw().iter().filter(|&&v| v == 255).count()
    }

    fn noise_image(width: u32, height: u32, seed: u32) -> GrayImage {
        let mut state = seed;
        let data = (0..width * height)
            .map(|_| {
                state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                (state >> 24) as u8
            })
            .collect();
        GrayImage::from_raw(width, height, data).unwrap()
    }

    #[test]
    fn test_step_gives_one_pixel_wide_edge() {
        let img = GrayImage::from_fn(32, 32, |x, _| if x < 16 { Luma([0]) } else { Luma([200]) });
        let edges = canny(&img, 50.0, 150.0);

        assert_eq!(count_edges(&edges), 32);
        for y in 0..32 {
            assert_eq!(edges.get_pixel(15, y)[0], 255);
            assert_eq!(edges.get_pixel(16, y)[0], 0);
        }
    }

    #[test]
    fn test_plateau_keeps_leading_pixel_only() {
        // 2-pixel stripes: every interior column has |gx| = 1020
        let img = GrayImage::from_fn(64, 64, |x, _| {
            if (x / 2) % 2 == 0 { Luma([0]) } else { Luma([255]) }
        });
        let edges = canny(&img, 50.0, 150.0);
        assert_eq!(count_edges(&edges), 64);
        assert!(edges.rows().all(|row| row.enumerate().all(|(x, p)| (p[0] == 255) == (x == 1))));
    }

    #[test]
    fn test_noise_density() {
        let edges = canny(&noise_image(32, 32, 42), 50.0, 150.0);
        assert_eq!(count_edges(&edges), 393);
    }

    #[test]
    fn test_checker_blocks() {
        let img = GrayImage::from_fn(64, 64, |x, y| {
            if ((x / 16) + (y / 16)) % 2 == 1 { Luma([255]) } else { Luma([0]) }
        });
        assert_eq!(count_edges(&canny(&img, 50.0, 150.0)), 348);
    }

    #[test]
    fn test_weak_ramp_has_no_edges() {
        // |gx| = 4 per gray level step, below the low threshold
        let img = GrayImage::from_fn(32, 32, |x, _| Luma([(x * 4) as u8]));
        assert_eq!(count_edges(&canny(&img, 50.0, 150.0)), 0);
        assert_eq!(canny(&img, 150.0, 50.0), canny(&img, 50.0, 150.0));
    }

    #[test]
    fn test_hysteresis_needs_strong_seed() {
        // Step of 30 gives |gx| = 120: above low, below high, no seed
        let img = GrayImage::from_fn(16, 16, |x, _| if x < 8 { Luma([0]) } else { Luma([30]) });
        assert_eq!(count_edges(&canny(&img, 50.0, 150.0)), 0);
        // Lowering the high threshold turns the same column into edges
        assert_eq!(count_edges(&canny(&img, 50.0, 100.0)), 16);
    }
}
