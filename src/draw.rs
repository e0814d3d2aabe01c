//! Raster primitives shared by the compositor and the spotlight mask.

use image::{GenericImage, Rgb, RgbImage};

use crate::types::Point;

/// Filled circle, clipped to the image.
pub fn draw_disc<I: GenericImage>(img: &mut I, cx: i32, cy: i32, radius: i32, color: I::Pixel) {
    let (width, height) = (img.width() as i32, img.height() as i32);
    let radius = radius.max(0);
    let (x0, x1) = (cx.saturating_sub(radius).max(0), cx.saturating_add(radius).min(width - 1));
    let (y0, y1) = (cy.saturating_sub(radius).max(0), cy.saturating_add(radius).min(height - 1));
    let r2 = i64::from(radius) * i64::from(radius);
    for py in y0..=y1 {
        let dy = i64::from(py) - i64::from(cy);
        for px in x0..=x1 {
            let dx = i64::from(px) - i64::from(cx);
            if dx * dx + dy * dy <= r2 {
                img.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

/// Thick segment, stamped as discs every pixel along its visible length.
pub fn draw_line(img: &mut RgbImage, from: Point, to: Point, thickness: u32, color: Rgb<u8>) {
    let radius = (thickness / 2) as i32;
    let margin = radius as f32 + 1.0;
    let bounds = (-margin, -margin, img.width() as f32 + margin, img.height() as f32 + margin);
    let Some((from, to)) = clip_segment(from, to, bounds) else {
        return;
    };
    let steps = from.distance(&to).ceil().max(1.0) as u32;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = from.x + (to.x - from.x) * t;
        let y = from.y + (to.y - from.y) * t;
        draw_disc(img, x.round() as i32, y.round() as i32, radius, color);
    }
}

/// Liang-Barsky clip of `from..to` against `(min_x, min_y, max_x, max_y)`.
/// Works in f64 so far-away endpoints keep their direction.
fn clip_segment(from: Point, to: Point, (min_x, min_y, max_x, max_y): (f32, f32, f32, f32)) -> Option<(Point, Point)> {
    if ![from.x, from.y, to.x, to.y].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (fx, fy) = (f64::from(from.x), f64::from(from.y));
    let (dx, dy) = (f64::from(to.x) - fx, f64::from(to.y) - fy);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    let edges = [
        (-dx, fx - f64::from(min_x)),
        (dx, f64::from(max_x) - fx),
        (-dy, fy - f64::from(min_y)),
        (dy, f64::from(max_y) - fy),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    let at = |t: f64| Point::new((fx + dx * t) as f32, (fy + dy * t) as f32);
    Some((at(t0), at(t1)))
}

/// Full-width horizontal band centred on row `y`.
pub fn draw_hline(img: &mut RgbImage, y: i32, thickness: u32, color: Rgb<u8>) {
    let half = (thickness / 2) as i32;
    let height = img.height() as i32;
    for row in y.saturating_sub(half)..=y.saturating_add(half) {
        if row < 0 || row >= height {
            continue;
        }
        for x in 0..img.width() {
            img.put_pixel(x, row as u32, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_disc_is_clipped() {
        let mut img = GrayImage::new(10, 10);
        draw_disc(&mut img, 0, 0, 3, Luma([255]));
        assert_eq!(img.get_pixel(0, 0)[0], 255);
        assert_eq!(img.get_pixel(3, 0)[0], 255);
        assert_eq!(img.get_pixel(3, 3)[0], 0);
        assert_eq!(img.get_pixel(9, 9)[0], 0);
    }

    #[test]
    fn test_line_covers_endpoints() {
        let mut img = RgbImage::new(50, 50);
        let red = Rgb([255, 0, 0]);
        draw_line(&mut img, Point::new(5.0, 5.0), Point::new(40.0, 30.0), 5, red);
        assert_eq!(*img.get_pixel(5, 5), red);
        assert_eq!(*img.get_pixel(40, 30), red);
        assert_eq!(*img.get_pixel(45, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_far_off_coordinates_are_clipped() {
        let mut img = RgbImage::new(40, 40);
        let red = Rgb([255, 0, 0]);
        draw_disc(&mut img, i32::MAX, i32::MAX, 4, red);
        draw_disc(&mut img, i32::MIN, 10, 4, red);
        draw_line(&mut img, Point::new(3e9, 3e9), Point::new(-3e9, 5e9), 2, red);
        assert!(img.pixels().all(|p| *p == Rgb([0, 0, 0])));

        // A segment from far away still draws the part inside the image.
        draw_line(&mut img, Point::new(-3e9, 20.0), Point::new(20.0, 20.0), 2, red);
        assert_eq!(*img.get_pixel(0, 20), red);
        assert_eq!(*img.get_pixel(20, 20), red);
        assert_eq!(*img.get_pixel(30, 20), Rgb([0, 0, 0]));

        draw_line(&mut img, Point::new(f32::NAN, 0.0), Point::new(5.0, 5.0), 2, red);
    }

    #[test]
    fn test_hline_offscreen_is_noop() {
        let mut img = RgbImage::new(8, 8);
        draw_hline(&mut img, -20, 5, Rgb([1, 2, 3]));
        assert!(img.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
