use image::{Rgb, RgbImage};

pub const WIDTH: u32 = 640;
pub const HEIGHT: u32 = 240;
pub const BACKGROUND: u8 = 30;
pub const STRING_VALUE: u8 = 220;

/// Rows of the six strings, top first.
pub const STRING_ROWS: [u32; 6] = [80, 96, 112, 128, 144, 160];

/// Column a tilted neck pivots about: strings keep their nominal row here.
pub const TILT_PIVOT_X: f64 = 560.0;

/// Fret `n` column on an equal-tempered neck starting at x = 10.
pub fn fret_x(n: usize) -> f64 {
    10.0 + 880.0 * (1.0 - 2f64.powf(-(n as f64) / 12.0))
}

/// Horizontal guitar neck: each string is two bright rows ending at its
/// nominal row. Strings listed in `vibrating` are drawn as an 11-row band
/// fading linearly from the centre, the blur a moving string leaves in one
/// exposure.
pub fn guitar_frame(vibrating: &[usize]) -> RgbImage {
    tilted_guitar_frame(vibrating, 0.0)
}

/// Nominal row of string `i` at column `x` on a neck tilted by `slope`.
pub fn string_y(i: usize, slope: f64, x: f64) -> f64 {
    STRING_ROWS[i] as f64 + slope * (x - TILT_PIVOT_X)
}

/// The neck of [`guitar_frame`] rotated about [`TILT_PIVOT_X`] so that string
/// `i` follows `string_y(i, slope, x)`. Each column is drawn like the
/// horizontal neck at the string's rounded row there; rows that leave the
/// frame are clipped.
pub fn tilted_guitar_frame(vibrating: &[usize], slope: f64) -> RgbImage {
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([BACKGROUND; 3]));
    for x in 0..WIDTH {
        for i in 0..STRING_ROWS.len() {
            let row = string_y(i, slope, x as f64).round() as i32;
            if vibrating.contains(&i) {
                for dy in -5i32..=5 {
                    let fade = 1.0 - dy.abs() as f32 / 6.0;
                    let v = BACKGROUND as f32 + (STRING_VALUE - BACKGROUND) as f32 * fade;
                    put(&mut img, x, row + dy, v.round() as u8);
                }
            } else {
                put(&mut img, x, row - 1, STRING_VALUE);
                put(&mut img, x, row, STRING_VALUE);
            }
        }
    }
    img
}

fn put(img: &mut RgbImage, x: u32, y: i32, v: u8) {
    if (0..img.height() as i32).contains(&y) {
        img.put_pixel(x, y as u32, Rgb([v; 3]));
    }
}
