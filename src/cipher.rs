// Shift-and-swap pixel cipher.
// Red is rotated by the key (mod 256), green and blue trade places.
// A demo, not encryption: every pixel uses the same key and there is no diffusion.

use crate::error::{CipherError, CipherResult};
use crate::store;
use image::DynamicImage;
use log::{debug, info};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};

/// A non-zero secret key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Key(i64);

impl Key {
    pub fn new(value: i64) -> CipherResult<Self> {
        if value == 0 {
            return Err(CipherError::InvalidKey);
        }
        Ok(Self(value))
    }

    /// Amount added to the red channel, normalized into 0..=255.
    pub fn shift(self) -> u8 {
        self.0.rem_euclid(256) as u8
    }
}

// Keep the key out of logs and panic messages.
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(..)")
    }
}

/// Parses a decimal key of any length.
///
/// Values that fit in an `i64` come back unchanged. Larger ones are non-zero by
/// construction and are folded to an `i64` with the same residue mod 256.
pub fn parse_key(text: &str) -> CipherResult<i64> {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Ok(value);
    }

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CipherError::MalformedKey(text.to_string()));
    }

    let residue = digits
        .bytes()
        .fold(0u32, |acc, b| (acc * 10 + u32::from(b - b'0')) % 256);
    let residue = if negative { (256 - residue) % 256 } else { residue };
    // 256 keeps a zero residue from turning into the rejected key 0.
    Ok(if residue == 0 { 256 } else { i64::from(residue) })
}

pub fn encrypt_pixel(key: Key, [red, green, blue]: [u8; 3]) -> [u8; 3] {
    [red.wrapping_add(key.shift()), blue, green]
}

pub fn decrypt_pixel(key: Key, [red, green, blue]: [u8; 3]) -> [u8; 3] {
    // The swap is its own inverse, only the shift flips direction.
    [red.wrapping_sub(key.shift()), blue, green]
}

pub fn encrypt(image: DynamicImage, key: i64) -> CipherResult<DynamicImage> {
    let key = Key::new(key)?;
    Ok(map_rgb(image, |px| encrypt_pixel(key, px)))
}

pub fn decrypt(image: DynamicImage, key: i64) -> CipherResult<DynamicImage> {
    let key = Key::new(key)?;
    Ok(map_rgb(image, |px| decrypt_pixel(key, px)))
}

/// Loads `input`, encrypts it and writes the result to `output`.
/// Returns the path actually written (see [`store::output_path`]).
pub fn encrypt_file(input: &Path, key: i64, output: &Path) -> CipherResult<PathBuf> {
    Key::new(key)?;
    let img = store::load(input)?;
    info!("Encrypting {:?} ({}x{})", input, img.width(), img.height());
    let img = encrypt(img, key)?;
    store::save(&img, output)
}

pub fn decrypt_file(input: &Path, key: i64, output: &Path) -> CipherResult<PathBuf> {
    Key::new(key)?;
    let img = store::load(input)?;
    info!("Decrypting {:?} ({}x{})", input, img.width(), img.height());
    let img = decrypt(img, key)?;
    store::save(&img, output)
}

// Only the first three channels are rewritten. Anything that is not 8-bit RGB(A)
// is narrowed to it first.
fn map_rgb<F>(image: DynamicImage, f: F) -> DynamicImage
where
    F: Fn([u8; 3]) -> [u8; 3] + Sync,
{
    match image {
        DynamicImage::ImageRgb8(mut buf) => {
            map_channels(&mut buf, 3, &f);
            DynamicImage::ImageRgb8(buf)
        }
        DynamicImage::ImageRgba8(mut buf) => {
            map_channels(&mut buf, 4, &f);
            DynamicImage::ImageRgba8(buf)
        }
        other if other.color().has_alpha() => {
            debug!("Converting {:?} to Rgba8", other.color());
            map_rgb(DynamicImage::ImageRgba8(other.to_rgba8()), f)
        }
        other => {
            debug!("Converting {:?} to Rgb8", other.color());
            map_rgb(DynamicImage::ImageRgb8(other.to_rgb8()), f)
        }
    }
}

fn map_channels<F>(raw: &mut [u8], stride: usize, f: &F)
where
    F: Fn([u8; 3]) -> [u8; 3] + Sync,
{
    raw.par_chunks_exact_mut(stride).for_each(|px| {
        let [r, g, b] = f([px[0], px[1], px[2]]);
        px[0] = r;
        px[1] = g;
        px[2] = b;
    });
}
