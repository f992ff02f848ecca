use crate::error::{CipherError, CipherResult};
use image::{DynamicImage, ImageError, ImageFormat, ImageReader};
use log::{debug, warn};
use std::io::{self, Cursor, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const DEFAULT_EXTENSION: &str = "png";

pub fn load(path: &Path) -> CipherResult<DynamicImage> {
    if !path.is_file() {
        return Err(CipherError::PathNotFound(path.to_path_buf()));
    }

    let reader = ImageReader::open(path).map_err(|e| open_error(path, e))?;
    // Sniff the header so files with a wrong or missing extension still open.
    let reader = reader.with_guessed_format()?;
    debug!("Loading {:?} as {:?}", path, reader.format());

    // A truncated file surfaces as ImageError::IoError, it is still a bad image.
    reader.decode().map_err(|source| CipherError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

// Missing or unreadable inputs are the caller's to fix, anything else is I/O.
fn open_error(path: &Path, e: io::Error) -> CipherError {
    match e.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => {
            CipherError::PathNotFound(path.to_path_buf())
        }
        _ => CipherError::Io(e),
    }
}

/// Where [`save`] will write: `path` itself, or `path.png` if it has no extension.
pub fn output_path(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(DEFAULT_EXTENSION)
    }
}

/// Encodes `img` in the format named by the extension and writes it out.
/// Returns the path written.
pub fn save(img: &DynamicImage, path: &Path) -> CipherResult<PathBuf> {
    let path = output_path(path);
    let encode_err = |source: ImageError| CipherError::Encode {
        path: path.clone(),
        source,
    };

    let format = ImageFormat::from_path(&path).map_err(encode_err)?;
    if format == ImageFormat::Jpeg {
        warn!("{:?} is lossy, decrypting it will not restore the original pixels", path);
    }

    // Encode fully in memory so a failed encode leaves nothing on disk.
    let mut bytes: Vec<u8> = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format)
        .map_err(encode_err)?;
    write_atomic(&path, &bytes)?;

    debug!("Wrote {} bytes to {:?}", bytes.len(), path);
    Ok(path)
}

// Write next to the target then rename, so a failed write never leaves a truncated file.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use crate::cipher;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::tempdir;

    fn sample() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(5, 4, |x, y| {
            Rgb([(x * 60) as u8, (y * 50) as u8, (x + y) as u8])
        }))
    }

    #[test]
    fn test_output_path() {
        assert_eq!(output_path(Path::new("out")), PathBuf::from("out.png"));
        assert_eq!(output_path(Path::new("dir/out")), PathBuf::from("dir/out.png"));
        assert_eq!(output_path(Path::new("out.bmp")), PathBuf::from("out.bmp"));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let img = sample();

        let written = save(&img, &temp_dir.path().join("a.png")).unwrap();
        assert_eq!(written, temp_dir.path().join("a.png"));
        assert_eq!(load(&written).unwrap().to_rgb8(), img.to_rgb8());

        // No extension falls back to png.
        let written = save(&img, &temp_dir.path().join("b")).unwrap();
        assert_eq!(written, temp_dir.path().join("b.png"));
        assert!(!temp_dir.path().join("b").exists());
        assert_eq!(load(&written).unwrap().to_rgb8(), img.to_rgb8());
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("out.png");
        save(&sample(), &path).unwrap();
        // Overwriting goes through the same rename.
        save(&sample(), &path).unwrap();

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("out.png")]);
    }

    #[test]
    fn test_load_missing() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("nope.png");
        assert!(matches!(load(&missing), Err(CipherError::PathNotFound(p)) if p == missing));

        // Directories are not image files either.
        assert!(matches!(load(temp_dir.path()), Err(CipherError::PathNotFound(_))));
    }

    #[test]
    fn test_load_garbage() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("broken.png");
        fs::write(&path, "definitely not a png").unwrap();
        assert!(matches!(load(&path), Err(CipherError::Decode { .. })));
    }

    #[test]
    fn test_load_truncated() {
        let temp_dir = tempdir().unwrap();
        let full = save(&sample(), &temp_dir.path().join("full.png")).unwrap();
        let bytes = fs::read(&full).unwrap();

        for len in [bytes.len() / 2, 40, 20] {
            let path = temp_dir.path().join(format!("cut{}.png", len));
            fs::write(&path, &bytes[..len]).unwrap();
            assert!(
                matches!(load(&path), Err(CipherError::Decode { .. })),
                "{} bytes should fail to decode",
                len
            );
        }
    }

    #[test]
    fn test_open_error_kinds() {
        let path = Path::new("locked.png");
        let denied = io::Error::from(ErrorKind::PermissionDenied);
        assert!(matches!(open_error(path, denied), CipherError::PathNotFound(p) if p == path));

        let gone = io::Error::from(ErrorKind::NotFound);
        assert!(matches!(open_error(path, gone), CipherError::PathNotFound(_)));

        let other = io::Error::from(ErrorKind::Interrupted);
        assert!(matches!(open_error(path, other), CipherError::Io(_)));
    }

    #[test]
    fn test_save_unknown_extension() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("out.notanimage");
        assert!(matches!(save(&sample(), &path), Err(CipherError::Encode { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_save_into_missing_dir() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("missing").join("out.png");
        assert!(matches!(save(&sample(), &path), Err(CipherError::Io(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let temp_dir = tempdir().unwrap();
        let src = RgbaImage::from_fn(6, 3, |x, y| Rgba([250, x as u8, y as u8, 100 + x as u8]));
        let input = save(&DynamicImage::ImageRgba8(src.clone()), &temp_dir.path().join("in.png")).unwrap();

        let encrypted = cipher::encrypt_file(&input, 10, &temp_dir.path().join("encrypted.png")).unwrap();
        let enc = load(&encrypted).unwrap().to_rgba8();
        assert_eq!(enc.get_pixel(2, 1), &Rgba([4, 1, 2, 102]));

        let decrypted = cipher::decrypt_file(&encrypted, 10, &temp_dir.path().join("decrypted")).unwrap();
        assert_eq!(decrypted, temp_dir.path().join("decrypted.png"));
        assert_eq!(load(&decrypted).unwrap().to_rgba8(), src);
    }

    #[test]
    fn test_file_zero_key_writes_nothing() {
        let temp_dir = tempdir().unwrap();
        let input = save(&sample(), &temp_dir.path().join("in.png")).unwrap();
        let output = temp_dir.path().join("out.png");

        assert!(matches!(cipher::encrypt_file(&input, 0, &output), Err(CipherError::InvalidKey)));
        assert!(matches!(cipher::decrypt_file(&input, 0, &output), Err(CipherError::InvalidKey)));
        assert!(!output.exists());

        // The key is checked before the input is even looked at.
        let missing = temp_dir.path().join("missing.png");
        assert!(matches!(cipher::encrypt_file(&missing, 0, &output), Err(CipherError::InvalidKey)));
        assert!(matches!(
            cipher::decrypt_file(&missing, 3, &output),
            Err(CipherError::PathNotFound(_))
        ));
    }
}
