use image::{Rgb, RgbImage};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Which half of a test image is bright
#[derive(Debug, Clone, Copy)]
pub enum Pattern {
    LeftBright,
    TopBright,
}

/// Create a two-tone PNG image of `size`x`size` pixels
pub fn create_test_image(dir: &Path, name: &str, size: u32, pattern: Pattern) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let file_path = dir.join(format!("{}.png", name));

    let img = RgbImage::from_fn(size, size, |x, y| {
        let bright = match pattern {
            Pattern::LeftBright => x < size / 2,
            Pattern::TopBright => y < size / 2,
        };
        if bright {
            Rgb([230, 230, 230])
        } else {
            Rgb([20, 20, 20])
        }
    });
    img.save(&file_path).unwrap();
    file_path
}

/// Create a file that is not an image
pub fn create_text_file(dir: &Path, name: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let file_path = dir.join(name);
    let mut file = File::create(&file_path).unwrap();
    file.write_all(b"NOT AN IMAGE").unwrap();
    file_path
}

/// Create a collection with two distinct images, a text file and a subdirectory
///
/// ```text
/// root/left.png        64x64, left half bright
/// root/notes.txt
/// root/subdir/top.png  64x64, top half bright
/// ```
pub fn create_test_collection(root: &Path) -> Vec<PathBuf> {
    let files = vec![
        create_test_image(root, "left", 64, Pattern::LeftBright),
        create_test_image(&root.join("subdir"), "top", 64, Pattern::TopBright),
    ];
    create_text_file(root, "notes.txt");
    files
}
