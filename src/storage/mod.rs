use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::image_ref::{ImageRef, ImageRefError};
use crate::state::StepId;

const PICTURES_SUBDIR: &str = "Pictures";
const APP_SUBDIR: &str = "probador";
const ALBUM_FILE: &str = "mi_album_virtual.jpeg";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("cannot save image: {0}")]
    Image(#[from] ImageRefError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// What a saved file represents; decides its fixed name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadTarget {
    Step(StepId),
    Album,
}

impl DownloadTarget {
    pub fn file_name(self, image: &ImageRef) -> String {
        match self {
            Self::Step(step) => format!("{}.{}", step_file_stem(step), image.file_extension()),
            Self::Album => ALBUM_FILE.to_string(),
        }
    }
}

fn step_file_stem(step: StepId) -> &'static str {
    match step {
        StepId::ModelPrep => "modelo_sin_accesorios",
        StepId::OutfitPrep => "outfit_aislado",
        StepId::Fusion => "look_final",
    }
}

#[derive(Debug, Clone)]
pub struct StorageService {
    output_dir: PathBuf,
}

impl StorageService {
    pub const fn with_paths(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// `$HOME/Pictures/probador`.
    pub fn with_default_paths() -> StorageResult<Self> {
        let home = std::env::var("HOME").map_err(|_| StorageError::MissingHomeDirectory)?;
        let mut output_dir = PathBuf::from(home);
        output_dir.push(PICTURES_SUBDIR);
        output_dir.push(APP_SUBDIR);
        Ok(Self::with_paths(output_dir))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn target_path(&self, image: &ImageRef, target: DownloadTarget) -> PathBuf {
        self.output_dir.join(target.file_name(image))
    }

    /// Decodes the reference and writes its bytes, replacing any earlier file.
    pub fn save_image(&self, image: &ImageRef, target: DownloadTarget) -> StorageResult<PathBuf> {
        let bytes = image.decode_bytes()?;
        let path = self.target_path(image, target);
        write_overwrite(&path, &bytes)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), ?target, "image saved");
        Ok(path)
    }
}

fn write_overwrite(destination: &Path, bytes: &[u8]) -> StorageResult<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    let _ = fs::remove_file(destination);
    fs::write(destination, bytes)?;
    Ok(())
}
