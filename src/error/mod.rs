use crate::album::AlbumError;
use crate::config::ConfigError;
use crate::edit::EditError;
use crate::image_ref::ImageRefError;
use crate::state::StateError;
use crate::storage::StorageError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Image(#[from] ImageRefError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Album(#[from] AlbumError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
