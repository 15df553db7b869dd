pub mod album;
pub mod app;
pub mod config;
pub mod edit;
pub mod error;
pub mod image_ref;
pub mod logging;
pub mod state;
pub mod storage;
pub use app::FittingRoom;
pub use error::{AppError, AppResult};
pub use image_ref::ImageRef;
