//! Boot resources (`/boot-resources/`): custom images and their upload.

mod client;
mod models;

pub use client::{BootResourceBuilder, BootResourceHandle, BootResources, UPLOAD_CHUNK_SIZE};
pub use models::*;
