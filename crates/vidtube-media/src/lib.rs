//! vidtube-media: Hosted media storage for the VidTube backend
//!
//! This crate provides:
//! - The [`MediaStorage`] trait the server uploads and deletes assets through
//! - A Cloudinary implementation using signed upload/destroy calls
//! - Media error types
//!
//! # Usage
//!
//! ```rust,ignore
//! use vidtube_media::{CloudinaryConfig, CloudinaryStorage, MediaStorage};
//! use vidtube_core::ResourceType;
//!
//! let storage = CloudinaryStorage::new(CloudinaryConfig::from_env()?);
//! let uploaded = storage.upload(path, ResourceType::Video).await?;
//! storage.delete(&uploaded.public_id, ResourceType::Video).await?;
//! ```

pub mod cloudinary;
pub mod error;
pub mod traits;

pub use cloudinary::{CloudinaryConfig, CloudinaryStorage, sign_params};
pub use error::{MediaError, MediaResult};
pub use traits::{MediaStorage, UploadedMedia};

pub use vidtube_core;
