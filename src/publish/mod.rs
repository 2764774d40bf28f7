//! Publishing manifests of components to package repositories

pub mod component;
pub mod lock;
pub mod lockfile;
pub mod manifest;
pub mod publisher;
pub mod registry;

pub use component::{Component, ComponentType};
pub use lock::{FileLockService, InMemoryLockService, LockManager, LockService};
pub use lockfile::Lockfile;
pub use manifest::Manifest;
pub use publisher::{CommandPublisher, PublishRequest, Publisher, RecordingPublisher};
pub use registry::{ComponentRegistry, PublishSummary};
