pub mod filesystem;

pub use filesystem::{artifact_file_name, ArtifactStore};
