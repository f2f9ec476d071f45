pub mod arc;

pub use arc::{pack, pack_from_dir, ArcEntry, ArcVersion, Archive, PackEntry};
