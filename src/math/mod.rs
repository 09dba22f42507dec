pub mod quaternion;

pub use quaternion::Quaternion;
