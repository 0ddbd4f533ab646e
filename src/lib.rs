//! ## About
//!
//! This crate contains the transform algebra and joint hierarchy bookkeeping for skeletal character
//! animation. It supplies what inverse kinematics, blend trees, and clip playback build on: evaluating,
//! composing, converting, and mirroring the pose of an articulated character every frame.
//!
//! * [RigidPose] – a uniform-scale rigid transformation (translation, rotation, scale)
//! * [Skeleton] – a joint hierarchy with cached default poses that converts flat pose buffers between
//!   parent-relative and root-relative space and mirrors them left/right
//! * [MirrorRules] – the naming conventions used to pair left and right joints
//!
//! See the [Skeleton] struct to get started.
//!
//! ## Conventions
//! * Joints are stored in a flat list and parents always precede their children. This ordering is
//!   validated on construction and all conversions depend on it.
//! * Lookups never fail loudly: unknown names or indices yield `None`, the identity pose,
//!   or an empty list.
//! * Pose buffers are owned by the caller and converted in place.
//!
//! ## Features
//! * `rayon` – processes [batch] conversions on the rayon thread pool
//! * `serde` – (de)serialization of [RigidPose], [Joint], and [MirrorRules]

pub mod batch;
pub mod dump;
pub mod errors;
pub mod joint;
pub mod mirror;
pub mod pose;
pub mod skeleton;

pub use errors::SkeletonError;
pub use joint::Joint;
pub use mirror::{MirrorMap, MirrorRules, Side};
pub use pose::RigidPose;
pub use skeleton::{Ancestors, Skeleton};

/// A flat buffer of poses, one entry per joint index
pub type PoseBuffer = Vec<RigidPose>;
