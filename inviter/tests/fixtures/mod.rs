//! Test fixtures: a scripted VK API and member factories

pub mod fake_vk;
pub mod members;

pub use fake_vk::*;
pub use members::*;
