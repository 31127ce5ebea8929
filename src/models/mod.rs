// src/models/mod.rs
pub mod draft;
pub mod idea;
pub mod storyboard;
