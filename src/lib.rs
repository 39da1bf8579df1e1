#![allow(clippy::enum_variant_names)]

//! A persistent document tree: file and directory nodes over a pluggable
//! container, with lazily decoded payloads and dirty-flag write-back.

pub mod application;
pub mod cli;
pub mod config;
pub mod container;
pub mod document;
pub mod ext;
pub mod payload;
pub mod storage;
pub mod tree;
pub mod write_back;
