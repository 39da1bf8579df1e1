//! Documents: a tree plus the package it was loaded from.

mod document;

pub use document::{Document, DocumentError};
