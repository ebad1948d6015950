//! td-dropbox: Dropbox adapter for tubedrop
//!
//! This crate provides the implementations of the credential provider,
//! object store and link publisher traits from td-core on top of the
//! Dropbox HTTP API. It is the only crate that talks to Dropbox.

pub mod auth;
pub mod client;
pub mod files;
pub mod sharing;

pub use client::DropboxClient;
