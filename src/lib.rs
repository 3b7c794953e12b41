//! Posts a form, files included, to a processing endpoint and offers the
//! returned body as a download.
//!
//! [`handler::FormHandler`] runs one submission; [`status::StatusArea`] is
//! where it reports progress and errors.
pub mod config;
pub mod error;
pub mod form;
pub mod handler;
pub mod io;
pub mod objects;
pub mod status;
#[cfg(test)]
mod test;
