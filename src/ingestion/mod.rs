//! Workbook loading.
//!
//! [`excel`] reads the registration sheet into a [`crate::types::Table`].

pub mod excel;

pub use excel::load_registrations;
