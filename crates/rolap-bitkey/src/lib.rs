//! Bit keys for star-schema column sets.
//!
//! A [`BitKey`] records which physical columns of a star a query, a cached
//! segment or an aggregate table touches. Every column of a star owns one bit
//! position, so "does this aggregate cover this query?" becomes
//! [`BitKey::is_super_set_of`].

#![forbid(unsafe_code)]

mod bitkey;
mod iter;

pub use crate::bitkey::{BitKey, BitKeyError, SizeClass};
pub use crate::iter::Iter;
