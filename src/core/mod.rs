//! Core XML scanning primitives
//!
//! This module contains the fundamental building blocks the navigator
//! is built on:
//! - Span: buffer-relative views
//! - Scanner: memchr-accelerated tag, name and attribute boundaries
//! - Tokenizer: closed set of markup token kinds
//! - Closure: enclosure-counting close-tag matcher
//! - Entities: entity decoding and text extraction with Cow
//! - Attributes: attribute iteration and typed value decoders

pub mod attributes;
pub mod closure;
pub mod entities;
pub mod scanner;
pub mod span;
pub mod tokenizer;
