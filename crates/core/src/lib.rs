//! Core library for conftools
//!
//! This crate implements the **Functional Core** of the conftools application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`conftools_core`** (this crate): Pure transformation functions with zero I/O
//! - **`conftools`**: HTTP calls, the MCP server and the CLI (the Imperative Shell)
//!
//! Everything here can be tested with fixture data, no mocking required.
//!
//! # Module Organization
//!
//! - [`cql`]: Classifying search input and building Confluence Query Language strings
//! - [`page_id`]: Reducing page URLs to page IDs
//! - [`params`]: Tool argument records and their validation
//! - [`confluence`]: Confluence REST response shapes, domain models and transformations
//! - [`convert`]: Storage format to markdown and back
//! - [`tree`]: Flattened space page hierarchy
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use conftools_core::cql::{SearchQuery, TextSearchPlan};
//!
//! match SearchQuery::classify("release notes") {
//!     SearchQuery::Cql(cql) => assert!(false, "plain words are not CQL: {cql}"),
//!     SearchQuery::Text(text) => {
//!         let plan = TextSearchPlan::new(&text);
//!         assert_eq!(plan.primary, "siteSearch ~ \"release notes\"");
//!     }
//! }
//! ```

pub mod confluence;
pub mod convert;
pub mod cql;
pub mod page_id;
pub mod params;
pub mod tree;
