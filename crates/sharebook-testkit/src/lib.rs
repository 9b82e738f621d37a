//! # Sharebook Testkit
//!
//! Testing utilities for Sharebook.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a multi-organization consortium over a shared in-memory
//!   ledger, with signed credentials per organization
//! - **Generators**: Proptest strategies for identities, registration
//!   payloads and random operation sequences
//!
//! ## Property Testing
//!
//! Replay generated operation sequences against a fresh consortium:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use sharebook_testkit::{generators::ops, Consortium};
//!
//! proptest! {
//!     #[test]
//!     fn books_stay_consistent(script in ops(3, 4, 4, 64)) {
//!         let rt = tokio::runtime::Runtime::new().unwrap();
//!         rt.block_on(async {
//!             let consortium = Consortium::new(3).unwrap();
//!             for op in &script {
//!                 let _ = consortium.apply(op).await;
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use sharebook_testkit::Consortium;
//!
//! let consortium = Consortium::new(3).unwrap();
//! assert_eq!(consortium.member(0).identity.to_string(), "Admin@org1.example.com");
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{Consortium, Member};
pub use generators::{op, ops, Op};
