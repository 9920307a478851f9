//! Association module linking ownerless gift cards to user accounts.
//!
//! Cards bought for someone who has no account yet are issued with a
//! recipient email and no owner. This module attaches them later: once at
//! registration time for the new account, or in bulk via consolidation.

pub mod resolver;

pub use resolver::{AssociationResolver, ConsolidationReport};
