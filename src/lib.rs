//! # rolesweep
//!
//! Finds the Tableau Server users that still hold a placeholder site role,
//! reports on them, and moves them to a new role in bulk.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Settings read from the environment at start-up
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// The directory service contract, the session guard and the Tableau REST
/// client
pub mod directory;
/// Console and log-file output for a run
pub mod logging;
/// CSV artifacts and the console preview table
pub mod report;
/// Deciding which users are eligible for a role change
pub mod selection;
/// Site roles and user snapshots
pub mod user;
/// Sequencing a run: sign in, list, select, report or update, sign out
pub mod workflow;
