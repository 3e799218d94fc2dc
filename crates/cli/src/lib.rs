//! biblio CLI - Subcommands of the `biblio` binary

pub mod commands;
