//! Subcommand handlers.
//!
//! | File        | Invocation                        | Description                         |
//! |-------------|-----------------------------------|-------------------------------------|
//! | `ops.rs`    | `qb create\|prune\|check <target>` | One engine stage                    |
//! | `run.rs`    | `qb run <target>`                 | Create, prune, check and monitoring |
//! | `edit.rs`   | `qb edit <target>`                | Open (or scaffold) the target file  |
//! | `shell.rs`  | `qb shell <target>`               | Shell with the repo environment set |

pub mod edit;
pub mod ops;
pub mod run;
pub mod shell;

#[cfg(test)]
pub(crate) mod testing;
