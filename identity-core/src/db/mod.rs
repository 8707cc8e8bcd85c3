/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Durable storage of reconciled identities.

pub mod memory;
pub mod users;

pub use memory::MemoryUserDirectory;
pub use users::{IdentityRecord, PgUserDirectory, UpsertIdentity, UserDirectory};
