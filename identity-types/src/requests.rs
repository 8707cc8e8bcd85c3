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

//! Request types for the login flow.

use serde::{Deserialize, Serialize};

/// Query parameters of the provider redirect back to the login callback.
///
/// Both fields default to empty so that a callback missing either one is
/// rejected by the login service with a classified error instead of a
/// generic deserialization failure.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CallbackQuery {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub code: String,
}
