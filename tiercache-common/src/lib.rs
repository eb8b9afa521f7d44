// Copyright 2026 tiercache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Shared components for tiercache.
//!
//! This crate holds the pieces every tier agrees on: the [`entry::CacheEntry`] model, the on-store record format
//! in [`code`], the [`clock::Clock`] used to stamp and expire entries, and the leave [`event`]s raised by the
//! in-memory tier.

/// Time source abstraction.
pub mod clock;
/// Value trait and persisted record codec.
pub mod code;
/// The unit of cached data.
pub mod entry;
/// Entry leave events.
pub mod event;
