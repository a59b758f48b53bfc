// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Sound loading, decoding and mixing.

pub mod cpal;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod format;
pub mod mixer;
pub mod pool;
pub mod render;
pub mod sound;

pub use engine::{AudioEngine, DEFAULT_MAX_INSTANCES};
pub use error::AudioError;
pub use format::{Channels, Format, PlaybackMode, SoundType};
pub use pool::InstanceId;
pub use sound::Sound;
