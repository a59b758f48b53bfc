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
use std::path::Path;
use std::time::Duration;

/// Extracts a displayable file name from a path, returning a fallback if the name is unreadable.
pub fn filename_display(path: &Path) -> &str {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("unreadable file name")
}

/// Formats a sound length as minutes:seconds.millis, or "unknown" when the
/// length is not declared.
pub fn duration_display(duration: Option<Duration>) -> String {
    let Some(duration) = duration else {
        return "unknown".to_string();
    };
    let minutes = duration.as_secs() / 60;
    let secs = duration.as_secs() % 60;
    format!("{}:{:02}.{:03}", minutes, secs, duration.subsec_millis())
}

/// Converts a length in seconds to a frame count at `sample_rate`.
pub fn seconds_to_frames(seconds: f64, sample_rate: u32) -> u64 {
    (seconds.max(0.0) * sample_rate as f64).round() as u64
}
