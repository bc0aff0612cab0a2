/*
 *   Copyright (c) 2025 R3BL LLC
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

//! Logging setup. Grounded on `core/log/tracing_init.rs::try_create_display_layer`,
//! trimmed of the file-rotation layer (see DESIGN.md).

use tracing_core::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Where diagnostic events should go. `None` disables the layer entirely,
/// which is the default for library consumers that install their own
/// subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub enum LogTarget {
    #[default]
    None,
    Stdout,
    Stderr,
}

/// Installs a process-wide `tracing` subscriber at the given level. Returns
/// an error if a global subscriber was already installed.
pub fn init(
    target: LogTarget,
    level: LevelFilter,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    match target {
        LogTarget::None => Ok(()),
        LogTarget::Stdout => tracing_subscriber::registry()
            .with(fmt_layer.with_writer(std::io::stdout).with_filter(level))
            .try_init(),
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(fmt_layer.with_writer(std::io::stderr).with_filter(level))
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_target_never_errors() {
        assert!(init(LogTarget::None, LevelFilter::INFO).is_ok());
    }
}
