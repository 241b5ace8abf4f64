// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for programming-error guards.
//!
//! Guards fire at the point of misuse: a `NaN` alpha, a geometry setter on the
//! stage root, an unknown scale-mode name in configuration. Every guard logs
//! the violation through `log::error!` and leaves the previous valid state in
//! place. With [`GuardPolicy::Panic`] the guard panics instead, which is the
//! behaviour wanted in assert-enabled builds.
//!
//! Redundant assignments (new value equals old) are *not* errors; setters
//! short-circuit them silently.

use alloc::string::String;

/// A misuse of the scene API.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// `alpha` was assigned `NaN`.
    #[error("alpha cannot be NaN")]
    NanAlpha,
    /// A geometry or identity property of the stage root was assigned.
    ///
    /// The stage's placement is derived from the viewport and scale mode and
    /// can never be set directly.
    #[error("`{property}` is not allowed on the stage")]
    StageLocked {
        /// The rejected property.
        property: &'static str,
    },
    /// A scale-mode name did not match any supported policy.
    #[error("unsupported stage scale mode `{0}`")]
    UnsupportedScaleMode(String),
    /// An orientation name did not match any supported orientation.
    #[error("unsupported stage orientation `{0}`")]
    UnsupportedOrientation(String),
    /// Attaching the node would make it its own ancestor.
    #[error("cannot add a node to its own subtree")]
    Cycle,
    /// The node is not a child of the given parent.
    #[error("node is not a child of the given parent")]
    NotAChild,
}

/// What a guard does once it has detected misuse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GuardPolicy {
    /// Log the violation and return the error; state is left unchanged.
    #[default]
    Report,
    /// Panic with the error message.
    Panic,
}

impl GuardPolicy {
    /// Reports `error` according to this policy and hands it back for
    /// propagation.
    ///
    /// # Panics
    ///
    /// Panics with the error message under [`GuardPolicy::Panic`].
    #[track_caller]
    pub fn raise(self, error: SceneError) -> SceneError {
        match self {
            Self::Report => {
                log::error!("{error}");
                error
            }
            Self::Panic => panic!("{error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_returns_the_error() {
        let _ = env_logger::builder().is_test(true).try_init();
        let err = GuardPolicy::Report.raise(SceneError::NanAlpha);
        assert_eq!(err, SceneError::NanAlpha);
    }

    #[test]
    #[should_panic(expected = "`x` is not allowed on the stage")]
    fn panic_policy_halts() {
        let _ = GuardPolicy::Panic.raise(SceneError::StageLocked { property: "x" });
    }

    #[test]
    fn messages_name_the_offender() {
        use alloc::string::ToString;
        let err = SceneError::UnsupportedScaleMode("STRETCH".into());
        assert_eq!(err.to_string(), "unsupported stage scale mode `STRETCH`");
    }
}
