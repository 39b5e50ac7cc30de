//! Layout inference from observed report changes.
//!
//! Pairs of reports taken before and after a control was actuated are diffed
//! ([diff]), the most plausible change is selected ([selector]) and pooled
//! across repeated trials ([consensus]) into a [Layout](crate::config::layout::Layout).
//! The resulting layout is checked against the recorded samples
//! ([validator]). The [profiler] classifies bytes of a report window by their
//! variance.

pub mod consensus;
pub mod diff;
pub mod profiler;
pub mod selector;
pub mod validator;

#[cfg(test)]
pub mod diff_test;
#[cfg(test)]
pub mod profiler_test;
