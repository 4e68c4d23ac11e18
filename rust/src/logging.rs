//! Verbosity-gated logging macros for the build/solve pipeline.
//!
//! Nothing is formatted when the configured verbosity is below a macro's level.
//! Levels:
//! - 0: SILENT (nothing; errors are returned, not logged)
//! - 1: SUMMARY (model size, penalty weight, winning energy, final cost)
//! - 2: READS (per-read energies, sampler selection)
//! - 3: DEBUG (coefficient-level builder output, beta schedule)

/// Verbosity level constants.
pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_SUMMARY: u8 = 1;
pub const VERBOSITY_READS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Log at SUMMARY level (verbosity >= 1).
///
/// Used for: one line per pipeline stage.
#[macro_export]
macro_rules! log_summary {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_SUMMARY {
            eprintln!("[qa-sched] {}", format_args!($($arg)*));
        }
    };
}

/// Log at READS level (verbosity >= 2).
#[macro_export]
macro_rules! log_reads {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_READS {
            eprintln!("[qa-sched]   {}", format_args!($($arg)*));
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
///
/// Used for: individual QUBO terms, annealing schedule internals.
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            eprintln!("[qa-sched]     {}", format_args!($($arg)*));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(VERBOSITY_SILENT < VERBOSITY_SUMMARY);
        assert!(VERBOSITY_SUMMARY < VERBOSITY_READS);
        assert!(VERBOSITY_READS < VERBOSITY_DEBUG);
    }

    #[test]
    fn test_log_macros_silent() {
        let verbosity = VERBOSITY_SILENT;
        log_summary!(verbosity, "model has {} variables", 3);
        log_reads!(verbosity, "read {} energy {}", 0, 1.5);
        log_debug!(verbosity, "Q[{}, {}] += {}", 0, 1, 2.0);
    }
}
