//! Directives and behavior configuration (C4 FPS directives, C5 CMP codec
//! directives, C8 default behavior mask), mirroring the private-fields +
//! validated-setter idiom used elsewhere in this family for configuration
//! structs.
use crate::enums::CmpAlgorithm;
use crate::errors::MedError;

/// A composable bitmask controlling how a failed call behaves, pushed/popped
/// on a per-thread stack (see [`crate::global`]). Values are taken directly
/// from the reference library, not invented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BehaviorOnFail(pub u32);

impl BehaviorOnFail {
    pub const USE_GLOBAL_BEHAVIOR: u32 = 0;
    pub const RESTORE_BEHAVIOR: u32 = 1;
    pub const EXIT_ON_FAIL: u32 = 2;
    pub const RETURN_ON_FAIL: u32 = 4;
    pub const SUPPRESS_ERROR_OUTPUT: u32 = 8;
    pub const SUPPRESS_WARNING_OUTPUT: u32 = 16;
    pub const SUPPRESS_MESSAGE_OUTPUT: u32 = 32;
    pub const SUPPRESS_OUTPUT: u32 =
        Self::SUPPRESS_ERROR_OUTPUT | Self::SUPPRESS_WARNING_OUTPUT | Self::SUPPRESS_MESSAGE_OUTPUT;
    pub const RETRY_ONCE: u32 = 64;

    /// The Rust-idiomatic default: every fallible public call returns
    /// `Result`, never calls `std::process::exit`. This is a deliberate
    /// deviation from the reference library's literal `EXIT_ON_FAIL`
    /// default, which is not acceptable behavior for a Rust library.
    pub fn rust_default() -> Self {
        BehaviorOnFail(Self::RETURN_ON_FAIL)
    }

    pub fn has(self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub fn with(self, bit: u32) -> Self {
        BehaviorOnFail(self.0 | bit)
    }

    pub fn without(self, bit: u32) -> Self {
        BehaviorOnFail(self.0 & !bit)
    }
}

/// How an [`crate::layout`]-governed file is brought into memory on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Only the universal header plus the byte range needed for a requested subset.
    Slice,
    /// Entire file read into a buffer up front.
    Full,
    /// Memory-mapped; pages brought in on touch.
    MemoryMap,
}

/// Directives governing one open FPS handle (C4).
pub struct FpsDirectives {
    read_mode: ReadMode,
    lock_on_read_open: bool,
    lock_on_write_open: bool,
    close_after_each_op: bool,
    flush_after_write: bool,
    free_password_on_close: bool,
    mmap_block_bytes: usize,
}

impl Default for FpsDirectives {
    fn default() -> Self {
        FpsDirectives {
            read_mode: ReadMode::Slice,
            // Advisory locking is disabled by default to cooperate with
            // network filesystems.
            lock_on_read_open: false,
            lock_on_write_open: false,
            close_after_each_op: false,
            flush_after_write: true,
            free_password_on_close: false,
            mmap_block_bytes: 4096,
        }
    }
}

impl FpsDirectives {
    pub fn read_mode(&self) -> ReadMode {
        self.read_mode
    }

    pub fn set_read_mode(&mut self, mode: ReadMode) {
        self.read_mode = mode;
    }

    pub fn lock_on_read_open(&self) -> bool {
        self.lock_on_read_open
    }

    pub fn set_lock_on_read_open(&mut self, v: bool) {
        self.lock_on_read_open = v;
    }

    pub fn lock_on_write_open(&self) -> bool {
        self.lock_on_write_open
    }

    pub fn set_lock_on_write_open(&mut self, v: bool) {
        self.lock_on_write_open = v;
    }

    pub fn close_after_each_op(&self) -> bool {
        self.close_after_each_op
    }

    pub fn set_close_after_each_op(&mut self, v: bool) {
        self.close_after_each_op = v;
    }

    pub fn flush_after_write(&self) -> bool {
        self.flush_after_write
    }

    pub fn set_flush_after_write(&mut self, v: bool) {
        self.flush_after_write = v;
    }

    pub fn free_password_on_close(&self) -> bool {
        self.free_password_on_close
    }

    pub fn set_free_password_on_close(&mut self, v: bool) {
        self.free_password_on_close = v;
    }

    pub fn mmap_block_bytes(&self) -> usize {
        self.mmap_block_bytes
    }

    /// Must be a nonzero power of two; the reference library's default is
    /// 4 KiB, matching common page sizes.
    pub fn set_mmap_block_bytes(&mut self, bytes: usize) -> Result<(), MedError> {
        if bytes == 0 || !bytes.is_power_of_two() {
            return Err(MedError::SettingsError {
                msg: format!("mmap block size must be a nonzero power of two, got {}", bytes),
            });
        }
        self.mmap_block_bytes = bytes;
        Ok(())
    }
}

/// Which objective a CMP "find" directive optimizes toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalObjective {
    CompressionRatio,
    MeanResidualRatio,
}

/// Directives governing the CMP encode pipeline (C5).
pub struct CmpDirectives {
    detrend: bool,
    amplitude_scale: Option<f64>,
    frequency_scale: Option<f64>,
    derivative_level: u8,
    algorithm: CmpAlgorithm,
    fall_through_to_best_encoding: bool,
    find_amplitude_scale: bool,
    find_frequency_scale: bool,
    find_derivative_level: bool,
    goal_objective: GoalObjective,
    use_relative_ratio: bool,
    goal_ratio: f64,
    goal_tolerance: f64,
    maximum_goal_attempts: u32,
    vds_threshold: f64,
    encryption_level: u8,
}

impl Default for CmpDirectives {
    fn default() -> Self {
        CmpDirectives {
            detrend: false,
            amplitude_scale: None,
            frequency_scale: None,
            derivative_level: 0,
            algorithm: CmpAlgorithm::Red,
            fall_through_to_best_encoding: false,
            find_amplitude_scale: false,
            find_frequency_scale: false,
            find_derivative_level: false,
            goal_objective: GoalObjective::CompressionRatio,
            use_relative_ratio: false,
            goal_ratio: 1.0,
            goal_tolerance: 0.05,
            maximum_goal_attempts: 10,
            vds_threshold: 5.0,
            encryption_level: 0,
        }
    }
}

impl CmpDirectives {
    pub fn detrend(&self) -> bool {
        self.detrend
    }

    pub fn set_detrend(&mut self, v: bool) {
        self.detrend = v;
    }

    pub fn amplitude_scale(&self) -> Option<f64> {
        self.amplitude_scale
    }

    pub fn set_amplitude_scale(&mut self, v: Option<f64>) -> Result<(), MedError> {
        if let Some(s) = v {
            if s <= 0.0 {
                return Err(MedError::SettingsError {
                    msg: format!("amplitude_scale must be positive, got {}", s),
                });
            }
        }
        self.amplitude_scale = v;
        Ok(())
    }

    pub fn frequency_scale(&self) -> Option<f64> {
        self.frequency_scale
    }

    pub fn set_frequency_scale(&mut self, v: Option<f64>) -> Result<(), MedError> {
        if let Some(s) = v {
            if s <= 0.0 || s > 1.0 {
                return Err(MedError::SettingsError {
                    msg: format!("frequency_scale must be in (0, 1], got {}", s),
                });
            }
        }
        self.frequency_scale = v;
        Ok(())
    }

    pub fn derivative_level(&self) -> u8 {
        self.derivative_level
    }

    pub fn set_derivative_level(&mut self, level: u8) -> Result<(), MedError> {
        if level > 3 {
            return Err(MedError::SettingsError {
                msg: format!("derivative_level must be 0..=3, got {}", level),
            });
        }
        self.derivative_level = level;
        Ok(())
    }

    pub fn algorithm(&self) -> CmpAlgorithm {
        self.algorithm
    }

    pub fn set_algorithm(&mut self, algorithm: CmpAlgorithm) {
        self.algorithm = algorithm;
    }

    pub fn fall_through_to_best_encoding(&self) -> bool {
        self.fall_through_to_best_encoding
    }

    pub fn set_fall_through_to_best_encoding(&mut self, v: bool) {
        self.fall_through_to_best_encoding = v;
    }

    pub fn find_amplitude_scale(&self) -> bool {
        self.find_amplitude_scale
    }

    pub fn set_find_amplitude_scale(&mut self, v: bool) {
        self.find_amplitude_scale = v;
    }

    pub fn find_frequency_scale(&self) -> bool {
        self.find_frequency_scale
    }

    pub fn set_find_frequency_scale(&mut self, v: bool) {
        self.find_frequency_scale = v;
    }

    pub fn find_derivative_level(&self) -> bool {
        self.find_derivative_level
    }

    pub fn set_find_derivative_level(&mut self, v: bool) {
        self.find_derivative_level = v;
    }

    pub fn goal_objective(&self) -> GoalObjective {
        self.goal_objective
    }

    pub fn set_goal_objective(&mut self, objective: GoalObjective) {
        self.goal_objective = objective;
    }

    pub fn use_relative_ratio(&self) -> bool {
        self.use_relative_ratio
    }

    pub fn set_use_relative_ratio(&mut self, v: bool) {
        self.use_relative_ratio = v;
    }

    pub fn goal_ratio(&self) -> f64 {
        self.goal_ratio
    }

    pub fn set_goal_ratio(&mut self, ratio: f64) -> Result<(), MedError> {
        if ratio <= 0.0 {
            return Err(MedError::SettingsError {
                msg: format!("goal_ratio must be positive, got {}", ratio),
            });
        }
        self.goal_ratio = ratio;
        Ok(())
    }

    pub fn goal_tolerance(&self) -> f64 {
        self.goal_tolerance
    }

    pub fn set_goal_tolerance(&mut self, tolerance: f64) -> Result<(), MedError> {
        if tolerance < 0.0 {
            return Err(MedError::SettingsError {
                msg: format!("goal_tolerance must be non-negative, got {}", tolerance),
            });
        }
        self.goal_tolerance = tolerance;
        Ok(())
    }

    /// Advisory, not a contract: pathological inputs may not converge within
    /// this many attempts; callers get back whatever the last attempt produced.
    pub fn maximum_goal_attempts(&self) -> u32 {
        self.maximum_goal_attempts
    }

    pub fn set_maximum_goal_attempts(&mut self, attempts: u32) {
        self.maximum_goal_attempts = attempts;
    }

    /// `0.0` forces lossless VDS (equivalent to RED/PRED/MBE).
    pub fn vds_threshold(&self) -> f64 {
        self.vds_threshold
    }

    pub fn set_vds_threshold(&mut self, threshold: f64) -> Result<(), MedError> {
        if threshold < 0.0 {
            return Err(MedError::SettingsError {
                msg: format!("vds_threshold must be non-negative, got {}", threshold),
            });
        }
        self.vds_threshold = threshold;
        Ok(())
    }

    pub fn encryption_level(&self) -> u8 {
        self.encryption_level
    }

    pub fn set_encryption_level(&mut self, level: u8) -> Result<(), MedError> {
        if level > 2 {
            return Err(MedError::SettingsError {
                msg: format!("encryption_level must be 0, 1 or 2, got {}", level),
            });
        }
        self.encryption_level = level;
        Ok(())
    }
}

/// Top-level settings bundle threaded through the read/write layers.
#[derive(Default)]
pub struct MedSettings {
    pub fps: FpsDirectives,
    pub cmp: CmpDirectives,
    pub default_behavior: BehaviorOnFail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_derivative_level() {
        let mut cmp = CmpDirectives::default();
        assert!(cmp.set_derivative_level(4).is_err());
        assert!(cmp.set_derivative_level(3).is_ok());
    }

    #[test]
    fn rejects_non_power_of_two_mmap_block() {
        let mut fps = FpsDirectives::default();
        assert!(fps.set_mmap_block_bytes(4097).is_err());
        assert!(fps.set_mmap_block_bytes(8192).is_ok());
    }

    #[test]
    fn behavior_mask_composes() {
        let b = BehaviorOnFail::rust_default().with(BehaviorOnFail::SUPPRESS_OUTPUT);
        assert!(b.has(BehaviorOnFail::RETURN_ON_FAIL));
        assert!(b.has(BehaviorOnFail::SUPPRESS_WARNING_OUTPUT));
        assert!(!b.has(BehaviorOnFail::EXIT_ON_FAIL));
    }
}
