//! Process-wide state (C8): the lazily-built timezone/alias tables and a
//! per-thread stack of [`BehaviorOnFail`] overrides.
//!
//! The reference library keeps this state in process globals initialized
//! once at first use; `once_cell::sync::Lazy` is the idiomatic Rust
//! equivalent, and a `thread_local!` stack replaces the reference library's
//! varargs-style "set behavior, do one fallible call, restore" pattern with
//! an explicit RAII guard.
use std::cell::RefCell;

use once_cell::sync::Lazy;

use crate::settings::BehaviorOnFail;
use crate::time::{builtin_timezone_table, TimezoneAlias, TimezoneInfo};

/// The global timezone table, built once on first access.
pub static TIMEZONE_TABLE: Lazy<Vec<TimezoneInfo>> = Lazy::new(builtin_timezone_table);

/// The global timezone alias table. Empty until entries are registered by a
/// caller with [`register_timezone_alias`]; the reference library ships a
/// fixed alias list but none of the surrounding example material gives a
/// canonical source for it, so this starts empty rather than guessing.
pub static TIMEZONE_ALIASES: Lazy<std::sync::RwLock<Vec<TimezoneAlias>>> =
    Lazy::new(|| std::sync::RwLock::new(Vec::new()));

pub fn register_timezone_alias(alias: TimezoneAlias) {
    TIMEZONE_ALIASES.write().expect("timezone alias lock poisoned").push(alias);
}

pub fn resolve_timezone_alias(name: &str) -> Option<String> {
    TIMEZONE_ALIASES
        .read()
        .expect("timezone alias lock poisoned")
        .iter()
        .find(|a| a.alias == name)
        .map(|a| a.table_name.clone())
}

thread_local! {
    static BEHAVIOR_STACK: RefCell<Vec<BehaviorOnFail>> = RefCell::new(vec![BehaviorOnFail::rust_default()]);
}

/// The behavior currently in effect for this thread.
pub fn current_behavior() -> BehaviorOnFail {
    BEHAVIOR_STACK.with(|stack| *stack.borrow().last().expect("behavior stack is never empty"))
}

/// Push a new behavior for this thread; the returned guard restores the
/// previous one (including on unwind) when dropped, in place of the
/// reference library's explicit `RESTORE_BEHAVIOR` call.
pub fn push_behavior(behavior: BehaviorOnFail) -> BehaviorGuard {
    BEHAVIOR_STACK.with(|stack| stack.borrow_mut().push(behavior));
    BehaviorGuard { _private: () }
}

pub struct BehaviorGuard {
    _private: (),
}

impl Drop for BehaviorGuard {
    fn drop(&mut self) {
        BEHAVIOR_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.len() > 1 {
                stack.pop();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn behavior_guard_restores_on_drop() {
        let original = current_behavior();
        {
            let _guard = push_behavior(BehaviorOnFail(BehaviorOnFail::EXIT_ON_FAIL));
            assert_eq!(current_behavior().0, BehaviorOnFail::EXIT_ON_FAIL);
        }
        assert_eq!(current_behavior(), original);
    }

    #[test]
    fn timezone_table_is_nonempty() {
        assert!(!TIMEZONE_TABLE.is_empty());
    }

    #[test]
    fn alias_round_trip() {
        register_timezone_alias(TimezoneAlias {
            table_name: "EST".to_string(),
            alias: "US/Eastern".to_string(),
        });
        assert_eq!(resolve_timezone_alias("US/Eastern"), Some("EST".to_string()));
    }
}
