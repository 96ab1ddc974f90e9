//! Unwind - panic を `CommandError` に変換する
//!
//! `catch_unwind` が返る時点ではスタックはもう巻き戻されているので、
//! panic hook の中で backtrace と発生位置を thread-local に記録しておき、
//! catch した側がそれを取り出す。
//!
//! hook はプロセスに 1 度だけ登録し、`catch` の外で起きた panic は
//! 以前の hook にそのまま渡す。

use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use super::errors::{CommandError, PanicSite};

thread_local! {
    static CATCHING: Cell<bool> = const { Cell::new(false) };
    static LAST_SITE: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CATCHING.get() {
                let site = PanicSite {
                    location: info.location().map(ToString::to_string),
                    backtrace: Backtrace::force_capture().to_string(),
                };
                LAST_SITE.set(Some(site));
            } else {
                previous(info);
            }
        }));
    });
}

/// Run `f`, turning a panic into `CommandError::Panicked` with its site.
pub(crate) fn catch<R>(f: impl FnOnce() -> R) -> Result<R, CommandError> {
    install_hook();
    LAST_SITE.take();
    let was_catching = CATCHING.replace(true);
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    CATCHING.set(was_catching);
    outcome.map_err(|payload| CommandError::from_panic(payload, LAST_SITE.take()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[inline(never)]
    fn reconcile_accounts() -> u32 {
        panic!("ledger out of balance")
    }

    #[test]
    fn value_passes_through() {
        assert_eq!(catch(|| 7).unwrap(), 7);
    }

    #[test]
    fn site_is_recorded_where_the_panic_happened() {
        let err = catch(reconcile_accounts).unwrap_err();

        assert!(err.to_string().contains("ledger out of balance"));
        let site = err.panic_site().unwrap();
        assert!(site.location.as_deref().unwrap().contains("unwind.rs"));
        assert!(site.backtrace.contains("reconcile_accounts"), "{}", site.backtrace);
    }

    #[test]
    fn nested_catch_keeps_each_site() {
        let outer = catch(|| -> () {
            let inner = catch(reconcile_accounts).unwrap_err();
            assert!(inner.panic_site().is_some());
            panic!("after inner")
        })
        .unwrap_err();

        assert!(outer.to_string().contains("after inner"));
        assert!(outer.panic_site().is_some());
    }
}
