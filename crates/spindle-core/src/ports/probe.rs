//! Probe port - polling mode の外部ワーク源

/// A probe is invoked by a polling-mode worker whenever no command is pending.
///
/// `poll` returns `true` when it found (and handled) work, in which case the
/// worker checks again right away. `false` makes the worker sleep for its poll
/// interval first.
///
/// Any `FnMut() -> bool + Send` closure is a probe.
pub trait Probe: Send {
    fn poll(&mut self) -> bool;
}

impl<F> Probe for F
where
    F: FnMut() -> bool + Send,
{
    fn poll(&mut self) -> bool {
        self()
    }
}
