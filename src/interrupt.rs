// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

//! The `interrupt` module holds the one piece of process-global state in
//! the crate: the cooperative interrupt flag.
//!
//! The environment (typically a SIGINT handler installed by the caller)
//! calls [set]; every long-running loop in the engine polls the flag via
//! `Manager::check_interrupt`, which raises an
//! [crate::errors::ErrorKind::Interrupted] error that unwinds to the top
//! level and triggers a tracker rollback when a transaction is live.

use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Request a cooperative stop. Safe to call from a signal handler.
pub fn set() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Whether a stop has been requested. Observing the flag does not clear it.
pub fn observed() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

#[cfg(test)]
mod test {
    use super::*;

    // setting the flag is exercised in its own integration test binary;
    // flipping the process-global flag here would race the other unit
    // tests running in this process

    #[test]
    fn starts_unset() {
        assert!(!observed());
    }
}

// vim: foldmethod=marker
