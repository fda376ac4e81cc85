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

// This lives in its own test binary on purpose: the interrupt flag is
// process global, and long-running loops all over the engine observe it.

use wpkg::database::Manager;
use wpkg::errors::ErrorKind;
use wpkg::interrupt;

#[test]
fn interrupt_unwinds_through_the_manager() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = Manager::new(dir.path());
    manager
        .create_database(&"linux-amd64".parse().unwrap(), "T <t@example.com>")
        .unwrap();
    manager.check_interrupt().unwrap();

    interrupt::set();
    assert!(interrupt::observed());
    // observing does not clear the flag
    assert!(interrupt::observed());

    let err = manager.check_interrupt().unwrap_err();
    assert_eq!(ErrorKind::Interrupted, err.kind());

    // every long-running loop surfaces the same condition
    let err = manager.list_installed_packages().unwrap_err();
    assert_eq!(ErrorKind::Interrupted, err.kind());
}

// vim: foldmethod=marker
